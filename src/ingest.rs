//! Loading item documents into the registry.
//!
//! A document is parsed as a whole; a structural error rejects it and the
//! driver moves on to the next source. Inside a parsed document each `Items`
//! element is converted on its own, so one malformed entry only costs that
//! entry. Registration follows the registry's first-wins rule across every
//! source loaded through the same driver.

use crate::config::{DocumentSource, IngestConfig};
use crate::definition::ItemDefinition;
use crate::document;
use crate::error::ParseError;
use crate::registry::Registry;
use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{info, warn};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
/// An `Items` element that did not become a definition.
pub struct SkippedEntry {
    pub index: usize,
    pub reason: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
/// A definition the registry refused.
pub struct RejectedEntry {
    pub id: String,
    pub reason: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
/// Outcome of loading one document.
pub struct DocumentReport {
    pub source: String,
    /// Elements in the `Items` list.
    pub entries: usize,
    pub registered: Vec<String>,
    pub skipped: Vec<SkippedEntry>,
    pub rejected: Vec<RejectedEntry>,
}

impl DocumentReport {
    pub fn loaded(&self) -> usize {
        self.registered.len()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FailedDocument {
    pub source: String,
    pub error: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
/// Outcome of loading several documents in order.
pub struct IngestSummary {
    pub documents: Vec<DocumentReport>,
    pub failed: Vec<FailedDocument>,
}

impl IngestSummary {
    pub fn registered(&self) -> usize {
        self.documents.iter().map(DocumentReport::loaded).sum()
    }
}

/// Parse a document into definitions, keeping the reasons entries were
/// dropped. The root must be an object; anything else yields no entries.
pub fn parse_definitions(
    text: &str,
) -> Result<(Vec<ItemDefinition>, Vec<SkippedEntry>), ParseError> {
    let root = document::parse(text)?;
    let items = root.as_mapping().map(|m| m.get_list("Items")).unwrap_or(&[]);

    let mut definitions = Vec::with_capacity(items.len());
    let mut skipped = Vec::new();
    for (index, node) in items.iter().enumerate() {
        match ItemDefinition::from_node(node) {
            Ok(definition) => definitions.push(definition),
            Err(err) => skipped.push(SkippedEntry {
                index,
                reason: err.to_string(),
            }),
        }
    }
    Ok((definitions, skipped))
}

/// Feeds documents into one registry.
pub struct IngestionDriver<'r> {
    registry: &'r Registry,
}

impl<'r> IngestionDriver<'r> {
    pub fn new(registry: &'r Registry) -> Self {
        IngestionDriver { registry }
    }

    /// Parse `text` and register every definition it holds.
    pub fn load_document(&self, source: &str, text: &str) -> Result<DocumentReport, ParseError> {
        let (definitions, skipped) = parse_definitions(text)?;
        let mut report = DocumentReport {
            source: source.to_string(),
            entries: definitions.len() + skipped.len(),
            skipped,
            ..DocumentReport::default()
        };
        for entry in &report.skipped {
            warn!(source, index = entry.index, "skipping item entry: {}", entry.reason);
        }

        for definition in definitions {
            let id = definition.identifier.clone();
            match self.registry.try_register(definition) {
                Ok(()) => report.registered.push(id),
                Err(err) => {
                    warn!(source, id = %id, phase = "register", "rejected item: {err}");
                    report.rejected.push(RejectedEntry {
                        id,
                        reason: err.to_string(),
                    });
                }
            }
        }
        info!(
            source,
            loaded = report.loaded(),
            skipped = report.skipped.len(),
            rejected = report.rejected.len(),
            "loaded item document"
        );
        Ok(report)
    }

    /// Read and load one source.
    pub fn load_source(&self, source: &DocumentSource) -> Result<DocumentReport> {
        let name = source.name();
        let text = source.read()?;
        self.load_document(&name, &text)
            .with_context(|| format!("parsing item document {name}"))
    }

    /// Load `sources` in order, recording documents that fail instead of
    /// stopping.
    pub fn load_sources(&self, sources: &[DocumentSource]) -> IngestSummary {
        let mut summary = IngestSummary::default();
        for source in sources {
            match self.load_source(source) {
                Ok(report) => summary.documents.push(report),
                Err(err) => {
                    warn!(source = %source.name(), "item document rejected: {err:#}");
                    summary.failed.push(FailedDocument {
                        source: source.name(),
                        error: format!("{err:#}"),
                    });
                }
            }
        }
        info!(
            documents = summary.documents.len(),
            failed = summary.failed.len(),
            registered = summary.registered(),
            total = self.registry.count(),
            "item ingestion finished"
        );
        summary
    }

    /// Load the sources `config` names.
    pub fn load_configured(&self, config: &IngestConfig) -> Result<IngestSummary> {
        let sources = config.sources()?;
        Ok(self.load_sources(&sources))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_ITEMS;
    use crate::definition::Category;

    #[test]
    fn malformed_entries_are_skipped_individually() {
        let text = r#"{"Items": [{"PrefabName": "A"}, {"DisplayName": "x"}, 42, {"PrefabName": ""}, {"PrefabName": "B"}]}"#;
        let (definitions, skipped) = parse_definitions(text).unwrap();
        let ids: Vec<_> = definitions.iter().map(|d| d.identifier.as_str()).collect();
        assert_eq!(ids, vec!["A", "B"]);
        assert_eq!(
            skipped,
            vec![
                SkippedEntry {
                    index: 1,
                    reason: "entry has no PrefabName".into()
                },
                SkippedEntry {
                    index: 2,
                    reason: "entry is not an object".into()
                },
                SkippedEntry {
                    index: 3,
                    reason: "entry has no PrefabName".into()
                },
            ]
        );
    }

    #[test]
    fn documents_without_items_load_nothing() {
        assert!(parse_definitions("{}").unwrap().0.is_empty());
        assert!(parse_definitions(r#"{"Items": {"PrefabName": "A"}}"#).unwrap().0.is_empty());
        assert!(parse_definitions("[]").unwrap().0.is_empty());
    }

    #[test]
    fn report_separates_registered_and_rejected() {
        let registry = Registry::new();
        let driver = IngestionDriver::new(&registry);
        let text = r#"{"Items": [{"PrefabName": "A"}, {"PrefabName": "a"}, {"PrefabName": "B", "MaxStack": 0}]}"#;
        let report = driver.load_document("inline", text).unwrap();
        assert_eq!(report.entries, 3);
        assert_eq!(report.registered, vec!["A"]);
        assert_eq!(report.rejected.len(), 2);
        assert_eq!(report.rejected[0].id, "a");
        assert!(report.rejected[1].reason.contains("max stack"));
        assert_eq!(registry.count(), 1);
    }

    #[test]
    fn parse_errors_reject_the_document() {
        let registry = Registry::new();
        let driver = IngestionDriver::new(&registry);
        let err = driver
            .load_document("broken", r#"{"Items": [{"PrefabName": "A"}"#)
            .unwrap_err();
        assert!(matches!(err, ParseError::Unclosed { .. }));
        assert_eq!(registry.count(), 0);
    }

    #[test]
    fn byte_order_mark_does_not_hide_entries() {
        let text = "\u{FEFF}{\"Items\": [{\"PrefabName\": \"A\"}]}";
        let (definitions, _) = parse_definitions(text).unwrap();
        assert_eq!(definitions.len(), 1);
    }

    #[test]
    fn overly_nested_document_is_rejected_and_loading_continues() {
        let registry = Registry::new();
        let driver = IngestionDriver::new(&registry);
        let deep = format!(
            "{{\"Items\": [{{\"PrefabName\": \"A\", \"Extra\": {}0{}}}]}}",
            "[".repeat(10_000),
            "]".repeat(10_000)
        );
        let summary = driver.load_sources(&[
            DocumentSource::Text {
                name: "deep".into(),
                text: deep,
            },
            DocumentSource::Text {
                name: "plain".into(),
                text: r#"{"Items": [{"PrefabName": "B"}]}"#.into(),
            },
        ]);
        assert_eq!(summary.failed.len(), 1);
        assert!(summary.failed[0].error.contains("nesting deeper than"));
        assert!(registry.contains("B"));
        assert!(!registry.contains("A"));
    }

    #[test]
    fn embedded_defaults_parse_cleanly() {
        let (definitions, skipped) = parse_definitions(DEFAULT_ITEMS).unwrap();
        assert!(skipped.is_empty());
        assert!(!definitions.is_empty());
        assert!(definitions.iter().all(|d| d.validate().is_ok()));
        assert!(definitions.iter().any(|d| d.category == Category::Currency));
    }
}
