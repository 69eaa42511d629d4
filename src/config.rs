//! Where item documents come from.
//!
//! The embedded default set is loaded first, then every `*.json` file under the
//! operator's override directory in path order. Because registration is
//! first-wins, that order decides which copy of a duplicated identifier sticks.

use anyhow::{Context, Result};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable naming the override directory.
pub const OVERRIDE_DIR_ENV: &str = "COMMON_ITEMS_OVERRIDE_DIR";
/// Environment variable that, when set to anything but empty or `0`, skips the
/// embedded defaults.
pub const SKIP_DEFAULTS_ENV: &str = "COMMON_ITEMS_SKIP_DEFAULTS";

/// Name reported for the embedded default document.
pub const DEFAULT_SOURCE_NAME: &str = "embedded:default_items.json";
/// Item set shipped with the crate.
pub const DEFAULT_ITEMS: &str = include_str!("../data/default_items.json");

#[derive(Clone, Debug, PartialEq, Eq)]
/// One document to ingest.
pub enum DocumentSource {
    /// A document already in memory, e.g. embedded or handed over by another
    /// extension.
    Text { name: String, text: String },
    File(PathBuf),
}

impl DocumentSource {
    pub fn defaults() -> Self {
        DocumentSource::Text {
            name: DEFAULT_SOURCE_NAME.to_string(),
            text: DEFAULT_ITEMS.to_string(),
        }
    }

    /// Label used in logs and reports.
    pub fn name(&self) -> String {
        match self {
            DocumentSource::Text { name, .. } => name.clone(),
            DocumentSource::File(path) => path.display().to_string(),
        }
    }

    pub fn read(&self) -> Result<String> {
        match self {
            DocumentSource::Text { text, .. } => Ok(text.clone()),
            DocumentSource::File(path) => fs::read_to_string(path)
                .with_context(|| format!("reading item document {}", path.display())),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IngestConfig {
    pub include_defaults: bool,
    pub override_dir: Option<PathBuf>,
}

impl Default for IngestConfig {
    fn default() -> Self {
        IngestConfig {
            include_defaults: true,
            override_dir: None,
        }
    }
}

impl IngestConfig {
    /// Read `COMMON_ITEMS_OVERRIDE_DIR` and `COMMON_ITEMS_SKIP_DEFAULTS`.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Same as `from_env`, with variables supplied by `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let override_dir = lookup(OVERRIDE_DIR_ENV)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);
        let skip_defaults = lookup(SKIP_DEFAULTS_ENV)
            .map(|v| !v.trim().is_empty() && v.trim() != "0")
            .unwrap_or(false);
        IngestConfig {
            include_defaults: !skip_defaults,
            override_dir,
        }
    }

    /// Sources in load order: defaults, then override files sorted by path.
    pub fn sources(&self) -> Result<Vec<DocumentSource>> {
        let mut sources = Vec::new();
        if self.include_defaults {
            sources.push(DocumentSource::defaults());
        }
        if let Some(dir) = &self.override_dir {
            sources.extend(
                collect_override_files(dir)?
                    .into_iter()
                    .map(DocumentSource::File),
            );
        }
        Ok(sources)
    }
}

/// Every `.json` file under `dir`, recursively, sorted by path. A missing
/// directory contributes nothing.
pub fn collect_override_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    collect_json(dir, &mut files)?;
    files.sort();
    Ok(files)
}

fn collect_json(dir: &Path, acc: &mut Vec<PathBuf>) -> Result<()> {
    if !dir.is_dir() {
        return Ok(());
    }
    for entry in fs::read_dir(dir).with_context(|| format!("listing {}", dir.display()))? {
        let path = entry?.path();
        if path.is_dir() {
            collect_json(&path, acc)?;
        } else if path.extension().and_then(|ext| ext.to_str()) == Some("json") {
            acc.push(path);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: BTreeMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn env_defaults_include_embedded_set() {
        let config = IngestConfig::from_lookup(lookup(&[]));
        assert_eq!(config, IngestConfig::default());
        let sources = config.sources().unwrap();
        assert_eq!(sources, vec![DocumentSource::defaults()]);
        assert_eq!(sources[0].name(), DEFAULT_SOURCE_NAME);
    }

    #[test]
    fn skip_flag_and_override_dir_are_read() {
        let config = IngestConfig::from_lookup(lookup(&[
            (SKIP_DEFAULTS_ENV, "1"),
            (OVERRIDE_DIR_ENV, " /srv/items "),
        ]));
        assert!(!config.include_defaults);
        assert_eq!(config.override_dir, Some(PathBuf::from("/srv/items")));

        let zero = IngestConfig::from_lookup(lookup(&[(SKIP_DEFAULTS_ENV, "0")]));
        assert!(zero.include_defaults);
        let blank = IngestConfig::from_lookup(lookup(&[(OVERRIDE_DIR_ENV, "  ")]));
        assert!(blank.override_dir.is_none());
    }

    #[test]
    fn override_files_are_sorted_and_recursive() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("b.json"), "{}").unwrap();
        fs::write(dir.path().join("a.json"), "{}").unwrap();
        fs::write(dir.path().join("notes.txt"), "skip").unwrap();
        fs::write(dir.path().join("nested/c.json"), "{}").unwrap();

        let files = collect_override_files(dir.path()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.strip_prefix(dir.path()).unwrap().to_string_lossy().replace('\\', "/"))
            .collect();
        assert_eq!(names, vec!["a.json", "b.json", "nested/c.json"]);

        let config = IngestConfig {
            include_defaults: false,
            override_dir: Some(dir.path().to_path_buf()),
        };
        assert_eq!(config.sources().unwrap().len(), 3);
    }

    #[test]
    fn missing_override_dir_contributes_nothing() {
        let dir = TempDir::new().unwrap();
        assert!(collect_override_files(&dir.path().join("absent")).unwrap().is_empty());
    }

    #[test]
    fn file_source_read_errors_carry_the_path() {
        let source = DocumentSource::File(PathBuf::from("/definitely/not/here.json"));
        let err = source.read().unwrap_err();
        assert!(format!("{err:#}").contains("/definitely/not/here.json"));
    }
}
