//! Error taxonomy shared by the ingestion and resolution stages.
//!
//! None of these are fatal to a run: a `ParseError` drops one document, an
//! `EntryError` drops one element, a `RegisterError` drops one definition and a
//! `ResolutionFailure` drops one created item. Callers log and continue.

use serde::Serialize;
use thiserror::Error;

/// Structural failure while scanning a document. The whole document is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("unterminated string starting at byte {offset}")]
    UnterminatedString { offset: usize },

    #[error("unbalanced '{found}' at byte {offset}")]
    Unbalanced { found: char, offset: usize },

    #[error("unclosed structure opened at byte {offset}")]
    Unclosed { offset: usize },

    #[error("expected a quoted key at byte {offset}")]
    ExpectedKey { offset: usize },

    #[error("missing ':' after key at byte {offset}")]
    MissingColon { offset: usize },

    #[error("invalid value '{token}' at byte {offset}")]
    InvalidValue { token: String, offset: usize },

    #[error("unexpected content after the root object at byte {offset}")]
    TrailingContent { offset: usize },

    #[error("nesting deeper than {limit} levels at byte {offset}")]
    TooDeep { limit: usize, offset: usize },
}

/// One element of the `Items` list could not become a definition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EntryError {
    #[error("entry is not an object")]
    NotAnObject,

    #[error("entry has no PrefabName")]
    MissingIdentifier,
}

/// Structural invariant a definition failed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("identifier is missing or blank")]
    BlankIdentifier,

    #[error("max stack must be at least 1, got {0}")]
    MaxStackTooSmall(i64),

    #[error("weight must not be negative, got {0}")]
    NegativeWeight(f64),

    #[error("value must not be negative, got {0}")]
    NegativeValue(i64),
}

/// Why `Registry::try_register` refused a definition.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RegisterError {
    #[error("invalid definition: {0}")]
    Invalid(#[from] ValidationError),

    #[error("identifier '{0}' is already registered")]
    Duplicate(String),
}

/// Stage of resolution an item failed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionPhase {
    CustomAsset,
    Clone,
    Commit,
}

impl ResolutionPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResolutionPhase::CustomAsset => "custom_asset",
            ResolutionPhase::Clone => "clone",
            ResolutionPhase::Commit => "commit",
        }
    }
}

/// An item that could not be created, even through the clone fallback.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("{id}: {} failed: {reason}", phase.as_str())]
pub struct ResolutionFailure {
    pub id: String,
    pub phase: ResolutionPhase,
    pub reason: String,
}

/// Error reported by a `RuntimeFactory` implementation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FactoryError {
    #[error("baseline '{0}' does not exist")]
    MissingBaseline(String),

    #[error("{0}")]
    Host(String),
}

/// Failures of the currency/inventory query surface.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("unknown item '{0}'")]
    UnknownItem(String),

    #[error("item '{0}' is not a currency")]
    NotCurrency(String),

    #[error("insufficient '{id}': need {needed}, have {available}")]
    Insufficient {
        id: String,
        needed: u32,
        available: u32,
    },
}
