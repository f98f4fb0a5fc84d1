//! Error types for rule loading and value normalization.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur when loading or validating rule sets.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RuleError {
    /// Rule set file not found or unreadable.
    #[error("failed to read rule set {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Rule set document could not be parsed.
    #[error("failed to parse rule set {name}: {source}")]
    Parse {
        name: String,
        #[source]
        source: serde_json::Error,
    },

    /// Rule set violates a structural invariant.
    #[error("invalid rule set {name}: {reason}")]
    Invalid { name: String, reason: String },

    /// No overlay is registered under the requested vendor name.
    #[error("no rule set overlay for vendor '{vendor}'")]
    UnknownVendor { vendor: String },
}

/// A single cell value could not be normalized.
///
/// This is not fatal by itself: the parser pipeline decides whether
/// the affected field was required for the row.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("could not normalize {field} value '{value}'")]
pub struct ValueNormalizationError {
    pub field: String,
    pub value: String,
}

impl ValueNormalizationError {
    pub fn new(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }
}

/// Result type for rule operations.
pub type Result<T> = std::result::Result<T, RuleError>;
