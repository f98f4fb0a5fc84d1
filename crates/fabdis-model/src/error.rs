//! Error types for the canonical data model.

use thiserror::Error;

/// Errors raised when constructing canonical model values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ModelError {
    /// A product reference was empty after trimming.
    #[error("invalid product reference: '{0}'")]
    InvalidReference(String),

    /// A product price was negative.
    #[error("negative price '{0}' for reference '{1}'")]
    NegativePrice(String, String),

    /// A schema version string did not name a known version.
    #[error("unknown schema version: '{0}'")]
    UnknownVersion(String),
}

/// Result type for model construction.
pub type Result<T> = std::result::Result<T, ModelError>;
