//! Error types for detection.

use std::path::PathBuf;
use thiserror::Error;

use fabdis_rules::RuleError;

/// Errors that can occur while classifying a catalog file.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DetectError {
    /// Neither the byte signature nor the extension named a supported
    /// container. Fatal for the file.
    #[error("unrecognized physical format: {path}")]
    UnknownFormat { path: PathBuf },

    /// The container could not be classified or inspected at all.
    /// Version `unknown` is never reported this way; it is a regular
    /// classification outcome.
    #[error("detection failed for {path}")]
    DetectionFailed {
        path: PathBuf,
        #[source]
        source: Box<DetectError>,
    },

    /// File could not be read.
    #[error("failed to read {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The structural skeleton could not be extracted from a
    /// recognized container.
    #[error("failed to read structure of {path}: {message}")]
    Skeleton { path: PathBuf, message: String },

    /// Rule set loading or resolution failed.
    #[error(transparent)]
    Rules(#[from] RuleError),
}

/// Result type for detection operations.
pub type Result<T> = std::result::Result<T, DetectError>;
