//! Error types for extraction.
//!
//! Only format-level and structural failures surface here. Row-level
//! problems are recorded as [`RowOutcome`](fabdis_model::RowOutcome)
//! values and never raised.

use std::path::PathBuf;
use thiserror::Error;

use fabdis_detect::DetectError;

/// Fatal, per-file extraction errors.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum IngestError {
    /// Classification failed before extraction could start.
    #[error(transparent)]
    Detection(#[from] DetectError),

    /// File could not be read.
    #[error("failed to read {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The canonical skeleton (required tabs/columns or markup
    /// groups) could not be established even after rule-based
    /// renaming, so row iteration is impossible. Carries the raw
    /// structure for diagnosis.
    #[error("structural extraction failed for {path}: {reason}")]
    StructuralExtractionFailed { path: PathBuf, reason: String },
}

/// Result type for extraction operations.
pub type Result<T> = std::result::Result<T, IngestError>;
