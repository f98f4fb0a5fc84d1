//! Classification vocabulary: physical formats, schema versions and
//! detection confidence.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// Physical container type of a catalog file, independent of its
/// logical schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PhysicalFormat {
    /// Tabular spreadsheet container (xlsx/xlsm/xls).
    Spreadsheet,
    /// Delimited text (csv/tsv).
    DelimitedText,
    /// Structured markup (XML).
    StructuredMarkup,
}

impl PhysicalFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Spreadsheet => "spreadsheet",
            Self::DelimitedText => "delimited-text",
            Self::StructuredMarkup => "structured-markup",
        }
    }
}

impl fmt::Display for PhysicalFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Logical FAB-DIS schema version of a catalog file.
///
/// `Unknown` is a classification outcome, not an error: the caller
/// decides whether to abort, force a version, or proceed best-effort.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "kebab-case")]
pub enum SchemaVersion {
    V2_1,
    V2_2,
    V3_0,
    #[default]
    Unknown,
}

impl SchemaVersion {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::V2_1 => "2.1",
            Self::V2_2 => "2.2",
            Self::V3_0 => "3.0",
            Self::Unknown => "unknown",
        }
    }

    /// Returns true for any recognized version.
    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Unknown)
    }
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SchemaVersion {
    type Err = ModelError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "2.1" => Ok(Self::V2_1),
            "2.2" => Ok(Self::V2_2),
            "3.0" | "3.x" => Ok(Self::V3_0),
            "unknown" => Ok(Self::Unknown),
            other => Err(ModelError::UnknownVersion(other.to_string())),
        }
    }
}

/// Detection confidence, clamped to `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize, Default)]
pub struct Confidence(f32);

impl Confidence {
    pub const ZERO: Self = Self(0.0);
    pub const FULL: Self = Self(1.0);

    /// Creates a confidence score, clamping out-of-range input.
    pub fn new(value: f32) -> Self {
        Self(value.clamp(0.0, 1.0))
    }

    pub fn value(&self) -> f32 {
        self.0
    }

    /// Returns true at or above the given threshold.
    pub fn at_least(&self, threshold: f32) -> bool {
        self.0 >= threshold
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.0}%", self.0 * 100.0)
    }
}
