//! Per-row outcome accounting and run statistics.
//!
//! Every raw input row or element group is tagged exactly once, even
//! when it is skipped or fails, so the anomaly report can explain the
//! whole input. Row-level problems never abort a run.

use serde::{Deserialize, Serialize};

/// The fate of one raw input row or element group.
///
/// Row numbers are 1-based positions in the source (data rows for
/// tabular input, element groups in document order for markup).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum RowOutcome {
    /// The row produced a canonical product.
    Accepted { row: usize },
    /// The row was intentionally excluded (blank line, repeated
    /// header, ...).
    Skipped { row: usize, reason: String },
    /// The row had a structural or value problem. The run continues.
    Errored { row: usize, reason: String },
}

impl RowOutcome {
    pub fn accepted(row: usize) -> Self {
        Self::Accepted { row }
    }

    pub fn skipped(row: usize, reason: impl Into<String>) -> Self {
        Self::Skipped {
            row,
            reason: reason.into(),
        }
    }

    pub fn errored(row: usize, reason: impl Into<String>) -> Self {
        Self::Errored {
            row,
            reason: reason.into(),
        }
    }

    /// Source row position this outcome refers to.
    pub fn row(&self) -> usize {
        match self {
            Self::Accepted { row } | Self::Skipped { row, .. } | Self::Errored { row, .. } => *row,
        }
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted { .. })
    }

    pub fn is_errored(&self) -> bool {
        matches!(self, Self::Errored { .. })
    }

    /// Human-readable reason, when one exists.
    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Accepted { .. } => None,
            Self::Skipped { reason, .. } | Self::Errored { reason, .. } => Some(reason),
        }
    }
}

/// Ordered outcome list and counts for one file's run.
///
/// Owned by a single run; runs over different files never share one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStats {
    outcomes: Vec<RowOutcome>,
}

impl RunStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, outcome: RowOutcome) {
        self.outcomes.push(outcome);
    }

    /// Outcomes in source order.
    pub fn outcomes(&self) -> &[RowOutcome] {
        &self.outcomes
    }

    pub fn accepted(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_accepted()).count()
    }

    pub fn skipped(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, RowOutcome::Skipped { .. }))
            .count()
    }

    pub fn errored(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_errored()).count()
    }

    pub fn total(&self) -> usize {
        self.outcomes.len()
    }
}
