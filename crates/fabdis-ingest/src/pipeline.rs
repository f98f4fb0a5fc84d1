//! Parser pipeline contract and strategy registry.

use std::path::Path;

use fabdis_detect::DetectionReport;
use fabdis_model::{Product, RunStats, SchemaVersion};

use crate::delimited::TabularPipeline;
use crate::error::Result;
use crate::markup::MarkupPipeline;
use crate::spreadsheet::WorkbookPipeline;

/// Products and the full outcome trail extracted from one file.
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    pub products: Vec<Product>,
    pub stats: RunStats,
}

/// One extraction strategy per schema version family.
///
/// Implementations iterate raw rows or element groups under the
/// canonical mapping produced by the rule engine and never halt on a
/// single bad row; they fail only when row iteration itself is
/// impossible.
pub trait ParserPipeline {
    /// Strategy name, for logs and diagnostics.
    fn name(&self) -> &'static str;

    /// Extracts canonical products from a classified file.
    fn extract(&self, path: &Path, report: &DetectionReport) -> Result<Extraction>;
}

type PipelineFactory = fn() -> Box<dyn ParserPipeline>;

/// Strategy registry. Adding a version means adding a row here, not
/// touching the dispatcher.
const REGISTRY: &[(SchemaVersion, PipelineFactory)] = &[
    (SchemaVersion::V2_1, || Box::new(TabularPipeline)),
    (SchemaVersion::V2_2, || Box::new(WorkbookPipeline)),
    (SchemaVersion::V3_0, || Box::new(MarkupPipeline)),
];

/// Selects the strategy registered for a schema version.
///
/// Returns `None` for [`SchemaVersion::Unknown`]; the caller decides
/// policy (force a version, or fall back to best effort).
pub fn pipeline_for(version: SchemaVersion) -> Option<Box<dyn ParserPipeline>> {
    REGISTRY
        .iter()
        .find(|(registered, _)| *registered == version)
        .map(|(_, factory)| factory())
}
