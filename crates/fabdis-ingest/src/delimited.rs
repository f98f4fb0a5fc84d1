//! Single-table extraction: FAB-DIS 2.1 delimited text and
//! single-sheet workbooks.

use std::fs::File;
use std::path::Path;

use fabdis_detect::{DetectionReport, StructuralSkeleton, read_skeleton};
use fabdis_model::PhysicalFormat;
use fabdis_rules::RuleSet;
use fabdis_rules::engine::{self, ColumnMap};

use crate::assembly::{ProductAssembler, pair_cells};
use crate::error::{IngestError, Result};
use crate::pipeline::{Extraction, ParserPipeline};
use crate::spreadsheet;

/// FAB-DIS 2.1: one implicit product table, delimited text or a
/// workbook's product tab.
pub struct TabularPipeline;

impl ParserPipeline for TabularPipeline {
    fn name(&self) -> &'static str {
        "tabular-2.1"
    }

    fn extract(&self, path: &Path, report: &DetectionReport) -> Result<Extraction> {
        match report.physical_format {
            PhysicalFormat::DelimitedText => extract_delimited(path, &report.resolved_ruleset),
            PhysicalFormat::Spreadsheet => {
                let sheets = spreadsheet::read_sheets(path)?;
                spreadsheet::extract_single_table(path, &sheets, &report.resolved_ruleset)
            }
            PhysicalFormat::StructuredMarkup => Err(IngestError::StructuralExtractionFailed {
                path: path.to_path_buf(),
                reason: "the 2.1 table strategy cannot read markup".to_string(),
            }),
        }
    }
}

/// Maps headers and checks that the table can carry products at all:
/// reference and name must bind; price must bind unless an external
/// price lookup will supply it.
pub fn bind_columns(
    path: &Path,
    headers: &[String],
    rules: &RuleSet,
    has_price_lookup: bool,
) -> Result<ColumnMap> {
    let map = engine::map_columns(headers, rules);

    let mut missing: Vec<&str> = Vec::new();
    for field in [fabdis_model::canonical::REFERENCE, fabdis_model::canonical::NAME] {
        if map.index_of(field).is_none() {
            missing.push(field);
        }
    }
    if !has_price_lookup && map.index_of(fabdis_model::canonical::PRICE).is_none() {
        missing.push(fabdis_model::canonical::PRICE);
    }

    if missing.is_empty() {
        Ok(map)
    } else {
        Err(IngestError::StructuralExtractionFailed {
            path: path.to_path_buf(),
            reason: format!(
                "no column maps to [{}] among raw headers [{}]",
                missing.join(", "),
                headers.join(", ")
            ),
        })
    }
}

fn extract_delimited(path: &Path, rules: &RuleSet) -> Result<Extraction> {
    // Re-derive the delimiter and headers from the skeleton reader so
    // both stages see the same structure.
    let skeleton = read_skeleton(path, PhysicalFormat::DelimitedText)?;
    let StructuralSkeleton::Delimited { delimiter, headers } = skeleton else {
        return Err(IngestError::StructuralExtractionFailed {
            path: path.to_path_buf(),
            reason: "delimited skeleton expected".to_string(),
        });
    };

    let map = bind_columns(path, &headers, rules, false)?;

    let file = File::open(path).map_err(|source| IngestError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(file);

    let mut extraction = Extraction::default();
    let mut assembler = ProductAssembler::new(rules);

    for (index, record) in reader.records().enumerate() {
        let position = index + 1;
        match record {
            Ok(record) => {
                let cells: Vec<String> =
                    record.iter().map(|cell| cell.trim().to_string()).collect();
                let fields = pair_cells(map.targets(), &cells);
                let (product, outcome) = assembler.assemble(position, &fields);
                extraction.stats.record(outcome);
                if let Some(product) = product {
                    extraction.products.push(product);
                }
            }
            // A malformed record is a row-level problem, not a
            // structural one.
            Err(err) => {
                extraction
                    .stats
                    .record(fabdis_model::RowOutcome::errored(position, err.to_string()));
            }
        }
    }

    tracing::info!(
        path = %path.display(),
        accepted = extraction.stats.accepted(),
        skipped = extraction.stats.skipped(),
        errored = extraction.stats.errored(),
        "delimited extraction finished"
    );

    Ok(extraction)
}
