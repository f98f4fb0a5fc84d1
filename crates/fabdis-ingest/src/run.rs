//! Whole-file runs: classify, select a strategy, extract.

use std::path::Path;

use fabdis_detect::{DetectionOverrides, DetectionReport, DetectorManager};
use fabdis_model::{PhysicalFormat, Product, RunStats, SchemaVersion};

use crate::delimited::TabularPipeline;
use crate::error::Result;
use crate::markup::MarkupPipeline;
use crate::pipeline::{Extraction, ParserPipeline, pipeline_for};

/// Per-run knobs. The defaults mean fully automatic detection.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Trust the caller over the version detector.
    pub forced_version: Option<SchemaVersion>,
    /// Trust the caller over the vendor fingerprints. Must name a
    /// registered vendor overlay.
    pub forced_vendor: Option<String>,
}

impl RunOptions {
    fn overrides(&self) -> DetectionOverrides {
        DetectionOverrides {
            forced_version: self.forced_version,
            forced_vendor: self.forced_vendor.clone(),
        }
    }
}

/// Everything one file produced: how it was classified, the products,
/// and the per-row trail.
#[derive(Debug, Clone)]
pub struct RunResult {
    pub report: DetectionReport,
    pub products: Vec<Product>,
    pub stats: RunStats,
}

impl RunResult {
    fn classified_only(report: DetectionReport) -> Self {
        Self {
            report,
            products: Vec::new(),
            stats: RunStats::default(),
        }
    }

    fn from_extraction(report: DetectionReport, extraction: Extraction) -> Self {
        Self {
            report,
            products: extraction.products,
            stats: extraction.stats,
        }
    }
}

/// Processes one catalog file end to end.
///
/// An unrecognized schema version is not an error: the result then
/// carries the classification report and no products, and the caller
/// can retry with [`RunOptions::forced_version`] or fall back to
/// [`process_file_best_effort`].
pub fn process_file(path: &Path, options: &RunOptions) -> Result<RunResult> {
    let report = DetectorManager::new()?.resolve_with(path, &options.overrides())?;

    let Some(pipeline) = pipeline_for(report.schema_version) else {
        tracing::warn!(
            path = %path.display(),
            "schema version unrecognized, returning classification only"
        );
        return Ok(RunResult::classified_only(report));
    };

    tracing::debug!(strategy = pipeline.name(), "strategy selected");
    let extraction = pipeline.extract(path, &report)?;
    Ok(RunResult::from_extraction(report, extraction))
}

/// Like [`process_file`], but an unrecognized schema version falls
/// back to the strategy implied by the physical container alone,
/// under the default rules.
pub fn process_file_best_effort(path: &Path, options: &RunOptions) -> Result<RunResult> {
    let report = DetectorManager::new()?.resolve_with(path, &options.overrides())?;

    let pipeline: Box<dyn ParserPipeline> = match pipeline_for(report.schema_version) {
        Some(pipeline) => pipeline,
        None => {
            // A workbook carrying the full 2.2 tab set would have
            // been fingerprinted as 2.2, so unknown spreadsheets get
            // the single-table strategy.
            let fallback: Box<dyn ParserPipeline> = match report.physical_format {
                PhysicalFormat::DelimitedText | PhysicalFormat::Spreadsheet => {
                    Box::new(TabularPipeline)
                }
                PhysicalFormat::StructuredMarkup => Box::new(MarkupPipeline),
            };
            tracing::warn!(
                path = %path.display(),
                strategy = fallback.name(),
                "schema version unrecognized, extracting best-effort"
            );
            fallback
        }
    };

    let extraction = pipeline.extract(path, &report)?;
    Ok(RunResult::from_extraction(report, extraction))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_file(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn csv_catalog_processes_end_to_end() {
        let dir = TempDir::new().unwrap();
        let path = write_file(
            &dir,
            "catalog.csv",
            "Reference;Designation;PrixHT\nAB-1;Coude cuivre;3,99\n",
        );

        let result = process_file(&path, &RunOptions::default()).unwrap();
        assert_eq!(result.report.schema_version, SchemaVersion::V2_1);
        assert_eq!(result.products.len(), 1);
        assert_eq!(result.stats.accepted(), 1);
    }

    #[test]
    fn unknown_version_yields_classification_only() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "weird.csv", "colA;colB\n1;2\n");

        let result = process_file(&path, &RunOptions::default()).unwrap();
        assert_eq!(result.report.schema_version, SchemaVersion::Unknown);
        assert!(result.products.is_empty());
        assert_eq!(result.stats.total(), 0);
    }

    #[test]
    fn forced_version_unlocks_extraction() {
        let dir = TempDir::new().unwrap();
        // No namespace, so no 3.x fingerprint fires, but the child
        // elements map fine once a version is forced.
        let path = write_file(
            &dir,
            "export.xml",
            r#"<?xml version="1.0"?>
            <export>
              <produit>
                <reference>AB-1</reference>
                <designation>Coude</designation>
                <prix>3,99</prix>
              </produit>
            </export>"#,
        );

        let options = RunOptions {
            forced_version: Some(SchemaVersion::V3_0),
            forced_vendor: None,
        };
        let result = process_file(&path, &options).unwrap();
        assert_eq!(result.report.schema_version, SchemaVersion::V3_0);
        assert_eq!(result.products.len(), 1);
    }

    #[test]
    fn forced_vendor_applies_its_overlay() {
        let dir = TempDir::new().unwrap();
        let path = write_file(
            &dir,
            "export.csv",
            "Réf. CEDEO;Désignation article;Prix tarif HT\nAB-1;Coude;3,99\n",
        );

        let options = RunOptions {
            forced_version: Some(SchemaVersion::V2_1),
            forced_vendor: Some("cedeo".to_string()),
        };
        let result = process_file(&path, &options).unwrap();
        assert_eq!(result.report.vendor_hint.as_deref(), Some("cedeo"));
        assert_eq!(result.products.len(), 1);
        assert_eq!(result.products[0].name, "Coude");
    }

    #[test]
    fn best_effort_extracts_despite_unknown_version() {
        let dir = TempDir::new().unwrap();
        let path = write_file(
            &dir,
            "weird.xml",
            r#"<?xml version="1.0"?>
            <export>
              <produit>
                <reference>AB-1</reference>
                <designation>Coude</designation>
                <prix>3,99</prix>
              </produit>
            </export>"#,
        );

        let plain = process_file(&path, &RunOptions::default()).unwrap();
        assert_eq!(plain.report.schema_version, SchemaVersion::Unknown);
        assert!(plain.products.is_empty());

        let best = process_file_best_effort(&path, &RunOptions::default()).unwrap();
        assert_eq!(best.products.len(), 1);
    }
}
