//! Detection orchestration: format, version and rule set resolution.

use std::path::Path;

use serde::Serialize;

use fabdis_model::{Confidence, PhysicalFormat, SchemaVersion};
use fabdis_rules::{RuleSet, presets};

use crate::error::{DetectError, Result};
use crate::format::detect_format;
use crate::skeleton::read_skeleton;
use crate::version::detect_version;

/// Caller-supplied detection bypasses.
#[derive(Debug, Clone, Default)]
pub struct DetectionOverrides {
    /// Skip version fingerprinting and assume this version.
    pub forced_version: Option<SchemaVersion>,
    /// Select this vendor's rule set overlay directly. Must name a
    /// registered overlay.
    pub forced_vendor: Option<String>,
}

impl DetectionOverrides {
    pub fn is_empty(&self) -> bool {
        self.forced_version.is_none() && self.forced_vendor.is_none()
    }
}

/// Everything the parser pipeline needs to know about one file.
///
/// Produced once per file and consumed by exactly one pipeline
/// selection; never mutated afterwards.
#[derive(Debug, Clone, Serialize)]
pub struct DetectionReport {
    pub physical_format: PhysicalFormat,
    pub schema_version: SchemaVersion,
    pub vendor_hint: Option<String>,
    pub confidence: Confidence,
    pub resolved_ruleset: RuleSet,
}

/// Composes the format detector, skeleton extraction and the version
/// detector, then resolves the rule set implied by the outcome.
#[derive(Debug, Clone)]
pub struct DetectorManager {
    default_rules: RuleSet,
}

impl DetectorManager {
    /// Creates a manager over the embedded default rule set.
    pub fn new() -> Result<Self> {
        Ok(Self {
            default_rules: presets::default_ruleset()?,
        })
    }

    /// Creates a manager over a caller-supplied base rule set.
    pub fn with_rules(default_rules: RuleSet) -> Self {
        Self { default_rules }
    }

    /// Classifies one file.
    ///
    /// Fails with [`DetectError::DetectionFailed`] only when the
    /// physical container cannot be classified or inspected. An
    /// unknown schema version is returned inside the report.
    pub fn resolve(&self, path: &Path) -> Result<DetectionReport> {
        self.resolve_with(path, &DetectionOverrides::default())
    }

    /// Classifies one file, honoring forced version/vendor overrides.
    pub fn resolve_with(
        &self,
        path: &Path,
        overrides: &DetectionOverrides,
    ) -> Result<DetectionReport> {
        let physical_format = detect_format(path).map_err(|source| {
            DetectError::DetectionFailed {
                path: path.to_path_buf(),
                source: Box::new(source),
            }
        })?;

        let (schema_version, vendor_hint, confidence) = match overrides.forced_version {
            Some(version) => (version, overrides.forced_vendor.clone(), Confidence::FULL),
            None => {
                let skeleton =
                    read_skeleton(path, physical_format).map_err(|source| {
                        DetectError::DetectionFailed {
                            path: path.to_path_buf(),
                            source: Box::new(source),
                        }
                    })?;
                let matched = detect_version(&skeleton, &self.default_rules);
                let vendor = overrides.forced_vendor.clone().or(matched.vendor_hint);
                (matched.version, vendor, matched.confidence)
            }
        };

        let resolved_ruleset = match (&overrides.forced_vendor, &vendor_hint) {
            // A forced vendor must name a registered overlay.
            (Some(vendor), _) => presets::forced_vendor_ruleset(vendor)?,
            // A detected hint degrades to the default when no overlay
            // exists.
            (None, Some(vendor)) => {
                let base = self.default_rules.clone();
                match presets::vendor_overlay(vendor)? {
                    Some(overlay) => base.merge(&overlay),
                    None => base,
                }
            }
            (None, None) => self.default_rules.clone(),
        };

        tracing::info!(
            path = %path.display(),
            format = %physical_format,
            version = %schema_version,
            vendor = vendor_hint.as_deref().unwrap_or("-"),
            confidence = %confidence,
            "file classified"
        );

        Ok(DetectionReport {
            physical_format,
            schema_version,
            vendor_hint,
            confidence,
            resolved_ruleset,
        })
    }
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

    fn manager() -> DetectorManager {
        DetectorManager::new().unwrap()
    }

    #[test]
    fn csv_with_canonical_headers_resolves_2_1() {
        let dir = TempDir::new().unwrap();
        let path = write_file(
            &dir,
            "catalog.csv",
            "Reference;Designation;PrixHT\nAB1;Coude cuivre;3,99\n",
        );

        let report = manager().resolve(&path).unwrap();
        assert_eq!(report.physical_format, PhysicalFormat::DelimitedText);
        assert_eq!(report.schema_version, SchemaVersion::V2_1);
        assert!(report.vendor_hint.is_none());
        assert!(report.resolved_ruleset.column_aliases.contains_key("price"));
    }

    #[test]
    fn xml_under_misleading_extension_resolves_3_0() {
        let dir = TempDir::new().unwrap();
        let path = write_file(
            &dir,
            "catalog.xlsx",
            r#"<?xml version="1.0"?>
            <fabdis xmlns="https://fab-dis.example/xsd/3.0">
              <produit><reference>AB1</reference></produit>
            </fabdis>"#,
        );

        let report = manager().resolve(&path).unwrap();
        assert_eq!(report.physical_format, PhysicalFormat::StructuredMarkup);
        assert_eq!(report.schema_version, SchemaVersion::V3_0);
        assert_eq!(report.confidence, Confidence::FULL);
    }

    #[test]
    fn nonstandard_headers_resolve_unknown_without_error() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "weird.csv", "colA;colB;colC\n1;2;3\n");

        let report = manager().resolve(&path).unwrap();
        assert_eq!(report.schema_version, SchemaVersion::Unknown);
        assert_eq!(report.confidence, Confidence::ZERO);
    }

    #[test]
    fn forced_version_bypasses_fingerprinting() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "weird.csv", "colA;colB;colC\n1;2;3\n");

        let overrides = DetectionOverrides {
            forced_version: Some(SchemaVersion::V2_1),
            forced_vendor: None,
        };
        let report = manager().resolve_with(&path, &overrides).unwrap();
        assert_eq!(report.schema_version, SchemaVersion::V2_1);
        assert_eq!(report.confidence, Confidence::FULL);
    }

    #[test]
    fn forced_vendor_selects_overlay() {
        let dir = TempDir::new().unwrap();
        let path = write_file(
            &dir,
            "export.csv",
            "Réf. CEDEO;Désignation article;Prix tarif HT\nAB1;Coude;3,99\n",
        );

        let overrides = DetectionOverrides {
            forced_version: Some(SchemaVersion::V2_1),
            forced_vendor: Some("cedeo".to_string()),
        };
        let report = manager().resolve_with(&path, &overrides).unwrap();
        assert_eq!(report.vendor_hint.as_deref(), Some("cedeo"));
        assert!(
            report.resolved_ruleset.column_aliases["reference"]
                .contains(&"Réf. CEDEO".to_string())
        );
    }

    #[test]
    fn forced_unknown_vendor_fails() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "catalog.csv", "Reference;Designation;PrixHT\n");

        let overrides = DetectionOverrides {
            forced_version: Some(SchemaVersion::V2_1),
            forced_vendor: Some("nobody".to_string()),
        };
        assert!(matches!(
            manager().resolve_with(&path, &overrides),
            Err(DetectError::Rules(_))
        ));
    }

    #[test]
    fn unclassifiable_container_is_detection_failed() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "mystery.bin", "nothing recognizable");

        assert!(matches!(
            manager().resolve(&path),
            Err(DetectError::DetectionFailed { .. })
        ));
    }
}
