//! Rule set presets.
//!
//! The default rule set and known vendor overlays are embedded at
//! compile time with `include_str!()`, so resolution never depends on
//! runtime path lookup. Externally authored presets can still be
//! loaded from disk for vendors we do not ship.

use std::path::Path;

use crate::error::{Result, RuleError};
use crate::ruleset::RuleSet;

/// Base rule set: generic FAB-DIS tab and header aliases.
const DEFAULT_RULES: &str = include_str!("../data/default.json");

/// Vendor overlay for the CEDEO dialect.
const CEDEO_RULES: &str = include_str!("../data/cedeo.json");

/// Vendors with an embedded overlay, in registration order.
pub const KNOWN_VENDORS: [&str; 1] = ["cedeo"];

/// Loads the embedded default rule set.
pub fn default_ruleset() -> Result<RuleSet> {
    RuleSet::from_json("default", DEFAULT_RULES)
}

/// Loads an embedded vendor overlay, if one is registered.
pub fn vendor_overlay(vendor: &str) -> Result<Option<RuleSet>> {
    match vendor.to_ascii_lowercase().as_str() {
        "cedeo" => RuleSet::from_json("cedeo", CEDEO_RULES).map(Some),
        _ => Ok(None),
    }
}

/// Resolves the rule set for a run: the default, overlaid with the
/// vendor dialect when one is known.
///
/// An unknown vendor hint resolves to the default rule set; only an
/// explicitly *forced* vendor should be treated as an error by the
/// caller (see [`forced_vendor_ruleset`]).
pub fn resolve(vendor: Option<&str>) -> Result<RuleSet> {
    let base = default_ruleset()?;
    match vendor {
        Some(name) => match vendor_overlay(name)? {
            Some(overlay) => Ok(base.merge(&overlay)),
            None => {
                tracing::warn!(vendor = name, "no overlay for vendor hint, using default rules");
                Ok(base)
            }
        },
        None => Ok(base),
    }
}

/// Resolves a caller-forced vendor overlay, failing when none exists.
pub fn forced_vendor_ruleset(vendor: &str) -> Result<RuleSet> {
    let overlay = vendor_overlay(vendor)?.ok_or_else(|| RuleError::UnknownVendor {
        vendor: vendor.to_string(),
    })?;
    Ok(default_ruleset()?.merge(&overlay))
}

/// Loads an externally authored rule set document from disk.
pub fn load_from_path(path: &Path) -> Result<RuleSet> {
    let json = std::fs::read_to_string(path).map_err(|source| RuleError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    RuleSet::from_json(&path.display().to_string(), &json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine;

    #[test]
    fn default_ruleset_parses_and_validates() {
        let rules = default_ruleset().unwrap();
        assert!(rules.column_aliases.contains_key("reference"));
        assert!(rules.sheet_aliases.contains_key("produits"));
    }

    #[test]
    fn every_known_vendor_has_an_overlay() {
        for vendor in KNOWN_VENDORS {
            assert!(vendor_overlay(vendor).unwrap().is_some(), "{vendor}");
        }
    }

    #[test]
    fn cedeo_overlay_takes_precedence() {
        let rules = resolve(Some("cedeo")).unwrap();
        assert_eq!(
            engine::canonical_column("Réf. CEDEO", &rules),
            Some("reference")
        );
        // The overlay replaces the produits alias set entirely.
        assert_eq!(
            engine::canonical_sheet("Articles CEDEO", &rules),
            Some("produits")
        );
    }

    #[test]
    fn unknown_hint_falls_back_to_default() {
        let rules = resolve(Some("nobody")).unwrap();
        assert_eq!(rules, default_ruleset().unwrap());
    }

    #[test]
    fn forced_unknown_vendor_is_an_error() {
        assert!(matches!(
            forced_vendor_ruleset("nobody"),
            Err(RuleError::UnknownVendor { .. })
        ));
    }

    #[test]
    fn load_from_path_reads_external_presets() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("acme.json");
        std::fs::write(
            &path,
            r#"{"column_aliases": {"reference": ["ACME id"]}}"#,
        )
        .unwrap();

        let rules = load_from_path(&path).unwrap();
        assert_eq!(rules.column_aliases["reference"], vec!["ACME id"]);
    }

    #[test]
    fn load_from_path_missing_file() {
        let result = load_from_path(Path::new("/nonexistent/rules.json"));
        assert!(matches!(result, Err(RuleError::FileRead { .. })));
    }
}
