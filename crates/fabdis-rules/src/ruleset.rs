//! The declarative rule set: alias tables and value transforms.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use fabdis_model::canonical;

use crate::error::{Result, RuleError};

/// How a canonical field's raw values are rewritten.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ValueTransform {
    /// Locale-aware numeric parsing (`3,99 €` and `3.99` both become
    /// the decimal 3.99).
    LocaleNumeric,
    /// Trim and collapse internal whitespace.
    TrimmedString,
    /// Uppercase and strip non-distinguishing punctuation.
    ReferenceNormalization,
}

/// Immutable alias and transform table for one schema dialect.
///
/// Loaded once from a base ("default") document, optionally merged
/// with a vendor overlay, then shared read-only across runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSet {
    /// Canonical sheet name to the raw tab names that mean it.
    #[serde(default)]
    pub sheet_aliases: BTreeMap<String, BTreeSet<String>>,
    /// Canonical field name to accepted raw header variants, most
    /// specific first. Matching is case/diacritic-insensitive.
    #[serde(default)]
    pub column_aliases: BTreeMap<String, Vec<String>>,
    /// Canonical field name to the transform applied to its values.
    #[serde(default)]
    pub value_transforms: BTreeMap<String, ValueTransform>,
}

impl RuleSet {
    /// Parses a rule set document and checks its invariants.
    pub fn from_json(name: &str, json: &str) -> Result<Self> {
        let rules: Self = serde_json::from_str(json).map_err(|source| RuleError::Parse {
            name: name.to_string(),
            source,
        })?;
        rules.validate(name)?;
        Ok(rules)
    }

    /// Checks that every transformed field is a known canonical field
    /// or has a column alias entry.
    pub fn validate(&self, name: &str) -> Result<()> {
        for field in self.value_transforms.keys() {
            if !canonical::is_canonical(field) && !self.column_aliases.contains_key(field) {
                return Err(RuleError::Invalid {
                    name: name.to_string(),
                    reason: format!(
                        "value transform for '{field}' has no column alias entry and is not a canonical field"
                    ),
                });
            }
        }
        Ok(())
    }

    /// Merges an overlay on top of this rule set.
    ///
    /// Overlay entries replace base entries for the same canonical
    /// key; keys the overlay does not mention keep the base entry.
    /// Nothing is ever deleted implicitly, so merging an empty
    /// overlay yields the base unchanged.
    pub fn merge(&self, overlay: &RuleSet) -> RuleSet {
        let mut merged = self.clone();
        for (key, names) in &overlay.sheet_aliases {
            merged.sheet_aliases.insert(key.clone(), names.clone());
        }
        for (field, aliases) in &overlay.column_aliases {
            merged.column_aliases.insert(field.clone(), aliases.clone());
        }
        for (field, transform) in &overlay.value_transforms {
            merged.value_transforms.insert(field.clone(), *transform);
        }
        merged
    }

    /// True when no aliases or transforms are defined.
    pub fn is_empty(&self) -> bool {
        self.sheet_aliases.is_empty()
            && self.column_aliases.is_empty()
            && self.value_transforms.is_empty()
    }

    /// Transform configured for a canonical field, if any.
    pub fn transform_for(&self, field: &str) -> Option<ValueTransform> {
        self.value_transforms.get(field).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> RuleSet {
        RuleSet::from_json(
            "base",
            r#"{
                "sheet_aliases": {"produits": ["Produits", "Articles"]},
                "column_aliases": {"reference": ["Reference"], "price": ["PrixHT"]},
                "value_transforms": {"price": "locale-numeric"}
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn overlay_replaces_per_key() {
        let overlay = RuleSet::from_json(
            "overlay",
            r#"{"sheet_aliases": {"produits": ["Articles CEDEO"]}}"#,
        )
        .unwrap();

        let merged = base().merge(&overlay);
        let produits = &merged.sheet_aliases["produits"];
        assert!(produits.contains("Articles CEDEO"));
        assert!(!produits.contains("Produits"));
        // Untouched tables keep the base entries.
        assert_eq!(merged.column_aliases["price"], vec!["PrixHT"]);
    }

    #[test]
    fn empty_overlay_is_identity() {
        let merged = base().merge(&RuleSet::default());
        assert_eq!(merged, base());
    }

    #[test]
    fn merge_is_idempotent() {
        let overlay = RuleSet::from_json(
            "overlay",
            r#"{"column_aliases": {"reference": ["Réf. CEDEO"]}}"#,
        )
        .unwrap();

        let once = base().merge(&overlay);
        let twice = once.merge(&overlay);
        assert_eq!(once, twice);
    }

    #[test]
    fn rejects_transform_without_alias_entry() {
        let result = RuleSet::from_json(
            "bad",
            r#"{"value_transforms": {"gencod": "trimmed-string"}}"#,
        );
        assert!(matches!(result, Err(RuleError::Invalid { .. })));
    }

    #[test]
    fn canonical_fields_may_be_transformed_without_aliases() {
        // "price" is canonical, so a transform alone is fine for
        // markup sources that have no column alias table in play.
        let rules = RuleSet::from_json(
            "markup",
            r#"{"value_transforms": {"price": "locale-numeric"}}"#,
        )
        .unwrap();
        assert_eq!(
            rules.transform_for("price"),
            Some(ValueTransform::LocaleNumeric)
        );
    }
}
