//! Applies a [`RuleSet`] to raw structure and raw cell values.
//!
//! Pure functions of (raw input, rules); no I/O. Structure
//! normalization renames tabs and headers to canonical names; value
//! normalization applies the configured per-field transform.

use rust_decimal::Decimal;

use crate::error::ValueNormalizationError;
use crate::ruleset::{RuleSet, ValueTransform};

/// A normalized cell value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    Number(Decimal),
}

impl FieldValue {
    /// Textual rendering, used when the value lands in `attributes`.
    pub fn into_text(self) -> String {
        match self {
            Self::Text(text) => text,
            Self::Number(number) => number.to_string(),
        }
    }

    pub fn as_number(&self) -> Option<Decimal> {
        match self {
            Self::Number(number) => Some(*number),
            Self::Text(_) => None,
        }
    }
}

/// Where one raw column ends up after header renaming.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnTarget {
    /// Matched a canonical field alias.
    Canonical(String),
    /// No alias matched; value passes through as a product attribute
    /// under the trimmed raw header.
    Attribute(String),
    /// Header cell was blank; the column is ignored.
    Ignored,
}

/// Per-index column bindings for one tabular source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnMap {
    targets: Vec<ColumnTarget>,
}

impl ColumnMap {
    pub fn targets(&self) -> &[ColumnTarget] {
        &self.targets
    }

    /// Index of the column bound to a canonical field, if any.
    pub fn index_of(&self, field: &str) -> Option<usize> {
        self.targets.iter().position(
            |target| matches!(target, ColumnTarget::Canonical(name) if name == field),
        )
    }

    /// Canonical fields bound by this map.
    pub fn bound_fields(&self) -> Vec<&str> {
        self.targets
            .iter()
            .filter_map(|target| match target {
                ColumnTarget::Canonical(name) => Some(name.as_str()),
                _ => None,
            })
            .collect()
    }
}

/// Folds a raw name for alias comparison: lowercases, strips French
/// diacritics, and treats separator runs as single spaces.
pub fn fold_key(raw: &str) -> String {
    let mut folded = String::with_capacity(raw.len());
    for c in raw.trim().chars() {
        let lower = match c {
            'à' | 'â' | 'ä' | 'á' => 'a',
            'é' | 'è' | 'ê' | 'ë' => 'e',
            'î' | 'ï' | 'í' => 'i',
            'ô' | 'ö' | 'ó' => 'o',
            'ù' | 'û' | 'ü' | 'ú' => 'u',
            'ç' => 'c',
            'À' | 'Â' | 'Ä' | 'Á' => 'a',
            'É' | 'È' | 'Ê' | 'Ë' => 'e',
            'Î' | 'Ï' | 'Í' => 'i',
            'Ô' | 'Ö' | 'Ó' => 'o',
            'Ù' | 'Û' | 'Ü' | 'Ú' => 'u',
            'Ç' => 'c',
            '_' | '-' | '.' | '/' | '\\' => ' ',
            other => other.to_ascii_lowercase(),
        };
        folded.push(lower);
    }
    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Resolves a raw tab name to its canonical sheet key.
pub fn canonical_sheet<'a>(raw: &str, rules: &'a RuleSet) -> Option<&'a str> {
    let folded = fold_key(raw);
    rules.sheet_aliases.iter().find_map(|(canonical, names)| {
        names
            .iter()
            .any(|name| fold_key(name) == folded)
            .then_some(canonical.as_str())
    })
}

/// Resolves a raw header to its canonical field name.
///
/// Alias lists are scanned in declaration order; the first match
/// wins. Canonical keys themselves also match (a source that already
/// uses `reference` needs no alias entry).
pub fn canonical_column<'a>(raw: &str, rules: &'a RuleSet) -> Option<&'a str> {
    let folded = fold_key(raw);
    rules.column_aliases.iter().find_map(|(canonical, aliases)| {
        (fold_key(canonical) == folded || aliases.iter().any(|alias| fold_key(alias) == folded))
            .then_some(canonical.as_str())
    })
}

/// Renames a tabular header row into canonical column bindings.
///
/// Each canonical field binds at most once; a second column matching
/// the same field passes through as an attribute instead, so no data
/// is silently dropped.
pub fn map_columns(headers: &[String], rules: &RuleSet) -> ColumnMap {
    let mut targets = Vec::with_capacity(headers.len());
    let mut bound: Vec<&str> = Vec::new();

    for header in headers {
        let trimmed = header.trim();
        if trimmed.is_empty() {
            targets.push(ColumnTarget::Ignored);
            continue;
        }
        match canonical_column(trimmed, rules) {
            Some(canonical) if !bound.contains(&canonical) => {
                bound.push(canonical);
                targets.push(ColumnTarget::Canonical(canonical.to_string()));
            }
            _ => targets.push(ColumnTarget::Attribute(trimmed.to_string())),
        }
    }

    ColumnMap { targets }
}

/// Applies the transform configured for `field` to a raw value.
///
/// Fields without a configured transform get the trimmed-string
/// behavior. Failure is a value, not a panic: the caller decides
/// whether the field was required for the row.
pub fn normalize_value(
    field: &str,
    raw: &str,
    rules: &RuleSet,
) -> Result<FieldValue, ValueNormalizationError> {
    let transform = rules
        .transform_for(field)
        .unwrap_or(ValueTransform::TrimmedString);
    apply_transform(field, raw, transform)
}

fn apply_transform(
    field: &str,
    raw: &str,
    transform: ValueTransform,
) -> Result<FieldValue, ValueNormalizationError> {
    match transform {
        ValueTransform::TrimmedString => Ok(FieldValue::Text(collapse_whitespace(raw))),
        ValueTransform::ReferenceNormalization => {
            let normalized = normalize_reference(raw);
            if normalized.is_empty() {
                return Err(ValueNormalizationError::new(field, raw));
            }
            Ok(FieldValue::Text(normalized))
        }
        ValueTransform::LocaleNumeric => parse_locale_decimal(raw)
            .map(FieldValue::Number)
            .ok_or_else(|| ValueNormalizationError::new(field, raw)),
    }
}

/// Trims and collapses internal whitespace runs to single spaces.
pub fn collapse_whitespace(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Normalizes a reference code: uppercase, no spacing, punctuation
/// reduced to the distinguishing set (`-`, `_`, `/`, `.`).
pub fn normalize_reference(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, '-' | '_' | '/' | '.'))
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

/// Parses a locale-tolerant decimal number.
///
/// Strips currency symbols, currency codes and all spacing (incl.
/// NBSP). Separator policy, applied deterministically:
/// - both `.` and `,` present: the rightmost one is the decimal mark,
///   every occurrence of the other is grouping;
/// - a single separator kind occurring once is the decimal mark;
/// - a single separator kind occurring more than once is grouping.
pub fn parse_locale_decimal(raw: &str) -> Option<Decimal> {
    let mut cleaned: String = raw
        .chars()
        .filter(|c| !c.is_whitespace() && !matches!(c, '€' | '$' | '£'))
        .collect();

    for code in ["EUR", "eur", "Eur"] {
        if let Some(stripped) = cleaned.strip_suffix(code).or(cleaned.strip_prefix(code)) {
            cleaned = stripped.to_string();
            break;
        }
    }

    if cleaned.is_empty() || !cleaned.chars().all(|c| c.is_ascii_digit() || matches!(c, '.' | ',' | '+' | '-')) {
        return None;
    }

    let dots = cleaned.matches('.').count();
    let commas = cleaned.matches(',').count();

    let resolved = match (dots, commas) {
        (0, 0) => cleaned,
        (_, 0) if dots == 1 => cleaned,
        (_, 0) => cleaned.replace('.', ""),
        (0, _) if commas == 1 => cleaned.replace(',', "."),
        (0, _) => cleaned.replace(',', ""),
        _ => {
            // Both present: rightmost separator is the decimal mark.
            let last_dot = cleaned.rfind('.').unwrap_or(0);
            let last_comma = cleaned.rfind(',').unwrap_or(0);
            if last_dot > last_comma {
                cleaned.replace(',', "")
            } else {
                cleaned.replace('.', "").replace(',', ".")
            }
        }
    };

    resolved.parse::<Decimal>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presets;

    fn rules() -> RuleSet {
        presets::default_ruleset().unwrap()
    }

    #[test]
    fn fold_key_is_diacritic_and_case_insensitive() {
        assert_eq!(fold_key("Référence"), fold_key("reference"));
        assert_eq!(fold_key("Désignation "), "designation");
        assert_eq!(fold_key("Prix_unitaire-HT"), "prix unitaire ht");
    }

    #[test]
    fn canonical_sheet_matches_aliases() {
        assert_eq!(canonical_sheet("ArticlesFabdis", &rules()), Some("produits"));
        assert_eq!(canonical_sheet("TARIFS", &rules()), Some("tarifs"));
        assert_eq!(canonical_sheet("Feuille1", &rules()), None);
    }

    #[test]
    fn map_columns_renames_and_passes_through() {
        let headers = vec![
            "Référence".to_string(),
            "Designation".to_string(),
            "PrixHT".to_string(),
            "Gencod".to_string(),
        ];
        let map = map_columns(&headers, &rules());

        assert_eq!(map.index_of("reference"), Some(0));
        assert_eq!(map.index_of("name"), Some(1));
        assert_eq!(map.index_of("price"), Some(2));
        assert_eq!(
            map.targets()[3],
            ColumnTarget::Attribute("Gencod".to_string())
        );
    }

    #[test]
    fn second_match_for_same_field_becomes_attribute() {
        let headers = vec!["Reference".to_string(), "Réf".to_string()];
        let map = map_columns(&headers, &rules());

        assert_eq!(map.index_of("reference"), Some(0));
        assert_eq!(map.targets()[1], ColumnTarget::Attribute("Réf".to_string()));
    }

    #[test]
    fn locale_decimal_accepts_both_marks() {
        assert_eq!(parse_locale_decimal("3,99 €"), Some(Decimal::new(399, 2)));
        assert_eq!(parse_locale_decimal("3.99"), Some(Decimal::new(399, 2)));
        assert_eq!(
            parse_locale_decimal("1 234,56"),
            Some(Decimal::new(123_456, 2))
        );
        assert_eq!(
            parse_locale_decimal("1,234,567.89"),
            Some(Decimal::new(123_456_789, 2))
        );
        assert_eq!(
            parse_locale_decimal("1.234.567,89"),
            Some(Decimal::new(123_456_789, 2))
        );
        assert_eq!(parse_locale_decimal("12 EUR"), Some(Decimal::new(12, 0)));
    }

    #[test]
    fn locale_decimal_rejects_garbage() {
        assert_eq!(parse_locale_decimal("n/a"), None);
        assert_eq!(parse_locale_decimal(""), None);
        assert_eq!(parse_locale_decimal("12,3x"), None);
    }

    #[test]
    fn normalize_value_routes_by_field() {
        let price = normalize_value("price", "3,99 €", &rules()).unwrap();
        assert_eq!(price.as_number(), Some(Decimal::new(399, 2)));

        let name = normalize_value("name", "  Raccord   laiton ", &rules()).unwrap();
        assert_eq!(name, FieldValue::Text("Raccord laiton".to_string()));

        let reference = normalize_value("reference", " ab 123*z ", &rules()).unwrap();
        assert_eq!(reference, FieldValue::Text("AB123Z".to_string()));
    }

    #[test]
    fn normalize_value_failure_names_field_and_value() {
        let err = normalize_value("price", "gratuit", &rules()).unwrap_err();
        assert_eq!(err.field, "price");
        assert_eq!(err.value, "gratuit");
    }

    #[test]
    fn unconfigured_field_gets_trimmed_string() {
        let value = normalize_value("gencod", " 3250 61000 ", &RuleSet::default()).unwrap();
        assert_eq!(value, FieldValue::Text("3250 61000".to_string()));
    }
}
