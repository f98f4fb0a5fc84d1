//! Shared row assembly policy.
//!
//! Every parser strategy funnels its raw rows or element groups
//! through [`ProductAssembler`], so the required-field,
//! value-normalization and duplicate-reference policies are identical
//! across physical formats:
//!
//! - blank row: `Skipped`;
//! - missing or unnormalizable required field: `Errored`, no product;
//! - unnormalizable optional field: the field is dropped, the row is
//!   kept;
//! - duplicate reference: the later row is `Errored` naming both row
//!   positions, and its product is still emitted (best-effort
//!   completeness over early termination).

use std::collections::BTreeMap;

use rust_decimal::Decimal;

use fabdis_model::{Product, Reference, RowOutcome, canonical};
use fabdis_rules::engine::{self, ColumnTarget};
use fabdis_rules::RuleSet;

/// Assembles canonical products from normalized (target, raw value)
/// pairs, tracking reference uniqueness across one run.
#[derive(Debug)]
pub struct ProductAssembler<'a> {
    rules: &'a RuleSet,
    /// Reference text to the row that first produced it.
    seen: BTreeMap<String, usize>,
    /// Out-of-band prices (e.g. a Tarifs tab), keyed by normalized
    /// reference. Consulted when a row has no usable price field.
    price_lookup: Option<BTreeMap<String, Decimal>>,
}

impl<'a> ProductAssembler<'a> {
    pub fn new(rules: &'a RuleSet) -> Self {
        Self {
            rules,
            seen: BTreeMap::new(),
            price_lookup: None,
        }
    }

    pub fn with_price_lookup(rules: &'a RuleSet, prices: BTreeMap<String, Decimal>) -> Self {
        Self {
            rules,
            seen: BTreeMap::new(),
            price_lookup: Some(prices),
        }
    }

    /// Assembles one raw row.
    ///
    /// `position` is the 1-based data row (or element group) position
    /// in the source. Returns the product (when one was assembled)
    /// and exactly one outcome.
    pub fn assemble(
        &mut self,
        position: usize,
        fields: &[(ColumnTarget, String)],
    ) -> (Option<Product>, RowOutcome) {
        if fields.iter().all(|(_, value)| value.trim().is_empty()) {
            return (None, RowOutcome::skipped(position, "blank row"));
        }

        let mut reference: Option<String> = None;
        let mut name: Option<String> = None;
        let mut brand: Option<String> = None;
        let mut price: Option<Decimal> = None;
        let mut attributes = BTreeMap::new();

        for (target, raw) in fields {
            let raw = raw.trim();
            if raw.is_empty() {
                continue;
            }
            match target {
                ColumnTarget::Ignored => {}
                ColumnTarget::Attribute(attr_name) => {
                    attributes.insert(attr_name.clone(), engine::collapse_whitespace(raw));
                }
                ColumnTarget::Canonical(field) => {
                    match engine::normalize_value(field, raw, self.rules) {
                        Ok(value) => match field.as_str() {
                            canonical::REFERENCE => reference = Some(value.into_text()),
                            canonical::NAME => name = Some(value.into_text()),
                            canonical::BRAND => brand = Some(value.into_text()),
                            canonical::PRICE => match value.as_number() {
                                Some(number) => price = Some(number),
                                None => {
                                    return (
                                        None,
                                        RowOutcome::errored(
                                            position,
                                            format!("price value '{raw}' is not numeric"),
                                        ),
                                    );
                                }
                            },
                            // A canonical field outside the fixed set
                            // (rule-set extension) rides along as an
                            // attribute.
                            other => {
                                attributes.insert(other.to_string(), value.into_text());
                            }
                        },
                        Err(err) if canonical::is_required(field) => {
                            return (None, RowOutcome::errored(position, err.to_string()));
                        }
                        Err(err) => {
                            tracing::debug!(row = position, %err, "dropping optional field");
                        }
                    }
                }
            }
        }

        let Some(reference) = reference else {
            return (None, self.missing_field(position, canonical::REFERENCE));
        };
        let Some(name) = name else {
            return (None, self.missing_field(position, canonical::NAME));
        };

        if price.is_none() {
            price = self
                .price_lookup
                .as_ref()
                .and_then(|lookup| lookup.get(&reference).copied());
        }
        let Some(price) = price else {
            return (None, self.missing_field(position, canonical::PRICE));
        };

        let parsed_reference = match Reference::new(reference.clone()) {
            Ok(parsed) => parsed,
            Err(err) => return (None, RowOutcome::errored(position, err.to_string())),
        };

        let product = match Product::new(parsed_reference, name, brand, price, attributes) {
            Ok(product) => product,
            Err(err) => return (None, RowOutcome::errored(position, err.to_string())),
        };

        // Duplicates are reported against both positions, but the
        // product is still emitted.
        let outcome = match self.seen.get(&reference) {
            Some(first_row) => RowOutcome::errored(
                position,
                format!(
                    "duplicate reference '{reference}' (rows {first_row} and {position})"
                ),
            ),
            None => {
                self.seen.insert(reference, position);
                RowOutcome::accepted(position)
            }
        };

        (Some(product), outcome)
    }

    fn missing_field(&self, position: usize, field: &str) -> RowOutcome {
        RowOutcome::errored(position, format!("missing required field '{field}'"))
    }
}

/// Pairs a tabular row's cells with their column targets, padding
/// short rows with empty cells.
pub fn pair_cells(
    targets: &[ColumnTarget],
    cells: &[String],
) -> Vec<(ColumnTarget, String)> {
    targets
        .iter()
        .enumerate()
        .map(|(index, target)| {
            (
                target.clone(),
                cells.get(index).cloned().unwrap_or_default(),
            )
        })
        .collect()
}
