//! Workbook extraction: FAB-DIS 2.2 multi-tab workbooks, plus the
//! sheet-reading seam shared with the 2.1 strategy.
//!
//! Reading (calamine) and extraction are deliberately split so the
//! extraction logic is testable on in-memory sheet data without
//! fabricating xlsx containers.

use std::collections::BTreeMap;
use std::path::Path;

use calamine::{Reader as SpreadsheetReader, open_workbook_auto};
use rust_decimal::Decimal;

use fabdis_detect::DetectionReport;
use fabdis_model::{PhysicalFormat, canonical};
use fabdis_rules::RuleSet;
use fabdis_rules::engine;

use crate::assembly::{ProductAssembler, pair_cells};
use crate::delimited::bind_columns;
use crate::error::{IngestError, Result};
use crate::pipeline::{Extraction, ParserPipeline};

/// One tab: raw name plus all rows as trimmed strings.
pub(crate) type SheetData = (String, Vec<Vec<String>>);

/// FAB-DIS 2.2: a Produits tab for identity fields, prices merged in
/// from the Tarifs tab when one exists.
pub struct WorkbookPipeline;

impl ParserPipeline for WorkbookPipeline {
    fn name(&self) -> &'static str {
        "workbook-2.2"
    }

    fn extract(&self, path: &Path, report: &DetectionReport) -> Result<Extraction> {
        if report.physical_format != PhysicalFormat::Spreadsheet {
            return Err(IngestError::StructuralExtractionFailed {
                path: path.to_path_buf(),
                reason: format!(
                    "the 2.2 workbook strategy cannot read {}",
                    report.physical_format
                ),
            });
        }
        let sheets = read_sheets(path)?;
        extract_workbook(path, &sheets, &report.resolved_ruleset)
    }
}

/// Reads every tab of a workbook into raw string rows.
pub(crate) fn read_sheets(path: &Path) -> Result<Vec<SheetData>> {
    let mut workbook =
        open_workbook_auto(path).map_err(|e| IngestError::StructuralExtractionFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

    let names: Vec<String> = workbook.sheet_names().to_vec();
    let mut sheets = Vec::with_capacity(names.len());
    for name in names {
        let range = workbook
            .worksheet_range(&name)
            .map_err(|e| IngestError::StructuralExtractionFailed {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
        let rows: Vec<Vec<String>> = range
            .rows()
            .map(|row| {
                row.iter()
                    .map(|cell| cell.to_string().trim().to_string())
                    .collect()
            })
            .collect();
        sheets.push((name, rows));
    }

    Ok(sheets)
}

/// Finds the tab aliased to a canonical sheet name.
fn find_sheet<'a>(
    sheets: &'a [SheetData],
    canonical_name: &str,
    rules: &RuleSet,
) -> Option<&'a SheetData> {
    sheets
        .iter()
        .find(|(name, _)| engine::canonical_sheet(name, rules) == Some(canonical_name))
}

/// 2.1-style extraction from a workbook: the produits-aliased tab, or
/// the first tab when no alias matches.
pub(crate) fn extract_single_table(
    path: &Path,
    sheets: &[SheetData],
    rules: &RuleSet,
) -> Result<Extraction> {
    let (name, rows) = find_sheet(sheets, "produits", rules)
        .or(sheets.first())
        .ok_or_else(|| IngestError::StructuralExtractionFailed {
            path: path.to_path_buf(),
            reason: "workbook has no tabs".to_string(),
        })?;

    tracing::debug!(sheet = %name, "extracting single product table");
    extract_table(path, rows, rules, None)
}

/// 2.2 extraction: produits tab plus an optional tarifs price merge.
pub(crate) fn extract_workbook(
    path: &Path,
    sheets: &[SheetData],
    rules: &RuleSet,
) -> Result<Extraction> {
    let (_, product_rows) =
        find_sheet(sheets, "produits", rules).ok_or_else(|| {
            let tabs: Vec<&str> = sheets.iter().map(|(name, _)| name.as_str()).collect();
            IngestError::StructuralExtractionFailed {
                path: path.to_path_buf(),
                reason: format!("no tab aliases to 'produits' among [{}]", tabs.join(", ")),
            }
        })?;

    let price_lookup = find_sheet(sheets, "tarifs", rules)
        .map(|(name, rows)| build_price_lookup(name, rows, rules));

    extract_table(path, product_rows, rules, price_lookup)
}

/// Builds reference -> price from a tarifs tab. Rows that cannot be
/// normalized are logged and left out; the affected products then
/// surface as missing-price outcomes.
fn build_price_lookup(
    sheet: &str,
    rows: &[Vec<String>],
    rules: &RuleSet,
) -> BTreeMap<String, Decimal> {
    let mut lookup = BTreeMap::new();
    let Some(headers) = rows.first() else {
        return lookup;
    };

    let map = engine::map_columns(headers, rules);
    let (Some(reference_index), Some(price_index)) = (
        map.index_of(canonical::REFERENCE),
        map.index_of(canonical::PRICE),
    ) else {
        tracing::warn!(sheet, "tarifs tab lacks reference/price columns, ignoring it");
        return lookup;
    };

    for row in rows.iter().skip(1) {
        let raw_reference = row.get(reference_index).map(String::as_str).unwrap_or("");
        let raw_price = row.get(price_index).map(String::as_str).unwrap_or("");
        if raw_reference.is_empty() {
            continue;
        }

        let reference = match engine::normalize_value(canonical::REFERENCE, raw_reference, rules) {
            Ok(value) => value.into_text(),
            Err(err) => {
                tracing::warn!(sheet, %err, "skipping tariff row");
                continue;
            }
        };
        match engine::normalize_value(canonical::PRICE, raw_price, rules) {
            Ok(value) => {
                if let Some(price) = value.as_number() {
                    lookup.insert(reference, price);
                }
            }
            Err(err) => tracing::warn!(sheet, %err, "skipping tariff row"),
        }
    }

    lookup
}

/// Shared sheet-table extraction: header row, column binding, then
/// row assembly.
fn extract_table(
    path: &Path,
    rows: &[Vec<String>],
    rules: &RuleSet,
    price_lookup: Option<BTreeMap<String, Decimal>>,
) -> Result<Extraction> {
    let Some(headers) = rows.first() else {
        return Err(IngestError::StructuralExtractionFailed {
            path: path.to_path_buf(),
            reason: "product tab has no header row".to_string(),
        });
    };

    let map = bind_columns(path, headers, rules, price_lookup.is_some())?;
    let mut assembler = match price_lookup {
        Some(lookup) => ProductAssembler::with_price_lookup(rules, lookup),
        None => ProductAssembler::new(rules),
    };

    let mut extraction = Extraction::default();
    for (index, row) in rows.iter().skip(1).enumerate() {
        let position = index + 1;
        let fields = pair_cells(map.targets(), row);
        let (product, outcome) = assembler.assemble(position, &fields);
        extraction.stats.record(outcome);
        if let Some(product) = product {
            extraction.products.push(product);
        }
    }

    tracing::info!(
        path = %path.display(),
        accepted = extraction.stats.accepted(),
        skipped = extraction.stats.skipped(),
        errored = extraction.stats.errored(),
        "workbook extraction finished"
    );

    Ok(extraction)
}

#[cfg(test)]
mod tests {
    use super::*;
    use fabdis_rules::presets;

    fn rules() -> RuleSet {
        presets::default_ruleset().unwrap()
    }

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| (*c).to_string()).collect()
    }

    fn path() -> std::path::PathBuf {
        std::path::PathBuf::from("catalog.xlsx")
    }

    #[test]
    fn workbook_merges_prices_from_tarifs_tab() {
        let sheets = vec![
            (
                "Produits".to_string(),
                vec![
                    row(&["Référence", "Désignation", "Marque"]),
                    row(&["AB-1", "Coude cuivre", "Comap"]),
                    row(&["AB-2", "Té laiton", "Comap"]),
                ],
            ),
            (
                "Tarifs".to_string(),
                vec![
                    row(&["Référence", "Prix HT"]),
                    row(&["AB-1", "3,99"]),
                    row(&["AB-2", "12,50 €"]),
                ],
            ),
            ("Marques".to_string(), vec![row(&["Marque"])]),
        ];

        let extraction = extract_workbook(&path(), &sheets, &rules()).unwrap();
        assert_eq!(extraction.products.len(), 2);
        assert_eq!(extraction.products[0].price, Decimal::new(399, 2));
        assert_eq!(extraction.products[0].brand.as_deref(), Some("Comap"));
        assert_eq!(extraction.products[1].price, Decimal::new(1250, 2));
    }

    #[test]
    fn product_without_tariff_entry_is_errored() {
        let sheets = vec![
            (
                "Produits".to_string(),
                vec![
                    row(&["Référence", "Désignation"]),
                    row(&["AB-1", "Coude cuivre"]),
                    row(&["AB-9", "Orphelin"]),
                ],
            ),
            (
                "Tarifs".to_string(),
                vec![row(&["Référence", "Prix HT"]), row(&["AB-1", "3,99"])],
            ),
        ];

        let extraction = extract_workbook(&path(), &sheets, &rules()).unwrap();
        assert_eq!(extraction.products.len(), 1);
        assert_eq!(extraction.stats.errored(), 1);
        let reason = extraction.stats.outcomes()[1].reason().unwrap();
        assert!(reason.contains("'price'"), "got: {reason}");
    }

    #[test]
    fn missing_produits_tab_is_structural_and_names_raw_tabs() {
        let sheets = vec![("Feuille1".to_string(), vec![row(&["a", "b"])])];

        let result = extract_workbook(&path(), &sheets, &rules());
        match result {
            Err(IngestError::StructuralExtractionFailed { reason, .. }) => {
                assert!(reason.contains("Feuille1"), "got: {reason}");
            }
            other => panic!("expected structural failure, got {other:?}"),
        }
    }

    #[test]
    fn single_table_falls_back_to_first_tab() {
        let sheets = vec![(
            "Export".to_string(),
            vec![
                row(&["Reference", "Designation", "PrixHT"]),
                row(&["AB-1", "Coude", "3.99"]),
            ],
        )];

        let extraction = extract_single_table(&path(), &sheets, &rules()).unwrap();
        assert_eq!(extraction.products.len(), 1);
    }

    #[test]
    fn renamed_product_tab_matches_via_alias() {
        let sheets = vec![
            ("Couverture".to_string(), vec![row(&["titre"])]),
            (
                "ArticlesFabdis".to_string(),
                vec![
                    row(&["Reference", "Designation", "PrixHT"]),
                    row(&["AB-1", "Coude", "3,99"]),
                ],
            ),
        ];

        let extraction = extract_single_table(&path(), &sheets, &rules()).unwrap();
        assert_eq!(extraction.products.len(), 1);
        assert_eq!(extraction.products[0].name, "Coude");
    }

    #[test]
    fn prices_in_produits_tab_work_without_tarifs() {
        let sheets = vec![(
            "Produits".to_string(),
            vec![
                row(&["Référence", "Désignation", "PrixHT"]),
                row(&["AB-1", "Coude", "3,99"]),
            ],
        )];

        let extraction = extract_workbook(&path(), &sheets, &rules()).unwrap();
        assert_eq!(extraction.products.len(), 1);
    }
}
