//! Markup extraction: FAB-DIS 3.x XML catalogs.
//!
//! Streams the document once. Each direct child of the root element
//! is one product group; its attributes and child-element texts form
//! the raw fields, which go through the same column mapping and row
//! assembly as tabular sources.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use fabdis_detect::DetectionReport;
use fabdis_model::PhysicalFormat;
use fabdis_rules::RuleSet;
use fabdis_rules::engine::{self, ColumnTarget};

use crate::assembly::ProductAssembler;
use crate::error::{IngestError, Result};
use crate::pipeline::{Extraction, ParserPipeline};

/// FAB-DIS 3.x: element groups under the document root.
pub struct MarkupPipeline;

impl ParserPipeline for MarkupPipeline {
    fn name(&self) -> &'static str {
        "markup-3.0"
    }

    fn extract(&self, path: &Path, report: &DetectionReport) -> Result<Extraction> {
        if report.physical_format != PhysicalFormat::StructuredMarkup {
            return Err(IngestError::StructuralExtractionFailed {
                path: path.to_path_buf(),
                reason: format!(
                    "the 3.x markup strategy cannot read {}",
                    report.physical_format
                ),
            });
        }
        extract_markup(path, &report.resolved_ruleset)
    }
}

fn extract_markup(path: &Path, rules: &RuleSet) -> Result<Extraction> {
    let file = File::open(path).map_err(|source| IngestError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    let mut reader = Reader::from_reader(BufReader::new(file));
    reader.config_mut().trim_text(true);

    let mut extraction = Extraction::default();
    let mut assembler = ProductAssembler::new(rules);

    let mut buf = Vec::new();
    let mut depth = 0usize;
    // Raw (name, text) fields of the group being read, in document
    // order. None outside a group.
    let mut group: Option<Vec<(String, String)>> = None;
    let mut current_child: Option<String> = None;
    let mut current_text = String::new();
    let mut position = 0usize;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(element)) => {
                match depth {
                    0 => {}
                    1 => {
                        position += 1;
                        group = Some(attribute_fields(&element));
                    }
                    2 => {
                        current_child = Some(local_name(&element));
                        current_text.clear();
                    }
                    // Deeper nesting flattens into the depth-2 child.
                    _ => {}
                }
                depth += 1;
            }
            Ok(Event::Empty(element)) => match depth {
                1 => {
                    position += 1;
                    let fields = attribute_fields(&element);
                    finish_group(&mut assembler, &mut extraction, position, fields, rules);
                }
                2 => {
                    if let Some(fields) = group.as_mut() {
                        fields.push((local_name(&element), String::new()));
                    }
                }
                _ => {}
            },
            Ok(Event::Text(text)) => {
                if depth >= 3 && current_child.is_some() {
                    let decoded = text.xml_content().map_err(|e| {
                        IngestError::StructuralExtractionFailed {
                            path: path.to_path_buf(),
                            reason: e.to_string(),
                        }
                    })?;
                    current_text.push_str(&decoded);
                }
            }
            // Entity references the reader chose not to expand
            // inline arrive as their own events.
            Ok(Event::GeneralRef(reference)) => {
                if depth >= 3 && current_child.is_some() {
                    append_reference(&mut current_text, &reference);
                }
            }
            Ok(Event::End(_)) => {
                depth = depth.saturating_sub(1);
                match depth {
                    2 => {
                        if let (Some(fields), Some(name)) = (group.as_mut(), current_child.take()) {
                            fields.push((name, std::mem::take(&mut current_text)));
                        }
                    }
                    1 => {
                        if let Some(fields) = group.take() {
                            finish_group(&mut assembler, &mut extraction, position, fields, rules);
                        }
                    }
                    _ => {}
                }
            }
            Ok(Event::Eof) => break,
            // A well-formedness error makes further iteration
            // impossible, so the whole file fails structurally.
            Err(e) => {
                return Err(IngestError::StructuralExtractionFailed {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                });
            }
            Ok(_) => {}
        }
        buf.clear();
    }

    tracing::info!(
        path = %path.display(),
        accepted = extraction.stats.accepted(),
        skipped = extraction.stats.skipped(),
        errored = extraction.stats.errored(),
        "markup extraction finished"
    );

    Ok(extraction)
}

fn local_name(element: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(element.local_name().as_ref()).to_string()
}

/// A group element's own attributes count as raw fields, alongside
/// its child elements.
fn attribute_fields(element: &BytesStart<'_>) -> Vec<(String, String)> {
    element
        .attributes()
        .flatten()
        .map(|attr| {
            (
                String::from_utf8_lossy(attr.key.as_ref()).to_string(),
                String::from_utf8_lossy(&attr.value).trim().to_string(),
            )
        })
        .collect()
}

/// Resolves predefined and character entity references; anything
/// else (undeclared custom entities) is dropped.
fn append_reference(text: &mut String, reference: &[u8]) {
    match reference {
        b"amp" => text.push('&'),
        b"lt" => text.push('<'),
        b"gt" => text.push('>'),
        b"apos" => text.push('\''),
        b"quot" => text.push('"'),
        [b'#', digits @ ..] => {
            let raw = String::from_utf8_lossy(digits);
            let code = match raw.strip_prefix('x').or_else(|| raw.strip_prefix('X')) {
                Some(hex) => u32::from_str_radix(hex, 16).ok(),
                None => raw.parse().ok(),
            };
            if let Some(c) = code.and_then(char::from_u32) {
                text.push(c);
            }
        }
        _ => {}
    }
}

/// Maps one group's raw fields to column targets (first binding of a
/// canonical field wins, repeats demote to attributes) and assembles.
fn finish_group(
    assembler: &mut ProductAssembler<'_>,
    extraction: &mut Extraction,
    position: usize,
    raw_fields: Vec<(String, String)>,
    rules: &RuleSet,
) {
    let mut bound: Vec<&str> = Vec::new();
    let mut fields = Vec::with_capacity(raw_fields.len());
    for (name, value) in raw_fields {
        let target = match engine::canonical_column(&name, rules) {
            Some(canonical) if !bound.contains(&canonical) => {
                bound.push(canonical);
                ColumnTarget::Canonical(canonical.to_string())
            }
            _ => ColumnTarget::Attribute(name),
        };
        fields.push((target, value));
    }

    let (product, outcome) = assembler.assemble(position, &fields);
    extraction.stats.record(outcome);
    if let Some(product) = product {
        extraction.products.push(product);
    }
}
