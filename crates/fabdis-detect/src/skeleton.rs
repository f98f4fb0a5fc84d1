//! Structural skeleton extraction.
//!
//! A skeleton is a cheap, format-specific summary of a file's
//! structure: tab names plus first header row for spreadsheets, the
//! header row for delimited text, root element and immediate child
//! tags for markup. Detection stays O(header size), never O(file
//! size); the body is parsed later, by the selected pipeline.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use calamine::{Reader as SpreadsheetReader, open_workbook_auto};
use quick_xml::Reader;
use quick_xml::events::Event;

use fabdis_model::PhysicalFormat;

use crate::error::{DetectError, Result};

/// Markup skeletons stop scanning after this many XML events.
const MAX_MARKUP_EVENTS: usize = 4096;

/// One spreadsheet tab: its raw name and raw first-row headers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetSkeleton {
    pub name: String,
    pub headers: Vec<String>,
}

/// Format-specific structural summary of one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StructuralSkeleton {
    Spreadsheet {
        sheets: Vec<SheetSkeleton>,
    },
    Delimited {
        delimiter: u8,
        headers: Vec<String>,
    },
    Markup {
        root: String,
        namespace: Option<String>,
        children: Vec<String>,
    },
}

impl StructuralSkeleton {
    /// Compact rendering for structural-failure diagnostics.
    pub fn describe(&self) -> String {
        match self {
            Self::Spreadsheet { sheets } => {
                let names: Vec<&str> = sheets.iter().map(|s| s.name.as_str()).collect();
                format!("spreadsheet tabs [{}]", names.join(", "))
            }
            Self::Delimited { headers, .. } => {
                format!("delimited headers [{}]", headers.join(", "))
            }
            Self::Markup {
                root, children, ..
            } => format!("markup root <{root}> with children [{}]", children.join(", ")),
        }
    }
}

/// Extracts the structural skeleton for an already-classified file.
pub fn read_skeleton(path: &Path, format: PhysicalFormat) -> Result<StructuralSkeleton> {
    match format {
        PhysicalFormat::Spreadsheet => read_spreadsheet_skeleton(path),
        PhysicalFormat::DelimitedText => read_delimited_skeleton(path),
        PhysicalFormat::StructuredMarkup => read_markup_skeleton(path),
    }
}

fn read_spreadsheet_skeleton(path: &Path) -> Result<StructuralSkeleton> {
    let mut workbook = open_workbook_auto(path).map_err(|e| DetectError::Skeleton {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let names: Vec<String> = workbook.sheet_names().to_vec();
    let mut sheets = Vec::with_capacity(names.len());
    for name in names {
        let range = workbook
            .worksheet_range(&name)
            .map_err(|e| DetectError::Skeleton {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
        let headers = range
            .rows()
            .next()
            .map(|row| {
                row.iter()
                    .map(|cell| cell.to_string().trim().to_string())
                    .collect()
            })
            .unwrap_or_default();
        sheets.push(SheetSkeleton { name, headers });
    }

    Ok(StructuralSkeleton::Spreadsheet { sheets })
}

/// Sniffs the delimiter from the header line, preferring `;` (the
/// dominant FAB-DIS convention) on ties.
pub fn sniff_delimiter(header_line: &str) -> u8 {
    let candidates = [b';', b',', b'\t', b'|'];
    let mut best = b';';
    let mut best_count = 0usize;
    for candidate in candidates {
        let count = header_line.bytes().filter(|b| *b == candidate).count();
        if count > best_count {
            best = candidate;
            best_count = count;
        }
    }
    best
}

fn read_delimited_skeleton(path: &Path) -> Result<StructuralSkeleton> {
    let file = File::open(path).map_err(|source| DetectError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    let mut reader = BufReader::new(file);
    let mut first_line = String::new();
    reader
        .read_line(&mut first_line)
        .map_err(|source| DetectError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;

    let first_line = first_line.trim_start_matches('\u{feff}');
    if first_line.trim().is_empty() {
        return Err(DetectError::Skeleton {
            path: path.to_path_buf(),
            message: "empty header line".to_string(),
        });
    }

    let delimiter = sniff_delimiter(first_line);
    let mut csv_reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(first_line.as_bytes());
    let headers = csv_reader
        .headers()
        .map_err(|e| DetectError::Skeleton {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    Ok(StructuralSkeleton::Delimited { delimiter, headers })
}

fn read_markup_skeleton(path: &Path) -> Result<StructuralSkeleton> {
    let file = File::open(path).map_err(|source| DetectError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    let mut reader = Reader::from_reader(BufReader::new(file));
    reader.config_mut().trim_text(true);

    let mut buf = Vec::new();
    let mut root: Option<String> = None;
    let mut namespace: Option<String> = None;
    let mut children: Vec<String> = Vec::new();
    let mut depth = 0usize;

    for _ in 0..MAX_MARKUP_EVENTS {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(element)) => {
                let name = String::from_utf8_lossy(element.local_name().as_ref()).to_string();
                if depth == 0 {
                    namespace = extract_namespace(&element);
                    root = Some(name);
                } else if depth == 1 && !children.contains(&name) {
                    children.push(name);
                }
                depth += 1;
            }
            Ok(Event::Empty(element)) => {
                let name = String::from_utf8_lossy(element.local_name().as_ref()).to_string();
                if depth == 0 {
                    namespace = extract_namespace(&element);
                    root = Some(name);
                } else if depth == 1 && !children.contains(&name) {
                    children.push(name);
                }
            }
            Ok(Event::End(_)) => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    break;
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(DetectError::Skeleton {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                });
            }
            Ok(_) => {}
        }
        buf.clear();
    }

    match root {
        Some(root) => Ok(StructuralSkeleton::Markup {
            root,
            namespace,
            children,
        }),
        None => Err(DetectError::Skeleton {
            path: path.to_path_buf(),
            message: "no root element found".to_string(),
        }),
    }
}

fn extract_namespace(element: &quick_xml::events::BytesStart<'_>) -> Option<String> {
    for attr in element.attributes().flatten() {
        let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
        if key == "xmlns" || key.starts_with("xmlns:") {
            return Some(String::from_utf8_lossy(&attr.value).to_string());
        }
    }
    None
}
