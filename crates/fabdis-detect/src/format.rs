//! Physical format sniffing.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use fabdis_model::PhysicalFormat;

use crate::error::{DetectError, Result};

/// ZIP local-file header, the container signature of xlsx/xlsm.
const ZIP_MAGIC: [u8; 4] = [0x50, 0x4B, 0x03, 0x04];

/// OLE2 compound-document header, the container of legacy xls.
const OLE2_MAGIC: [u8; 4] = [0xD0, 0xCF, 0x11, 0xE0];

/// UTF-8 byte-order mark.
const UTF8_BOM: [u8; 3] = [0xEF, 0xBB, 0xBF];

/// Classifies the physical container of a catalog file.
///
/// The byte signature wins over the declared extension when they
/// disagree: extensions are user-controlled and frequently wrong in
/// the wild. The extension is only consulted when sniffing is
/// inconclusive (delimited text has no signature). Read-only peek.
pub fn detect_format(path: &Path) -> Result<PhysicalFormat> {
    let prefix = read_prefix(path)?;

    if let Some(format) = sniff_signature(&prefix) {
        tracing::debug!(path = %path.display(), format = %format, "format from byte signature");
        return Ok(format);
    }

    if let Some(format) = format_from_extension(path) {
        tracing::debug!(path = %path.display(), format = %format, "format from extension");
        return Ok(format);
    }

    Err(DetectError::UnknownFormat {
        path: path.to_path_buf(),
    })
}

fn read_prefix(path: &Path) -> Result<Vec<u8>> {
    let mut file = File::open(path).map_err(|source| DetectError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    let mut buffer = [0u8; 64];
    let read = file
        .read(&mut buffer)
        .map_err(|source| DetectError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(buffer[..read].to_vec())
}

/// Container signatures. Markup is recognized when the first
/// non-whitespace byte after an optional BOM opens a tag.
fn sniff_signature(prefix: &[u8]) -> Option<PhysicalFormat> {
    if prefix.starts_with(&ZIP_MAGIC) || prefix.starts_with(&OLE2_MAGIC) {
        return Some(PhysicalFormat::Spreadsheet);
    }

    let body = prefix.strip_prefix(&UTF8_BOM[..]).unwrap_or(prefix);
    let first = body.iter().find(|b| !b.is_ascii_whitespace())?;
    if *first == b'<' {
        return Some(PhysicalFormat::StructuredMarkup);
    }

    None
}

fn format_from_extension(path: &Path) -> Option<PhysicalFormat> {
    let extension = path.extension()?.to_str()?.to_ascii_lowercase();
    match extension.as_str() {
        "xlsx" | "xlsm" | "xls" => Some(PhysicalFormat::Spreadsheet),
        "csv" | "tsv" | "txt" => Some(PhysicalFormat::DelimitedText),
        "xml" => Some(PhysicalFormat::StructuredMarkup),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_file(dir: &TempDir, name: &str, bytes: &[u8]) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut file = File::create(&path).unwrap();
        file.write_all(bytes).unwrap();
        path
    }

    #[test]
    fn zip_signature_means_spreadsheet() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "catalog.bin", &[0x50, 0x4B, 0x03, 0x04, 0x00]);
        assert_eq!(detect_format(&path).unwrap(), PhysicalFormat::Spreadsheet);
    }

    #[test]
    fn xml_prolog_beats_misleading_extension() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "catalog.xlsx", b"<?xml version=\"1.0\"?><fabdis/>");
        assert_eq!(
            detect_format(&path).unwrap(),
            PhysicalFormat::StructuredMarkup
        );
    }

    #[test]
    fn bom_before_markup_is_tolerated() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "catalog.dat", b"\xEF\xBB\xBF  <fabdis/>");
        assert_eq!(
            detect_format(&path).unwrap(),
            PhysicalFormat::StructuredMarkup
        );
    }

    #[test]
    fn csv_falls_back_to_extension() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "catalog.csv", b"Reference;Designation;PrixHT\n");
        assert_eq!(detect_format(&path).unwrap(), PhysicalFormat::DelimitedText);
    }

    #[test]
    fn unrecognized_file_is_unknown_format() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "catalog.bin", b"plain text, no clue");
        assert!(matches!(
            detect_format(&path),
            Err(DetectError::UnknownFormat { .. })
        ));
    }

    #[test]
    fn missing_file_is_read_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("absent.csv");
        assert!(matches!(
            detect_format(&path),
            Err(DetectError::FileRead { .. })
        ));
    }
}
