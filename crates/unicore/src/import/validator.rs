use csv::{ReaderBuilder, StringRecord};
use std::io::Read;
use std::path::Path;
use thiserror::Error;

use super::RecordKind;

const BOM: char = '\u{feff}';

/// Why a file was rejected before any row was imported
#[derive(Debug, Error)]
pub enum StructuralError {
    #[error("file has no rows")]
    EmptyFile,

    #[error("file has a header but no data rows")]
    HeaderOnly,

    #[error("header mismatch for {kind}: expected [{}], got [{}]", expected.join(", "), actual.join(", "))]
    HeaderMismatch {
        kind: RecordKind,
        expected: Vec<String>,
        actual: Vec<String>,
    },

    #[error("file could not be parsed: {cause}")]
    MalformedFile { cause: String },

    #[error("file could not be read: {0}")]
    Io(#[from] std::io::Error),
}

/// Opens `path` read-only and validates it as `kind`
///
/// Returns every row including the header.
pub fn validate(path: &Path, kind: RecordKind) -> Result<Vec<StringRecord>, StructuralError> {
    let file = fs_err::File::open(path)?;
    validate_reader(file, kind)
}

/// Validates CSV from any reader as `kind`
pub fn validate_reader<R: Read>(reader: R, kind: RecordKind) -> Result<Vec<StringRecord>, StructuralError> {
    let mut rdr = ReaderBuilder::new().has_headers(false).flexible(false).from_reader(reader);

    let mut rows = Vec::new();
    for record in rdr.records() {
        let record = record.map_err(|e| {
            if e.is_io_error() {
                StructuralError::Io(e.into())
            } else {
                StructuralError::MalformedFile { cause: e.to_string() }
            }
        })?;
        rows.push(record);
    }

    match rows.len() {
        0 => Err(StructuralError::EmptyFile),
        1 => Err(StructuralError::HeaderOnly),
        _ => {
            check_header(&rows[0], kind)?;
            Ok(rows)
        }
    }
}

fn check_header(header: &StringRecord, kind: RecordKind) -> Result<(), StructuralError> {
    let actual: Vec<String> = header
        .iter()
        .enumerate()
        .map(|(i, cell)| match i {
            0 => cell.trim_start_matches(BOM).to_string(),
            _ => cell.to_string(),
        })
        .collect();
    let expected = kind.expected_headers();

    let matches = actual.len() == expected.len()
        && actual.iter().zip(expected).all(|(a, e)| a.to_lowercase() == e.to_lowercase());
    if matches {
        Ok(())
    } else {
        Err(StructuralError::HeaderMismatch {
            kind,
            expected: expected.iter().map(|s| s.to_string()).collect(),
            actual,
        })
    }
}
