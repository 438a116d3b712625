//! CSV import pipeline: structural validation, named-row decoding and the
//! all-or-nothing importer.

pub mod importer;
pub mod records;
pub mod validator;

use std::path::Path;
use strum::{AsRefStr, Display, EnumIter, EnumString};

use crate::core::AppResult;

pub use importer::{ImportError, Importer};
pub use records::{ScheduleRow, StudentRow, TeacherRow};
pub use validator::{validate, validate_reader, StructuralError};

/// What an uploaded file contains
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, AsRefStr, Display, EnumString, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum RecordKind {
    Students,
    Teachers,
    Schedule,
}

impl RecordKind {
    /// Header row a file of this kind must carry (compared case-insensitively)
    pub fn expected_headers(self) -> &'static [&'static str] {
        match self {
            RecordKind::Students => &["User_id", "Last_name", "First_name", "Study_group"],
            RecordKind::Teachers => &["User_id", "Last_name", "First_name"],
            RecordKind::Schedule => &[
                "subject_name",
                "type_name",
                "classroom",
                "group_name",
                "teacher_last_name",
                "teacher_first_name",
                "weekday",
                "start_time",
                "end_time",
            ],
        }
    }
}

/// Result of a committed import
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportSummary {
    pub kind: RecordKind,
    /// Data rows written (header excluded)
    pub rows: usize,
}

/// Validates a staged file and imports it in one transaction
pub fn import_file(importer: &Importer, path: &Path, kind: RecordKind) -> AppResult<ImportSummary> {
    let rows = validate(path, kind)?;
    let summary = importer.import(kind, &rows)?;
    log::info!("Imported {} {} rows from {}", summary.rows, kind, path.display());
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_kind_names() {
        assert_eq!("schedule".parse::<RecordKind>().unwrap(), RecordKind::Schedule);
        assert_eq!(RecordKind::Students.to_string(), "students");
        assert!("grades".parse::<RecordKind>().is_err());
    }

    #[test]
    fn test_header_widths() {
        let widths: Vec<usize> = RecordKind::iter().map(|k| k.expected_headers().len()).collect();
        assert_eq!(widths, vec![4, 3, 9]);
    }
}
