//! Named rows decoded against the canonical header of each record kind

use csv::StringRecord;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::importer::ImportError;
use super::RecordKind;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StudentRow {
    #[serde(rename = "User_id")]
    pub user_id: String,
    #[serde(rename = "Last_name")]
    pub last_name: String,
    #[serde(rename = "First_name")]
    pub first_name: String,
    #[serde(rename = "Study_group")]
    pub group_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TeacherRow {
    #[serde(rename = "User_id")]
    pub user_id: String,
    #[serde(rename = "Last_name")]
    pub last_name: String,
    #[serde(rename = "First_name")]
    pub first_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ScheduleRow {
    pub subject_name: String,
    pub type_name: String,
    pub classroom: String,
    pub group_name: String,
    pub teacher_last_name: String,
    pub teacher_first_name: String,
    pub weekday: String,
    pub start_time: String,
    pub end_time: String,
}

/// Decodes validated rows (header at index 0) into named records
///
/// Row indexes in errors count data rows from 0.
pub fn decode<T: DeserializeOwned>(kind: RecordKind, rows: &[StringRecord]) -> Result<Vec<T>, ImportError> {
    let header = StringRecord::from(kind.expected_headers().to_vec());
    rows.iter()
        .skip(1)
        .enumerate()
        .map(|(row_index, record)| {
            record.deserialize(Some(&header)).map_err(|e| ImportError::RowParseError {
                row_index,
                cause: e.to_string(),
            })
        })
        .collect()
}
