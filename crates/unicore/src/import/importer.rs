use csv::StringRecord;
use rusqlite::{params, OptionalExtension, Transaction, TransactionBehavior};
use std::collections::HashMap;
use thiserror::Error;

use super::records::{self, ScheduleRow, StudentRow, TeacherRow};
use super::{ImportSummary, RecordKind};
use crate::storage::schedule::{self, NewScheduleEntry};
use crate::storage::users::{self, Role};
use crate::storage::{catalog, DbPool};

/// Why an import was rolled back
///
/// `row_index` counts data rows from 0, header excluded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImportError {
    #[error("role '{role}' could not be resolved")]
    RoleResolutionFailed { role: Role },

    #[error("row {row_index}: {cause}")]
    RowParseError { row_index: usize, cause: String },

    #[error("row {row_index}: {field} is empty")]
    ForeignKeyResolutionFailed { row_index: usize, field: &'static str },

    #[error("storage error: {cause}")]
    StorageError { cause: String },
}

impl From<rusqlite::Error> for ImportError {
    fn from(err: rusqlite::Error) -> Self {
        ImportError::StorageError { cause: err.to_string() }
    }
}

impl From<r2d2::Error> for ImportError {
    fn from(err: r2d2::Error) -> Self {
        ImportError::StorageError { cause: err.to_string() }
    }
}

/// Transactional importer for students, teachers and schedule files
///
/// Every call opens its own `IMMEDIATE` transaction and either commits every
/// row or none.
#[derive(Clone)]
pub struct Importer {
    pool: DbPool,
}

impl Importer {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Imports validated rows (header included) of the given kind
    pub fn import(&self, kind: RecordKind, rows: &[StringRecord]) -> Result<ImportSummary, ImportError> {
        match kind {
            RecordKind::Students => self.import_students(rows),
            RecordKind::Teachers => self.import_teachers(rows),
            RecordKind::Schedule => self.import_schedule(rows),
        }
    }

    pub fn import_students(&self, rows: &[StringRecord]) -> Result<ImportSummary, ImportError> {
        let records: Vec<StudentRow> = records::decode(RecordKind::Students, rows)?;
        self.in_transaction(RecordKind::Students, |ctx| {
            let role_id = ctx.role_id(Role::Student)?;
            for (row_index, row) in records.iter().enumerate() {
                let external_id = parse_external_id(row_index, &row.user_id)?;
                let group_name = required(row_index, "Study_group", &row.group_name)?;
                let group_id = catalog::get_or_create_group(ctx.tx, group_name)?;
                ctx.upsert_person(
                    external_id,
                    row.first_name.trim(),
                    row.last_name.trim(),
                    role_id,
                    Some(group_id),
                )?;
            }
            Ok(records.len())
        })
    }

    pub fn import_teachers(&self, rows: &[StringRecord]) -> Result<ImportSummary, ImportError> {
        let records: Vec<TeacherRow> = records::decode(RecordKind::Teachers, rows)?;
        self.in_transaction(RecordKind::Teachers, |ctx| {
            let role_id = ctx.role_id(Role::Teacher)?;
            for (row_index, row) in records.iter().enumerate() {
                let external_id = parse_external_id(row_index, &row.user_id)?;
                ctx.upsert_person(external_id, row.first_name.trim(), row.last_name.trim(), role_id, None)?;
            }
            Ok(records.len())
        })
    }

    pub fn import_schedule(&self, rows: &[StringRecord]) -> Result<ImportSummary, ImportError> {
        let records: Vec<ScheduleRow> = records::decode(RecordKind::Schedule, rows)?;
        self.in_transaction(RecordKind::Schedule, |ctx| {
            for (row_index, row) in records.iter().enumerate() {
                ctx.import_lesson(row_index, row)?;
            }
            Ok(records.len())
        })
    }

    fn in_transaction<F>(&self, kind: RecordKind, body: F) -> Result<ImportSummary, ImportError>
    where
        F: FnOnce(&mut ImportContext<'_>) -> Result<usize, ImportError>,
    {
        let mut conn = self.pool.get()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let result = {
            let mut ctx = ImportContext {
                tx: &tx,
                role_ids: HashMap::new(),
            };
            body(&mut ctx)
        };

        match result {
            Ok(rows) => {
                tx.commit()?;
                Ok(ImportSummary { kind, rows })
            }
            Err(e) => {
                if let Err(rollback_err) = tx.rollback() {
                    log::error!("Rollback of {} import failed: {}", kind, rollback_err);
                }
                log::warn!("{} import rolled back: {}", kind, e);
                Err(e)
            }
        }
    }
}

/// Per-transaction state; role ids are cached for the lifetime of one import
struct ImportContext<'a> {
    tx: &'a Transaction<'a>,
    role_ids: HashMap<Role, i64>,
}

impl ImportContext<'_> {
    fn role_id(&mut self, role: Role) -> Result<i64, ImportError> {
        if let Some(id) = self.role_ids.get(&role) {
            return Ok(*id);
        }
        let id = users::role_id(self.tx, role)?.ok_or(ImportError::RoleResolutionFailed { role })?;
        self.role_ids.insert(role, id);
        Ok(id)
    }

    /// Create-or-update a person keyed by external id
    ///
    /// A person already matching on (first, last, role, group) keeps their row
    /// and gets the external id and display name refreshed, unless another row
    /// already holds that external id. The holder of the id is then overwritten.
    fn upsert_person(
        &mut self,
        external_id: i64,
        first_name: &str,
        last_name: &str,
        role_id: i64,
        group_id: Option<i64>,
    ) -> Result<i64, ImportError> {
        let display_name = users::display_name(first_name, last_name);
        let holder = self.holder_of(external_id)?;

        if let Some(id) = self.find_person(first_name, last_name, role_id, group_id)? {
            match holder {
                Some(other) if other != id => {
                    log::debug!("External id {} is held by user {}, overwriting it", external_id, other);
                }
                _ => {
                    self.tx.execute(
                        "UPDATE users SET external_id = ?1, display_name = ?2 WHERE id = ?3",
                        params![external_id, display_name, id],
                    )?;
                    return Ok(id);
                }
            }
        }

        let id = self.tx.query_row(
            "INSERT INTO users (external_id, first_name, last_name, display_name, role_id, group_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(external_id) DO UPDATE SET
                 first_name = excluded.first_name,
                 last_name = excluded.last_name,
                 display_name = excluded.display_name,
                 group_id = excluded.group_id
             RETURNING id",
            params![external_id, first_name, last_name, display_name, role_id, group_id],
            |row| row.get(0),
        )?;
        Ok(id)
    }

    fn holder_of(&self, external_id: i64) -> Result<Option<i64>, ImportError> {
        let id = self
            .tx
            .query_row(
                "SELECT id FROM users WHERE external_id = ?1",
                params![external_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(id)
    }

    fn find_person(
        &self,
        first_name: &str,
        last_name: &str,
        role_id: i64,
        group_id: Option<i64>,
    ) -> Result<Option<i64>, ImportError> {
        let id = self
            .tx
            .query_row(
                "SELECT id FROM users
                 WHERE first_name = ?1 AND last_name = ?2 AND role_id = ?3 AND group_id IS ?4
                 ORDER BY id LIMIT 1",
                params![first_name, last_name, role_id, group_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(id)
    }

    /// Create-or-get a teacher by name; a teacher found by name is reused as-is
    fn teacher_by_name(&mut self, first_name: &str, last_name: &str) -> Result<i64, ImportError> {
        let role_id = self.role_id(Role::Teacher)?;
        if let Some(id) = self.find_person(first_name, last_name, role_id, None)? {
            return Ok(id);
        }
        self.tx.execute(
            "INSERT INTO users (external_id, first_name, last_name, display_name, role_id, group_id)
             VALUES (NULL, ?1, ?2, ?3, ?4, NULL)",
            params![first_name, last_name, users::display_name(first_name, last_name), role_id],
        )?;
        log::info!("Created teacher {} {} from schedule", first_name, last_name);
        Ok(self.tx.last_insert_rowid())
    }

    fn import_lesson(&mut self, row_index: usize, row: &ScheduleRow) -> Result<i64, ImportError> {
        let subject_name = required(row_index, "subject_name", &row.subject_name)?;
        let type_name = required(row_index, "type_name", &row.type_name)?;
        let group_name = required(row_index, "group_name", &row.group_name)?;
        let teacher_last = required(row_index, "teacher_last_name", &row.teacher_last_name)?;
        let teacher_first = required(row_index, "teacher_first_name", &row.teacher_first_name)?;
        let weekday = parse_weekday(row_index, &row.weekday)?;

        let lesson_type_id = catalog::get_or_create_lesson_type(self.tx, type_name)?;
        let teacher_id = self.teacher_by_name(teacher_first, teacher_last)?;
        let subject_id = catalog::get_or_create_subject(self.tx, subject_name, teacher_id)?;
        let group_id = catalog::get_or_create_group(self.tx, group_name)?;

        let schedule_id = schedule::upsert_entry(
            self.tx,
            &NewScheduleEntry {
                subject_id,
                lesson_type_id,
                classroom: row.classroom.trim(),
                group_id,
                teacher_id,
                weekday,
                start_time: row.start_time.trim(),
                end_time: row.end_time.trim(),
            },
        )?;
        catalog::link_group_subject(self.tx, group_id, subject_id)?;
        Ok(schedule_id)
    }
}

fn parse_external_id(row_index: usize, raw: &str) -> Result<i64, ImportError> {
    raw.trim().parse::<i64>().map_err(|e| ImportError::RowParseError {
        row_index,
        cause: format!("User_id {:?}: {}", raw, e),
    })
}

fn parse_weekday(row_index: usize, raw: &str) -> Result<u8, ImportError> {
    match raw.trim().parse::<u8>() {
        Ok(day @ 1..=7) => Ok(day),
        Ok(day) => Err(ImportError::RowParseError {
            row_index,
            cause: format!("weekday {} is outside 1..=7", day),
        }),
        Err(e) => Err(ImportError::RowParseError {
            row_index,
            cause: format!("weekday {:?}: {}", raw, e),
        }),
    }
}

fn required<'r>(row_index: usize, field: &'static str, value: &'r str) -> Result<&'r str, ImportError> {
    let value = value.trim();
    if value.is_empty() {
        Err(ImportError::ForeignKeyResolutionFailed { row_index, field })
    } else {
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_weekday_bounds() {
        assert_eq!(parse_weekday(0, " 7 ").unwrap(), 7);
        assert!(matches!(
            parse_weekday(3, "0"),
            Err(ImportError::RowParseError { row_index: 3, .. })
        ));
        assert!(matches!(parse_weekday(0, "8"), Err(ImportError::RowParseError { .. })));
        assert!(matches!(parse_weekday(0, "Mon"), Err(ImportError::RowParseError { .. })));
    }

    #[test]
    fn test_external_id_must_be_numeric() {
        assert_eq!(parse_external_id(0, "501").unwrap(), 501);
        assert!(matches!(parse_external_id(1, ""), Err(ImportError::RowParseError { row_index: 1, .. })));
        assert!(matches!(parse_external_id(1, "x1"), Err(ImportError::RowParseError { .. })));
    }

    #[test]
    fn test_required_trims() {
        assert_eq!(required(0, "group_name", "  G1 ").unwrap(), "G1");
        assert_eq!(
            required(4, "group_name", "   "),
            Err(ImportError::ForeignKeyResolutionFailed {
                row_index: 4,
                field: "group_name"
            })
        );
    }
}
