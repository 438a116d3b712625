use chrono::NaiveDateTime;
use rusqlite::{params, Connection};

use crate::core::config;
use crate::core::{AppError, AppResult};

/// A grade as shown to the student
#[derive(Debug, Clone, PartialEq)]
pub struct GradeRecord {
    pub value: i64,
    pub lesson_type: String,
    pub weekday: u8,
    pub start_time: String,
    /// UTC
    pub created_at: NaiveDateTime,
}

/// Count and mean of a set of grades
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradeSummary {
    pub count: usize,
    pub average: Option<f64>,
}

impl GradeSummary {
    pub fn of(grades: &[GradeRecord]) -> Self {
        let count = grades.len();
        let average = (count > 0).then(|| grades.iter().map(|g| g.value as f64).sum::<f64>() / count as f64);
        Self { count, average }
    }
}

const SQLITE_DATETIME: &str = "%Y-%m-%d %H:%M:%S";

/// Stores a grade with the current timestamp
///
/// Values outside the grade scale are rejected before touching storage.
pub fn insert_grade(conn: &Connection, student_id: i64, schedule_id: i64, teacher_id: i64, value: i64) -> AppResult<i64> {
    if !(config::grades::MIN..=config::grades::MAX).contains(&value) {
        return Err(AppError::Validation(format!("grade {} is outside {}..={}", value, config::grades::MIN, config::grades::MAX)));
    }
    conn.execute(
        "INSERT INTO grades (student_id, schedule_id, teacher_id, value) VALUES (?1, ?2, ?3, ?4)",
        params![student_id, schedule_id, teacher_id, value],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Grades of a student in one subject, oldest first
pub fn for_student_and_subject(conn: &Connection, student_id: i64, subject_id: i64) -> AppResult<Vec<GradeRecord>> {
    let mut stmt = conn.prepare(
        "SELECT gr.value, lt.name, sc.weekday, sc.start_time, gr.created_at
         FROM grades gr
         JOIN schedule sc ON sc.id = gr.schedule_id
         JOIN lesson_types lt ON lt.id = sc.lesson_type_id
         WHERE gr.student_id = ?1 AND sc.subject_id = ?2
         ORDER BY gr.created_at, gr.id",
    )?;
    let rows = stmt.query_map(params![student_id, subject_id], |row| {
        Ok((
            row.get::<_, i64>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, u8>(2)?,
            row.get::<_, String>(3)?,
            row.get::<_, String>(4)?,
        ))
    })?;

    let mut grades = Vec::new();
    for row in rows {
        let (value, lesson_type, weekday, start_time, created_at) = row?;
        let created_at = NaiveDateTime::parse_from_str(&created_at, SQLITE_DATETIME)
            .map_err(|e| AppError::Validation(format!("bad grade timestamp {:?}: {}", created_at, e)))?;
        grades.push(GradeRecord {
            value,
            lesson_type,
            weekday,
            start_time,
            created_at,
        });
    }
    Ok(grades)
}
