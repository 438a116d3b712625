use rusqlite::{params, Connection, OptionalExtension, Result, Row};

/// A schedule entry with names resolved
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleEntry {
    pub id: i64,
    pub subject_id: i64,
    pub subject_name: String,
    pub lesson_type: String,
    pub classroom: String,
    pub group_id: i64,
    pub group_name: String,
    pub teacher_id: i64,
    pub teacher_name: String,
    pub weekday: u8,
    pub start_time: String,
    pub end_time: String,
}

/// Which lessons a schedule view shows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleFilter {
    All,
    Group(i64),
    Teacher(i64),
}

/// Natural key and payload of one imported lesson
#[derive(Debug, Clone, Copy)]
pub struct NewScheduleEntry<'a> {
    pub subject_id: i64,
    pub lesson_type_id: i64,
    pub classroom: &'a str,
    pub group_id: i64,
    pub teacher_id: i64,
    pub weekday: u8,
    pub start_time: &'a str,
    pub end_time: &'a str,
}

const ENTRY_SELECT: &str = "SELECT sc.id, s.id, s.name, lt.name, sc.classroom, g.id, g.name, u.id, u.display_name,
            sc.weekday, sc.start_time, sc.end_time
     FROM schedule sc
     JOIN subjects s ON s.id = sc.subject_id
     JOIN lesson_types lt ON lt.id = sc.lesson_type_id
     JOIN study_groups g ON g.id = sc.group_id
     JOIN users u ON u.id = sc.teacher_id";

fn map_entry(row: &Row<'_>) -> Result<ScheduleEntry> {
    Ok(ScheduleEntry {
        id: row.get(0)?,
        subject_id: row.get(1)?,
        subject_name: row.get(2)?,
        lesson_type: row.get(3)?,
        classroom: row.get(4)?,
        group_id: row.get(5)?,
        group_name: row.get(6)?,
        teacher_id: row.get(7)?,
        teacher_name: row.get(8)?,
        weekday: row.get(9)?,
        start_time: row.get(10)?,
        end_time: row.get(11)?,
    })
}

/// Inserts a lesson or refreshes classroom and end time of an existing one
///
/// Returns the schedule row id.
pub fn upsert_entry(conn: &Connection, entry: &NewScheduleEntry<'_>) -> Result<i64> {
    conn.query_row(
        "INSERT INTO schedule (subject_id, lesson_type_id, classroom, group_id, teacher_id, weekday, start_time, end_time)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
         ON CONFLICT(weekday, start_time, subject_id, group_id, teacher_id, lesson_type_id)
         DO UPDATE SET classroom = excluded.classroom, end_time = excluded.end_time
         RETURNING id",
        params![
            entry.subject_id,
            entry.lesson_type_id,
            entry.classroom,
            entry.group_id,
            entry.teacher_id,
            entry.weekday,
            entry.start_time,
            entry.end_time
        ],
        |row| row.get(0),
    )
}

/// Lessons on a weekday (1 = Monday), by start time
pub fn for_weekday(conn: &Connection, filter: ScheduleFilter, weekday: u8) -> Result<Vec<ScheduleEntry>> {
    let (clause, id) = match filter {
        ScheduleFilter::All => ("", None),
        ScheduleFilter::Group(id) => (" AND sc.group_id = ?2", Some(id)),
        ScheduleFilter::Teacher(id) => (" AND sc.teacher_id = ?2", Some(id)),
    };
    let sql = format!("{} WHERE sc.weekday = ?1{} ORDER BY sc.start_time, g.name", ENTRY_SELECT, clause);
    let mut stmt = conn.prepare(&sql)?;
    match id {
        Some(id) => stmt.query_map(params![weekday, id], map_entry)?.collect(),
        None => stmt.query_map([weekday], map_entry)?.collect(),
    }
}

/// Lessons of a subject for a group across the week
pub fn for_subject_and_group(conn: &Connection, subject_id: i64, group_id: i64) -> Result<Vec<ScheduleEntry>> {
    let sql = format!(
        "{} WHERE sc.subject_id = ?1 AND sc.group_id = ?2 ORDER BY sc.weekday, sc.start_time",
        ENTRY_SELECT
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![subject_id, group_id], map_entry)?;
    rows.collect()
}

pub fn by_id(conn: &Connection, id: i64) -> Result<Option<ScheduleEntry>> {
    let sql = format!("{} WHERE sc.id = ?1", ENTRY_SELECT);
    conn.query_row(&sql, [id], map_entry).optional()
}
