//! Groups, subjects, lesson types and the group-subject links

use rusqlite::{params, Connection, OptionalExtension, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subject {
    pub id: i64,
    pub name: String,
}

/// Create-or-get a study group by name
pub fn get_or_create_group(conn: &Connection, name: &str) -> Result<i64> {
    conn.execute("INSERT INTO study_groups (name) VALUES (?1) ON CONFLICT(name) DO NOTHING", [name])?;
    conn.query_row("SELECT id FROM study_groups WHERE name = ?1", [name], |row| row.get(0))
}

/// Create-or-get a lesson type by name
pub fn get_or_create_lesson_type(conn: &Connection, name: &str) -> Result<i64> {
    conn.execute("INSERT INTO lesson_types (name) VALUES (?1) ON CONFLICT(name) DO NOTHING", [name])?;
    conn.query_row("SELECT id FROM lesson_types WHERE name = ?1", [name], |row| row.get(0))
}

/// Create-or-get a subject by name
///
/// `teacher_id` is recorded only when the subject is created.
pub fn get_or_create_subject(conn: &Connection, name: &str, teacher_id: i64) -> Result<i64> {
    conn.execute(
        "INSERT INTO subjects (name, teacher_id) VALUES (?1, ?2) ON CONFLICT(name) DO NOTHING",
        params![name, teacher_id],
    )?;
    conn.query_row("SELECT id FROM subjects WHERE name = ?1", [name], |row| row.get(0))
}

/// Links a group to a subject; existing links are left alone
pub fn link_group_subject(conn: &Connection, group_id: i64, subject_id: i64) -> Result<()> {
    conn.execute(
        "INSERT OR IGNORE INTO groups_subjects (group_id, subject_id) VALUES (?1, ?2)",
        params![group_id, subject_id],
    )?;
    Ok(())
}

pub fn group_by_id(conn: &Connection, id: i64) -> Result<Option<Group>> {
    conn.query_row("SELECT id, name FROM study_groups WHERE id = ?1", [id], |row| {
        Ok(Group { id: row.get(0)?, name: row.get(1)? })
    })
    .optional()
}

pub fn subject_by_id(conn: &Connection, id: i64) -> Result<Option<Subject>> {
    conn.query_row("SELECT id, name FROM subjects WHERE id = ?1", [id], |row| {
        Ok(Subject { id: row.get(0)?, name: row.get(1)? })
    })
    .optional()
}

fn query_subjects(conn: &Connection, sql: &str, param: Option<i64>) -> Result<Vec<Subject>> {
    let mut stmt = conn.prepare(sql)?;
    let map = |row: &rusqlite::Row<'_>| Ok(Subject { id: row.get(0)?, name: row.get(1)? });
    match param {
        Some(p) => stmt.query_map([p], map)?.collect(),
        None => stmt.query_map([], map)?.collect(),
    }
}

/// Every subject, by name
pub fn all_subjects(conn: &Connection) -> Result<Vec<Subject>> {
    query_subjects(conn, "SELECT id, name FROM subjects ORDER BY name", None)
}

/// Subjects a teacher owns or has lessons in
pub fn subjects_for_teacher(conn: &Connection, teacher_id: i64) -> Result<Vec<Subject>> {
    query_subjects(
        conn,
        "SELECT DISTINCT s.id, s.name FROM subjects s
         LEFT JOIN schedule sc ON sc.subject_id = s.id
         WHERE s.teacher_id = ?1 OR sc.teacher_id = ?1
         ORDER BY s.name",
        Some(teacher_id),
    )
}

/// Subjects linked to a group
pub fn subjects_for_group(conn: &Connection, group_id: i64) -> Result<Vec<Subject>> {
    query_subjects(
        conn,
        "SELECT s.id, s.name FROM subjects s
         JOIN groups_subjects gs ON gs.subject_id = s.id
         WHERE gs.group_id = ?1
         ORDER BY s.name",
        Some(group_id),
    )
}

/// Groups linked to a subject
pub fn groups_for_subject(conn: &Connection, subject_id: i64) -> Result<Vec<Group>> {
    let mut stmt = conn.prepare(
        "SELECT g.id, g.name FROM study_groups g
         JOIN groups_subjects gs ON gs.group_id = g.id
         WHERE gs.subject_id = ?1
         ORDER BY g.name",
    )?;
    let rows = stmt.query_map([subject_id], |row| Ok(Group { id: row.get(0)?, name: row.get(1)? }))?;
    rows.collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::migrations::run_migrations;

    #[test]
    fn test_get_or_create_group_never_duplicates() {
        let mut conn = Connection::open_in_memory().unwrap();
        run_migrations(&mut conn).unwrap();

        let a = get_or_create_group(&conn, "IU7-11").unwrap();
        let b = get_or_create_group(&conn, "IU7-11").unwrap();
        let c = get_or_create_group(&conn, "IU7-12").unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);

        let count: i64 = conn.query_row("SELECT COUNT(*) FROM study_groups", [], |r| r.get(0)).unwrap();
        assert_eq!(count, 2);
    }

    #[test]
    fn test_link_is_idempotent() {
        let mut conn = Connection::open_in_memory().unwrap();
        run_migrations(&mut conn).unwrap();
        conn.execute(
            "INSERT INTO users (first_name, last_name, display_name, role_id) VALUES ('A', 'B', 'A B', 3)",
            [],
        )
        .unwrap();
        let teacher = conn.last_insert_rowid();

        let group = get_or_create_group(&conn, "G1").unwrap();
        let subject = get_or_create_subject(&conn, "Physics", teacher).unwrap();
        link_group_subject(&conn, group, subject).unwrap();
        link_group_subject(&conn, group, subject).unwrap();

        assert_eq!(subjects_for_group(&conn, group).unwrap().len(), 1);
        assert_eq!(groups_for_subject(&conn, subject).unwrap()[0].name, "G1");
        assert_eq!(subjects_for_teacher(&conn, teacher).unwrap()[0].name, "Physics");
    }
}
