use chrono::NaiveDate;
use rusqlite::{params, Connection, Result, TransactionBehavior};

use crate::storage::users::{self, User};

/// Attendance of one student in one subject
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AttendanceStats {
    pub total: u32,
    pub present: u32,
    pub absent: u32,
}

impl AttendanceStats {
    /// Share of attended lessons, 0 when nothing was marked
    pub fn present_percent(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            f64::from(self.present) * 100.0 / f64::from(self.total)
        }
    }
}

fn date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Records a mark for (student, lesson, day); re-marking overwrites it
pub fn mark(conn: &Connection, student_id: i64, schedule_id: i64, date: NaiveDate, present: bool) -> Result<()> {
    conn.execute(
        "INSERT INTO attendance (student_id, schedule_id, mark_date, is_present) VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(student_id, schedule_id, mark_date)
         DO UPDATE SET is_present = excluded.is_present, marked_at = CURRENT_TIMESTAMP",
        params![student_id, schedule_id, date_key(date), present],
    )?;
    Ok(())
}

/// Students of the group without a mark for this lesson on `date`
pub fn unmarked_students(conn: &Connection, group_id: i64, schedule_id: i64, date: NaiveDate) -> Result<Vec<User>> {
    let day = date_key(date);
    let marked: Vec<i64> = {
        let mut stmt = conn.prepare("SELECT student_id FROM attendance WHERE schedule_id = ?1 AND mark_date = ?2")?;
        let rows = stmt.query_map(params![schedule_id, day], |row| row.get(0))?;
        rows.collect::<Result<_>>()?
    };
    Ok(users::students_in_group(conn, group_id)?
        .into_iter()
        .filter(|s| !marked.contains(&s.id))
        .collect())
}

/// Marks every still-unmarked student of the group present
///
/// Returns the students that were marked by this call.
pub fn mark_rest_present(conn: &mut Connection, group_id: i64, schedule_id: i64, date: NaiveDate) -> Result<Vec<User>> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let rest = unmarked_students(&tx, group_id, schedule_id, date)?;
    for student in &rest {
        tx.execute(
            "INSERT OR IGNORE INTO attendance (student_id, schedule_id, mark_date, is_present) VALUES (?1, ?2, ?3, 1)",
            params![student.id, schedule_id, date_key(date)],
        )?;
    }
    tx.commit()?;
    Ok(rest)
}

/// Totals of a student's marks in a subject
pub fn stats_for_student_and_subject(conn: &Connection, student_id: i64, subject_id: i64) -> Result<AttendanceStats> {
    conn.query_row(
        "SELECT COUNT(*), COALESCE(SUM(a.is_present), 0)
         FROM attendance a
         JOIN schedule sc ON sc.id = a.schedule_id
         WHERE a.student_id = ?1 AND sc.subject_id = ?2",
        params![student_id, subject_id],
        |row| {
            let total: u32 = row.get(0)?;
            let present: u32 = row.get(1)?;
            Ok(AttendanceStats {
                total,
                present,
                absent: total.saturating_sub(present),
            })
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::migrations::run_migrations;
    use crate::storage::{catalog, schedule};

    struct Fixture {
        conn: Connection,
        group_id: i64,
        subject_id: i64,
        schedule_id: i64,
        students: Vec<i64>,
    }

    fn fixture() -> Fixture {
        let mut conn = Connection::open_in_memory().unwrap();
        run_migrations(&mut conn).unwrap();
        let group_id = catalog::get_or_create_group(&conn, "G1").unwrap();
        conn.execute(
            "INSERT INTO users (first_name, last_name, display_name, role_id) VALUES ('T', 'T', 'T T', 3)",
            [],
        )
        .unwrap();
        let teacher_id = conn.last_insert_rowid();
        let mut students = Vec::new();
        for (i, last) in ["Antonov", "Borisova", "Volkov"].iter().enumerate() {
            conn.execute(
                "INSERT INTO users (external_id, first_name, last_name, display_name, role_id, group_id)
                 VALUES (?1, 'S', ?2, 'S', 4, ?3)",
                params![100 + i as i64, last, group_id],
            )
            .unwrap();
            students.push(conn.last_insert_rowid());
        }
        let subject_id = catalog::get_or_create_subject(&conn, "Math", teacher_id).unwrap();
        let lesson_type_id = catalog::get_or_create_lesson_type(&conn, "Seminar").unwrap();
        let schedule_id = schedule::upsert_entry(
            &conn,
            &schedule::NewScheduleEntry {
                subject_id,
                lesson_type_id,
                classroom: "1",
                group_id,
                teacher_id,
                weekday: 1,
                start_time: "09:00",
                end_time: "10:00",
            },
        )
        .unwrap();
        Fixture {
            conn,
            group_id,
            subject_id,
            schedule_id,
            students,
        }
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 9, 2).unwrap()
    }

    #[test]
    fn test_absent_then_rest_present() {
        let mut f = fixture();
        mark(&f.conn, f.students[1], f.schedule_id, day(), false).unwrap();

        let left = unmarked_students(&f.conn, f.group_id, f.schedule_id, day()).unwrap();
        assert_eq!(left.len(), 2);

        let marked = mark_rest_present(&mut f.conn, f.group_id, f.schedule_id, day()).unwrap();
        assert_eq!(marked.len(), 2);
        assert!(unmarked_students(&f.conn, f.group_id, f.schedule_id, day()).unwrap().is_empty());

        let stats = stats_for_student_and_subject(&f.conn, f.students[1], f.subject_id).unwrap();
        assert_eq!(stats, AttendanceStats { total: 1, present: 0, absent: 1 });
    }

    #[test]
    fn test_remark_overwrites() {
        let f = fixture();
        mark(&f.conn, f.students[0], f.schedule_id, day(), false).unwrap();
        mark(&f.conn, f.students[0], f.schedule_id, day(), true).unwrap();

        let stats = stats_for_student_and_subject(&f.conn, f.students[0], f.subject_id).unwrap();
        assert_eq!(stats.total, 1);
        assert_eq!(stats.present, 1);
        assert_eq!(stats.present_percent(), 100.0);
    }

    #[test]
    fn test_percent_of_nothing() {
        assert_eq!(AttendanceStats::default().present_percent(), 0.0);
    }
}
