//! Validation + transactional import against a real SQLite file

mod common;

use common::{TestEnvironment, SCHEDULE_CSV, STUDENTS_CSV, TEACHERS_CSV};
use pretty_assertions::assert_eq;
use unicore::import::{self, import_file, ImportError, Importer, RecordKind, StructuralError};
use unicore::storage::{get_connection, users, Role};
use unicore::AppError;

fn import_text(env: &TestEnvironment, kind: RecordKind, csv: &str) -> Result<import::ImportSummary, AppError> {
    let path = env.write_csv(&format!("{}.csv", kind), csv);
    import_file(&Importer::new(env.pool.clone()), &path, kind)
}

#[test]
fn test_students_import_is_idempotent() {
    let env = TestEnvironment::new();

    let first = import_text(&env, RecordKind::Students, STUDENTS_CSV).unwrap();
    assert_eq!(first.rows, 3);
    let second = import_text(&env, RecordKind::Students, STUDENTS_CSV).unwrap();
    assert_eq!(second.rows, 3);

    assert_eq!(env.count("SELECT COUNT(*) FROM users"), 3);
    assert_eq!(env.count("SELECT COUNT(DISTINCT external_id) FROM users"), 3);
    assert_eq!(env.count("SELECT COUNT(*) FROM study_groups"), 2);
}

#[test]
fn test_student_rows_are_stored_with_group_and_display_name() {
    let env = TestEnvironment::new();
    import_text(&env, RecordKind::Students, STUDENTS_CSV).unwrap();

    let conn = get_connection(&env.pool).unwrap();
    let maria = users::find_by_external_id(&conn, 1002).unwrap().unwrap();
    assert_eq!(maria.role, Role::Student);
    assert_eq!(maria.display_name, "Maria Petrova");
    assert_eq!(maria.group_name.as_deref(), Some("IU7-11"));
}

#[test]
fn test_student_moved_to_another_group_is_updated_by_external_id() {
    let env = TestEnvironment::new();
    import_text(&env, RecordKind::Students, STUDENTS_CSV).unwrap();
    import_text(
        &env,
        RecordKind::Students,
        "User_id,Last_name,First_name,Study_group\n1003,Sidorov,Oleg,IU7-13\n",
    )
    .unwrap();

    let conn = get_connection(&env.pool).unwrap();
    let oleg = users::find_by_external_id(&conn, 1003).unwrap().unwrap();
    assert_eq!(oleg.group_name.as_deref(), Some("IU7-13"));
    assert_eq!(env.count("SELECT COUNT(*) FROM users"), 3);
}

#[test]
fn test_teachers_are_created_without_group() {
    let env = TestEnvironment::new();
    let summary = import_text(&env, RecordKind::Teachers, TEACHERS_CSV).unwrap();
    assert_eq!(summary.rows, 2);

    let conn = get_connection(&env.pool).unwrap();
    for id in [501, 502] {
        let teacher = users::find_by_external_id(&conn, id).unwrap().unwrap();
        assert_eq!(teacher.role, Role::Teacher);
        assert_eq!(teacher.group_id, None);
    }
    let anna = users::find_by_external_id(&conn, 502).unwrap().unwrap();
    assert_eq!((anna.first_name.as_str(), anna.last_name.as_str()), ("Anna", "Smirnova"));
}

#[test]
fn test_schedule_creates_unknown_teacher() {
    let env = TestEnvironment::new();
    let summary = import_text(&env, RecordKind::Schedule, SCHEDULE_CSV).unwrap();
    assert_eq!(summary.rows, 2);

    assert_eq!(
        env.count("SELECT COUNT(*) FROM users u JOIN roles r ON r.id = u.role_id WHERE r.name = 'teacher'"),
        1
    );
    assert_eq!(
        env.count("SELECT COUNT(*) FROM users WHERE last_name = 'Ivanov' AND external_id IS NULL AND group_id IS NULL"),
        1
    );
    assert_eq!(env.count("SELECT COUNT(*) FROM schedule"), 2);
    assert_eq!(env.count("SELECT COUNT(*) FROM subjects"), 1);
    assert_eq!(env.count("SELECT COUNT(*) FROM lesson_types"), 2);
    assert_eq!(env.count("SELECT COUNT(*) FROM groups_subjects"), 2);
}

#[test]
fn test_teachers_file_claims_teacher_created_by_schedule() {
    let env = TestEnvironment::new();
    import_text(&env, RecordKind::Schedule, SCHEDULE_CSV).unwrap();
    import_text(&env, RecordKind::Teachers, TEACHERS_CSV).unwrap();

    // Ivanov Petr is matched by name and gets the external id
    assert_eq!(env.count("SELECT COUNT(*) FROM users"), 2);
    let conn = get_connection(&env.pool).unwrap();
    let petr = users::find_by_external_id(&conn, 501).unwrap().unwrap();
    assert_eq!(env.count(&format!("SELECT COUNT(*) FROM schedule WHERE teacher_id = {}", petr.id)), 2);
}

#[test]
fn test_name_match_does_not_steal_external_id_held_by_another_row() {
    let env = TestEnvironment::new();
    import_text(
        &env,
        RecordKind::Students,
        "User_id,Last_name,First_name,Study_group\n100,Ivanov,Ivan,G1\n200,Petrov,Petr,G1\n",
    )
    .unwrap();

    // Ivanov Ivan matches row 100 by name, but 200 belongs to Petrov
    let summary = import_text(
        &env,
        RecordKind::Students,
        "User_id,Last_name,First_name,Study_group\n200,Ivanov,Ivan,G1\n",
    )
    .unwrap();
    assert_eq!(summary.rows, 1);

    let conn = get_connection(&env.pool).unwrap();
    let holder = users::find_by_external_id(&conn, 200).unwrap().unwrap();
    assert_eq!(holder.display_name, "Ivan Ivanov");
    assert_eq!(holder.group_name.as_deref(), Some("G1"));
    let original = users::find_by_external_id(&conn, 100).unwrap().unwrap();
    assert_eq!(original.display_name, "Ivan Ivanov");
    assert_eq!(env.count("SELECT COUNT(*) FROM users"), 2);
    assert_eq!(env.count("SELECT COUNT(DISTINCT external_id) FROM users"), 2);
}

#[test]
fn test_schedule_reimport_does_not_duplicate_lessons() {
    let env = TestEnvironment::new();
    import_text(&env, RecordKind::Schedule, SCHEDULE_CSV).unwrap();
    import_text(&env, RecordKind::Schedule, SCHEDULE_CSV).unwrap();
    assert_eq!(env.count("SELECT COUNT(*) FROM schedule"), 2);
}

#[test]
fn test_failed_schedule_row_rolls_back_whole_file() {
    let env = TestEnvironment::new();
    let csv = "subject_name,type_name,classroom,group_name,teacher_last_name,teacher_first_name,weekday,start_time,end_time
Math,Lecture,101,IU7-11,Ivanov,Petr,1,09:00,10:30
Physics,Lecture,102,IU7-11,Orlov,Ilya,2,09:00,10:30
Chemistry,Lab,103,,Orlova,Vera,4,12:00,13:30
";
    let err = import_text(&env, RecordKind::Schedule, csv).unwrap_err();
    match err {
        AppError::Import(ImportError::ForeignKeyResolutionFailed { row_index, field }) => {
            assert_eq!(row_index, 2);
            assert_eq!(field, "group_name");
        }
        other => panic!("unexpected error: {other:?}"),
    }

    for table in ["schedule", "subjects", "lesson_types", "study_groups", "users", "groups_subjects"] {
        assert_eq!(env.count(&format!("SELECT COUNT(*) FROM {}", table)), 0, "{table} should be empty");
    }
}

#[test]
fn test_bad_weekday_is_row_parse_error() {
    let env = TestEnvironment::new();
    let csv = "subject_name,type_name,classroom,group_name,teacher_last_name,teacher_first_name,weekday,start_time,end_time
Math,Lecture,101,IU7-11,Ivanov,Petr,9,09:00,10:30
";
    let err = import_text(&env, RecordKind::Schedule, csv).unwrap_err();
    assert!(matches!(
        err,
        AppError::Import(ImportError::RowParseError { row_index: 0, .. })
    ));
    assert_eq!(env.count("SELECT COUNT(*) FROM schedule"), 0);
}

#[test]
fn test_non_numeric_teacher_id_aborts_file() {
    let env = TestEnvironment::new();
    let csv = "User_id,Last_name,First_name\n501,Ivanov,Petr\nabc,Smirnova,Anna\n";
    let err = import_text(&env, RecordKind::Teachers, csv).unwrap_err();
    assert!(matches!(
        err,
        AppError::Import(ImportError::RowParseError { row_index: 1, .. })
    ));
    assert_eq!(env.count("SELECT COUNT(*) FROM users"), 0);
}

#[test]
fn test_missing_role_fails_resolution() {
    let env = TestEnvironment::new();
    {
        let conn = get_connection(&env.pool).unwrap();
        conn.execute("DELETE FROM roles WHERE name = 'student'", []).unwrap();
    }
    let err = import_text(&env, RecordKind::Students, STUDENTS_CSV).unwrap_err();
    assert!(matches!(
        err,
        AppError::Import(ImportError::RoleResolutionFailed { role: Role::Student })
    ));
    assert_eq!(env.count("SELECT COUNT(*) FROM study_groups"), 0);
}

#[test]
fn test_structural_errors_surface_before_import() {
    let env = TestEnvironment::new();
    let err = import_text(&env, RecordKind::Students, TEACHERS_CSV).unwrap_err();
    match err {
        AppError::Structural(StructuralError::HeaderMismatch { actual, .. }) => {
            assert_eq!(actual, vec!["User_id", "Last_name", "First_name"]);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(env.count("SELECT COUNT(*) FROM users"), 0);
}

#[test]
fn test_importer_accepts_rows_from_validate_reader() {
    let env = TestEnvironment::new();
    let rows = import::validate_reader(TEACHERS_CSV.as_bytes(), RecordKind::Teachers).unwrap();
    let summary = Importer::new(env.pool.clone()).import_teachers(&rows).unwrap();
    assert_eq!(summary.kind, RecordKind::Teachers);
    assert_eq!(summary.rows, 2);
}
