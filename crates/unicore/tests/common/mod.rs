//! Shared fixtures for the unicore integration tests

#![allow(dead_code)]

use std::path::PathBuf;
use tempfile::TempDir;
use unicore::storage::{create_pool, get_connection, DbPool};

/// A migrated SQLite database in a temporary directory
pub struct TestEnvironment {
    pub dir: TempDir,
    pub pool: DbPool,
}

impl TestEnvironment {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        let db_path = dir.path().join("test.sqlite");
        let pool = create_pool(db_path.to_str().expect("utf-8 temp path")).expect("create pool");
        Self { dir, pool }
    }

    /// Writes `content` to a file inside the environment directory
    pub fn write_csv(&self, name: &str, content: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        std::fs::write(&path, content).expect("write csv");
        path
    }

    pub fn count(&self, sql: &str) -> i64 {
        let conn = get_connection(&self.pool).expect("connection");
        conn.query_row(sql, [], |row| row.get(0)).expect("count query")
    }
}

pub const STUDENTS_CSV: &str = "User_id,Last_name,First_name,Study_group
1001,Ivanov,Ivan,IU7-11
1002,Petrova,Maria,IU7-11
1003,Sidorov,Oleg,IU7-12
";

pub const TEACHERS_CSV: &str = "User_id,Last_name,First_name
501,Ivanov,Petr
502,Smirnova,Anna
";

pub const SCHEDULE_CSV: &str = "subject_name,type_name,classroom,group_name,teacher_last_name,teacher_first_name,weekday,start_time,end_time
Math,Lecture,101,IU7-11,Ivanov,Petr,1,09:00,10:30
Math,Seminar,202,IU7-12,Ivanov,Petr,3,10:40,12:10
";
