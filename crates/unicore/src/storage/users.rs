use rusqlite::{params, Connection, OptionalExtension, Result, Row};
use strum::{AsRefStr, Display, EnumIter, EnumString};

/// Role stored in the `roles` table
///
/// The string form is the `roles.name` value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, AsRefStr, Display, EnumString, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum Role {
    /// Configured super user that has not picked a working role yet
    SuperUser,
    Admin,
    Teacher,
    Student,
}

/// A user row joined with its role and group names
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: i64,
    /// Telegram user id; `None` for teachers created from a schedule file
    pub external_id: Option<i64>,
    pub first_name: String,
    pub last_name: String,
    pub display_name: String,
    pub role: Role,
    pub group_id: Option<i64>,
    pub group_name: Option<String>,
    pub is_super_user: bool,
}

impl User {
    /// "Last First", the order used in rosters
    pub fn roster_name(&self) -> String {
        format!("{} {}", self.last_name, self.first_name)
    }
}

const USER_COLUMNS: &str = "u.id, u.external_id, u.first_name, u.last_name, u.display_name, r.name, u.group_id, g.name, u.is_super_user";

const USER_FROM: &str = "FROM users u JOIN roles r ON r.id = u.role_id LEFT JOIN study_groups g ON g.id = u.group_id";

fn map_user(row: &Row<'_>) -> Result<User> {
    let role_name: String = row.get(5)?;
    let role = role_name.parse::<Role>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(5, rusqlite::types::Type::Text, Box::new(e))
    })?;
    Ok(User {
        id: row.get(0)?,
        external_id: row.get(1)?,
        first_name: row.get(2)?,
        last_name: row.get(3)?,
        display_name: row.get(4)?,
        role,
        group_id: row.get(6)?,
        group_name: row.get(7)?,
        is_super_user: row.get(8)?,
    })
}

/// Builds the display name stored alongside first/last names
pub fn display_name(first_name: &str, last_name: &str) -> String {
    format!("{} {}", first_name, last_name)
}

/// Looks up the id of a seeded role
pub fn role_id(conn: &Connection, role: Role) -> Result<Option<i64>> {
    conn.query_row("SELECT id FROM roles WHERE name = ?1", [role.as_ref()], |row| row.get(0))
        .optional()
}

/// Gets a user by Telegram user id
pub fn find_by_external_id(conn: &Connection, external_id: i64) -> Result<Option<User>> {
    let sql = format!("SELECT {} {} WHERE u.external_id = ?1", USER_COLUMNS, USER_FROM);
    conn.query_row(&sql, [external_id], map_user).optional()
}

/// Gets a user by row id
pub fn find_by_id(conn: &Connection, id: i64) -> Result<Option<User>> {
    let sql = format!("SELECT {} {} WHERE u.id = ?1", USER_COLUMNS, USER_FROM);
    conn.query_row(&sql, [id], map_user).optional()
}

/// Students of a group ordered by last then first name
pub fn students_in_group(conn: &Connection, group_id: i64) -> Result<Vec<User>> {
    let sql = format!(
        "SELECT {} {} WHERE u.group_id = ?1 AND r.name = ?2 ORDER BY u.last_name, u.first_name, u.id",
        USER_COLUMNS, USER_FROM
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![group_id, Role::Student.as_ref()], map_user)?;
    rows.collect()
}

/// Switches the working role of a user
///
/// Returns false when no such user exists or the role is not seeded.
pub fn set_role(conn: &Connection, user_id: i64, role: Role) -> Result<bool> {
    let changed = conn.execute(
        "UPDATE users SET role_id = (SELECT id FROM roles WHERE name = ?1)
         WHERE id = ?2 AND EXISTS (SELECT 1 FROM roles WHERE name = ?1)",
        params![role.as_ref(), user_id],
    )?;
    Ok(changed > 0)
}

/// Registers a configured super user
///
/// A new row starts with the `super_user` role so the role picker is shown;
/// an existing row only gets the flag set and keeps its working role.
pub fn upsert_super_user(conn: &Connection, external_id: i64, first_name: &str, last_name: &str) -> Result<User> {
    conn.execute(
        "INSERT INTO users (external_id, first_name, last_name, display_name, role_id, is_super_user)
         VALUES (?1, ?2, ?3, ?4, (SELECT id FROM roles WHERE name = ?5), 1)
         ON CONFLICT(external_id) DO UPDATE SET is_super_user = 1",
        params![
            external_id,
            first_name,
            last_name,
            display_name(first_name, last_name),
            Role::SuperUser.as_ref()
        ],
    )?;
    find_by_external_id(conn, external_id)?.ok_or(rusqlite::Error::QueryReturnedNoRows)
}
