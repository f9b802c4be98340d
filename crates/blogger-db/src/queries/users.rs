use anyhow::Result;
use rusqlite::{Connection, Row};

use super::OptionalExt;
use crate::models::UserRow;

const USER_COLUMNS: &str = "id, username, email, password, bio, is_guest, created_at";

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        password: row.get(3)?,
        bio: row.get(4)?,
        is_guest: row.get(5)?,
        created_at: row.get(6)?,
    })
}

pub fn insert_user(conn: &Connection, user: &UserRow) -> Result<()> {
    conn.execute(
        "INSERT INTO users (id, username, email, password, bio, is_guest, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        rusqlite::params![
            user.id,
            user.username,
            user.email,
            user.password,
            user.bio,
            user.is_guest,
            user.created_at,
        ],
    )?;
    Ok(())
}

pub fn find_user_by_id(conn: &Connection, id: &str) -> Result<Option<UserRow>> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1");
    conn.query_row(&sql, [id], user_from_row).optional()
}

pub fn find_user_by_username(conn: &Connection, username: &str) -> Result<Option<UserRow>> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?1");
    conn.query_row(&sql, [username], user_from_row).optional()
}

pub fn username_or_email_taken(conn: &Connection, username: &str, email: &str) -> Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM users WHERE username = ?1 OR email = ?2",
        [username, email],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

pub fn list_users(conn: &Connection) -> Result<Vec<UserRow>> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users ORDER BY rowid");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([], user_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Delete a user and everything it owns.
///
/// The like counters of posts this user liked are decremented before the
/// cascade drops the like rows. Run inside a transaction so the counter fix-up
/// and the delete land together.
pub fn delete_user(conn: &Connection, id: &str) -> Result<bool> {
    conn.execute(
        "UPDATE posts SET likes = likes - 1
         WHERE id IN (SELECT post_id FROM post_likes WHERE user_id = ?1)",
        [id],
    )?;
    let deleted = conn.execute("DELETE FROM users WHERE id = ?1", [id])?;
    Ok(deleted > 0)
}
