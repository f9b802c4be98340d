use anyhow::Result;
use rusqlite::Connection;

use super::OptionalExt;
use crate::models::RefreshTokenRow;

pub fn insert_refresh_token(conn: &Connection, token: &RefreshTokenRow) -> Result<()> {
    conn.execute(
        "INSERT INTO refresh_tokens (token_hash, user_id, created_at, expires_at) VALUES (?1, ?2, ?3, ?4)",
        [&token.token_hash, &token.user_id, &token.created_at, &token.expires_at],
    )?;
    Ok(())
}

pub fn find_refresh_token(conn: &Connection, token_hash: &str) -> Result<Option<RefreshTokenRow>> {
    conn.query_row(
        "SELECT token_hash, user_id, created_at, expires_at FROM refresh_tokens WHERE token_hash = ?1",
        [token_hash],
        |row| {
            Ok(RefreshTokenRow {
                token_hash: row.get(0)?,
                user_id: row.get(1)?,
                created_at: row.get(2)?,
                expires_at: row.get(3)?,
            })
        },
    )
    .optional()
}

pub fn delete_refresh_token(conn: &Connection, token_hash: &str) -> Result<bool> {
    let deleted = conn.execute("DELETE FROM refresh_tokens WHERE token_hash = ?1", [token_hash])?;
    Ok(deleted > 0)
}

/// Drop every token whose `expires_at` is before `now`. Returns the count.
pub fn delete_expired_refresh_tokens(conn: &Connection, now: &str) -> Result<usize> {
    let deleted = conn.execute("DELETE FROM refresh_tokens WHERE expires_at < ?1", [now])?;
    Ok(deleted)
}

/// Guest users holding at least one refresh token that expired before `now`.
pub fn expired_guest_ids(conn: &Connection, now: &str) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT DISTINCT u.id FROM users u
         JOIN refresh_tokens t ON t.user_id = u.id
         WHERE u.is_guest = 1 AND t.expires_at < ?1",
    )?;
    let ids = stmt
        .query_map([now], |row| row.get::<_, String>(0))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(ids)
}
