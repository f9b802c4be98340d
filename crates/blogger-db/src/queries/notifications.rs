use anyhow::Result;
use rusqlite::{Connection, Row};

use super::OptionalExt;
use crate::models::NotificationRow;

const NOTIFICATION_COLUMNS: &str = "id, recipient_id, message, is_read, post_id, actor_id, created_at";

fn notification_from_row(row: &Row<'_>) -> rusqlite::Result<NotificationRow> {
    Ok(NotificationRow {
        id: row.get(0)?,
        recipient_id: row.get(1)?,
        message: row.get(2)?,
        is_read: row.get(3)?,
        post_id: row.get(4)?,
        actor_id: row.get(5)?,
        created_at: row.get(6)?,
    })
}

pub fn insert_notification(conn: &Connection, n: &NotificationRow) -> Result<()> {
    conn.execute(
        "INSERT INTO notifications (id, recipient_id, message, is_read, post_id, actor_id, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        rusqlite::params![
            n.id,
            n.recipient_id,
            n.message,
            n.is_read,
            n.post_id,
            n.actor_id,
            n.created_at,
        ],
    )?;
    Ok(())
}

pub fn find_notification(conn: &Connection, id: &str) -> Result<Option<NotificationRow>> {
    let sql = format!("SELECT {NOTIFICATION_COLUMNS} FROM notifications WHERE id = ?1");
    conn.query_row(&sql, [id], notification_from_row).optional()
}

/// A user's notifications, oldest first.
pub fn notifications_for(conn: &Connection, recipient_id: &str) -> Result<Vec<NotificationRow>> {
    let sql = format!(
        "SELECT {NOTIFICATION_COLUMNS} FROM notifications WHERE recipient_id = ?1 ORDER BY rowid"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([recipient_id], notification_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn delete_notification(conn: &Connection, id: &str) -> Result<bool> {
    let deleted = conn.execute("DELETE FROM notifications WHERE id = ?1", [id])?;
    Ok(deleted > 0)
}

/// Flag a notification as read. Only matches when it belongs to `recipient_id`.
pub fn mark_notification_read(conn: &Connection, id: &str, recipient_id: &str) -> Result<bool> {
    let updated = conn.execute(
        "UPDATE notifications SET is_read = 1 WHERE id = ?1 AND recipient_id = ?2",
        [id, recipient_id],
    )?;
    Ok(updated > 0)
}
