use anyhow::Result;
use rusqlite::{Connection, Row};

use super::OptionalExt;
use crate::models::{CommentRow, PostRow};

const POST_COLUMNS: &str = "p.id, p.title, p.content, p.likes, p.author, p.author_id, p.created_at";

fn post_from_row(row: &Row<'_>) -> rusqlite::Result<PostRow> {
    Ok(PostRow {
        id: row.get(0)?,
        title: row.get(1)?,
        content: row.get(2)?,
        likes: row.get(3)?,
        author: row.get(4)?,
        author_id: row.get(5)?,
        created_at: row.get(6)?,
    })
}

fn collect_posts(conn: &Connection, sql: &str, params: impl rusqlite::Params) -> Result<Vec<PostRow>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params, post_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

// -- Posts --

pub fn insert_post(conn: &Connection, post: &PostRow) -> Result<()> {
    conn.execute(
        "INSERT INTO posts (id, title, content, likes, author, author_id, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        rusqlite::params![
            post.id,
            post.title,
            post.content,
            post.likes,
            post.author,
            post.author_id,
            post.created_at,
        ],
    )?;
    Ok(())
}

pub fn find_post(conn: &Connection, id: &str) -> Result<Option<PostRow>> {
    let sql = format!("SELECT {POST_COLUMNS} FROM posts p WHERE p.id = ?1");
    conn.query_row(&sql, [id], post_from_row).optional()
}

pub fn list_posts(conn: &Connection) -> Result<Vec<PostRow>> {
    let sql = format!("SELECT {POST_COLUMNS} FROM posts p ORDER BY p.rowid");
    collect_posts(conn, &sql, [])
}

/// Posts owned by `user_id`, oldest first.
pub fn posts_by_author(conn: &Connection, user_id: &str) -> Result<Vec<PostRow>> {
    let sql = format!("SELECT {POST_COLUMNS} FROM posts p WHERE p.author_id = ?1 ORDER BY p.rowid");
    collect_posts(conn, &sql, [user_id])
}

/// Posts liked by `user_id`, in the order the likes were given.
pub fn liked_posts(conn: &Connection, user_id: &str) -> Result<Vec<PostRow>> {
    let sql = format!(
        "SELECT {POST_COLUMNS} FROM posts p
         JOIN post_likes pl ON pl.post_id = p.id
         WHERE pl.user_id = ?1
         ORDER BY pl.rowid"
    );
    collect_posts(conn, &sql, [user_id])
}

/// Update title and/or content; `None` leaves a column as it is.
pub fn update_post(
    conn: &Connection,
    id: &str,
    title: Option<&str>,
    content: Option<&str>,
) -> Result<bool> {
    let updated = conn.execute(
        "UPDATE posts SET title = COALESCE(?2, title), content = COALESCE(?3, content) WHERE id = ?1",
        rusqlite::params![id, title, content],
    )?;
    Ok(updated > 0)
}

pub fn delete_post(conn: &Connection, id: &str) -> Result<bool> {
    let deleted = conn.execute("DELETE FROM posts WHERE id = ?1", [id])?;
    Ok(deleted > 0)
}

// -- Likes --

pub fn is_liked(conn: &Connection, post_id: &str, user_id: &str) -> Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM post_likes WHERE post_id = ?1 AND user_id = ?2",
        [post_id, user_id],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

pub fn insert_like(conn: &Connection, post_id: &str, user_id: &str, created_at: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO post_likes (post_id, user_id, created_at) VALUES (?1, ?2, ?3)",
        [post_id, user_id, created_at],
    )?;
    Ok(())
}

pub fn delete_like(conn: &Connection, post_id: &str, user_id: &str) -> Result<bool> {
    let deleted = conn.execute(
        "DELETE FROM post_likes WHERE post_id = ?1 AND user_id = ?2",
        [post_id, user_id],
    )?;
    Ok(deleted > 0)
}

pub fn adjust_likes(conn: &Connection, post_id: &str, delta: i64) -> Result<()> {
    conn.execute(
        "UPDATE posts SET likes = likes + ?2 WHERE id = ?1",
        rusqlite::params![post_id, delta],
    )?;
    Ok(())
}

/// Users who liked `post_id`, in the order the likes were given.
pub fn liked_user_ids(conn: &Connection, post_id: &str) -> Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT user_id FROM post_likes WHERE post_id = ?1 ORDER BY rowid")?;
    let ids = stmt
        .query_map([post_id], |row| row.get::<_, String>(0))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(ids)
}

// -- Comments --

pub fn insert_comment(conn: &Connection, comment: &CommentRow) -> Result<()> {
    conn.execute(
        "INSERT INTO comments (id, post_id, comment, username, timestamp) VALUES (?1, ?2, ?3, ?4, ?5)",
        [
            &comment.id,
            &comment.post_id,
            &comment.comment,
            &comment.username,
            &comment.timestamp,
        ],
    )?;
    Ok(())
}

pub fn comments_for_post(conn: &Connection, post_id: &str) -> Result<Vec<CommentRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, post_id, comment, username, timestamp FROM comments
         WHERE post_id = ?1
         ORDER BY rowid",
    )?;
    let rows = stmt
        .query_map([post_id], |row| {
            Ok(CommentRow {
                id: row.get(0)?,
                post_id: row.get(1)?,
                comment: row.get(2)?,
                username: row.get(3)?,
                timestamp: row.get(4)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}
