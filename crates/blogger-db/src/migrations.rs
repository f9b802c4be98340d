use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |r| r.get(0),
    )?;

    if version < 1 {
        info!("Running migration v1 (initial schema)");
        conn.execute_batch(
            "
            CREATE TABLE users (
                id          TEXT PRIMARY KEY,
                username    TEXT NOT NULL UNIQUE,
                email       TEXT NOT NULL UNIQUE,
                password    TEXT NOT NULL,
                bio         TEXT,
                is_guest    INTEGER NOT NULL DEFAULT 0,
                created_at  TEXT NOT NULL
            );

            CREATE TABLE posts (
                id          TEXT PRIMARY KEY,
                title       TEXT NOT NULL,
                content     TEXT,
                likes       INTEGER NOT NULL DEFAULT 0,
                author      TEXT NOT NULL,
                author_id   TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                created_at  TEXT NOT NULL
            );

            CREATE INDEX idx_posts_author ON posts(author_id);

            CREATE TABLE comments (
                id          TEXT PRIMARY KEY,
                post_id     TEXT NOT NULL REFERENCES posts(id) ON DELETE CASCADE,
                comment     TEXT NOT NULL,
                username    TEXT NOT NULL,
                timestamp   TEXT NOT NULL
            );

            CREATE INDEX idx_comments_post ON comments(post_id);

            -- One row per (post, user) like. Both like sets are read from here.
            CREATE TABLE post_likes (
                post_id     TEXT NOT NULL REFERENCES posts(id) ON DELETE CASCADE,
                user_id     TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                created_at  TEXT NOT NULL,
                PRIMARY KEY (post_id, user_id)
            );

            CREATE INDEX idx_post_likes_user ON post_likes(user_id);

            CREATE TABLE notifications (
                id            TEXT PRIMARY KEY,
                recipient_id  TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                message       TEXT NOT NULL,
                is_read       INTEGER NOT NULL DEFAULT 0,
                post_id       TEXT REFERENCES posts(id) ON DELETE CASCADE,
                actor_id      TEXT REFERENCES users(id) ON DELETE CASCADE,
                created_at    TEXT NOT NULL
            );

            CREATE INDEX idx_notifications_recipient ON notifications(recipient_id);

            CREATE TABLE refresh_tokens (
                token_hash  TEXT PRIMARY KEY,
                user_id     TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                created_at  TEXT NOT NULL,
                expires_at  TEXT NOT NULL
            );

            CREATE INDEX idx_refresh_tokens_expiry ON refresh_tokens(expires_at);

            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}
