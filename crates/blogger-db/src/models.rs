//! Database row types. These map directly to SQLite rows and are kept apart
//! from the blogger-types API models so the DB layer stays independent.

#[derive(Debug, Clone)]
pub struct UserRow {
    pub id: String,
    pub username: String,
    pub email: String,
    pub password: String,
    pub bio: Option<String>,
    pub is_guest: bool,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct PostRow {
    pub id: String,
    pub title: String,
    pub content: Option<String>,
    pub likes: i64,
    pub author: String,
    pub author_id: String,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct CommentRow {
    pub id: String,
    pub post_id: String,
    pub comment: String,
    pub username: String,
    pub timestamp: String,
}

#[derive(Debug, Clone)]
pub struct NotificationRow {
    pub id: String,
    pub recipient_id: String,
    pub message: String,
    pub is_read: bool,
    pub post_id: Option<String>,
    pub actor_id: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct RefreshTokenRow {
    pub token_hash: String,
    pub user_id: String,
    pub created_at: String,
    pub expires_at: String,
}
