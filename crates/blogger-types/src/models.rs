use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A comment as embedded in its post. `username` is a snapshot taken when the
/// comment was written, not a live reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: Uuid,
    pub comment: String,
    pub timestamp: DateTime<Utc>,
    pub username: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: Uuid,
    pub title: String,
    pub content: Option<String>,
    pub likes: i64,
    pub author: String,
    pub author_id: Uuid,
    pub created: DateTime<Utc>,
    pub comments: Vec<Comment>,
    pub liked_users: Vec<Uuid>,
}

/// Reduced post shape used inside user profiles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostSummary {
    pub id: Uuid,
    pub title: String,
    pub content: Option<String>,
    pub likes: i64,
    pub author: String,
    pub created: DateTime<Utc>,
}

/// Outward user representation. There is deliberately no password field.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub bio: Option<String>,
    pub is_guest: bool,
    pub created: DateTime<Utc>,
    pub blogs: Vec<PostSummary>,
    pub liked_blogs: Vec<PostSummary>,
    pub notifications: Vec<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: Uuid,
    pub message: String,
    pub read: bool,
    pub blog_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
    pub created: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationList {
    pub id: Uuid,
    pub notifications: Vec<Notification>,
}
