use serde::{Deserialize, Serialize};
use uuid::Uuid;

// -- JWT Claims --

/// Which kind of session a refresh token belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionKind {
    Standard,
    Guest,
}

/// Claims carried by both access and refresh tokens. Refresh tokens also set
/// `type`; access tokens leave it out.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub id: Uuid,
    pub username: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<SessionKind>,
    /// Unique per token, so two tokens minted in the same second never collide.
    pub jti: Uuid,
    pub iat: i64,
    pub exp: usize,
}

impl Claims {
    pub fn is_guest(&self) -> bool {
        self.kind == Some(SessionKind::Guest)
    }
}

// -- Auth --

/// Fields are optional so a missing field surfaces as `Missing fields`
/// instead of a deserialization failure.
#[derive(Debug, Default, Deserialize)]
pub struct RegisterRequest {
    pub username: Option<String>,
    pub password: Option<String>,
    pub email: Option<String>,
    pub bio: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub access_token: String,
    pub username: String,
    pub id: Uuid,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    pub access_token: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusMessage {
    pub message: String,
}

// -- Posts --

#[derive(Debug, Default, Deserialize)]
pub struct CreatePostRequest {
    pub title: Option<String>,
    pub content: Option<String>,
}

/// Only title and content are editable. Counters and like sets are owned by
/// the engagement engine.
#[derive(Debug, Default, Deserialize)]
pub struct EditPostRequest {
    pub title: Option<String>,
    pub content: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CommentRequest {
    pub comment: Option<String>,
}

// -- Errors --

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}
