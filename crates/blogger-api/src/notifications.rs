use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use uuid::Uuid;

use blogger_db::models::{NotificationRow, PostRow, UserRow};
use blogger_db::queries::{notifications, users};
use blogger_db::{Connection, Database, timestamp};
use blogger_types::models::{Notification, NotificationList};

use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::state::AppState;
use crate::validation::parse_id;
use crate::views;

/// What the actor did to the post.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Engagement {
    Liked,
    Commented,
}

impl Engagement {
    pub fn message(self, actor: &str) -> String {
        match self {
            Engagement::Liked => format!("{actor} has liked your post!"),
            Engagement::Commented => format!("{actor} has commented on your post!"),
        }
    }
}

/// Record a notification for the author of `post`. Runs on the caller's
/// connection so it commits or rolls back with the engagement that caused it.
///
/// Authors engaging with their own posts are notified too.
pub fn notify(
    conn: &Connection,
    post: &PostRow,
    actor: &UserRow,
    kind: Engagement,
) -> anyhow::Result<NotificationRow> {
    let row = NotificationRow {
        id: Uuid::new_v4().to_string(),
        recipient_id: post.author_id.clone(),
        message: kind.message(&actor.username),
        is_read: false,
        post_id: Some(post.id.clone()),
        actor_id: Some(actor.id.clone()),
        created_at: timestamp(Utc::now()),
    };
    notifications::insert_notification(conn, &row)?;
    Ok(row)
}

fn invalid_id() -> ApiError {
    ApiError::NotFound("invalid id".into())
}

/// Delete a notification from a user's list.
///
/// Only checks that both records exist; the notification is not required to
/// belong to `user_id`.
pub fn dismiss(db: &Database, user_id: Uuid, notification_id: Uuid) -> Result<(), ApiError> {
    let user_id = user_id.to_string();
    let notification_id = notification_id.to_string();

    db.with_tx(|tx| {
        users::find_user_by_id(tx, &user_id)?.ok_or_else(invalid_id)?;
        notifications::find_notification(tx, &notification_id)?.ok_or_else(invalid_id)?;
        notifications::delete_notification(tx, &notification_id)?;
        Ok(())
    })
}

/// Flag one of `user_id`'s notifications as read.
pub fn mark_read(db: &Database, user_id: Uuid, notification_id: Uuid) -> Result<Notification, ApiError> {
    let user_id = user_id.to_string();
    let notification_id = notification_id.to_string();

    db.with_tx(|tx| {
        if !notifications::mark_notification_read(tx, &notification_id, &user_id)? {
            return Err(invalid_id());
        }
        let row = notifications::find_notification(tx, &notification_id)?.ok_or_else(invalid_id)?;
        Ok(views::notification(row))
    })
}

pub fn list(db: &Database, user_id: Uuid) -> Result<NotificationList, ApiError> {
    let id = user_id.to_string();
    db.with_conn(|conn| {
        let Some(_) = users::find_user_by_id(conn, &id)? else {
            return Ok(None);
        };
        let rows = notifications::notifications_for(conn, &id)?;
        Ok(Some(rows.into_iter().map(views::notification).collect()))
    })?
    .map(|notifications| NotificationList {
        id: user_id,
        notifications,
    })
    .ok_or_else(|| ApiError::NotFound("user does not exist".into()))
}

// -- Handlers --

pub async fn list_notifications(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    _caller: AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = parse_id(&user_id)?;
    Ok(Json(list(&state.db, user_id)?))
}

pub async fn dismiss_notification(
    State(state): State<AppState>,
    Path((user_id, notification_id)): Path<(String, String)>,
    _caller: AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = parse_id(&user_id)?;
    let notification_id = parse_id(&notification_id)?;
    dismiss(&state.db, user_id, notification_id)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn mark_notification_read(
    State(state): State<AppState>,
    Path((user_id, notification_id)): Path<(String, String)>,
    _caller: AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = parse_id(&user_id)?;
    let notification_id = parse_id(&notification_id)?;
    Ok(Json(mark_read(&state.db, user_id, notification_id)?))
}
