//! Row to API model conversion. Corrupt stored values are logged and replaced
//! with defaults rather than failing the whole response.

use anyhow::Result;
use chrono::{DateTime, Utc};
use tracing::warn;
use uuid::Uuid;

use blogger_db::Connection;
use blogger_db::models::{CommentRow, NotificationRow, PostRow, UserRow};
use blogger_db::queries::{notifications, posts};
use blogger_types::models::{Comment, Notification, Post, PostSummary, UserProfile};

pub fn parse_uuid(raw: &str, what: &str) -> Uuid {
    raw.parse().unwrap_or_else(|e| {
        warn!("Corrupt {} '{}': {}", what, raw, e);
        Uuid::default()
    })
}

pub fn parse_time(raw: &str) -> DateTime<Utc> {
    raw.parse::<DateTime<Utc>>().unwrap_or_else(|e| {
        warn!("Corrupt timestamp '{}': {}", raw, e);
        DateTime::default()
    })
}

fn comment(row: CommentRow) -> Comment {
    Comment {
        id: parse_uuid(&row.id, "comment id"),
        comment: row.comment,
        timestamp: parse_time(&row.timestamp),
        username: row.username,
    }
}

/// Full post with its comments and like set.
pub fn load_post(conn: &Connection, row: PostRow) -> Result<Post> {
    let comments = posts::comments_for_post(conn, &row.id)?
        .into_iter()
        .map(comment)
        .collect();
    let liked_users = posts::liked_user_ids(conn, &row.id)?
        .iter()
        .map(|id| parse_uuid(id, "liked user id"))
        .collect();

    Ok(Post {
        id: parse_uuid(&row.id, "post id"),
        title: row.title,
        content: row.content,
        likes: row.likes,
        author: row.author,
        author_id: parse_uuid(&row.author_id, "author id"),
        created: parse_time(&row.created_at),
        comments,
        liked_users,
    })
}

pub fn post_summary(row: PostRow) -> PostSummary {
    PostSummary {
        id: parse_uuid(&row.id, "post id"),
        title: row.title,
        content: row.content,
        likes: row.likes,
        author: row.author,
        created: parse_time(&row.created_at),
    }
}

pub fn notification(row: NotificationRow) -> Notification {
    Notification {
        id: parse_uuid(&row.id, "notification id"),
        message: row.message,
        read: row.is_read,
        blog_id: row.post_id.as_deref().map(|id| parse_uuid(id, "notification post id")),
        user_id: row.actor_id.as_deref().map(|id| parse_uuid(id, "notification actor id")),
        created: parse_time(&row.created_at),
    }
}

/// Public profile. The password hash in `row` is dropped here.
pub fn load_profile(conn: &Connection, row: UserRow) -> Result<UserProfile> {
    let blogs = posts::posts_by_author(conn, &row.id)?
        .into_iter()
        .map(post_summary)
        .collect();
    let liked_blogs = posts::liked_posts(conn, &row.id)?
        .into_iter()
        .map(post_summary)
        .collect();
    let notifications = notifications::notifications_for(conn, &row.id)?
        .iter()
        .map(|n| parse_uuid(&n.id, "notification id"))
        .collect();

    Ok(UserProfile {
        id: parse_uuid(&row.id, "user id"),
        username: row.username,
        email: row.email,
        bio: row.bio,
        is_guest: row.is_guest,
        created: parse_time(&row.created_at),
        blogs,
        liked_blogs,
        notifications,
    })
}
