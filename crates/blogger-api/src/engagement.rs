//! Likes and comments. Each engagement, its counter update and the author's
//! notification commit together in one transaction, so `likes` always equals
//! the size of the post's like set.

use chrono::Utc;
use tracing::debug;
use uuid::Uuid;

use blogger_db::models::{CommentRow, PostRow, UserRow};
use blogger_db::queries::{posts, users};
use blogger_db::{Connection, Database, timestamp};
use blogger_types::models::Post;

use crate::error::ApiError;
use crate::notifications::{Engagement, notify};
use crate::views;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeState {
    Liked,
    NotLiked,
}

fn load_parties(conn: &Connection, actor_id: &str, post_id: &str) -> Result<(PostRow, UserRow), ApiError> {
    let post = posts::find_post(conn, post_id)?
        .ok_or_else(|| ApiError::NotFound("invalid id - blog does not exist".into()))?;
    let actor = users::find_user_by_id(conn, actor_id)?
        .ok_or_else(|| ApiError::NotFound("invalid id - user does not exist".into()))?;
    Ok((post, actor))
}

/// Flip `actor_id`'s like on a post. Liking notifies the author; unliking
/// does not. Returns the new state and the updated post.
pub fn toggle_like(db: &Database, actor_id: Uuid, post_id: Uuid) -> Result<(LikeState, Post), ApiError> {
    let actor_id = actor_id.to_string();
    let post_id = post_id.to_string();

    db.with_tx(|tx| {
        let (post, actor) = load_parties(tx, &actor_id, &post_id)?;

        let state = if posts::is_liked(tx, &post.id, &actor.id)? {
            posts::delete_like(tx, &post.id, &actor.id)?;
            posts::adjust_likes(tx, &post.id, -1)?;
            LikeState::NotLiked
        } else {
            posts::insert_like(tx, &post.id, &actor.id, &timestamp(Utc::now()))?;
            posts::adjust_likes(tx, &post.id, 1)?;
            notify(tx, &post, &actor, Engagement::Liked)?;
            LikeState::Liked
        };
        debug!("{} -> {:?} on post {}", actor.username, state, post.id);

        let updated = posts::find_post(tx, &post.id)?
            .ok_or_else(|| anyhow::anyhow!("post {} vanished mid-transaction", post.id))?;
        Ok((state, views::load_post(tx, updated)?))
    })
}

/// Append a comment under the actor's current username and notify the
/// author. `text` must already be checked for blankness.
pub fn add_comment(db: &Database, actor_id: Uuid, post_id: Uuid, text: &str) -> Result<Post, ApiError> {
    let actor_id = actor_id.to_string();
    let post_id = post_id.to_string();

    db.with_tx(|tx| {
        let (post, actor) = load_parties(tx, &actor_id, &post_id)?;

        let row = CommentRow {
            id: Uuid::new_v4().to_string(),
            post_id: post.id.clone(),
            comment: text.to_string(),
            username: actor.username.clone(),
            timestamp: timestamp(Utc::now()),
        };
        posts::insert_comment(tx, &row)?;
        notify(tx, &post, &actor, Engagement::Commented)?;

        Ok(views::load_post(tx, post)?)
    })
}
