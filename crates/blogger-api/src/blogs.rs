use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use axum_extra::extract::WithRejection;
use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use blogger_db::models::PostRow;
use blogger_db::queries::{posts, users};
use blogger_db::timestamp;
use blogger_types::api::{CommentRequest, CreatePostRequest, EditPostRequest};

use crate::engagement;
use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::state::AppState;
use crate::validation::{parse_id, required};
use crate::views;

fn blog_not_found() -> ApiError {
    ApiError::NotFound("invalid id - blog does not exist".into())
}

pub async fn list_posts(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let posts = state.db.with_conn(|conn| {
        posts::list_posts(conn)?
            .into_iter()
            .map(|row| views::load_post(conn, row))
            .collect::<anyhow::Result<Vec<_>>>()
    })?;
    Ok(Json(posts))
}

pub async fn get_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id)?.to_string();
    let post = state.db.with_conn(|conn| {
        posts::find_post(conn, &id)?
            .map(|row| views::load_post(conn, row))
            .transpose()
    })?;
    post.map(Json).ok_or_else(blog_not_found)
}

pub async fn create_post(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    WithRejection(Json(req), _): WithRejection<Json<CreatePostRequest>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let title = required(req.title.as_deref()).ok_or(ApiError::MissingFields)?;
    let author_id = claims.id.to_string();

    let post = state.db.with_tx(|tx| {
        let author = users::find_user_by_id(tx, &author_id)?
            .ok_or_else(|| ApiError::NotFound("invalid id - user does not exist".into()))?;
        let row = PostRow {
            id: Uuid::new_v4().to_string(),
            title: title.to_string(),
            content: req.content.clone(),
            likes: 0,
            author: author.username,
            author_id: author.id,
            created_at: timestamp(Utc::now()),
        };
        posts::insert_post(tx, &row)?;
        Ok::<_, ApiError>(views::load_post(tx, row)?)
    })?;

    info!("{} published post {}", claims.username, post.id);
    Ok((StatusCode::CREATED, Json(post)))
}

/// Load a post for a write by its author. Other callers are `Unauthorized`.
fn owned_post(conn: &blogger_db::Connection, id: &str, caller: Uuid) -> Result<PostRow, ApiError> {
    let post = posts::find_post(conn, id)?.ok_or_else(blog_not_found)?;
    if post.author_id != caller.to_string() {
        return Err(ApiError::Unauthorized);
    }
    Ok(post)
}

pub async fn delete_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
    AuthUser(claims): AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id)?.to_string();

    state.db.with_tx(|tx| {
        owned_post(tx, &id, claims.id)?;
        posts::delete_post(tx, &id)?;
        Ok::<_, ApiError>(())
    })?;

    info!("{} deleted post {}", claims.username, id);
    Ok(StatusCode::NO_CONTENT)
}

pub async fn edit_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
    AuthUser(claims): AuthUser,
    WithRejection(Json(req), _): WithRejection<Json<EditPostRequest>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id)?.to_string();
    // A blank title would break the "title is required" rule; ignore it.
    let title = required(req.title.as_deref());

    let post = state.db.with_tx(|tx| {
        owned_post(tx, &id, claims.id)?;
        posts::update_post(tx, &id, title, req.content.as_deref())?;
        let row = posts::find_post(tx, &id)?.ok_or_else(blog_not_found)?;
        Ok::<_, ApiError>(views::load_post(tx, row)?)
    })?;

    Ok(Json(post))
}

pub async fn like_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
    AuthUser(claims): AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let post_id = parse_id(&id)?;
    let (_, post) = engagement::toggle_like(&state.db, claims.id, post_id)?;
    Ok(Json(post))
}

pub async fn comment_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
    AuthUser(claims): AuthUser,
    WithRejection(Json(req), _): WithRejection<Json<CommentRequest>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let post_id = parse_id(&id)?;
    let text = required(req.comment.as_deref()).ok_or(ApiError::MissingFields)?;
    let post = engagement::add_comment(&state.db, claims.id, post_id, text)?;
    Ok((StatusCode::CREATED, Json(post)))
}
