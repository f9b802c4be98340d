use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};

use blogger_db::queries::users;

use crate::error::ApiError;
use crate::state::AppState;
use crate::validation::parse_id;
use crate::views;

pub async fn list_users(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let profiles = state.db.with_conn(|conn| {
        users::list_users(conn)?
            .into_iter()
            .map(|row| views::load_profile(conn, row))
            .collect::<anyhow::Result<Vec<_>>>()
    })?;
    Ok(Json(profiles))
}

pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id)?.to_string();
    let profile = state.db.with_conn(|conn| {
        users::find_user_by_id(conn, &id)?
            .map(|row| views::load_profile(conn, row))
            .transpose()
    })?;
    profile
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("This User does not exist - invalid id".into()))
}

pub async fn get_user_by_username(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let profile = state.db.with_conn(|conn| {
        users::find_user_by_username(conn, &username)?
            .map(|row| views::load_profile(conn, row))
            .transpose()
    })?;
    profile
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("This User does not exist - invalid username".into()))
}
