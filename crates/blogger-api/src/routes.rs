use axum::{
    Router, middleware,
    routing::{delete, get, post, put},
};

use crate::error::ApiError;
use crate::middleware::extract_bearer;
use crate::state::AppState;
use crate::{auth, blogs, notifications, users};

async fn unknown_endpoint() -> ApiError {
    ApiError::NotFound("unknown endpoint".into())
}

/// The full HTTP surface. Every route sees the bearer token (if any) through
/// [`extract_bearer`]; routes that need an identity take an `AuthUser`.
pub fn router(state: AppState) -> Router {
    let auth_routes = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/refresh", post(auth::refresh))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/guest", post(auth::guest_login));

    let blog_routes = Router::new()
        .route("/api/blogs", get(blogs::list_posts).post(blogs::create_post))
        .route("/api/blogs/{id}", get(blogs::get_post).delete(blogs::delete_post))
        .route("/api/blogs/{id}/edit", put(blogs::edit_post))
        .route("/api/blogs/{id}/like", put(blogs::like_post))
        .route("/api/blogs/{id}/comments", put(blogs::comment_post));

    let user_routes = Router::new()
        .route("/api/user", get(users::list_users))
        .route("/api/user/{username}", get(users::get_user_by_username))
        .route("/api/user/id/{id}", get(users::get_user))
        .route("/api/user/id/{id}/notification", get(notifications::list_notifications))
        .route(
            "/api/user/id/{id}/notification/{notification_id}",
            delete(notifications::dismiss_notification),
        )
        .route(
            "/api/user/id/{id}/notification/{notification_id}/read",
            put(notifications::mark_notification_read),
        );

    Router::new()
        .merge(auth_routes)
        .merge(blog_routes)
        .merge(user_routes)
        .fallback(unknown_endpoint)
        .layer(middleware::from_fn(extract_bearer))
        .with_state(state)
}
