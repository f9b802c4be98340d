use anyhow::anyhow;
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use axum_extra::extract::{
    CookieJar, WithRejection,
    cookie::{Cookie, SameSite},
};
use chrono::{Duration, Utc};
use tracing::{debug, info};
use uuid::Uuid;

use blogger_db::models::UserRow;
use blogger_db::queries::users;
use blogger_db::timestamp;
use blogger_types::api::{
    AuthResponse, LoginRequest, RefreshResponse, RegisterRequest, SessionKind, StatusMessage,
};

use crate::error::ApiError;
use crate::password::{hash_password, verify_password};
use crate::state::AppState;
use crate::validation::required;

pub const REFRESH_COOKIE: &str = "refreshToken";

/// Guest names are regenerated this many times on a collision before giving up.
const GUEST_NAME_ATTEMPTS: usize = 4;

fn refresh_cookie(token: &str, ttl: Duration) -> Result<Cookie<'static>, ApiError> {
    let cookie = format!(
        "{}={}; HttpOnly; Secure; SameSite=Strict; Path=/; Max-Age={}",
        REFRESH_COOKIE,
        token,
        ttl.num_seconds()
    );
    Cookie::parse(cookie).map_err(|e| ApiError::Internal(anyhow!("Failed to build refresh cookie: {}", e)))
}

fn clear_refresh_cookie(jar: CookieJar) -> CookieJar {
    jar.remove(
        Cookie::build(REFRESH_COOKIE)
            .path("/")
            .http_only(true)
            .secure(true)
            .same_site(SameSite::Strict),
    )
}

/// Mint both tokens for a user and attach the refresh token as a cookie.
fn issue_session(
    state: &AppState,
    jar: CookieJar,
    id: Uuid,
    username: &str,
    kind: SessionKind,
) -> Result<(CookieJar, Json<AuthResponse>), ApiError> {
    let tokens = state.tokens();
    let access_token = tokens.issue_access_token(id, username)?;
    let refresh_token = tokens.issue_refresh_token(id, username, kind)?;
    let cookie = refresh_cookie(&refresh_token, state.config.session_ttl(kind))?;

    Ok((
        jar.add(cookie),
        Json(AuthResponse {
            access_token,
            username: username.to_string(),
            id,
        }),
    ))
}

pub async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    WithRejection(Json(req), _): WithRejection<Json<RegisterRequest>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let (Some(username), Some(password), Some(email)) = (
        required(req.username.as_deref()),
        required(req.password.as_deref()),
        required(req.email.as_deref()),
    ) else {
        return Err(ApiError::MissingFields);
    };

    let validators = &state.config.validators;
    if !validators.email(email) {
        return Err(ApiError::Validation("invalid email address".into()));
    }
    if !validators.username(username) {
        return Err(ApiError::Validation("invalid username format".into()));
    }
    if !validators.password(password) {
        return Err(ApiError::Validation("invalid password format".into()));
    }

    let id = Uuid::new_v4();
    let row = UserRow {
        id: id.to_string(),
        username: username.to_string(),
        email: email.to_string(),
        password: hash_password(password)?,
        bio: req.bio.clone(),
        is_guest: false,
        created_at: timestamp(Utc::now()),
    };

    state.db.with_tx(|tx| {
        if users::username_or_email_taken(tx, &row.username, &row.email)? {
            return Err(ApiError::Conflict("username or email already taken".into()));
        }
        users::insert_user(tx, &row)?;
        Ok(())
    })?;

    info!("Registered user {} ({})", username, id);
    issue_session(&state, jar, id, username, SessionKind::Standard)
}

pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    WithRejection(Json(req), _): WithRejection<Json<LoginRequest>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let (Some(username), Some(password)) = (
        required(req.username.as_deref()),
        required(req.password.as_deref()),
    ) else {
        return Err(ApiError::MissingFields);
    };

    let user = state
        .db
        .with_conn(|conn| users::find_user_by_username(conn, username))?
        .ok_or(ApiError::InvalidCredentials)?;

    if !verify_password(password, &user.password)? {
        debug!("Failed login for {}", username);
        return Err(ApiError::InvalidCredentials);
    }

    let id = Uuid::parse_str(&user.id).map_err(anyhow::Error::from)?;
    issue_session(&state, jar, id, &user.username, SessionKind::Standard)
}

pub async fn refresh(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<impl IntoResponse, ApiError> {
    let token = jar.get(REFRESH_COOKIE).ok_or(ApiError::MissingToken)?;
    let access_token = state.tokens().rotate_access_token(token.value())?;
    Ok((StatusCode::CREATED, Json(RefreshResponse { access_token })))
}

pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<impl IntoResponse, ApiError> {
    let token = jar.get(REFRESH_COOKIE).ok_or(ApiError::MissingToken)?;
    let kind = state.tokens().revoke(token.value())?;

    let message = match kind {
        SessionKind::Standard => "user logged out",
        SessionKind::Guest => "guest user logged out",
    };
    info!("{}", message);

    Ok((
        clear_refresh_cookie(jar),
        Json(StatusMessage {
            message: message.to_string(),
        }),
    ))
}

/// Create a throwaway account and start a guest session for it. The account
/// lives until the session is refreshed, logged out, or pruned.
pub async fn guest_login(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<impl IntoResponse, ApiError> {
    let id = Uuid::new_v4();
    let password = hash_password(&Uuid::new_v4().to_string())?;

    let username = state.db.with_tx(|tx| {
        for _ in 0..GUEST_NAME_ATTEMPTS {
            let username = format!("Guest{:08x}", rand::random::<u32>());
            let email = format!("{username}@guest.com");
            if users::username_or_email_taken(tx, &username, &email)? {
                continue;
            }
            let row = UserRow {
                id: id.to_string(),
                username: username.clone(),
                email,
                password: password.clone(),
                bio: None,
                is_guest: true,
                created_at: timestamp(Utc::now()),
            };
            users::insert_user(tx, &row)?;
            return Ok(username);
        }
        Err(anyhow!("no free guest name after {} attempts", GUEST_NAME_ATTEMPTS))
    })?;

    info!("Guest session started for {}", username);
    issue_session(&state, jar, id, &username, SessionKind::Guest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refresh_cookie_attributes() {
        let cookie = refresh_cookie("abc", Duration::days(5)).unwrap();
        assert_eq!(cookie.name(), REFRESH_COOKIE);
        assert_eq!(cookie.value(), "abc");
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Strict));
        assert_eq!(cookie.path(), Some("/"));

        let header = cookie.to_string();
        assert!(header.contains("Max-Age=432000"), "{header}");
    }

    #[test]
    fn guest_cookie_lasts_a_day() {
        let cookie = refresh_cookie("abc", Duration::hours(24)).unwrap();
        assert!(cookie.to_string().contains("Max-Age=86400"));
    }
}
