use axum::{
    extract::{FromRequestParts, Request},
    http::{HeaderMap, header, request::Parts},
    middleware::Next,
    response::Response,
};

use blogger_types::api::Claims;

use crate::error::ApiError;
use crate::state::AppState;

/// Raw bearer token from the `Authorization` header, if one was sent.
/// Not verified; see [`AuthUser`].
#[derive(Debug, Clone, Default)]
pub struct BearerToken(pub Option<String>);

/// Stash the bearer token on the request for later handlers. Never rejects;
/// endpoints that need an identity verify it through [`AuthUser`].
pub async fn extract_bearer(mut req: Request, next: Next) -> Response {
    let token = bearer_token(req.headers());
    req.extensions_mut().insert(BearerToken(token));
    next.run(req).await
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then(|| token.to_string())
}

/// Verified caller identity. Rejects with 401 when the bearer token is
/// missing, malformed, expired, or signed with the wrong key.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Claims);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = parts
            .extensions
            .get::<BearerToken>()
            .and_then(|t| t.0.as_deref())
            .ok_or(ApiError::InvalidToken)?;

        let claims = state.tokens().verify_access_token(token)?;
        Ok(AuthUser(claims))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn scheme_is_case_insensitive() {
        assert_eq!(bearer_token(&headers("Bearer abc")).as_deref(), Some("abc"));
        assert_eq!(bearer_token(&headers("bearer abc")).as_deref(), Some("abc"));
    }

    #[test]
    fn malformed_headers_yield_nothing() {
        assert_eq!(bearer_token(&HeaderMap::new()), None);
        assert_eq!(bearer_token(&headers("Basic dXNlcjpwYXNz")), None);
        assert_eq!(bearer_token(&headers("Bearer")), None);
        assert_eq!(bearer_token(&headers("Bearer    ")), None);
    }
}
