//! Access and refresh tokens.
//!
//! Access tokens are stateless HS256 JWTs checked on every request. Refresh
//! tokens are signed with a separate secret and also recorded server-side
//! (as a SHA-256 digest) so a logout can end the session before the token
//! expires on its own.

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use jsonwebtoken::errors::ErrorKind;
use sha2::{Digest, Sha256};
use tracing::info;
use uuid::Uuid;

use blogger_db::models::RefreshTokenRow;
use blogger_db::queries::{refresh_tokens, users};
use blogger_db::{Database, timestamp};
use blogger_types::api::{Claims, SessionKind};

use crate::config::AppConfig;
use crate::error::ApiError;

/// Digest under which a refresh token is stored.
pub fn hash_refresh_token(raw_token: &str) -> String {
    hex::encode(Sha256::digest(raw_token.as_bytes()))
}

fn new_claims(id: Uuid, username: &str, kind: Option<SessionKind>, ttl: Duration) -> Claims {
    let now = Utc::now();
    Claims {
        id,
        username: username.to_string(),
        kind,
        jti: Uuid::new_v4(),
        iat: now.timestamp(),
        exp: (now + ttl).timestamp() as usize,
    }
}

fn sign(claims: &Claims, secret: &str) -> Result<String, ApiError> {
    let token = encode(
        &Header::new(Algorithm::HS256),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(anyhow::Error::from)?;
    Ok(token)
}

/// Signature check, plus the expiry check when `check_exp` is set.
fn read_claims(
    token: &str,
    secret: &str,
    check_exp: bool,
) -> Result<Claims, jsonwebtoken::errors::Error> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = check_exp;

    let data = decode::<Claims>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation)?;
    Ok(data.claims)
}

/// Stateless access-token check. No database lookup.
pub fn verify_access_token(config: &AppConfig, token: &str) -> Result<Claims, ApiError> {
    read_claims(token, &config.access_secret, true).map_err(|_| ApiError::InvalidToken)
}

pub struct TokenService<'a> {
    db: &'a Database,
    config: &'a AppConfig,
}

impl<'a> TokenService<'a> {
    pub fn new(db: &'a Database, config: &'a AppConfig) -> Self {
        Self { db, config }
    }

    pub fn issue_access_token(&self, id: Uuid, username: &str) -> Result<String, ApiError> {
        let claims = new_claims(id, username, None, self.config.access_ttl);
        sign(&claims, &self.config.access_secret)
    }

    /// Sign a refresh token and record it so it can be revoked later.
    pub fn issue_refresh_token(
        &self,
        id: Uuid,
        username: &str,
        kind: SessionKind,
    ) -> Result<String, ApiError> {
        let ttl = self.config.session_ttl(kind);
        let claims = new_claims(id, username, Some(kind), ttl);
        let token = sign(&claims, &self.config.refresh_secret)?;

        let now = Utc::now();
        let row = RefreshTokenRow {
            token_hash: hash_refresh_token(&token),
            user_id: id.to_string(),
            created_at: timestamp(now),
            expires_at: timestamp(now + ttl),
        };
        self.db
            .with_conn(|conn| refresh_tokens::insert_refresh_token(conn, &row))?;

        Ok(token)
    }

    pub fn verify_access_token(&self, token: &str) -> Result<Claims, ApiError> {
        verify_access_token(self.config, token)
    }

    /// Mint a new access token from a refresh token.
    ///
    /// Guest refresh tokens never mint: presenting one ends the guest
    /// identity, whether or not the token has expired yet. Standard tokens
    /// must still be on record and unexpired.
    pub fn rotate_access_token(&self, refresh_token: &str) -> Result<String, ApiError> {
        let claims = read_claims(refresh_token, &self.config.refresh_secret, false)
            .map_err(|_| ApiError::InvalidToken)?;

        if claims.is_guest() {
            let guest_id = claims.id.to_string();
            let removed = self.db.with_tx(|tx| users::delete_user(tx, &guest_id))?;
            if removed {
                info!("Guest {} session ended, account removed", claims.username);
            }
            return Err(ApiError::ExpiredToken("guest session expired".into()));
        }

        let token_hash = hash_refresh_token(refresh_token);
        let record = self
            .db
            .with_conn(|conn| refresh_tokens::find_refresh_token(conn, &token_hash))?;
        let now = timestamp(Utc::now());
        match record {
            Some(row) if row.expires_at > now => {}
            _ => return Err(ApiError::ExpiredToken("expired token".into())),
        }

        let claims = read_claims(refresh_token, &self.config.refresh_secret, true).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => ApiError::ExpiredToken("expired token".into()),
                _ => ApiError::InvalidToken,
            }
        })?;

        self.issue_access_token(claims.id, &claims.username)
    }

    /// Forget a refresh token. Guest sessions take their user with them.
    /// Returns the kind of session that was ended.
    pub fn revoke(&self, refresh_token: &str) -> Result<SessionKind, ApiError> {
        let claims = read_claims(refresh_token, &self.config.refresh_secret, false)
            .map_err(|_| ApiError::InvalidToken)?;
        let token_hash = hash_refresh_token(refresh_token);
        let user_id = claims.id.to_string();

        self.db.with_tx(|tx| {
            refresh_tokens::delete_refresh_token(tx, &token_hash)?;
            if claims.is_guest() {
                users::delete_user(tx, &user_id)?;
            }
            Ok::<_, anyhow::Error>(())
        })?;

        Ok(claims.kind.unwrap_or(SessionKind::Standard))
    }
}
