use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

use blogger_types::api::ErrorBody;

/// Every failure a handler can report. Clients get the status code and a
/// single human-readable `error` string.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Missing fields")]
    MissingFields,

    #[error("{0}")]
    Validation(String),

    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("malformatted id")]
    MalformedId,

    #[error("{0}")]
    NotFound(String),

    #[error("Invalid token")]
    InvalidToken,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("{0}")]
    ExpiredToken(String),

    #[error("missing token")]
    MissingToken,

    #[error("{0}")]
    Conflict(String),

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingFields
            | ApiError::Validation(_)
            | ApiError::InvalidCredentials
            | ApiError::MalformedId => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::InvalidToken | ApiError::Unauthorized | ApiError::ExpiredToken(_) => {
                StatusCode::UNAUTHORIZED
            }
            ApiError::MissingToken => StatusCode::FORBIDDEN,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Internal(ref e) = self {
            error!("Internal error: {:#}", e);
        }

        let body = ErrorBody {
            error: self.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}
