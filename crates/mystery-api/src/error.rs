use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::error;

use mystery_types::api::ErrorResponse;

/// Every handler failure ends up here and leaves as `{"error": "..."}`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Malformed input, or a write the database refused.
    #[error("{0}")]
    Validation(String),

    #[error("invalid credentials")]
    InvalidCredentials,

    /// Missing or unverifiable bearer token on a guarded route.
    #[error("missing or invalid token")]
    Unauthorized,

    /// The database could not be opened at startup.
    #[error("database unavailable")]
    Unavailable,

    #[error("internal error")]
    Internal(anyhow::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::InvalidCredentials | Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        if mystery_db::is_constraint_violation(&err) {
            Self::Validation(err.to_string())
        } else {
            Self::Internal(err)
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            Self::Internal(e) => error!("Request failed: {:#}", e),
            Self::Unavailable => error!("Request failed: database unavailable"),
            _ => {}
        }

        let body = ErrorResponse { error: self.to_string() };
        (self.status(), Json(body)).into_response()
    }
}
