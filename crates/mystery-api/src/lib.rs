//! REST handlers: accounts, sessions and characters.

pub mod auth;
pub mod characters;
pub mod error;
pub mod middleware;
pub mod sessions;

use axum::Json;
use tracing::warn;
use uuid::Uuid;

use mystery_types::api::StatusResponse;

/// GET / liveness probe.
pub async fn status() -> Json<StatusResponse> {
    Json(StatusResponse {
        message: "Murder Mystery API is running".to_string(),
    })
}

/// Parse a stored id, logging and substituting the nil UUID if the row is corrupt.
pub(crate) fn parse_id(raw: &str, field: &str, row_id: &str) -> Uuid {
    raw.parse().unwrap_or_else(|e| {
        warn!("Corrupt {} '{}' on row '{}': {}", field, raw, row_id, e);
        Uuid::nil()
    })
}
