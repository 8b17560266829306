use axum::{Json, extract::{State, rejection::JsonRejection}, http::StatusCode, response::IntoResponse};
use tracing::{info, warn};
use uuid::Uuid;

use mystery_db::models::SessionRow;
use mystery_types::api::CreateSessionRequest;
use mystery_types::models::Session;

use crate::auth::{AppState, with_db};
use crate::error::ApiError;
use crate::parse_id;

/// No check that the caller is the declared host.
pub async fn create_session(
    State(state): State<AppState>,
    payload: Result<Json<CreateSessionRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;
    if req.name.trim().is_empty() {
        return Err(ApiError::Validation("name must not be empty".into()));
    }

    let session = Session {
        id: Uuid::new_v4(),
        name: req.name,
        host_user_id: req.host_user_id,
        player_count: req.player_count,
        current_phase: req.current_phase,
        is_active: req.is_active,
    };

    let row = to_row(&session);
    with_db(&state, move |db| db.insert_session(&row)).await?;

    info!("Session {} '{}' created by host {}", session.id, session.name, session.host_user_id);
    Ok((StatusCode::CREATED, Json(session)))
}

pub async fn list_active_sessions(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let rows = with_db(&state, |db| db.list_active_sessions()).await?;
    let sessions: Vec<Session> = rows.into_iter().map(from_row).collect();
    Ok(Json(sessions))
}

fn to_row(session: &Session) -> SessionRow {
    SessionRow {
        id: session.id.to_string(),
        name: session.name.clone(),
        host_user_id: session.host_user_id.to_string(),
        player_count: i64::from(session.player_count),
        current_phase: session.current_phase,
        is_active: session.is_active,
    }
}

fn from_row(row: SessionRow) -> Session {
    let player_count = u32::try_from(row.player_count).unwrap_or_else(|_| {
        warn!("Corrupt player_count {} on session '{}'", row.player_count, row.id);
        0
    });

    Session {
        id: parse_id(&row.id, "session", &row.id),
        host_user_id: parse_id(&row.host_user_id, "host_user_id", &row.id),
        name: row.name,
        player_count,
        current_phase: row.current_phase,
        is_active: row.is_active,
    }
}
