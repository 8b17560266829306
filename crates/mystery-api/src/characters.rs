use axum::{
    Json,
    extract::{Path, State, rejection::{JsonRejection, PathRejection}},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::info;
use uuid::Uuid;

use mystery_db::models::CharacterRow;
use mystery_types::api::CreateCharacterRequest;
use mystery_types::models::Character;

use crate::auth::{AppState, with_db};
use crate::error::ApiError;
use crate::parse_id;

/// Stores the character, then announces it on its session's channel.
/// Neither `sessionId` nor `userId` is checked against existing records.
pub async fn create_character(
    State(state): State<AppState>,
    payload: Result<Json<CreateCharacterRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;
    if req.first_name.trim().is_empty() {
        return Err(ApiError::Validation("firstName must not be empty".into()));
    }

    let character = Character {
        id: Uuid::new_v4(),
        session_id: req.session_id,
        user_id: req.user_id,
        first_name: req.first_name,
        last_name: req.last_name,
        profession: req.profession,
        relationship_to_host: req.relationship_to_host,
        is_murderer: req.is_murderer,
    };

    let row = to_row(&character);
    with_db(&state, move |db| db.insert_character(&row)).await?;

    let delivered = state.dispatcher.publish_character_created(&character).await;
    info!(
        "Character {} created in session {} ({} subscribers notified)",
        character.id, character.session_id, delivered
    );

    Ok((StatusCode::CREATED, Json(character)))
}

pub async fn list_characters_for_session(
    State(state): State<AppState>,
    session_id: Result<Path<Uuid>, PathRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Path(session_id) = session_id?;
    let sid = session_id.to_string();
    let rows = with_db(&state, move |db| db.list_characters_for_session(&sid)).await?;
    let characters: Vec<Character> = rows.into_iter().map(from_row).collect();
    Ok(Json(characters))
}

fn to_row(character: &Character) -> CharacterRow {
    CharacterRow {
        id: character.id.to_string(),
        session_id: character.session_id.to_string(),
        user_id: character.user_id.to_string(),
        first_name: character.first_name.clone(),
        last_name: character.last_name.clone(),
        profession: character.profession.clone(),
        relationship_to_host: character.relationship_to_host.clone(),
        is_murderer: character.is_murderer,
    }
}

fn from_row(row: CharacterRow) -> Character {
    Character {
        id: parse_id(&row.id, "character", &row.id),
        session_id: parse_id(&row.session_id, "session_id", &row.id),
        user_id: parse_id(&row.user_id, "user_id", &row.id),
        first_name: row.first_name,
        last_name: row.last_name,
        profession: row.profession,
        relationship_to_host: row.relationship_to_host,
        is_murderer: row.is_murderer,
    }
}
