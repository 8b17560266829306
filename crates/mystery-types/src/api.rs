use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::User;

// -- JWT Claims --

/// Token claims shared by the REST layer (issuing, optional route check).
/// No `exp` is issued: tokens do not expire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub username: String,
    pub iat: usize,
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Returned by both register and login.
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
}

// -- Sessions --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct CreateSessionRequest {
    pub name: String,
    pub host_user_id: Uuid,
    pub player_count: u32,
    #[serde(default)]
    pub current_phase: i64,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

// -- Characters --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct CreateCharacterRequest {
    pub session_id: Uuid,
    pub user_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub profession: String,
    pub relationship_to_host: String,
    #[serde(default)]
    pub is_murderer: bool,
}

// -- Misc --

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_request_applies_defaults() {
        let req: CreateSessionRequest = serde_json::from_str(
            r#"{"name":"Manor","hostUserId":"6f1c1d9e-3c1e-4a57-9a57-0d5f3a1e2b44","playerCount":6}"#,
        )
        .unwrap();
        assert_eq!(req.current_phase, 0);
        assert!(req.is_active);
        assert_eq!(req.player_count, 6);
    }

    #[test]
    fn session_request_rejects_unknown_fields() {
        let result = serde_json::from_str::<CreateSessionRequest>(
            r#"{"name":"Manor","hostUserId":"6f1c1d9e-3c1e-4a57-9a57-0d5f3a1e2b44","playerCount":6,"masterId":"x"}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn character_request_requires_session_id() {
        let result = serde_json::from_str::<CreateCharacterRequest>(
            r#"{"userId":"6f1c1d9e-3c1e-4a57-9a57-0d5f3a1e2b44","firstName":"Ada","lastName":"Marsh","profession":"Butler","relationshipToHost":"Employee"}"#,
        );
        assert!(result.is_err());
    }
}
