use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Public projection of an account. The password hash never leaves the db layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
}

/// A game room hosted by one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: Uuid,
    pub name: String,
    pub host_user_id: Uuid,
    pub player_count: u32,
    pub current_phase: i64,
    pub is_active: bool,
}

/// A player's persona inside a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Character {
    pub id: Uuid,
    pub session_id: Uuid,
    pub user_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub profession: String,
    pub relationship_to_host: String,
    pub is_murderer: bool,
}
