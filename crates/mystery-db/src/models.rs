//! SQLite row types, kept apart from the mystery-types wire models so the
//! DB layer stays independent.

pub struct UserRow {
    pub id: String,
    pub username: String,
    pub email: String,
    pub password: String,
    pub created_at: String,
}

pub struct SessionRow {
    pub id: String,
    pub name: String,
    pub host_user_id: String,
    pub player_count: i64,
    pub current_phase: i64,
    pub is_active: bool,
}

pub struct CharacterRow {
    pub id: String,
    pub session_id: String,
    pub user_id: String,
    pub first_name: String,
    pub last_name: String,
    pub profession: String,
    pub relationship_to_host: String,
    pub is_murderer: bool,
}
