use std::sync::Arc;

use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::{SaltString, rand_core::OsRng}};
use axum::{Json, extract::{State, rejection::JsonRejection}, http::StatusCode, response::IntoResponse};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use tracing::{error, info};
use uuid::Uuid;

use mystery_db::Database;
use mystery_gateway::dispatcher::Dispatcher;
use mystery_types::api::{AuthResponse, Claims, LoginRequest, RegisterRequest};
use mystery_types::models::User;

use crate::error::ApiError;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    /// `None` when the database failed to open at startup.
    pub db: Option<Database>,
    pub jwt_secret: String,
    pub dispatcher: Dispatcher,
}

impl AppStateInner {
    pub fn db(&self) -> Result<&Database, ApiError> {
        self.db.as_ref().ok_or(ApiError::Unavailable)
    }
}

/// Run a blocking DB call off the async runtime.
pub(crate) async fn with_db<F, T>(state: &AppState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&Database) -> anyhow::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    tokio::task::spawn_blocking(move || f(state.db()?).map_err(ApiError::from))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::Internal(e.into())
        })?
}

pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;
    if req.password.is_empty() {
        return Err(ApiError::Validation("password must not be empty".into()));
    }

    // Hash password with Argon2id
    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(req.password.as_bytes(), &salt)
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("password hashing failed: {}", e)))?
        .to_string();

    let user = User {
        id: Uuid::new_v4(),
        username: req.username,
        email: req.email,
    };

    let (id, username, email) = (user.id.to_string(), user.username.clone(), user.email.clone());
    with_db(&state, move |db| db.create_user(&id, &username, &email, &password_hash)).await?;

    let token = create_token(&state.jwt_secret, user.id, &user.username)?;
    info!("Registered user {} ({})", user.username, user.id);

    Ok((StatusCode::CREATED, Json(AuthResponse { token, user })))
}

pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;
    let email = req.email.clone();
    let row = with_db(&state, move |db| db.get_user_by_email(&email))
        .await?
        .ok_or(ApiError::InvalidCredentials)?;

    // Verify password
    let parsed_hash = PasswordHash::new(&row.password)
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("stored hash for {} unreadable: {}", row.id, e)))?;

    Argon2::default()
        .verify_password(req.password.as_bytes(), &parsed_hash)
        .map_err(|_| ApiError::InvalidCredentials)?;

    let user_id: Uuid = row
        .id
        .parse()
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("corrupt user id '{}': {}", row.id, e)))?;

    let token = create_token(&state.jwt_secret, user_id, &row.username)?;

    Ok(Json(AuthResponse {
        token,
        user: User {
            id: user_id,
            username: row.username,
            email: row.email,
        },
    }))
}

pub fn create_token(secret: &str, user_id: Uuid, username: &str) -> anyhow::Result<String> {
    let claims = Claims {
        sub: user_id,
        username: username.to_string(),
        iat: chrono::Utc::now().timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}

/// Decode a token issued by [`create_token`]. Tokens carry no expiry, so
/// only the signature is checked.
pub fn verify_token(secret: &str, token: &str) -> anyhow::Result<Claims> {
    let mut validation = Validation::default();
    validation.required_spec_claims.clear();
    validation.validate_exp = false;

    let data = decode::<Claims>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation)?;
    Ok(data.claims)
}
