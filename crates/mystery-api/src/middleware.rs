use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};

use crate::auth::{AppState, verify_token};
use crate::error::ApiError;

/// Extract and validate the bearer token from the Authorization header.
/// Only layered onto the data routes when the server is started with
/// auth enforcement switched on.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let claims = {
        let token = req
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .ok_or(ApiError::Unauthorized)?;

        verify_token(&state.jwt_secret, token).map_err(|_| ApiError::Unauthorized)?
    };

    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}
