//! HTTP + WebSocket front door: routing, configuration and startup.

pub mod config;

use std::sync::Arc;

use axum::{
    Router,
    extract::{State, WebSocketUpgrade},
    middleware,
    response::IntoResponse,
    routing::{get, post},
};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use mystery_api::auth::{self, AppState, AppStateInner};
use mystery_api::middleware::require_auth;
use mystery_api::{characters, sessions};
use mystery_db::Database;
use mystery_gateway::connection;
use mystery_gateway::dispatcher::Dispatcher;

use crate::config::Config;

/// Build the full application router.
///
/// With `enforce_auth` off (the default), no route checks the bearer token
/// that register/login hand out.
pub fn router(state: AppState, enforce_auth: bool) -> Router {
    let mut data_routes = Router::new()
        .route("/api/sessions", post(sessions::create_session).get(sessions::list_active_sessions))
        .route("/api/sessions/{id}/characters", get(characters::list_characters_for_session))
        .route("/api/characters", post(characters::create_character));

    if enforce_auth {
        data_routes = data_routes.layer(middleware::from_fn_with_state(state.clone(), require_auth));
    }

    let public_routes = Router::new()
        .route("/", get(mystery_api::status))
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/gateway", get(ws_upgrade));

    Router::new()
        .merge(public_routes)
        .merge(data_routes)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Open the database, wire shared state and serve until shutdown.
///
/// A database that fails to open is logged and left out; the server still
/// listens and every data request answers 503.
pub async fn run(config: Config) -> anyhow::Result<()> {
    let db = match Database::open(&config.db_path) {
        Ok(db) => Some(db),
        Err(e) => {
            error!("Failed to open database at {}: {:#}", config.db_path.display(), e);
            None
        }
    };

    let state: AppState = Arc::new(AppStateInner {
        db,
        jwt_secret: config.jwt_secret.clone(),
        dispatcher: Dispatcher::new(),
    });

    if config.require_auth {
        info!("Bearer token required on /api/sessions and /api/characters");
    } else {
        warn!("Data routes accept unauthenticated requests (MYSTERY_REQUIRE_AUTH is off)");
    }

    let app = router(state, config.require_auth);

    let addr = config.listen_addr()?;
    let listener = TcpListener::bind(addr).await?;
    info!("Server running on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn ws_upgrade(State(state): State<AppState>, ws: WebSocketUpgrade) -> impl IntoResponse {
    let dispatcher = state.dispatcher.clone();
    ws.on_upgrade(move |socket| connection::handle_connection(socket, dispatcher))
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        let mut sigterm =
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(sigterm) => sigterm,
                Err(e) => {
                    warn!("Failed to install SIGTERM handler: {}", e);
                    ctrl_c.await.ok();
                    info!("Received Ctrl+C, shutting down...");
                    return;
                }
            };
        tokio::select! {
            _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
            _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received Ctrl+C, shutting down...");
    }
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use http_body_util::BodyExt;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use super::*;

    fn state(db: Option<Database>) -> AppState {
        Arc::new(AppStateInner {
            db,
            jwt_secret: "test-secret".into(),
            dispatcher: Dispatcher::new(),
        })
    }

    fn in_memory() -> AppState {
        state(Some(Database::open_in_memory().unwrap()))
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::post(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn root_reports_liveness() {
        let (status, body) =
            send(router(in_memory(), false), Request::get("/").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["message"].as_str().unwrap().contains("running"));
    }

    #[tokio::test]
    async fn malformed_json_is_a_bad_request() {
        let (status, body) = send(router(in_memory(), false), post_json("/api/sessions", "{not json")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn unknown_session_fields_are_rejected() {
        let body = json!({
            "name": "Manor",
            "hostUserId": "6f1c1d9e-3c1e-4a57-9a57-0d5f3a1e2b44",
            "playerCount": 4,
            "masterId": "legacy"
        });
        let (status, _) =
            send(router(in_memory(), false), post_json("/api/sessions", &body.to_string())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn empty_password_is_rejected() {
        let body = json!({ "username": "x", "email": "x@example.com", "password": "" });
        let (status, body) =
            send(router(in_memory(), false), post_json("/api/auth/register", &body.to_string())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "password must not be empty");
    }

    #[tokio::test]
    async fn bad_session_id_in_path_is_a_bad_request() {
        let request = Request::get("/api/sessions/not-a-uuid/characters").body(Body::empty()).unwrap();
        let (status, body) = send(router(in_memory(), false), request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn missing_database_answers_service_unavailable() {
        let request = Request::get("/api/sessions").body(Body::empty()).unwrap();
        let (status, body) = send(router(state(None), false), request).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["error"], "database unavailable");
    }

    #[tokio::test]
    async fn enforced_auth_guards_data_routes_only() {
        let state = in_memory();
        let app = router(state.clone(), true);

        let (status, _) =
            send(app.clone(), Request::get("/api/sessions").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let token = auth::create_token(&state.jwt_secret, uuid::Uuid::new_v4(), "lestrade").unwrap();
        let request = Request::get("/api/sessions")
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(app.clone(), request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([]));

        let (status, _) = send(app, Request::get("/").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn auth_is_not_checked_by_default() {
        let request = Request::get("/api/sessions").body(Body::empty()).unwrap();
        let (status, _) = send(router(in_memory(), false), request).await;
        assert_eq!(status, StatusCode::OK);
    }
}
