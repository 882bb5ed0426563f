use crate::bot::Bot;
use crate::services::telegram::Update;
use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Clone)]
pub struct AppState {
    pub bot: Arc<Bot>,
    /// Secret path segment updates are posted to (the bot token)
    pub webhook_secret: String,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub database: String,
    pub version: String,
}

pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/:secret", post(receive_update))
        .with_state(state)
}

pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let db_status = if state.bot.catalog().executor().connection().ping().await.is_ok() {
        "connected"
    } else {
        "disconnected"
    };

    Json(HealthResponse {
        status: "ok".to_string(),
        database: db_status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Acknowledges at once; the update is handled on its own task.
///
/// The body is only parsed once the path matched, so strangers get a 404
/// whatever they send.
pub async fn receive_update(
    State(state): State<AppState>,
    Path(secret): Path<String>,
    body: Bytes,
) -> StatusCode {
    if secret != state.webhook_secret {
        warn!("Rejected webhook call on an unknown path");
        return StatusCode::NOT_FOUND;
    }

    let update: Update = match serde_json::from_slice(&body) {
        Ok(update) => update,
        Err(e) => {
            warn!("⚠️ Dropped malformed webhook update: {}", e);
            return StatusCode::BAD_REQUEST;
        }
    };

    debug!("📥 Webhook update {}", update.update_id);
    let bot = state.bot.clone();
    tokio::spawn(async move {
        bot.handle_update(update).await;
    });

    StatusCode::OK
}
