use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};

use crate::config::CONFIG;
use crate::state::AppState;

pub async fn healthz_handler(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "openai_configured": CONFIG.openai_configured(),
        "instagram_configured": CONFIG.instagram_configured(),
        "uptime_seconds": state.started_at.elapsed().as_secs(),
    }))
}
