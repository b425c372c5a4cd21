use axum::{extract::State, routing::get, Json, Router};
use serde_json::{json, Value};

use crate::AppState;

pub fn health_router() -> Router<AppState> {
    Router::new().route("/healthz", get(healthz))
}

/// Health check endpoint. `ready` stays false until the first successful poll.
async fn healthz(State(state): State<AppState>) -> Json<Value> {
    let latest = state.poller.latest();
    Json(json!({
        "status": "ok",
        "network": state.network.slug,
        "chainId": state.network.chain_id,
        "ready": latest.is_some(),
        "lastFetch": latest.as_ref().map(|s| s.fetched_at),
    }))
}
