use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde_json::json;
use tracing::{info, warn};

use crate::AppState;

/// Backend round controls, proxied when `ADMIN_CONTROLS` is set.
pub fn admin_router() -> Router<AppState> {
    Router::new().route("/api/admin/:action", post(run_action))
}

async fn run_action(State(state): State<AppState>, Path(action): Path<String>) -> Response {
    let Some(client) = state.admin.as_ref() else {
        return (
            StatusCode::FORBIDDEN,
            Json(json!({ "error": "admin controls are disabled" })),
        )
            .into_response();
    };

    let result = match action.as_str() {
        "init-proposals" => client.init_proposals().await,
        "init-agents" => client.init_agents().await,
        "trade-start" => client.start_trade_loop().await,
        "trade-stop" => client.stop_trade_loop().await,
        "trade-execute" => client.execute_trades().await,
        _ => {
            return (
                StatusCode::NOT_FOUND,
                Json(json!({ "error": format!("unknown action '{action}'") })),
            )
                .into_response()
        }
    };

    match result {
        Ok(()) => {
            info!(%action, "Admin action forwarded");
            Json(json!({ "ok": true, "action": action })).into_response()
        }
        Err(e) => {
            warn!(%action, error = %e, "Admin action failed");
            (
                StatusCode::BAD_GATEWAY,
                Json(json!({ "error": e.to_string() })),
            )
                .into_response()
        }
    }
}
