use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;

use feed::DashboardSnapshot;

use crate::AppState;

pub fn api_router() -> Router<AppState> {
    Router::new()
        .route("/api/market", get(get_market))
        .route("/api/history", get(get_history))
        .route("/api/agents", get(get_agents))
        .route("/api/agents/:id", get(get_agent))
        .route("/api/logs", get(get_logs))
        .route("/api/repairs", get(get_repairs))
        .route("/api/sources", get(get_sources))
}

/// Run `f` against the latest snapshot, or answer 503 before the first poll.
fn with_snapshot<F>(state: &AppState, f: F) -> Response
where
    F: FnOnce(&Arc<DashboardSnapshot>) -> Response,
{
    match state.poller.latest() {
        Some(snapshot) => f(&snapshot),
        None => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "error": "market data not loaded yet" })),
        )
            .into_response(),
    }
}

// ─── Market ───────────────────────────────────────────────────────────────────

async fn get_market(State(state): State<AppState>) -> Response {
    with_snapshot(&state, |s| Json(&s.market).into_response())
}

async fn get_history(State(state): State<AppState>) -> Response {
    with_snapshot(&state, |s| Json(&s.history).into_response())
}

async fn get_repairs(State(state): State<AppState>) -> Response {
    with_snapshot(&state, |s| {
        Json(json!({
            "fetchedAt": s.fetched_at,
            "repairs": s.repairs,
        }))
        .into_response()
    })
}

// ─── Agents & logs ────────────────────────────────────────────────────────────

async fn get_agents(State(state): State<AppState>) -> Response {
    with_snapshot(&state, |s| Json(&s.agents).into_response())
}

async fn get_agent(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    with_snapshot(&state, |s| match s.agents.iter().find(|a| a.id == id) {
        Some(agent) => Json(agent).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": format!("agent '{id}' not found") })),
        )
            .into_response(),
    })
}

async fn get_logs(State(state): State<AppState>) -> Response {
    with_snapshot(&state, |s| Json(&s.logs).into_response())
}

// ─── Data sources ─────────────────────────────────────────────────────────────

async fn get_sources(State(state): State<AppState>) -> Response {
    let sources: Vec<_> = state.registry.iter().collect();
    let fallback: Vec<i64> = state.registry.fallbacks().map(|s| s.id).collect();
    Json(json!({ "sources": sources, "fallback": fallback })).into_response()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::Value;
    use tower::ServiceExt;

    use common::{
        Agent, DataSourceRef, Error, LogEntry, MarketFeed, MarketState, MarketStrategy, Result,
        MANTLE_SEPOLIA,
    };
    use feed::Poller;
    use strategy::{DataSourceRegistry, StrategyValidator};

    use crate::{router, AppState};

    struct OneStrategyFeed;

    #[async_trait]
    impl MarketFeed for OneStrategyFeed {
        async fn market_state(&self) -> Result<MarketState> {
            let mut s = MarketStrategy::new("s-1", "Oil under 60");
            s.used_data_sources = Some(vec![DataSourceRef::bare(424242)]);
            Ok(MarketState {
                strategies: vec![s],
                round_number: 2,
                ..MarketState::default()
            })
        }

        async fn graduated_strategies(&self) -> Result<Vec<MarketStrategy>> {
            Ok(vec![])
        }

        async fn agents(&self) -> Result<Vec<Agent>> {
            Ok(vec![])
        }

        async fn agent(&self, id: &str) -> Result<Agent> {
            Err(Error::Other(format!("no agent {id}")))
        }

        async fn logs(&self) -> Result<Vec<LogEntry>> {
            Ok(vec![])
        }
    }

    fn state(feed_running: bool) -> (AppState, Arc<DataSourceRegistry>) {
        let registry = Arc::new(DataSourceRegistry::bundled().unwrap());
        let validator = Arc::new(StrategyValidator::new(registry.clone()));
        let (poller, handle) = Poller::new(
            Arc::new(OneStrategyFeed),
            validator,
            Duration::from_secs(3600),
        );
        if feed_running {
            tokio::spawn(poller.run());
        }
        let state = AppState {
            poller: handle,
            registry: registry.clone(),
            network: &MANTLE_SEPOLIA,
            admin: None,
        };
        (state, registry)
    }

    async fn get_json(state: AppState, uri: &str) -> (StatusCode, Value) {
        let resp = router(state)
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn market_is_unavailable_before_first_poll() {
        let (state, _) = state(false);
        let (status, _) = get_json(state, "/api/market").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn market_serves_repaired_strategies() {
        let (state, registry) = state(true);
        let mut rx = state.poller.subscribe();
        tokio::time::timeout(Duration::from_secs(2), rx.wait_for(|s| s.is_some()))
            .await
            .expect("timeout")
            .unwrap();

        let (status, body) = get_json(state, "/api/market").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["roundNumber"], 2);
        let id = body["strategies"][0]["usedDataSources"][0]["id"].as_i64().unwrap();
        assert!(registry.contains(id));
        assert!(body["strategies"][0]["mathematicalLogic"].is_string());
    }

    #[tokio::test]
    async fn sources_list_registry_and_fallbacks() {
        let (state, registry) = state(false);
        let (status, body) = get_json(state, "/api/sources").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["sources"].as_array().unwrap().len(), registry.len());
        assert_eq!(body["fallback"][0], 12245);
    }

    #[tokio::test]
    async fn health_reports_network_and_readiness() {
        let (state, _) = state(false);
        let (status, body) = get_json(state, "/healthz").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["network"], "mantle-sepolia");
        assert_eq!(body["ready"], false);
    }
}
