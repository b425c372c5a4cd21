use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use common::{Agent, Error, LogEntry, MarketFeed, MarketState, MarketStrategy, Result};

/// REST client for the Verdict backend. Used for dashboard reads and the
/// administrative round controls.
#[derive(Clone)]
pub struct VerdictClient {
    base_url: String,
    http: Client,
}

impl VerdictClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .use_rustls_tls()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Http(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = format!("{}{path}", self.base_url);
        debug!(%url, "GET");

        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;

        let status = resp.status();
        let body = resp.text().await.map_err(|e| Error::Http(e.to_string()))?;

        if !status.is_success() {
            return Err(Error::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(serde_json::from_str(&body)?)
    }

    async fn post(&self, path: &str) -> Result<()> {
        let url = format!("{}{path}", self.base_url);
        info!(%url, "POST");

        let resp = self
            .http
            .post(&url)
            .send()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }

    // ─── Administrative controls ─────────────────────────────────────────────

    pub async fn init_proposals(&self) -> Result<()> {
        self.post("/api/init/proposals").await
    }

    pub async fn init_agents(&self) -> Result<()> {
        self.post("/api/init/agents").await
    }

    pub async fn start_trade_loop(&self) -> Result<()> {
        self.post("/api/trade/start").await
    }

    pub async fn stop_trade_loop(&self) -> Result<()> {
        self.post("/api/trade/stop").await
    }

    /// Run one trading round immediately.
    pub async fn execute_trades(&self) -> Result<()> {
        self.post("/api/trade/execute").await
    }
}

#[async_trait]
impl MarketFeed for VerdictClient {
    async fn market_state(&self) -> Result<MarketState> {
        self.get_json("/api/market").await
    }

    async fn graduated_strategies(&self) -> Result<Vec<MarketStrategy>> {
        // The backend answers `null` before any strategy has graduated.
        let history: Option<Vec<MarketStrategy>> = self.get_json("/api/history").await?;
        Ok(history.unwrap_or_default())
    }

    async fn agents(&self) -> Result<Vec<Agent>> {
        self.get_json("/api/agents").await
    }

    async fn agent(&self, id: &str) -> Result<Agent> {
        self.get_json(&format!("/api/agents/{id}")).await
    }

    async fn logs(&self) -> Result<Vec<LogEntry>> {
        self.get_json("/api/logs").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode, routing::{get, post}, Json, Router};
    use serde_json::json;

    /// Serve a fake backend on an ephemeral port and return its base URL.
    async fn fake_backend() -> String {
        let app = Router::new()
            .route(
                "/api/market",
                get(|| async {
                    Json(json!({
                        "strategies": [{
                            "id": "s-1",
                            "name": "SPY above 700",
                            "usedDataSources": [{ "id": 99999 }]
                        }],
                        "roundNumber": 4,
                        "isExecutingTrades": false,
                        "isMakingBatchLLMCall": false
                    }))
                }),
            )
            .route("/api/history", get(|| async { Json(json!(null)) }))
            .route(
                "/api/agents/:id",
                get(|| async { (StatusCode::NOT_FOUND, "no such agent") }),
            )
            .route("/api/trade/execute", post(|| async { StatusCode::OK }))
            .route(
                "/api/trade/stop",
                post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "loop not running") }),
            );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}/")
    }

    fn client(base: &str) -> VerdictClient {
        VerdictClient::new(base, Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn reads_market_state_without_repairing_it() {
        let c = client(&fake_backend().await);
        let state = c.market_state().await.unwrap();
        assert_eq!(state.round_number, 4);
        let refs = state.strategies[0].used_data_sources.as_ref().unwrap();
        assert_eq!(refs[0].id, 99999);
    }

    #[tokio::test]
    async fn null_history_is_empty() {
        let c = client(&fake_backend().await);
        assert!(c.graduated_strategies().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn non_success_status_is_api_error() {
        let c = client(&fake_backend().await);
        match c.agent("ghost").await {
            Err(Error::Api { status, body }) => {
                assert_eq!(status, 404);
                assert_eq!(body, "no such agent");
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn admin_posts_report_failures() {
        let c = client(&fake_backend().await);
        c.execute_trades().await.unwrap();
        assert!(matches!(
            c.stop_trade_loop().await,
            Err(Error::Api { status: 500, .. })
        ));
    }

    #[tokio::test]
    async fn unreachable_backend_is_http_error() {
        let c = client("http://127.0.0.1:1");
        assert!(matches!(c.logs().await, Err(Error::Http(_))));
    }
}
