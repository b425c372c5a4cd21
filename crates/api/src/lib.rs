pub mod routes;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use common::{Error, Network, Result};
use feed::{PollerHandle, VerdictClient};
use strategy::DataSourceRegistry;

/// Shared application state injected into every route handler.
#[derive(Clone)]
pub struct AppState {
    pub poller: PollerHandle,
    pub registry: Arc<DataSourceRegistry>,
    pub network: &'static Network,
    /// Backend client for the admin routes; `None` disables them.
    pub admin: Option<VerdictClient>,
}

/// All routes with CORS applied, ready to serve or to drive in tests.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_headers(Any)
        .allow_methods(Any);

    Router::new()
        .merge(routes::api_router())
        .merge(routes::admin_router())
        .merge(routes::health_router())
        .with_state(state)
        .layer(cors)
}

/// Build and run the dashboard API.
pub async fn serve(state: AppState, port: u16) -> Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let app = router(state);

    info!(%addr, "Dashboard API listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .await
        .map_err(|e| Error::Other(format!("dashboard API stopped: {e}")))
}
