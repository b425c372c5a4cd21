use async_trait::async_trait;

use crate::{Agent, LogEntry, MarketState, MarketStrategy, Result};

/// Read side of the Verdict backend.
///
/// `VerdictClient` in `crates/feed` implements this over HTTP. Payloads are
/// returned exactly as the backend sent them; strategy repair is the
/// poller's job, not the feed's.
#[async_trait]
pub trait MarketFeed: Send + Sync {
    /// Current round and the live strategies (`/api/market`).
    async fn market_state(&self) -> Result<MarketState>;

    /// Strategies that already resolved (`/api/history`).
    async fn graduated_strategies(&self) -> Result<Vec<MarketStrategy>>;

    async fn agents(&self) -> Result<Vec<Agent>>;

    async fn agent(&self, id: &str) -> Result<Agent>;

    async fn logs(&self) -> Result<Vec<LogEntry>>;
}
