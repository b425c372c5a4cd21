use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{mpsc, watch};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use common::{Agent, LogEntry, MarketFeed, MarketState, MarketStrategy, Result};
use strategy::{RepairStats, StrategyValidator};

/// Everything the dashboard renders, with strategies already repaired.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSnapshot {
    pub market: MarketState,
    /// Graduated strategies, newest first.
    pub history: Vec<MarketStrategy>,
    pub agents: Vec<Agent>,
    pub logs: Vec<LogEntry>,
    pub fetched_at: DateTime<Utc>,
    /// Repairs made to `market` and `history` in this fetch.
    pub repairs: RepairStats,
}

/// Commands accepted by a running `Poller`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollerCommand {
    /// Fetch now instead of waiting for the next tick.
    Refresh,
    Stop,
}

/// Cloneable handle passed to the API server and the binary.
#[derive(Clone)]
pub struct PollerHandle {
    command_tx: mpsc::Sender<PollerCommand>,
    snapshot_rx: watch::Receiver<Option<Arc<DashboardSnapshot>>>,
}

impl PollerHandle {
    pub async fn send(&self, cmd: PollerCommand) {
        let _ = self.command_tx.send(cmd).await;
    }

    /// Latest published snapshot; `None` until the first fetch succeeds.
    pub fn latest(&self) -> Option<Arc<DashboardSnapshot>> {
        self.snapshot_rx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Arc<DashboardSnapshot>>> {
        self.snapshot_rx.clone()
    }
}

/// Fetches backend state on a fixed interval and publishes repaired snapshots.
///
/// Market and history are required: if either fails the previous snapshot
/// is kept and the fetch is retried on the next tick, with no backoff.
/// Agents and logs are auxiliary, so a failure there still publishes the
/// fresh market data alongside the last agents and logs that were fetched.
pub struct Poller {
    feed: Arc<dyn MarketFeed>,
    validator: Arc<StrategyValidator>,
    interval: Duration,
    command_rx: mpsc::Receiver<PollerCommand>,
    snapshot_tx: watch::Sender<Option<Arc<DashboardSnapshot>>>,
}

impl Poller {
    pub fn new(
        feed: Arc<dyn MarketFeed>,
        validator: Arc<StrategyValidator>,
        interval: Duration,
    ) -> (Self, PollerHandle) {
        let (command_tx, command_rx) = mpsc::channel(32);
        let (snapshot_tx, snapshot_rx) = watch::channel(None);

        let handle = PollerHandle {
            command_tx,
            snapshot_rx,
        };
        let poller = Poller {
            feed,
            validator,
            interval,
            command_rx,
            snapshot_tx,
        };
        (poller, handle)
    }

    /// Fetch everything once and repair the strategies. Does not publish.
    ///
    /// Fails only when market or history cannot be fetched.
    pub async fn poll_once(&self) -> Result<DashboardSnapshot> {
        let (core, agents, logs) = tokio::join!(
            async { tokio::try_join!(self.feed.market_state(), self.feed.graduated_strategies()) },
            self.feed.agents(),
            self.feed.logs(),
        );
        let (market, history) = core?;

        let previous = self.previous();
        let agents = agents.unwrap_or_else(|e| {
            warn!(error = %e, "Agents fetch failed, keeping previous agents");
            previous.as_ref().map(|p| p.agents.clone()).unwrap_or_default()
        });
        let logs = logs.unwrap_or_else(|e| {
            warn!(error = %e, "Logs fetch failed, keeping previous logs");
            previous.as_ref().map(|p| p.logs.clone()).unwrap_or_default()
        });

        Ok(self.repair(market, history, agents, logs))
    }

    fn previous(&self) -> Option<Arc<DashboardSnapshot>> {
        self.snapshot_tx.borrow().clone()
    }

    fn repair(
        &self,
        mut market: MarketState,
        history: Vec<MarketStrategy>,
        agents: Vec<Agent>,
        logs: Vec<LogEntry>,
    ) -> DashboardSnapshot {
        let mut rng = rand::thread_rng();

        let (strategies, mut repairs) = self
            .validator
            .validate_strategies_with_stats(&market.strategies, &mut rng);
        market.strategies = strategies;

        let (mut history, history_repairs) =
            self.validator.validate_strategies_with_stats(&history, &mut rng);
        repairs.merge(history_repairs);
        history.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

        DashboardSnapshot {
            market,
            history,
            agents,
            logs,
            fetched_at: Utc::now(),
            repairs,
        }
    }

    async fn refresh(&self) {
        match self.poll_once().await {
            Ok(snapshot) => {
                debug!(
                    round = snapshot.market.round_number,
                    strategies = snapshot.market.strategies.len(),
                    history = snapshot.history.len(),
                    repairs = snapshot.repairs.total_repairs(),
                    "Published dashboard snapshot"
                );
                self.snapshot_tx.send_replace(Some(Arc::new(snapshot)));
            }
            Err(e) => {
                warn!(error = %e, "Dashboard fetch failed, keeping previous snapshot");
            }
        }
    }

    /// Run the polling loop until `Stop` arrives or every handle is dropped.
    /// Call from `tokio::spawn`.
    pub async fn run(mut self) {
        info!(interval = ?self.interval, "Poller running");
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => self.refresh().await,
                cmd = self.command_rx.recv() => match cmd {
                    Some(PollerCommand::Refresh) => {
                        self.refresh().await;
                        ticker.reset();
                    }
                    Some(PollerCommand::Stop) => {
                        info!("Poller stopping");
                        break;
                    }
                    None => {
                        warn!("Poller command channel closed, shutting down");
                        break;
                    }
                },
            }
        }
    }
}
