//! Background loop that keeps the street network in sync with the feed

use std::sync::Arc;
use std::time::Duration;

use arc_swap::{ArcSwap, ArcSwapOption};
use chrono::{DateTime, Utc};
use log::{error, info};
use serde::Serialize;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::applier::{ApplyStats, BatchApplier};
use super::config::TrafficConfig;
use super::feed::FeedSource;
use super::gate::StateGate;
use super::network::RoadNetwork;
use crate::Error;
use crate::model::ReportBatch;

/// Metadata of the last successfully applied batch
#[derive(Debug, Clone, Serialize)]
pub struct UpdateSummary {
    pub applied_at: DateTime<Utc>,
    pub entries: usize,
    pub stats: ApplyStats,
}

#[derive(Debug, Default)]
struct Published {
    batch: ArcSwap<ReportBatch>,
    summary: ArcSwapOption<UpdateSummary>,
}

/// Periodically fetches the feed and applies it to the network
///
/// All writes, from the loop and from [`TrafficUpdater::feed`], go through
/// the write side of the shared [`StateGate`]. The last applied batch is kept
/// as a snapshot and replaced as a whole by the next one.
#[derive(Debug)]
pub struct TrafficUpdater<S, N> {
    source: S,
    gate: StateGate<N>,
    applier: BatchApplier,
    interval: Duration,
    published: Arc<Published>,
    shutdown: CancellationToken,
}

impl<S, N> TrafficUpdater<S, N>
where
    S: FeedSource,
    N: RoadNetwork + Send + Sync + 'static,
{
    pub fn new(source: S, gate: StateGate<N>, applier: BatchApplier, interval: Duration) -> Self {
        Self {
            source,
            gate,
            applier,
            interval,
            published: Arc::new(Published::default()),
            shutdown: CancellationToken::new(),
        }
    }

    pub fn from_config(source: S, gate: StateGate<N>, config: &TrafficConfig) -> Self {
        Self::new(
            source,
            gate,
            BatchApplier::new(config.anchor),
            config.poll_interval(),
        )
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn gate(&self) -> &StateGate<N> {
        &self.gate
    }

    /// Last applied batch, empty until the first batch succeeds
    pub fn snapshot(&self) -> Arc<ReportBatch> {
        self.published.batch.load_full()
    }

    pub fn last_update(&self) -> Option<Arc<UpdateSummary>> {
        self.published.summary.load_full()
    }

    /// Applies `batch` under write access on the blocking thread pool and
    /// publishes it as the snapshot
    ///
    /// Waits until all readers have released the network.
    ///
    /// # Errors
    ///
    /// Returns the applier's error or `TaskFailed` if the apply task panicked,
    /// the snapshot is left untouched in both cases
    pub async fn feed(&self, batch: ReportBatch) -> Result<ApplyStats, Error> {
        let gate = self.gate.clone();
        let applier = self.applier;
        let published = Arc::clone(&self.published);

        tokio::task::spawn_blocking(move || apply_and_publish(&gate, applier, &published, batch))
            .await
            .map_err(|e| Error::TaskFailed(e.to_string()))?
    }

    /// Fetches the feed once and applies it
    ///
    /// # Errors
    ///
    /// Returns fetch, parse and apply errors
    pub async fn run_cycle(&self) -> Result<ApplyStats, Error> {
        let batch = self.source.fetch().await?;
        self.feed(batch).await
    }

    /// Runs cycles until [`Self::stop`] is called
    ///
    /// A failed cycle is logged and the next one starts after the regular
    /// interval. Stopping interrupts the sleep but not a running cycle.
    pub async fn run(&self) {
        info!(
            "Fetching new traffic data every {} seconds",
            self.interval.as_secs()
        );

        while !self.shutdown.is_cancelled() {
            if let Err(e) = self.run_cycle().await {
                error!("Problem while updating traffic data: {e}");
            }

            tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => break,
                _ = tokio::time::sleep(self.interval) => {}
            }
        }

        info!("Traffic update loop stopped");
    }

    /// Starts [`Self::run`] on the tokio runtime
    pub fn spawn(self: &Arc<Self>) -> JoinHandle<()> {
        let updater = Arc::clone(self);
        tokio::spawn(async move { updater.run().await })
    }

    pub fn stop(&self) {
        self.shutdown.cancel();
    }

    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }
}

fn apply_and_publish<N: RoadNetwork>(
    gate: &StateGate<N>,
    applier: BatchApplier,
    published: &Published,
    batch: ReportBatch,
) -> Result<ApplyStats, Error> {
    let mut network = gate.write()?;
    let stats = applier.apply(&mut *network, &batch)?;

    // Published before readers are let back in
    published.summary.store(Some(Arc::new(UpdateSummary {
        applied_at: Utc::now(),
        entries: batch.len(),
        stats: stats.clone(),
    })));
    published.batch.store(Arc::new(batch));
    drop(network);

    Ok(stats)
}
