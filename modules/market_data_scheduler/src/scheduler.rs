//! Market data refresh scheduling
//!
//! One live timer at most. Every change of the holdings list cancels it,
//! fetches the new list at once and arms a fresh timer.

use anyhow::Result;
use async_trait::async_trait;
use portfolio_common::AssetId;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, error, info};

/// Destination of market data fetches
#[async_trait]
pub trait MarketDataFetcher: Send + Sync {
    /// Forced fetch, bypassing any cached result
    async fn fetch(&self, asset_id: &AssetId) -> Result<()>;
}

pub struct MarketDataScheduler {
    fetcher: Arc<dyn MarketDataFetcher>,

    period: Duration,

    /// Bumped on every cancellation, a batch stops as soon as it changes
    generation: Arc<AtomicU64>,

    /// Asset ids the live timer refreshes
    holdings: Vec<AssetId>,

    timer: Option<JoinHandle<()>>,
}

impl MarketDataScheduler {
    pub fn new(fetcher: Arc<dyn MarketDataFetcher>, period: Duration) -> Self {
        Self {
            fetcher,
            period,
            generation: Arc::new(AtomicU64::new(0)),
            holdings: Vec::new(),
            timer: None,
        }
    }

    pub fn holdings(&self) -> &[AssetId] {
        &self.holdings
    }

    pub fn is_armed(&self) -> bool {
        self.timer.as_ref().is_some_and(|timer| !timer.is_finished())
    }

    /// Apply a new holdings list. The same list again changes nothing, an
    /// empty one only cancels.
    pub async fn update_holdings(&mut self, asset_ids: Vec<AssetId>) {
        if asset_ids == self.holdings {
            debug!("Holdings unchanged");
            return;
        }

        let generation = self.cancel();
        self.holdings = asset_ids;
        if self.holdings.is_empty() {
            info!("No holdings, market data refresh stopped");
            return;
        }

        info!(assets = self.holdings.len(), "Holdings changed, refreshing market data");
        fetch_batch(
            self.fetcher.as_ref(),
            &self.holdings,
            &self.generation,
            generation,
        )
        .await;

        // A newer update may have raced the batch
        if self.generation.load(Ordering::SeqCst) != generation {
            return;
        }
        self.arm(generation);
    }

    /// Cancel the timer and forget the holdings, for session end
    pub fn stop(&mut self) {
        self.cancel();
        self.holdings.clear();
    }

    fn arm(&mut self, generation: u64) {
        let fetcher = self.fetcher.clone();
        let holdings = self.holdings.clone();
        let current = self.generation.clone();
        let period = self.period;
        let start = Instant::now() + period;

        self.timer = Some(tokio::spawn(async move {
            let mut interval = interval_at(start, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if current.load(Ordering::SeqCst) != generation {
                    return;
                }
                debug!(assets = holdings.len(), "Refreshing market data");
                fetch_batch(fetcher.as_ref(), &holdings, &current, generation).await;
            }
        }));
    }

    /// Returns the new generation
    fn cancel(&mut self) -> u64 {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
        generation
    }
}

impl Drop for MarketDataScheduler {
    fn drop(&mut self) {
        self.cancel();
    }
}

async fn fetch_batch(
    fetcher: &dyn MarketDataFetcher,
    asset_ids: &[AssetId],
    current: &AtomicU64,
    generation: u64,
) {
    for asset_id in asset_ids {
        if current.load(Ordering::SeqCst) != generation {
            debug!("Refresh cancelled");
            return;
        }
        fetcher
            .fetch(asset_id)
            .await
            .inspect_err(|e| error!(%asset_id, "Market data fetch failed: {e}"))
            .ok();
    }
}
