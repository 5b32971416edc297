//! Portfolio market data scheduler module for Caryatid
//! Keeps market data fresh for exactly the assets in holdings

use anyhow::Result;
use async_trait::async_trait;
use caryatid_sdk::{message_bus::Subscription, module, Context};
use config::Config;
use portfolio_common::{
    commands::FetchCommand,
    messages::{Message, PortfolioMessage},
    publisher::{FetchPublisher, FetchSink},
    session::WalletSession,
    AssetId,
};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info, info_span, Instrument};

mod scheduler;
mod scheduler_config;

use scheduler::{MarketDataFetcher, MarketDataScheduler};
use scheduler_config::SchedulerConfig;

const DEFAULT_HOLDINGS_SUBSCRIBE_TOPIC: (&str, &str) =
    ("holdings-subscribe-topic", "portfolio.holdings");
const DEFAULT_SESSION_SUBSCRIBE_TOPIC: (&str, &str) =
    ("session-subscribe-topic", "portfolio.session");
const DEFAULT_CLOCK_TICK_SUBSCRIBE_TOPIC: (&str, &str) =
    ("clock-tick-subscribe-topic", "clock.tick");
const DEFAULT_FETCH_PUBLISH_TOPIC: (&str, &str) = ("fetch-publish-topic", "portfolio.fetch");

/// Sends forced market data fetches to the market data service
struct BusMarketDataFetcher {
    publisher: FetchPublisher,
}

#[async_trait]
impl MarketDataFetcher for BusMarketDataFetcher {
    async fn fetch(&self, asset_id: &AssetId) -> Result<()> {
        self.publisher
            .publish(FetchCommand::FetchMarketData {
                asset_id: asset_id.clone(),
                force_refetch: true,
            })
            .await
    }
}

/// Market Data Scheduler module
#[module(
    message_type(Message),
    name = "market-data-scheduler",
    description = "Periodic market data refresh for held assets"
)]
pub struct MarketDataSchedulerModule;

impl MarketDataSchedulerModule {
    async fn run_holdings(
        scheduler: Arc<Mutex<MarketDataScheduler>>,
        mut subscription: Box<dyn Subscription<Message>>,
    ) -> Result<()> {
        loop {
            let (_, message) = subscription.read().await?;
            match message.as_ref() {
                Message::Portfolio(PortfolioMessage::HoldingsAssetIds(asset_ids)) => {
                    let span =
                        info_span!("market_data_scheduler.holdings", assets = asset_ids.len());
                    async {
                        scheduler.lock().await.update_holdings(asset_ids.clone()).await;
                    }
                    .instrument(span)
                    .await;
                }
                _ => error!("Unexpected message type: {message:?}"),
            }
        }
    }

    /// Session end stops refreshing until new holdings arrive
    async fn run_session(
        scheduler: Arc<Mutex<MarketDataScheduler>>,
        mut subscription: Box<dyn Subscription<Message>>,
    ) -> Result<()> {
        let mut session = WalletSession::new();
        loop {
            let (_, message) = subscription.read().await?;
            match message.as_ref() {
                Message::Session(event) => {
                    if session.handle(event) {
                        info!("Wallet changed, stopping market data refresh");
                        scheduler.lock().await.stop();
                    }
                }
                _ => error!("Unexpected message type: {message:?}"),
            }
        }
    }

    /// Main init function
    pub async fn init(&self, context: Arc<Context<Message>>, config: Arc<Config>) -> Result<()> {
        // Subscription topics
        let holdings_subscribe_topic = config
            .get_string(DEFAULT_HOLDINGS_SUBSCRIBE_TOPIC.0)
            .unwrap_or(DEFAULT_HOLDINGS_SUBSCRIBE_TOPIC.1.to_string());
        info!("Creating subscriber for holdings on '{holdings_subscribe_topic}'");

        let session_subscribe_topic = config
            .get_string(DEFAULT_SESSION_SUBSCRIBE_TOPIC.0)
            .unwrap_or(DEFAULT_SESSION_SUBSCRIBE_TOPIC.1.to_string());
        info!("Creating subscriber for session on '{session_subscribe_topic}'");

        let clock_tick_subscribe_topic = config
            .get_string(DEFAULT_CLOCK_TICK_SUBSCRIBE_TOPIC.0)
            .unwrap_or(DEFAULT_CLOCK_TICK_SUBSCRIBE_TOPIC.1.to_string());

        // Publish topic
        let fetch_publish_topic = config
            .get_string(DEFAULT_FETCH_PUBLISH_TOPIC.0)
            .unwrap_or(DEFAULT_FETCH_PUBLISH_TOPIC.1.to_string());
        info!("Publishing market data fetches on '{fetch_publish_topic}'");

        let scheduler_config = SchedulerConfig::from(config.clone());
        info!(
            refresh_interval_secs = scheduler_config.refresh_interval.as_secs(),
            "Market data refresh interval"
        );

        let fetcher = Arc::new(BusMarketDataFetcher {
            publisher: FetchPublisher::new(context.clone(), fetch_publish_topic),
        });
        let scheduler = Arc::new(Mutex::new(MarketDataScheduler::new(
            fetcher,
            scheduler_config.refresh_interval,
        )));
        let scheduler_session = scheduler.clone();
        let scheduler_tick = scheduler.clone();

        // Subscribe
        let holdings_subscription = context.subscribe(&holdings_subscribe_topic).await?;
        let session_subscription = context.subscribe(&session_subscribe_topic).await?;
        let mut tick_subscription = context.subscribe(&clock_tick_subscribe_topic).await?;

        context.run(async move {
            Self::run_holdings(scheduler, holdings_subscription)
                .await
                .unwrap_or_else(|e| error!("Holdings loop failed: {e}"));
        });

        context.run(async move {
            Self::run_session(scheduler_session, session_subscription)
                .await
                .unwrap_or_else(|e| error!("Session loop failed: {e}"));
        });

        // Ticker to log stats
        context.run(async move {
            loop {
                let Ok((_, message)) = tick_subscription.read().await else {
                    return;
                };
                if let Message::Clock(message) = message.as_ref() {
                    if message.number % 60 == 0 {
                        let scheduler = scheduler_tick.lock().await;
                        info!(
                            assets = scheduler.holdings().len(),
                            armed = scheduler.is_armed(),
                            "Market data scheduler"
                        );
                    }
                }
            }
        });

        Ok(())
    }
}
