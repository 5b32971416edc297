//! Portfolio account specifiers module for Caryatid
//! Derives one account specifier per chain account of the connected wallet

use anyhow::Result;
use caryatid_sdk::{message_bus::Subscription, module, Context};
use config::Config;
use portfolio_common::{
    messages::{Message, PortfolioMessage},
    publisher::FetchPublisher,
};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info, info_span, Instrument};

mod account_specifiers_publisher;
mod adapters;
mod bus_wallet;
mod configuration;
mod deriver;
mod state;
mod strategy;
#[cfg(test)]
mod test_utils;

use account_specifiers_publisher::AccountSpecifiersPublisher;
use adapters::ChainAdapterRegistry;
use bus_wallet::BusWallet;
use configuration::DeriverConfig;
use deriver::AccountSpecifierDeriver;
use state::{Reaction, State};

const DEFAULT_SESSION_SUBSCRIBE_TOPIC: (&str, &str) =
    ("session-subscribe-topic", "portfolio.session");
const DEFAULT_ASSETS_SUBSCRIBE_TOPIC: (&str, &str) =
    ("assets-subscribe-topic", "portfolio.assets");
const DEFAULT_CLOCK_TICK_SUBSCRIBE_TOPIC: (&str, &str) =
    ("clock-tick-subscribe-topic", "clock.tick");
const DEFAULT_ACCOUNT_SPECIFIERS_PUBLISH_TOPIC: (&str, &str) = (
    "account-specifiers-publish-topic",
    "portfolio.account-specifiers",
);
const DEFAULT_FETCH_PUBLISH_TOPIC: (&str, &str) = ("fetch-publish-topic", "portfolio.fetch");
const DEFAULT_WALLET_REQUEST_TOPIC: (&str, &str) = ("wallet-request-topic", "wallet.request");

/// Everything a derivation run needs besides the state
struct Deriving {
    context: Arc<Context<Message>>,
    wallet_request_topic: String,
    deriver: AccountSpecifierDeriver,
    publisher: AccountSpecifiersPublisher,
}

impl Deriving {
    /// Apply a reaction. The state stays locked throughout so derivations
    /// never overlap on the device.
    async fn react(&self, state: &mut State, reaction: Reaction) -> Result<()> {
        if reaction.clear {
            self.publisher.publish(Vec::new()).await?;
        }
        if !reaction.derive {
            return Ok(());
        }
        let Some(info) = state.wallet().cloned() else {
            return Ok(());
        };

        let span = info_span!("account_specifiers.derive", wallet = %info.label);
        let wallet = BusWallet::new(self.context.clone(), self.wallet_request_topic.clone(), info);
        let account_specifiers =
            self.deriver.derive(&wallet, state.assets()).instrument(span).await;

        state.set_account_specifiers(account_specifiers.clone());
        self.publisher.publish(account_specifiers).await
    }
}

/// Account Specifiers module
#[module(
    message_type(Message),
    name = "account-specifiers",
    description = "Per-chain account specifiers for the connected wallet"
)]
pub struct AccountSpecifiers;

impl AccountSpecifiers {
    async fn run_session(
        state: Arc<Mutex<State>>,
        deriving: Arc<Deriving>,
        mut subscription: Box<dyn Subscription<Message>>,
    ) -> Result<()> {
        loop {
            let (_, message) = subscription.read().await?;
            match message.as_ref() {
                Message::Session(event) => {
                    let mut state = state.lock().await;
                    let reaction = state.handle_session(event);
                    deriving
                        .react(&mut state, reaction)
                        .await
                        .inspect_err(|e| error!("Session handling error: {e}"))
                        .ok();
                }
                _ => error!("Unexpected message type: {message:?}"),
            }
        }
    }

    async fn run_assets(
        state: Arc<Mutex<State>>,
        deriving: Arc<Deriving>,
        mut subscription: Box<dyn Subscription<Message>>,
    ) -> Result<()> {
        loop {
            let (_, message) = subscription.read().await?;
            match message.as_ref() {
                Message::Portfolio(PortfolioMessage::Assets(assets)) => {
                    let mut state = state.lock().await;
                    let reaction = state.handle_assets(assets);
                    deriving
                        .react(&mut state, reaction)
                        .await
                        .inspect_err(|e| error!("Assets handling error: {e}"))
                        .ok();
                }
                _ => error!("Unexpected message type: {message:?}"),
            }
        }
    }

    /// Main init function
    pub async fn init(&self, context: Arc<Context<Message>>, config: Arc<Config>) -> Result<()> {
        // Subscription topics
        let session_subscribe_topic = config
            .get_string(DEFAULT_SESSION_SUBSCRIBE_TOPIC.0)
            .unwrap_or(DEFAULT_SESSION_SUBSCRIBE_TOPIC.1.to_string());
        info!("Creating subscriber for session on '{session_subscribe_topic}'");

        let assets_subscribe_topic = config
            .get_string(DEFAULT_ASSETS_SUBSCRIBE_TOPIC.0)
            .unwrap_or(DEFAULT_ASSETS_SUBSCRIBE_TOPIC.1.to_string());
        info!("Creating subscriber for assets on '{assets_subscribe_topic}'");

        let clock_tick_subscribe_topic = config
            .get_string(DEFAULT_CLOCK_TICK_SUBSCRIBE_TOPIC.0)
            .unwrap_or(DEFAULT_CLOCK_TICK_SUBSCRIBE_TOPIC.1.to_string());

        // Publish topics
        let account_specifiers_publish_topic = config
            .get_string(DEFAULT_ACCOUNT_SPECIFIERS_PUBLISH_TOPIC.0)
            .unwrap_or(DEFAULT_ACCOUNT_SPECIFIERS_PUBLISH_TOPIC.1.to_string());
        info!("Publishing account specifiers on '{account_specifiers_publish_topic}'");

        let fetch_publish_topic = config
            .get_string(DEFAULT_FETCH_PUBLISH_TOPIC.0)
            .unwrap_or(DEFAULT_FETCH_PUBLISH_TOPIC.1.to_string());
        info!("Publishing fetch commands on '{fetch_publish_topic}'");

        // Wallet service
        let wallet_request_topic = config
            .get_string(DEFAULT_WALLET_REQUEST_TOPIC.0)
            .unwrap_or(DEFAULT_WALLET_REQUEST_TOPIC.1.to_string());
        info!("Sending wallet requests on '{wallet_request_topic}'");

        let deriver_config = DeriverConfig::from(config.clone());
        info!(
            chains = ?deriver_config.supported_chains,
            bitcoin_account_types = ?deriver_config.bitcoin_account_types,
            "Deriving account specifiers"
        );
        let adapters = Arc::new(ChainAdapterRegistry::standard(&deriver_config.supported_chains));

        let deriving = Arc::new(Deriving {
            context: context.clone(),
            wallet_request_topic,
            deriver: AccountSpecifierDeriver::new(adapters, &deriver_config),
            publisher: AccountSpecifiersPublisher::new(
                context.clone(),
                account_specifiers_publish_topic,
                FetchPublisher::new(context.clone(), fetch_publish_topic),
            ),
        });
        let deriving_assets = deriving.clone();

        let state = Arc::new(Mutex::new(State::new()));
        let state_assets = state.clone();
        let state_tick = state.clone();

        // Subscribe
        let session_subscription = context.subscribe(&session_subscribe_topic).await?;
        let assets_subscription = context.subscribe(&assets_subscribe_topic).await?;
        let mut tick_subscription = context.subscribe(&clock_tick_subscribe_topic).await?;

        context.run(async move {
            Self::run_session(state, deriving, session_subscription)
                .await
                .unwrap_or_else(|e| error!("Session loop failed: {e}"));
        });

        context.run(async move {
            Self::run_assets(state_assets, deriving_assets, assets_subscription)
                .await
                .unwrap_or_else(|e| error!("Assets loop failed: {e}"));
        });

        // Ticker to log stats
        context.run(async move {
            loop {
                let Ok((_, message)) = tick_subscription.read().await else {
                    return;
                };
                if let Message::Clock(message) = message.as_ref() {
                    if message.number % 60 == 0 {
                        let span = info_span!("account_specifiers.tick", number = message.number);
                        async {
                            if let Err(e) = state_tick.lock().await.tick().await {
                                error!("Tick error: {e}");
                            }
                        }
                        .instrument(span)
                        .await;
                    }
                }
            }
        });

        Ok(())
    }
}
