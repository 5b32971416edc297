//! Portfolio pending transaction tracker module for Caryatid
//! Refetches an account once its pending transactions confirm

use anyhow::Result;
use async_trait::async_trait;
use caryatid_sdk::{message_bus::Subscription, module, Context};
use config::Config;
use portfolio_common::{
    commands::FetchCommand,
    messages::{Message, PortfolioMessage, StateQuery, StateQueryResponse},
    publisher::{FetchPublisher, FetchSink},
    queries::{
        errors::QueryError,
        get_query_topic,
        staking::{StakingStateQuery, StakingStateQueryResponse, DEFAULT_STAKING_QUERY_TOPIC},
        utils::query_state,
    },
    session::WalletSession,
    AccountSpecifier,
};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info, info_span, warn, Instrument};

mod state;
#[cfg(test)]
mod test_utils;
mod tracker_config;

use state::{State, TrackerAction};
use tracker_config::TrackerConfig;

const DEFAULT_TXS_SUBSCRIBE_TOPIC: (&str, &str) = ("txs-subscribe-topic", "portfolio.txs");
const DEFAULT_ACCOUNT_SPECIFIERS_SUBSCRIBE_TOPIC: (&str, &str) = (
    "account-specifiers-subscribe-topic",
    "portfolio.account-specifiers",
);
const DEFAULT_SESSION_SUBSCRIBE_TOPIC: (&str, &str) =
    ("session-subscribe-topic", "portfolio.session");
const DEFAULT_CLOCK_TICK_SUBSCRIBE_TOPIC: (&str, &str) =
    ("clock-tick-subscribe-topic", "clock.tick");
const DEFAULT_FETCH_PUBLISH_TOPIC: (&str, &str) = ("fetch-publish-topic", "portfolio.fetch");

/// Lookup of the validators an account stakes with
#[async_trait]
trait ValidatorSource: Send + Sync {
    async fn validator_addresses(&self, account_specifier: &AccountSpecifier)
        -> Result<Vec<String>>;
}

/// Asks the staking state over the bus
struct StakingStateValidators {
    context: Arc<Context<Message>>,
}

#[async_trait]
impl ValidatorSource for StakingStateValidators {
    async fn validator_addresses(
        &self,
        account_specifier: &AccountSpecifier,
    ) -> Result<Vec<String>> {
        let topic = get_query_topic(self.context.clone(), DEFAULT_STAKING_QUERY_TOPIC);
        let request = Arc::new(Message::StateQuery(StateQuery::Staking(
            StakingStateQuery::GetValidatorAddresses {
                account_specifier: account_specifier.clone(),
            },
        )));

        let addresses = query_state(&self.context, &topic, request, |message| match message {
            Message::StateQueryResponse(StateQueryResponse::Staking(
                StakingStateQueryResponse::ValidatorAddresses(addresses),
            )) => Ok(addresses),
            Message::StateQueryResponse(StateQueryResponse::Staking(
                StakingStateQueryResponse::Error(e),
            )) => Err(e),
            _ => Err(QueryError::internal_error(
                "Unexpected message type while retrieving validator addresses",
            )),
        })
        .await?;
        Ok(addresses)
    }
}

/// Pending Tx Tracker module
#[module(
    message_type(Message),
    name = "pending-tx-tracker",
    description = "Account refetch on transaction confirmation"
)]
pub struct PendingTxTracker;

impl PendingTxTracker {
    /// Follow the transaction feed
    async fn run_txs(
        state: Arc<Mutex<State>>,
        mut subscription: Box<dyn Subscription<Message>>,
        validators: StakingStateValidators,
        publisher: FetchPublisher,
    ) -> Result<()> {
        loop {
            let (_, message) = subscription.read().await?;
            let actions = match message.as_ref() {
                Message::Portfolio(PortfolioMessage::TxHistoryStatus(status)) => {
                    state.lock().await.set_tx_history_status(*status)
                }
                Message::Portfolio(PortfolioMessage::Txs(txs)) => {
                    let span = info_span!("pending_tx_tracker.handle_txs", txs = txs.txs.len());
                    async { state.lock().await.handle_txs(txs) }.instrument(span).await
                }
                _ => {
                    error!("Unexpected message type: {message:?}");
                    continue;
                }
            };

            for action in actions {
                Self::perform(&validators, &publisher, action)
                    .await
                    .inspect_err(|e| error!("Tracker action failed: {e}"))
                    .ok();
            }
        }
    }

    async fn run_account_specifiers(
        state: Arc<Mutex<State>>,
        mut subscription: Box<dyn Subscription<Message>>,
    ) -> Result<()> {
        loop {
            let (_, message) = subscription.read().await?;
            match message.as_ref() {
                Message::Portfolio(PortfolioMessage::AccountSpecifiers(account_specifiers)) => {
                    state.lock().await.set_account_specifiers(account_specifiers.clone());
                }
                _ => error!("Unexpected message type: {message:?}"),
            }
        }
    }

    async fn run_session(
        state: Arc<Mutex<State>>,
        mut subscription: Box<dyn Subscription<Message>>,
    ) -> Result<()> {
        let mut session = WalletSession::new();
        loop {
            let (_, message) = subscription.read().await?;
            match message.as_ref() {
                Message::Session(event) => {
                    if session.handle(event) {
                        info!("Wallet changed, dropping tracked transactions");
                        state.lock().await.clear();
                    }
                }
                _ => error!("Unexpected message type: {message:?}"),
            }
        }
    }

    async fn perform(
        validators: &dyn ValidatorSource,
        sink: &dyn FetchSink,
        action: TrackerAction,
    ) -> Result<()> {
        match action {
            TrackerAction::RefetchAccount(account_specifier_map) => {
                if account_specifier_map.is_empty() {
                    warn!("Transaction does not belong to a known account");
                }
                sink.publish(FetchCommand::FetchAccount {
                    account_specifier_map,
                    force_refetch: true,
                })
                .await
            }
            TrackerAction::FetchValidators {
                chain_id,
                account_specifier,
            } => {
                let validator_addresses = validators.validator_addresses(&account_specifier).await?;
                sink.publish_all(
                    validator_addresses
                        .into_iter()
                        .map(|validator_address| FetchCommand::FetchValidatorData {
                            chain_id: chain_id.clone(),
                            validator_address,
                        })
                        .collect(),
                )
                .await
            }
        }
    }

    /// Main init function
    pub async fn init(&self, context: Arc<Context<Message>>, config: Arc<Config>) -> Result<()> {
        // Subscription topics
        let txs_subscribe_topic = config
            .get_string(DEFAULT_TXS_SUBSCRIBE_TOPIC.0)
            .unwrap_or(DEFAULT_TXS_SUBSCRIBE_TOPIC.1.to_string());
        info!("Creating subscriber for txs on '{txs_subscribe_topic}'");

        let account_specifiers_subscribe_topic = config
            .get_string(DEFAULT_ACCOUNT_SPECIFIERS_SUBSCRIBE_TOPIC.0)
            .unwrap_or(DEFAULT_ACCOUNT_SPECIFIERS_SUBSCRIBE_TOPIC.1.to_string());
        info!(
            "Creating subscriber for account specifiers on '{account_specifiers_subscribe_topic}'"
        );

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
        info!("Publishing fetch commands on '{fetch_publish_topic}'");

        let tracker_config = TrackerConfig::from(config.clone());
        info!(
            namespaces = ?tracker_config.stream_only_confirmed_namespaces,
            "Chains streaming only confirmed transactions"
        );

        let state = Arc::new(Mutex::new(State::new(tracker_config)));
        let state_account_specifiers = state.clone();
        let state_session = state.clone();
        let state_tick = state.clone();

        // Subscribe
        let txs_subscription = context.subscribe(&txs_subscribe_topic).await?;
        let account_specifiers_subscription =
            context.subscribe(&account_specifiers_subscribe_topic).await?;
        let session_subscription = context.subscribe(&session_subscribe_topic).await?;
        let mut tick_subscription = context.subscribe(&clock_tick_subscribe_topic).await?;

        let validators = StakingStateValidators {
            context: context.clone(),
        };
        let publisher = FetchPublisher::new(context.clone(), fetch_publish_topic);

        context.run(async move {
            Self::run_txs(state, txs_subscription, validators, publisher)
                .await
                .unwrap_or_else(|e| error!("Txs loop failed: {e}"));
        });

        context.run(async move {
            Self::run_account_specifiers(state_account_specifiers, account_specifiers_subscription)
                .await
                .unwrap_or_else(|e| error!("Account specifiers loop failed: {e}"));
        });

        context.run(async move {
            Self::run_session(state_session, session_subscription)
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
                        let span = info_span!("pending_tx_tracker.tick", number = message.number);
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;
    use portfolio_common::{messages::TxsMessage, AccountSpecifierMap, LoadStatus, StakingAction};
    use std::sync::Mutex as StdMutex;

    /// Answers every lookup with the same addresses and records who asked
    struct FixedValidators {
        addresses: Vec<String>,
        asked: StdMutex<Vec<AccountSpecifier>>,
    }

    impl FixedValidators {
        fn new(addresses: &[&str]) -> Self {
            Self {
                addresses: addresses.iter().map(|a| a.to_string()).collect(),
                asked: StdMutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ValidatorSource for FixedValidators {
        async fn validator_addresses(
            &self,
            account_specifier: &AccountSpecifier,
        ) -> Result<Vec<String>> {
            self.asked.lock().unwrap().push(account_specifier.clone());
            Ok(self.addresses.clone())
        }
    }

    async fn perform_all(
        validators: &FixedValidators,
        sink: &RecordingSink,
        actions: Vec<TrackerAction>,
    ) {
        for action in actions {
            PendingTxTracker::perform(validators, sink, action).await.unwrap();
        }
    }

    #[tokio::test]
    async fn staking_tx_fetches_each_validator_then_the_account() {
        let mut state = State::new(TrackerConfig::default());
        state.set_account_specifiers(account_specifiers());
        state.set_tx_history_status(LoadStatus::Loaded);

        let tx = cosmos_tx("C1", Some(StakingAction::Delegate));
        let actions = state.handle_txs(&TxsMessage {
            txs: vec![tx.clone()],
        });

        let validators = FixedValidators::new(&["cosmosvaloper1aaa", "cosmosvaloper1bbb"]);
        let sink = RecordingSink::default();
        perform_all(&validators, &sink, actions).await;

        assert_eq!(
            *validators.asked.lock().unwrap(),
            vec![tx.id.account_specifier.clone()]
        );
        assert_eq!(
            sink.commands(),
            vec![
                FetchCommand::FetchValidatorData {
                    chain_id: cosmos_chain_id(),
                    validator_address: "cosmosvaloper1aaa".to_string(),
                },
                FetchCommand::FetchValidatorData {
                    chain_id: cosmos_chain_id(),
                    validator_address: "cosmosvaloper1bbb".to_string(),
                },
                FetchCommand::FetchAccount {
                    account_specifier_map: cosmos_specifier_map(),
                    force_refetch: true,
                },
            ]
        );
    }

    #[tokio::test]
    async fn no_known_validators_still_refetches_the_account() {
        let validators = FixedValidators::new(&[]);
        let sink = RecordingSink::default();
        perform_all(
            &validators,
            &sink,
            vec![
                TrackerAction::FetchValidators {
                    chain_id: cosmos_chain_id(),
                    account_specifier: cosmos_tx("C1", None).id.account_specifier,
                },
                TrackerAction::RefetchAccount(cosmos_specifier_map()),
            ],
        )
        .await;

        assert_eq!(
            sink.commands(),
            vec![FetchCommand::FetchAccount {
                account_specifier_map: cosmos_specifier_map(),
                force_refetch: true,
            }]
        );
    }

    #[tokio::test]
    async fn unknown_account_sends_empty_refetch() {
        let validators = FixedValidators::new(&[]);
        let sink = RecordingSink::default();
        perform_all(
            &validators,
            &sink,
            vec![TrackerAction::RefetchAccount(AccountSpecifierMap::empty())],
        )
        .await;

        assert_eq!(
            sink.commands(),
            vec![FetchCommand::FetchAccount {
                account_specifier_map: AccountSpecifierMap::empty(),
                force_refetch: true,
            }]
        );
        assert!(validators.asked.lock().unwrap().is_empty());
    }
}
