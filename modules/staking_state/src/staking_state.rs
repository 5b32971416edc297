//! Portfolio staking state module for Caryatid
//! Holds staking and validator records and answers aggregation queries

use anyhow::Result;
use caryatid_sdk::{message_bus::Subscription, module, Context};
use config::Config;
use portfolio_common::{
    messages::{Message, StateQuery, StateQueryResponse},
    queries::{
        errors::QueryError,
        staking::{StakingStateQuery, StakingStateQueryResponse, DEFAULT_STAKING_QUERY_TOPIC},
    },
    session::WalletSession,
};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info, info_span, Instrument};

mod selectors;
mod state;
#[cfg(test)]
mod test_utils;

use state::State;

const DEFAULT_STAKING_SUBSCRIBE_TOPIC: (&str, &str) =
    ("staking-subscribe-topic", "portfolio.staking");
const DEFAULT_SESSION_SUBSCRIBE_TOPIC: (&str, &str) =
    ("session-subscribe-topic", "portfolio.session");
const DEFAULT_CLOCK_TICK_SUBSCRIBE_TOPIC: (&str, &str) =
    ("clock-tick-subscribe-topic", "clock.tick");

/// Staking State module
#[module(
    message_type(Message),
    name = "staking-state",
    description = "In-memory staking and validator state"
)]
pub struct StakingState;

impl StakingState {
    /// Apply one session event or staking command. A wallet change drops
    /// everything held for the previous wallet.
    fn apply(state: &mut State, session: &mut WalletSession, message: &Message) {
        match message {
            Message::Staking(command) => state.handle_command(command),
            Message::Session(event) => {
                if session.handle(event) {
                    info!("Wallet changed, clearing staking state");
                    state.clear();
                }
            }
            _ => error!("Unexpected message type: {message:?}"),
        }
    }

    /// Session events and staking commands share one loop, and a pending
    /// session event is always taken first, so a wallet change is applied
    /// before any command read after it
    async fn run(
        state: Arc<Mutex<State>>,
        mut staking_subscription: Box<dyn Subscription<Message>>,
        mut session_subscription: Box<dyn Subscription<Message>>,
    ) -> Result<()> {
        let mut session = WalletSession::new();
        loop {
            let message = tokio::select! {
                biased;
                result = session_subscription.read() => result?.1,
                result = staking_subscription.read() => result?.1,
            };

            let span = info_span!("staking_state.handle_message");
            async {
                Self::apply(&mut *state.lock().await, &mut session, message.as_ref());
            }
            .instrument(span)
            .await;
        }
    }

    fn handle_query(state: &State, query: &StakingStateQuery) -> StakingStateQueryResponse {
        match query {
            StakingStateQuery::GetStakingDataIsLoaded => {
                StakingStateQueryResponse::StakingDataIsLoaded(selectors::staking_data_is_loaded(
                    state,
                ))
            }
            StakingStateQuery::GetValidatorIsLoaded => {
                StakingStateQueryResponse::ValidatorIsLoaded(selectors::validator_is_loaded(state))
            }
            StakingStateQuery::GetTotalBondingsBalance {
                account_specifier,
                validator_address,
                asset_id,
            } => StakingStateQueryResponse::TotalBondingsBalance(
                selectors::total_bondings_balance(
                    state,
                    account_specifier,
                    validator_address,
                    asset_id,
                ),
            ),
            StakingStateQuery::GetTotalStakingDelegation { account_specifier } => {
                StakingStateQueryResponse::TotalStakingDelegation(
                    selectors::total_staking_delegation_crypto_by_account_specifier(
                        state,
                        account_specifier,
                    ),
                )
            }
            StakingStateQuery::GetActiveStakingOpportunities {
                account_specifier,
                validator_address,
                asset_id,
            } => StakingStateQueryResponse::ActiveStakingOpportunities(
                selectors::active_staking_opportunity_data_by_asset_id(
                    state,
                    account_specifier,
                    validator_address,
                    asset_id,
                ),
            ),
            StakingStateQuery::GetSingleValidator {
                account_specifier,
                validator_address,
            } => StakingStateQueryResponse::SingleValidator(selectors::single_validator(
                state,
                account_specifier,
                validator_address,
            )),
            StakingStateQuery::GetValidatorAddresses { account_specifier } => {
                StakingStateQueryResponse::ValidatorAddresses(selectors::validator_addresses(
                    state,
                    account_specifier,
                ))
            }
            StakingStateQuery::GetStakingState => {
                StakingStateQueryResponse::StakingState(state.snapshot())
            }
        }
    }

    /// Main init function
    pub async fn init(&self, context: Arc<Context<Message>>, config: Arc<Config>) -> Result<()> {
        // Subscription topics
        let staking_subscribe_topic = config
            .get_string(DEFAULT_STAKING_SUBSCRIBE_TOPIC.0)
            .unwrap_or(DEFAULT_STAKING_SUBSCRIBE_TOPIC.1.to_string());
        info!("Creating subscriber for staking commands on '{staking_subscribe_topic}'");

        let session_subscribe_topic = config
            .get_string(DEFAULT_SESSION_SUBSCRIBE_TOPIC.0)
            .unwrap_or(DEFAULT_SESSION_SUBSCRIBE_TOPIC.1.to_string());
        info!("Creating subscriber for session on '{session_subscribe_topic}'");

        let clock_tick_subscribe_topic = config
            .get_string(DEFAULT_CLOCK_TICK_SUBSCRIBE_TOPIC.0)
            .unwrap_or(DEFAULT_CLOCK_TICK_SUBSCRIBE_TOPIC.1.to_string());

        // Query topic
        let staking_query_topic = config
            .get_string(DEFAULT_STAKING_QUERY_TOPIC.0)
            .unwrap_or(DEFAULT_STAKING_QUERY_TOPIC.1.to_string());
        info!("Creating query handler on '{staking_query_topic}'");

        let state = Arc::new(Mutex::new(State::new()));
        let state_query = state.clone();
        let state_tick = state.clone();

        // Subscribe
        let staking_subscription = context.subscribe(&staking_subscribe_topic).await?;
        let session_subscription = context.subscribe(&session_subscribe_topic).await?;
        let mut tick_subscription = context.subscribe(&clock_tick_subscribe_topic).await?;

        // Handle staking queries
        context.handle(&staking_query_topic, move |message| {
            let state = state_query.clone();
            async move {
                let Message::StateQuery(StateQuery::Staking(query)) = message.as_ref() else {
                    return Arc::new(Message::StateQueryResponse(StateQueryResponse::Staking(
                        StakingStateQueryResponse::Error(QueryError::internal_error(
                            "Invalid message for staking-state",
                        )),
                    )));
                };

                let response = Self::handle_query(&*state.lock().await, query);
                Arc::new(Message::StateQueryResponse(StateQueryResponse::Staking(
                    response,
                )))
            }
        });

        context.run(async move {
            Self::run(state, staking_subscription, session_subscription)
                .await
                .unwrap_or_else(|e| error!("Staking state loop failed: {e}"));
        });

        // Ticker to log stats
        context.run(async move {
            loop {
                let Ok((_, message)) = tick_subscription.read().await else {
                    return;
                };
                if let Message::Clock(message) = message.as_ref() {
                    if message.number % 60 == 0 {
                        let span = info_span!("staking_state.tick", number = message.number);
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
    use portfolio_common::{
        commands::StakingCommand, messages::SessionMessage, wallet::WalletInfo, ChainType,
        LoadStatus,
    };

    fn connected(device_id: &str) -> Message {
        Message::Session(SessionMessage::WalletConnected(WalletInfo {
            device_id: device_id.to_string(),
            label: "test".to_string(),
            supported_chains: vec![ChainType::Cosmos],
        }))
    }

    fn upsert_staking() -> Message {
        Message::Staking(StakingCommand::UpsertStakingData {
            account_specifier: cosmos_account_specifier(),
            staking_data: mock_staking_data(),
        })
    }

    fn loaded_state() -> State {
        let mut state = State::new();
        state.handle_command(&StakingCommand::SetStatus(LoadStatus::Loaded));
        state.handle_command(&StakingCommand::UpsertValidatorData {
            validators: mock_validator_data(),
        });
        state.handle_command(&StakingCommand::UpsertStakingData {
            account_specifier: cosmos_account_specifier(),
            staking_data: mock_staking_data(),
        });
        state
    }

    #[test]
    fn query_loaded_flags() {
        let state = loaded_state();
        assert!(matches!(
            StakingState::handle_query(&state, &StakingStateQuery::GetStakingDataIsLoaded),
            StakingStateQueryResponse::StakingDataIsLoaded(true)
        ));
        assert!(matches!(
            StakingState::handle_query(&state, &StakingStateQuery::GetValidatorIsLoaded),
            StakingStateQueryResponse::ValidatorIsLoaded(false)
        ));
    }

    #[test]
    fn query_total_bondings() {
        let state = loaded_state();
        let response = StakingState::handle_query(
            &state,
            &StakingStateQuery::GetTotalBondingsBalance {
                account_specifier: cosmos_account_specifier(),
                validator_address: SHAPESHIFT_VALIDATOR_ADDRESS.to_string(),
                asset_id: cosmos_asset_id(),
            },
        );
        match response {
            StakingStateQueryResponse::TotalBondingsBalance(total) => assert_eq!(total, "10115"),
            other => panic!("Unexpected response: {other:?}"),
        }
    }

    #[test]
    fn query_validator_addresses_for_unknown_account() {
        let state = loaded_state();
        let response = StakingState::handle_query(
            &state,
            &StakingStateQuery::GetValidatorAddresses {
                account_specifier: other_cosmos_account_specifier(),
            },
        );
        match response {
            StakingStateQueryResponse::ValidatorAddresses(addresses) => {
                assert!(addresses.is_empty())
            }
            other => panic!("Unexpected response: {other:?}"),
        }
    }

    #[test]
    fn query_snapshot() {
        let state = loaded_state();
        match StakingState::handle_query(&state, &StakingStateQuery::GetStakingState) {
            StakingStateQueryResponse::StakingState(snapshot) => {
                assert_eq!(snapshot, state.snapshot());
                assert_eq!(snapshot.by_validator.len(), 3);
            }
            other => panic!("Unexpected response: {other:?}"),
        }
    }

    #[test]
    fn wallet_switch_clears_before_new_wallet_commands() {
        let mut state = State::new();
        let mut session = WalletSession::new();

        StakingState::apply(&mut state, &mut session, &connected("a"));
        StakingState::apply(&mut state, &mut session, &upsert_staking());
        assert!(state.staking_record(&cosmos_account_specifier()).is_some());

        // Switch, then the new wallet's data lands after the clear
        StakingState::apply(&mut state, &mut session, &connected("b"));
        assert!(state.staking_record(&cosmos_account_specifier()).is_none());
        StakingState::apply(
            &mut state,
            &mut session,
            &Message::Staking(StakingCommand::SetStatus(LoadStatus::Loaded)),
        );
        StakingState::apply(&mut state, &mut session, &upsert_staking());
        assert!(state.staking_record(&cosmos_account_specifier()).is_some());
        assert_eq!(state.status(), LoadStatus::Loaded);
    }

    #[test]
    fn reconnecting_same_wallet_keeps_state() {
        let mut state = State::new();
        let mut session = WalletSession::new();

        StakingState::apply(&mut state, &mut session, &connected("a"));
        StakingState::apply(&mut state, &mut session, &upsert_staking());
        StakingState::apply(&mut state, &mut session, &connected("a"));
        assert!(state.staking_record(&cosmos_account_specifier()).is_some());

        StakingState::apply(
            &mut state,
            &mut session,
            &Message::Session(SessionMessage::WalletDisconnected),
        );
        assert!(state.staking_record(&cosmos_account_specifier()).is_none());
    }
}
