use anyhow::Result;
use caryatid_sdk::Context;
use portfolio_common::{
    commands::FetchCommand,
    messages::{Message, PortfolioMessage},
    publisher::{FetchPublisher, FetchSink},
    AccountSpecifierMap,
};
use std::sync::Arc;
use tracing::info;

/// Publishes the derived list, and asks for every account to be fetched
pub struct AccountSpecifiersPublisher {
    /// Module context
    context: Arc<Context<Message>>,

    /// Topic to publish the list on
    topic: String,

    /// Fetch commands for the listed accounts
    fetch_publisher: FetchPublisher,
}

impl AccountSpecifiersPublisher {
    pub fn new(
        context: Arc<Context<Message>>,
        topic: String,
        fetch_publisher: FetchPublisher,
    ) -> Self {
        Self {
            context,
            topic,
            fetch_publisher,
        }
    }

    /// A non-empty list replaces any previous wallet's portfolio, so the old
    /// one is cleared before every account is refetched
    pub async fn publish(&self, account_specifiers: Vec<AccountSpecifierMap>) -> Result<()> {
        self.context
            .publish(
                &self.topic,
                Arc::new(Message::Portfolio(PortfolioMessage::AccountSpecifiers(
                    account_specifiers.clone(),
                ))),
            )
            .await?;

        if account_specifiers.is_empty() {
            return Ok(());
        }

        request_account_fetches(&self.fetch_publisher, &account_specifiers).await
    }
}

/// Clear the portfolio, then force a fetch of every listed account in order.
/// Nothing is sent for an empty list.
pub async fn request_account_fetches(
    sink: &dyn FetchSink,
    account_specifiers: &[AccountSpecifierMap],
) -> Result<()> {
    if account_specifiers.is_empty() {
        return Ok(());
    }

    info!(count = account_specifiers.len(), "Clearing portfolio and fetching accounts");
    sink.publish(FetchCommand::ClearPortfolio).await?;
    sink.publish_all(
        account_specifiers
            .iter()
            .map(|account_specifier_map| FetchCommand::FetchAccount {
                account_specifier_map: account_specifier_map.clone(),
                force_refetch: true,
            })
            .collect(),
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;

    #[tokio::test]
    async fn clears_then_forces_each_account_in_order() {
        let sink = RecordingSink::default();
        let account_specifiers = vec![
            AccountSpecifierMap::single(eth_chain_id(), ETH_ADDRESS),
            AccountSpecifierMap::single(btc_chain_id(), zpub()),
            AccountSpecifierMap::single(cosmos_chain_id(), COSMOS_ADDRESS),
        ];

        request_account_fetches(&sink, &account_specifiers).await.unwrap();

        let mut expected = vec![FetchCommand::ClearPortfolio];
        expected.extend(account_specifiers.into_iter().map(|account_specifier_map| {
            FetchCommand::FetchAccount {
                account_specifier_map,
                force_refetch: true,
            }
        }));
        assert_eq!(sink.commands(), expected);
    }

    #[tokio::test]
    async fn empty_list_sends_nothing() {
        let sink = RecordingSink::default();
        request_account_fetches(&sink, &[]).await.unwrap();
        assert!(sink.commands().is_empty());
    }
}
