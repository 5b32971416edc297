//! Pending transaction tracker state
//!
//! Watches the transaction feed and decides which accounts to refetch. All
//! decisions are returned as actions, the module performs them.

use crate::tracker_config::TrackerConfig;
use anyhow::Result;
use imbl::{HashMap, Vector};
use portfolio_common::{
    messages::TxsMessage, AccountSpecifier, AccountSpecifierMap, ChainId, LoadStatus, Tx,
    TxStatus, UniqueTxId,
};
use std::collections::BTreeSet;
use tracing::{debug, info};

/// Follow-up requested by the tracker
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackerAction {
    /// Forced refetch of one account, or a no-op fetch if the map is empty
    RefetchAccount(AccountSpecifierMap),

    /// Fetch data for every validator in this account's staking record
    FetchValidators {
        chain_id: ChainId,
        account_specifier: AccountSpecifier,
    },
}

#[derive(Debug, Clone)]
pub struct State {
    config: TrackerConfig,

    /// Known account specifiers for the session
    account_specifiers: Vec<AccountSpecifierMap>,

    tx_history_status: LoadStatus,

    /// Feed order, most recent first
    tx_ids: Vector<UniqueTxId>,

    /// Latest record per transaction
    txs: HashMap<UniqueTxId, Tx>,

    /// Ids seen as pending and not yet seen confirmed
    pending: BTreeSet<UniqueTxId>,
}

impl State {
    pub fn new(config: TrackerConfig) -> Self {
        Self {
            config,
            account_specifiers: Vec::new(),
            tx_history_status: LoadStatus::Idle,
            tx_ids: Vector::new(),
            txs: HashMap::new(),
            pending: BTreeSet::new(),
        }
    }

    /// Drop everything belonging to the previous wallet
    pub fn clear(&mut self) {
        *self = Self::new(self.config.clone());
    }

    pub fn pending(&self) -> &BTreeSet<UniqueTxId> {
        &self.pending
    }

    pub fn set_account_specifiers(&mut self, account_specifiers: Vec<AccountSpecifierMap>) {
        self.account_specifiers = account_specifiers;
    }

    /// Update the history load status. Becoming loaded classifies the current
    /// head and reconciles, since both were held back while loading.
    pub fn set_tx_history_status(&mut self, status: LoadStatus) -> Vec<TrackerAction> {
        let was_loaded = self.tx_history_status.is_loaded();
        self.tx_history_status = status;

        let mut actions = Vec::new();
        if status.is_loaded() && !was_loaded {
            actions.extend(self.observe_head());
            actions.extend(self.reconcile());
        }
        actions
    }

    /// Upsert transaction records. Each id not seen before becomes the new
    /// head of the feed.
    pub fn handle_txs(&mut self, message: &TxsMessage) -> Vec<TrackerAction> {
        let previous_head = self.tx_ids.front().cloned();

        for tx in &message.txs {
            if self.txs.insert(tx.id.clone(), tx.clone()).is_none() {
                self.tx_ids.push_front(tx.id.clone());
            }
        }

        let mut actions = Vec::new();
        if self.tx_ids.front() != previous_head.as_ref() {
            actions.extend(self.observe_head());
        }
        actions.extend(self.reconcile());
        actions
    }

    /// Classify the most recent transaction
    fn observe_head(&mut self) -> Vec<TrackerAction> {
        if !self.tx_history_status.is_loaded() || self.account_specifiers.is_empty() {
            return Vec::new();
        }
        let Some(tx) = self.tx_ids.front().and_then(|id| self.txs.get(id)).cloned() else {
            return Vec::new();
        };

        if self.streams_only_confirmed(&tx.chain_id) {
            // Already confirmed, nothing to wait for
            let mut actions = Vec::new();
            if tx.staking_action.is_some() {
                actions.push(TrackerAction::FetchValidators {
                    chain_id: tx.chain_id.clone(),
                    account_specifier: tx.id.account_specifier.clone(),
                });
            }
            actions.push(TrackerAction::RefetchAccount(self.resolve(&tx.id)));
            return actions;
        }

        if tx.status == TxStatus::Pending && self.pending.insert(tx.id.clone()) {
            debug!(tx = %tx.id, "Tracking pending transaction");
        }
        Vec::new()
    }

    /// Refetch the account of every tracked transaction now confirmed, and
    /// stop tracking it
    fn reconcile(&mut self) -> Vec<TrackerAction> {
        if !self.tx_history_status.is_loaded() || self.pending.is_empty() {
            return Vec::new();
        }

        let confirmed: Vec<UniqueTxId> = self
            .pending
            .iter()
            .filter(|id| self.txs.get(*id).is_some_and(|tx| tx.status == TxStatus::Confirmed))
            .cloned()
            .collect();

        confirmed
            .into_iter()
            .map(|id| {
                self.pending.remove(&id);
                debug!(tx = %id, "Pending transaction confirmed");
                TrackerAction::RefetchAccount(self.resolve(&id))
            })
            .collect()
    }

    /// Known specifier owning the transaction, or an empty map
    fn resolve(&self, tx_id: &UniqueTxId) -> AccountSpecifierMap {
        self.account_specifiers
            .iter()
            .find(|map| map.matches(&tx_id.account_specifier))
            .cloned()
            .unwrap_or_else(AccountSpecifierMap::empty)
    }

    fn streams_only_confirmed(&self, chain_id: &ChainId) -> bool {
        self.config
            .stream_only_confirmed_namespaces
            .iter()
            .any(|namespace| namespace == chain_id.namespace())
    }

    pub async fn tick(&self) -> Result<()> {
        info!(
            account_specifiers = self.account_specifiers.len(),
            txs = self.txs.len(),
            pending = self.pending.len(),
            status = ?self.tx_history_status,
            "Pending tx tracker"
        );
        Ok(())
    }
}
