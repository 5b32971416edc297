//! Definition of portfolio sync messages

use crate::caip::AssetId;
use crate::commands::{FetchCommand, StakingCommand};
use crate::queries::staking::{StakingStateQuery, StakingStateQueryResponse};
use crate::types::{AccountSpecifierMap, Asset, LoadStatus, Tx};
use crate::wallet::{PublicKey, PublicKeyRequest, WalletInfo};
use crate::chain::ChainType;

// Caryatid core messages
use caryatid_module_clock::messages::ClockTickMessage;

/// Wallet session lifecycle
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub enum SessionMessage {
    WalletConnected(WalletInfo),
    WalletDisconnected,
}

/// Transaction feed update. Records are upserted in order, so the last new
/// id in `txs` becomes the most recent one.
#[derive(Debug, Default, Clone, serde::Serialize, serde::Deserialize)]
pub struct TxsMessage {
    pub txs: Vec<Tx>,
}

/// Portfolio data feed
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub enum PortfolioMessage {
    /// Full set of known asset records
    Assets(Vec<Asset>),

    /// Derived account specifiers, in derivation order
    AccountSpecifiers(Vec<AccountSpecifierMap>),

    TxHistoryStatus(LoadStatus),

    Txs(TxsMessage),

    /// Asset ids present in the current holdings
    HoldingsAssetIds(Vec<AssetId>),
}

/// Requests to the wallet service, one at a time
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub enum WalletRequest {
    GetAddress {
        chain: ChainType,
        address_n_list: Vec<u32>,
    },

    GetPublicKeys {
        requests: Vec<PublicKeyRequest>,
    },
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub enum WalletResponse {
    Address(Option<String>),
    PublicKeys(Option<Vec<Option<PublicKey>>>),
    Error(String),
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub enum StateQuery {
    Staking(StakingStateQuery),
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub enum StateQueryResponse {
    Staking(StakingStateQueryResponse),
}

// === Global message enum ===
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub enum Message {
    None(()), // Just so we have a simple default

    // Caryatid standard messages
    Clock(ClockTickMessage), // Clock tick

    // Portfolio messages
    Session(SessionMessage),     // Wallet connected or gone
    Portfolio(PortfolioMessage), // Feed of assets, specifiers, txs and holdings
    Staking(StakingCommand),     // Staking store mutations
    Fetch(FetchCommand),         // Outbound fetch requests

    // Wallet service
    WalletRequest(WalletRequest),
    WalletResponse(WalletResponse),

    // State queries
    StateQuery(StateQuery),
    StateQueryResponse(StateQueryResponse),
}

impl Default for Message {
    fn default() -> Self {
        Self::None(())
    }
}

// Casts from specific messages
impl From<ClockTickMessage> for Message {
    fn from(msg: ClockTickMessage) -> Self {
        Message::Clock(msg)
    }
}

impl From<SessionMessage> for Message {
    fn from(msg: SessionMessage) -> Self {
        Message::Session(msg)
    }
}

impl From<PortfolioMessage> for Message {
    fn from(msg: PortfolioMessage) -> Self {
        Message::Portfolio(msg)
    }
}

impl From<StakingCommand> for Message {
    fn from(msg: StakingCommand) -> Self {
        Message::Staking(msg)
    }
}

impl From<FetchCommand> for Message {
    fn from(msg: FetchCommand) -> Self {
        Message::Fetch(msg)
    }
}
