//! Core type definitions for the portfolio sync engine

use crate::caip::{AssetId, ChainId, ParseError};
use serde::{Deserialize, Serialize};
use serde_with::{DeserializeFromStr, SerializeDisplay};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Load status of a piece of fetched state
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadStatus {
    #[default]
    Idle,
    Loading,
    Loaded,
}

impl LoadStatus {
    pub fn is_loaded(&self) -> bool {
        matches!(self, LoadStatus::Loaded)
    }
}

/// Asset metadata record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    /// CAIP-19 id
    pub asset_id: AssetId,

    /// Chain the asset lives on
    pub chain_id: ChainId,

    /// Ticker symbol
    pub symbol: String,

    /// Display name
    pub name: String,

    /// Number of decimals in the base unit
    pub precision: u8,

    /// SLIP-44 coin type
    pub slip44: u32,
}

/// One account on one chain, `chainId:account`
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, SerializeDisplay, DeserializeFromStr,
)]
pub struct AccountSpecifier {
    /// Chain the account lives on
    pub chain_id: ChainId,

    /// Chain-native account identifier (address or extended public key)
    pub account: String,
}

impl AccountSpecifier {
    pub fn new(chain_id: ChainId, account: impl Into<String>) -> Self {
        Self {
            chain_id,
            account: account.into(),
        }
    }
}

impl fmt::Display for AccountSpecifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.chain_id, self.account)
    }
}

impl FromStr for AccountSpecifier {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ParseError::InvalidAccountSpecifier(s.to_string());
        let (chain, account) = s.rsplit_once(':').ok_or_else(invalid)?;
        if account.is_empty() {
            return Err(invalid());
        }
        let chain_id = ChainId::from_str(chain).map_err(|_| invalid())?;
        Ok(Self::new(chain_id, account))
    }
}

/// Chain id to account identifier mapping, the unit of an account fetch.
/// Holds a single entry, or none for an unmatched refetch target.
#[derive(Debug, Default, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountSpecifierMap(BTreeMap<ChainId, String>);

impl AccountSpecifierMap {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn single(chain_id: ChainId, account: impl Into<String>) -> Self {
        Self(BTreeMap::from([(chain_id, account.into())]))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The account specifier this map targets, if any
    pub fn account_specifier(&self) -> Option<AccountSpecifier> {
        self.0
            .iter()
            .next()
            .map(|(chain_id, account)| AccountSpecifier::new(chain_id.clone(), account.clone()))
    }

    /// Structured match on chain id and account
    pub fn matches(&self, specifier: &AccountSpecifier) -> bool {
        self.0.get(&specifier.chain_id).is_some_and(|account| *account == specifier.account)
    }
}

impl From<AccountSpecifier> for AccountSpecifierMap {
    fn from(specifier: AccountSpecifier) -> Self {
        Self::single(specifier.chain_id, specifier.account)
    }
}

/// Transaction key unique across accounts, `accountSpecifier-txid`
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, SerializeDisplay, DeserializeFromStr,
)]
pub struct UniqueTxId {
    /// Account whose history the transaction belongs to
    pub account_specifier: AccountSpecifier,

    /// Chain-native transaction id
    pub tx_id: String,
}

impl UniqueTxId {
    pub fn new(account_specifier: AccountSpecifier, tx_id: impl Into<String>) -> Self {
        Self {
            account_specifier,
            tx_id: tx_id.into(),
        }
    }
}

impl fmt::Display for UniqueTxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.account_specifier, self.tx_id)
    }
}

impl FromStr for UniqueTxId {
    type Err = ParseError;

    /// Native tx ids never contain '-', chain references may
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ParseError::InvalidTxId(s.to_string());
        let (account, tx_id) = s.rsplit_once('-').ok_or_else(invalid)?;
        if tx_id.is_empty() {
            return Err(invalid());
        }
        let account_specifier = AccountSpecifier::from_str(account).map_err(|_| invalid())?;
        Ok(Self::new(account_specifier, tx_id))
    }
}

/// Confirmation status of a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TxStatus {
    Pending,
    Confirmed,
    Failed,
    Unknown,
}

/// Staking action carried by a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StakingAction {
    Delegate,
    Undelegate,
    Redelegate,
    ClaimRewards,
}

/// Transaction record from the transaction feed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tx {
    /// Composite key
    pub id: UniqueTxId,

    /// Chain the transaction originated on
    pub chain_id: ChainId,

    /// Sender address
    pub address: String,

    /// Confirmation status, mutated as confirmations accrue
    pub status: TxStatus,

    /// Set for delegation and other staking transactions
    pub staking_action: Option<StakingAction>,
}
