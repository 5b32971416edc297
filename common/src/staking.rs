//! Staking and validator records as delivered by the staking data fetchers

use crate::caip::AssetId;
use serde::{Deserialize, Serialize};

/// Validator operator address, e.g. `cosmosvaloper1...`
pub type ValidatorAddress = String;

/// Chain-wide validator data
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorRecord {
    /// Operator address
    pub address: ValidatorAddress,

    /// Total stake, base units
    pub tokens: String,

    /// Annualised yield, decimal string
    pub apr: String,

    /// Commission rate, decimal string
    pub commission: String,

    /// Display name
    pub moniker: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delegation {
    pub validator_address: ValidatorAddress,
    pub asset_id: AssetId,
    pub amount: String,
}

/// One unbonding entry, completing at `completion_time` (unix seconds)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UndelegationEntry {
    pub asset_id: AssetId,
    pub completion_time: u64,
    pub amount: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Undelegation {
    pub validator_address: ValidatorAddress,
    pub entries: Vec<UndelegationEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedelegationEntry {
    pub asset_id: AssetId,
    pub completion_time: u64,
    pub amount: String,
}

/// Stake moving from a source to a destination validator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Redelegation {
    pub source_validator_address: ValidatorAddress,
    pub destination_validator_address: ValidatorAddress,
    pub entries: Vec<RedelegationEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardEntry {
    pub asset_id: AssetId,
    pub amount: String,
}

/// Unclaimed rewards earned from one validator, possibly in several assets
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorRewards {
    pub validator_address: ValidatorAddress,
    pub rewards: Vec<RewardEntry>,
}

/// Everything staked by one account
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakingRecord {
    pub delegations: Vec<Delegation>,
    pub undelegations: Vec<Undelegation>,
    pub redelegations: Vec<Redelegation>,
    pub rewards: Vec<ValidatorRewards>,
}
