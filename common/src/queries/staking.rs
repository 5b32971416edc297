use crate::caip::AssetId;
use crate::staking::{StakingRecord, ValidatorAddress, ValidatorRecord};
use crate::types::{AccountSpecifier, LoadStatus};
use std::collections::HashMap;

use crate::queries::errors::QueryError;

pub const DEFAULT_STAKING_QUERY_TOPIC: (&str, &str) =
    ("staking-state-query-topic", "portfolio.query.staking");

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub enum StakingStateQuery {
    GetStakingDataIsLoaded,
    GetValidatorIsLoaded,
    GetTotalBondingsBalance {
        account_specifier: AccountSpecifier,
        validator_address: ValidatorAddress,
        asset_id: AssetId,
    },
    GetTotalStakingDelegation {
        account_specifier: AccountSpecifier,
    },
    GetActiveStakingOpportunities {
        account_specifier: AccountSpecifier,
        validator_address: ValidatorAddress,
        asset_id: AssetId,
    },
    GetSingleValidator {
        account_specifier: AccountSpecifier,
        validator_address: ValidatorAddress,
    },
    GetValidatorAddresses {
        account_specifier: AccountSpecifier,
    },
    GetStakingState,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub enum StakingStateQueryResponse {
    StakingDataIsLoaded(bool),
    ValidatorIsLoaded(bool),
    TotalBondingsBalance(String),
    TotalStakingDelegation(String),
    ActiveStakingOpportunities(Vec<OpportunityLineItem>),
    SingleValidator(Option<ValidatorRecord>),
    ValidatorAddresses(Vec<ValidatorAddress>),
    StakingState(StakingStateSnapshot),
    Error(QueryError),
}

/// Kind of bonded position
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BondingKind {
    Delegation,
    Undelegation,
    Redelegation,
    Reward,
}

/// One active staking position against a validator, for display
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct OpportunityLineItem {
    /// Position kind
    pub kind: BondingKind,

    /// Validator the position is held against
    pub validator: ValidatorRecord,

    /// Asset of the position
    pub asset_id: AssetId,

    /// Summed amount, base units
    pub amount: String,

    /// Number of underlying entries
    pub entries: usize,
}

/// Whole staking store contents
#[derive(Debug, Default, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct StakingStateSnapshot {
    pub by_account_specifier: HashMap<AccountSpecifier, StakingRecord>,
    pub by_validator: HashMap<ValidatorAddress, ValidatorRecord>,
    pub status: LoadStatus,
    pub validator_status: LoadStatus,
}
