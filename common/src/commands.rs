//! Commands: outbound fetch requests and staking store mutations

use crate::caip::{AssetId, ChainId};
use crate::staking::{StakingRecord, ValidatorAddress, ValidatorRecord};
use crate::types::{AccountSpecifier, AccountSpecifierMap, LoadStatus};

/// Outbound fetch requests, served by the external data fetchers.
/// Every fetch is idempotent and tolerates an empty account specifier map.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum FetchCommand {
    /// Drop the fetched portfolio before refetching every account
    ClearPortfolio,

    FetchAccount {
        account_specifier_map: AccountSpecifierMap,
        force_refetch: bool,
    },

    FetchValidatorData {
        chain_id: ChainId,
        validator_address: ValidatorAddress,
    },

    FetchMarketData {
        asset_id: AssetId,
        force_refetch: bool,
    },
}

/// Mutations of the staking store
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub enum StakingCommand {
    SetStatus(LoadStatus),

    SetValidatorStatus(LoadStatus),

    /// Replace the whole staking record of one account
    UpsertStakingData {
        account_specifier: AccountSpecifier,
        staking_data: StakingRecord,
    },

    /// Overwrite each listed validator record
    UpsertValidatorData {
        validators: Vec<ValidatorRecord>,
    },

    Clear,
}
