use portfolio_common::{
    staking::{
        Delegation, Redelegation, RedelegationEntry, RewardEntry, StakingRecord, Undelegation,
        UndelegationEntry, ValidatorRecord, ValidatorRewards,
    },
    AccountSpecifier, AssetId,
};
use std::str::FromStr;

pub const SHAPESHIFT_VALIDATOR_ADDRESS: &str =
    "cosmosvaloper199mlc7fr6ll5t54w7tts7f4s0cvnqgc59nmuxf";
pub const REWARDS_ONLY_VALIDATOR_ADDRESS: &str =
    "cosmosvaloper1qtxec3ggeuwnca9mmngw7vf6ctw54cppey02fs";
pub const LARGE_VALIDATOR_ADDRESS: &str = "cosmosvaloper156gqf9837u7d4c4678yt3rl4ls9c5vuursrrzf";
pub const UNKNOWN_VALIDATOR_ADDRESS: &str = "cosmosvaloper1xxjvzwjpsf6ktuffkcpx29ut9qfrn0my8xdtqd";

pub fn cosmos_asset_id() -> AssetId {
    AssetId::from_str("cosmos:cosmoshub-4/slip44:118").unwrap()
}

pub fn osmosis_asset_id() -> AssetId {
    AssetId::from_str("cosmos:osmosis-1/slip44:118").unwrap()
}

pub fn cosmos_account_specifier() -> AccountSpecifier {
    AccountSpecifier::from_str(
        "cosmos:cosmoshub-4:cosmos1wc4rv7dv8lafv38s50pfp5qsgv7eknetyml669",
    )
    .unwrap()
}

pub fn other_cosmos_account_specifier() -> AccountSpecifier {
    AccountSpecifier::from_str(
        "cosmos:cosmoshub-4:cosmos1j26n3mjpwx4f7zz65tzq3mygcr74wp7kcwcner",
    )
    .unwrap()
}

fn delegation(validator_address: &str, amount: &str) -> Delegation {
    Delegation {
        validator_address: validator_address.to_string(),
        asset_id: cosmos_asset_id(),
        amount: amount.to_string(),
    }
}

fn reward(asset_id: AssetId, amount: &str) -> RewardEntry {
    RewardEntry {
        asset_id,
        amount: amount.to_string(),
    }
}

fn undelegation_entry(amount: &str, completion_time: u64) -> UndelegationEntry {
    UndelegationEntry {
        asset_id: cosmos_asset_id(),
        completion_time,
        amount: amount.to_string(),
    }
}

fn redelegation_into_shapeshift(amount: &str) -> Redelegation {
    Redelegation {
        source_validator_address: REWARDS_ONLY_VALIDATOR_ADDRESS.to_string(),
        destination_validator_address: SHAPESHIFT_VALIDATOR_ADDRESS.to_string(),
        entries: vec![RedelegationEntry {
            asset_id: cosmos_asset_id(),
            completion_time: 1_700_000_000,
            amount: amount.to_string(),
        }],
    }
}

/// Delegations to two validators, rewards from the first in two assets and
/// rewards from a validator with no delegation
pub fn mock_staking_data() -> StakingRecord {
    StakingRecord {
        delegations: vec![
            delegation(SHAPESHIFT_VALIDATOR_ADDRESS, "10000"),
            delegation(LARGE_VALIDATOR_ADDRESS, "5019"),
        ],
        undelegations: vec![],
        redelegations: vec![],
        rewards: vec![
            ValidatorRewards {
                validator_address: SHAPESHIFT_VALIDATOR_ADDRESS.to_string(),
                rewards: vec![reward(cosmos_asset_id(), "115"), reward(osmosis_asset_id(), "999")],
            },
            ValidatorRewards {
                validator_address: REWARDS_ONLY_VALIDATOR_ADDRESS.to_string(),
                rewards: vec![reward(cosmos_asset_id(), "4")],
            },
        ],
    }
}

pub fn mock_staking_data_with_all_categories() -> StakingRecord {
    StakingRecord {
        delegations: vec![delegation(SHAPESHIFT_VALIDATOR_ADDRESS, "10000")],
        undelegations: vec![Undelegation {
            validator_address: SHAPESHIFT_VALIDATOR_ADDRESS.to_string(),
            entries: vec![
                undelegation_entry("250", 1_700_000_000),
                undelegation_entry("50", 1_700_086_400),
            ],
        }],
        redelegations: vec![redelegation_into_shapeshift("300")],
        rewards: vec![ValidatorRewards {
            validator_address: SHAPESHIFT_VALIDATOR_ADDRESS.to_string(),
            rewards: vec![reward(cosmos_asset_id(), "115")],
        }],
    }
}

pub fn mock_staking_data_with_only_undelegations() -> StakingRecord {
    StakingRecord {
        undelegations: vec![Undelegation {
            validator_address: SHAPESHIFT_VALIDATOR_ADDRESS.to_string(),
            entries: vec![undelegation_entry("250", 1_700_000_000)],
        }],
        ..StakingRecord::default()
    }
}

pub fn mock_staking_data_with_only_rewards() -> StakingRecord {
    StakingRecord {
        rewards: vec![ValidatorRewards {
            validator_address: SHAPESHIFT_VALIDATOR_ADDRESS.to_string(),
            rewards: vec![reward(cosmos_asset_id(), "115")],
        }],
        ..StakingRecord::default()
    }
}

pub fn mock_staking_data_with_zero_redelegation() -> StakingRecord {
    StakingRecord {
        redelegations: vec![redelegation_into_shapeshift("0")],
        ..StakingRecord::default()
    }
}

pub fn empty_mock_staking_data() -> StakingRecord {
    StakingRecord::default()
}

pub fn shapeshift_validator() -> ValidatorRecord {
    ValidatorRecord {
        address: SHAPESHIFT_VALIDATOR_ADDRESS.to_string(),
        tokens: "111116".to_string(),
        apr: "0.1496681491".to_string(),
        commission: "0.100000000000000000".to_string(),
        moniker: "ShapeShift DAO".to_string(),
    }
}

pub fn mock_validator_data() -> Vec<ValidatorRecord> {
    vec![
        shapeshift_validator(),
        ValidatorRecord {
            address: REWARDS_ONLY_VALIDATOR_ADDRESS.to_string(),
            tokens: "5000000".to_string(),
            apr: "0.1398020187".to_string(),
            commission: "0.050000000000000000".to_string(),
            moniker: "Rewards Only".to_string(),
        },
        ValidatorRecord {
            address: LARGE_VALIDATOR_ADDRESS.to_string(),
            tokens: "90000000000".to_string(),
            apr: "0.1412575423".to_string(),
            commission: "0.080000000000000000".to_string(),
            moniker: "Large Validator".to_string(),
        },
    ]
}
