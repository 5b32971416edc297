//! Derived staking values. Every selector is total: absent or not yet
//! loaded inputs give "0", an empty list or None, never an error.

use crate::state::State;
use portfolio_common::{
    amount,
    queries::staking::{BondingKind, OpportunityLineItem},
    staking::{StakingRecord, ValidatorAddress, ValidatorRecord},
    AccountSpecifier, AssetId,
};

pub fn staking_data_is_loaded(state: &State) -> bool {
    state.status().is_loaded()
}

pub fn validator_is_loaded(state: &State) -> bool {
    state.validator_status().is_loaded()
}

/// Validator data is chain-wide, the account only mirrors the other selectors' signature
pub fn single_validator(
    state: &State,
    _account_specifier: &AccountSpecifier,
    validator_address: &str,
) -> Option<ValidatorRecord> {
    if !validator_is_loaded(state) {
        return None;
    }
    state.validator(validator_address).cloned()
}

/// Amounts held against one validator in one asset, per bonding kind
struct Bondings<'a> {
    delegations: Vec<&'a str>,
    undelegations: Vec<&'a str>,
    redelegations: Vec<&'a str>,
    rewards: Vec<&'a str>,
}

impl<'a> Bondings<'a> {
    fn collect(record: &'a StakingRecord, validator_address: &str, asset_id: &AssetId) -> Self {
        let delegations = record
            .delegations
            .iter()
            .filter(|d| d.validator_address == validator_address && d.asset_id == *asset_id)
            .map(|d| d.amount.as_str())
            .collect();

        let undelegations = record
            .undelegations
            .iter()
            .filter(|u| u.validator_address == validator_address)
            .flat_map(|u| u.entries.iter())
            .filter(|entry| entry.asset_id == *asset_id)
            .map(|entry| entry.amount.as_str())
            .collect();

        // Only stake moving into the validator is bonded to it
        let redelegations = record
            .redelegations
            .iter()
            .filter(|r| r.destination_validator_address == validator_address)
            .flat_map(|r| r.entries.iter())
            .filter(|entry| entry.asset_id == *asset_id)
            .map(|entry| entry.amount.as_str())
            .collect();

        let rewards = record
            .rewards
            .iter()
            .filter(|r| r.validator_address == validator_address)
            .flat_map(|r| r.rewards.iter())
            .filter(|reward| reward.asset_id == *asset_id)
            .map(|reward| reward.amount.as_str())
            .collect();

        Self {
            delegations,
            undelegations,
            redelegations,
            rewards,
        }
    }

    fn by_kind(self) -> [(BondingKind, Vec<&'a str>); 4] {
        [
            (BondingKind::Delegation, self.delegations),
            (BondingKind::Undelegation, self.undelegations),
            (BondingKind::Redelegation, self.redelegations),
            (BondingKind::Reward, self.rewards),
        ]
    }
}

/// Delegated, undelegating, redelegating-in and reward amounts for
/// one validator and asset
pub fn total_bondings_balance(
    state: &State,
    account_specifier: &AccountSpecifier,
    validator_address: &str,
    asset_id: &AssetId,
) -> String {
    if !staking_data_is_loaded(state) {
        return "0".to_string();
    }
    let Some(record) = state.staking_record(account_specifier) else {
        return "0".to_string();
    };
    let bondings = Bondings::collect(record, validator_address, asset_id);
    amount::sum(bondings.by_kind().into_iter().flat_map(|(_, amounts)| amounts))
}

/// Delegations only, across every validator
pub fn total_staking_delegation_crypto_by_account_specifier(
    state: &State,
    account_specifier: &AccountSpecifier,
) -> String {
    if !staking_data_is_loaded(state) {
        return "0".to_string();
    }
    let Some(record) = state.staking_record(account_specifier) else {
        return "0".to_string();
    };
    amount::sum(record.delegations.iter().map(|d| d.amount.as_str()))
}

/// One line item per bonding kind that has any entry, in the order
/// delegations, undelegations, redelegations, rewards. Empty unless both
/// kinds of data are loaded and the account's staking record and the
/// validator's record are present.
pub fn active_staking_opportunity_data_by_asset_id(
    state: &State,
    account_specifier: &AccountSpecifier,
    validator_address: &str,
    asset_id: &AssetId,
) -> Vec<OpportunityLineItem> {
    if !staking_data_is_loaded(state) || !validator_is_loaded(state) {
        return Vec::new();
    }
    let (Some(record), Some(validator)) =
        (state.staking_record(account_specifier), state.validator(validator_address))
    else {
        return Vec::new();
    };

    Bondings::collect(record, validator_address, asset_id)
        .by_kind()
        .into_iter()
        .filter(|(_, amounts)| !amounts.is_empty())
        .map(|(kind, amounts)| OpportunityLineItem {
            kind,
            validator: validator.clone(),
            asset_id: asset_id.clone(),
            amount: amount::sum(amounts.iter().copied()),
            entries: amounts.len(),
        })
        .collect()
}

/// Every validator the account's staking record refers to, first seen first.
/// Not gated on the load status, a refetch in flight still knows its validators.
pub fn validator_addresses(
    state: &State,
    account_specifier: &AccountSpecifier,
) -> Vec<ValidatorAddress> {
    let Some(record) = state.staking_record(account_specifier) else {
        return Vec::new();
    };

    let referenced = record
        .delegations
        .iter()
        .map(|d| &d.validator_address)
        .chain(record.undelegations.iter().map(|u| &u.validator_address))
        .chain(record.redelegations.iter().flat_map(|r| {
            [&r.source_validator_address, &r.destination_validator_address]
        }))
        .chain(record.rewards.iter().map(|r| &r.validator_address));

    let mut addresses: Vec<ValidatorAddress> = Vec::new();
    for address in referenced {
        if !addresses.contains(address) {
            addresses.push(address.clone());
        }
    }
    addresses
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;
    use portfolio_common::{commands::StakingCommand, LoadStatus};

    fn loaded_state(staking_data: StakingRecord) -> State {
        let mut state = State::new();
        state.set_status(LoadStatus::Loaded);
        state.set_validator_status(LoadStatus::Loaded);
        state.upsert_validator_data(&mock_validator_data());
        state.upsert_staking_data(cosmos_account_specifier(), staking_data);
        state
    }

    /// Both records present, statuses as given
    fn state_with_status(status: LoadStatus, validator_status: LoadStatus) -> State {
        let mut state = loaded_state(mock_staking_data());
        state.set_status(status);
        state.set_validator_status(validator_status);
        state
    }

    #[test]
    fn opportunities_empty_on_initial_state() {
        let state = State::new();
        assert!(active_staking_opportunity_data_by_asset_id(
            &state,
            &cosmos_account_specifier(),
            SHAPESHIFT_VALIDATOR_ADDRESS,
            &cosmos_asset_id(),
        )
        .is_empty());
    }

    #[test]
    fn opportunities_empty_when_validators_missing() {
        let mut state = State::new();
        state.set_status(LoadStatus::Loaded);
        state.set_validator_status(LoadStatus::Loaded);
        state.upsert_staking_data(cosmos_account_specifier(), mock_staking_data());
        assert!(active_staking_opportunity_data_by_asset_id(
            &state,
            &cosmos_account_specifier(),
            SHAPESHIFT_VALIDATOR_ADDRESS,
            &cosmos_asset_id(),
        )
        .is_empty());
    }

    #[test]
    fn opportunities_empty_when_staking_data_missing() {
        let mut state = State::new();
        state.set_status(LoadStatus::Loaded);
        state.set_validator_status(LoadStatus::Loaded);
        state.upsert_validator_data(&mock_validator_data());
        assert!(active_staking_opportunity_data_by_asset_id(
            &state,
            &cosmos_account_specifier(),
            SHAPESHIFT_VALIDATOR_ADDRESS,
            &cosmos_asset_id(),
        )
        .is_empty());
    }

    #[test]
    fn opportunities_for_every_category_in_order() {
        let state = loaded_state(mock_staking_data_with_all_categories());
        let items = active_staking_opportunity_data_by_asset_id(
            &state,
            &cosmos_account_specifier(),
            SHAPESHIFT_VALIDATOR_ADDRESS,
            &cosmos_asset_id(),
        );

        let summary: Vec<(BondingKind, &str, usize)> =
            items.iter().map(|i| (i.kind, i.amount.as_str(), i.entries)).collect();
        assert_eq!(
            summary,
            vec![
                (BondingKind::Delegation, "10000", 1),
                (BondingKind::Undelegation, "300", 2),
                (BondingKind::Redelegation, "300", 1),
                (BondingKind::Reward, "115", 1),
            ]
        );
        assert!(items.iter().all(|i| i.validator == shapeshift_validator()));
    }

    #[test]
    fn opportunities_with_only_undelegations() {
        let state = loaded_state(mock_staking_data_with_only_undelegations());
        let items = active_staking_opportunity_data_by_asset_id(
            &state,
            &cosmos_account_specifier(),
            SHAPESHIFT_VALIDATOR_ADDRESS,
            &cosmos_asset_id(),
        );
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].kind, BondingKind::Undelegation);
        assert_eq!(items[0].amount, "250");
    }

    #[test]
    fn opportunities_with_only_rewards() {
        let state = loaded_state(mock_staking_data_with_only_rewards());
        let items = active_staking_opportunity_data_by_asset_id(
            &state,
            &cosmos_account_specifier(),
            SHAPESHIFT_VALIDATOR_ADDRESS,
            &cosmos_asset_id(),
        );
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].kind, BondingKind::Reward);
        assert_eq!(items[0].amount, "115");
    }

    #[test]
    fn zero_amount_redelegation_still_listed() {
        let state = loaded_state(mock_staking_data_with_zero_redelegation());
        let items = active_staking_opportunity_data_by_asset_id(
            &state,
            &cosmos_account_specifier(),
            SHAPESHIFT_VALIDATOR_ADDRESS,
            &cosmos_asset_id(),
        );
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].kind, BondingKind::Redelegation);
        assert_eq!(items[0].amount, "0");
    }

    #[test]
    fn opportunities_empty_for_empty_record() {
        let state = loaded_state(empty_mock_staking_data());
        assert!(active_staking_opportunity_data_by_asset_id(
            &state,
            &cosmos_account_specifier(),
            SHAPESHIFT_VALIDATOR_ADDRESS,
            &cosmos_asset_id(),
        )
        .is_empty());
    }

    #[test]
    fn single_validator_lookup() {
        let state = State::new();
        assert_eq!(
            single_validator(&state, &cosmos_account_specifier(), SHAPESHIFT_VALIDATOR_ADDRESS),
            None
        );

        let state = loaded_state(mock_staking_data());
        assert_eq!(
            single_validator(&state, &cosmos_account_specifier(), UNKNOWN_VALIDATOR_ADDRESS),
            None
        );
        assert_eq!(
            single_validator(&state, &cosmos_account_specifier(), SHAPESHIFT_VALIDATOR_ADDRESS),
            Some(ValidatorRecord {
                address: "cosmosvaloper199mlc7fr6ll5t54w7tts7f4s0cvnqgc59nmuxf".to_string(),
                tokens: "111116".to_string(),
                apr: "0.1496681491".to_string(),
                commission: "0.100000000000000000".to_string(),
                moniker: "ShapeShift DAO".to_string(),
            })
        );
        // Keyed by validator only
        assert!(single_validator(
            &state,
            &other_cosmos_account_specifier(),
            SHAPESHIFT_VALIDATOR_ADDRESS
        )
        .is_some());
    }

    #[test]
    fn total_bondings_zero_on_initial_state() {
        let state = State::new();
        assert_eq!(
            total_bondings_balance(
                &state,
                &cosmos_account_specifier(),
                SHAPESHIFT_VALIDATOR_ADDRESS,
                &cosmos_asset_id()
            ),
            "0"
        );
    }

    #[test]
    fn total_bondings_includes_rewards() {
        let state = loaded_state(mock_staking_data());
        assert_eq!(
            total_bondings_balance(
                &state,
                &cosmos_account_specifier(),
                SHAPESHIFT_VALIDATOR_ADDRESS,
                &cosmos_asset_id()
            ),
            "10115"
        );
        assert_eq!(
            total_bondings_balance(
                &state,
                &cosmos_account_specifier(),
                REWARDS_ONLY_VALIDATOR_ADDRESS,
                &cosmos_asset_id()
            ),
            "4"
        );
        assert_eq!(
            total_bondings_balance(
                &state,
                &cosmos_account_specifier(),
                UNKNOWN_VALIDATOR_ADDRESS,
                &cosmos_asset_id()
            ),
            "0"
        );
        assert_eq!(
            total_bondings_balance(
                &state,
                &cosmos_account_specifier(),
                SHAPESHIFT_VALIDATOR_ADDRESS,
                &osmosis_asset_id()
            ),
            "999"
        );
    }

    #[test]
    fn total_bondings_counts_only_redelegations_in() {
        let state = loaded_state(mock_staking_data_with_all_categories());
        assert_eq!(
            total_bondings_balance(
                &state,
                &cosmos_account_specifier(),
                SHAPESHIFT_VALIDATOR_ADDRESS,
                &cosmos_asset_id()
            ),
            "10715"
        );
        // The redelegation source keeps nothing from the moved stake
        assert_eq!(
            total_bondings_balance(
                &state,
                &cosmos_account_specifier(),
                REWARDS_ONLY_VALIDATOR_ADDRESS,
                &cosmos_asset_id()
            ),
            "0"
        );
    }

    #[test]
    fn total_delegation_across_validators() {
        let state = State::new();
        assert_eq!(
            total_staking_delegation_crypto_by_account_specifier(
                &state,
                &cosmos_account_specifier()
            ),
            "0"
        );

        let state = loaded_state(mock_staking_data());
        assert_eq!(
            total_staking_delegation_crypto_by_account_specifier(
                &state,
                &cosmos_account_specifier()
            ),
            "15019"
        );
        assert_eq!(
            total_staking_delegation_crypto_by_account_specifier(
                &state,
                &other_cosmos_account_specifier()
            ),
            "0"
        );
    }

    #[test]
    fn repeated_upsert_gives_same_outputs() {
        let mut state = loaded_state(mock_staking_data());
        let before = (
            total_bondings_balance(
                &state,
                &cosmos_account_specifier(),
                SHAPESHIFT_VALIDATOR_ADDRESS,
                &cosmos_asset_id(),
            ),
            total_staking_delegation_crypto_by_account_specifier(
                &state,
                &cosmos_account_specifier(),
            ),
        );
        state.upsert_staking_data(cosmos_account_specifier(), mock_staking_data());
        let after = (
            total_bondings_balance(
                &state,
                &cosmos_account_specifier(),
                SHAPESHIFT_VALIDATOR_ADDRESS,
                &cosmos_asset_id(),
            ),
            total_staking_delegation_crypto_by_account_specifier(
                &state,
                &cosmos_account_specifier(),
            ),
        );
        assert_eq!(before, after);
    }

    #[test]
    fn selectors_reset_after_clear() {
        let mut state = loaded_state(mock_staking_data());
        state.handle_command(&StakingCommand::Clear);
        assert_eq!(
            total_bondings_balance(
                &state,
                &cosmos_account_specifier(),
                SHAPESHIFT_VALIDATOR_ADDRESS,
                &cosmos_asset_id()
            ),
            "0"
        );
        assert!(validator_addresses(&state, &cosmos_account_specifier()).is_empty());
    }

    #[test]
    fn loaded_flags_follow_status() {
        let mut state = State::new();
        assert!(!staking_data_is_loaded(&state));
        assert!(!validator_is_loaded(&state));

        state.set_status(LoadStatus::Loading);
        state.set_validator_status(LoadStatus::Loading);
        assert!(!staking_data_is_loaded(&state));
        assert!(!validator_is_loaded(&state));

        state.set_status(LoadStatus::Loaded);
        assert!(staking_data_is_loaded(&state));
        assert!(!validator_is_loaded(&state));

        state.set_validator_status(LoadStatus::Loaded);
        assert!(validator_is_loaded(&state));
    }

    #[test]
    fn validator_addresses_deduplicated_in_order() {
        let state = loaded_state(mock_staking_data_with_all_categories());
        assert_eq!(
            validator_addresses(&state, &cosmos_account_specifier()),
            vec![
                SHAPESHIFT_VALIDATOR_ADDRESS.to_string(),
                REWARDS_ONLY_VALIDATOR_ADDRESS.to_string(),
            ]
        );

        let state = loaded_state(mock_staking_data());
        assert_eq!(
            validator_addresses(&state, &cosmos_account_specifier()),
            vec![
                SHAPESHIFT_VALIDATOR_ADDRESS.to_string(),
                LARGE_VALIDATOR_ADDRESS.to_string(),
                REWARDS_ONLY_VALIDATOR_ADDRESS.to_string(),
            ]
        );
    }

    #[test]
    fn totals_zero_while_staking_data_not_loaded() {
        for status in [LoadStatus::Idle, LoadStatus::Loading] {
            let state = state_with_status(status, LoadStatus::Loaded);
            assert_eq!(
                total_bondings_balance(
                    &state,
                    &cosmos_account_specifier(),
                    SHAPESHIFT_VALIDATOR_ADDRESS,
                    &cosmos_asset_id()
                ),
                "0"
            );
            assert_eq!(
                total_staking_delegation_crypto_by_account_specifier(
                    &state,
                    &cosmos_account_specifier()
                ),
                "0"
            );
        }
    }

    #[test]
    fn opportunities_need_both_statuses_loaded() {
        let opportunities = |state: &State| {
            active_staking_opportunity_data_by_asset_id(
                state,
                &cosmos_account_specifier(),
                SHAPESHIFT_VALIDATOR_ADDRESS,
                &cosmos_asset_id(),
            )
        };

        assert!(opportunities(&state_with_status(LoadStatus::Loading, LoadStatus::Loaded))
            .is_empty());
        assert!(opportunities(&state_with_status(LoadStatus::Loaded, LoadStatus::Loading))
            .is_empty());
        assert!(opportunities(&state_with_status(LoadStatus::Idle, LoadStatus::Idle)).is_empty());
        assert!(!opportunities(&state_with_status(LoadStatus::Loaded, LoadStatus::Loaded))
            .is_empty());
    }

    #[test]
    fn single_validator_absent_until_validators_loaded() {
        let state = state_with_status(LoadStatus::Loaded, LoadStatus::Loading);
        assert_eq!(
            single_validator(&state, &cosmos_account_specifier(), SHAPESHIFT_VALIDATOR_ADDRESS),
            None
        );
    }

    #[test]
    fn totals_zero_when_loaded_but_account_absent() {
        let mut state = State::new();
        state.set_status(LoadStatus::Loaded);
        state.set_validator_status(LoadStatus::Loaded);
        state.upsert_validator_data(&mock_validator_data());
        assert_eq!(
            total_bondings_balance(
                &state,
                &cosmos_account_specifier(),
                SHAPESHIFT_VALIDATOR_ADDRESS,
                &cosmos_asset_id()
            ),
            "0"
        );
        assert_eq!(
            total_staking_delegation_crypto_by_account_specifier(
                &state,
                &cosmos_account_specifier()
            ),
            "0"
        );
    }

    #[test]
    fn validator_addresses_known_while_refetching() {
        let state = state_with_status(LoadStatus::Loading, LoadStatus::Loaded);
        assert_eq!(validator_addresses(&state, &cosmos_account_specifier()).len(), 3);
    }
}
