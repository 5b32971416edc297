//! Portfolio staking state: store of staking and validator records

use anyhow::Result;
use imbl::HashMap;
use portfolio_common::{
    commands::StakingCommand,
    queries::staking::StakingStateSnapshot,
    staking::{StakingRecord, ValidatorAddress, ValidatorRecord},
    AccountSpecifier, LoadStatus,
};
use tracing::{debug, info};

#[derive(Default, Debug, Clone)]
pub struct State {
    /// Staking record per account, replaced wholesale on upsert
    by_account_specifier: HashMap<AccountSpecifier, StakingRecord>,

    /// Chain-wide validator records
    by_validator: HashMap<ValidatorAddress, ValidatorRecord>,

    // Staking data load status
    status: LoadStatus,

    // Validator data load status
    validator_status: LoadStatus,
}

impl State {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handle_command(&mut self, command: &StakingCommand) {
        match command {
            StakingCommand::SetStatus(status) => self.set_status(*status),
            StakingCommand::SetValidatorStatus(status) => self.set_validator_status(*status),
            StakingCommand::UpsertStakingData {
                account_specifier,
                staking_data,
            } => self.upsert_staking_data(account_specifier.clone(), staking_data.clone()),
            StakingCommand::UpsertValidatorData { validators } => {
                self.upsert_validator_data(validators)
            }
            StakingCommand::Clear => self.clear(),
        }
    }

    pub fn set_status(&mut self, status: LoadStatus) {
        self.status = status;
    }

    pub fn set_validator_status(&mut self, status: LoadStatus) {
        self.validator_status = status;
    }

    pub fn upsert_staking_data(
        &mut self,
        account_specifier: AccountSpecifier,
        staking_data: StakingRecord,
    ) {
        debug!(
            account = %account_specifier,
            delegations = staking_data.delegations.len(),
            undelegations = staking_data.undelegations.len(),
            redelegations = staking_data.redelegations.len(),
            rewards = staking_data.rewards.len(),
            "Upserting staking data"
        );
        self.by_account_specifier.insert(account_specifier, staking_data);
    }

    pub fn upsert_validator_data(&mut self, validators: &[ValidatorRecord]) {
        for validator in validators {
            self.by_validator.insert(validator.address.clone(), validator.clone());
        }
    }

    /// Back to the initial empty and idle state
    pub fn clear(&mut self) {
        *self = Self::new();
    }

    pub fn status(&self) -> LoadStatus {
        self.status
    }

    pub fn validator_status(&self) -> LoadStatus {
        self.validator_status
    }

    pub fn staking_record(&self, account_specifier: &AccountSpecifier) -> Option<&StakingRecord> {
        self.by_account_specifier.get(account_specifier)
    }

    pub fn validator(&self, validator_address: &str) -> Option<&ValidatorRecord> {
        self.by_validator.get(validator_address)
    }

    pub fn snapshot(&self) -> StakingStateSnapshot {
        StakingStateSnapshot {
            by_account_specifier: self
                .by_account_specifier
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            by_validator: self.by_validator.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
            status: self.status,
            validator_status: self.validator_status,
        }
    }

    pub async fn tick(&self) -> Result<()> {
        info!(
            accounts = self.by_account_specifier.len(),
            validators = self.by_validator.len(),
            status = ?self.status,
            validator_status = ?self.validator_status,
            "Staking state"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;

    #[test]
    fn new_state_is_empty_and_idle() {
        let state = State::new();
        assert_eq!(state.snapshot(), StakingStateSnapshot::default());
        assert_eq!(state.status(), LoadStatus::Idle);
        assert_eq!(state.validator_status(), LoadStatus::Idle);
    }

    #[test]
    fn set_status_leaves_validator_status_alone() {
        let mut state = State::new();
        for status in [LoadStatus::Loading, LoadStatus::Loaded, LoadStatus::Idle] {
            state.handle_command(&StakingCommand::SetStatus(status));
            assert_eq!(state.status(), status);
            assert_eq!(state.validator_status(), LoadStatus::Idle);
        }
    }

    #[test]
    fn set_validator_status_leaves_status_alone() {
        let mut state = State::new();
        for status in [LoadStatus::Loading, LoadStatus::Loaded, LoadStatus::Idle] {
            state.handle_command(&StakingCommand::SetValidatorStatus(status));
            assert_eq!(state.validator_status(), status);
            assert_eq!(state.status(), LoadStatus::Idle);
        }
    }

    #[test]
    fn upsert_staking_data_is_scoped_to_account() {
        let mut state = State::new();
        state.upsert_staking_data(cosmos_account_specifier(), mock_staking_data());

        assert_eq!(state.staking_record(&cosmos_account_specifier()), Some(&mock_staking_data()));
        assert!(state.staking_record(&other_cosmos_account_specifier()).is_none());
    }

    #[test]
    fn upsert_staking_data_replaces_whole_record() {
        let mut state = State::new();
        state.upsert_staking_data(cosmos_account_specifier(), mock_staking_data());
        state.upsert_staking_data(
            cosmos_account_specifier(),
            mock_staking_data_with_only_rewards(),
        );

        let record = state.staking_record(&cosmos_account_specifier()).unwrap();
        assert!(record.delegations.is_empty());
        assert_eq!(record, &mock_staking_data_with_only_rewards());
    }

    #[test]
    fn upsert_empty_staking_data_is_still_present() {
        let mut state = State::new();
        state.upsert_staking_data(other_cosmos_account_specifier(), empty_mock_staking_data());
        assert_eq!(
            state.staking_record(&other_cosmos_account_specifier()),
            Some(&StakingRecord::default())
        );
    }

    #[test]
    fn upsert_validator_data_overwrites_records() {
        let mut state = State::new();
        state.upsert_validator_data(&mock_validator_data());
        assert_eq!(state.snapshot().by_validator.len(), mock_validator_data().len());

        let mut updated = shapeshift_validator();
        updated.tokens = "999".to_string();
        updated.moniker = "Renamed".to_string();
        state.upsert_validator_data(&[updated.clone()]);

        assert_eq!(state.validator(SHAPESHIFT_VALIDATOR_ADDRESS), Some(&updated));
        assert_eq!(state.snapshot().by_validator.len(), mock_validator_data().len());
    }

    #[test]
    fn clear_resets_everything() {
        let mut state = State::new();
        state.handle_command(&StakingCommand::SetStatus(LoadStatus::Loaded));
        state.handle_command(&StakingCommand::SetValidatorStatus(LoadStatus::Loaded));
        state.handle_command(&StakingCommand::UpsertStakingData {
            account_specifier: cosmos_account_specifier(),
            staking_data: mock_staking_data(),
        });
        state.handle_command(&StakingCommand::UpsertValidatorData {
            validators: mock_validator_data(),
        });
        assert!(!state.snapshot().by_account_specifier.is_empty());

        state.handle_command(&StakingCommand::Clear);
        assert_eq!(state.snapshot(), StakingStateSnapshot::default());
    }
}
