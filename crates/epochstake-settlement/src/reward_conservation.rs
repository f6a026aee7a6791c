//! Conservation invariant checker.
//!
//! Two invariants are enforced:
//! ```text
//! Σ principal(positions) == Σ deposits - Σ withdrawals
//! Σ owed(positions) + Σ credited <= Σ emitted <= Σ funded
//! ```
//!
//! The reward side is an inequality because accumulator truncation always
//! rounds against the participant; the difference stays in the pool.

use epochstake_types::{Result, StakeError};
use serde::{Deserialize, Serialize};

/// Running totals of everything that entered or left the pool.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardConservation {
    reward_funded: u128,
    reward_credited: u128,
    principal_deposited: u128,
    principal_withdrawn: u128,
}

impl RewardConservation {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_funding(&mut self, amount: u128) {
        self.reward_funded = self.reward_funded.saturating_add(amount);
    }

    pub fn record_reward_credit(&mut self, amount: u128) {
        self.reward_credited = self.reward_credited.saturating_add(amount);
    }

    pub fn record_deposit(&mut self, amount: u128) {
        self.principal_deposited = self.principal_deposited.saturating_add(amount);
    }

    pub fn record_withdrawal(&mut self, amount: u128) {
        self.principal_withdrawn = self.principal_withdrawn.saturating_add(amount);
    }

    #[must_use]
    pub fn reward_funded(&self) -> u128 {
        self.reward_funded
    }

    #[must_use]
    pub fn reward_credited(&self) -> u128 {
        self.reward_credited
    }

    /// Reward still held by the pool: funded minus credited.
    #[must_use]
    pub fn reward_balance(&self) -> u128 {
        self.reward_funded.saturating_sub(self.reward_credited)
    }

    /// Principal the pool should be holding: deposits minus withdrawals.
    #[must_use]
    pub fn expected_principal(&self) -> u128 {
        self.principal_deposited
            .saturating_sub(self.principal_withdrawn)
    }

    /// Verify the sum of staked principal matches deposits minus withdrawals.
    pub fn verify_principal(&self, actual: u128) -> Result<()> {
        let expected = self.expected_principal();
        if actual != expected {
            return Err(StakeError::PrincipalInvariantViolation {
                reason: format!(
                    "staked {actual} != expected {expected} \
                     (deposits={}, withdrawals={})",
                    self.principal_deposited, self.principal_withdrawn
                ),
            });
        }
        Ok(())
    }

    /// Verify outstanding plus paid reward never exceeds what was emitted,
    /// and emission never exceeds funding.
    pub fn verify_rewards(&self, outstanding: u128, emitted: u128) -> Result<()> {
        let owed_and_paid = outstanding.saturating_add(self.reward_credited);
        if owed_and_paid > emitted {
            return Err(StakeError::RewardInvariantViolation {
                reason: format!(
                    "outstanding {outstanding} + credited {} exceeds emitted {emitted}",
                    self.reward_credited
                ),
            });
        }
        if emitted > self.reward_funded {
            return Err(StakeError::RewardInvariantViolation {
                reason: format!(
                    "emitted {emitted} exceeds funded {}",
                    self.reward_funded
                ),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_is_balanced() {
        let rc = RewardConservation::new();
        assert!(rc.verify_principal(0).is_ok());
        assert!(rc.verify_rewards(0, 0).is_ok());
        assert_eq!(rc.reward_balance(), 0);
    }

    #[test]
    fn principal_tracks_deposits_and_withdrawals() {
        let mut rc = RewardConservation::new();
        rc.record_deposit(1000);
        rc.record_withdrawal(300);
        assert_eq!(rc.expected_principal(), 700);
        assert!(rc.verify_principal(700).is_ok());
        let err = rc.verify_principal(701).unwrap_err();
        assert!(matches!(err, StakeError::PrincipalInvariantViolation { .. }));
    }

    #[test]
    fn rounding_dust_is_allowed() {
        let mut rc = RewardConservation::new();
        rc.record_funding(1000);
        rc.record_reward_credit(400);
        // 599 outstanding, 1 unit of truncation stays in the pool.
        assert!(rc.verify_rewards(599, 1000).is_ok());
        assert_eq!(rc.reward_balance(), 600);
    }

    #[test]
    fn over_distribution_detected() {
        let mut rc = RewardConservation::new();
        rc.record_funding(1000);
        rc.record_reward_credit(600);
        let err = rc.verify_rewards(401, 1000).unwrap_err();
        assert!(matches!(err, StakeError::RewardInvariantViolation { .. }));
    }

    #[test]
    fn emission_beyond_funding_detected() {
        let mut rc = RewardConservation::new();
        rc.record_funding(100);
        assert!(rc.verify_rewards(0, 101).is_err());
    }
}
