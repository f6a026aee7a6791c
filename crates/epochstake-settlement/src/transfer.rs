//! Value transfer between participants and the pool.
//!
//! [`ValueTransfer`] is the seam to whatever actually moves tokens. Each
//! call either moves the full amount or moves nothing. [`InMemoryBank`] is
//! the in-process implementation: per-(participant, asset) wallets plus a
//! per-asset pool custody account.

use std::collections::HashMap;

use epochstake_types::{Asset, ParticipantId, TransferError};

/// Atomic debit/credit of principal and reward balances.
pub trait ValueTransfer {
    /// Move `amount` of `asset` from the participant into the pool.
    fn debit(
        &mut self,
        participant: ParticipantId,
        asset: Asset,
        amount: u128,
    ) -> Result<(), TransferError>;

    /// Move `amount` of `asset` from the pool to the participant.
    fn credit(
        &mut self,
        participant: ParticipantId,
        asset: Asset,
        amount: u128,
    ) -> Result<(), TransferError>;
}

/// In-memory wallets with pool custody.
///
/// `total_supply(asset)` is invariant under `debit`/`credit`; only
/// [`InMemoryBank::mint`] changes it.
#[derive(Debug, Clone, Default)]
pub struct InMemoryBank {
    /// Per-(participant, asset) wallet balances.
    wallets: HashMap<(ParticipantId, Asset), u128>,
    /// What the pool holds, per asset.
    custody: HashMap<Asset, u128>,
}

impl InMemoryBank {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create `amount` of `asset` in the participant's wallet.
    pub fn mint(&mut self, participant: ParticipantId, asset: Asset, amount: u128) {
        let entry = self.wallets.entry((participant, asset)).or_default();
        *entry = entry.saturating_add(amount);
    }

    #[must_use]
    pub fn balance(&self, participant: ParticipantId, asset: Asset) -> u128 {
        self.wallets
            .get(&(participant, asset))
            .copied()
            .unwrap_or(0)
    }

    /// What the pool currently holds of `asset`.
    #[must_use]
    pub fn custody(&self, asset: Asset) -> u128 {
        self.custody.get(&asset).copied().unwrap_or(0)
    }

    /// Wallets plus custody.
    #[must_use]
    pub fn total_supply(&self, asset: Asset) -> u128 {
        self.wallets
            .iter()
            .filter(|((_, a), _)| *a == asset)
            .fold(self.custody(asset), |acc, (_, v)| acc.saturating_add(*v))
    }
}

impl ValueTransfer for InMemoryBank {
    fn debit(
        &mut self,
        participant: ParticipantId,
        asset: Asset,
        amount: u128,
    ) -> Result<(), TransferError> {
        let available = self.balance(participant, asset);
        if available < amount {
            return Err(TransferError::InsufficientFunds {
                participant,
                asset,
                needed: amount,
                available,
            });
        }
        self.wallets.insert((participant, asset), available - amount);
        let held = self.custody.entry(asset).or_default();
        *held = held.saturating_add(amount);
        Ok(())
    }

    fn credit(
        &mut self,
        participant: ParticipantId,
        asset: Asset,
        amount: u128,
    ) -> Result<(), TransferError> {
        let held = self.custody(asset);
        if held < amount {
            return Err(TransferError::Rejected {
                reason: format!("pool custody holds {held} {asset}, cannot pay {amount}"),
            });
        }
        self.custody.insert(asset, held - amount);
        let entry = self.wallets.entry((participant, asset)).or_default();
        *entry = entry.saturating_add(amount);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debit_moves_into_custody() {
        let mut bank = InMemoryBank::new();
        let user = ParticipantId::new();
        bank.mint(user, Asset::Principal, 1000);
        bank.debit(user, Asset::Principal, 400).unwrap();
        assert_eq!(bank.balance(user, Asset::Principal), 600);
        assert_eq!(bank.custody(Asset::Principal), 400);
        assert_eq!(bank.total_supply(Asset::Principal), 1000);
    }

    #[test]
    fn debit_insufficient_fails_unchanged() {
        let mut bank = InMemoryBank::new();
        let user = ParticipantId::new();
        bank.mint(user, Asset::Principal, 100);
        let err = bank.debit(user, Asset::Principal, 200).unwrap_err();
        assert!(matches!(
            err,
            TransferError::InsufficientFunds {
                needed: 200,
                available: 100,
                ..
            }
        ));
        assert_eq!(bank.balance(user, Asset::Principal), 100);
        assert_eq!(bank.custody(Asset::Principal), 0);
    }

    #[test]
    fn credit_requires_custody() {
        let mut bank = InMemoryBank::new();
        let user = ParticipantId::new();
        let err = bank.credit(user, Asset::Reward, 1).unwrap_err();
        assert!(matches!(err, TransferError::Rejected { .. }));

        let treasury = ParticipantId::new();
        bank.mint(treasury, Asset::Reward, 50);
        bank.debit(treasury, Asset::Reward, 50).unwrap();
        bank.credit(user, Asset::Reward, 20).unwrap();
        assert_eq!(bank.balance(user, Asset::Reward), 20);
        assert_eq!(bank.custody(Asset::Reward), 30);
    }

    #[test]
    fn assets_are_independent() {
        let mut bank = InMemoryBank::new();
        let user = ParticipantId::new();
        bank.mint(user, Asset::Principal, 5);
        assert_eq!(bank.balance(user, Asset::Reward), 0);
        assert!(bank.debit(user, Asset::Reward, 1).is_err());
    }
}
