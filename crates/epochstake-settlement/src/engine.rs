//! Settlement engine — deposit, withdraw, renew, claim.
//!
//! Every mutating operation runs the same prologue:
//! 1. Close the open epoch if its end has passed (pin the accumulator at
//!    the boundary, record the snapshot)
//! 2. Advance the accumulator to `min(now, epoch.end)`
//! 3. Stage the participant's new position on a copy
//! 4. Call the value-transfer collaborator
//! 5. Commit the staged position and pool counters
//!
//! Steps 1–2 persist even when a later step fails: they record elapsed
//! time, not the caller's action. A failure in steps 3–4 leaves the
//! caller's position and balances exactly as they were.
//!
//! ## Catch-up
//!
//! Owed reward is `principal * (acc_share - checkpoint_acc_share) / SCALE`
//! for current and stale positions alike. The accumulator never resets at
//! an epoch boundary, so no closed snapshot is read on the settlement path.

use epochstake_ledger::{AccrualEngine, Clock, EpochLedger, ParticipantRegistry, WindowLimits};
use epochstake_types::{
    Asset, ClosedEpochSnapshot, Epoch, EpochId, EpochWindow, ParticipantId, ParticipantPosition,
    PoolConfig, PoolRow, PositionStatus, Result, Settlement, SettlementKind, StakeError,
    Timestamp, constants,
};

use crate::reward_conservation::RewardConservation;
use crate::state::PersistedState;
use crate::transfer::ValueTransfer;
use crate::withdraw_lock::WithdrawLock;

/// The pool's single state machine.
///
/// All methods take `&mut self`; wrap in [`crate::SharedEngine`] to share
/// across threads.
pub struct SettlementEngine<C, T> {
    config: PoolConfig,
    clock: C,
    transfer: T,
    ledger: EpochLedger,
    accrual: AccrualEngine,
    registry: ParticipantRegistry,
    conservation: RewardConservation,
    total_participants: u64,
    version: u64,
}

impl<C: Clock, T: ValueTransfer> SettlementEngine<C, T> {
    /// Create an empty pool.
    pub fn new(config: PoolConfig, clock: C, transfer: T) -> Result<Self> {
        config.validate()?;
        tracing::info!(
            engine = constants::ENGINE_NAME,
            version = constants::VERSION,
            treasury = %config.treasury,
            min_deposit = config.min_deposit,
            "Pool created"
        );
        Ok(Self {
            config,
            clock,
            transfer,
            ledger: EpochLedger::new(),
            accrual: AccrualEngine::new(),
            registry: ParticipantRegistry::new(),
            conservation: RewardConservation::new(),
            total_participants: 0,
            version: 0,
        })
    }

    /// Rebuild a pool from persisted state.
    ///
    /// The snapshot chain is re-verified and the pool row is cross-checked
    /// against the epoch and position tables.
    pub fn restore(config: PoolConfig, clock: C, transfer: T, state: PersistedState) -> Result<Self> {
        config.validate()?;
        let ledger = EpochLedger::from_parts(state.epochs, state.snapshots)?;
        if ledger.current_epoch_id() != state.pool.current_epoch_id {
            return Err(StakeError::Internal(format!(
                "pool row at {} but epoch table ends at {}",
                state.pool.current_epoch_id,
                ledger.current_epoch_id()
            )));
        }

        let registry: ParticipantRegistry = state.positions.into_iter().collect();
        if registry.total_principal() != state.pool.total_principal_active_epoch {
            return Err(StakeError::PrincipalInvariantViolation {
                reason: format!(
                    "positions hold {} but pool row records {}",
                    registry.total_principal(),
                    state.pool.total_principal_active_epoch
                ),
            });
        }
        state.totals.verify_principal(registry.total_principal())?;

        if let Some(last) = ledger.snapshots().last() {
            if state.pool.acc_share < last.acc_share_at_close {
                return Err(StakeError::RewardInvariantViolation {
                    reason: format!(
                        "pool accumulator {} behind {} close value {}",
                        state.pool.acc_share, last.epoch_id, last.acc_share_at_close
                    ),
                });
            }
            if state.pool.last_accrual_time < last.end_time {
                return Err(StakeError::Internal(format!(
                    "last accrual {} precedes end of closed {} at {}",
                    state.pool.last_accrual_time, last.epoch_id, last.end_time
                )));
            }
        }

        let accrual = AccrualEngine::from_parts(
            state.pool.acc_share,
            state.pool.last_accrual_time,
            state.pool.total_principal_active_epoch,
            state.reward_emitted_in_epoch,
            state.reward_emitted_total,
        );

        tracing::info!(
            epoch = %ledger.current_epoch_id(),
            positions = registry.len(),
            version = state.pool.version,
            "Pool restored"
        );

        Ok(Self {
            config,
            clock,
            transfer,
            ledger,
            accrual,
            registry,
            conservation: state.totals,
            total_participants: state.pool.total_participants,
            version: state.pool.version,
        })
    }

    fn limits(&self) -> WindowLimits {
        WindowLimits {
            max_epoch_duration_secs: self.config.max_epoch_duration_secs,
            max_lock_duration_secs: self.config.max_lock_duration_secs,
        }
    }

    // -----------------------------------------------------------------
    // Prologue
    // -----------------------------------------------------------------

    /// Close the open epoch if `now` has reached its end.
    ///
    /// The only place an epoch is ever closed.
    fn close_if_elapsed(&mut self, now: Timestamp) -> Result<Option<EpochId>> {
        let Some(epoch) = self.ledger.elapsed_epoch(now).cloned() else {
            return Ok(None);
        };

        self.accrual.advance(now, &epoch)?;
        let emitted = self.accrual.take_epoch_emitted();
        self.ledger
            .record_close(self.accrual.acc_share(), emitted, now)?;
        self.version += 1;
        Ok(Some(epoch.id))
    }

    /// Close-if-elapsed, then advance the accumulator.
    fn sync(&mut self, now: Timestamp) -> Result<()> {
        self.close_if_elapsed(now)?;
        if let Some(epoch) = self.ledger.active_epoch().cloned() {
            let step = self.accrual.advance(now, &epoch)?;
            if step.elapsed_secs > 0 {
                self.version += 1;
            }
        }
        Ok(())
    }

    fn require_active(&self) -> Result<Epoch> {
        self.ledger
            .active_epoch()
            .cloned()
            .ok_or(StakeError::NoActiveEpoch)
    }

    /// Pay out everything owed on a staged position and move its
    /// checkpoint to the current accumulator and epoch.
    fn stage_settlement(
        position: &mut ParticipantPosition,
        acc_share: u128,
        epoch_id: EpochId,
    ) -> Result<u128> {
        let owed = position.owed(acc_share)?;
        position.unclaimed_reward = 0;
        position.checkpoint_acc_share = acc_share;
        position.checkpoint_epoch_id = epoch_id;
        position.total_claimed = position.total_claimed.saturating_add(owed);
        Ok(owed)
    }

    // -----------------------------------------------------------------
    // Operations
    // -----------------------------------------------------------------

    /// Fund and open the next epoch.
    ///
    /// The previous epoch must have ended; if it ended but was not yet
    /// closed, it is closed here first. The reward budget is debited from
    /// the configured treasury.
    pub fn open_epoch(
        &mut self,
        funded_reward: u128,
        start_time: Timestamp,
        end_time: Timestamp,
        lock_duration_secs: u64,
    ) -> Result<EpochId> {
        let now = self.clock.now();
        self.sync(now)?;

        let window = EpochWindow::new(funded_reward, start_time, end_time, lock_duration_secs);
        self.ledger.validate_window(&window, now, self.limits())?;

        if funded_reward > 0 {
            self.transfer
                .debit(self.config.treasury, Asset::Reward, funded_reward)?;
        }

        let epoch = self.ledger.open(&window)?;
        let (epoch_id, rate) = (epoch.id, epoch.payout_rate_per_second);
        self.accrual.begin_epoch(now);
        self.conservation.record_funding(funded_reward);
        self.version += 1;

        tracing::info!(
            epoch = %epoch_id,
            funded = funded_reward,
            rate,
            start = %start_time,
            end = %end_time,
            lock_secs = lock_duration_secs,
            "Epoch opened"
        );
        Ok(epoch_id)
    }

    /// Stake `amount` of principal.
    pub fn deposit(&mut self, participant: ParticipantId, amount: u128) -> Result<Settlement> {
        let now = self.clock.now();
        self.sync(now)?;

        let epoch = self.require_active()?;
        if !epoch.accepts_deposits(now) {
            return Err(StakeError::NoActiveEpoch);
        }
        if amount < self.config.min_deposit {
            return Err(StakeError::InvalidAmount {
                amount,
                reason: format!("minimum deposit is {}", self.config.min_deposit),
            });
        }

        let mut position = self.registry.position(participant);
        if position.principal > 0 && position.is_stale(epoch.id) {
            tracing::warn!(
                participant = %participant,
                checkpoint = %position.checkpoint_epoch_id,
                current = %epoch.id,
                "Deposit rejected: stale position"
            );
            return Err(StakeError::StalePosition {
                checkpoint: position.checkpoint_epoch_id,
                current: epoch.id,
            });
        }

        let acc_share = self.accrual.acc_share();
        let first_principal = position.principal == 0;
        if first_principal {
            position.checkpoint_acc_share = acc_share;
            position.checkpoint_epoch_id = epoch.id;
        } else {
            // New principal must not earn retroactively.
            position.unclaimed_reward = position.owed(acc_share)?;
            position.checkpoint_acc_share = acc_share;
        }
        position.principal =
            position
                .principal
                .checked_add(amount)
                .ok_or(StakeError::ArithmeticOverflow {
                    context: "position principal",
                })?;
        position.last_deposit_time = now;
        position.lock_epoch_id = epoch.id;

        if self.accrual.total_principal().checked_add(amount).is_none() {
            return Err(StakeError::ArithmeticOverflow {
                context: "total principal",
            });
        }

        self.transfer.debit(participant, Asset::Principal, amount)?;

        self.accrual.add_principal(amount)?;
        if first_principal {
            self.total_participants += 1;
        }
        let principal_after = position.principal;
        self.registry.upsert(participant, position);
        self.conservation.record_deposit(amount);
        self.version += 1;

        tracing::info!(
            participant = %participant,
            epoch = %epoch.id,
            amount,
            principal = principal_after,
            "Deposit settled"
        );

        Ok(Settlement {
            kind: SettlementKind::Deposit,
            participant,
            epoch_id: epoch.id,
            reward_paid: 0,
            principal_moved: amount,
            principal_after,
            settled_at: now,
        })
    }

    /// Pay out owed reward without touching principal or the lock timer.
    pub fn claim(&mut self, participant: ParticipantId) -> Result<Settlement> {
        let now = self.clock.now();
        self.sync(now)?;
        let epoch = self.require_active()?;

        if !self.registry.contains(participant) {
            return Ok(Settlement {
                kind: SettlementKind::Claim,
                participant,
                epoch_id: epoch.id,
                reward_paid: 0,
                principal_moved: 0,
                principal_after: 0,
                settled_at: now,
            });
        }

        let mut position = self.registry.position(participant);
        let owed = Self::stage_settlement(&mut position, self.accrual.acc_share(), epoch.id)?;

        if owed > 0 {
            self.transfer.credit(participant, Asset::Reward, owed)?;
        }

        let principal_after = position.principal;
        self.registry.upsert(participant, position);
        self.conservation.record_reward_credit(owed);
        self.version += 1;

        tracing::info!(participant = %participant, epoch = %epoch.id, reward = owed, "Claim settled");

        Ok(Settlement {
            kind: SettlementKind::Claim,
            participant,
            epoch_id: epoch.id,
            reward_paid: owed,
            principal_moved: 0,
            principal_after,
            settled_at: now,
        })
    }

    /// Pay out owed reward, roll the position into the current epoch and
    /// restart its lock timer.
    pub fn renew(&mut self, participant: ParticipantId) -> Result<Settlement> {
        let now = self.clock.now();
        self.sync(now)?;
        let epoch = self.require_active()?;

        let mut position = self.registry.position(participant);
        if position.principal == 0 {
            return Err(StakeError::NothingToRenew);
        }

        let was_stale = position.is_stale(epoch.id);
        let owed = Self::stage_settlement(&mut position, self.accrual.acc_share(), epoch.id)?;
        position.last_deposit_time = now;
        position.lock_epoch_id = epoch.id;

        if owed > 0 {
            self.transfer.credit(participant, Asset::Reward, owed)?;
        }

        let principal_after = position.principal;
        self.registry.upsert(participant, position);
        self.conservation.record_reward_credit(owed);
        self.version += 1;

        tracing::info!(
            participant = %participant,
            epoch = %epoch.id,
            reward = owed,
            was_stale,
            "Renew settled"
        );

        Ok(Settlement {
            kind: SettlementKind::Renew,
            participant,
            epoch_id: epoch.id,
            reward_paid: owed,
            principal_moved: 0,
            principal_after,
            settled_at: now,
        })
    }

    /// Settle owed reward, then return `amount` of principal.
    pub fn withdraw(&mut self, participant: ParticipantId, amount: u128) -> Result<Settlement> {
        let now = self.clock.now();
        self.sync(now)?;
        let epoch = self.require_active()?;

        if amount == 0 {
            return Err(StakeError::InvalidAmount {
                amount,
                reason: "withdrawal must be positive".into(),
            });
        }

        let mut position = self.registry.position(participant);
        if amount > position.principal {
            return Err(StakeError::InsufficientPrincipal {
                requested: amount,
                staked: position.principal,
            });
        }
        if let Err(err) = WithdrawLock::new(&epoch).check_withdraw(&position, now) {
            tracing::warn!(participant = %participant, epoch = %epoch.id, "Withdraw rejected: {err}");
            return Err(err);
        }
        if self.accrual.total_principal() < amount {
            return Err(StakeError::PrincipalInvariantViolation {
                reason: format!(
                    "withdrawing {amount} but pool total is {}",
                    self.accrual.total_principal()
                ),
            });
        }

        let reward = Self::stage_settlement(&mut position, self.accrual.acc_share(), epoch.id)?;
        position.principal -= amount;

        if reward > 0 {
            self.transfer.credit(participant, Asset::Reward, reward)?;
        }
        if let Err(err) = self.transfer.credit(participant, Asset::Principal, amount) {
            if reward > 0 {
                if let Err(undo) = self.transfer.debit(participant, Asset::Reward, reward) {
                    tracing::error!(
                        participant = %participant,
                        reward,
                        "Failed to reverse reward credit after principal transfer failure: {undo}"
                    );
                }
            }
            return Err(err.into());
        }

        self.accrual.remove_principal(amount)?;
        if position.principal == 0 {
            self.total_participants = self.total_participants.saturating_sub(1);
        }
        let principal_after = position.principal;
        self.registry.upsert(participant, position);
        self.conservation.record_withdrawal(amount);
        self.conservation.record_reward_credit(reward);
        self.version += 1;

        tracing::info!(
            participant = %participant,
            epoch = %epoch.id,
            amount,
            reward,
            principal = principal_after,
            "Withdraw settled"
        );

        Ok(Settlement {
            kind: SettlementKind::Withdraw,
            participant,
            epoch_id: epoch.id,
            reward_paid: reward,
            principal_moved: amount,
            principal_after,
            settled_at: now,
        })
    }

    // -----------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------

    /// Owed reward against the last committed accumulator value.
    pub fn compute_owed(&self, participant: ParticipantId) -> Result<u128> {
        self.registry
            .position(participant)
            .owed(self.accrual.acc_share())
    }

    /// Owed reward if the participant settled right now. Read-only.
    pub fn pending_reward(&self, participant: ParticipantId) -> Result<u128> {
        let acc_share = match self.ledger.active_epoch() {
            Some(epoch) => self
                .accrual
                .projected_acc_share(self.clock.now(), epoch)?,
            None => self.accrual.acc_share(),
        };
        self.registry.position(participant).owed(acc_share)
    }

    /// The open epoch, if any.
    #[must_use]
    pub fn current_epoch(&self) -> Option<&Epoch> {
        self.ledger.active_epoch()
    }

    #[must_use]
    pub fn current_epoch_id(&self) -> EpochId {
        self.ledger.current_epoch_id()
    }

    #[must_use]
    pub fn epoch(&self, id: EpochId) -> Option<&Epoch> {
        self.ledger.epoch(id)
    }

    #[must_use]
    pub fn snapshot(&self, id: EpochId) -> Option<&ClosedEpochSnapshot> {
        self.ledger.snapshot(id)
    }

    #[must_use]
    pub fn position(&self, participant: ParticipantId) -> ParticipantPosition {
        self.registry.position(participant)
    }

    #[must_use]
    pub fn position_status(&self, participant: ParticipantId) -> PositionStatus {
        self.registry
            .position(participant)
            .status(self.ledger.current_epoch_id())
    }

    #[must_use]
    pub fn acc_share(&self) -> u128 {
        self.accrual.acc_share()
    }

    /// Funded reward of the latest epoch.
    #[must_use]
    pub fn total_reward(&self) -> u128 {
        self.ledger
            .epoch(self.ledger.current_epoch_id())
            .map_or(0, |e| e.funded_reward)
    }

    /// Reward the pool still holds: funded minus credited.
    #[must_use]
    pub fn reward_balance(&self) -> u128 {
        self.conservation.reward_balance()
    }

    #[must_use]
    pub fn total_participants(&self) -> u64 {
        self.total_participants
    }

    #[must_use]
    pub fn pool_row(&self) -> PoolRow {
        PoolRow {
            acc_share: self.accrual.acc_share(),
            current_epoch_id: self.ledger.current_epoch_id(),
            total_principal_active_epoch: self.accrual.total_principal(),
            last_accrual_time: self.accrual.last_accrual_time(),
            total_participants: self.total_participants,
            version: self.version,
        }
    }

    #[must_use]
    pub fn clock(&self) -> &C {
        &self.clock
    }

    #[must_use]
    pub fn transfer(&self) -> &T {
        &self.transfer
    }

    pub fn transfer_mut(&mut self) -> &mut T {
        &mut self.transfer
    }

    #[must_use]
    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    // -----------------------------------------------------------------
    // Audit
    // -----------------------------------------------------------------

    /// Check the snapshot arena for gaps, reordering and tampering.
    pub fn verify_snapshot_chain(&self) -> Result<()> {
        self.ledger.verify_chain()
    }

    /// Check principal custody and reward bounds, per epoch and overall.
    /// Walks every position.
    pub fn verify_conservation(&self) -> Result<()> {
        let staked = self.registry.total_principal();
        self.conservation.verify_principal(staked)?;
        if staked != self.accrual.total_principal() {
            return Err(StakeError::PrincipalInvariantViolation {
                reason: format!(
                    "positions hold {staked} but accumulator divides by {}",
                    self.accrual.total_principal()
                ),
            });
        }

        let acc_share = self.accrual.acc_share();
        let mut outstanding = 0u128;
        for (_, position) in self.registry.iter() {
            outstanding = outstanding.saturating_add(position.owed(acc_share)?);
        }
        self.conservation
            .verify_rewards(outstanding, self.accrual.emitted_total())?;

        for snapshot in self.ledger.snapshots() {
            let payable = self
                .ledger
                .epoch(snapshot.epoch_id)
                .map_or(0, Epoch::payable_reward);
            if snapshot.reward_emitted > payable {
                return Err(StakeError::RewardInvariantViolation {
                    reason: format!(
                        "{} emitted {} but could pay at most {payable}",
                        snapshot.epoch_id, snapshot.reward_emitted
                    ),
                });
            }
        }
        if let Some(epoch) = self.ledger.active_epoch() {
            if self.accrual.emitted_in_epoch() > epoch.payable_reward() {
                return Err(StakeError::RewardInvariantViolation {
                    reason: format!(
                        "{} emitted {} so far but could pay at most {}",
                        epoch.id,
                        self.accrual.emitted_in_epoch(),
                        epoch.payable_reward()
                    ),
                });
            }
        }

        let funded = self.ledger.total_funded();
        if funded != self.conservation.reward_funded() {
            return Err(StakeError::RewardInvariantViolation {
                reason: format!(
                    "epochs fund {funded} but {} was recorded",
                    self.conservation.reward_funded()
                ),
            });
        }
        Ok(())
    }

    /// Export the persisted layout: pool row, epoch and snapshot tables,
    /// positions.
    #[must_use]
    pub fn persisted_state(&self) -> PersistedState {
        PersistedState {
            pool: self.pool_row(),
            epochs: self.ledger.epochs().to_vec(),
            snapshots: self.ledger.snapshots().to_vec(),
            positions: self
                .registry
                .iter()
                .map(|(id, pos)| (*id, pos.clone()))
                .collect(),
            reward_emitted_in_epoch: self.accrual.emitted_in_epoch(),
            reward_emitted_total: self.accrual.emitted_total(),
            totals: self.conservation.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use epochstake_ledger::ManualClock;

    use super::*;
    use crate::transfer::InMemoryBank;

    struct Fixture {
        engine: SettlementEngine<ManualClock, InMemoryBank>,
        clock: ManualClock,
        treasury: ParticipantId,
    }

    fn fixture() -> Fixture {
        let treasury = ParticipantId::new();
        let mut bank = InMemoryBank::new();
        bank.mint(treasury, Asset::Reward, 1_000_000);
        let clock = ManualClock::new(Timestamp(1_000));
        let engine =
            SettlementEngine::new(PoolConfig::new(treasury), clock.clone(), bank).unwrap();
        Fixture {
            engine,
            clock,
            treasury,
        }
    }

    fn funded_user(f: &mut Fixture, amount: u128) -> ParticipantId {
        let user = ParticipantId::new();
        f.engine
            .transfer_mut()
            .mint(user, Asset::Principal, amount);
        user
    }

    #[test]
    fn invalid_config_rejected() {
        let mut cfg = PoolConfig::new(ParticipantId::new());
        cfg.min_deposit = 0;
        let err = SettlementEngine::new(cfg, ManualClock::new(Timestamp(0)), InMemoryBank::new())
            .err()
            .unwrap();
        assert!(matches!(err, StakeError::Configuration(_)));
    }

    #[test]
    fn open_epoch_moves_budget_into_custody() {
        let mut f = fixture();
        let id = f
            .engine
            .open_epoch(1000, Timestamp(1_000), Timestamp(1_100), 0)
            .unwrap();
        assert_eq!(id, EpochId(1));
        assert_eq!(f.engine.transfer().custody(Asset::Reward), 1000);
        assert_eq!(f.engine.transfer().balance(f.treasury, Asset::Reward), 999_000);
        assert_eq!(f.engine.total_reward(), 1000);
        assert_eq!(f.engine.reward_balance(), 1000);
    }

    #[test]
    fn unfunded_treasury_leaves_no_epoch() {
        let mut f = fixture();
        let err = f
            .engine
            .open_epoch(2_000_000, Timestamp(1_000), Timestamp(1_100), 0)
            .unwrap_err();
        assert!(matches!(err, StakeError::Transfer(_)));
        assert_eq!(f.engine.current_epoch_id(), EpochId::NONE);
        assert!(f.engine.current_epoch().is_none());
    }

    #[test]
    fn open_epoch_rejects_bad_windows() {
        let mut f = fixture();
        let err = f
            .engine
            .open_epoch(1000, Timestamp(999), Timestamp(1_100), 0)
            .unwrap_err();
        assert!(matches!(err, StakeError::InvalidWindow { .. }));
        let err = f
            .engine
            .open_epoch(1000, Timestamp(1_100), Timestamp(1_100), 0)
            .unwrap_err();
        assert!(matches!(err, StakeError::InvalidWindow { .. }));

        f.engine
            .open_epoch(1000, Timestamp(1_000), Timestamp(1_100), 0)
            .unwrap();
        f.clock.advance(99);
        let err = f
            .engine
            .open_epoch(1000, Timestamp(1_200), Timestamp(1_300), 0)
            .unwrap_err();
        assert!(matches!(err, StakeError::EpochStillActive { .. }));
    }

    #[test]
    fn operations_without_epoch_fail() {
        let mut f = fixture();
        let user = funded_user(&mut f, 100);
        assert!(matches!(
            f.engine.deposit(user, 10).unwrap_err(),
            StakeError::NoActiveEpoch
        ));
        assert!(matches!(
            f.engine.claim(user).unwrap_err(),
            StakeError::NoActiveEpoch
        ));
        assert!(matches!(
            f.engine.renew(user).unwrap_err(),
            StakeError::NoActiveEpoch
        ));
        assert!(matches!(
            f.engine.withdraw(user, 1).unwrap_err(),
            StakeError::NoActiveEpoch
        ));
    }

    #[test]
    fn deposit_below_minimum_rejected() {
        let mut f = fixture();
        f.engine
            .open_epoch(1000, Timestamp(1_000), Timestamp(1_100), 0)
            .unwrap();
        let user = funded_user(&mut f, 100);
        let err = f.engine.deposit(user, 0).unwrap_err();
        assert!(matches!(err, StakeError::InvalidAmount { amount: 0, .. }));
    }

    #[test]
    fn claim_for_unknown_participant_is_a_no_op() {
        let mut f = fixture();
        f.engine
            .open_epoch(1000, Timestamp(1_000), Timestamp(1_100), 0)
            .unwrap();
        let stranger = ParticipantId::new();
        let s = f.engine.claim(stranger).unwrap();
        assert_eq!(s.reward_paid, 0);
        assert_eq!(
            f.engine.position_status(stranger),
            PositionStatus::Uninitialized
        );
    }

    #[test]
    fn top_up_does_not_earn_retroactively() {
        let mut f = fixture();
        f.engine
            .open_epoch(1000, Timestamp(1_000), Timestamp(1_100), 0)
            .unwrap();
        let user = funded_user(&mut f, 200);
        f.engine.deposit(user, 100).unwrap();
        f.clock.advance(50);
        f.engine.deposit(user, 100).unwrap();

        // 500 accrued on 100 principal before the top-up.
        assert_eq!(f.engine.compute_owed(user).unwrap(), 500);
        f.clock.advance(50);
        assert_eq!(f.engine.pending_reward(user).unwrap(), 1000);
        assert_eq!(f.engine.total_participants(), 1);
    }

    #[test]
    fn withdraw_amount_checks() {
        let mut f = fixture();
        f.engine
            .open_epoch(1000, Timestamp(1_000), Timestamp(1_100), 0)
            .unwrap();
        let user = funded_user(&mut f, 100);
        f.engine.deposit(user, 100).unwrap();

        assert!(matches!(
            f.engine.withdraw(user, 0).unwrap_err(),
            StakeError::InvalidAmount { .. }
        ));
        assert!(matches!(
            f.engine.withdraw(user, 101).unwrap_err(),
            StakeError::InsufficientPrincipal {
                requested: 101,
                staked: 100
            }
        ));
    }

    #[test]
    fn full_withdraw_releases_participant_slot() {
        let mut f = fixture();
        f.engine
            .open_epoch(1000, Timestamp(1_000), Timestamp(1_100), 0)
            .unwrap();
        let user = funded_user(&mut f, 100);
        f.engine.deposit(user, 100).unwrap();
        f.clock.advance(20);

        let s = f.engine.withdraw(user, 100).unwrap();
        assert_eq!(s.reward_paid, 200);
        assert_eq!(s.principal_after, 0);
        assert_eq!(f.engine.total_participants(), 0);
        assert_eq!(f.engine.transfer().balance(user, Asset::Principal), 100);
        assert_eq!(f.engine.transfer().balance(user, Asset::Reward), 200);
        assert_eq!(f.engine.position(user).total_claimed, 200);
        f.engine.verify_conservation().unwrap();
    }

    #[test]
    fn version_advances_on_commit() {
        let mut f = fixture();
        let v0 = f.engine.pool_row().version;
        f.engine
            .open_epoch(1000, Timestamp(1_000), Timestamp(1_100), 0)
            .unwrap();
        assert!(f.engine.pool_row().version > v0);
    }
}
