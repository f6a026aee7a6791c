//! Accrual engine — the running reward-per-unit-principal accumulator.
//!
//! ```text
//! target    = min(now, epoch.end)
//! from      = max(last_accrual_time, epoch.start)
//! acc_share += (target - from) * rate * SCALE / total_principal
//! ```
//!
//! The accumulator is a single pool-wide counter that never resets across
//! epoch boundaries; per-epoch rate changes only change the increment.
//! Seconds during which no principal is staked still move
//! `last_accrual_time` forward, so their reward is forfeited rather than
//! paid to whoever stakes next.

use epochstake_types::{Epoch, Result, StakeError, Timestamp, constants::ACC_SHARE_SCALE};

/// The effect of one `advance` call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AccrualStep {
    /// Seconds that carried principal and therefore paid reward.
    pub elapsed_secs: u64,
    /// Increment added to the accumulator.
    pub acc_share_delta: u128,
    /// Reward released to stakers by this step (`elapsed * rate`).
    pub reward_emitted: u128,
}

/// Owns the accumulator and the principal it is divided by.
#[derive(Debug, Clone, Default)]
pub struct AccrualEngine {
    acc_share: u128,
    last_accrual_time: Timestamp,
    total_principal: u128,
    emitted_in_epoch: u128,
    emitted_total: u128,
}

impl AccrualEngine {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from persisted values.
    #[must_use]
    pub fn from_parts(
        acc_share: u128,
        last_accrual_time: Timestamp,
        total_principal: u128,
        emitted_in_epoch: u128,
        emitted_total: u128,
    ) -> Self {
        Self {
            acc_share,
            last_accrual_time,
            total_principal,
            emitted_in_epoch,
            emitted_total,
        }
    }

    #[must_use]
    pub fn acc_share(&self) -> u128 {
        self.acc_share
    }

    #[must_use]
    pub fn last_accrual_time(&self) -> Timestamp {
        self.last_accrual_time
    }

    #[must_use]
    pub fn total_principal(&self) -> u128 {
        self.total_principal
    }

    /// Reward emitted since the current epoch was opened.
    #[must_use]
    pub fn emitted_in_epoch(&self) -> u128 {
        self.emitted_in_epoch
    }

    /// Reward emitted since genesis.
    #[must_use]
    pub fn emitted_total(&self) -> u128 {
        self.emitted_total
    }

    /// Compute what `advance` would do at `now`, without mutating.
    fn step(&self, now: Timestamp, epoch: &Epoch) -> Result<(Timestamp, AccrualStep)> {
        let target = now.min(epoch.end_time);
        if target <= self.last_accrual_time {
            return Ok((self.last_accrual_time, AccrualStep::default()));
        }

        let from = self.last_accrual_time.max(epoch.start_time);
        if target <= from || self.total_principal == 0 {
            return Ok((target, AccrualStep::default()));
        }

        let elapsed_secs = target.secs_since(from);
        let reward_emitted = u128::from(elapsed_secs)
            .checked_mul(epoch.payout_rate_per_second)
            .ok_or(StakeError::ArithmeticOverflow {
                context: "accrual reward",
            })?;
        let acc_share_delta = reward_emitted
            .checked_mul(ACC_SHARE_SCALE)
            .ok_or(StakeError::ArithmeticOverflow {
                context: "accrual scale",
            })?
            / self.total_principal;

        Ok((
            target,
            AccrualStep {
                elapsed_secs,
                acc_share_delta,
                reward_emitted,
            },
        ))
    }

    /// Advance the accumulator to `min(now, epoch.end)`.
    ///
    /// `last_accrual_time` moves to the target even when no principal is
    /// staked.
    pub fn advance(&mut self, now: Timestamp, epoch: &Epoch) -> Result<AccrualStep> {
        let (target, step) = self.step(now, epoch)?;

        let acc_share = self
            .acc_share
            .checked_add(step.acc_share_delta)
            .ok_or(StakeError::ArithmeticOverflow {
                context: "accumulator",
            })?;
        let emitted_total = self
            .emitted_total
            .checked_add(step.reward_emitted)
            .ok_or(StakeError::ArithmeticOverflow {
                context: "emitted total",
            })?;

        self.acc_share = acc_share;
        self.emitted_total = emitted_total;
        self.emitted_in_epoch = self.emitted_in_epoch.saturating_add(step.reward_emitted);
        self.last_accrual_time = target;

        if step.elapsed_secs > 0 {
            tracing::debug!(
                epoch = %epoch.id,
                elapsed = step.elapsed_secs,
                delta = step.acc_share_delta,
                acc_share = self.acc_share,
                "Accumulator advanced"
            );
        }

        Ok(step)
    }

    /// The accumulator value `advance(now, epoch)` would produce.
    pub fn projected_acc_share(&self, now: Timestamp, epoch: &Epoch) -> Result<u128> {
        let (_, step) = self.step(now, epoch)?;
        self.acc_share
            .checked_add(step.acc_share_delta)
            .ok_or(StakeError::ArithmeticOverflow {
                context: "accumulator",
            })
    }

    /// Start accruing for a freshly opened epoch at `now`.
    pub fn begin_epoch(&mut self, now: Timestamp) {
        self.last_accrual_time = self.last_accrual_time.max(now);
        self.emitted_in_epoch = 0;
    }

    /// Reward emitted in the epoch being closed.
    pub fn take_epoch_emitted(&mut self) -> u128 {
        std::mem::take(&mut self.emitted_in_epoch)
    }

    pub fn add_principal(&mut self, amount: u128) -> Result<()> {
        self.total_principal =
            self.total_principal
                .checked_add(amount)
                .ok_or(StakeError::ArithmeticOverflow {
                    context: "total principal",
                })?;
        Ok(())
    }

    pub fn remove_principal(&mut self, amount: u128) -> Result<()> {
        self.total_principal = self.total_principal.checked_sub(amount).ok_or_else(|| {
            StakeError::PrincipalInvariantViolation {
                reason: format!(
                    "removing {amount} from pool total {}",
                    self.total_principal
                ),
            }
        })?;
        Ok(())
    }
}
