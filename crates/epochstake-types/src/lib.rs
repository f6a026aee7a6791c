//! # epochstake-types
//!
//! Shared types, errors, and configuration for the **EpochStake** reward
//! ledger.
//!
//! This crate is the leaf dependency of the workspace. It defines:
//!
//! - **Identifiers**: [`ParticipantId`], [`EpochId`], [`Timestamp`]
//! - **Assets**: [`Asset`]
//! - **Epoch model**: [`EpochWindow`], [`Epoch`], [`ClosedEpochSnapshot`]
//! - **Position model**: [`ParticipantPosition`], [`PositionStatus`]
//! - **Pool row**: [`PoolRow`]
//! - **Settlement outcome**: [`Settlement`], [`SettlementKind`]
//! - **Configuration**: [`PoolConfig`]
//! - **Errors**: [`StakeError`] and [`TransferError`] with `ES_ERR_` prefix codes
//! - **Constants**: fixed-point scale and configuration defaults

pub mod asset;
pub mod config;
pub mod constants;
pub mod epoch;
pub mod error;
pub mod ids;
pub mod pool;
pub mod position;
pub mod settlement;

pub use asset::*;
pub use config::*;
pub use epoch::*;
pub use error::*;
pub use ids::*;
pub use pool::*;
pub use position::*;
pub use settlement::*;

// Constants are accessed via `epochstake_types::constants::FOO`
// (not re-exported to avoid name collisions).
