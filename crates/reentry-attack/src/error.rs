//! Error types for the attack harness.

use reentry_ledger::{AccountId, LedgerError};
use thiserror::Error;

/// Result type alias for attack operations.
pub type Result<T> = std::result::Result<T, AttackError>;

/// Errors returned by [`AttackAgent`](crate::AttackAgent).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttackError {
    /// Caller is not the agent's owner. Raised before touching the ledger.
    #[error("NOT_OWNER: {caller} is not the configured attacker")]
    NotOwner {
        /// Identity that tried to trigger the attack
        caller: AccountId,
    },

    /// Requested amount was zero.
    #[error("invalid amount: must be greater than zero")]
    InvalidAmount,

    /// The ledger rejected the attack.
    #[error("ledger rejected attack: {0}")]
    Ledger(#[from] LedgerError),
}
