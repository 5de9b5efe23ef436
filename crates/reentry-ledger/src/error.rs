//! Error types for ledger operations.
//!
//! Every variant is a synchronous return-path failure. A failed call leaves
//! no partial state behind: the ledger reverts its journal before returning.

use thiserror::Error;

use crate::account::Amount;

/// Result type alias for ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;

/// Errors that can occur while mutating or inspecting the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// Amount was zero. Rejected before any state change.
    #[error("invalid amount: must be greater than zero")]
    InvalidAmount,

    /// Sender balance is below the requested amount.
    #[error("insufficient balance: have {have}, need {need}")]
    InsufficientBalance {
        /// Sender balance at the time of the check
        have: Amount,
        /// Amount requested
        need: Amount,
    },

    /// A mutating call arrived while another one was still in flight.
    ///
    /// Only raised when the reentrancy guard is enabled.
    #[error("reentrant call rejected: a transfer is already in progress")]
    Reentrant,

    /// Nested calls exceeded the configured ceiling.
    #[error("call depth exceeded maximum of {max}")]
    DepthExceeded {
        /// Configured maximum depth
        max: usize,
    },

    /// Arithmetic overflow on a balance or the total supply.
    #[error("arithmetic overflow")]
    Overflow,

    /// Arithmetic underflow on a balance or the total supply.
    #[error("arithmetic underflow")]
    Underflow,

    /// Sum of balances no longer matches the recorded total supply.
    #[error("supply invariant violated: recorded {recorded}, balances sum to {actual}")]
    SupplyMismatch {
        /// Total supply recorded by the ledger
        recorded: Amount,
        /// Actual sum of all balances
        actual: Amount,
    },

    /// Configuration failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A transfer receiver failed for a reason of its own.
    #[error("receiver rejected transfer: {0}")]
    Receiver(String),
}
