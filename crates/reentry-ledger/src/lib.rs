//! # Reentry Ledger
//!
//! Minimal fungible-token ledger whose transfer path can run in a safe or a
//! deliberately vulnerable call ordering, with an explicit reentrancy guard
//! and a hard call-depth ceiling.
//!
//! ## Threat Model
//!
//! A transfer that notifies an untrusted recipient hands control to that
//! recipient in the middle of the ledger's own state update:
//! - **Notify before debit** lets the recipient re-enter and pass the
//!   balance check again against an undebited sender
//! - **Stale write-back** then overwrites the nested debits, so the sender
//!   pays once while the recipient is credited once per level
//! - **Unbounded recursion** would exhaust the stack, standing in for the
//!   gas limit of a metered runtime
//!
//! ## Components
//!
//! | Component | Purpose |
//! |-----------|---------|
//! | [`Ledger`] | Balances, supply, transfer/mint, invariant check |
//! | [`CallContext`] | In-flight frames, guard state machine, depth ceiling |
//! | [`TransferReceiver`] | Callback capability of a recipient |
//! | [`LedgerConfig`] | Ordering, guard and depth settings |
//!
//! ## Quick Start
//!
//! ```rust
//! use reentry_ledger::{AccountId, Ledger, LedgerConfig, TransferOrdering};
//!
//! let owner = AccountId::new("owner");
//! let alice = AccountId::new("alice");
//!
//! let config = LedgerConfig::new()
//!     .with_ordering(TransferOrdering::EffectsFirst)
//!     .with_reentrancy_guard(true);
//! let mut ledger = Ledger::with_config(1_000, owner.clone(), config)?;
//!
//! ledger.transfer(&owner, &alice, 250)?;
//! assert_eq!(ledger.balance_of(&alice), 250);
//! ledger.check_invariant()?;
//! # Ok::<(), reentry_ledger::LedgerError>(())
//! ```
//!
//! ## Security Notes
//!
//! - Default configuration is effects first with the guard enabled
//! - Every failed call is all-or-nothing, nested calls included
//! - The supply invariant holds between top-level calls under the safe
//!   ordering; `check_invariant` detects when it does not

mod account;
mod config;
mod context;
mod error;
mod ledger;

pub use account::{
    tokens, AccountId, Amount, TransferEvent, TransferIntent, ONE_TOKEN, TOKEN_DECIMALS,
};
pub use config::{LedgerConfig, TransferOrdering, DEFAULT_MAX_CALL_DEPTH, MAX_CALL_DEPTH_LIMIT};
pub use context::{CallContext, GuardState};
pub use error::{LedgerError, Result};
pub use ledger::{Ledger, TransferReceiver};
