//! # Reentry Attack
//!
//! Exploit harness for [`reentry_ledger`]: an owned agent that re-enters the
//! ledger's transfer path from its own transfer callback.
//!
//! ## Components
//!
//! | Component | Purpose |
//! |-----------|---------|
//! | [`AttackAgent`] | Owner-gated attacker implementing `TransferReceiver` |
//! | [`AttackReport`] | What a completed attack extracted |
//! | [`AttackError`] | Ownership, amount and ledger failures |
//!
//! ## Expected Outcomes
//!
//! | Ordering | Guard | Result |
//! |----------|-------|--------|
//! | `InteractionsFirst` | off | Succeeds, agent balance exceeds supply |
//! | `InteractionsFirst` | on | `Reentrant`, nothing moved |
//! | `EffectsFirst` | off | `InsufficientBalance`, nothing moved |
//! | `EffectsFirst` | on | `Reentrant`, nothing moved |
//!
//! Rows two to four are the regression detector: if any of them ever
//! succeeds with more than the supply, the ledger is vulnerable.

mod agent;
mod error;

pub use agent::{AttackAgent, AttackReport};
pub use error::{AttackError, Result};
