//! # Token Ledger
//!
//! Balance map, total supply and the transfer path whose call ordering
//! decides whether a re-entering recipient can extract more than it owns.
//!
//! ## Transfer Pipeline
//!
//! Every transfer runs inside a call frame:
//!
//! ```text
//!  validate amount ─▶ enter frame ─▶ check balance ─┬─ EffectsFirst ───────▶ debit/credit ─▶ notify
//!                    (guard, depth)                 └─ InteractionsFirst ──▶ notify ─▶ debit/credit
//!                                                                     (stale sender balance)
//!  exit frame ◀── revert journal on error
//! ```
//!
//! ## Security Notes
//!
//! - The frame is always exited, on the error path too, so the guard
//!   never stays locked
//! - Balance writes made inside a frame are journaled; a failing frame
//!   reverts its own writes and events before returning
//! - `InteractionsFirst` is only reachable through explicit configuration
//! - Arithmetic is checked; nothing wraps

use std::collections::BTreeMap;

use tracing::{debug, info, warn};

use crate::account::{AccountId, Amount, TransferEvent, TransferIntent};
use crate::config::{LedgerConfig, TransferOrdering};
use crate::context::{CallContext, GuardState};
use crate::error::{LedgerError, Result};

/// Callback capability of a transfer recipient.
///
/// The ledger invokes it synchronously inside the transfer and hands over
/// `&mut Ledger`, so an implementation can call back into the ledger
/// before the outer transfer returns. Whether that re-entry is possible,
/// rejected or harmless depends on the ledger's configuration.
///
/// Returning an error aborts the transfer; the ledger reverts it.
pub trait TransferReceiver {
    /// Called when `intent.to` is credited (before the credit under
    /// [`TransferOrdering::InteractionsFirst`]).
    fn on_transfer_received(&mut self, ledger: &mut Ledger, intent: &TransferIntent) -> Result<()>;
}

/// Undo record for one state write made inside a call frame.
#[derive(Debug, Clone, PartialEq, Eq)]
enum JournalEntry {
    Balance {
        account: AccountId,
        previous: Option<Amount>,
    },
    Supply {
        previous: Amount,
    },
}

#[derive(Debug, Clone, Copy)]
struct Checkpoint {
    journal: usize,
    events: usize,
}

/// In-process fungible-token ledger.
///
/// # Example
///
/// ```rust
/// use reentry_ledger::{AccountId, Ledger};
///
/// let owner = AccountId::new("owner");
/// let alice = AccountId::new("alice");
///
/// let mut ledger = Ledger::new(1_000, owner.clone());
/// ledger.transfer(&owner, &alice, 100)?;
///
/// assert_eq!(ledger.balance_of(&owner), 900);
/// assert_eq!(ledger.balance_of(&alice), 100);
/// ledger.check_invariant()?;
/// # Ok::<(), reentry_ledger::LedgerError>(())
/// ```
#[derive(Debug)]
pub struct Ledger {
    balances: BTreeMap<AccountId, Amount>,
    total_supply: Amount,
    events: Vec<TransferEvent>,
    /// Undo log for writes made while a frame is active. Empty when idle.
    journal: Vec<JournalEntry>,
    context: CallContext,
    config: LedgerConfig,
}

impl Ledger {
    /// Creates a ledger with the default (safe) configuration and the whole
    /// supply assigned to `initial_holder`.
    #[must_use]
    pub fn new(initial_supply: Amount, initial_holder: impl Into<AccountId>) -> Self {
        Self::build(initial_supply, initial_holder.into(), LedgerConfig::default())
    }

    /// Creates a ledger with an explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::InvalidConfig`] if `config` fails validation.
    pub fn with_config(
        initial_supply: Amount,
        initial_holder: impl Into<AccountId>,
        config: LedgerConfig,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(initial_supply, initial_holder.into(), config))
    }

    fn build(initial_supply: Amount, initial_holder: AccountId, config: LedgerConfig) -> Self {
        let mut balances = BTreeMap::new();
        let mut events = Vec::new();

        if initial_supply > 0 {
            balances.insert(initial_holder.clone(), initial_supply);
            events.push(TransferEvent {
                from: None,
                to: initial_holder.clone(),
                amount: initial_supply,
                depth: 0,
            });
        }

        info!(
            "Ledger created: supply {} to {}, ordering {:?}, guard {}",
            initial_supply, initial_holder, config.ordering, config.reentrancy_guard
        );

        if config.ordering.is_vulnerable() {
            warn!("Ledger uses InteractionsFirst ordering; transfers notify before debiting");
        }

        Self {
            balances,
            total_supply: initial_supply,
            events,
            journal: Vec::new(),
            context: CallContext::from_config(&config),
            config,
        }
    }

    /// Returns the balance of `account`, 0 if it has never held tokens.
    #[must_use]
    pub fn balance_of(&self, account: &AccountId) -> Amount {
        self.balances.get(account).copied().unwrap_or(0)
    }

    /// Returns the recorded total supply.
    #[inline]
    #[must_use]
    pub const fn total_supply(&self) -> Amount {
        self.total_supply
    }

    /// Iterates over every account with a recorded balance, in key order.
    pub fn holders(&self) -> impl Iterator<Item = (&AccountId, Amount)> {
        self.balances.iter().map(|(account, balance)| (account, *balance))
    }

    /// Returns the transfer and mint log, oldest first.
    #[must_use]
    pub fn events(&self) -> &[TransferEvent] {
        &self.events
    }

    /// Returns the active configuration.
    #[must_use]
    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// Returns the call context (in-flight frames and guard state).
    #[must_use]
    pub fn context(&self) -> &CallContext {
        &self.context
    }

    /// Returns the number of transfers currently in flight.
    #[inline]
    #[must_use]
    pub fn call_depth(&self) -> usize {
        self.context.depth()
    }

    /// Returns the call-depth ceiling.
    #[inline]
    #[must_use]
    pub const fn max_call_depth(&self) -> usize {
        self.context.max_depth()
    }

    /// Returns the guard state.
    #[inline]
    #[must_use]
    pub const fn guard_state(&self) -> GuardState {
        self.context.state()
    }

    /// Returns true while a transfer is in flight.
    #[inline]
    #[must_use]
    pub fn is_locked(&self) -> bool {
        !self.context.is_idle()
    }

    /// Moves `amount` from `from` to `to` without notifying anyone.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::InvalidAmount`] if `amount` is zero
    /// - [`LedgerError::Reentrant`] if called from inside a guarded transfer
    /// - [`LedgerError::DepthExceeded`] at the depth ceiling
    /// - [`LedgerError::InsufficientBalance`] if `from` holds less than `amount`
    pub fn transfer(&mut self, from: &AccountId, to: &AccountId, amount: Amount) -> Result<()> {
        self.execute(from, to, amount, None)
    }

    /// Moves `amount` from `from` to `to` and notifies `receiver`, which acts
    /// for `to`.
    ///
    /// The callback runs after the balance update under
    /// [`TransferOrdering::EffectsFirst`] and before it under
    /// [`TransferOrdering::InteractionsFirst`].
    ///
    /// # Errors
    ///
    /// Everything [`transfer`](Self::transfer) returns, plus any error the
    /// receiver returns. On error nothing done by this call remains, nested
    /// calls made from the callback included.
    pub fn transfer_and_call(
        &mut self,
        from: &AccountId,
        to: &AccountId,
        amount: Amount,
        receiver: &mut dyn TransferReceiver,
    ) -> Result<()> {
        self.execute(from, to, amount, Some(receiver))
    }

    /// Creates `amount` new tokens for `to`.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::InvalidAmount`] if `amount` is zero
    /// - [`LedgerError::Reentrant`] if called from inside a guarded transfer
    /// - [`LedgerError::Overflow`] if the supply or the balance would overflow
    pub fn mint(&mut self, to: &AccountId, amount: Amount) -> Result<()> {
        if amount == 0 {
            return Err(LedgerError::InvalidAmount);
        }
        self.context.ensure_can_mutate()?;

        let supply = self
            .total_supply
            .checked_add(amount)
            .ok_or(LedgerError::Overflow)?;
        let balance = self
            .balance_of(to)
            .checked_add(amount)
            .ok_or(LedgerError::Overflow)?;

        self.write_supply(supply);
        self.write_balance(to.clone(), balance);
        self.events.push(TransferEvent {
            from: None,
            to: to.clone(),
            amount,
            depth: self.context.depth(),
        });

        debug!("Minted {} to {}, supply now {}", amount, to, supply);
        Ok(())
    }

    /// Verifies that the balances sum to the recorded total supply.
    ///
    /// Only meaningful while no transfer is in flight.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::SupplyMismatch`] if the sum differs
    /// - [`LedgerError::Overflow`] if the sum does not fit in an [`Amount`]
    pub fn check_invariant(&self) -> Result<()> {
        let actual = self
            .balances
            .values()
            .try_fold(0u128, |sum, balance| sum.checked_add(*balance))
            .ok_or(LedgerError::Overflow)?;

        if actual != self.total_supply {
            warn!(
                "Supply invariant violated: recorded {}, balances sum to {}",
                self.total_supply, actual
            );
            return Err(LedgerError::SupplyMismatch {
                recorded: self.total_supply,
                actual,
            });
        }
        Ok(())
    }

    fn execute(
        &mut self,
        from: &AccountId,
        to: &AccountId,
        amount: Amount,
        receiver: Option<&mut dyn TransferReceiver>,
    ) -> Result<()> {
        let intent = TransferIntent::new(from.clone(), to.clone(), amount)?;
        let ordering = self.config.ordering;

        self.in_frame(&intent, |ledger| match ordering {
            TransferOrdering::EffectsFirst => {
                let have = ledger.check_balance(&intent)?;
                ledger.apply(&intent, have)?;
                ledger.notify(&intent, receiver)
            }
            TransferOrdering::InteractionsFirst => {
                let have = ledger.check_balance(&intent)?;
                ledger.notify(&intent, receiver)?;
                ledger.apply(&intent, have)
            }
        })
    }

    /// Runs `body` inside a call frame for `intent`.
    ///
    /// The frame is exited on every return path. On error, writes and
    /// events recorded since entry are reverted first.
    fn in_frame<T, F>(&mut self, intent: &TransferIntent, body: F) -> Result<T>
    where
        F: FnOnce(&mut Self) -> Result<T>,
    {
        let depth = match self.context.enter(intent.clone()) {
            Ok(depth) => depth,
            Err(err) => {
                warn!(
                    "Transfer {} -> {} of {} rejected at depth {}: {}",
                    intent.from,
                    intent.to,
                    intent.amount,
                    self.context.depth(),
                    err
                );
                return Err(err);
            }
        };

        let checkpoint = Checkpoint {
            journal: self.journal.len(),
            events: self.events.len(),
        };
        debug!(
            "Enter transfer {} -> {} of {} at depth {}",
            intent.from, intent.to, intent.amount, depth
        );

        let result = body(self);

        if let Err(err) = &result {
            self.revert_to(checkpoint);
            debug!("Reverted transfer at depth {}: {}", depth, err);
        }

        self.context.exit();
        if self.context.is_idle() {
            self.journal.clear();
        }

        result
    }

    fn check_balance(&self, intent: &TransferIntent) -> Result<Amount> {
        let have = self.balance_of(&intent.from);
        if have < intent.amount {
            return Err(LedgerError::InsufficientBalance {
                have,
                need: intent.amount,
            });
        }
        Ok(have)
    }

    /// Debits `intent.from` from `sender_balance` and credits `intent.to`.
    ///
    /// `sender_balance` is whatever the caller read during its checks. Under
    /// `InteractionsFirst` that read predates the callback.
    fn apply(&mut self, intent: &TransferIntent, sender_balance: Amount) -> Result<()> {
        if !intent.is_self_transfer() {
            // Unreachable after check_balance, which saw the same sender_balance
            let debited = sender_balance
                .checked_sub(intent.amount)
                .ok_or(LedgerError::Underflow)?;
            let credited = self
                .balance_of(&intent.to)
                .checked_add(intent.amount)
                .ok_or(LedgerError::Overflow)?;

            self.write_balance(intent.from.clone(), debited);
            self.write_balance(intent.to.clone(), credited);
        }

        self.events.push(TransferEvent {
            from: Some(intent.from.clone()),
            to: intent.to.clone(),
            amount: intent.amount,
            depth: self.context.depth(),
        });
        Ok(())
    }

    fn notify(
        &mut self,
        intent: &TransferIntent,
        receiver: Option<&mut dyn TransferReceiver>,
    ) -> Result<()> {
        let Some(receiver) = receiver else {
            return Ok(());
        };
        debug!(
            "Notify {} of {} at depth {}",
            intent.to,
            intent.amount,
            self.context.depth()
        );
        receiver.on_transfer_received(self, intent)
    }

    fn write_balance(&mut self, account: AccountId, amount: Amount) {
        let previous = self.balances.insert(account.clone(), amount);
        if !self.context.is_idle() {
            self.journal.push(JournalEntry::Balance { account, previous });
        }
    }

    fn write_supply(&mut self, amount: Amount) {
        let previous = std::mem::replace(&mut self.total_supply, amount);
        if !self.context.is_idle() {
            self.journal.push(JournalEntry::Supply { previous });
        }
    }

    fn revert_to(&mut self, checkpoint: Checkpoint) {
        let undone = self.journal.split_off(checkpoint.journal);
        for entry in undone.into_iter().rev() {
            match entry {
                JournalEntry::Balance { account, previous } => match previous {
                    Some(amount) => {
                        self.balances.insert(account, amount);
                    }
                    None => {
                        self.balances.remove(&account);
                    }
                },
                JournalEntry::Supply { previous } => self.total_supply = previous,
            }
        }
        self.events.truncate(checkpoint.events);
    }
}
