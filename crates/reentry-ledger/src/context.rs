//! # Call Context
//!
//! Tracks the transfers currently in flight on the ledger's call stack and
//! enforces the two bounds on nesting: the reentrancy guard and the
//! call-depth ceiling.
//!
//! ## Guard State Machine
//!
//! ```text
//!            enter()                   exit() of last frame
//!   Idle ───────────────▶ InProgress ───────────────────────▶ Idle
//!                            │
//!                            │ enter() with guard enabled
//!                            ▼
//!                         Reentrant (rejected, state unchanged)
//! ```
//!
//! With the guard disabled, `enter()` while `InProgress` pushes another
//! frame instead of failing. The depth ceiling applies either way.
//!
//! ## Security Notes
//!
//! - `enter()` never mutates state when it fails
//! - Every successful `enter()` MUST be paired with exactly one `exit()`,
//!   on the error path as well as the normal one
//! - The ledger owns the pairing; receivers never touch the context

use serde::{Deserialize, Serialize};

use crate::account::TransferIntent;
use crate::config::{LedgerConfig, MAX_CALL_DEPTH_LIMIT};
use crate::error::{LedgerError, Result};

/// Lock state of the ledger's mutation path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GuardState {
    /// No transfer in flight.
    Idle,
    /// At least one transfer has entered and not yet exited.
    InProgress,
}

/// Stack of in-flight transfers plus the guard that protects it.
///
/// Lifetime of the stack contents is one top-level invocation: the stack
/// is empty whenever the context is [`GuardState::Idle`].
///
/// # Example
///
/// ```rust
/// use reentry_ledger::{CallContext, GuardState, LedgerError, TransferIntent};
///
/// let mut ctx = CallContext::new(true, 8);
/// let intent = TransferIntent::new("alice".into(), "bob".into(), 10)?;
///
/// assert_eq!(ctx.enter(intent.clone())?, 1);
/// assert_eq!(ctx.state(), GuardState::InProgress);
///
/// // A second entry while in progress is rejected
/// assert_eq!(ctx.enter(intent), Err(LedgerError::Reentrant));
///
/// ctx.exit();
/// assert!(ctx.is_idle());
/// # Ok::<(), reentry_ledger::LedgerError>(())
/// ```
#[derive(Debug, Clone)]
pub struct CallContext {
    state: GuardState,
    frames: Vec<TransferIntent>,
    guard_enabled: bool,
    max_depth: usize,
}

impl CallContext {
    /// Creates an idle context. `max_depth` is clamped to
    /// [`MAX_CALL_DEPTH_LIMIT`].
    #[must_use]
    pub fn new(guard_enabled: bool, max_depth: usize) -> Self {
        Self {
            state: GuardState::Idle,
            frames: Vec::new(),
            guard_enabled,
            max_depth: max_depth.min(MAX_CALL_DEPTH_LIMIT),
        }
    }

    /// Creates an idle context from ledger configuration.
    #[must_use]
    pub fn from_config(config: &LedgerConfig) -> Self {
        Self::new(config.reentrancy_guard, config.max_call_depth)
    }

    /// Enters a new call frame for `intent`.
    ///
    /// # Returns
    ///
    /// The depth after entering (1 for a top-level call).
    ///
    /// # Errors
    ///
    /// - [`LedgerError::Reentrant`] if the guard is enabled and a frame is
    ///   already active
    /// - [`LedgerError::DepthExceeded`] if the stack is at the ceiling
    pub fn enter(&mut self, intent: TransferIntent) -> Result<usize> {
        self.ensure_can_mutate()?;

        if self.frames.len() >= self.max_depth {
            return Err(LedgerError::DepthExceeded {
                max: self.max_depth,
            });
        }

        self.frames.push(intent);
        self.state = GuardState::InProgress;
        Ok(self.frames.len())
    }

    /// Leaves the innermost call frame.
    ///
    /// Returns to [`GuardState::Idle`] once the last frame is gone. Calling
    /// this on an idle context is a no-op that returns `None`.
    pub fn exit(&mut self) -> Option<TransferIntent> {
        let frame = self.frames.pop();
        if self.frames.is_empty() {
            self.state = GuardState::Idle;
        }
        frame
    }

    /// Fails with [`LedgerError::Reentrant`] if the guard would reject a
    /// mutating call right now.
    ///
    /// Used for mutations that are not transfers (mint) and therefore do
    /// not push a frame.
    pub fn ensure_can_mutate(&self) -> Result<()> {
        if self.guard_enabled && self.state == GuardState::InProgress {
            return Err(LedgerError::Reentrant);
        }
        Ok(())
    }

    /// Returns the guard state.
    #[inline]
    #[must_use]
    pub const fn state(&self) -> GuardState {
        self.state
    }

    /// Returns true if no call is in flight.
    #[inline]
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.state == GuardState::Idle
    }

    /// Returns the number of frames in flight.
    #[inline]
    #[must_use]
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Returns the configured depth ceiling.
    #[inline]
    #[must_use]
    pub const fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Returns true if nested entry is rejected.
    #[inline]
    #[must_use]
    pub const fn guard_enabled(&self) -> bool {
        self.guard_enabled
    }

    /// Returns the innermost in-flight transfer.
    #[must_use]
    pub fn current(&self) -> Option<&TransferIntent> {
        self.frames.last()
    }

    /// Returns all in-flight transfers, outermost first.
    #[must_use]
    pub fn frames(&self) -> &[TransferIntent] {
        &self.frames
    }
}

impl Default for CallContext {
    fn default() -> Self {
        Self::from_config(&LedgerConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn intent(amount: u128) -> TransferIntent {
        TransferIntent::new("victim".into(), "attacker".into(), amount).unwrap()
    }

    #[test]
    fn test_starts_idle() {
        let ctx = CallContext::default();
        assert_eq!(ctx.state(), GuardState::Idle);
        assert_eq!(ctx.depth(), 0);
        assert!(ctx.current().is_none());
        assert!(ctx.guard_enabled());
    }

    #[test]
    fn test_enter_exit_transitions() {
        let mut ctx = CallContext::new(true, 4);

        assert_eq!(ctx.enter(intent(1)).unwrap(), 1);
        assert_eq!(ctx.state(), GuardState::InProgress);
        assert_eq!(ctx.current().unwrap().amount, 1);

        assert_eq!(ctx.exit().unwrap().amount, 1);
        assert_eq!(ctx.state(), GuardState::Idle);
    }

    #[test]
    fn test_guard_rejects_nested_entry() {
        let mut ctx = CallContext::new(true, 4);
        ctx.enter(intent(1)).unwrap();

        assert_eq!(ctx.enter(intent(2)), Err(LedgerError::Reentrant));
        assert_eq!(ctx.ensure_can_mutate(), Err(LedgerError::Reentrant));

        // Failed entry leaves the stack untouched
        assert_eq!(ctx.depth(), 1);
        assert_eq!(ctx.current().unwrap().amount, 1);
    }

    #[test]
    fn test_disabled_guard_allows_nesting() {
        let mut ctx = CallContext::new(false, 4);
        ctx.enter(intent(1)).unwrap();
        assert_eq!(ctx.enter(intent(2)).unwrap(), 2);
        assert_eq!(ctx.frames().len(), 2);
        assert_eq!(ctx.frames()[0].amount, 1);

        ctx.exit();
        assert_eq!(ctx.state(), GuardState::InProgress);
        ctx.exit();
        assert_eq!(ctx.state(), GuardState::Idle);
    }

    #[test]
    fn test_depth_ceiling() {
        let mut ctx = CallContext::new(false, 2);
        ctx.enter(intent(1)).unwrap();
        ctx.enter(intent(2)).unwrap();

        assert_eq!(ctx.enter(intent(3)), Err(LedgerError::DepthExceeded { max: 2 }));
        assert_eq!(ctx.depth(), 2);
    }

    #[test]
    fn test_depth_clamped_to_limit() {
        let ctx = CallContext::new(false, usize::MAX);
        assert_eq!(ctx.max_depth(), MAX_CALL_DEPTH_LIMIT);
    }

    #[test]
    fn test_exit_on_idle_is_noop() {
        let mut ctx = CallContext::default();
        assert!(ctx.exit().is_none());
        assert!(ctx.is_idle());
    }

    #[test]
    fn test_guard_usable_after_unwind() {
        let mut ctx = CallContext::new(true, 4);
        ctx.enter(intent(1)).unwrap();
        assert!(ctx.enter(intent(2)).is_err());
        ctx.exit();

        // Lock released, a fresh top-level call succeeds
        assert_eq!(ctx.enter(intent(3)).unwrap(), 1);
    }
}
