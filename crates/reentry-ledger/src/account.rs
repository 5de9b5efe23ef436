//! Account identities, amounts, and transfer intents.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{LedgerError, Result};

/// Token amount in base units.
///
/// 128 bits leaves room for ~3.4e20 whole tokens at 18 decimals, so
/// realistic supplies never approach the limit. All arithmetic on amounts
/// is checked.
pub type Amount = u128;

/// Decimal places of one whole token.
pub const TOKEN_DECIMALS: u32 = 18;

/// Base units in one whole token (`10^18`).
pub const ONE_TOKEN: Amount = 10u128.pow(TOKEN_DECIMALS);

/// Converts whole tokens to base units.
///
/// # Errors
///
/// Returns [`LedgerError::Overflow`] if the result does not fit in an
/// [`Amount`].
///
/// # Example
///
/// ```rust
/// use reentry_ledger::{tokens, ONE_TOKEN};
///
/// assert_eq!(tokens(20)?, 20 * ONE_TOKEN);
/// # Ok::<(), reentry_ledger::LedgerError>(())
/// ```
pub fn tokens(whole: u128) -> Result<Amount> {
    whole.checked_mul(ONE_TOKEN).ok_or(LedgerError::Overflow)
}

/// Opaque account identity.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(String);

impl AccountId {
    /// Creates an account identity from any string-like value.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identity as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AccountId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for AccountId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// A requested movement of tokens between two accounts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferIntent {
    /// Account debited
    pub from: AccountId,
    /// Account credited
    pub to: AccountId,
    /// Amount in base units
    pub amount: Amount,
}

impl TransferIntent {
    /// Builds an intent, rejecting zero amounts.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::InvalidAmount`] if `amount` is zero.
    pub fn new(from: AccountId, to: AccountId, amount: Amount) -> Result<Self> {
        if amount == 0 {
            return Err(LedgerError::InvalidAmount);
        }
        Ok(Self { from, to, amount })
    }

    /// Returns true if sender and recipient are the same account.
    #[inline]
    #[must_use]
    pub fn is_self_transfer(&self) -> bool {
        self.from == self.to
    }
}

/// A completed balance movement, recorded in the ledger's event log.
///
/// Mints carry no sender.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferEvent {
    /// Debited account, or `None` for a mint
    pub from: Option<AccountId>,
    /// Credited account
    pub to: AccountId,
    /// Amount in base units
    pub amount: Amount,
    /// Call depth at which the movement completed (1 = top level)
    pub depth: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokens_scaling() {
        assert_eq!(tokens(0).unwrap(), 0);
        assert_eq!(tokens(1).unwrap(), 1_000_000_000_000_000_000);
        assert_eq!(tokens(1_000_000).unwrap(), 1_000_000 * ONE_TOKEN);
    }

    #[test]
    fn test_tokens_overflow() {
        assert_eq!(tokens(u128::MAX), Err(LedgerError::Overflow));
    }

    #[test]
    fn test_zero_amount_intent_rejected() {
        let result = TransferIntent::new("alice".into(), "bob".into(), 0);
        assert_eq!(result, Err(LedgerError::InvalidAmount));
    }

    #[test]
    fn test_self_transfer_detection() {
        let intent = TransferIntent::new("alice".into(), "alice".into(), 5).unwrap();
        assert!(intent.is_self_transfer());

        let intent = TransferIntent::new("alice".into(), "bob".into(), 5).unwrap();
        assert!(!intent.is_self_transfer());
    }

    #[test]
    fn test_account_id_serializes_as_plain_string() {
        let id = AccountId::new("attacker");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"attacker\"");
        assert_eq!(id.to_string(), "attacker");
    }
}
