//! Ledger configuration.
//!
//! Selects the transfer ordering, toggles the reentrancy guard, and sets the
//! call-depth ceiling. Defaults are the safe choices: effects before
//! interactions, guard on, 64 frames.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{LedgerError, Result};

/// Default ceiling on nested ledger calls.
pub const DEFAULT_MAX_CALL_DEPTH: usize = 64;

/// Hard upper bound on the configurable call depth.
///
/// Each nested transfer costs several native stack frames, so this keeps the
/// deepest permitted recursion well inside a 2 MiB thread stack.
pub const MAX_CALL_DEPTH_LIMIT: usize = 256;

/// Order in which a transfer mutates state and notifies the recipient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TransferOrdering {
    /// Checks, then debit and credit, then the recipient callback.
    ///
    /// State is consistent before control leaves the ledger.
    #[default]
    EffectsFirst,

    /// Checks, then the recipient callback, then debit and credit.
    ///
    /// The sender balance read during the checks is written back after the
    /// callback returns, so a receiver that re-enters sees an undebited
    /// sender. Vulnerable; exists to reproduce the exploit.
    InteractionsFirst,
}

impl TransferOrdering {
    /// Returns true for the ordering the exploit relies on.
    #[inline]
    #[must_use]
    pub const fn is_vulnerable(&self) -> bool {
        matches!(self, Self::InteractionsFirst)
    }
}

/// Configuration for [`Ledger`](crate::Ledger).
///
/// # Example
///
/// ```rust
/// use reentry_ledger::{LedgerConfig, TransferOrdering};
///
/// let config = LedgerConfig::new()
///     .with_ordering(TransferOrdering::InteractionsFirst)
///     .with_reentrancy_guard(false)
///     .with_max_call_depth(16);
///
/// assert!(config.ordering.is_vulnerable());
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Transfer ordering.
    pub ordering: TransferOrdering,
    /// Reject nested mutating calls while a transfer is in flight.
    pub reentrancy_guard: bool,
    /// Maximum nested call depth.
    pub max_call_depth: usize,
}

impl LedgerConfig {
    /// Creates a config with default values.
    ///
    /// Defaults:
    /// - Ordering: effects first
    /// - Reentrancy guard: enabled
    /// - Max call depth: 64
    #[must_use]
    pub const fn new() -> Self {
        Self {
            ordering: TransferOrdering::EffectsFirst,
            reentrancy_guard: true,
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
        }
    }

    /// Config with the vulnerable ordering and no guard.
    #[must_use]
    pub const fn vulnerable() -> Self {
        Self::new()
            .with_ordering(TransferOrdering::InteractionsFirst)
            .with_reentrancy_guard(false)
    }

    /// Sets the transfer ordering.
    #[must_use]
    pub const fn with_ordering(mut self, ordering: TransferOrdering) -> Self {
        self.ordering = ordering;
        self
    }

    /// Enables or disables the reentrancy guard.
    #[must_use]
    pub const fn with_reentrancy_guard(mut self, enabled: bool) -> Self {
        self.reentrancy_guard = enabled;
        self
    }

    /// Sets the call-depth ceiling, clamped to [`MAX_CALL_DEPTH_LIMIT`].
    #[must_use]
    pub const fn with_max_call_depth(mut self, depth: usize) -> Self {
        self.max_call_depth = if depth > MAX_CALL_DEPTH_LIMIT {
            MAX_CALL_DEPTH_LIMIT
        } else {
            depth
        };
        self
    }

    /// Checks the config for values the ledger cannot run with.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::InvalidConfig`] if `max_call_depth` is zero,
    /// which would reject every call, or above [`MAX_CALL_DEPTH_LIMIT`].
    pub fn validate(&self) -> Result<()> {
        if self.max_call_depth == 0 {
            return Err(LedgerError::InvalidConfig(
                "max_call_depth must be at least 1".to_string(),
            ));
        }
        if self.max_call_depth > MAX_CALL_DEPTH_LIMIT {
            return Err(LedgerError::InvalidConfig(format!(
                "max_call_depth {} exceeds limit of {}",
                self.max_call_depth, MAX_CALL_DEPTH_LIMIT
            )));
        }
        Ok(())
    }

    /// Parses and validates a JSON config. Missing fields take defaults.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::InvalidConfig`] on malformed JSON or a config
    /// that fails [`validate`](Self::validate).
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| LedgerError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads a JSON config file.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::InvalidConfig`] if the file cannot be read or
    /// parsed.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| LedgerError::InvalidConfig(format!("{}: {}", path.display(), e)))?;
        Self::from_json_str(&json)
    }
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = LedgerConfig::default();
        assert_eq!(config.ordering, TransferOrdering::EffectsFirst);
        assert!(config.reentrancy_guard);
        assert_eq!(config.max_call_depth, DEFAULT_MAX_CALL_DEPTH);
    }

    #[test]
    fn test_vulnerable_preset() {
        let config = LedgerConfig::vulnerable();
        assert!(config.ordering.is_vulnerable());
        assert!(!config.reentrancy_guard);
    }

    #[test]
    fn test_zero_depth_rejected() {
        let config = LedgerConfig::new().with_max_call_depth(0);
        assert!(matches!(
            config.validate(),
            Err(LedgerError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_depth_above_limit_rejected() {
        let mut config = LedgerConfig::vulnerable();
        config.max_call_depth = MAX_CALL_DEPTH_LIMIT + 1;
        assert!(matches!(
            config.validate(),
            Err(LedgerError::InvalidConfig(_))
        ));

        config.max_call_depth = MAX_CALL_DEPTH_LIMIT;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_clamps_depth_to_limit() {
        let config = LedgerConfig::vulnerable().with_max_call_depth(1_000_000);
        assert_eq!(config.max_call_depth, MAX_CALL_DEPTH_LIMIT);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_json_depth_above_limit_rejected() {
        let result = LedgerConfig::from_json_str(r#"{ "max_call_depth": 1000000 }"#);
        assert!(matches!(result, Err(LedgerError::InvalidConfig(_))));
    }

    #[test]
    fn test_config_serialization() {
        let config = LedgerConfig::vulnerable().with_max_call_depth(8);
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("\"interactions-first\""));

        let parsed = LedgerConfig::from_json_str(&json).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_partial_json_takes_defaults() {
        let config = LedgerConfig::from_json_str(r#"{ "reentrancy_guard": false }"#).unwrap();
        assert!(!config.reentrancy_guard);
        assert_eq!(config.ordering, TransferOrdering::EffectsFirst);
        assert_eq!(config.max_call_depth, DEFAULT_MAX_CALL_DEPTH);
    }

    #[test]
    fn test_malformed_json_rejected() {
        let result = LedgerConfig::from_json_str(r#"{ "ordering": "sideways" }"#);
        assert!(matches!(result, Err(LedgerError::InvalidConfig(_))));
    }

    #[test]
    fn test_from_json_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "ordering": "interactions-first", "max_call_depth": 4 }}"#).unwrap();

        let config = LedgerConfig::from_json_file(file.path()).unwrap();
        assert!(config.ordering.is_vulnerable());
        assert_eq!(config.max_call_depth, 4);
        assert!(config.reentrancy_guard);
    }

    #[test]
    fn test_missing_file_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let result = LedgerConfig::from_json_file(dir.path().join("absent.json"));
        assert!(matches!(result, Err(LedgerError::InvalidConfig(_))));
    }
}
