//! Configuration for an escrow ledger instance.

use serde::{Deserialize, Serialize};

use crate::{AccountId, Result, SwapVaultError};

/// Configuration for a single escrow ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EscrowConfig {
    /// The ledger's own custody account in the asset subsystem.
    pub custody: AccountId,
    /// Check custody against open escrow inside every write before commit.
    pub audit_custody: bool,
    /// Event log configuration.
    pub event_log: EventLogConfig,
}

impl EscrowConfig {
    #[must_use]
    pub fn with_custody(custody: AccountId) -> Self {
        Self {
            custody,
            ..Self::default()
        }
    }

    /// Parse a JSON config document. Missing fields take their defaults.
    ///
    /// # Errors
    /// Returns `Configuration` if the document is malformed.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| SwapVaultError::Configuration(e.to_string()))
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl Default for EscrowConfig {
    fn default() -> Self {
        Self {
            custody: AccountId::new(),
            audit_custody: true,
            event_log: EventLogConfig::default(),
        }
    }
}

/// Event log configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventLogConfig {
    /// Link each record to its predecessor with a SHA-256 hash.
    pub hash_chain: bool,
}

impl Default for EventLogConfig {
    fn default() -> Self {
        Self { hash_chain: true }
    }
}
