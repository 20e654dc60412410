//! Error types for the SwapVault escrow engine.
//!
//! All errors use the `SV_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by subsystem:
//! - 1xx: Order errors
//! - 2xx: Transfer errors
//! - 8xx: Safety errors
//! - 9xx: General / internal errors

use rust_decimal::Decimal;
use thiserror::Error;

use crate::{AccountId, AssetId, OrderId};

/// Failures reported by the asset-transfer subsystem.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransferError {
    /// Transfers move a strictly positive amount.
    #[error("transfer amount must be positive, got {amount}")]
    InvalidAmount { amount: Decimal },

    #[error("{account} holds {available} {asset}, needs {needed}")]
    InsufficientBalance {
        account: AccountId,
        asset: AssetId,
        needed: Decimal,
        available: Decimal,
    },

    #[error("{owner} authorized {spender} for {approved} {asset}, needs {needed}")]
    InsufficientAllowance {
        owner: AccountId,
        spender: AccountId,
        asset: AssetId,
        needed: Decimal,
        approved: Decimal,
    },

    /// The receiving account refused the transfer.
    #[error("transfer to {account} rejected: {reason}")]
    Rejected { account: AccountId, reason: String },

    /// A nested transfer was requested while another one is in progress.
    #[error("asset subsystem busy: {reason}")]
    Busy { reason: String },
}

/// Central error enum for all SwapVault operations.
#[derive(Debug, Error)]
pub enum SwapVaultError {
    // =================================================================
    // Order Errors (1xx)
    // =================================================================
    /// Either declared amount is not positive. Raised before any transfer.
    #[error("SV_ERR_100: Amount cannot be zero: offered {offered}, requested {requested}")]
    ZeroAmount { offered: Decimal, requested: Decimal },

    /// The id lies outside the dense range of created orders.
    #[error("SV_ERR_101: Order not found: {0}")]
    OrderNotFound(OrderId),

    /// The order exists but has already been settled.
    #[error("SV_ERR_102: Order already completed: {0}")]
    OrderAlreadyCompleted(OrderId),

    // =================================================================
    // Transfer Errors (2xx)
    // =================================================================
    /// The asset-transfer subsystem could not move funds on some leg.
    #[error("SV_ERR_200: Transfer failed: {0}")]
    TransferFailed(#[from] TransferError),

    // =================================================================
    // Safety Errors (8xx)
    // =================================================================
    /// Custody balance disagrees with the escrow owed to open orders.
    #[error("SV_ERR_800: Custody invariant violation: {reason}")]
    CustodyInvariantViolation { reason: String },

    // =================================================================
    // General / Internal (9xx)
    // =================================================================
    #[error("SV_ERR_900: Configuration error: {0}")]
    Configuration(String),

    #[error("SV_ERR_901: Serialization error: {0}")]
    Serialization(String),
}

/// Coarse classification callers branch on when deciding whether to retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    ZeroAmount,
    OrderNotFound,
    OrderAlreadyCompleted,
    TransferFailed,
    Internal,
}

impl SwapVaultError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ZeroAmount { .. } => ErrorKind::ZeroAmount,
            Self::OrderNotFound(_) => ErrorKind::OrderNotFound,
            Self::OrderAlreadyCompleted(_) => ErrorKind::OrderAlreadyCompleted,
            Self::TransferFailed(_) => ErrorKind::TransferFailed,
            Self::CustodyInvariantViolation { .. }
            | Self::Configuration(_)
            | Self::Serialization(_) => ErrorKind::Internal,
        }
    }

    /// The `SV_ERR_nnn` code at the front of the display string.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::ZeroAmount { .. } => "SV_ERR_100",
            Self::OrderNotFound(_) => "SV_ERR_101",
            Self::OrderAlreadyCompleted(_) => "SV_ERR_102",
            Self::TransferFailed(_) => "SV_ERR_200",
            Self::CustodyInvariantViolation { .. } => "SV_ERR_800",
            Self::Configuration(_) => "SV_ERR_900",
            Self::Serialization(_) => "SV_ERR_901",
        }
    }
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, SwapVaultError>;

impl From<serde_json::Error> for SwapVaultError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_contains_prefix() {
        let err = SwapVaultError::OrderNotFound(OrderId(5));
        let msg = format!("{err}");
        assert!(msg.starts_with("SV_ERR_101"), "Got: {msg}");
        assert!(msg.contains("order:5"));
    }

    #[test]
    fn transfer_failure_wraps_source() {
        let err: SwapVaultError = TransferError::InsufficientAllowance {
            owner: AccountId::from_bytes([1; 16]),
            spender: AccountId::from_bytes([2; 16]),
            asset: AssetId::from("TKB"),
            needed: Decimal::new(20, 0),
            approved: Decimal::ZERO,
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::TransferFailed);
        let msg = format!("{err}");
        assert!(msg.contains("SV_ERR_200"));
        assert!(msg.contains("TKB"));
    }

    #[test]
    fn code_matches_display() {
        let errors = vec![
            SwapVaultError::ZeroAmount {
                offered: Decimal::ZERO,
                requested: Decimal::ONE,
            },
            SwapVaultError::OrderNotFound(OrderId(0)),
            SwapVaultError::OrderAlreadyCompleted(OrderId(0)),
            SwapVaultError::TransferFailed(TransferError::Busy {
                reason: "test".into(),
            }),
            SwapVaultError::CustodyInvariantViolation {
                reason: "test".into(),
            },
            SwapVaultError::Configuration("test".into()),
            SwapVaultError::Serialization("test".into()),
        ];
        for err in errors {
            let msg = format!("{err}");
            assert!(msg.starts_with(err.code()), "{msg} vs {}", err.code());
        }
    }

    #[test]
    fn kinds_cover_taxonomy() {
        assert_eq!(
            SwapVaultError::OrderAlreadyCompleted(OrderId(1)).kind(),
            ErrorKind::OrderAlreadyCompleted
        );
        assert_eq!(
            SwapVaultError::Configuration("x".into()).kind(),
            ErrorKind::Internal
        );
    }
}
