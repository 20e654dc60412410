//! Custody audit.
//!
//! Invariant checked inside every write before it commits:
//! ```text
//! ∀ asset touched: escrowed(asset) + Δ == Σ offered_amount(open orders offering asset)
//!                  balance_of(custody, asset) >= Σ offered_amount(open orders offering asset)
//! ```
//!
//! The first line catches engine bookkeeping drift, the second catches an
//! asset subsystem that reported a transfer it did not perform. Custody
//! holding more than it owes (a direct donation) is logged, not rejected.

use std::collections::HashMap;

use rust_decimal::Decimal;
use swapvault_types::{AccountId, AssetId, AssetTransfer, Result, SwapVaultError};

use crate::store::OrderStore;

/// Net change of custody's escrow obligation for one asset.
pub type CustodyDelta = (AssetId, Decimal);

/// Running record of what custody holds on behalf of open orders.
#[derive(Debug, Default)]
pub struct CustodyAudit {
    escrowed: HashMap<AssetId, Decimal>,
}

impl CustodyAudit {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Escrow obligation for `asset` as of the last committed write.
    #[must_use]
    pub fn escrowed(&self, asset: &AssetId) -> Decimal {
        self.escrowed.get(asset).copied().unwrap_or(Decimal::ZERO)
    }

    /// Verify the invariant for every asset in `deltas`, against a store
    /// that already reflects the pending write.
    ///
    /// # Errors
    /// Returns [`SwapVaultError::CustodyInvariantViolation`] on mismatch.
    pub fn verify<A: AssetTransfer + ?Sized>(
        &self,
        store: &OrderStore,
        assets: &A,
        custody: &AccountId,
        deltas: &[CustodyDelta],
    ) -> Result<()> {
        for (asset, delta) in Self::net(deltas) {
            let expected = self.escrowed(&asset) + delta;
            let owed = store.open_escrow(&asset);
            if expected != owed {
                return Err(Self::violation(format!(
                    "Asset {asset}: escrow ledger says {expected}, open orders owe {owed}"
                )));
            }

            let held = assets.balance_of(custody, &asset);
            if held < owed {
                return Err(Self::violation(format!(
                    "Asset {asset}: custody holds {held}, open orders owe {owed}"
                )));
            }
            if held > owed {
                tracing::debug!(
                    asset = %asset,
                    held = %held,
                    owed = %owed,
                    "Custody holds unattributed surplus"
                );
            }
        }
        Ok(())
    }

    /// Record a committed write.
    pub fn apply(&mut self, deltas: &[CustodyDelta]) {
        for (asset, delta) in Self::net(deltas) {
            *self.escrowed.entry(asset).or_insert(Decimal::ZERO) += delta;
        }
    }

    fn net(deltas: &[CustodyDelta]) -> HashMap<AssetId, Decimal> {
        let mut net: HashMap<AssetId, Decimal> = HashMap::new();
        for (asset, delta) in deltas {
            *net.entry(asset.clone()).or_insert(Decimal::ZERO) += *delta;
        }
        net
    }

    fn violation(reason: String) -> SwapVaultError {
        tracing::error!(reason = %reason, "Custody invariant violated");
        SwapVaultError::CustodyInvariantViolation { reason }
    }
}
