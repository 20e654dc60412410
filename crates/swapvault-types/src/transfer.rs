//! Seams between the escrow ledger and the external asset-transfer
//! subsystem.
//!
//! The ledger never holds balances itself. It asks an [`AssetTransfer`]
//! implementation to move funds in and out of its custody account, and
//! brackets every write operation with a [`Savepoint`] so that a failure on
//! any leg undoes every movement made by the attempt.
//!
//! Transfers are external calls: the subsystem may call back into the
//! ledger while a transfer is in progress (a receive hook, for example).
//! Those callbacks go through the [`EscrowReentry`] port handed to every
//! transfer, which observes the ledger's in-flight state.

use rust_decimal::Decimal;

use crate::{AccountId, AssetId, Order, OrderId, Result, SwapVaultError, TransferError};

/// Result alias for the asset-transfer subsystem.
pub type TransferResult<T> = std::result::Result<T, TransferError>;

/// Opaque marker returned by [`AssetTransfer::savepoint`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Savepoint(pub usize);

/// Engine entry points reachable from inside a transfer.
pub trait EscrowReentry {
    /// Attempt to settle an order from within a transfer callback.
    ///
    /// Never settles anything while a transfer is in progress:
    /// - the order being settled by the outer call → `OrderAlreadyCompleted`
    /// - an order that does not exist → `OrderNotFound`
    /// - any other open order → `TransferFailed(Busy)`; retry it after the
    ///   outer operation has returned
    fn complete_order(&mut self, settler: AccountId, order_id: OrderId) -> Result<()>;

    /// Current view of an order, including uncommitted marks made by the
    /// operation that issued the transfer.
    fn order(&self, order_id: OrderId) -> Option<Order>;

    fn order_count(&self) -> u64;
}

/// A generic fungible-asset ledger the escrow engine moves funds through.
pub trait AssetTransfer {
    fn balance_of(&self, account: &AccountId, asset: &AssetId) -> Decimal;

    /// Move `amount` of `asset` from `from` into `custody`.
    ///
    /// Fails if `from` lacks the balance or has not authorized `custody`
    /// to move that amount. Nothing moves on failure.
    fn pull_into(
        &mut self,
        caller: &mut dyn EscrowReentry,
        custody: &AccountId,
        from: &AccountId,
        asset: &AssetId,
        amount: Decimal,
    ) -> TransferResult<()>;

    /// Move `amount` of `asset` out of `custody` to `to`.
    ///
    /// Fails if custody lacks the balance. Nothing moves on failure.
    fn push_from(
        &mut self,
        caller: &mut dyn EscrowReentry,
        custody: &AccountId,
        to: &AccountId,
        asset: &AssetId,
        amount: Decimal,
    ) -> TransferResult<()>;

    /// Open a savepoint. Savepoints nest.
    fn savepoint(&mut self) -> Savepoint;

    /// Undo every movement made since `savepoint` and close it.
    fn rollback_to(&mut self, savepoint: Savepoint);

    /// Keep every movement made since `savepoint` and close it.
    fn release(&mut self, savepoint: Savepoint);
}

/// Re-entry port for transfers issued outside any escrow operation.
#[derive(Debug, Default, Clone, Copy)]
pub struct Detached;

impl EscrowReentry for Detached {
    fn complete_order(&mut self, _settler: AccountId, _order_id: OrderId) -> Result<()> {
        Err(SwapVaultError::TransferFailed(TransferError::Busy {
            reason: "no escrow ledger attached to this transfer".to_string(),
        }))
    }

    fn order(&self, _order_id: OrderId) -> Option<Order> {
        None
    }

    fn order_count(&self) -> u64 {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detached_rejects_settlement() {
        let mut port = Detached;
        let err = port
            .complete_order(AccountId::new(), OrderId(0))
            .unwrap_err();
        assert!(matches!(
            err,
            SwapVaultError::TransferFailed(TransferError::Busy { .. })
        ));
        assert!(port.order(OrderId(0)).is_none());
        assert_eq!(port.order_count(), 0);
    }
}
