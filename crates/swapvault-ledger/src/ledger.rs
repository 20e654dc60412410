//! The escrow ledger: order creation and exactly-once settlement.
//!
//! Every write follows checks-effects-interactions inside a transaction:
//!
//! ```text
//! create_order:   validate amounts → savepoint → pull offered asset into custody
//!                 → append order → custody audit → commit | rollback
//!
//! complete_order: check open → mark settled (a) → savepoint
//!                 → pull requested asset from settler, deliver to depositor (b)
//!                 → release offered asset to settler (c)
//!                 → custody audit → commit | rollback
//! ```
//!
//! The settled mark in (a) lands in the store before the first transfer,
//! so a transfer callback that re-enters settlement for the same order is
//! rejected. If any later step fails, the mark and every asset movement
//! of the attempt are undone together and the order stays open. The same
//! holds when a transfer callback panics: the order store is restored as
//! the transaction unwinds, and every asset movement of the operation is
//! rolled back before the panic propagates.

use std::panic::{self, AssertUnwindSafe};

use rust_decimal::Decimal;
use swapvault_types::{
    AccountId, AssetId, AssetTransfer, EscrowConfig, Order, OrderId, OrderRequest, Result,
    constants,
};

use crate::custody::{CustodyAudit, CustodyDelta};
use crate::events::EventLog;
use crate::store::OrderStore;
use crate::txn::LedgerTxn;

/// Owner of the order collection, the custody record, and the event log.
#[derive(Debug)]
pub struct EscrowLedger {
    config: EscrowConfig,
    store: OrderStore,
    audit: CustodyAudit,
    events: EventLog,
}

impl EscrowLedger {
    #[must_use]
    pub fn new(config: EscrowConfig) -> Self {
        tracing::info!(
            engine = constants::ENGINE_NAME,
            version = constants::VERSION,
            custody = %config.custody.short(),
            audit_custody = config.audit_custody,
            "Escrow ledger started"
        );
        let events = EventLog::new(&config.event_log);
        Self {
            config,
            store: OrderStore::new(),
            audit: CustodyAudit::new(),
            events,
        }
    }

    /// Escrow the offered asset and record a new open order.
    ///
    /// # Errors
    /// - `ZeroAmount` if either amount is not positive (nothing moved)
    /// - `TransferFailed` if the offered asset could not be pulled
    /// - `CustodyInvariantViolation` if the audit rejects the result
    pub fn create_order<A: AssetTransfer + ?Sized>(
        &mut self,
        assets: &mut A,
        request: OrderRequest,
    ) -> Result<OrderId> {
        unwind_safe(assets, |assets| self.escrow_order(assets, request))
    }

    fn escrow_order<A: AssetTransfer + ?Sized>(
        &mut self,
        assets: &mut A,
        request: OrderRequest,
    ) -> Result<OrderId> {
        if let Err(err) = request.validate() {
            tracing::warn!(
                depositor = %request.depositor.short(),
                code = err.code(),
                "Order rejected"
            );
            return Err(err);
        }

        let custody = self.config.custody;
        let depositor = request.depositor;
        let deltas: [CustodyDelta; 1] = [(request.offered_asset.clone(), request.offered_amount)];

        let sp = assets.savepoint();
        let mut txn = LedgerTxn::begin(&mut self.store);
        tracing::debug!(depositor = %depositor.short(), "Create transaction opened");

        let outcome = escrow_offer(&mut txn, assets, &custody, request).and_then(|id| {
            if self.config.audit_custody {
                self.audit.verify(txn.store(), assets, &custody, &deltas)?;
            }
            Ok(id)
        });

        match outcome {
            Ok(id) => {
                let events = txn.commit();
                assets.release(sp);
                self.audit.apply(&deltas);
                self.events.append(events);
                if let Some(order) = self.store.get(id) {
                    tracing::info!(
                        order_id = id.0,
                        depositor = %depositor.short(),
                        offered_asset = %order.offered_asset,
                        offered_amount = %order.offered_amount,
                        requested_asset = %order.requested_asset,
                        requested_amount = %order.requested_amount,
                        "Order created"
                    );
                }
                Ok(id)
            }
            Err(err) => {
                drop(txn);
                assets.rollback_to(sp);
                tracing::warn!(
                    depositor = %depositor.short(),
                    code = err.code(),
                    error = %err,
                    "Order creation rolled back"
                );
                Err(err)
            }
        }
    }

    /// Settle an open order: both legs move, or neither does.
    ///
    /// # Errors
    /// - `OrderNotFound` if `order_id` was never created
    /// - `OrderAlreadyCompleted` if the order is settled
    /// - `TransferFailed` if either leg could not move (order stays open)
    /// - `CustodyInvariantViolation` if the audit rejects the result
    pub fn complete_order<A: AssetTransfer + ?Sized>(
        &mut self,
        assets: &mut A,
        settler: AccountId,
        order_id: OrderId,
    ) -> Result<()> {
        unwind_safe(assets, |assets| self.settle_order(assets, settler, order_id))
    }

    fn settle_order<A: AssetTransfer + ?Sized>(
        &mut self,
        assets: &mut A,
        settler: AccountId,
        order_id: OrderId,
    ) -> Result<()> {
        let custody = self.config.custody;
        let mut txn = LedgerTxn::begin(&mut self.store);

        // (a) before any transfer is issued.
        let order = match txn.mark_settled(order_id, settler) {
            Ok(order) => order,
            Err(err) => {
                tracing::warn!(
                    order_id = order_id.0,
                    settler = %settler.short(),
                    code = err.code(),
                    "Settlement rejected"
                );
                return Err(err);
            }
        };
        tracing::debug!(order_id = order_id.0, "Settlement transaction opened");

        let deltas: [CustodyDelta; 2] = [
            (order.requested_asset.clone(), Decimal::ZERO),
            (order.offered_asset.clone(), -order.offered_amount),
        ];

        let sp = assets.savepoint();
        let outcome = deliver_legs(&mut txn, assets, &custody, &order, settler).and_then(|()| {
            if self.config.audit_custody {
                self.audit.verify(txn.store(), assets, &custody, &deltas)?;
            }
            Ok(())
        });

        match outcome {
            Ok(()) => {
                let events = txn.commit();
                assets.release(sp);
                self.audit.apply(&deltas);
                self.events.append(events);
                tracing::info!(
                    order_id = order_id.0,
                    settler = %settler.short(),
                    depositor = %order.depositor.short(),
                    "Order completed"
                );
                Ok(())
            }
            Err(err) => {
                drop(txn);
                assets.rollback_to(sp);
                tracing::warn!(
                    order_id = order_id.0,
                    settler = %settler.short(),
                    code = err.code(),
                    error = %err,
                    "Settlement rolled back"
                );
                Err(err)
            }
        }
    }

    /// Every order ever created, open and settled, in creation order.
    #[must_use]
    pub fn all_orders(&self) -> &[Order] {
        self.store.as_slice()
    }

    #[must_use]
    pub fn order(&self, order_id: OrderId) -> Option<&Order> {
        self.store.get(order_id)
    }

    /// Total orders ever created.
    #[must_use]
    pub fn order_count(&self) -> u64 {
        self.store.count()
    }

    /// What custody holds for open orders offering `asset`.
    #[must_use]
    pub fn escrowed(&self, asset: &AssetId) -> Decimal {
        self.audit.escrowed(asset)
    }

    #[must_use]
    pub fn events(&self) -> &EventLog {
        &self.events
    }

    #[must_use]
    pub fn custody(&self) -> AccountId {
        self.config.custody
    }

    #[must_use]
    pub fn config(&self) -> &EscrowConfig {
        &self.config
    }
}

/// Run one write operation under an outer asset savepoint that is rolled
/// back if the operation panics, so funds are never left half-moved.
fn unwind_safe<A, T>(assets: &mut A, op: impl FnOnce(&mut A) -> Result<T>) -> Result<T>
where
    A: AssetTransfer + ?Sized,
{
    let sp = assets.savepoint();
    match panic::catch_unwind(AssertUnwindSafe(|| op(&mut *assets))) {
        Ok(result) => {
            assets.release(sp);
            result
        }
        Err(payload) => {
            assets.rollback_to(sp);
            tracing::error!("Escrow operation panicked; asset movements rolled back");
            panic::resume_unwind(payload)
        }
    }
}

/// Pull the offered asset into custody, then record the order.
fn escrow_offer<A: AssetTransfer + ?Sized>(
    txn: &mut LedgerTxn<'_>,
    assets: &mut A,
    custody: &AccountId,
    request: OrderRequest,
) -> Result<OrderId> {
    assets.pull_into(
        txn,
        custody,
        &request.depositor,
        &request.offered_asset,
        request.offered_amount,
    )?;
    Ok(txn.append(request))
}

/// Legs (b) and (c) of a settlement.
fn deliver_legs<A: AssetTransfer + ?Sized>(
    txn: &mut LedgerTxn<'_>,
    assets: &mut A,
    custody: &AccountId,
    order: &Order,
    settler: AccountId,
) -> Result<()> {
    assets.pull_into(
        txn,
        custody,
        &settler,
        &order.requested_asset,
        order.requested_amount,
    )?;
    assets.push_from(
        txn,
        custody,
        &order.depositor,
        &order.requested_asset,
        order.requested_amount,
    )?;
    assets.push_from(
        txn,
        custody,
        &settler,
        &order.offered_asset,
        order.offered_amount,
    )?;
    Ok(())
}
