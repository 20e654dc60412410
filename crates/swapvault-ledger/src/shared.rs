//! Thread-safe handle over a ledger and its asset subsystem.
//!
//! Writes take the write lock for the whole operation, so two racing
//! settlements of the same order are serialised: the first commits, the
//! second observes the order settled and fails with
//! `OrderAlreadyCompleted`. Queries take the read lock and therefore only
//! ever see committed state.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use swapvault_types::{AccountId, AssetTransfer, Order, OrderId, OrderRequest, Result};

use crate::events::EventRecord;
use crate::ledger::EscrowLedger;

struct Inner<A> {
    ledger: EscrowLedger,
    assets: A,
}

pub struct SharedEscrow<A> {
    inner: Arc<RwLock<Inner<A>>>,
}

impl<A> Clone for SharedEscrow<A> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<A: AssetTransfer> SharedEscrow<A> {
    pub fn new(ledger: EscrowLedger, assets: A) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Inner { ledger, assets })),
        }
    }

    pub fn create_order(&self, request: OrderRequest) -> Result<OrderId> {
        let mut guard = self.write();
        let Inner { ledger, assets } = &mut *guard;
        ledger.create_order(assets, request)
    }

    pub fn complete_order(&self, settler: AccountId, order_id: OrderId) -> Result<()> {
        let mut guard = self.write();
        let Inner { ledger, assets } = &mut *guard;
        ledger.complete_order(assets, settler, order_id)
    }

    /// Snapshot of every order in creation order.
    pub fn all_orders(&self) -> Vec<Order> {
        self.read().ledger.all_orders().to_vec()
    }

    pub fn order(&self, order_id: OrderId) -> Option<Order> {
        self.read().ledger.order(order_id).cloned()
    }

    pub fn order_count(&self) -> u64 {
        self.read().ledger.order_count()
    }

    /// Event records with `seq >= cursor`.
    pub fn events_since(&self, cursor: u64) -> Vec<EventRecord> {
        self.read().ledger.events().since(cursor).to_vec()
    }

    /// Run `f` against the asset subsystem, e.g. to query balances.
    pub fn with_assets<R>(&self, f: impl FnOnce(&A) -> R) -> R {
        f(&self.read().assets)
    }

    /// Run `f` with exclusive access to the asset subsystem, e.g. to
    /// grant an authorization before settling.
    pub fn with_assets_mut<R>(&self, f: impl FnOnce(&mut A) -> R) -> R {
        f(&mut self.write().assets)
    }

    /// Run `f` against the ledger under the read lock.
    pub fn with_ledger<R>(&self, f: impl FnOnce(&EscrowLedger) -> R) -> R {
        f(&self.read().ledger)
    }

    // A write that panics has already restored the order store (through
    // `LedgerTxn::drop`) and rolled back its asset movements by the time the
    // panic leaves `EscrowLedger`, so a poisoned lock still guards consistent
    // state. A panicking `with_assets_mut` closure is the exception: whatever
    // it wrote before panicking stays.
    fn read(&self) -> RwLockReadGuard<'_, Inner<A>> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Inner<A>> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}
