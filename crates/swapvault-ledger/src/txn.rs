//! Scoped change set over the order store.
//!
//! Every write operation runs inside a [`LedgerTxn`]. Store mutations are
//! applied immediately, so transfer callbacks observe them, and each one
//! records how to undo itself. Events are held back until
//! [`LedgerTxn::commit`]. A transaction dropped without committing undoes
//! its mutations newest-first and discards its events.
//!
//! The transaction is also the ledger's [`EscrowReentry`] port: a transfer
//! callback that tries to settle an order sees the in-flight marks.

use swapvault_types::{
    AccountId, EscrowEvent, EscrowReentry, Order, OrderId, OrderRequest, Result, SwapVaultError,
    TransferError,
};

use crate::store::OrderStore;

#[derive(Debug, Clone, Copy)]
enum Undo {
    Append,
    Settle(OrderId),
}

pub struct LedgerTxn<'a> {
    store: &'a mut OrderStore,
    undo: Vec<Undo>,
    pending: Vec<EscrowEvent>,
    committed: bool,
}

impl<'a> LedgerTxn<'a> {
    pub fn begin(store: &'a mut OrderStore) -> Self {
        Self {
            store,
            undo: Vec::new(),
            pending: Vec::new(),
            committed: false,
        }
    }

    /// Read access to the store including this transaction's mutations.
    #[must_use]
    pub fn store(&self) -> &OrderStore {
        self.store
    }

    /// Append an open order built from `request` under the next id.
    pub fn append(&mut self, request: OrderRequest) -> OrderId {
        let order = Order::open(self.store.next_id(), request);
        let id = order.id;
        self.pending.push(EscrowEvent::created(&order));
        self.store.append(order);
        self.undo.push(Undo::Append);
        id
    }

    /// Mark an open order settled by `settler` and return a copy of it.
    ///
    /// # Errors
    /// `OrderNotFound` or `OrderAlreadyCompleted`, with nothing changed.
    pub fn mark_settled(&mut self, id: OrderId, settler: AccountId) -> Result<Order> {
        let order = self
            .store
            .get_mut(id)
            .ok_or(SwapVaultError::OrderNotFound(id))?;
        order.mark_settled(settler)?;
        let snapshot = order.clone();
        self.undo.push(Undo::Settle(id));
        self.pending.push(EscrowEvent::completed(id, settler));
        Ok(snapshot)
    }

    /// Keep every mutation and hand back the events to publish.
    pub fn commit(mut self) -> Vec<EscrowEvent> {
        self.committed = true;
        self.undo.clear();
        std::mem::take(&mut self.pending)
    }

    fn undo_all(&mut self) {
        while let Some(step) = self.undo.pop() {
            match step {
                Undo::Append => {
                    self.store.pop_last();
                }
                Undo::Settle(id) => {
                    if let Some(order) = self.store.get_mut(id) {
                        order.revert_settlement();
                    }
                }
            }
        }
        self.pending.clear();
    }
}

impl Drop for LedgerTxn<'_> {
    fn drop(&mut self) {
        if !self.committed && !self.undo.is_empty() {
            tracing::debug!(steps = self.undo.len(), "Rolling back ledger transaction");
            self.undo_all();
        }
    }
}

impl EscrowReentry for LedgerTxn<'_> {
    fn complete_order(&mut self, settler: AccountId, order_id: OrderId) -> Result<()> {
        // An order marked by this transaction is already settled here.
        if let Err(err) = self.store.settleable(order_id) {
            tracing::warn!(
                order_id = order_id.0,
                settler = %settler.short(),
                code = err.code(),
                "Re-entrant settlement rejected"
            );
            return Err(err);
        }
        tracing::warn!(
            order_id = order_id.0,
            settler = %settler.short(),
            "Nested settlement refused while a transfer is in progress"
        );
        Err(SwapVaultError::TransferFailed(TransferError::Busy {
            reason: format!("cannot settle {order_id} from inside another transfer"),
        }))
    }

    fn order(&self, order_id: OrderId) -> Option<Order> {
        self.store.get(order_id).cloned()
    }

    fn order_count(&self) -> u64 {
        self.store.count()
    }
}
