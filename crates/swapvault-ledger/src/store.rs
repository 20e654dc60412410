//! Append-only order collection.
//!
//! Orders are stored in creation order and indexed by their [`OrderId`],
//! so the id of an order is also its position. Nothing is ever removed
//! except by the rollback of the transaction that appended it.

use rust_decimal::Decimal;
use swapvault_types::{AssetId, Order, OrderId, Result, SwapVaultError};

#[derive(Debug, Default)]
pub struct OrderStore {
    orders: Vec<Order>,
}

impl OrderStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Total orders ever created.
    #[must_use]
    pub fn count(&self) -> u64 {
        self.orders.len() as u64
    }

    /// The id the next appended order will receive.
    #[must_use]
    pub fn next_id(&self) -> OrderId {
        OrderId(self.count())
    }

    #[must_use]
    pub fn get(&self, id: OrderId) -> Option<&Order> {
        self.orders.get(id.index()?)
    }

    pub(crate) fn get_mut(&mut self, id: OrderId) -> Option<&mut Order> {
        self.orders.get_mut(id.index()?)
    }

    /// Look up an order that may still be settled.
    ///
    /// # Errors
    /// - `OrderNotFound` if `id` is outside `0..count`
    /// - `OrderAlreadyCompleted` if the order is settled
    pub fn settleable(&self, id: OrderId) -> Result<&Order> {
        let order = self.get(id).ok_or(SwapVaultError::OrderNotFound(id))?;
        if order.settled {
            return Err(SwapVaultError::OrderAlreadyCompleted(id));
        }
        Ok(order)
    }

    /// Every order in creation order.
    #[must_use]
    pub fn as_slice(&self) -> &[Order] {
        &self.orders
    }

    pub fn iter(&self) -> impl Iterator<Item = &Order> {
        self.orders.iter()
    }

    pub fn open_orders(&self) -> impl Iterator<Item = &Order> {
        self.orders.iter().filter(|o| o.is_open())
    }

    /// Sum of `offered_amount` over open orders offering `asset`: what
    /// custody must hold on their behalf.
    #[must_use]
    pub fn open_escrow(&self, asset: &AssetId) -> Decimal {
        self.open_orders()
            .filter(|o| &o.offered_asset == asset)
            .map(|o| o.offered_amount)
            .sum()
    }

    pub(crate) fn append(&mut self, order: Order) {
        debug_assert_eq!(order.id, self.next_id(), "order ids must stay dense");
        self.orders.push(order);
    }

    pub(crate) fn pop_last(&mut self) -> Option<Order> {
        self.orders.pop()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use swapvault_types::AccountId;

    fn dec(n: i64) -> Decimal {
        Decimal::new(n, 0)
    }

    fn store_with(n: u64) -> OrderStore {
        let mut store = OrderStore::new();
        for i in 0..n {
            store.append(Order::dummy(i, dec(100), dec(20)));
        }
        store
    }

    #[test]
    fn ids_are_positions() {
        let store = store_with(3);
        assert_eq!(store.count(), 3);
        assert_eq!(store.next_id(), OrderId(3));
        for (i, order) in store.iter().enumerate() {
            assert_eq!(order.id, OrderId(i as u64));
        }
    }

    #[test]
    fn settleable_distinguishes_missing_and_settled() {
        let mut store = store_with(1);
        assert!(store.settleable(OrderId(0)).is_ok());

        let err = store.settleable(OrderId(5)).unwrap_err();
        assert!(matches!(err, SwapVaultError::OrderNotFound(OrderId(5))));

        store
            .get_mut(OrderId(0))
            .unwrap()
            .mark_settled(AccountId::new())
            .unwrap();
        let err = store.settleable(OrderId(0)).unwrap_err();
        assert!(matches!(err, SwapVaultError::OrderAlreadyCompleted(OrderId(0))));
    }

    #[test]
    fn open_escrow_counts_open_orders_only() {
        let mut store = store_with(3);
        assert_eq!(store.open_escrow(&AssetId::from("TKA")), dec(300));
        assert_eq!(store.open_escrow(&AssetId::from("TKB")), Decimal::ZERO);

        store
            .get_mut(OrderId(1))
            .unwrap()
            .mark_settled(AccountId::new())
            .unwrap();
        assert_eq!(store.open_escrow(&AssetId::from("TKA")), dec(200));
        assert_eq!(store.open_orders().count(), 2);
    }
}
