//! Lifecycle notifications emitted by the escrow ledger.
//!
//! An event is emitted if and only if the state transition it describes
//! has committed. Rejected or rolled-back requests emit nothing.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{AccountId, AssetId, Order, OrderId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event")]
pub enum EscrowEvent {
    /// A new order was escrowed.
    OrderCreated {
        id: OrderId,
        depositor: AccountId,
        offered_asset: AssetId,
        offered_amount: Decimal,
        requested_asset: AssetId,
        requested_amount: Decimal,
    },
    /// An order was settled; both legs have been delivered.
    OrderCompleted { id: OrderId, settler: AccountId },
}

impl EscrowEvent {
    #[must_use]
    pub fn created(order: &Order) -> Self {
        Self::OrderCreated {
            id: order.id,
            depositor: order.depositor,
            offered_asset: order.offered_asset.clone(),
            offered_amount: order.offered_amount,
            requested_asset: order.requested_asset.clone(),
            requested_amount: order.requested_amount,
        }
    }

    #[must_use]
    pub fn completed(id: OrderId, settler: AccountId) -> Self {
        Self::OrderCompleted { id, settler }
    }

    /// Canonical event name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::OrderCreated { .. } => "OrderCreated",
            Self::OrderCompleted { .. } => "OrderCompleted",
        }
    }

    #[must_use]
    pub fn order_id(&self) -> OrderId {
        match self {
            Self::OrderCreated { id, .. } | Self::OrderCompleted { id, .. } => *id,
        }
    }
}

impl std::fmt::Display for EscrowEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", self.name(), self.order_id().0)
    }
}
