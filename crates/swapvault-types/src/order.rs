//! The escrow order: a promise to give one asset for another, backed by
//! the offered asset already held in custody.
//!
//! ## State Machine
//!
//! ```text
//!   ┌──────┐  complete_order   ┌─────────┐
//!   │ OPEN ├──────────────────▶│ SETTLED │
//!   └──────┘                   └─────────┘
//! ```
//!
//! `SETTLED` is terminal: no field of a settled order changes again.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{AccountId, AssetId, OrderId, Result, SwapVaultError};

/// Lifecycle state of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderState {
    /// Offered asset is in custody; any counter-party may settle.
    Open,
    /// Both legs delivered. **Irreversible.**
    Settled,
}

impl OrderState {
    #[must_use]
    pub fn can_transition_to(&self, target: Self) -> bool {
        matches!((self, target), (Self::Open, Self::Settled))
    }
}

impl std::fmt::Display for OrderState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open => write!(f, "OPEN"),
            Self::Settled => write!(f, "SETTLED"),
        }
    }
}

/// Everything a depositor declares when creating an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub depositor: AccountId,
    pub offered_asset: AssetId,
    pub offered_amount: Decimal,
    pub requested_asset: AssetId,
    pub requested_amount: Decimal,
}

impl OrderRequest {
    /// Reject requests declaring a non-positive amount on either side.
    ///
    /// # Errors
    /// Returns `ZeroAmount` carrying both declared amounts.
    pub fn validate(&self) -> Result<()> {
        if self.offered_amount <= Decimal::ZERO || self.requested_amount <= Decimal::ZERO {
            return Err(SwapVaultError::ZeroAmount {
                offered: self.offered_amount,
                requested: self.requested_amount,
            });
        }
        Ok(())
    }
}

/// A single escrow-and-exchange order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub depositor: AccountId,
    pub offered_asset: AssetId,
    /// Quantity of `offered_asset` held in custody while the order is open.
    pub offered_amount: Decimal,
    pub requested_asset: AssetId,
    /// Quantity of `requested_asset` the settler must deliver.
    pub requested_amount: Decimal,
    pub settled: bool,
    pub settler: Option<AccountId>,
    pub created_at: DateTime<Utc>,
    pub settled_at: Option<DateTime<Utc>>,
}

impl Order {
    /// Build an open order from an already-validated request.
    #[must_use]
    pub fn open(id: OrderId, request: OrderRequest) -> Self {
        Self {
            id,
            depositor: request.depositor,
            offered_asset: request.offered_asset,
            offered_amount: request.offered_amount,
            requested_asset: request.requested_asset,
            requested_amount: request.requested_amount,
            settled: false,
            settler: None,
            created_at: Utc::now(),
            settled_at: None,
        }
    }

    #[must_use]
    pub fn state(&self) -> OrderState {
        if self.settled {
            OrderState::Settled
        } else {
            OrderState::Open
        }
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        !self.settled
    }

    /// Transition OPEN → SETTLED, recording who settled.
    ///
    /// # Errors
    /// Returns `OrderAlreadyCompleted` if the order is already settled.
    pub fn mark_settled(&mut self, settler: AccountId) -> Result<()> {
        if !self.state().can_transition_to(OrderState::Settled) {
            return Err(SwapVaultError::OrderAlreadyCompleted(self.id));
        }
        self.settled = true;
        self.settler = Some(settler);
        self.settled_at = Some(Utc::now());
        Ok(())
    }

    /// Undo [`Order::mark_settled`] when the settlement attempt that made
    /// the mark is being rolled back.
    pub fn revert_settlement(&mut self) {
        self.settled = false;
        self.settler = None;
        self.settled_at = None;
    }
}

/// Test helpers.
#[cfg(any(test, feature = "test-helpers"))]
impl Order {
    pub fn dummy(id: u64, offered: Decimal, requested: Decimal) -> Self {
        Self::open(
            OrderId(id),
            OrderRequest {
                depositor: AccountId::new(),
                offered_asset: AssetId::from("TKA"),
                offered_amount: offered,
                requested_asset: AssetId::from("TKB"),
                requested_amount: requested,
            },
        )
    }
}
