//! # swapvault-ledger
//!
//! **Escrow Ledger**: order creation, custody coordination, exactly-once
//! settlement, and lifecycle notifications.
//!
//! ## Architecture
//!
//! 1. **OrderStore**: append-only, densely indexed order collection
//! 2. **LedgerTxn**: scoped change set; commits on success, undoes on drop
//! 3. **CustodyAudit**: custody balance vs. escrow owed to open orders
//! 4. **EventLog**: sequence-numbered, hash-chained `OrderCreated` /
//!    `OrderCompleted` records
//! 5. **EscrowLedger**: the two write operations and the queries
//! 6. **SharedEscrow**: lock-guarded handle for concurrent callers
//!
//! ## Settlement Flow
//!
//! ```text
//! complete_order → check open → mark settled → pull requested (settler → custody)
//!     → push requested (custody → depositor) → push offered (custody → settler)
//!     → audit → commit + OrderCompleted   |   any failure → undo all, order stays open
//! ```

pub mod custody;
pub mod events;
pub mod ledger;
pub mod shared;
pub mod store;
pub mod txn;

pub use custody::CustodyAudit;
pub use events::{EventLog, EventRecord};
pub use ledger::EscrowLedger;
pub use shared::SharedEscrow;
pub use store::OrderStore;
pub use txn::LedgerTxn;
