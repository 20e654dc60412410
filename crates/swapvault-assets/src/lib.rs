//! # swapvault-assets
//!
//! **Asset-transfer subsystem**: an in-memory fungible-asset ledger the
//! escrow engine moves funds through.
//!
//! ## Architecture
//!
//! 1. **TokenLedger**: balances per (account, asset), allowances per
//!    (owner, spender, asset), transfer history, receive hooks
//! 2. **Journal**: undo log behind nested savepoints, so an escrow
//!    operation can discard every movement it made when a later leg fails
//!
//! ## Transfer Flow
//!
//! ```text
//! check allowance → check balance → savepoint → debit/credit → receive hook
//!     → release (hook accepted) | rollback (hook vetoed)
//! ```

mod journal;
pub mod token_ledger;

pub use token_ledger::{ReceiveHook, TokenLedger, TransferRecord};
