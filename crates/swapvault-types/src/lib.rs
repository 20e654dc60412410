//! # swapvault-types
//!
//! Shared types, errors, and configuration for the **SwapVault** escrow
//! engine.
//!
//! This crate is the leaf dependency of the workspace. It defines:
//!
//! - **Identifiers**: [`OrderId`], [`AccountId`], [`AssetId`]
//! - **Order model**: [`Order`], [`OrderRequest`], [`OrderState`]
//! - **Notifications**: [`EscrowEvent`]
//! - **Collaborator seams**: [`AssetTransfer`], [`EscrowReentry`], [`Savepoint`]
//! - **Configuration**: [`EscrowConfig`], [`EventLogConfig`]
//! - **Errors**: [`SwapVaultError`] with `SV_ERR_` prefix codes, [`TransferError`]
//! - **Constants**: system-wide defaults

pub mod config;
pub mod constants;
pub mod error;
pub mod event;
pub mod ids;
pub mod order;
pub mod transfer;

pub use config::*;
pub use error::*;
pub use event::*;
pub use ids::*;
pub use order::*;
pub use transfer::*;

// Constants are accessed via `swapvault_types::constants::FOO`.
