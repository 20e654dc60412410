//! System-wide constants for the SwapVault escrow engine.

/// Domain separator for event-log hash chaining.
pub const EVENT_HASH_DOMAIN: &[u8] = b"swapvault:event:v1:";

/// `prev_hash` of the first record in an event log.
pub const GENESIS_HASH: [u8; 32] = [0u8; 32];

/// Version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Engine name.
pub const ENGINE_NAME: &str = "SwapVault";
