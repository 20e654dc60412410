//! Append-only event log.
//!
//! Committed [`EscrowEvent`]s are stored as sequence-numbered records.
//! With hash chaining enabled each record commits to its predecessor:
//! ```text
//! hash = SHA-256(domain || seq || prev_hash || canonical(event))
//! ```
//! so a subscriber replaying from any cursor can verify it saw an
//! unmodified, gap-free history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use swapvault_types::{EscrowEvent, EventLogConfig, constants};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Position in the log, starting at 0.
    pub seq: u64,
    pub event: EscrowEvent,
    pub recorded_at: DateTime<Utc>,
    pub prev_hash: [u8; 32],
    pub hash: [u8; 32],
}

impl EventRecord {
    #[must_use]
    pub fn hash_hex(&self) -> String {
        hex::encode(self.hash)
    }
}

#[derive(Debug)]
pub struct EventLog {
    records: Vec<EventRecord>,
    hash_chain: bool,
}

impl EventLog {
    #[must_use]
    pub fn new(config: &EventLogConfig) -> Self {
        Self {
            records: Vec::new(),
            hash_chain: config.hash_chain,
        }
    }

    /// Append events in order.
    pub fn append(&mut self, events: impl IntoIterator<Item = EscrowEvent>) {
        for event in events {
            let seq = self.records.len() as u64;
            let prev_hash = self.last_hash();
            let hash = if self.hash_chain {
                Self::compute_hash(seq, &prev_hash, &event)
            } else {
                constants::GENESIS_HASH
            };
            tracing::debug!(seq, event = %event, hash = %hex::encode(&hash[..8]), "Event recorded");
            self.records.push(EventRecord {
                seq,
                event,
                recorded_at: Utc::now(),
                prev_hash,
                hash,
            });
        }
    }

    #[must_use]
    pub fn records(&self) -> &[EventRecord] {
        &self.records
    }

    /// Records with `seq >= cursor`. An out-of-range cursor yields nothing.
    #[must_use]
    pub fn since(&self, cursor: u64) -> &[EventRecord] {
        let start = usize::try_from(cursor)
            .unwrap_or(usize::MAX)
            .min(self.records.len());
        &self.records[start..]
    }

    pub fn events(&self) -> impl Iterator<Item = &EscrowEvent> {
        self.records.iter().map(|r| &r.event)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[must_use]
    pub fn last_hash(&self) -> [u8; 32] {
        self.records
            .last()
            .map_or(constants::GENESIS_HASH, |r| r.hash)
    }

    /// Recompute every link. Always `true` when chaining is disabled.
    #[must_use]
    pub fn verify_chain(&self) -> bool {
        if !self.hash_chain {
            return true;
        }
        let mut prev = constants::GENESIS_HASH;
        for record in &self.records {
            if record.prev_hash != prev
                || record.hash != Self::compute_hash(record.seq, &prev, &record.event)
            {
                return false;
            }
            prev = record.hash;
        }
        true
    }

    fn compute_hash(seq: u64, prev_hash: &[u8; 32], event: &EscrowEvent) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(constants::EVENT_HASH_DOMAIN);
        hasher.update(seq.to_le_bytes());
        hasher.update(prev_hash);
        hasher.update(event.name().as_bytes());
        match event {
            EscrowEvent::OrderCreated {
                id,
                depositor,
                offered_asset,
                offered_amount,
                requested_asset,
                requested_amount,
            } => {
                hasher.update(id.0.to_le_bytes());
                hasher.update(depositor.0.as_bytes());
                hasher.update(offered_asset.as_str().as_bytes());
                hasher.update(offered_amount.to_string().as_bytes());
                hasher.update(requested_asset.as_str().as_bytes());
                hasher.update(requested_amount.to_string().as_bytes());
            }
            EscrowEvent::OrderCompleted { id, settler } => {
                hasher.update(id.0.to_le_bytes());
                hasher.update(settler.0.as_bytes());
            }
        }
        let result = hasher.finalize();
        let mut hash = [0u8; 32];
        hash.copy_from_slice(&result);
        hash
    }
}
