//! Undo journal backing [`Savepoint`]s.
//!
//! While at least one savepoint is open, every write to the token ledger
//! records the value it overwrote. Rolling back pops entries newest-first
//! and hands them to the ledger to restore. Releasing the outermost
//! savepoint discards the journal.

use rust_decimal::Decimal;
use swapvault_types::{AccountId, AssetId, Savepoint};

/// `(holder, asset)`
pub(crate) type BalanceKey = (AccountId, AssetId);
/// `(owner, spender, asset)`
pub(crate) type AllowanceKey = (AccountId, AccountId, AssetId);

/// A single overwritten value.
#[derive(Debug, Clone)]
pub(crate) enum JournalEntry {
    Balance {
        key: BalanceKey,
        previous: Option<Decimal>,
    },
    Allowance {
        key: AllowanceKey,
        previous: Option<Decimal>,
    },
    /// A record was appended to the transfer history.
    Transfer,
}

#[derive(Debug, Default)]
pub(crate) struct Journal {
    entries: Vec<JournalEntry>,
    /// Journal length at the moment each open savepoint was taken.
    marks: Vec<usize>,
}

impl Journal {
    pub(crate) fn is_recording(&self) -> bool {
        !self.marks.is_empty()
    }

    pub(crate) fn record(&mut self, entry: JournalEntry) {
        if self.is_recording() {
            self.entries.push(entry);
        }
    }

    pub(crate) fn open(&mut self) -> Savepoint {
        self.marks.push(self.entries.len());
        Savepoint(self.marks.len() - 1)
    }

    /// Close `savepoint` and every savepoint nested inside it, returning
    /// the entries to undo (newest first).
    pub(crate) fn unwind(&mut self, savepoint: Savepoint) -> Vec<JournalEntry> {
        let Some(&mark) = self.marks.get(savepoint.0) else {
            tracing::warn!(savepoint = savepoint.0, "Rollback of unknown savepoint ignored");
            return Vec::new();
        };
        self.marks.truncate(savepoint.0);
        let mut undo = self.entries.split_off(mark);
        undo.reverse();
        if self.marks.is_empty() {
            self.entries.clear();
        }
        undo
    }

    /// Close `savepoint` keeping its writes.
    pub(crate) fn release(&mut self, savepoint: Savepoint) {
        if savepoint.0 >= self.marks.len() {
            tracing::warn!(savepoint = savepoint.0, "Release of unknown savepoint ignored");
            return;
        }
        self.marks.truncate(savepoint.0);
        if self.marks.is_empty() {
            self.entries.clear();
        }
    }

    pub(crate) fn depth(&self) -> usize {
        self.marks.len()
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}
