//! In-memory fungible-asset ledger.
//!
//! Tracks per-(account, asset) balances and per-(owner, spender, asset)
//! allowances. Every transfer moves a strictly positive amount and is
//! atomic: all checks run before the first write, and a receive hook that
//! vetoes a transfer undoes the transfer's own writes before the error is
//! returned.

use std::collections::HashMap;

use rust_decimal::Decimal;
use swapvault_types::{
    AccountId, AssetId, AssetTransfer, Detached, EscrowReentry, Savepoint, TransferError,
    TransferResult,
};

use crate::journal::{AllowanceKey, BalanceKey, Journal, JournalEntry};

/// One completed movement of funds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRecord {
    pub from: AccountId,
    pub to: AccountId,
    pub asset: AssetId,
    pub amount: Decimal,
}

/// Callback run after an account has been credited. Returning an error
/// vetoes the transfer.
pub type ReceiveHook =
    Box<dyn FnMut(&TransferRecord, &mut dyn EscrowReentry) -> TransferResult<()> + Send + Sync>;

/// Balance and allowance book for any number of fungible assets.
#[derive(Default)]
pub struct TokenLedger {
    balances: HashMap<BalanceKey, Decimal>,
    allowances: HashMap<AllowanceKey, Decimal>,
    history: Vec<TransferRecord>,
    hooks: HashMap<AccountId, ReceiveHook>,
    journal: Journal,
}

impl TokenLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create new units of `asset` in `account`.
    pub fn mint(&mut self, account: AccountId, asset: &AssetId, amount: Decimal) {
        let balance = self.balance_of(&account, asset);
        self.write_balance((account, asset.clone()), balance + amount);
    }

    /// Authorize `spender` to move up to `amount` of the owner's `asset`.
    /// Replaces any previous authorization.
    pub fn approve(
        &mut self,
        owner: AccountId,
        spender: AccountId,
        asset: &AssetId,
        amount: Decimal,
    ) {
        self.write_allowance((owner, spender, asset.clone()), amount);
    }

    #[must_use]
    pub fn allowance(&self, owner: &AccountId, spender: &AccountId, asset: &AssetId) -> Decimal {
        self.allowances
            .get(&(*owner, *spender, asset.clone()))
            .copied()
            .unwrap_or(Decimal::ZERO)
    }

    /// Sum of every account's balance of `asset`.
    #[must_use]
    pub fn total_supply(&self, asset: &AssetId) -> Decimal {
        self.balances
            .iter()
            .filter(|((_, a), _)| a == asset)
            .map(|(_, amount)| *amount)
            .sum()
    }

    /// Owner-initiated transfer, outside any escrow operation.
    pub fn transfer(
        &mut self,
        from: AccountId,
        to: AccountId,
        asset: &AssetId,
        amount: Decimal,
    ) -> TransferResult<()> {
        ensure_positive(amount)?;
        self.ensure_balance(&from, asset, amount)?;
        let sp = self.savepoint();
        self.apply_transfer(&mut Detached, sp, from, to, asset, amount)
    }

    /// Register a receive hook for `account`, replacing any previous one.
    pub fn on_receive<F>(&mut self, account: AccountId, hook: F)
    where
        F: FnMut(&TransferRecord, &mut dyn EscrowReentry) -> TransferResult<()>
            + Send
            + Sync
            + 'static,
    {
        self.hooks.insert(account, Box::new(hook));
    }

    pub fn clear_hook(&mut self, account: &AccountId) {
        self.hooks.remove(account);
    }

    /// Every committed transfer, oldest first.
    #[must_use]
    pub fn transfers(&self) -> &[TransferRecord] {
        &self.history
    }

    /// Number of savepoints currently open.
    #[must_use]
    pub fn open_savepoints(&self) -> usize {
        self.journal.depth()
    }

    // ── internals ──────────────────────────────────────────────────────

    fn ensure_balance(
        &self,
        account: &AccountId,
        asset: &AssetId,
        amount: Decimal,
    ) -> TransferResult<()> {
        let available = self.balance_of(account, asset);
        if available < amount {
            return Err(TransferError::InsufficientBalance {
                account: *account,
                asset: asset.clone(),
                needed: amount,
                available,
            });
        }
        Ok(())
    }

    /// Move the funds, run the recipient's hook, and close `sp` either way.
    fn apply_transfer(
        &mut self,
        caller: &mut dyn EscrowReentry,
        sp: Savepoint,
        from: AccountId,
        to: AccountId,
        asset: &AssetId,
        amount: Decimal,
    ) -> TransferResult<()> {
        let debited = self.balance_of(&from, asset) - amount;
        self.write_balance((from, asset.clone()), debited);
        let credited = self.balance_of(&to, asset) + amount;
        self.write_balance((to, asset.clone()), credited);

        let record = TransferRecord {
            from,
            to,
            asset: asset.clone(),
            amount,
        };
        self.history.push(record.clone());
        self.journal.record(JournalEntry::Transfer);

        if let Err(err) = self.notify(caller, &record) {
            tracing::debug!(
                from = %from.short(),
                to = %to.short(),
                asset = %asset,
                amount = %amount,
                error = %err,
                "Transfer vetoed by receive hook"
            );
            self.rollback_to(sp);
            return Err(err);
        }
        self.release(sp);
        Ok(())
    }

    fn notify(
        &mut self,
        caller: &mut dyn EscrowReentry,
        record: &TransferRecord,
    ) -> TransferResult<()> {
        let Some(mut hook) = self.hooks.remove(&record.to) else {
            return Ok(());
        };
        // A hook that panics is dropped with the unwinding frame.
        let result = hook(record, caller);
        // A hook may not replace itself mid-call; keep the original.
        self.hooks.entry(record.to).or_insert(hook);
        result
    }

    fn write_balance(&mut self, key: BalanceKey, value: Decimal) {
        let previous = self.balances.insert(key.clone(), value);
        self.journal.record(JournalEntry::Balance { key, previous });
    }

    fn write_allowance(&mut self, key: AllowanceKey, value: Decimal) {
        let previous = self.allowances.insert(key.clone(), value);
        self.journal.record(JournalEntry::Allowance { key, previous });
    }

    fn undo(&mut self, entries: Vec<JournalEntry>) {
        for entry in entries {
            match entry {
                JournalEntry::Balance { key, previous } => match previous {
                    Some(value) => {
                        self.balances.insert(key, value);
                    }
                    None => {
                        self.balances.remove(&key);
                    }
                },
                JournalEntry::Allowance { key, previous } => match previous {
                    Some(value) => {
                        self.allowances.insert(key, value);
                    }
                    None => {
                        self.allowances.remove(&key);
                    }
                },
                JournalEntry::Transfer => {
                    self.history.pop();
                }
            }
        }
    }
}

impl AssetTransfer for TokenLedger {
    fn balance_of(&self, account: &AccountId, asset: &AssetId) -> Decimal {
        self.balances
            .get(&(*account, asset.clone()))
            .copied()
            .unwrap_or(Decimal::ZERO)
    }

    fn pull_into(
        &mut self,
        caller: &mut dyn EscrowReentry,
        custody: &AccountId,
        from: &AccountId,
        asset: &AssetId,
        amount: Decimal,
    ) -> TransferResult<()> {
        ensure_positive(amount)?;
        let approved = self.allowance(from, custody, asset);
        if approved < amount {
            return Err(TransferError::InsufficientAllowance {
                owner: *from,
                spender: *custody,
                asset: asset.clone(),
                needed: amount,
                approved,
            });
        }
        self.ensure_balance(from, asset, amount)?;

        let sp = self.savepoint();
        self.write_allowance((*from, *custody, asset.clone()), approved - amount);
        self.apply_transfer(caller, sp, *from, *custody, asset, amount)
    }

    fn push_from(
        &mut self,
        caller: &mut dyn EscrowReentry,
        custody: &AccountId,
        to: &AccountId,
        asset: &AssetId,
        amount: Decimal,
    ) -> TransferResult<()> {
        ensure_positive(amount)?;
        self.ensure_balance(custody, asset, amount)?;
        let sp = self.savepoint();
        self.apply_transfer(caller, sp, *custody, *to, asset, amount)
    }

    fn savepoint(&mut self) -> Savepoint {
        self.journal.open()
    }

    fn rollback_to(&mut self, savepoint: Savepoint) {
        let entries = self.journal.unwind(savepoint);
        self.undo(entries);
    }

    fn release(&mut self, savepoint: Savepoint) {
        self.journal.release(savepoint);
    }
}

fn ensure_positive(amount: Decimal) -> TransferResult<()> {
    if amount <= Decimal::ZERO {
        return Err(TransferError::InvalidAmount { amount });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;

    fn tka() -> AssetId {
        AssetId::from("TKA")
    }

    fn dec(n: i64) -> Decimal {
        Decimal::new(n, 0)
    }

    #[test]
    fn mint_increases_balance_and_supply() {
        let mut ledger = TokenLedger::new();
        let alice = AccountId::new();
        ledger.mint(alice, &tka(), dec(100));
        assert_eq!(ledger.balance_of(&alice, &tka()), dec(100));
        assert_eq!(ledger.total_supply(&tka()), dec(100));
    }

    #[test]
    fn pull_requires_allowance() {
        let mut ledger = TokenLedger::new();
        let (alice, custody) = (AccountId::new(), AccountId::new());
        ledger.mint(alice, &tka(), dec(100));

        let err = ledger
            .pull_into(&mut Detached, &custody, &alice, &tka(), dec(50))
            .unwrap_err();
        assert!(matches!(err, TransferError::InsufficientAllowance { .. }));
        assert_eq!(ledger.balance_of(&alice, &tka()), dec(100));
        assert!(ledger.transfers().is_empty());
    }

    #[test]
    fn non_positive_amounts_are_rejected_before_any_check() {
        let mut ledger = TokenLedger::new();
        let (alice, bob, custody) = (AccountId::new(), AccountId::new(), AccountId::new());
        ledger.mint(custody, &tka(), dec(100));

        for amount in [dec(-5), Decimal::ZERO] {
            let err = ledger.transfer(alice, bob, &tka(), amount).unwrap_err();
            assert_eq!(err, TransferError::InvalidAmount { amount });

            let err = ledger
                .pull_into(&mut Detached, &custody, &alice, &tka(), amount)
                .unwrap_err();
            assert_eq!(err, TransferError::InvalidAmount { amount });

            let err = ledger
                .push_from(&mut Detached, &custody, &bob, &tka(), amount)
                .unwrap_err();
            assert_eq!(err, TransferError::InvalidAmount { amount });
        }

        assert_eq!(ledger.balance_of(&alice, &tka()), Decimal::ZERO);
        assert_eq!(ledger.balance_of(&bob, &tka()), Decimal::ZERO);
        assert_eq!(ledger.balance_of(&custody, &tka()), dec(100));
        assert_eq!(ledger.allowance(&alice, &custody, &tka()), Decimal::ZERO);
        assert!(ledger.transfers().is_empty());
        assert_eq!(ledger.open_savepoints(), 0);
    }

    #[test]
    fn pull_requires_balance() {
        let mut ledger = TokenLedger::new();
        let (alice, custody) = (AccountId::new(), AccountId::new());
        ledger.mint(alice, &tka(), dec(10));
        ledger.approve(alice, custody, &tka(), dec(50));

        let err = ledger
            .pull_into(&mut Detached, &custody, &alice, &tka(), dec(50))
            .unwrap_err();
        assert!(matches!(err, TransferError::InsufficientBalance { .. }));
        assert_eq!(ledger.allowance(&alice, &custody, &tka()), dec(50));
    }

    #[test]
    fn pull_consumes_allowance_and_moves_funds() {
        let mut ledger = TokenLedger::new();
        let (alice, custody) = (AccountId::new(), AccountId::new());
        ledger.mint(alice, &tka(), dec(100));
        ledger.approve(alice, custody, &tka(), dec(80));

        ledger
            .pull_into(&mut Detached, &custody, &alice, &tka(), dec(60))
            .unwrap();
        assert_eq!(ledger.balance_of(&alice, &tka()), dec(40));
        assert_eq!(ledger.balance_of(&custody, &tka()), dec(60));
        assert_eq!(ledger.allowance(&alice, &custody, &tka()), dec(20));
        assert_eq!(ledger.total_supply(&tka()), dec(100));
        assert_eq!(ledger.transfers().len(), 1);
    }

    #[test]
    fn push_requires_custody_balance() {
        let mut ledger = TokenLedger::new();
        let (bob, custody) = (AccountId::new(), AccountId::new());
        ledger.mint(custody, &tka(), dec(5));
        let err = ledger
            .push_from(&mut Detached, &custody, &bob, &tka(), dec(6))
            .unwrap_err();
        assert!(matches!(err, TransferError::InsufficientBalance { .. }));
        ledger
            .push_from(&mut Detached, &custody, &bob, &tka(), dec(5))
            .unwrap();
        assert_eq!(ledger.balance_of(&bob, &tka()), dec(5));
    }

    #[test]
    fn rollback_restores_balances_allowances_and_history() {
        let mut ledger = TokenLedger::new();
        let (alice, bob, custody) = (AccountId::new(), AccountId::new(), AccountId::new());
        ledger.mint(alice, &tka(), dec(100));
        ledger.approve(alice, custody, &tka(), dec(100));

        let sp = ledger.savepoint();
        ledger
            .pull_into(&mut Detached, &custody, &alice, &tka(), dec(100))
            .unwrap();
        ledger
            .push_from(&mut Detached, &custody, &bob, &tka(), dec(30))
            .unwrap();
        ledger.rollback_to(sp);

        assert_eq!(ledger.balance_of(&alice, &tka()), dec(100));
        assert_eq!(ledger.balance_of(&custody, &tka()), Decimal::ZERO);
        assert_eq!(ledger.balance_of(&bob, &tka()), Decimal::ZERO);
        assert_eq!(ledger.allowance(&alice, &custody, &tka()), dec(100));
        assert!(ledger.transfers().is_empty());
        assert_eq!(ledger.open_savepoints(), 0);
    }

    #[test]
    fn release_keeps_writes() {
        let mut ledger = TokenLedger::new();
        let (alice, bob) = (AccountId::new(), AccountId::new());
        ledger.mint(alice, &tka(), dec(10));
        let sp = ledger.savepoint();
        ledger.transfer(alice, bob, &tka(), dec(4)).unwrap();
        ledger.release(sp);
        assert_eq!(ledger.balance_of(&bob, &tka()), dec(4));
        assert_eq!(ledger.open_savepoints(), 0);
    }

    #[test]
    fn hook_veto_undoes_transfer() {
        let mut ledger = TokenLedger::new();
        let (alice, bob) = (AccountId::new(), AccountId::new());
        ledger.mint(alice, &tka(), dec(10));
        ledger.on_receive(
            bob,
            move |_: &TransferRecord, _: &mut dyn EscrowReentry| {
                Err(TransferError::Rejected {
                    account: bob,
                    reason: "not accepting TKA".into(),
                })
            },
        );

        let err = ledger.transfer(alice, bob, &tka(), dec(4)).unwrap_err();
        assert!(matches!(err, TransferError::Rejected { .. }));
        assert_eq!(ledger.balance_of(&alice, &tka()), dec(10));
        assert_eq!(ledger.balance_of(&bob, &tka()), Decimal::ZERO);
        assert!(ledger.transfers().is_empty());
    }

    #[test]
    fn hook_sees_record_and_survives_call() {
        let mut ledger = TokenLedger::new();
        let (alice, bob) = (AccountId::new(), AccountId::new());
        ledger.mint(alice, &tka(), dec(10));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        ledger.on_receive(
            bob,
            move |record: &TransferRecord, _: &mut dyn EscrowReentry| {
                sink.lock().unwrap().push(record.amount);
                Ok(())
            },
        );

        ledger.transfer(alice, bob, &tka(), dec(3)).unwrap();
        ledger.transfer(alice, bob, &tka(), dec(2)).unwrap();
        assert_eq!(*seen.lock().unwrap(), vec![dec(3), dec(2)]);
    }
}
