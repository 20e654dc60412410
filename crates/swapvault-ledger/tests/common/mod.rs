//! Shared fixtures for the escrow ledger integration tests.

#![allow(dead_code)]

use rust_decimal::Decimal;
use swapvault_assets::TokenLedger;
use swapvault_ledger::EscrowLedger;
use swapvault_types::{
    AccountId, AssetId, AssetTransfer, EscrowConfig, OrderId, OrderRequest, Result,
};

pub fn dec(n: i64) -> Decimal {
    Decimal::new(n, 0)
}

pub fn tka() -> AssetId {
    AssetId::from("TKA")
}

pub fn tkb() -> AssetId {
    AssetId::from("TKB")
}

/// Route engine logs to the test writer. `RUST_LOG=debug` to see them.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn request(
    depositor: AccountId,
    offered_asset: &AssetId,
    offered_amount: Decimal,
    requested_asset: &AssetId,
    requested_amount: Decimal,
) -> OrderRequest {
    OrderRequest {
        depositor,
        offered_asset: offered_asset.clone(),
        offered_amount,
        requested_asset: requested_asset.clone(),
        requested_amount,
    }
}

/// A ledger wired to an in-memory token ledger.
pub struct Harness {
    pub ledger: EscrowLedger,
    pub tokens: TokenLedger,
    pub custody: AccountId,
}

impl Harness {
    pub fn new() -> Self {
        init_tracing();
        let custody = AccountId::new();
        Self {
            ledger: EscrowLedger::new(EscrowConfig::with_custody(custody)),
            tokens: TokenLedger::new(),
            custody,
        }
    }

    pub fn fund(&mut self, account: AccountId, asset: &AssetId, amount: Decimal) {
        self.tokens.mint(account, asset, amount);
    }

    /// Let the ledger's custody account pull up to `amount` from `owner`.
    pub fn authorize(&mut self, owner: AccountId, asset: &AssetId, amount: Decimal) {
        self.tokens.approve(owner, self.custody, asset, amount);
    }

    pub fn fund_and_authorize(&mut self, account: AccountId, asset: &AssetId, amount: Decimal) {
        self.fund(account, asset, amount);
        self.authorize(account, asset, amount);
    }

    pub fn create(
        &mut self,
        depositor: AccountId,
        offered_asset: &AssetId,
        offered_amount: Decimal,
        requested_asset: &AssetId,
        requested_amount: Decimal,
    ) -> Result<OrderId> {
        self.ledger.create_order(
            &mut self.tokens,
            request(
                depositor,
                offered_asset,
                offered_amount,
                requested_asset,
                requested_amount,
            ),
        )
    }

    pub fn complete(&mut self, settler: AccountId, order_id: OrderId) -> Result<()> {
        self.ledger
            .complete_order(&mut self.tokens, settler, order_id)
    }

    pub fn balance(&self, account: AccountId, asset: &AssetId) -> Decimal {
        self.tokens.balance_of(&account, asset)
    }

    pub fn custody_balance(&self, asset: &AssetId) -> Decimal {
        self.tokens.balance_of(&self.custody, asset)
    }

    /// Depositor escrows 100 TKA for 20 TKB; settler holds and has
    /// authorized 20 TKB. Returns `(depositor, settler, order 0)`.
    pub fn standard_order(&mut self) -> (AccountId, AccountId, OrderId) {
        let depositor = AccountId::new();
        let settler = AccountId::new();
        self.fund_and_authorize(depositor, &tka(), dec(100));
        self.fund_and_authorize(settler, &tkb(), dec(20));
        let id = self
            .create(depositor, &tka(), dec(100), &tkb(), dec(20))
            .expect("standard order should be created");
        (depositor, settler, id)
    }
}
