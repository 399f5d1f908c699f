//! Shared fixtures: an in-memory token bank, a manual clock and scripted
//! price feeds, wired into a ready-to-use engine harness.
#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::Rc;

use synth_engine::{
    AccountId, AssetId, Clock, CollateralCustody, MemoryEventSink, MintAuthority, OracleAdapter,
    PriceFeed, RoundData, SynthEngine, TokenError, WAD,
};

pub const PRICE_DECIMALS: u8 = 8;
pub const MAX_PRICE_AGE: u64 = 3 * 60 * 60;
pub const WETH_PRICE_USD: u128 = 2_000;
pub const WBTC_PRICE_USD: u128 = 30_000;

pub fn synth() -> AssetId {
    AssetId::from_label("susd")
}

pub fn weth() -> AssetId {
    AssetId::from_label("weth")
}

pub fn wbtc() -> AssetId {
    AssetId::from_label("wbtc")
}

pub fn alice() -> AccountId {
    AccountId::from_label("alice")
}

pub fn bob() -> AccountId {
    AccountId::from_label("bob")
}

fn custody_vault() -> AccountId {
    AccountId::from_label("vault")
}

#[derive(Default)]
struct BankState {
    balances: BTreeMap<(AssetId, AccountId), u128>,
    supply: u128,
    refuse_pulls: bool,
    refuse_pushes: bool,
    refuse_issue: bool,
    refuse_destroy: bool,
}

/// In-memory token bank playing both capability roles. Handles share one
/// underlying state, so tests keep visibility after moving handles into
/// the engine.
#[derive(Clone, Default)]
pub struct Bank {
    inner: Rc<RefCell<BankState>>,
}

impl Bank {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handle(&self) -> Self {
        self.clone()
    }

    /// Seeds a holder balance directly, outside any engine operation.
    pub fn credit(&self, asset: &AssetId, owner: &AccountId, amount: u128) {
        *self
            .inner
            .borrow_mut()
            .balances
            .entry((*asset, *owner))
            .or_default() += amount;
    }

    pub fn supply(&self) -> u128 {
        self.inner.borrow().supply
    }

    pub fn refuse_pulls(&self, refuse: bool) {
        self.inner.borrow_mut().refuse_pulls = refuse;
    }

    pub fn refuse_pushes(&self, refuse: bool) {
        self.inner.borrow_mut().refuse_pushes = refuse;
    }

    pub fn refuse_issue(&self, refuse: bool) {
        self.inner.borrow_mut().refuse_issue = refuse;
    }

    pub fn refuse_destroy(&self, refuse: bool) {
        self.inner.borrow_mut().refuse_destroy = refuse;
    }

    fn transfer(
        &self,
        asset: &AssetId,
        from: &AccountId,
        to: &AccountId,
        amount: u128,
    ) -> Result<(), TokenError> {
        let mut state = self.inner.borrow_mut();
        let source = state.balances.entry((*asset, *from)).or_default();
        if *source < amount {
            return Err(TokenError::InsufficientBalance);
        }
        *source -= amount;
        *state.balances.entry((*asset, *to)).or_default() += amount;
        Ok(())
    }
}

impl CollateralCustody for Bank {
    fn pull(&mut self, asset: &AssetId, from: &AccountId, amount: u128) -> Result<(), TokenError> {
        if self.inner.borrow().refuse_pulls {
            return Err(TokenError::Refused);
        }
        self.transfer(asset, from, &custody_vault(), amount)
    }

    fn push(&mut self, asset: &AssetId, to: &AccountId, amount: u128) -> Result<(), TokenError> {
        if self.inner.borrow().refuse_pushes {
            return Err(TokenError::Refused);
        }
        self.transfer(asset, &custody_vault(), to, amount)
    }

    fn balance(&self, asset: &AssetId, owner: &AccountId) -> u128 {
        self.inner
            .borrow()
            .balances
            .get(&(*asset, *owner))
            .copied()
            .unwrap_or(0)
    }
}

impl MintAuthority for Bank {
    fn issue(&mut self, to: &AccountId, amount: u128) -> Result<(), TokenError> {
        let mut state = self.inner.borrow_mut();
        if state.refuse_issue {
            return Err(TokenError::Refused);
        }
        state.supply += amount;
        *state.balances.entry((synth(), *to)).or_default() += amount;
        Ok(())
    }

    fn destroy(&mut self, amount: u128) -> Result<(), TokenError> {
        let mut state = self.inner.borrow_mut();
        if state.refuse_destroy {
            return Err(TokenError::Refused);
        }
        let vault = state.balances.entry((synth(), custody_vault())).or_default();
        if *vault < amount {
            return Err(TokenError::InsufficientBalance);
        }
        *vault -= amount;
        state.supply -= amount;
        Ok(())
    }

    fn total_supply(&self) -> u128 {
        self.inner.borrow().supply
    }
}

/// Test-controlled time source.
#[derive(Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<u64>>,
}

impl ManualClock {
    pub fn at(now: u64) -> Self {
        let clock = Self::default();
        clock.now.set(now);
        clock
    }

    pub fn handle(&self) -> Self {
        self.clone()
    }

    pub fn set(&self, now: u64) {
        self.now.set(now);
    }

    pub fn advance(&self, secs: u64) {
        self.now.set(self.now.get() + secs);
    }

    pub fn now(&self) -> u64 {
        self.now.get()
    }
}

impl Clock for ManualClock {
    fn unix_timestamp(&self) -> u64 {
        self.now.get()
    }
}

/// Price feed whose readings the test rewrites at will.
#[derive(Clone)]
pub struct ScriptedFeed {
    decimals: u8,
    round: Rc<RefCell<Option<RoundData>>>,
}

impl ScriptedFeed {
    pub fn new(decimals: u8, price_usd: u128, observed_at: u64) -> Self {
        Self {
            decimals,
            round: Rc::new(RefCell::new(Some(RoundData {
                round_id: 1,
                price: price_usd * 10u128.pow(decimals as u32),
                observed_at,
            }))),
        }
    }

    pub fn handle(&self) -> Self {
        self.clone()
    }

    /// Publishes a new whole-dollar price in a fresh round.
    pub fn set_price_usd(&self, price_usd: u128, observed_at: u64) {
        let mut round = self.round.borrow_mut();
        let next_id = round.map(|r| r.round_id + 1).unwrap_or(1);
        *round = Some(RoundData {
            round_id: next_id,
            price: price_usd * 10u128.pow(self.decimals as u32),
            observed_at,
        });
    }

    pub fn set_round(&self, data: Option<RoundData>) {
        *self.round.borrow_mut() = data;
    }
}

impl PriceFeed for ScriptedFeed {
    fn decimals(&self) -> u8 {
        self.decimals
    }

    fn latest_round(&self) -> Option<RoundData> {
        *self.round.borrow()
    }
}

/// Fully wired engine plus handles to every injected capability.
pub struct Harness {
    pub engine: SynthEngine,
    pub bank: Bank,
    pub clock: ManualClock,
    pub weth_feed: ScriptedFeed,
    pub wbtc_feed: ScriptedFeed,
    pub events: MemoryEventSink,
}

impl Harness {
    /// Two collateral assets at $2000 and $30000, clock at t=1000, both
    /// feeds fresh.
    pub fn new() -> Self {
        let bank = Bank::new();
        let clock = ManualClock::at(1_000);
        let weth_feed = ScriptedFeed::new(PRICE_DECIMALS, WETH_PRICE_USD, 1_000);
        let wbtc_feed = ScriptedFeed::new(PRICE_DECIMALS, WBTC_PRICE_USD, 1_000);
        let events = MemoryEventSink::new();

        let engine = SynthEngine::new(
            synth(),
            vec![weth(), wbtc()],
            vec![
                OracleAdapter::new(Box::new(weth_feed.handle()), MAX_PRICE_AGE).unwrap(),
                OracleAdapter::new(Box::new(wbtc_feed.handle()), MAX_PRICE_AGE).unwrap(),
            ],
            Box::new(bank.handle()),
            Box::new(bank.handle()),
            Box::new(clock.handle()),
            Box::new(events.handle()),
        )
        .unwrap();

        Self {
            engine,
            bank,
            clock,
            weth_feed,
            wbtc_feed,
            events,
        }
    }

    /// Seeds `account` with WETH and opens a position: `collateral` WETH
    /// deposited, `debt` synthetic minted.
    pub fn open_position(&mut self, account: &AccountId, collateral: u128, debt: u128) {
        self.bank.credit(&weth(), account, collateral);
        self.engine.deposit(account, &weth(), collateral).unwrap();
        if debt > 0 {
            self.engine.mint(account, debt).unwrap();
        }
    }
}

pub fn wad(units: u128) -> u128 {
    units * WAD
}
