//! Event records emitted for external observers and test assertions.

use borsh::{BorshDeserialize, BorshSerialize};
use std::cell::RefCell;
use std::rc::Rc;

use crate::state::{AccountId, AssetId};

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub enum LedgerEvent {
    CollateralDeposited {
        account: AccountId,
        asset: AssetId,
        amount: u128,
    },
    /// Emitted for user redemptions (`from == to`'s owner chose the
    /// beneficiary) and for liquidation seizures (`to` is the liquidator).
    CollateralRedeemed {
        from: AccountId,
        to: AccountId,
        asset: AssetId,
        amount: u128,
    },
}

/// Observer for committed operations. Events are recorded only after an
/// operation commits; discarded operations emit nothing.
pub trait EventSink {
    fn record(&mut self, event: LedgerEvent);
}

/// Sink that drops everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullEventSink;

impl EventSink for NullEventSink {
    fn record(&mut self, _event: LedgerEvent) {}
}

/// In-memory sink with a cloneable handle, so observers keep access after
/// the sink itself moves into the engine.
#[derive(Debug, Default, Clone)]
pub struct MemoryEventSink {
    events: Rc<RefCell<Vec<LedgerEvent>>>,
}

impl MemoryEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle sharing the same underlying log.
    pub fn handle(&self) -> Self {
        self.clone()
    }

    pub fn events(&self) -> Vec<LedgerEvent> {
        self.events.borrow().clone()
    }

    pub fn drain(&self) -> Vec<LedgerEvent> {
        self.events.borrow_mut().drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.events.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.borrow().is_empty()
    }
}

impl EventSink for MemoryEventSink {
    fn record(&mut self, event: LedgerEvent) {
        self.events.borrow_mut().push(event);
    }
}
