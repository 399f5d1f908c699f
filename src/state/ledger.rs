use borsh::{BorshDeserialize, BorshSerialize};
use std::collections::BTreeMap;

use crate::state::{AccountId, Position};

/// The shared position table. Owned by the engine; all mutation goes
/// through staged operations, never through direct external access.
#[derive(BorshSerialize, BorshDeserialize, Debug, Default, Clone, PartialEq, Eq)]
pub struct Ledger {
    accounts: BTreeMap<AccountId, Position>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, account: &AccountId) -> Option<&Position> {
        self.accounts.get(account)
    }

    /// Snapshot of an account's position; a default (empty) position for
    /// accounts that never deposited.
    pub fn position(&self, account: &AccountId) -> Position {
        self.accounts.get(account).cloned().unwrap_or_default()
    }

    /// Sum of outstanding debt across every position. Must equal the mint
    /// authority's tracked supply at all times.
    pub fn total_debt(&self) -> u128 {
        self.accounts.values().map(|p| p.debt).sum()
    }

    pub fn accounts(&self) -> impl Iterator<Item = (&AccountId, &Position)> {
        self.accounts.iter()
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    fn apply(&mut self, staged: BTreeMap<AccountId, Position>) {
        for (account, position) in staged {
            self.accounts.insert(account, position);
        }
    }

    pub fn to_bytes(&self) -> std::io::Result<Vec<u8>> {
        self.try_to_vec()
    }

    pub fn from_bytes(bytes: &[u8]) -> std::io::Result<Self> {
        Self::try_from_slice(bytes)
    }
}

/// Transaction-local scratch buffer.
///
/// Positions are copied out of the ledger on first touch and mutated here.
/// Nothing becomes visible until [`Staging::commit`]; dropping the buffer
/// discards every staged mutation. This is the explicit transaction
/// boundary: validate on the staged view, commit only on success.
#[derive(Debug, Default)]
pub struct Staging {
    scratch: BTreeMap<AccountId, Position>,
}

impl Staging {
    pub fn new() -> Self {
        Self::default()
    }

    /// Staged view of an account, reading through to the ledger for
    /// untouched positions.
    pub fn position(&self, ledger: &Ledger, account: &AccountId) -> Position {
        self.scratch
            .get(account)
            .cloned()
            .unwrap_or_else(|| ledger.position(account))
    }

    /// Mutable staged position, copied from the ledger on first touch.
    pub fn position_mut(&mut self, ledger: &Ledger, account: &AccountId) -> &mut Position {
        self.scratch
            .entry(*account)
            .or_insert_with(|| ledger.position(account))
    }

    /// Applies every staged position to the ledger.
    pub fn commit(self, ledger: &mut Ledger) {
        ledger.apply(self.scratch);
    }
}
