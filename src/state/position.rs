use borsh::{BorshDeserialize, BorshSerialize};
use std::collections::BTreeMap;

use crate::error::EngineError;
use crate::state::AssetId;

/// Per-account collateral and debt state.
///
/// Materialized lazily on first deposit and never destroyed; a position is
/// logically empty once every collateral balance and the debt return to
/// zero. Quantities are non-negative by type and mutated with checked
/// arithmetic only.
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Position {
    /// Deposited quantity per collateral asset. Zeroed entries are pruned.
    pub collateral: BTreeMap<AssetId, u128>,
    /// Outstanding minted debt, on the synthetic token's own scale.
    pub debt: u128,
}

impl Position {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn collateral_of(&self, asset: &AssetId) -> u128 {
        self.collateral.get(asset).copied().unwrap_or(0)
    }

    pub fn add_collateral(&mut self, asset: AssetId, amount: u128) -> Result<(), EngineError> {
        let balance = self.collateral.entry(asset).or_insert(0);
        *balance = balance
            .checked_add(amount)
            .ok_or(EngineError::ArithmeticOverflow)?;
        Ok(())
    }

    /// Removes collateral, rejecting any decrement that would go negative.
    pub fn remove_collateral(&mut self, asset: &AssetId, amount: u128) -> Result<(), EngineError> {
        let balance = self.collateral_of(asset);
        let remaining = balance
            .checked_sub(amount)
            .ok_or(EngineError::InsufficientCollateral)?;
        if remaining == 0 {
            self.collateral.remove(asset);
        } else {
            self.collateral.insert(*asset, remaining);
        }
        Ok(())
    }

    pub fn add_debt(&mut self, amount: u128) -> Result<(), EngineError> {
        self.debt = self
            .debt
            .checked_add(amount)
            .ok_or(EngineError::ArithmeticOverflow)?;
        Ok(())
    }

    pub fn remove_debt(&mut self, amount: u128) -> Result<(), EngineError> {
        self.debt = self
            .debt
            .checked_sub(amount)
            .ok_or(EngineError::InsufficientDebt)?;
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.debt == 0 && self.collateral.is_empty()
    }
}
