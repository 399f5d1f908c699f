//! Solvency constants and the standalone health-factor calculation.

use crate::error::EngineError;
use crate::math::{mul_div, pct, WAD};

/// Percentage of raw collateral value counted toward backing debt. At 50,
/// a health factor of exactly 1.0 requires 200% raw collateralization.
pub const LIQUIDATION_THRESHOLD_PCT: u128 = 50;

/// Incentive premium paid to a liquidator in seized collateral.
pub const LIQUIDATION_BONUS_PCT: u128 = 10;

/// Minimum acceptable health factor (1.0 on the WAD scale). Any mutating
/// operation leaving its acting account below this must discard all of its
/// effects.
pub const MIN_HEALTH_FACTOR: u128 = WAD;

/// Sentinel health factor for debt-free accounts: no debt, no risk.
pub const HEALTH_FACTOR_UNBOUNDED: u128 = u128::MAX;

/// Health factor of a position given its total collateral value (USD, WAD
/// scale) and outstanding debt.
///
/// Pure and exposed standalone: liquidation sizing and external
/// calculators use it against hypothetical states.
pub fn calculate_health_factor(
    collateral_value_usd: u128,
    debt: u128,
) -> Result<u128, EngineError> {
    if debt == 0 {
        return Ok(HEALTH_FACTOR_UNBOUNDED);
    }
    let adjusted = pct(collateral_value_usd, LIQUIDATION_THRESHOLD_PCT)?;
    mul_div(adjusted, WAD, debt)
}
