//! Fixed-point helpers on the 18-decimal (WAD) scale.
//!
//! Amounts, prices and health factors are all `u128` integers scaled by
//! `WAD`. Products of two WAD-scaled values exceed 128 bits, so `mul_div`
//! widens to 256 bits internally.

use crate::error::EngineError;

/// One unit on the fixed-point scale (1.0 == 10^18).
pub const WAD: u128 = 1_000_000_000_000_000_000;

/// Decimal places of the fixed-point scale.
pub const WAD_DECIMALS: u8 = 18;

const LO_MASK: u128 = (1u128 << 64) - 1;

/// Full 256-bit product of two u128 values, as (high, low) limbs.
fn mul_wide(a: u128, b: u128) -> (u128, u128) {
    let (a_hi, a_lo) = (a >> 64, a & LO_MASK);
    let (b_hi, b_lo) = (b >> 64, b & LO_MASK);

    let lo_lo = a_lo * b_lo;
    let lo_hi = a_lo * b_hi;
    let hi_lo = a_hi * b_lo;
    let hi_hi = a_hi * b_hi;

    // Middle column, with carries out of the low limb.
    let mid = (lo_lo >> 64) + (lo_hi & LO_MASK) + (hi_lo & LO_MASK);

    let low = (mid << 64) | (lo_lo & LO_MASK);
    let high = hi_hi + (lo_hi >> 64) + (hi_lo >> 64) + (mid >> 64);
    (high, low)
}

/// Divide the 256-bit value `(high, low)` by `divisor`, truncating.
///
/// Returns None when the divisor is zero or the quotient does not fit in
/// 128 bits. Shift-subtract long division; the wrap trick covers the case
/// where the running remainder carries past 128 bits.
fn div_wide(high: u128, low: u128, divisor: u128) -> Option<u128> {
    if divisor == 0 {
        return None;
    }
    if high >= divisor {
        // Quotient would need more than 128 bits.
        return None;
    }
    let mut quotient: u128 = 0;
    let mut remainder: u128 = high;
    for i in (0..128).rev() {
        let carry = remainder >> 127;
        remainder = (remainder << 1) | ((low >> i) & 1);
        quotient <<= 1;
        if carry == 1 || remainder >= divisor {
            remainder = remainder.wrapping_sub(divisor);
            quotient |= 1;
        }
    }
    Some(quotient)
}

/// `a * b / denominator` with a 256-bit intermediate, truncating.
pub fn mul_div(a: u128, b: u128, denominator: u128) -> Result<u128, EngineError> {
    if denominator == 0 {
        return Err(EngineError::DivisionByZero);
    }
    let (high, low) = mul_wide(a, b);
    div_wide(high, low, denominator).ok_or(EngineError::ArithmeticOverflow)
}

/// `amount * pct / 100`, the percentage idiom used for thresholds and the
/// liquidation bonus.
pub fn pct(amount: u128, pct: u128) -> Result<u128, EngineError> {
    mul_div(amount, pct, 100)
}

pub fn checked_add(a: u128, b: u128) -> Result<u128, EngineError> {
    a.checked_add(b).ok_or(EngineError::ArithmeticOverflow)
}

pub fn checked_sub(a: u128, b: u128) -> Result<u128, EngineError> {
    a.checked_sub(b).ok_or(EngineError::ArithmeticOverflow)
}
