//! Price feed capability and the validating adapter in front of it.
//!
//! The engine never consumes a raw feed reading. Every price goes through
//! an [`OracleAdapter`], which rejects readings older than a configured
//! freshness bound, rejects round-id regressions against the prior read,
//! and normalizes the magnitude to the fixed 18-decimal scale.

use borsh::{BorshDeserialize, BorshSerialize};
use std::cell::Cell;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::EngineError;
use crate::math::WAD_DECIMALS;

/// Staleness bound applied when none is configured: three hours.
pub const DEFAULT_MAX_PRICE_AGE: u64 = 3 * 60 * 60;

/// Time source for staleness checks. Injected so operations stay
/// deterministic under test.
pub trait Clock {
    fn unix_timestamp(&self) -> u64;
}

/// Wall-clock time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn unix_timestamp(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    }
}

/// One committed oracle observation. Read-only to the core; refreshed only
/// by the external price source.
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundData {
    pub round_id: u64,
    /// Price magnitude on the feed's own decimal scale.
    pub price: u128,
    /// Unix timestamp of the observation.
    pub observed_at: u64,
}

/// External price source for a single asset.
pub trait PriceFeed {
    /// Decimal places of the feed's price magnitude.
    fn decimals(&self) -> u8;

    /// Latest committed reading. A feed that cannot answer returns None and
    /// the adapter reports the price as stale.
    fn latest_round(&self) -> Option<RoundData>;
}

/// Staleness-validating, decimal-normalizing wrapper around one feed.
pub struct OracleAdapter {
    feed: Box<dyn PriceFeed>,
    max_age: u64,
    scale_up: u128,
    /// Highest round id observed so far; a lower id on a later read is a
    /// regression and the reading is rejected.
    last_round: Cell<u64>,
}

impl OracleAdapter {
    pub fn new(feed: Box<dyn PriceFeed>, max_age: u64) -> Result<Self, EngineError> {
        let decimals = feed.decimals();
        if decimals > WAD_DECIMALS {
            return Err(EngineError::UnsupportedDecimals);
        }
        let scale_up = 10u128.pow((WAD_DECIMALS - decimals) as u32);
        Ok(Self {
            feed,
            max_age,
            scale_up,
            last_round: Cell::new(0),
        })
    }

    pub fn with_default_max_age(feed: Box<dyn PriceFeed>) -> Result<Self, EngineError> {
        Self::new(feed, DEFAULT_MAX_PRICE_AGE)
    }

    /// Latest price normalized to the 18-decimal scale, validated for
    /// freshness against `now`.
    pub fn normalized_price(&self, now: u64) -> Result<u128, EngineError> {
        let reading = self.feed.latest_round().ok_or(EngineError::StalePrice)?;

        if reading.round_id < self.last_round.get() {
            tracing::warn!(
                round_id = reading.round_id,
                last_round = self.last_round.get(),
                "oracle round id regressed"
            );
            return Err(EngineError::StaleRound);
        }
        let age = now.saturating_sub(reading.observed_at);
        if age > self.max_age {
            tracing::warn!(age, max_age = self.max_age, "oracle reading too old");
            return Err(EngineError::StalePrice);
        }

        self.last_round.set(reading.round_id);
        reading
            .price
            .checked_mul(self.scale_up)
            .ok_or(EngineError::ArithmeticOverflow)
    }
}
