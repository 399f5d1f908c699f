//! Collateralized synthetic-asset issuance engine.
//!
//! Accounts deposit approved collateral assets and mint a single pegged
//! synthetic token against them. Solvency is enforced through a health
//! factor with a 50% liquidation threshold; positions that fall below 1.0
//! can be liquidated by third parties for a 10% collateral bonus.
//!
//! The crate is a host-independent library: token movement, price feeds,
//! time and event delivery are injected capabilities, and every operation
//! is deterministic given those inputs.

pub mod engine;
pub mod error;
pub mod events;
pub mod health;
pub mod math;
pub mod oracle;
pub mod registry;
pub mod state;
pub mod token;

pub use engine::SynthEngine;
pub use error::{EngineError, ErrorKind};
pub use events::{EventSink, LedgerEvent, MemoryEventSink, NullEventSink};
pub use health::{
    calculate_health_factor, HEALTH_FACTOR_UNBOUNDED, LIQUIDATION_BONUS_PCT,
    LIQUIDATION_THRESHOLD_PCT, MIN_HEALTH_FACTOR,
};
pub use math::{WAD, WAD_DECIMALS};
pub use oracle::{
    Clock, OracleAdapter, PriceFeed, RoundData, SystemClock, DEFAULT_MAX_PRICE_AGE,
};
pub use registry::CollateralRegistry;
pub use state::{AccountId, AssetId, Ledger, Position, Staging};
pub use token::{CollateralCustody, MintAuthority, TokenError};
