use num_derive::FromPrimitive;
use thiserror::Error;

/// Coarse classification of engine failures.
///
/// Every error is terminal for the operation that raised it; the engine
/// never retries internally and never leaves partial state visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Rejected before any mutation was staged.
    Validation,
    /// Rejected after tentative mutation; the staged state was discarded.
    InvariantViolation,
    /// An external capability (transfer, issuance, destruction) refused.
    ExternalCallFailure,
    /// An oracle reading was too old or its round id regressed.
    StaleData,
}

#[derive(Error, Debug, Copy, Clone, PartialEq, Eq, FromPrimitive)]
pub enum EngineError {
    #[error("Amount must be greater than zero")]
    MustBePositive = 0,

    #[error("Asset is not registered as collateral")]
    NotAllowedAsset = 1,

    #[error("Collateral and oracle lists differ in length")]
    LengthMismatch = 2,

    #[error("Collateral asset registered twice")]
    DuplicateAsset = 3,

    #[error("Insufficient deposited collateral")]
    InsufficientCollateral = 4,

    #[error("Amount exceeds outstanding debt")]
    InsufficientDebt = 5,

    #[error("Token transfer failed")]
    TransferFailed = 6,

    #[error("Mint authority refused the request")]
    MintFailed = 7,

    #[error("Health factor below minimum")]
    BrokenHealthFactor = 8,

    #[error("Target health factor is not below minimum")]
    HealthFactorOk = 9,

    #[error("Liquidation did not improve target health factor")]
    HealthFactorNotImproved = 10,

    #[error("Oracle price is stale")]
    StalePrice = 11,

    #[error("Oracle round id regressed")]
    StaleRound = 12,

    #[error("Oracle feed reports more than 18 decimals")]
    UnsupportedDecimals = 13,

    #[error("Nested call into a state-mutating operation")]
    ReentrantCall = 14,

    #[error("Arithmetic overflow")]
    ArithmeticOverflow = 15,

    #[error("Division by zero")]
    DivisionByZero = 16,
}

impl EngineError {
    /// Stable numeric code, usable by callers that signal errors as
    /// integers.
    pub fn code(&self) -> u32 {
        *self as u32
    }

    pub fn kind(&self) -> ErrorKind {
        use EngineError::*;
        match self {
            MustBePositive | NotAllowedAsset | LengthMismatch | DuplicateAsset
            | InsufficientCollateral | InsufficientDebt | HealthFactorOk | UnsupportedDecimals
            | ReentrantCall | ArithmeticOverflow | DivisionByZero => ErrorKind::Validation,
            BrokenHealthFactor | HealthFactorNotImproved => ErrorKind::InvariantViolation,
            TransferFailed | MintFailed => ErrorKind::ExternalCallFailure,
            StalePrice | StaleRound => ErrorKind::StaleData,
        }
    }
}
