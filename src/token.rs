//! Injected token capabilities.
//!
//! The engine moves tokens only through these traits and checks every
//! result explicitly; success is never assumed. Implementations are
//! swappable: a production adapter bridges to a real token system, tests
//! use an in-memory bank.

use thiserror::Error;

use crate::state::{AccountId, AssetId};

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenError {
    #[error("Holder balance insufficient for transfer")]
    InsufficientBalance,
    #[error("Transfer refused by the token implementation")]
    Refused,
}

/// Pull/push transfer capability over the engine's custody.
///
/// `pull` moves caller-authorized funds from a holder into custody; `push`
/// moves funds out of custody to a holder. Implementations must not refuse
/// a `push` of funds that custody actually holds. The engine treats a
/// refused credit as a hard failure and compensates so the supply
/// accounting survives, but a custody that refuses credits can still
/// strand funds it holds.
pub trait CollateralCustody {
    fn pull(&mut self, asset: &AssetId, from: &AccountId, amount: u128) -> Result<(), TokenError>;
    fn push(&mut self, asset: &AssetId, to: &AccountId, amount: u128) -> Result<(), TokenError>;
    fn balance(&self, asset: &AssetId, owner: &AccountId) -> u128;
}

/// Sole issuer and destroyer of the synthetic debt token.
///
/// Only the engine invokes this capability; the accounting identity
/// (ledger debt == `total_supply`) depends on that exclusivity.
pub trait MintAuthority {
    /// Issues freshly minted synthetic tokens to a holder. A denied
    /// issuance is a hard error for the calling operation.
    fn issue(&mut self, to: &AccountId, amount: u128) -> Result<(), TokenError>;

    /// Destroys synthetic tokens previously pulled into custody.
    fn destroy(&mut self, amount: u128) -> Result<(), TokenError>;

    /// Outstanding synthetic supply tracked by the authority.
    fn total_supply(&self) -> u128;
}
