use borsh::{BorshDeserialize, BorshSerialize};

pub mod ledger;
pub mod position;

pub use ledger::*;
pub use position::*;

/// Identifier of a collateral or synthetic asset class.
#[derive(
    BorshSerialize, BorshDeserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
pub struct AssetId(pub [u8; 32]);

/// Identifier of an account holding a position.
#[derive(
    BorshSerialize, BorshDeserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
pub struct AccountId(pub [u8; 32]);

impl AssetId {
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Identifier derived from a short label, zero-padded. Convenient for
    /// configuration and tests.
    pub fn from_label(label: &str) -> Self {
        let mut bytes = [0u8; 32];
        let len = label.len().min(32);
        bytes[..len].copy_from_slice(&label.as_bytes()[..len]);
        Self(bytes)
    }
}

impl AccountId {
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn from_label(label: &str) -> Self {
        let mut bytes = [0u8; 32];
        let len = label.len().min(32);
        bytes[..len].copy_from_slice(&label.as_bytes()[..len]);
        Self(bytes)
    }
}
