use std::collections::BTreeMap;

use crate::error::EngineError;
use crate::oracle::OracleAdapter;
use crate::state::AssetId;

/// Fixed-at-construction set of approved collateral assets and their
/// price adapters.
///
/// Built from parallel ordered lists; the set never changes afterwards.
/// Assets not present are never allowed.
pub struct CollateralRegistry {
    order: Vec<AssetId>,
    adapters: BTreeMap<AssetId, OracleAdapter>,
}

impl CollateralRegistry {
    pub fn new(
        assets: Vec<AssetId>,
        adapters: Vec<OracleAdapter>,
    ) -> Result<Self, EngineError> {
        if assets.len() != adapters.len() {
            return Err(EngineError::LengthMismatch);
        }
        let order = assets.clone();
        let mut table = BTreeMap::new();
        for (asset, adapter) in assets.into_iter().zip(adapters) {
            if table.insert(asset, adapter).is_some() {
                return Err(EngineError::DuplicateAsset);
            }
        }
        Ok(Self {
            order,
            adapters: table,
        })
    }

    pub fn is_allowed(&self, asset: &AssetId) -> bool {
        self.adapters.contains_key(asset)
    }

    pub fn adapter_for(&self, asset: &AssetId) -> Option<&OracleAdapter> {
        self.adapters.get(asset)
    }

    /// Approved assets in registration order.
    pub fn assets(&self) -> &[AssetId] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
