use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::errors::{LedgerError, Result};
use crate::events::Event;
use crate::types::{AccountId, AssetId};

/// accepted collateral asset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollateralAsset {
    pub id: AssetId,
    /// reference-credit units per asset unit; the last nonzero value survives retirement
    pub collaterability_ratio: u128,
    pub retired: bool,
    pub liquidation_beneficiary: AccountId,
}

/// table of accepted collateral assets
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollateralRegistry {
    assets: BTreeMap<AssetId, CollateralAsset>,
    reference_asset: AssetId,
    governance_asset: AssetId,
    precision: u32,
}

impl CollateralRegistry {
    pub fn new(reference_asset: AssetId, governance_asset: AssetId, precision: u32) -> Self {
        Self {
            assets: BTreeMap::new(),
            reference_asset,
            governance_asset,
            precision,
        }
    }

    /// register a new collateral asset
    pub fn add_asset(
        &mut self,
        asset: AssetId,
        beneficiary: AccountId,
        ratio: u128,
        precision: u32,
    ) -> Result<Event> {
        if self.assets.contains_key(&asset) {
            return Err(LedgerError::AlreadyRegistered { asset });
        }
        if precision != self.precision {
            return Err(LedgerError::UnsupportedPrecision {
                expected: self.precision,
                provided: precision,
            });
        }
        if ratio == 0 {
            return Err(LedgerError::InvalidRatio { asset });
        }

        let beneficiary = beneficiary.or_burn();
        self.assets.insert(
            asset.clone(),
            CollateralAsset {
                id: asset.clone(),
                collaterability_ratio: ratio,
                retired: false,
                liquidation_beneficiary: beneficiary,
            },
        );

        Ok(Event::AssetAdded {
            asset,
            ratio,
            beneficiary,
        })
    }

    /// change the collaterability ratio; zero retires the asset for good
    pub fn set_ratio(&mut self, asset: &AssetId, new_ratio: u128) -> Result<Event> {
        let entry = self
            .assets
            .get_mut(asset)
            .ok_or_else(|| LedgerError::UnknownAsset { asset: asset.clone() })?;

        let old_ratio = entry.collaterability_ratio;
        if new_ratio == 0 {
            entry.retired = true;
        } else {
            entry.collaterability_ratio = new_ratio;
        }

        Ok(Event::RatioChanged {
            asset: asset.clone(),
            old_ratio,
            new_ratio,
            retired: entry.retired,
        })
    }

    /// redirect liquidated collateral of an asset
    pub fn set_beneficiary(&mut self, asset: &AssetId, new_beneficiary: AccountId) -> Result<Event> {
        if self.is_protected(asset) {
            return Err(LedgerError::ProtectedAsset { asset: asset.clone() });
        }

        let entry = self
            .assets
            .get_mut(asset)
            .ok_or_else(|| LedgerError::UnknownAsset { asset: asset.clone() })?;

        let old_beneficiary = entry.liquidation_beneficiary;
        entry.liquidation_beneficiary = new_beneficiary.or_burn();

        Ok(Event::BeneficiaryChanged {
            asset: asset.clone(),
            old_beneficiary,
            new_beneficiary: entry.liquidation_beneficiary,
        })
    }

    /// ratio used for valuation, zero for unknown assets
    pub fn ratio_of(&self, asset: &AssetId) -> u128 {
        self.assets
            .get(asset)
            .map(|a| a.collaterability_ratio)
            .unwrap_or(0)
    }

    /// retired or unknown
    pub fn is_retired(&self, asset: &AssetId) -> bool {
        self.assets.get(asset).map(|a| a.retired).unwrap_or(true)
    }

    pub fn beneficiary_of(&self, asset: &AssetId) -> AccountId {
        self.assets
            .get(asset)
            .map(|a| a.liquidation_beneficiary)
            .unwrap_or(AccountId::BURN)
    }

    /// assets whose liquidated collateral must always be burned
    pub fn is_protected(&self, asset: &AssetId) -> bool {
        *asset == self.reference_asset || *asset == self.governance_asset
    }

    pub fn get(&self, asset: &AssetId) -> Option<&CollateralAsset> {
        self.assets.get(asset)
    }

    pub fn assets(&self) -> impl Iterator<Item = &CollateralAsset> {
        self.assets.values()
    }

    pub fn reference_asset(&self) -> &AssetId {
        &self.reference_asset
    }

    pub fn governance_asset(&self) -> &AssetId {
        &self.governance_asset
    }

    pub fn precision(&self) -> u32 {
        self.precision
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> CollateralRegistry {
        CollateralRegistry::new(AssetId::from("USD"), AssetId::from("GOV"), 18)
    }

    #[test]
    fn test_add_asset_defaults_to_burn() {
        let mut registry = registry();
        let event = registry
            .add_asset(AssetId::from("WETH"), AccountId::NULL, 5, 18)
            .unwrap();

        let weth = AssetId::from("WETH");
        assert_eq!(registry.ratio_of(&weth), 5);
        assert!(!registry.is_retired(&weth));
        assert_eq!(registry.beneficiary_of(&weth), AccountId::BURN);
        assert!(matches!(event, Event::AssetAdded { ratio: 5, .. }));
    }

    #[test]
    fn test_add_asset_rejections() {
        let mut registry = registry();
        registry.add_asset(AssetId::from("WETH"), AccountId::NULL, 5, 18).unwrap();

        assert!(matches!(
            registry.add_asset(AssetId::from("WETH"), AccountId::NULL, 5, 18),
            Err(LedgerError::AlreadyRegistered { .. })
        ));
        assert!(matches!(
            registry.add_asset(AssetId::from("USDC"), AccountId::NULL, 1, 6),
            Err(LedgerError::UnsupportedPrecision { expected: 18, provided: 6 })
        ));
        assert!(matches!(
            registry.add_asset(AssetId::from("DAI"), AccountId::NULL, 0, 18),
            Err(LedgerError::InvalidRatio { .. })
        ));
        assert!(registry.get(&AssetId::from("DAI")).is_none());
    }

    #[test]
    fn test_zero_ratio_retires_and_keeps_valuation() {
        let mut registry = registry();
        let weth = AssetId::from("WETH");
        registry.add_asset(weth.clone(), AccountId::NULL, 5, 18).unwrap();

        let event = registry.set_ratio(&weth, 0).unwrap();
        assert_eq!(
            event,
            Event::RatioChanged {
                asset: weth.clone(),
                old_ratio: 5,
                new_ratio: 0,
                retired: true,
            }
        );
        assert!(registry.is_retired(&weth));
        assert_eq!(registry.ratio_of(&weth), 5);

        // retirement is permanent
        registry.set_ratio(&weth, 8).unwrap();
        assert!(registry.is_retired(&weth));
        assert_eq!(registry.ratio_of(&weth), 8);
    }

    #[test]
    fn test_unknown_asset_lookups() {
        let mut registry = registry();
        let ghost = AssetId::from("GHOST");

        assert_eq!(registry.ratio_of(&ghost), 0);
        assert!(registry.is_retired(&ghost));
        assert_eq!(registry.beneficiary_of(&ghost), AccountId::BURN);
        assert!(matches!(
            registry.set_ratio(&ghost, 3),
            Err(LedgerError::UnknownAsset { .. })
        ));
    }

    #[test]
    fn test_protected_assets_keep_burn_beneficiary() {
        let mut registry = registry();
        let gov = AssetId::from("GOV");
        let weth = AssetId::from("WETH");
        registry.add_asset(gov.clone(), AccountId::NULL, 2, 18).unwrap();
        registry.add_asset(weth.clone(), AccountId::NULL, 5, 18).unwrap();

        let treasury = AccountId::new();
        assert!(matches!(
            registry.set_beneficiary(&gov, treasury),
            Err(LedgerError::ProtectedAsset { .. })
        ));
        assert!(matches!(
            registry.set_beneficiary(&AssetId::from("USD"), treasury),
            Err(LedgerError::ProtectedAsset { .. })
        ));

        registry.set_beneficiary(&weth, treasury).unwrap();
        assert_eq!(registry.beneficiary_of(&weth), treasury);

        registry.set_beneficiary(&weth, AccountId::NULL).unwrap();
        assert_eq!(registry.beneficiary_of(&weth), AccountId::BURN);
    }
}
