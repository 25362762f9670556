use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::collateral::registry::CollateralRegistry;
use crate::decimal::Amount;
use crate::errors::{LedgerError, Result};
use crate::types::{AccountId, AssetId};

/// collateral balances of one account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Holdings {
    balances: BTreeMap<AssetId, Amount>,
    pub last_deposit: Option<DateTime<Utc>>,
}

impl Holdings {
    /// credit a deposit, returning the new balance
    pub fn deposit(
        &mut self,
        asset: &AssetId,
        amount: Amount,
        registry: &CollateralRegistry,
        now: DateTime<Utc>,
    ) -> Result<Amount> {
        if registry.is_retired(asset) {
            return Err(LedgerError::AssetRetired { asset: asset.clone() });
        }
        if amount.is_zero() {
            return Err(LedgerError::ZeroAmount);
        }

        let balance = self.balance(asset);
        let new_balance = balance
            .checked_add(amount)
            .ok_or_else(|| LedgerError::overflow("collateral deposit"))?;

        self.balances.insert(asset.clone(), new_balance);
        self.last_deposit = Some(now);
        Ok(new_balance)
    }

    /// debit a withdrawal, returning the new balance
    pub fn withdraw(&mut self, asset: &AssetId, amount: Amount) -> Result<Amount> {
        let balance = self.balance(asset);
        let new_balance = balance
            .checked_sub(amount)
            .ok_or_else(|| LedgerError::InsufficientBalance {
                asset: asset.clone(),
                available: balance,
                requested: amount,
            })?;

        if new_balance.is_zero() {
            self.balances.remove(asset);
        } else {
            self.balances.insert(asset.clone(), new_balance);
        }
        Ok(new_balance)
    }

    /// empty every holding, returning what was held
    pub fn drain(&mut self) -> Vec<(AssetId, Amount)> {
        std::mem::take(&mut self.balances)
            .into_iter()
            .filter(|(_, amount)| amount.is_positive())
            .collect()
    }

    pub fn balance(&self, asset: &AssetId) -> Amount {
        self.balances.get(asset).copied().unwrap_or(Amount::ZERO)
    }

    /// positive balances in asset order
    pub fn positions(&self) -> impl Iterator<Item = (&AssetId, Amount)> {
        self.balances
            .iter()
            .filter(|(_, amount)| amount.is_positive())
            .map(|(asset, amount)| (asset, *amount))
    }

    pub fn is_empty(&self) -> bool {
        self.positions().next().is_none()
    }

    /// borrowing capacity: sum of balance * ratio
    pub fn total_value(&self, registry: &CollateralRegistry) -> Result<Amount> {
        self.positions().try_fold(Amount::ZERO, |acc, (asset, amount)| {
            amount
                .checked_mul_ratio(registry.ratio_of(asset))
                .and_then(|value| acc.checked_add(value))
                .ok_or_else(|| LedgerError::overflow("collateral valuation"))
        })
    }
}

/// collateral holdings for every account
#[derive(Debug, Clone, Default)]
pub struct CollateralVault {
    holdings: HashMap<AccountId, Holdings>,
}

impl CollateralVault {
    pub fn new() -> Self {
        Self {
            holdings: HashMap::new(),
        }
    }

    /// copy of the account's holdings (empty when unknown)
    pub fn holdings(&self, account: &AccountId) -> Holdings {
        self.holdings.get(account).cloned().unwrap_or_default()
    }

    /// write back staged holdings
    pub fn commit(&mut self, account: AccountId, holdings: Holdings) {
        self.holdings.insert(account, holdings);
    }

    pub fn balance(&self, account: &AccountId, asset: &AssetId) -> Amount {
        self.holdings
            .get(account)
            .map(|h| h.balance(asset))
            .unwrap_or(Amount::ZERO)
    }

    pub fn total_value(&self, account: &AccountId, registry: &CollateralRegistry) -> Result<Amount> {
        match self.holdings.get(account) {
            Some(holdings) => holdings.total_value(registry),
            None => Ok(Amount::ZERO),
        }
    }

    /// sum of one asset across all accounts, to reconcile with custody
    pub fn total_custodied(&self, asset: &AssetId) -> Option<Amount> {
        self.holdings
            .values()
            .try_fold(Amount::ZERO, |acc, h| acc.checked_add(h.balance(asset)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn registry() -> CollateralRegistry {
        let mut registry = CollateralRegistry::new(AssetId::from("USD"), AssetId::from("GOV"), 18);
        registry.add_asset(AssetId::from("WETH"), AccountId::NULL, 5, 18).unwrap();
        registry.add_asset(AssetId::from("WBTC"), AccountId::NULL, 100, 18).unwrap();
        registry
    }

    #[test]
    fn test_deposit_and_value() {
        let registry = registry();
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut holdings = Holdings::default();

        holdings.deposit(&AssetId::from("WETH"), Amount::new(20), &registry, now).unwrap();
        assert_eq!(holdings.total_value(&registry).unwrap(), Amount::new(100));

        holdings.deposit(&AssetId::from("WBTC"), Amount::new(2), &registry, now).unwrap();
        assert_eq!(holdings.total_value(&registry).unwrap(), Amount::new(300));
        assert_eq!(holdings.last_deposit, Some(now));
    }

    #[test]
    fn test_deposit_rejections() {
        let mut registry = registry();
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut holdings = Holdings::default();
        let weth = AssetId::from("WETH");

        assert!(matches!(
            holdings.deposit(&weth, Amount::ZERO, &registry, now),
            Err(LedgerError::ZeroAmount)
        ));
        assert!(matches!(
            holdings.deposit(&AssetId::from("GHOST"), Amount::new(1), &registry, now),
            Err(LedgerError::AssetRetired { .. })
        ));

        registry.set_ratio(&weth, 0).unwrap();
        assert!(matches!(
            holdings.deposit(&weth, Amount::new(1), &registry, now),
            Err(LedgerError::AssetRetired { .. })
        ));
        assert!(holdings.is_empty());
    }

    #[test]
    fn test_withdraw_never_goes_negative() {
        let registry = registry();
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut holdings = Holdings::default();
        let weth = AssetId::from("WETH");
        holdings.deposit(&weth, Amount::new(20), &registry, now).unwrap();

        assert!(matches!(
            holdings.withdraw(&weth, Amount::new(21)),
            Err(LedgerError::InsufficientBalance { .. })
        ));
        assert_eq!(holdings.withdraw(&weth, Amount::new(5)).unwrap(), Amount::new(15));
        assert_eq!(holdings.withdraw(&weth, Amount::new(15)).unwrap(), Amount::ZERO);
        assert!(holdings.is_empty());
    }

    #[test]
    fn test_retired_asset_still_valued() {
        let mut registry = registry();
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut holdings = Holdings::default();
        let weth = AssetId::from("WETH");
        holdings.deposit(&weth, Amount::new(20), &registry, now).unwrap();

        registry.set_ratio(&weth, 0).unwrap();
        assert_eq!(holdings.total_value(&registry).unwrap(), Amount::new(100));
    }

    #[test]
    fn test_drain_and_custody_totals() {
        let registry = registry();
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut vault = CollateralVault::new();
        let weth = AssetId::from("WETH");
        let alice = AccountId::new();
        let bob = AccountId::new();

        for (account, amount) in [(alice, 20_u128), (bob, 7)] {
            let mut holdings = vault.holdings(&account);
            holdings.deposit(&weth, Amount::new(amount), &registry, now).unwrap();
            vault.commit(account, holdings);
        }
        assert_eq!(vault.total_custodied(&weth), Some(Amount::new(27)));

        let mut holdings = vault.holdings(&alice);
        let drained = holdings.drain();
        assert_eq!(drained, vec![(weth.clone(), Amount::new(20))]);
        vault.commit(alice, holdings);

        assert_eq!(vault.balance(&alice, &weth), Amount::ZERO);
        assert_eq!(vault.total_custodied(&weth), Some(Amount::new(7)));
    }
}
