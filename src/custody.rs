use std::collections::{HashMap, HashSet};
use thiserror::Error;

use crate::decimal::Amount;
use crate::errors::{LedgerError, Result as LedgerResult};
use crate::types::{AccountId, AssetId, Transfer, TransferDirection};

/// failure reported by the custody collaborator
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct CustodyError(pub String);

/// moves value in and out of the ledger's custody
pub trait Custody {
    /// pull `amount` of `asset` from `from` into custody
    fn transfer_in(&mut self, from: &AccountId, asset: &AssetId, amount: Amount) -> Result<(), CustodyError>;

    /// release `amount` of `asset` from custody to `to`
    fn transfer_out(&mut self, to: &AccountId, asset: &AssetId, amount: Amount) -> Result<(), CustodyError>;

    /// execute one transfer instruction
    fn execute(&mut self, transfer: &Transfer) -> Result<(), CustodyError> {
        match transfer.direction {
            TransferDirection::In => self.transfer_in(&transfer.counterparty, &transfer.asset, transfer.amount),
            TransferDirection::Out => self.transfer_out(&transfer.counterparty, &transfer.asset, transfer.amount),
        }
    }

    /// undo transfers already executed by an operation that later failed
    ///
    /// Called with the executed prefix, in execution order. Custodians that
    /// settle whole operations atomically on their side may treat it as a no-op.
    fn rollback(&mut self, executed: &[Transfer]);
}

/// decides who may change administrative parameters
pub trait Authority {
    fn is_administrator(&self, account: &AccountId) -> bool;
}

/// fixed set of administrators
#[derive(Debug, Clone, Default)]
pub struct AdminSet {
    admins: HashSet<AccountId>,
}

impl AdminSet {
    pub fn new(admins: impl IntoIterator<Item = AccountId>) -> Self {
        Self {
            admins: admins.into_iter().collect(),
        }
    }

    pub fn grant(&mut self, account: AccountId) {
        self.admins.insert(account);
    }

    pub fn revoke(&mut self, account: &AccountId) {
        self.admins.remove(account);
    }
}

impl Authority for AdminSet {
    fn is_administrator(&self, account: &AccountId) -> bool {
        self.admins.contains(account)
    }
}

/// in-memory custody with wallet balances, for tests and demos
#[derive(Debug, Clone, Default)]
pub struct MemoryCustody {
    wallets: HashMap<(AccountId, AssetId), Amount>,
    pool: HashMap<AssetId, Amount>,
    fail_after: Option<usize>,
    executed: usize,
}

impl MemoryCustody {
    pub fn new() -> Self {
        Self::default()
    }

    /// credit a wallet outside the ledger
    pub fn fund(&mut self, holder: AccountId, asset: impl Into<AssetId>, amount: Amount) -> LedgerResult<()> {
        let entry = self.wallets.entry((holder, asset.into())).or_default();
        *entry = entry
            .checked_add(amount)
            .ok_or_else(|| LedgerError::overflow("wallet funding"))?;
        Ok(())
    }

    /// add liquidity directly to the custody pool (e.g. reference asset to lend)
    pub fn fund_pool(&mut self, asset: impl Into<AssetId>, amount: Amount) -> LedgerResult<()> {
        let entry = self.pool.entry(asset.into()).or_default();
        *entry = entry
            .checked_add(amount)
            .ok_or_else(|| LedgerError::overflow("pool funding"))?;
        Ok(())
    }

    /// make every transfer after the next `n` successful ones fail
    pub fn fail_after(&mut self, n: usize) {
        self.fail_after = Some(n);
        self.executed = 0;
    }

    pub fn heal(&mut self) {
        self.fail_after = None;
    }

    pub fn wallet(&self, holder: &AccountId, asset: &AssetId) -> Amount {
        self.wallets
            .get(&(*holder, asset.clone()))
            .copied()
            .unwrap_or(Amount::ZERO)
    }

    pub fn pooled(&self, asset: &AssetId) -> Amount {
        self.pool.get(asset).copied().unwrap_or(Amount::ZERO)
    }

    fn check_injected_failure(&mut self) -> Result<(), CustodyError> {
        if let Some(limit) = self.fail_after {
            if self.executed >= limit {
                return Err(CustodyError("custody unavailable".to_string()));
            }
        }
        self.executed += 1;
        Ok(())
    }
}

impl Custody for MemoryCustody {
    fn transfer_in(&mut self, from: &AccountId, asset: &AssetId, amount: Amount) -> Result<(), CustodyError> {
        self.check_injected_failure()?;

        let key = (*from, asset.clone());
        let balance = self.wallets.get(&key).copied().unwrap_or(Amount::ZERO);
        let remaining = balance.checked_sub(amount).ok_or_else(|| {
            CustodyError(format!("{} holds {} {}, needs {}", from, balance, asset, amount))
        })?;
        let pooled = self
            .pooled(asset)
            .checked_add(amount)
            .ok_or_else(|| CustodyError("pool overflow".to_string()))?;

        self.wallets.insert(key, remaining);
        self.pool.insert(asset.clone(), pooled);
        Ok(())
    }

    fn transfer_out(&mut self, to: &AccountId, asset: &AssetId, amount: Amount) -> Result<(), CustodyError> {
        self.check_injected_failure()?;

        let pooled = self.pooled(asset);
        let remaining = pooled.checked_sub(amount).ok_or_else(|| {
            CustodyError(format!("custody holds {} {}, needs {}", pooled, asset, amount))
        })?;

        let credited = self
            .wallet(to, asset)
            .checked_add(amount)
            .ok_or_else(|| CustodyError(format!("{} wallet overflow for {}", to, asset)))?;

        self.pool.insert(asset.clone(), remaining);
        self.wallets.insert((*to, asset.clone()), credited);
        Ok(())
    }

    fn rollback(&mut self, executed: &[Transfer]) {
        for transfer in executed.iter().rev() {
            let key = (transfer.counterparty, transfer.asset.clone());
            let wallet = self.wallet(&transfer.counterparty, &transfer.asset);
            let pooled = self.pooled(&transfer.asset);
            let (wallet, pooled) = match transfer.direction {
                TransferDirection::In => (
                    wallet.checked_add(transfer.amount).unwrap_or(Amount::MAX),
                    pooled.saturating_sub(transfer.amount),
                ),
                TransferDirection::Out => (
                    wallet.saturating_sub(transfer.amount),
                    pooled.checked_add(transfer.amount).unwrap_or(Amount::MAX),
                ),
            };
            self.wallets.insert(key, wallet);
            self.pool.insert(transfer.asset.clone(), pooled);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transfer_in_and_out() {
        let mut custody = MemoryCustody::new();
        let alice = AccountId::new();
        let weth = AssetId::from("WETH");
        custody.fund(alice, "WETH", Amount::new(50)).unwrap();

        custody.transfer_in(&alice, &weth, Amount::new(20)).unwrap();
        assert_eq!(custody.wallet(&alice, &weth), Amount::new(30));
        assert_eq!(custody.pooled(&weth), Amount::new(20));

        assert!(custody.transfer_out(&alice, &weth, Amount::new(21)).is_err());
        custody.transfer_out(&AccountId::BURN, &weth, Amount::new(20)).unwrap();
        assert_eq!(custody.wallet(&AccountId::BURN, &weth), Amount::new(20));
        assert_eq!(custody.pooled(&weth), Amount::ZERO);
    }

    #[test]
    fn test_injected_failure_and_rollback() {
        let mut custody = MemoryCustody::new();
        let alice = AccountId::new();
        let weth = AssetId::from("WETH");
        custody.fund(alice, "WETH", Amount::new(50)).unwrap();
        custody.fail_after(1);

        let first = Transfer::inbound(alice, weth.clone(), Amount::new(10));
        custody.execute(&first).unwrap();
        assert!(custody.execute(&first).is_err());

        custody.rollback(&[first]);
        assert_eq!(custody.wallet(&alice, &weth), Amount::new(50));
        assert_eq!(custody.pooled(&weth), Amount::ZERO);
    }

    #[test]
    fn test_funding_overflow_is_reported() {
        let mut custody = MemoryCustody::new();
        let alice = AccountId::new();
        let weth = AssetId::from("WETH");
        custody.fund(alice, "WETH", Amount::MAX).unwrap();
        custody.fund_pool("WETH", Amount::MAX).unwrap();

        assert!(matches!(
            custody.fund(alice, "WETH", Amount::ONE),
            Err(LedgerError::Overflow { .. })
        ));
        assert!(matches!(
            custody.fund_pool("WETH", Amount::ONE),
            Err(LedgerError::Overflow { .. })
        ));
        assert_eq!(custody.wallet(&alice, &weth), Amount::MAX);

        // releasing into a full wallet fails instead of saturating
        assert!(custody.transfer_out(&alice, &weth, Amount::ONE).is_err());
        assert_eq!(custody.pooled(&weth), Amount::MAX);
    }

    #[test]
    fn test_admin_set() {
        let admin = AccountId::new();
        let mut authority = AdminSet::new([admin]);
        assert!(authority.is_administrator(&admin));

        authority.revoke(&admin);
        assert!(!authority.is_administrator(&admin));
    }
}
