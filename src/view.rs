//! serializable snapshot of an account
use chrono::{DateTime, Utc};
use hourglass_rs::SafeTimeProvider;
use serde::{Deserialize, Serialize};

use crate::custody::{Authority, Custody};
use crate::decimal::{Amount, Rate};
use crate::engine::LendingEngine;
use crate::errors::{LedgerError, Result};
use crate::types::{AccountId, AccountStatus, AssetId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountView {
    pub account: AccountId,
    pub as_of: DateTime<Utc>,
    pub status: AccountStatus,
    pub debt: DebtView,
    pub collateral: CollateralView,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebtView {
    /// stored principal, including interest capitalized so far
    pub stored_debt: Amount,
    /// stored principal plus interest accrued up to `as_of`
    pub debt_due: Amount,
    pub pending_interest: Amount,
    pub last_accrual: Option<DateTime<Utc>>,
    pub yearly_interest_percent: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollateralView {
    pub total_value: Amount,
    pub available_credit: Amount,
    pub liquidation_threshold: Amount,
    /// debt due against collateral value, absent without collateral
    pub debt_to_collateral: Option<Rate>,
    pub last_deposit: Option<DateTime<Utc>>,
    pub holdings: Vec<HoldingView>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HoldingView {
    pub asset: AssetId,
    pub balance: Amount,
    pub ratio: u128,
    pub value: Amount,
    pub retired: bool,
}

impl AccountView {
    pub fn from_engine<C: Custody, A: Authority>(
        engine: &LendingEngine<C, A>,
        account: AccountId,
        time: &SafeTimeProvider,
    ) -> Result<Self> {
        let position = engine.position(&account);
        let debt_due = engine.debt_due(&account, time)?;
        let total_value = engine.total_value(&account)?;
        let holdings = engine.holdings(&account);
        let registry = engine.registry();

        let holding_views = holdings
            .positions()
            .map(|(asset, balance)| {
                let ratio = registry.ratio_of(asset);
                let value = balance
                    .checked_mul_ratio(ratio)
                    .ok_or_else(|| LedgerError::overflow("holding valuation"))?;
                Ok(HoldingView {
                    asset: asset.clone(),
                    balance,
                    ratio,
                    value,
                    retired: registry.is_retired(asset),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(AccountView {
            account,
            as_of: time.now(),
            status: engine.account_status(&account, time)?,
            debt: DebtView {
                stored_debt: position.outstanding_debt(),
                debt_due,
                pending_interest: debt_due.saturating_sub(position.outstanding_debt()),
                last_accrual: position.last_accrual,
                yearly_interest_percent: engine.terms().yearly_interest_percent,
            },
            collateral: CollateralView {
                total_value,
                available_credit: total_value.saturating_sub(debt_due),
                liquidation_threshold: engine.liquidation_threshold(&account)?,
                debt_to_collateral: Rate::from_amounts(debt_due, total_value),
                last_deposit: holdings.last_deposit,
                holdings: holding_views,
            },
        })
    }

    /// pretty json for debugging and monitoring
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|e| format!("{{\"error\": \"{}\"}}", e))
    }
}
