use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::decimal::Amount;

/// identity of an account, custody destination, or administrator
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AccountId(Uuid);

impl AccountId {
    /// the null identity, never a valid destination
    pub const NULL: AccountId = AccountId(Uuid::nil());

    /// reserved destination for value permanently removed from circulation
    pub const BURN: AccountId = AccountId(Uuid::from_u128(u128::MAX));

    /// create a fresh random account id
    pub fn new() -> Self {
        AccountId(Uuid::new_v4())
    }

    pub fn from_uuid(id: Uuid) -> Self {
        AccountId(id)
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }

    pub fn is_null(&self) -> bool {
        *self == Self::NULL
    }

    pub fn is_burn(&self) -> bool {
        *self == Self::BURN
    }

    /// substitute the burn sentinel for the null identity
    pub fn or_burn(self) -> Self {
        if self.is_null() {
            Self::BURN
        } else {
            self
        }
    }
}

impl Default for AccountId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// identity of an asset (ticker-style symbol)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AssetId(String);

impl AssetId {
    pub fn new(symbol: impl Into<String>) -> Self {
        AssetId(symbol.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AssetId {
    fn from(symbol: &str) -> Self {
        AssetId::new(symbol)
    }
}

impl From<String> for AssetId {
    fn from(symbol: String) -> Self {
        AssetId(symbol)
    }
}

/// account solvency state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccountStatus {
    /// no outstanding debt
    Clean,
    /// debt outstanding, within the default threshold
    Active,
    /// debt exceeds collateral value scaled by the default threshold
    Delinquent,
}

/// direction of a custody movement, seen from the ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransferDirection {
    In,
    Out,
}

/// instruction for the custody collaborator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    pub direction: TransferDirection,
    pub counterparty: AccountId,
    pub asset: AssetId,
    pub amount: Amount,
}

impl Transfer {
    pub fn inbound(from: AccountId, asset: AssetId, amount: Amount) -> Self {
        Self {
            direction: TransferDirection::In,
            counterparty: from,
            asset,
            amount,
        }
    }

    pub fn outbound(to: AccountId, asset: AssetId, amount: Amount) -> Self {
        Self {
            direction: TransferDirection::Out,
            counterparty: to,
            asset,
            amount,
        }
    }
}

/// result of a collateral deposit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepositResult {
    pub asset: AssetId,
    pub amount: Amount,
    pub new_balance: Amount,
    pub interest_capitalized: Amount,
    pub collateral_value: Amount,
    pub transfers: Vec<Transfer>,
}

/// result of a borrow request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BorrowResult {
    pub requested: Amount,
    /// amount actually paid out, capped at available credit
    pub disbursed: Amount,
    pub interest_capitalized: Amount,
    pub outstanding_debt: Amount,
    pub available_credit: Amount,
    pub transfers: Vec<Transfer>,
}

impl BorrowResult {
    /// whether the request was reduced to the available credit
    pub fn was_capped(&self) -> bool {
        self.disbursed < self.requested
    }
}

/// result of a deposit followed by a borrow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepositAndBorrowResult {
    pub deposit: DepositResult,
    pub borrow: BorrowResult,
}

/// result of an in-kind repayment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepaymentResult {
    pub asset: AssetId,
    pub amount: Amount,
    /// reference-asset equivalent of `amount`
    pub value: Amount,
    pub to_interest: Amount,
    pub to_principal: Amount,
    /// value beyond the total debt, retained and not refunded
    pub unapplied: Amount,
    pub outstanding_debt: Amount,
    pub transfers: Vec<Transfer>,
}

impl RepaymentResult {
    pub fn total_applied(&self) -> Amount {
        Amount::new(self.to_interest.units() + self.to_principal.units())
    }
}

/// collateral moved to a beneficiary during liquidation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeizedCollateral {
    pub asset: AssetId,
    pub amount: Amount,
    pub beneficiary: AccountId,
}

/// result of liquidating a delinquent account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiquidationResult {
    pub account: AccountId,
    pub debt_cleared: Amount,
    pub interest_capitalized: Amount,
    pub collateral_value: Amount,
    pub seized: Vec<SeizedCollateral>,
    pub transfers: Vec<Transfer>,
}

/// result of a collateral withdrawal or reclaim
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WithdrawalResult {
    pub returned: Vec<(AssetId, Amount)>,
    pub interest_capitalized: Amount,
    pub collateral_value: Amount,
    pub transfers: Vec<Transfer>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_beneficiary_becomes_burn() {
        assert_eq!(AccountId::NULL.or_burn(), AccountId::BURN);

        let holder = AccountId::new();
        assert_eq!(holder.or_burn(), holder);
        assert!(!holder.is_burn());
    }

    #[test]
    fn test_borrow_capping_flag() {
        let result = BorrowResult {
            requested: Amount::new(100),
            disbursed: Amount::new(60),
            interest_capitalized: Amount::ZERO,
            outstanding_debt: Amount::new(100),
            available_credit: Amount::ZERO,
            transfers: Vec::new(),
        };
        assert!(result.was_capped());
    }
}
