use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::config::LoanTerms;
use crate::decimal::Amount;
use crate::errors::{LedgerError, Result};
use crate::interest::calculate_interest;
use crate::types::AccountId;

/// per-account debt record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct AccountPosition {
    /// reference-asset units owed, including capitalized interest
    pub debt_principal: Amount,
    /// `None` while the position is dormant
    pub last_accrual: Option<DateTime<Utc>>,
}

impl AccountPosition {
    /// capitalize interest accrued since the last accrual
    ///
    /// The accrual clock moves forward by the whole seconds charged, so a
    /// sub-second remainder carries over to the next settlement.
    pub fn settle_interest(&mut self, now: DateTime<Utc>, terms: &LoanTerms) -> Result<Amount> {
        let (interest, accrued_until) = match self.last_accrual {
            Some(last) => {
                let calculation =
                    calculate_interest(self.debt_principal, terms.yearly_interest_percent, last, now)?;
                let elapsed = i64::try_from(calculation.elapsed_seconds)
                    .map_err(|_| LedgerError::overflow("accrual clock"))?;
                (calculation.interest_amount, last + Duration::seconds(elapsed))
            }
            None => (Amount::ZERO, now),
        };

        self.debt_principal = self
            .debt_principal
            .checked_add(interest)
            .ok_or_else(|| LedgerError::overflow("interest capitalization"))?;
        self.last_accrual = Some(accrued_until);

        Ok(interest)
    }

    /// add debt; credit limits are the caller's concern
    pub fn increase_debt(&mut self, amount: Amount) -> Result<()> {
        self.debt_principal = self
            .debt_principal
            .checked_add(amount)
            .ok_or_else(|| LedgerError::overflow("debt increase"))?;
        Ok(())
    }

    /// remove debt; a position paid down to zero becomes dormant
    pub fn decrease_debt(&mut self, amount: Amount) -> Result<()> {
        self.debt_principal = self
            .debt_principal
            .checked_sub(amount)
            .ok_or(LedgerError::Underflow {
                outstanding: self.debt_principal,
                requested: amount,
            })?;

        if self.debt_principal.is_zero() {
            self.last_accrual = None;
        }
        Ok(())
    }

    /// stored debt, without accruing
    pub fn outstanding_debt(&self) -> Amount {
        self.debt_principal
    }

    pub fn has_debt(&self) -> bool {
        self.debt_principal.is_positive()
    }

    /// zero the position
    pub fn clear(&mut self) {
        self.debt_principal = Amount::ZERO;
        self.last_accrual = None;
    }

    /// debt including interest accrued up to `now`, without mutating
    pub fn debt_at(&self, now: DateTime<Utc>, terms: &LoanTerms) -> Result<Amount> {
        let mut preview = *self;
        preview.settle_interest(now, terms)?;
        Ok(preview.debt_principal)
    }
}

/// debt positions for every account
#[derive(Debug, Clone, Default)]
pub struct DebtLedger {
    positions: HashMap<AccountId, AccountPosition>,
}

impl DebtLedger {
    pub fn new() -> Self {
        Self {
            positions: HashMap::new(),
        }
    }

    /// copy of the account's position (zeroed when unknown)
    pub fn position(&self, account: &AccountId) -> AccountPosition {
        self.positions.get(account).copied().unwrap_or_default()
    }

    /// write back a staged position
    pub fn commit(&mut self, account: AccountId, position: AccountPosition) {
        self.positions.insert(account, position);
    }

    pub fn outstanding_debt(&self, account: &AccountId) -> Amount {
        self.position(account).outstanding_debt()
    }

    /// sum of stored debt across accounts
    pub fn total_debt(&self) -> Option<Amount> {
        self.positions
            .values()
            .try_fold(Amount::ZERO, |acc, p| acc.checked_add(p.debt_principal))
    }

    pub fn accounts(&self) -> impl Iterator<Item = &AccountId> {
        self.positions.keys()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn terms(rate: u32) -> LoanTerms {
        LoanTerms {
            yearly_interest_percent: rate,
            default_threshold_percent: 120,
            treasury: AccountId::new(),
        }
    }

    #[test]
    fn test_settle_is_idempotent_at_same_instant() {
        let terms = terms(10);
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut position = AccountPosition::default();

        assert_eq!(position.settle_interest(start, &terms).unwrap(), Amount::ZERO);
        position.increase_debt(Amount::new(1_000)).unwrap();

        let later = start + Duration::days(365);
        assert_eq!(position.settle_interest(later, &terms).unwrap(), Amount::new(100));
        assert_eq!(position.settle_interest(later, &terms).unwrap(), Amount::ZERO);
        assert_eq!(position.outstanding_debt(), Amount::new(1_100));
        assert_eq!(position.last_accrual, Some(later));
    }

    #[test]
    fn test_sub_second_settlements_still_accrue() {
        // one unit of interest per second at 1%
        let terms = terms(1);
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut position = AccountPosition::default();
        position.settle_interest(start, &terms).unwrap();
        position.increase_debt(Amount::new(3_153_600_000)).unwrap();

        let mut now = start;
        for _ in 0..1_000 {
            now = now + Duration::milliseconds(999);
            position.settle_interest(now, &terms).unwrap();
        }

        assert_eq!(position.outstanding_debt(), Amount::new(3_153_600_999));
        assert_eq!(position.last_accrual, Some(start + Duration::seconds(999)));
        assert!(position.last_accrual <= Some(now));
    }

    #[test]
    fn test_settle_rejects_earlier_timestamp() {
        let terms = terms(10);
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut position = AccountPosition::default();
        position.settle_interest(start, &terms).unwrap();
        position.increase_debt(Amount::new(10)).unwrap();

        let before = position;
        let result = position.settle_interest(start - Duration::seconds(1), &terms);
        assert!(matches!(result, Err(LedgerError::TimestampRegression { .. })));
        assert_eq!(position, before);
    }

    #[test]
    fn test_decrease_to_zero_goes_dormant() {
        let terms = terms(10);
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut position = AccountPosition::default();
        position.settle_interest(start, &terms).unwrap();
        position.increase_debt(Amount::new(50)).unwrap();

        assert!(matches!(
            position.decrease_debt(Amount::new(51)),
            Err(LedgerError::Underflow { .. })
        ));

        position.decrease_debt(Amount::new(50)).unwrap();
        assert!(!position.has_debt());
        assert_eq!(position.last_accrual, None);
    }

    #[test]
    fn test_debt_at_previews_without_mutation() {
        let terms = terms(10);
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut position = AccountPosition::default();
        position.settle_interest(start, &terms).unwrap();
        position.increase_debt(Amount::new(1_000)).unwrap();

        let later = start + Duration::days(365);
        assert_eq!(position.debt_at(later, &terms).unwrap(), Amount::new(1_100));
        assert_eq!(position.outstanding_debt(), Amount::new(1_000));
    }

    #[test]
    fn test_ledger_commit_and_totals() {
        let mut ledger = DebtLedger::new();
        let alice = AccountId::new();
        let bob = AccountId::new();

        assert_eq!(ledger.position(&alice), AccountPosition::default());

        let mut position = ledger.position(&alice);
        position.increase_debt(Amount::new(40)).unwrap();
        ledger.commit(alice, position);

        let mut position = ledger.position(&bob);
        position.increase_debt(Amount::new(2)).unwrap();
        ledger.commit(bob, position);

        assert_eq!(ledger.outstanding_debt(&alice), Amount::new(40));
        assert_eq!(ledger.total_debt(), Some(Amount::new(42)));
    }
}
