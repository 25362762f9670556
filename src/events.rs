use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::LoanTerms;
use crate::decimal::Amount;
use crate::types::{AccountId, AssetId};

/// all events recorded by the ledger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    // administrative events
    AssetAdded {
        asset: AssetId,
        ratio: u128,
        beneficiary: AccountId,
    },
    RatioChanged {
        asset: AssetId,
        old_ratio: u128,
        new_ratio: u128,
        retired: bool,
    },
    BeneficiaryChanged {
        asset: AssetId,
        old_beneficiary: AccountId,
        new_beneficiary: AccountId,
    },
    LoanTermsChanged {
        old_terms: LoanTerms,
        new_terms: LoanTerms,
    },

    // collateral events
    CollateralDeposited {
        account: AccountId,
        asset: AssetId,
        amount: Amount,
        new_balance: Amount,
    },
    CollateralWithdrawn {
        account: AccountId,
        asset: AssetId,
        amount: Amount,
        new_balance: Amount,
    },
    CollateralReclaimed {
        account: AccountId,
        asset: AssetId,
        amount: Amount,
    },

    // debt events
    LoanTaken {
        account: AccountId,
        requested: Amount,
        disbursed: Amount,
        interest_capitalized: Amount,
        old_debt: Amount,
        new_debt: Amount,
    },
    InterestPaid {
        account: AccountId,
        amount: Amount,
        treasury: AccountId,
    },
    LoanRepaid {
        account: AccountId,
        asset: AssetId,
        amount: Amount,
        value: Amount,
        to_principal: Amount,
        old_debt: Amount,
        new_debt: Amount,
    },

    // liquidation events
    CollateralLiquidated {
        account: AccountId,
        asset: AssetId,
        amount: Amount,
        beneficiary: AccountId,
    },
    AccountLiquidated {
        account: AccountId,
        debt_cleared: Amount,
        collateral_value: Amount,
    },
}

impl Event {
    /// short event kind label
    pub fn kind(&self) -> &'static str {
        match self {
            Event::AssetAdded { .. } => "asset_added",
            Event::RatioChanged { .. } => "ratio_changed",
            Event::BeneficiaryChanged { .. } => "beneficiary_changed",
            Event::LoanTermsChanged { .. } => "loan_terms_changed",
            Event::CollateralDeposited { .. } => "collateral_deposited",
            Event::CollateralWithdrawn { .. } => "collateral_withdrawn",
            Event::CollateralReclaimed { .. } => "collateral_reclaimed",
            Event::LoanTaken { .. } => "loan_taken",
            Event::InterestPaid { .. } => "interest_paid",
            Event::LoanRepaid { .. } => "loan_repaid",
            Event::CollateralLiquidated { .. } => "collateral_liquidated",
            Event::AccountLiquidated { .. } => "account_liquidated",
        }
    }
}

/// append-only audit log entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub id: Uuid,
    pub sequence: u64,
    pub timestamp: DateTime<Utc>,
    pub initiator: AccountId,
    pub event: Event,
}

/// event store holding the audit log
#[derive(Debug, Default)]
pub struct EventStore {
    records: Vec<AuditRecord>,
}

impl EventStore {
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
        }
    }

    /// append one event
    pub fn emit(&mut self, event: Event, initiator: AccountId, timestamp: DateTime<Utc>) {
        let record = AuditRecord {
            id: Uuid::new_v4(),
            sequence: self.records.len() as u64,
            timestamp,
            initiator,
            event,
        };
        tracing::trace!(kind = record.event.kind(), sequence = record.sequence, "audit record");
        self.records.push(record);
    }

    /// append events staged by one logical operation
    pub fn emit_all(
        &mut self,
        events: impl IntoIterator<Item = Event>,
        initiator: AccountId,
        timestamp: DateTime<Utc>,
    ) {
        for event in events {
            self.emit(event, initiator, timestamp);
        }
    }

    pub fn records(&self) -> &[AuditRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// records since the given sequence number (inclusive)
    pub fn since(&self, sequence: u64) -> &[AuditRecord] {
        let start = (sequence as usize).min(self.records.len());
        &self.records[start..]
    }

    /// export the full log as pretty json
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_sequence_and_since() {
        let mut store = EventStore::new();
        let admin = AccountId::new();
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();

        store.emit_all(
            vec![
                Event::AssetAdded {
                    asset: AssetId::from("WETH"),
                    ratio: 5,
                    beneficiary: AccountId::BURN,
                },
                Event::RatioChanged {
                    asset: AssetId::from("WETH"),
                    old_ratio: 5,
                    new_ratio: 7,
                    retired: false,
                },
            ],
            admin,
            now,
        );

        assert_eq!(store.len(), 2);
        assert_eq!(store.records()[1].sequence, 1);
        assert_eq!(store.since(1).len(), 1);
        assert_eq!(store.since(1)[0].event.kind(), "ratio_changed");
        assert!(store.since(10).is_empty());
    }

    #[test]
    fn test_json_export() {
        let mut store = EventStore::new();
        let account = AccountId::new();
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();

        store.emit(
            Event::CollateralDeposited {
                account,
                asset: AssetId::from("WETH"),
                amount: Amount::new(20),
                new_balance: Amount::new(20),
            },
            account,
            now,
        );

        let json = store.to_json().unwrap();
        let parsed: Vec<AuditRecord> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, store.records());
    }
}
