use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::decimal::Amount;
use crate::types::{AccountId, AssetId};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("account {account} is not an administrator")]
    NotAuthorized {
        account: AccountId,
    },

    #[error("asset already registered: {asset}")]
    AlreadyRegistered {
        asset: AssetId,
    },

    #[error("unknown asset: {asset}")]
    UnknownAsset {
        asset: AssetId,
    },

    #[error("invalid collaterability ratio for {asset}: ratio must be positive")]
    InvalidRatio {
        asset: AssetId,
    },

    #[error("unsupported precision: ledger uses {expected} decimals, asset has {provided}")]
    UnsupportedPrecision {
        expected: u32,
        provided: u32,
    },

    #[error("asset {asset} must stay burned; its beneficiary cannot change")]
    ProtectedAsset {
        asset: AssetId,
    },

    #[error("asset retired: {asset}")]
    AssetRetired {
        asset: AssetId,
    },

    #[error("asset {asset} cannot be deposited as collateral")]
    WrongAssetForDeposit {
        asset: AssetId,
    },

    #[error("amount must be greater than zero")]
    ZeroAmount,

    #[error("no credit available: debt {debt}, collateral value {collateral_value}")]
    OverDebted {
        debt: Amount,
        collateral_value: Amount,
    },

    #[error("account {account} has no debt")]
    NoDebt {
        account: AccountId,
    },

    #[error("repayment value {provided} does not cover accrued interest {interest}")]
    InsufficientAmount {
        interest: Amount,
        provided: Amount,
    },

    #[error("insufficient {asset} balance: available {available}, requested {requested}")]
    InsufficientBalance {
        asset: AssetId,
        available: Amount,
        requested: Amount,
    },

    #[error("debt underflow: outstanding {outstanding}, requested {requested}")]
    Underflow {
        outstanding: Amount,
        requested: Amount,
    },

    #[error("account still in debt: {debt}")]
    StillInDebt {
        debt: Amount,
    },

    #[error("account {account} holds no collateral")]
    NothingToClaim {
        account: AccountId,
    },

    #[error("account {account} is not delinquent: debt {debt}, liquidation limit {limit}")]
    NotDelinquent {
        account: AccountId,
        debt: Amount,
        limit: Amount,
    },

    #[error("custody transfer of {amount} {asset} failed: {reason}")]
    TransferFailed {
        asset: AssetId,
        amount: Amount,
        reason: String,
    },

    #[error("withdrawal leaves debt {debt} above collateral value {collateral_value}")]
    Undercollateralized {
        debt: Amount,
        collateral_value: Amount,
    },

    #[error("default threshold must exceed 100%, got {threshold}%")]
    InvalidThreshold {
        threshold: u32,
    },

    #[error("timestamp {now} precedes last accrual {last_accrual}")]
    TimestampRegression {
        now: DateTime<Utc>,
        last_accrual: DateTime<Utc>,
    },

    #[error("arithmetic overflow in {context}")]
    Overflow {
        context: &'static str,
    },

    #[error("invalid configuration: {message}")]
    InvalidConfiguration {
        message: String,
    },
}

impl LedgerError {
    pub(crate) fn overflow(context: &'static str) -> Self {
        LedgerError::Overflow { context }
    }
}

pub type Result<T> = std::result::Result<T, LedgerError>;
