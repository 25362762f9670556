pub mod collateral;
pub mod config;
pub mod custody;
pub mod debt;
pub mod decimal;
pub mod engine;
pub mod errors;
pub mod events;
pub mod interest;
pub mod types;
pub mod view;

// re-export key types
pub use collateral::{CollateralAsset, CollateralRegistry, CollateralVault, Holdings};
pub use config::{LedgerConfig, LedgerConfigBuilder, LoanTerms, DEFAULT_PRECISION};
pub use custody::{AdminSet, Authority, Custody, CustodyError, MemoryCustody};
pub use debt::{AccountPosition, DebtLedger};
pub use decimal::{Amount, Rate};
pub use engine::LendingEngine;
pub use errors::{LedgerError, Result};
pub use events::{AuditRecord, Event, EventStore};
pub use interest::{accrue, InterestCalculation, SECONDS_PER_YEAR};
pub use types::{
    AccountId, AccountStatus, AssetId, BorrowResult, DepositAndBorrowResult, DepositResult,
    LiquidationResult, RepaymentResult, SeizedCollateral, Transfer, TransferDirection,
    WithdrawalResult,
};
pub use view::AccountView;

// re-export external dependencies that users will need
pub use chrono;
pub use hourglass_rs::{SafeTimeProvider, TimeSource};
pub use rust_decimal::Decimal;
pub use uuid::Uuid;
