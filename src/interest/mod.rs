pub mod accrual;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::decimal::Amount;
use crate::errors::Result;

pub use accrual::{accrue, elapsed_seconds, SECONDS_PER_YEAR};

/// interest calculation result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterestCalculation {
    pub principal_base: Amount,
    pub annual_percent: u32,
    pub elapsed_seconds: u64,
    pub interest_amount: Amount,
}

/// interest on `principal` between two instants
pub fn calculate_interest(
    principal: Amount,
    annual_percent: u32,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<InterestCalculation> {
    let elapsed = elapsed_seconds(start, end)?;
    let interest = accrue(principal, annual_percent, elapsed)?;

    Ok(InterestCalculation {
        principal_base: principal,
        annual_percent,
        elapsed_seconds: elapsed,
        interest_amount: interest,
    })
}
