use chrono::{DateTime, Utc};

use crate::decimal::Amount;
use crate::errors::{LedgerError, Result};

/// 365 days in seconds
pub const SECONDS_PER_YEAR: u64 = 31_536_000;

/// simple interest on `principal` over `elapsed_seconds`
///
/// `principal * annual_percent * elapsed_seconds / (SECONDS_PER_YEAR * 100)`.
/// All factors are multiplied before a single truncating division, so equal
/// inputs always produce equal interest regardless of how the call was reached.
pub fn accrue(principal: Amount, annual_percent: u32, elapsed_seconds: u64) -> Result<Amount> {
    if principal.is_zero() || annual_percent == 0 || elapsed_seconds == 0 {
        return Ok(Amount::ZERO);
    }

    let numerator = principal
        .units()
        .checked_mul(annual_percent as u128)
        .and_then(|x| x.checked_mul(elapsed_seconds as u128))
        .ok_or_else(|| LedgerError::overflow("interest accrual"))?;

    Ok(Amount::new(numerator / (SECONDS_PER_YEAR as u128 * 100)))
}

/// whole seconds between two instants
pub fn elapsed_seconds(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<u64> {
    if end < start {
        return Err(LedgerError::TimestampRegression {
            now: end,
            last_accrual: start,
        });
    }
    Ok((end - start).num_seconds() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn test_full_year_at_ten_percent() {
        let interest = accrue(Amount::new(1_000), 10, SECONDS_PER_YEAR).unwrap();
        assert_eq!(interest, Amount::new(100));
    }

    #[test]
    fn test_seven_days_truncates() {
        // 40 * 10 * 604800 / 3153600000 = 0.0767...
        let interest = accrue(Amount::new(40), 10, 604_800).unwrap();
        assert_eq!(interest, Amount::ZERO);

        let principal = Amount::from_whole(40, 18).unwrap();
        let interest = accrue(principal, 10, 604_800).unwrap();
        let expected = 40_000_000_000_000_000_000_u128 * 10 * 604_800 / 3_153_600_000;
        assert_eq!(interest.units(), expected);
    }

    #[test]
    fn test_single_division_keeps_precision() {
        // dividing by the year first would lose everything below one unit per second
        let principal = Amount::new(1_000_000);
        let interest = accrue(principal, 7, 86_400).unwrap();
        assert_eq!(interest.units(), 1_000_000 * 7 * 86_400 / 3_153_600_000);
        assert_eq!(interest, Amount::new(191));
    }

    #[test]
    fn test_zero_inputs() {
        assert_eq!(accrue(Amount::ZERO, 10, 1_000).unwrap(), Amount::ZERO);
        assert_eq!(accrue(Amount::new(10), 0, 1_000).unwrap(), Amount::ZERO);
        assert_eq!(accrue(Amount::new(10), 10, 0).unwrap(), Amount::ZERO);
    }

    #[test]
    fn test_overflow_reported() {
        let result = accrue(Amount::MAX, 10, SECONDS_PER_YEAR);
        assert!(matches!(result, Err(LedgerError::Overflow { .. })));
    }

    #[test]
    fn test_elapsed_seconds() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let end = start + Duration::days(7);
        assert_eq!(elapsed_seconds(start, end).unwrap(), 604_800);
        assert!(matches!(
            elapsed_seconds(end, start),
            Err(LedgerError::TimestampRegression { .. })
        ));
    }
}
