use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// amount of an asset in integer base units (fixed ledger precision)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub struct Amount(u128);

impl Amount {
    pub const ZERO: Amount = Amount(0);
    pub const ONE: Amount = Amount(1);
    pub const MAX: Amount = Amount(u128::MAX);

    /// create from raw base units
    pub const fn new(units: u128) -> Self {
        Amount(units)
    }

    /// create from whole tokens at the given precision (e.g. 5 tokens at 18 decimals)
    pub fn from_whole(tokens: u128, precision: u32) -> Option<Self> {
        10_u128
            .checked_pow(precision)
            .and_then(|scale| tokens.checked_mul(scale))
            .map(Amount)
    }

    /// get underlying base units
    pub const fn units(&self) -> u128 {
        self.0
    }

    /// check if zero
    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// check if positive
    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }

    pub fn checked_add(self, other: Amount) -> Option<Amount> {
        self.0.checked_add(other.0).map(Amount)
    }

    pub fn checked_sub(self, other: Amount) -> Option<Amount> {
        self.0.checked_sub(other.0).map(Amount)
    }

    /// difference clamped at zero
    pub fn saturating_sub(self, other: Amount) -> Amount {
        Amount(self.0.saturating_sub(other.0))
    }

    /// value of this amount under a collaterability ratio
    pub fn checked_mul_ratio(self, ratio: u128) -> Option<Amount> {
        self.0.checked_mul(ratio).map(Amount)
    }

    /// minimum of two values
    pub fn min(self, other: Self) -> Self {
        Amount(self.0.min(other.0))
    }

    /// maximum of two values
    pub fn max(self, other: Self) -> Self {
        Amount(self.0.max(other.0))
    }

    /// lossy decimal view, for reporting only
    pub fn to_decimal(&self) -> Option<Decimal> {
        Decimal::from_str(&self.0.to_string()).ok()
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Amount {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<u128>().map(Amount)
    }
}

impl From<u128> for Amount {
    fn from(units: u128) -> Self {
        Amount(units)
    }
}

impl From<u64> for Amount {
    fn from(units: u64) -> Self {
        Amount(units as u128)
    }
}

impl From<u32> for Amount {
    fn from(units: u32) -> Self {
        Amount(units as u128)
    }
}

/// rate type for reporting ratios such as debt against collateral value
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub struct Rate(Decimal);

impl Rate {
    pub const ZERO: Rate = Rate(Decimal::ZERO);
    pub const ONE: Rate = Rate(Decimal::ONE);

    /// create from decimal (e.g., 0.05 for 5%)
    pub fn from_decimal(d: Decimal) -> Self {
        Rate(d)
    }

    /// create from percentage (e.g., 120 for 120%)
    pub fn from_percentage(p: u32) -> Self {
        Rate(Decimal::from(p) / Decimal::from(100))
    }

    /// ratio of two amounts, `None` when the denominator is zero or out of range
    pub fn from_amounts(numerator: Amount, denominator: Amount) -> Option<Self> {
        if denominator.is_zero() {
            return None;
        }
        let n = numerator.to_decimal()?;
        let d = denominator.to_decimal()?;
        n.checked_div(d).map(|r| Rate(r.round_dp(8)))
    }

    /// get as decimal
    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    /// get as percentage
    pub fn as_percentage(&self) -> Decimal {
        self.0 * Decimal::from(100)
    }
}

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.as_percentage())
    }
}

impl From<Decimal> for Rate {
    fn from(d: Decimal) -> Self {
        Rate::from_decimal(d)
    }
}
