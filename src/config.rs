use serde::{Deserialize, Serialize};

use crate::errors::{LedgerError, Result};
use crate::types::{AccountId, AssetId};

/// decimals shared by every asset on the ledger
pub const DEFAULT_PRECISION: u32 = 18;

/// global loan terms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanTerms {
    pub yearly_interest_percent: u32,
    /// liquidation trigger, percent of collateral value; must exceed 100
    pub default_threshold_percent: u32,
    /// destination credited with repaid interest
    pub treasury: AccountId,
}

impl LoanTerms {
    pub fn new(yearly_interest_percent: u32, default_threshold_percent: u32, treasury: AccountId) -> Result<Self> {
        let terms = Self {
            yearly_interest_percent,
            default_threshold_percent,
            treasury,
        };
        terms.validate()?;
        Ok(terms)
    }

    /// reject thresholds that make every position liquidatable
    pub fn validate(&self) -> Result<()> {
        if self.default_threshold_percent <= 100 {
            return Err(LedgerError::InvalidThreshold {
                threshold: self.default_threshold_percent,
            });
        }
        if self.treasury.is_null() {
            return Err(LedgerError::InvalidConfiguration {
                message: "treasury cannot be the null identity".to_string(),
            });
        }
        Ok(())
    }
}

/// ledger configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// borrowed asset in which debt is denominated
    pub reference_asset: AssetId,
    /// protocol governance asset
    pub governance_asset: AssetId,
    #[serde(default = "default_precision")]
    pub precision: u32,
    pub terms: LoanTerms,
}

fn default_precision() -> u32 {
    DEFAULT_PRECISION
}

impl LedgerConfig {
    /// create configuration with the default precision
    pub fn new(reference_asset: AssetId, governance_asset: AssetId, terms: LoanTerms) -> Self {
        Self {
            reference_asset,
            governance_asset,
            precision: DEFAULT_PRECISION,
            terms,
        }
    }

    /// builder for ledger configuration
    pub fn builder() -> LedgerConfigBuilder {
        LedgerConfigBuilder::new()
    }

    /// parse and validate a json configuration
    pub fn from_json(json: &str) -> Result<Self> {
        let config: LedgerConfig = serde_json::from_str(json)
            .map_err(|e| LedgerError::InvalidConfiguration {
                message: e.to_string(),
            })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.reference_asset == self.governance_asset {
            return Err(LedgerError::InvalidConfiguration {
                message: "reference and governance assets must differ".to_string(),
            });
        }
        if self.precision > 30 {
            return Err(LedgerError::InvalidConfiguration {
                message: format!("precision {} exceeds 30 decimals", self.precision),
            });
        }
        self.terms.validate()
    }
}

/// builder for ledger configuration
pub struct LedgerConfigBuilder {
    reference_asset: AssetId,
    governance_asset: AssetId,
    precision: u32,
    yearly_interest_percent: u32,
    default_threshold_percent: u32,
    treasury: Option<AccountId>,
}

impl LedgerConfigBuilder {
    pub fn new() -> Self {
        Self {
            reference_asset: AssetId::from("USD"),
            governance_asset: AssetId::from("GOV"),
            precision: DEFAULT_PRECISION,
            yearly_interest_percent: 0,
            default_threshold_percent: 120,
            treasury: None,
        }
    }

    pub fn reference_asset(mut self, asset: impl Into<AssetId>) -> Self {
        self.reference_asset = asset.into();
        self
    }

    pub fn governance_asset(mut self, asset: impl Into<AssetId>) -> Self {
        self.governance_asset = asset.into();
        self
    }

    pub fn precision(mut self, precision: u32) -> Self {
        self.precision = precision;
        self
    }

    pub fn yearly_interest_percent(mut self, percent: u32) -> Self {
        self.yearly_interest_percent = percent;
        self
    }

    pub fn default_threshold_percent(mut self, percent: u32) -> Self {
        self.default_threshold_percent = percent;
        self
    }

    pub fn treasury(mut self, treasury: AccountId) -> Self {
        self.treasury = Some(treasury);
        self
    }

    pub fn build(self) -> Result<LedgerConfig> {
        let treasury = self.treasury.ok_or(LedgerError::InvalidConfiguration {
            message: "treasury is required".to_string(),
        })?;

        let config = LedgerConfig {
            reference_asset: self.reference_asset,
            governance_asset: self.governance_asset,
            precision: self.precision,
            terms: LoanTerms {
                yearly_interest_percent: self.yearly_interest_percent,
                default_threshold_percent: self.default_threshold_percent,
                treasury,
            },
        };
        config.validate()?;
        Ok(config)
    }
}

impl Default for LedgerConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_must_exceed_100() {
        let treasury = AccountId::new();
        assert!(matches!(
            LoanTerms::new(10, 100, treasury),
            Err(LedgerError::InvalidThreshold { threshold: 100 })
        ));
        assert!(LoanTerms::new(10, 101, treasury).is_ok());
    }

    #[test]
    fn test_builder_requires_treasury() {
        let result = LedgerConfig::builder().yearly_interest_percent(10).build();
        assert!(matches!(result, Err(LedgerError::InvalidConfiguration { .. })));
    }

    #[test]
    fn test_from_json_defaults_precision() {
        let treasury = AccountId::new();
        let json = format!(
            r#"{{
                "reference_asset": "USD",
                "governance_asset": "GOV",
                "terms": {{
                    "yearly_interest_percent": 10,
                    "default_threshold_percent": 120,
                    "treasury": "{}"
                }}
            }}"#,
            treasury
        );

        let config = LedgerConfig::from_json(&json).unwrap();
        assert_eq!(config.precision, DEFAULT_PRECISION);
        assert_eq!(config.terms.treasury, treasury);
        assert_eq!(config.reference_asset, AssetId::from("USD"));
    }

    #[test]
    fn test_from_json_rejects_low_threshold() {
        let json = format!(
            r#"{{
                "reference_asset": "USD",
                "governance_asset": "GOV",
                "terms": {{
                    "yearly_interest_percent": 10,
                    "default_threshold_percent": 90,
                    "treasury": "{}"
                }}
            }}"#,
            AccountId::new()
        );

        assert!(matches!(
            LedgerConfig::from_json(&json),
            Err(LedgerError::InvalidThreshold { threshold: 90 })
        ));
    }
}
