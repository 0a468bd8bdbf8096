//! Read-only configuration tables the engine calculates against.

use serde::{Deserialize, Serialize};

use crate::errors::{RateKind, Result};
use crate::fiscal::{validate_fiscal_years, FiscalYear};
use crate::penalty::{standard_ladder, validate_tiers, PenaltyTier};
use crate::rates::{validate_breakpoints, InsuranceRate, TaxRate};

/// source of fiscal years, rates and penalty tiers
///
/// Implementations must serve a consistent snapshot for the duration of a
/// calculation; the engine never writes through this trait.
pub trait RateTables {
    fn fiscal_years(&self) -> &[FiscalYear];
    fn tax_rates(&self) -> &[TaxRate];
    fn insurance_rates(&self) -> &[InsuranceRate];
    fn penalty_tiers(&self) -> &[PenaltyTier];
}

/// in-memory tables, loadable from json
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RateBook {
    #[serde(default)]
    pub fiscal_years: Vec<FiscalYear>,
    #[serde(default)]
    pub tax_rates: Vec<TaxRate>,
    #[serde(default)]
    pub insurance_rates: Vec<InsuranceRate>,
    #[serde(default = "standard_ladder")]
    pub penalty_tiers: Vec<PenaltyTier>,
}

impl RateBook {
    /// empty tables with the standard penalty ladder
    pub fn new() -> Self {
        Self {
            penalty_tiers: standard_ladder(),
            ..Self::default()
        }
    }

    pub fn with_fiscal_year(mut self, fiscal_year: FiscalYear) -> Self {
        self.fiscal_years.push(fiscal_year);
        self
    }

    pub fn with_tax_rate(mut self, rate: TaxRate) -> Self {
        self.tax_rates.push(rate);
        self
    }

    pub fn with_insurance_rate(mut self, rate: InsuranceRate) -> Self {
        self.insurance_rates.push(rate);
        self
    }

    /// replace the penalty ladder
    pub fn with_penalty_tiers(mut self, tiers: Vec<PenaltyTier>) -> Self {
        self.penalty_tiers = tiers;
        self
    }

    /// load from json and validate
    pub fn from_json(json: &str) -> Result<Self> {
        let book: RateBook = serde_json::from_str(json)?;
        book.validate()?;
        Ok(book)
    }

    pub fn to_json_pretty(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// check the table invariants
    pub fn validate(&self) -> Result<()> {
        validate_fiscal_years(&self.fiscal_years)?;
        validate_breakpoints(RateKind::Tax, &self.tax_rates)?;
        validate_breakpoints(RateKind::Insurance, &self.insurance_rates)?;
        validate_tiers(&self.penalty_tiers)?;
        Ok(())
    }
}

impl RateTables for RateBook {
    fn fiscal_years(&self) -> &[FiscalYear] {
        &self.fiscal_years
    }

    fn tax_rates(&self) -> &[TaxRate] {
        &self.tax_rates
    }

    fn insurance_rates(&self) -> &[InsuranceRate] {
        &self.insurance_rates
    }

    fn penalty_tiers(&self) -> &[PenaltyTier] {
        &self.penalty_tiers
    }
}
