/// serializable result of a renewal calculation
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::calendar::BsDate;
use crate::decimal::Money;
use crate::notices::Notice;
use crate::penalty::PenaltyPercentages;
use crate::rates::LookupStep;
use crate::types::{FiscalYearId, VehicleId};

/// itemized charges for one owed fiscal year
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearCalculation {
    pub fiscal_year_id: FiscalYearId,
    pub fiscal_year_label: String,
    pub expiry_date_ad: NaiveDate,
    pub expiry_date_bs: BsDate,
    pub days_overdue_after_grace: u32,
    pub tax_amount: Money,
    pub renewal_fee: Money,
    pub penalty_amount: Money,
    pub renewal_fee_penalty: Money,
    /// non-zero on the first year only
    pub insurance_amount: Money,
    pub subtotal: Money,
    pub percentages: PenaltyPercentages,
    pub penalty_tier: Option<String>,
    pub tax_rate_step: LookupStep,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleInfo {
    pub registration_date_bs: BsDate,
    pub registration_date_ad: NaiveDate,
    pub last_renewed_date_bs: Option<BsDate>,
    pub last_renewed_date_ad: Option<NaiveDate>,
    pub expiry_date_ad: NaiveDate,
    pub expiry_date_bs: BsDate,
    pub today_ad: NaiveDate,
    pub today_bs: BsDate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationSummary {
    pub total_tax: Money,
    pub total_renewal_fee: Money,
    pub total_penalty: Money,
    pub total_renewal_fee_penalty: Money,
    /// tax penalty plus renewal fee penalty
    pub total_penalty_amount: Money,
    pub total_insurance: Money,
    pub service_fee: Money,
    pub vat_amount: Money,
    pub total_amount: Money,
    pub years_count: u32,
}

impl CalculationSummary {
    /// totals over the owed years plus the once-per-result fees;
    /// only the grand total is rounded
    pub fn from_years(years: &[YearCalculation], service_fee: Money, vat_amount: Money) -> Self {
        let total_tax: Money = years.iter().map(|y| y.tax_amount).sum();
        let total_renewal_fee: Money = years.iter().map(|y| y.renewal_fee).sum();
        let total_penalty: Money = years.iter().map(|y| y.penalty_amount).sum();
        let total_renewal_fee_penalty: Money = years.iter().map(|y| y.renewal_fee_penalty).sum();
        let total_insurance: Money = years.iter().map(|y| y.insurance_amount).sum();

        let total_amount = (total_tax
            + total_insurance
            + total_renewal_fee
            + total_penalty
            + total_renewal_fee_penalty
            + service_fee
            + vat_amount)
            .round_currency();

        CalculationSummary {
            total_tax,
            total_renewal_fee,
            total_penalty,
            total_renewal_fee_penalty,
            total_penalty_amount: total_penalty + total_renewal_fee_penalty,
            total_insurance,
            service_fee,
            vat_amount,
            total_amount,
            years_count: years.len() as u32,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationResult {
    pub vehicle_id: VehicleId,
    pub fiscal_year_id: FiscalYearId,
    pub fiscal_year_label: String,
    pub vehicle_info: VehicleInfo,
    pub calculations: Vec<YearCalculation>,
    pub summary: CalculationSummary,
    #[serde(default)]
    pub notices: Vec<Notice>,
    /// the owed years are an estimate, see [`Notice::DegradedExpansion`]
    #[serde(default)]
    pub degraded: bool,
}

impl CalculationResult {
    pub fn needs_attention(&self) -> bool {
        self.degraded || self.notices.iter().any(Notice::needs_attention)
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
