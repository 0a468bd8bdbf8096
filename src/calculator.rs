//! Renewal charge calculation for a single vehicle.
//!
//! [`RenewalCalculator::calculate`] resolves the fiscal year being charged,
//! derives the vehicle's expiry, expands the owed years and prices each of
//! them against the rate tables. It holds no mutable state; tables, policy
//! and the clock are all passed in.

use hourglass_rs::SafeTimeProvider;
use serde::{Deserialize, Serialize};

use crate::calendar::BsDate;
use crate::config::EngineConfig;
use crate::decimal::Money;
use crate::errors::{RateKind, RenewalError, Result};
use crate::fiscal::{FiscalYear, FiscalYearResolver};
use crate::notices::{Notice, NoticeLog};
use crate::overdue::{OverdueYear, OverdueYearExpander, RenewalDates};
use crate::penalty::PenaltyTierResolver;
use crate::rates::{find_insurance_rate, find_tax_rate, RateKey, RateMatch, RateRow};
use crate::report::{CalculationResult, CalculationSummary, VehicleInfo, YearCalculation};
use crate::tables::RateTables;
use crate::types::{FiscalYearId, VehicleSnapshot};

fn default_include_insurance() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculateRequest {
    pub vehicle: VehicleSnapshot,
    /// charge against this fiscal year instead of the current one
    #[serde(default)]
    pub fiscal_year_id: Option<FiscalYearId>,
    #[serde(default = "default_include_insurance")]
    pub include_insurance: bool,
}

impl CalculateRequest {
    pub fn new(vehicle: VehicleSnapshot) -> Self {
        Self {
            vehicle,
            fiscal_year_id: None,
            include_insurance: true,
        }
    }

    pub fn with_fiscal_year(mut self, id: FiscalYearId) -> Self {
        self.fiscal_year_id = Some(id);
        self
    }

    pub fn without_insurance(mut self) -> Self {
        self.include_insurance = false;
        self
    }
}

pub struct RenewalCalculator<'a, T: RateTables> {
    tables: &'a T,
    config: &'a EngineConfig,
}

impl<'a, T: RateTables> RenewalCalculator<'a, T> {
    pub fn new(tables: &'a T, config: &'a EngineConfig) -> Self {
        Self { tables, config }
    }

    /// price a renewal; any failure aborts the whole calculation
    pub fn calculate(
        &self,
        request: &CalculateRequest,
        time: &SafeTimeProvider,
    ) -> Result<CalculationResult> {
        let vehicle = &request.vehicle;
        let resolver = FiscalYearResolver::new(self.tables.fiscal_years());
        let target = resolver.target(request.fiscal_year_id)?;

        if !vehicle.is_verified() {
            return Err(RenewalError::VehicleNotVerified {
                vehicle_id: vehicle.id,
            });
        }

        let today = self.config.today(time)?;
        let mut notices = NoticeLog::new();
        let dates = RenewalDates::derive(vehicle, self.config, &mut notices)?;

        log::debug!(
            "calculating renewal for vehicle {} against {}: expiry {} ({}), today {}",
            vehicle.id,
            target.label,
            dates.expiry_ad,
            dates.expiry_bs,
            today
        );

        let expansion = OverdueYearExpander::new(self.tables.fiscal_years(), self.config)
            .expand(dates.expiry_ad, today, target, &mut notices)?;

        let insurance = if request.include_insurance {
            self.insurance_premium(vehicle, target, &mut notices)?
        } else {
            Money::ZERO
        };

        let mut calculations = Vec::with_capacity(expansion.years.len());
        for (index, owed) in expansion.years.iter().enumerate() {
            let insurance_amount = if index == 0 { insurance } else { Money::ZERO };
            calculations.push(self.price_year(vehicle, owed, insurance_amount, &mut notices)?);
        }

        let summary = CalculationSummary::from_years(
            &calculations,
            self.config.service_fee,
            self.config.vat_amount(),
        );

        log::info!(
            "vehicle {}: {} year(s) owed, total {}",
            vehicle.id,
            summary.years_count,
            summary.total_amount
        );

        Ok(CalculationResult {
            vehicle_id: vehicle.id,
            fiscal_year_id: target.id,
            fiscal_year_label: target.label.clone(),
            vehicle_info: VehicleInfo {
                registration_date_bs: dates.registration_bs,
                registration_date_ad: dates.registration_ad,
                last_renewed_date_bs: dates.last_renewed_bs,
                last_renewed_date_ad: dates.last_renewed_ad,
                expiry_date_ad: dates.expiry_ad,
                expiry_date_bs: dates.expiry_bs,
                today_ad: today,
                today_bs: BsDate::from_ad(today)?,
            },
            calculations,
            summary,
            notices: notices.take_notices(),
            degraded: expansion.degraded,
        })
    }

    fn insurance_premium(
        &self,
        vehicle: &VehicleSnapshot,
        target: &FiscalYear,
        notices: &mut NoticeLog,
    ) -> Result<Money> {
        let key = RateKey {
            fiscal_year_id: target.id,
            vehicle_type: vehicle.vehicle_type,
            fuel_type: vehicle.fuel_type,
            capacity: vehicle.capacity,
            province_id: None,
        };
        let matched = find_insurance_rate(self.tables.insurance_rates(), &key)?;
        note_fallback(RateKind::Insurance, &key, &matched, notices);
        Ok(matched.amount())
    }

    fn price_year(
        &self,
        vehicle: &VehicleSnapshot,
        owed: &OverdueYear,
        insurance_amount: Money,
        notices: &mut NoticeLog,
    ) -> Result<YearCalculation> {
        let key = RateKey {
            fiscal_year_id: owed.fiscal_year_id,
            vehicle_type: vehicle.vehicle_type,
            fuel_type: vehicle.fuel_type,
            capacity: vehicle.capacity,
            province_id: Some(vehicle.province_id),
        };
        let tax = find_tax_rate(self.tables.tax_rates(), &key)?;
        note_fallback(RateKind::Tax, &key, &tax, notices);

        let resolution = PenaltyTierResolver::new(self.tables.penalty_tiers())
            .resolve(owed.days_overdue_after_grace, owed.fiscal_position);
        if resolution.is_gap() {
            notices.emit(Notice::PenaltyTierGap {
                fiscal_year_id: owed.fiscal_year_id,
                overdue_days: owed.days_overdue_after_grace,
            });
        }
        let percentages = resolution.percentages();

        let tax_amount = tax.amount();
        let renewal_fee = self.config.renewal_fee(vehicle.vehicle_type);
        let penalty_amount = tax_amount.percentage(percentages.tax_penalty_percent);
        let renewal_fee_penalty = renewal_fee.percentage(percentages.renewal_fee_penalty_percent);

        Ok(YearCalculation {
            fiscal_year_id: owed.fiscal_year_id,
            fiscal_year_label: owed.fiscal_year_label.clone(),
            expiry_date_ad: owed.expiry_date,
            expiry_date_bs: BsDate::from_ad(owed.expiry_date)?,
            days_overdue_after_grace: owed.days_overdue_after_grace,
            tax_amount,
            renewal_fee,
            penalty_amount,
            renewal_fee_penalty,
            insurance_amount,
            subtotal: tax_amount + renewal_fee + penalty_amount + renewal_fee_penalty + insurance_amount,
            percentages,
            penalty_tier: resolution.tier_label().map(str::to_string),
            tax_rate_step: tax.step,
        })
    }
}

fn note_fallback<R: RateRow>(
    kind: RateKind,
    key: &RateKey,
    matched: &RateMatch<'_, R>,
    notices: &mut NoticeLog,
) {
    if matched.is_fallback() {
        notices.emit(Notice::RateFallback {
            kind,
            step: matched.step,
            requested_fiscal_year_id: key.fiscal_year_id,
            requested_capacity: key.capacity,
            matched_fiscal_year_id: matched.row.fiscal_year_id(),
            matched_capacity: matched.row.capacity(),
        });
    }
}
