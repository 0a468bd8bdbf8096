use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::calendar::{BsDate, FIRST_BS_YEAR, LAST_BS_YEAR};
use crate::config::EngineConfig;
use crate::errors::{RenewalError, Result};
use crate::fiscal::{FiscalYear, FiscalYearResolver};
use crate::notices::{Notice, NoticeLog};
use crate::penalty::{overdue_days_after_grace, FiscalPosition};
use crate::types::{FiscalYearId, VehicleSnapshot};

/// AD and BS dates that anchor a vehicle's renewal cycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenewalDates {
    pub registration_bs: BsDate,
    pub registration_ad: NaiveDate,
    pub last_renewed_bs: Option<BsDate>,
    pub last_renewed_ad: Option<NaiveDate>,
    pub expiry_ad: NaiveDate,
    pub expiry_bs: BsDate,
    /// the cached AD expiry was used instead of the derived one
    pub from_cache: bool,
}

impl RenewalDates {
    /// convert the vehicle's BS dates and derive its expiry
    pub fn derive(
        vehicle: &VehicleSnapshot,
        config: &EngineConfig,
        notices: &mut NoticeLog,
    ) -> Result<Self> {
        let registration_bs = BsDate::parse(&vehicle.registration_date_bs)?;
        let registration_ad = registration_bs.to_ad()?;

        let last_renewed_bs = match vehicle.last_renewed_date_bs.as_deref() {
            Some(date) if !date.trim().is_empty() => Some(BsDate::parse(date)?),
            _ => None,
        };
        let last_renewed_ad = last_renewed_bs.map(|d| d.to_ad()).transpose()?;

        let basis = last_renewed_ad.unwrap_or(registration_ad);
        let derived = expiry_after(basis, 1)?;

        let (expiry_ad, from_cache) = match vehicle.cached_expiry_date_ad {
            Some(cached) => {
                let drift = (cached - derived).num_days().unsigned_abs();
                if drift <= config.cached_expiry_tolerance_days as u64 {
                    (cached, true)
                } else {
                    notices.emit(Notice::CachedExpiryDiscarded { cached, derived });
                    (derived, false)
                }
            }
            None => (derived, false),
        };

        Ok(Self {
            registration_bs,
            registration_ad,
            last_renewed_bs,
            last_renewed_ad,
            expiry_ad,
            expiry_bs: BsDate::from_ad(expiry_ad)?,
            from_cache,
        })
    }
}

/// one renewal cycle that has to be paid for
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverdueYear {
    pub fiscal_year_id: FiscalYearId,
    pub fiscal_year_label: String,
    pub expiry_date: NaiveDate,
    pub days_overdue_after_grace: u32,
    pub fiscal_position: FiscalPosition,
}

/// ordered owed years, oldest first
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverdueExpansion {
    pub years: Vec<OverdueYear>,
    /// no owed year matched a fiscal year and an estimate was used
    pub degraded: bool,
    /// overdue cycles past the cap that are not charged
    pub uncharged_years: u32,
}

/// enumerates the renewal cycles a delinquent vehicle owes
#[derive(Debug, Clone, Copy)]
pub struct OverdueYearExpander<'a> {
    resolver: FiscalYearResolver<'a>,
    grace_period_days: u32,
    max_years: u32,
}

impl<'a> OverdueYearExpander<'a> {
    pub fn new(fiscal_years: &'a [FiscalYear], config: &EngineConfig) -> Self {
        Self {
            resolver: FiscalYearResolver::new(fiscal_years),
            grace_period_days: config.grace_period_days,
            max_years: config.max_years_to_calculate,
        }
    }

    /// list owed years for a cycle expiring on `expiry`; `target` is the
    /// fiscal year charged when nothing is overdue or matching fails
    pub fn expand(
        &self,
        expiry: NaiveDate,
        today: NaiveDate,
        target: &FiscalYear,
        notices: &mut NoticeLog,
    ) -> Result<OverdueExpansion> {
        let grace_end = expiry + chrono::Duration::days(self.grace_period_days as i64);
        if today <= grace_end {
            return Ok(OverdueExpansion {
                years: vec![OverdueYear {
                    fiscal_year_id: target.id,
                    fiscal_year_label: target.label.clone(),
                    expiry_date: expiry,
                    days_overdue_after_grace: 0,
                    fiscal_position: self.position(expiry, today),
                }],
                degraded: false,
                uncharged_years: 0,
            });
        }

        let mut years = Vec::new();
        let mut skipped = Vec::new();
        for n in 0..self.max_years {
            let year_expiry = expiry_after(expiry, n)?;
            if year_expiry > today {
                break;
            }
            let days_overdue_after_grace =
                overdue_days_after_grace(today, year_expiry, self.grace_period_days);
            let Some(fiscal_year) = self.resolver.resolve(year_expiry) else {
                skipped.push(Notice::CycleWithoutFiscalYear {
                    expiry_date: year_expiry,
                    days_overdue_after_grace,
                });
                continue;
            };
            years.push(OverdueYear {
                fiscal_year_id: fiscal_year.id,
                fiscal_year_label: fiscal_year.label.clone(),
                expiry_date: year_expiry,
                days_overdue_after_grace,
                fiscal_position: position_in(fiscal_year, today),
            });
        }

        let uncharged_years = self.uncharged_cycles(expiry, today)?;
        if uncharged_years > 0 {
            notices.emit(Notice::AmnestyCapApplied {
                charged_years: self.max_years,
                uncharged_years,
            });
        }

        if years.is_empty() {
            let days_delayed = overdue_days_after_grace(today, expiry, self.grace_period_days);
            notices.emit(Notice::DegradedExpansion {
                fallback_fiscal_year_id: target.id,
                days_delayed,
            });
            return Ok(OverdueExpansion {
                years: vec![OverdueYear {
                    fiscal_year_id: target.id,
                    fiscal_year_label: target.label.clone(),
                    expiry_date: expiry,
                    days_overdue_after_grace: days_delayed,
                    fiscal_position: self.position(expiry, today),
                }],
                degraded: true,
                uncharged_years,
            });
        }

        for notice in skipped {
            notices.emit(notice);
        }
        Ok(OverdueExpansion {
            years,
            degraded: false,
            uncharged_years,
        })
    }

    /// an unresolvable expiry year is treated as already closed
    fn position(&self, expiry: NaiveDate, today: NaiveDate) -> FiscalPosition {
        match self.resolver.resolve(expiry) {
            Some(fiscal_year) => position_in(fiscal_year, today),
            None => FiscalPosition::AfterExpiryFiscalYear,
        }
    }

    /// cycles at or past the cap whose expiry has already passed
    fn uncharged_cycles(&self, expiry: NaiveDate, today: NaiveDate) -> Result<u32> {
        let mut count = 0;
        let mut n = self.max_years;
        loop {
            let year_expiry = expiry_after(expiry, n)?;
            if year_expiry > today {
                return Ok(count);
            }
            count += 1;
            n += 1;
        }
    }
}

/// expiry `years` renewal cycles after `date`
pub fn expiry_after(date: NaiveDate, years: u32) -> Result<NaiveDate> {
    date.checked_add_months(Months::new(years * 12))
        .ok_or_else(|| RenewalError::DateOutOfRange {
            date: date.to_string(),
            min_year: FIRST_BS_YEAR,
            max_year: LAST_BS_YEAR,
        })
}

fn position_in(fiscal_year: &FiscalYear, today: NaiveDate) -> FiscalPosition {
    if today <= fiscal_year.end_date {
        FiscalPosition::WithinExpiryFiscalYear
    } else {
        FiscalPosition::AfterExpiryFiscalYear
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    use crate::types::{FuelType, VehicleType};

    fn ad(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    /// fiscal years 2070/71 through 2082/83, Shrawan 1 to Ashadh end
    fn fiscal_years() -> Vec<FiscalYear> {
        let mut years = Vec::new();
        for (i, bs_year) in (2070..=2082).enumerate() {
            let start = BsDate::new(bs_year, 4, 1).unwrap().to_ad().unwrap();
            let end = BsDate::new(bs_year + 1, 4, 1).unwrap().to_ad().unwrap().pred_opt().unwrap();
            let label = format!("{}/{:02}", bs_year, (bs_year + 1) % 100);
            years.push(FiscalYear::new(i as u32 + 1, &label, start, end));
        }
        years
    }

    fn vehicle(last_renewed: &str) -> VehicleSnapshot {
        VehicleSnapshot {
            id: Uuid::new_v4(),
            capacity: 125,
            vehicle_type: VehicleType::TwoWheeler,
            fuel_type: FuelType::Petrol,
            province_id: 3,
            last_renewed_date_bs: Some(last_renewed.to_string()),
            registration_date_bs: "2075-04-10".to_string(),
            cached_expiry_date_ad: None,
            is_verified: true,
        }
    }

    #[test]
    fn test_derive_expiry_from_last_renewal() {
        let mut notices = NoticeLog::new();
        let dates = RenewalDates::derive(&vehicle("2080-01-01"), &EngineConfig::nepal(), &mut notices)
            .unwrap();
        assert_eq!(dates.last_renewed_ad, Some(ad(2023, 4, 14)));
        assert_eq!(dates.expiry_ad, ad(2024, 4, 14));
        assert_eq!(dates.expiry_bs.to_string(), "2081-01-02");
        assert!(!dates.from_cache);
        assert!(notices.notices().is_empty());
    }

    #[test]
    fn test_cached_expiry_used_when_consistent() {
        let mut v = vehicle("2080-01-01");
        v.cached_expiry_date_ad = Some(ad(2024, 4, 13));
        let mut notices = NoticeLog::new();
        let dates = RenewalDates::derive(&v, &EngineConfig::nepal(), &mut notices).unwrap();
        assert_eq!(dates.expiry_ad, ad(2024, 4, 13));
        assert!(dates.from_cache);
    }

    #[test]
    fn test_cached_expiry_discarded_when_far_off() {
        let mut v = vehicle("2080-01-01");
        v.cached_expiry_date_ad = Some(ad(2025, 4, 14));
        let mut notices = NoticeLog::new();
        let dates = RenewalDates::derive(&v, &EngineConfig::nepal(), &mut notices).unwrap();
        assert_eq!(dates.expiry_ad, ad(2024, 4, 14));
        assert!(matches!(notices.notices()[0], Notice::CachedExpiryDiscarded { .. }));
    }

    #[test]
    fn test_registration_used_without_renewal() {
        let mut v = vehicle("2080-01-01");
        v.last_renewed_date_bs = None;
        let mut notices = NoticeLog::new();
        let dates = RenewalDates::derive(&v, &EngineConfig::nepal(), &mut notices).unwrap();
        assert_eq!(dates.last_renewed_bs, None);
        assert_eq!(dates.expiry_ad, expiry_after(dates.registration_ad, 1).unwrap());
    }

    #[test]
    fn test_within_grace_owes_current_cycle_only() {
        let years = fiscal_years();
        let expander = OverdueYearExpander::new(&years, &EngineConfig::nepal());
        let target = years.last().unwrap();
        let expiry = ad(2024, 4, 14);
        let mut notices = NoticeLog::new();

        let expansion = expander
            .expand(expiry, expiry + chrono::Duration::days(90), target, &mut notices)
            .unwrap();
        assert_eq!(expansion.years.len(), 1);
        assert_eq!(expansion.years[0].days_overdue_after_grace, 0);
        assert_eq!(expansion.years[0].fiscal_year_id, target.id);
        assert!(!expansion.degraded);
    }

    #[test]
    fn test_one_day_past_grace() {
        let years = fiscal_years();
        let expander = OverdueYearExpander::new(&years, &EngineConfig::nepal());
        let expiry = ad(2024, 4, 14);
        let mut notices = NoticeLog::new();

        let expansion = expander
            .expand(expiry, expiry + chrono::Duration::days(91), years.last().unwrap(), &mut notices)
            .unwrap();
        assert_eq!(expansion.years.len(), 1);
        assert_eq!(expansion.years[0].days_overdue_after_grace, 1);
        assert_eq!(expansion.years[0].fiscal_year_label, "2080/81");
    }

    #[test]
    fn test_multi_year_expansion_is_ordered() {
        let years = fiscal_years();
        let expander = OverdueYearExpander::new(&years, &EngineConfig::nepal());
        let expiry = ad(2022, 4, 14);
        let today = ad(2024, 9, 1);
        let mut notices = NoticeLog::new();

        let expansion = expander
            .expand(expiry, today, years.last().unwrap(), &mut notices)
            .unwrap();
        let expiries: Vec<NaiveDate> = expansion.years.iter().map(|y| y.expiry_date).collect();
        assert_eq!(expiries, vec![ad(2022, 4, 14), ad(2023, 4, 14), ad(2024, 4, 14)]);
        assert!(expansion.years.windows(2).all(|w| w[0].fiscal_year_id < w[1].fiscal_year_id));
        assert_eq!(expansion.years[2].days_overdue_after_grace, 50);
        assert_eq!(expansion.uncharged_years, 0);
    }

    #[test]
    fn test_amnesty_cap() {
        let years = fiscal_years();
        let expander = OverdueYearExpander::new(&years, &EngineConfig::nepal());
        let expiry = ad(2014, 5, 1);
        let today = ad(2024, 9, 1);
        let mut notices = NoticeLog::new();

        let expansion = expander
            .expand(expiry, today, years.last().unwrap(), &mut notices)
            .unwrap();
        assert_eq!(expansion.years.len(), 4);
        assert_eq!(expansion.uncharged_years, 7);
        assert!(notices
            .notices()
            .contains(&Notice::AmnestyCapApplied { charged_years: 4, uncharged_years: 7 }));
    }

    #[test]
    fn test_cycle_in_missing_fiscal_year_is_flagged() {
        let years: Vec<FiscalYear> = fiscal_years()
            .into_iter()
            .filter(|fy| fy.label != "2080/81")
            .collect();
        let expander = OverdueYearExpander::new(&years, &EngineConfig::nepal());
        let expiry = ad(2022, 8, 1);
        let today = ad(2025, 3, 1);
        let mut notices = NoticeLog::new();

        let expansion = expander
            .expand(expiry, today, years.last().unwrap(), &mut notices)
            .unwrap();
        let labels: Vec<&str> = expansion.years.iter().map(|y| y.fiscal_year_label.as_str()).collect();
        assert_eq!(labels, vec!["2079/80", "2081/82"]);
        assert!(!expansion.degraded);

        let skipped: Vec<&Notice> = notices
            .notices()
            .iter()
            .filter(|n| matches!(n, Notice::CycleWithoutFiscalYear { .. }))
            .collect();
        assert_eq!(
            skipped,
            vec![&Notice::CycleWithoutFiscalYear {
                expiry_date: ad(2023, 8, 1),
                days_overdue_after_grace: overdue_days_after_grace(ad(2025, 3, 1), ad(2023, 8, 1), 90),
            }]
        );
        assert!(skipped[0].needs_attention());
    }

    #[test]
    fn test_degraded_when_no_fiscal_year_matches() {
        let years = vec![FiscalYear::new(9, "2081/82", ad(2024, 7, 16), ad(2025, 7, 16)).current()];
        let expander = OverdueYearExpander::new(&years, &EngineConfig::nepal());
        let expiry = ad(2020, 1, 1);
        let today = ad(2020, 6, 1);
        let mut notices = NoticeLog::new();

        let expansion = expander.expand(expiry, today, &years[0], &mut notices).unwrap();
        assert!(expansion.degraded);
        assert_eq!(expansion.years.len(), 1);
        assert_eq!(expansion.years[0].fiscal_year_id, 9);
        assert_eq!(expansion.years[0].days_overdue_after_grace, 62);
        assert_eq!(
            expansion.years[0].fiscal_position,
            FiscalPosition::AfterExpiryFiscalYear
        );
        assert!(matches!(notices.notices()[0], Notice::DegradedExpansion { .. }));
    }
}
