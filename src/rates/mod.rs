//! Rate lookup shared by the tax and insurance tables.
//!
//! A lookup walks [`LookupStep::CHAIN`] in order, each step relaxing one
//! constraint of the previous one, and returns the first row a step selects.

pub mod insurance;
pub mod tax;

use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::fmt;

use crate::decimal::Money;
use crate::errors::{RateKind, RenewalError};
use crate::types::{FiscalYearId, FuelType, ProvinceId, VehicleType};

pub use insurance::{find_insurance_rate, InsuranceRate};
pub use tax::{find_tax_rate, TaxRate};

/// a row of a capacity-keyed rate table
pub trait RateRow {
    fn fiscal_year_id(&self) -> FiscalYearId;
    fn vehicle_type(&self) -> VehicleType;
    fn fuel_type(&self) -> FuelType;
    fn capacity(&self) -> u32;
    fn amount(&self) -> Money;

    /// rows without a province apply to every province
    fn province_id(&self) -> Option<ProvinceId> {
        None
    }
}

/// requested dimensions of a lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateKey {
    pub fiscal_year_id: FiscalYearId,
    pub vehicle_type: VehicleType,
    pub fuel_type: FuelType,
    pub capacity: u32,
    /// only set for tax lookups
    pub province_id: Option<ProvinceId>,
}

impl fmt::Display for RateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "fiscal year {}, {}/{}, capacity {}",
            self.fiscal_year_id, self.vehicle_type, self.fuel_type, self.capacity
        )?;
        if let Some(province) = self.province_id {
            write!(f, ", province {}", province)?;
        }
        Ok(())
    }
}

/// fallback step that produced a match, most specific first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LookupStep {
    /// every dimension including capacity
    Exact,
    /// same fiscal year, largest capacity at or below the request
    ClosestBelow,
    /// any fiscal year, capacity at or below the request
    AnyFiscalYear,
    /// vehicle and fuel type only, largest capacity
    VehicleAndFuel,
}

impl LookupStep {
    pub const CHAIN: [LookupStep; 4] = [
        LookupStep::Exact,
        LookupStep::ClosestBelow,
        LookupStep::AnyFiscalYear,
        LookupStep::VehicleAndFuel,
    ];

    fn admits<R: RateRow>(&self, row: &R, key: &RateKey) -> bool {
        if row.vehicle_type() != key.vehicle_type || row.fuel_type() != key.fuel_type {
            return false;
        }
        if *self == LookupStep::VehicleAndFuel {
            return true;
        }

        let province_ok = match (key.province_id, row.province_id()) {
            (Some(wanted), Some(have)) => wanted == have,
            _ => true,
        };
        if !province_ok {
            return false;
        }

        match self {
            LookupStep::Exact => {
                row.fiscal_year_id() == key.fiscal_year_id && row.capacity() == key.capacity
            }
            LookupStep::ClosestBelow => {
                row.fiscal_year_id() == key.fiscal_year_id && row.capacity() <= key.capacity
            }
            LookupStep::AnyFiscalYear => row.capacity() <= key.capacity,
            LookupStep::VehicleAndFuel => true,
        }
    }

    /// most recent fiscal year first, then largest capacity, then the row
    /// closest to the requested province; lowest province id breaks ties
    fn select<'a, R: RateRow>(&self, rows: &'a [R], key: &RateKey) -> Option<&'a R> {
        rows.iter()
            .filter(|row| self.admits(*row, key))
            .max_by_key(|row| {
                (
                    row.fiscal_year_id(),
                    row.capacity(),
                    province_rank(*row, key),
                    Reverse(row.province_id()),
                )
            })
    }
}

/// own province beats a national row, which beats another province's row
fn province_rank<R: RateRow>(row: &R, key: &RateKey) -> u8 {
    match (row.province_id(), key.province_id) {
        (Some(have), Some(wanted)) if have == wanted => 2,
        (None, _) => 1,
        _ => 0,
    }
}

/// a row chosen by the fallback chain
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateMatch<'a, R> {
    pub row: &'a R,
    pub step: LookupStep,
}

impl<'a, R: RateRow> RateMatch<'a, R> {
    pub fn amount(&self) -> Money {
        self.row.amount()
    }

    pub fn is_fallback(&self) -> bool {
        self.step != LookupStep::Exact
    }
}

/// walk the fallback chain and return the first match
pub fn find_rate<'a, R: RateRow>(rows: &'a [R], key: &RateKey) -> Option<RateMatch<'a, R>> {
    LookupStep::CHAIN.iter().find_map(|step| {
        step.select(rows, key).map(|row| {
            if *step != LookupStep::Exact {
                log::debug!(
                    "rate fallback {:?} for {}: matched fiscal year {} capacity {}",
                    step,
                    key,
                    row.fiscal_year_id(),
                    row.capacity()
                );
            }
            RateMatch { row, step: *step }
        })
    })
}

/// error listing what the table does hold for the vehicle type
pub(crate) fn rate_not_found<R: RateRow>(kind: RateKind, rows: &[R], key: &RateKey) -> RenewalError {
    let available = rows
        .iter()
        .filter(|row| row.vehicle_type() == key.vehicle_type)
        .map(|row| {
            format!(
                "fiscal year {}, {}/{}, capacity {}",
                row.fiscal_year_id(),
                row.vehicle_type(),
                row.fuel_type(),
                row.capacity()
            )
        })
        .collect();

    RenewalError::RateNotFound {
        kind,
        requested: key.to_string(),
        available,
    }
}

/// check capacity breakpoints are distinct per key tuple
pub(crate) fn validate_breakpoints<R: RateRow>(kind: RateKind, rows: &[R]) -> crate::errors::Result<()> {
    let mut seen = std::collections::HashSet::new();
    for row in rows {
        let key = (
            row.fiscal_year_id(),
            row.vehicle_type(),
            row.fuel_type(),
            row.province_id(),
            row.capacity(),
        );
        if !seen.insert(key) {
            return Err(RenewalError::InvalidConfiguration {
                message: format!(
                    "duplicate {} rate: fiscal year {}, {}/{}, capacity {}",
                    kind,
                    row.fiscal_year_id(),
                    row.vehicle_type(),
                    row.fuel_type(),
                    row.capacity()
                ),
            });
        }
        if row.amount().is_negative() {
            return Err(RenewalError::InvalidConfiguration {
                message: format!("negative {} rate at capacity {}", kind, row.capacity()),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Row {
        fy: FiscalYearId,
        vehicle: VehicleType,
        fuel: FuelType,
        capacity: u32,
        amount: i64,
        province: Option<ProvinceId>,
    }

    impl RateRow for Row {
        fn fiscal_year_id(&self) -> FiscalYearId {
            self.fy
        }
        fn vehicle_type(&self) -> VehicleType {
            self.vehicle
        }
        fn fuel_type(&self) -> FuelType {
            self.fuel
        }
        fn capacity(&self) -> u32 {
            self.capacity
        }
        fn amount(&self) -> Money {
            Money::from_major(self.amount)
        }
        fn province_id(&self) -> Option<ProvinceId> {
            self.province
        }
    }

    fn row(fy: FiscalYearId, capacity: u32, amount: i64) -> Row {
        Row {
            fy,
            vehicle: VehicleType::TwoWheeler,
            fuel: FuelType::Petrol,
            capacity,
            amount,
            province: Some(3),
        }
    }

    fn key(fy: FiscalYearId, capacity: u32) -> RateKey {
        RateKey {
            fiscal_year_id: fy,
            vehicle_type: VehicleType::TwoWheeler,
            fuel_type: FuelType::Petrol,
            capacity,
            province_id: Some(3),
        }
    }

    #[test]
    fn test_exact_match() {
        let rows = vec![row(2, 125, 3_000), row(2, 150, 5_000)];
        let found = find_rate(&rows, &key(2, 150)).unwrap();
        assert_eq!(found.step, LookupStep::Exact);
        assert_eq!(found.amount(), Money::from_major(5_000));
    }

    #[test]
    fn test_closest_below() {
        let rows = vec![row(2, 125, 3_000), row(2, 150, 5_000)];
        let found = find_rate(&rows, &key(2, 140)).unwrap();
        assert_eq!(found.step, LookupStep::ClosestBelow);
        assert_eq!(found.row.capacity, 125);
    }

    #[test]
    fn test_no_lower_row_falls_through() {
        let rows = vec![row(2, 125, 3_000), row(2, 150, 5_000)];
        let found = find_rate(&rows, &key(2, 100)).unwrap();
        assert_eq!(found.step, LookupStep::VehicleAndFuel);
        assert_eq!(found.row.capacity, 150);
    }

    #[test]
    fn test_any_fiscal_year_prefers_most_recent() {
        let rows = vec![row(1, 125, 2_500), row(2, 100, 2_800), row(2, 125, 3_000)];
        let found = find_rate(&rows, &key(5, 130)).unwrap();
        assert_eq!(found.step, LookupStep::AnyFiscalYear);
        assert_eq!(found.row.fy, 2);
        assert_eq!(found.row.capacity, 125);
    }

    #[test]
    fn test_province_relaxed_only_at_last_step() {
        let mut other_province = row(2, 125, 4_000);
        other_province.province = Some(7);
        let rows = vec![other_province];

        let found = find_rate(&rows, &key(2, 125)).unwrap();
        assert_eq!(found.step, LookupStep::VehicleAndFuel);
    }

    #[test]
    fn test_provinceless_row_applies_everywhere() {
        let mut national = row(2, 125, 4_000);
        national.province = None;
        let rows = vec![national];
        assert_eq!(find_rate(&rows, &key(2, 125)).unwrap().step, LookupStep::Exact);
    }

    #[test]
    fn test_nothing_for_vehicle_and_fuel() {
        let rows = vec![row(2, 125, 3_000)];
        let mut wanted = key(2, 125);
        wanted.fuel_type = FuelType::Electric;
        assert!(find_rate(&rows, &wanted).is_none());

        let err = rate_not_found(RateKind::Tax, &rows, &wanted);
        match err {
            RenewalError::RateNotFound { kind, available, .. } => {
                assert_eq!(kind, RateKind::Tax);
                assert_eq!(available.len(), 1);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_duplicate_breakpoints_rejected() {
        let rows = vec![row(2, 125, 3_000), row(2, 125, 3_100)];
        assert!(validate_breakpoints(RateKind::Tax, &rows).is_err());
        assert!(validate_breakpoints(RateKind::Tax, &rows[..1]).is_ok());
    }
}
