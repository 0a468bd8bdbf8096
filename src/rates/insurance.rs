use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::errors::{RateKind, Result};
use crate::rates::{find_rate, rate_not_found, RateKey, RateMatch, RateRow};
use crate::types::{FiscalYearId, FuelType, VehicleType};

/// third-party insurance premium for a capacity breakpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsuranceRate {
    pub fiscal_year_id: FiscalYearId,
    pub vehicle_type: VehicleType,
    pub fuel_type: FuelType,
    pub capacity: u32,
    pub premium: Money,
}

impl RateRow for InsuranceRate {
    fn fiscal_year_id(&self) -> FiscalYearId {
        self.fiscal_year_id
    }

    fn vehicle_type(&self) -> VehicleType {
        self.vehicle_type
    }

    fn fuel_type(&self) -> FuelType {
        self.fuel_type
    }

    fn capacity(&self) -> u32 {
        self.capacity
    }

    fn amount(&self) -> Money {
        self.premium
    }
}

/// premium lookup; the province of `key` is ignored
pub fn find_insurance_rate<'a>(
    rows: &'a [InsuranceRate],
    key: &RateKey,
) -> Result<RateMatch<'a, InsuranceRate>> {
    let key = RateKey {
        province_id: None,
        ..*key
    };
    find_rate(rows, &key).ok_or_else(|| rate_not_found(RateKind::Insurance, rows, &key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rates::LookupStep;

    fn premium(fiscal_year_id: FiscalYearId, capacity: u32, amount: i64) -> InsuranceRate {
        InsuranceRate {
            fiscal_year_id,
            vehicle_type: VehicleType::TwoWheeler,
            fuel_type: FuelType::Petrol,
            capacity,
            premium: Money::from_major(amount),
        }
    }

    #[test]
    fn test_province_is_ignored() {
        let rows = vec![premium(3, 150, 1_705)];
        let key = RateKey {
            fiscal_year_id: 3,
            vehicle_type: VehicleType::TwoWheeler,
            fuel_type: FuelType::Petrol,
            capacity: 150,
            province_id: Some(4),
        };
        let found = find_insurance_rate(&rows, &key).unwrap();
        assert_eq!(found.step, LookupStep::Exact);
        assert_eq!(found.amount(), Money::from_major(1_705));
    }

    #[test]
    fn test_previous_year_premium_is_reused() {
        let rows = vec![premium(2, 150, 1_600)];
        let key = RateKey {
            fiscal_year_id: 3,
            vehicle_type: VehicleType::TwoWheeler,
            fuel_type: FuelType::Petrol,
            capacity: 160,
            province_id: None,
        };
        let found = find_insurance_rate(&rows, &key).unwrap();
        assert_eq!(found.step, LookupStep::AnyFiscalYear);
    }

    #[test]
    fn test_missing_premium_is_an_error() {
        let rows: Vec<InsuranceRate> = Vec::new();
        let key = RateKey {
            fiscal_year_id: 3,
            vehicle_type: VehicleType::Heavy,
            fuel_type: FuelType::Diesel,
            capacity: 5_000,
            province_id: None,
        };
        assert!(find_insurance_rate(&rows, &key).is_err());
    }
}
