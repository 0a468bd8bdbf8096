use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::errors::{RateKind, Result};
use crate::rates::{find_rate, rate_not_found, RateKey, RateMatch, RateRow};
use crate::types::{FiscalYearId, FuelType, ProvinceId, VehicleType};

/// annual vehicle tax for a capacity breakpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxRate {
    pub fiscal_year_id: FiscalYearId,
    #[serde(default)]
    pub province_id: Option<ProvinceId>,
    pub vehicle_type: VehicleType,
    pub fuel_type: FuelType,
    pub capacity: u32,
    pub amount: Money,
}

impl RateRow for TaxRate {
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
        self.amount
    }

    fn province_id(&self) -> Option<ProvinceId> {
        self.province_id
    }
}

/// tax lookup through the full fallback chain
pub fn find_tax_rate<'a>(rows: &'a [TaxRate], key: &RateKey) -> Result<RateMatch<'a, TaxRate>> {
    find_rate(rows, key).ok_or_else(|| rate_not_found(RateKind::Tax, rows, key))
}
