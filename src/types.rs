use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// unique identifier for a vehicle
pub type VehicleId = Uuid;

/// fiscal year identifier; higher ids were created later
pub type FiscalYearId = u32;

/// province identifier as used by provincial tax tables
pub type ProvinceId = u32;

/// vehicle category used as a rate-table dimension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum VehicleType {
    #[serde(rename = "2W")]
    TwoWheeler,
    #[serde(rename = "4W")]
    FourWheeler,
    Commercial,
    Heavy,
}

impl fmt::Display for VehicleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            VehicleType::TwoWheeler => "2W",
            VehicleType::FourWheeler => "4W",
            VehicleType::Commercial => "Commercial",
            VehicleType::Heavy => "Heavy",
        };
        f.write_str(label)
    }
}

/// fuel type used as a rate-table dimension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FuelType {
    Petrol,
    Diesel,
    Electric,
}

impl fmt::Display for FuelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// read-only view of a vehicle as supplied by the vehicle repository
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleSnapshot {
    pub id: VehicleId,
    /// engine displacement in CC, or motor rating in Watts for electric vehicles
    pub capacity: u32,
    pub vehicle_type: VehicleType,
    pub fuel_type: FuelType,
    pub province_id: ProvinceId,
    /// "YYYY-MM-DD" in Bikram Sambat
    pub last_renewed_date_bs: Option<String>,
    /// "YYYY-MM-DD" in Bikram Sambat
    pub registration_date_bs: String,
    pub cached_expiry_date_ad: Option<NaiveDate>,
    /// verification is owned by the vehicle repository
    #[serde(default)]
    pub is_verified: bool,
}

impl VehicleSnapshot {
    pub fn is_verified(&self) -> bool {
        self.is_verified
    }
}
