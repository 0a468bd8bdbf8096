use chrono::{FixedOffset, NaiveDate};
use hourglass_rs::SafeTimeProvider;
use serde::{Deserialize, Serialize};

use crate::decimal::{Money, Rate};
use crate::errors::{RenewalError, Result};
use crate::penalty::GRACE_PERIOD_DAYS;
use crate::types::VehicleType;

/// owed years charged at most, regardless of actual delinquency
pub const MAX_YEARS_TO_CALCULATE: u32 = 4;

/// engine policy knobs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub grace_period_days: u32,
    pub max_years_to_calculate: u32,
    /// flat counter fee charged once per calculation
    pub service_fee: Money,
    /// VAT on the service fee only
    pub vat_rate: Rate,
    pub renewal_fees: RenewalFees,
    /// how far a cached AD expiry may drift from the BS-derived one
    pub cached_expiry_tolerance_days: u32,
    /// offset of the local calendar day from UTC
    pub utc_offset_minutes: i32,
}

/// flat renewal fee by vehicle type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenewalFees {
    pub two_wheeler: Money,
    pub four_wheeler: Money,
    pub commercial: Money,
    pub heavy: Money,
}

impl RenewalFees {
    pub fn for_vehicle(&self, vehicle_type: VehicleType) -> Money {
        match vehicle_type {
            VehicleType::TwoWheeler => self.two_wheeler,
            VehicleType::FourWheeler => self.four_wheeler,
            VehicleType::Commercial => self.commercial,
            VehicleType::Heavy => self.heavy,
        }
    }
}

impl EngineConfig {
    /// defaults for Nepal: 90-day grace, 4-year cap, Rs. 600 service fee, 13% VAT
    pub fn nepal() -> Self {
        Self {
            grace_period_days: GRACE_PERIOD_DAYS,
            max_years_to_calculate: MAX_YEARS_TO_CALCULATE,
            service_fee: Money::from_major(600),
            vat_rate: Rate::from_percentage(13),
            renewal_fees: RenewalFees {
                two_wheeler: Money::from_major(300),
                four_wheeler: Money::from_major(500),
                commercial: Money::from_major(500),
                heavy: Money::from_major(1_000),
            },
            cached_expiry_tolerance_days: 31,
            utc_offset_minutes: 5 * 60 + 45,
        }
    }

    /// load from json and validate
    pub fn from_json(json: &str) -> Result<Self> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_years_to_calculate == 0 {
            return Err(RenewalError::InvalidConfiguration {
                message: "max_years_to_calculate must be at least 1".to_string(),
            });
        }
        if self.service_fee.is_negative() {
            return Err(RenewalError::InvalidConfiguration {
                message: format!("negative service fee: {}", self.service_fee),
            });
        }
        if self.vat_rate.as_decimal().is_sign_negative() {
            return Err(RenewalError::InvalidConfiguration {
                message: format!("negative vat rate: {}", self.vat_rate),
            });
        }
        self.local_offset()?;
        Ok(())
    }

    pub fn renewal_fee(&self, vehicle_type: VehicleType) -> Money {
        self.renewal_fees.for_vehicle(vehicle_type)
    }

    /// VAT on the service fee, rounded to paisa
    pub fn vat_amount(&self) -> Money {
        self.service_fee.apply_rate(self.vat_rate).round_currency()
    }

    /// the local calendar day the clock is currently on
    pub fn today(&self, time: &SafeTimeProvider) -> Result<NaiveDate> {
        let offset = self.local_offset()?;
        Ok(time.now().with_timezone(&offset).date_naive())
    }

    fn local_offset(&self) -> Result<FixedOffset> {
        FixedOffset::east_opt(self.utc_offset_minutes * 60).ok_or_else(|| {
            RenewalError::InvalidConfiguration {
                message: format!("utc offset out of range: {} minutes", self.utc_offset_minutes),
            }
        })
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::nepal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use hourglass_rs::TimeSource;

    #[test]
    fn test_nepal_defaults() {
        let config = EngineConfig::nepal();
        assert_eq!(config.grace_period_days, 90);
        assert_eq!(config.max_years_to_calculate, 4);
        assert_eq!(config.vat_amount(), Money::from_major(78));
        assert_eq!(config.renewal_fee(VehicleType::TwoWheeler), Money::from_major(300));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_json_round_trip() {
        let mut config = EngineConfig::nepal();
        config.service_fee = Money::from_major(700);
        let json = serde_json::to_string(&config).unwrap();

        let loaded = EngineConfig::from_json(&json).unwrap();
        assert_eq!(loaded, config);
        assert_eq!(loaded.vat_amount(), Money::from_major(91));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = EngineConfig::nepal();
        config.max_years_to_calculate = 0;
        let json = serde_json::to_string(&config).unwrap();
        assert!(matches!(
            EngineConfig::from_json(&json),
            Err(RenewalError::InvalidConfiguration { .. })
        ));
        assert!(matches!(
            EngineConfig::from_json("{not json"),
            Err(RenewalError::Serialization(_))
        ));
    }

    #[test]
    fn test_today_uses_local_offset() {
        let config = EngineConfig::nepal();
        // 20:00 UTC is already the next day in Kathmandu
        let time = SafeTimeProvider::new(TimeSource::Test(
            Utc.with_ymd_and_hms(2024, 8, 11, 20, 0, 0).unwrap(),
        ));
        assert_eq!(
            config.today(&time).unwrap(),
            NaiveDate::from_ymd_opt(2024, 8, 12).unwrap()
        );
    }
}
