pub mod calculator;
pub mod calendar;
pub mod config;
pub mod decimal;
pub mod errors;
pub mod fiscal;
pub mod notices;
pub mod overdue;
pub mod penalty;
pub mod rates;
pub mod report;
pub mod tables;
pub mod types;

// re-export key types
pub use calculator::{CalculateRequest, RenewalCalculator};
pub use calendar::{to_ad, to_bs, BsDate};
pub use config::{EngineConfig, RenewalFees, MAX_YEARS_TO_CALCULATE};
pub use decimal::{Money, Rate};
pub use errors::{RateKind, RenewalError, Result};
pub use fiscal::{FiscalYear, FiscalYearResolver};
pub use notices::{Notice, NoticeLog};
pub use overdue::{OverdueExpansion, OverdueYear, OverdueYearExpander, RenewalDates};
pub use penalty::{
    FiscalPosition, PenaltyPercentages, PenaltyTier, PenaltyTierResolver, TierResolution,
    TierScope, GRACE_PERIOD_DAYS,
};
pub use rates::{
    find_insurance_rate, find_rate, find_tax_rate, InsuranceRate, LookupStep, RateKey, RateMatch,
    TaxRate,
};
pub use report::{CalculationResult, CalculationSummary, VehicleInfo, YearCalculation};
pub use tables::{RateBook, RateTables};
pub use types::{FiscalYearId, FuelType, ProvinceId, VehicleId, VehicleSnapshot, VehicleType};

// re-export external dependencies that users will need
pub use chrono;
pub use hourglass_rs::{SafeTimeProvider, TimeSource};
pub use rust_decimal::Decimal;
pub use uuid::Uuid;
