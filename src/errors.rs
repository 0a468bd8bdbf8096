use thiserror::Error;
use uuid::Uuid;

use crate::types::FiscalYearId;

/// which rate table a lookup was run against
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum RateKind {
    Tax,
    Insurance,
}

impl std::fmt::Display for RateKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RateKind::Tax => write!(f, "tax"),
            RateKind::Insurance => write!(f, "insurance"),
        }
    }
}

#[derive(Error, Debug)]
pub enum RenewalError {
    #[error("date out of supported range: {date} (supported BS {min_year}-{max_year})")]
    DateOutOfRange {
        date: String,
        min_year: i32,
        max_year: i32,
    },

    #[error("invalid date format: {input:?} ({reason})")]
    InvalidDateFormat {
        input: String,
        reason: String,
    },

    #[error("{kind} rate not found for {requested}; available: {available:?}")]
    RateNotFound {
        kind: RateKind,
        requested: String,
        available: Vec<String>,
    },

    #[error("no fiscal year configured")]
    NoFiscalYearConfigured,

    #[error("fiscal year not found: {id}")]
    FiscalYearNotFound {
        id: FiscalYearId,
    },

    #[error("vehicle not verified: {vehicle_id}")]
    VehicleNotVerified {
        vehicle_id: Uuid,
    },

    #[error("invalid configuration: {message}")]
    InvalidConfiguration {
        message: String,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, RenewalError>;
