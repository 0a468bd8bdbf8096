use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::errors::{RenewalError, Result};
use crate::types::FiscalYearId;

/// configured accounting year rates and penalties are bucketed by
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FiscalYear {
    pub id: FiscalYearId,
    /// e.g. "2081/82"
    pub label: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub is_current: bool,
}

impl FiscalYear {
    pub fn new(id: FiscalYearId, label: &str, start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            id,
            label: label.to_string(),
            start_date,
            end_date,
            is_current: false,
        }
    }

    /// mark as the current fiscal year
    pub fn current(mut self) -> Self {
        self.is_current = true;
        self
    }

    /// inclusive containment on both ends
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }
}

/// maps AD dates to configured fiscal years
#[derive(Debug, Clone, Copy)]
pub struct FiscalYearResolver<'a> {
    years: &'a [FiscalYear],
}

impl<'a> FiscalYearResolver<'a> {
    pub fn new(years: &'a [FiscalYear]) -> Self {
        Self { years }
    }

    /// fiscal year whose range contains `date`, if any
    pub fn resolve(&self, date: NaiveDate) -> Option<&'a FiscalYear> {
        self.years.iter().find(|fy| fy.contains(date))
    }

    pub fn by_id(&self, id: FiscalYearId) -> Option<&'a FiscalYear> {
        self.years.iter().find(|fy| fy.id == id)
    }

    /// the year flagged current, else the most recently created one
    pub fn current(&self) -> Option<&'a FiscalYear> {
        self.years
            .iter()
            .find(|fy| fy.is_current)
            .or_else(|| self.years.iter().max_by_key(|fy| fy.id))
    }

    /// resolve the fiscal year a calculation is made against
    pub fn target(&self, requested: Option<FiscalYearId>) -> Result<&'a FiscalYear> {
        if self.years.is_empty() {
            return Err(RenewalError::NoFiscalYearConfigured);
        }
        match requested {
            Some(id) => self.by_id(id).ok_or(RenewalError::FiscalYearNotFound { id }),
            None => self.current().ok_or(RenewalError::NoFiscalYearConfigured),
        }
    }
}

/// check ranges are well-formed, contiguous and non-overlapping, with at most one current year
pub fn validate_fiscal_years(years: &[FiscalYear]) -> Result<()> {
    let invalid = |message: String| Err(RenewalError::InvalidConfiguration { message });

    let current = years.iter().filter(|fy| fy.is_current).count();
    if current > 1 {
        return invalid(format!("{} fiscal years flagged current", current));
    }

    let mut sorted: Vec<&FiscalYear> = years.iter().collect();
    sorted.sort_by_key(|fy| fy.start_date);

    for fy in &sorted {
        if fy.start_date > fy.end_date {
            return invalid(format!("fiscal year {} ends before it starts", fy.label));
        }
    }

    for pair in sorted.windows(2) {
        let (prev, next) = (pair[0], pair[1]);
        if next.start_date <= prev.end_date {
            return invalid(format!("fiscal years {} and {} overlap", prev.label, next.label));
        }
        if prev.end_date.succ_opt() != Some(next.start_date) {
            return invalid(format!(
                "gap between fiscal years {} and {}",
                prev.label, next.label
            ));
        }
    }

    Ok(())
}
