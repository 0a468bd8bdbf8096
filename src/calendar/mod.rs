//! Bikram Sambat <-> Gregorian conversion.
//!
//! Conversion counts days from a fixed epoch through the per-year month table in
//! [`data`], so it is exact for every date the table covers and fails outside it.

pub mod data;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::{RenewalError, Result};

pub use data::{FIRST_BS_YEAR, LAST_BS_YEAR};
use data::{BsYear, BS_YEARS, EPOCH_DAYS_FROM_CE};

/// calendar date in Bikram Sambat, always valid against the month table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BsDate {
    year: i32,
    month: u32,
    day: u32,
}

impl BsDate {
    /// create a BS date, checking the day against that year's month length
    pub fn new(year: i32, month: u32, day: u32) -> Result<Self> {
        let input = format!("{:04}-{:02}-{:02}", year, month, day);
        if !(1..=12).contains(&month) {
            return Err(RenewalError::InvalidDateFormat {
                input,
                reason: format!("month {} is not between 1 and 12", month),
            });
        }
        let row = year_row(year)?;
        let month_len = row.months[(month - 1) as usize] as u32;
        if day == 0 || day > month_len {
            return Err(RenewalError::InvalidDateFormat {
                input,
                reason: format!("day {} exceeds month length {}", day, month_len),
            });
        }
        Ok(Self { year, month, day })
    }

    /// parse a strict "YYYY-MM-DD" string
    pub fn parse(input: &str) -> Result<Self> {
        let malformed = |reason: &str| RenewalError::InvalidDateFormat {
            input: input.to_string(),
            reason: reason.to_string(),
        };

        let parts: Vec<&str> = input.trim().split('-').collect();
        if parts.len() != 3 {
            return Err(malformed("expected YYYY-MM-DD"));
        }
        let widths = [4, 2, 2];
        for (part, width) in parts.iter().zip(widths) {
            if part.len() != width || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(malformed("expected YYYY-MM-DD"));
            }
        }

        let year: i32 = parts[0].parse().map_err(|_| malformed("bad year"))?;
        let month: u32 = parts[1].parse().map_err(|_| malformed("bad month"))?;
        let day: u32 = parts[2].parse().map_err(|_| malformed("bad day"))?;
        Self::new(year, month, day)
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn day(&self) -> u32 {
        self.day
    }

    /// convert to the Gregorian date
    pub fn to_ad(&self) -> Result<NaiveDate> {
        let mut offset: i64 = BS_YEARS
            .iter()
            .take_while(|row| row.year < self.year)
            .map(|row| row.total_days() as i64)
            .sum();

        let row = year_row(self.year)?;
        offset += row.months[..(self.month - 1) as usize]
            .iter()
            .map(|&d| d as i64)
            .sum::<i64>();
        offset += (self.day - 1) as i64;

        let days = EPOCH_DAYS_FROM_CE as i64 + offset;
        i32::try_from(days)
            .ok()
            .and_then(NaiveDate::from_num_days_from_ce_opt)
            .ok_or_else(|| out_of_range(self.to_string()))
    }

    /// convert a Gregorian date into BS
    pub fn from_ad(date: NaiveDate) -> Result<Self> {
        let mut remaining = date.num_days_from_ce() as i64 - EPOCH_DAYS_FROM_CE as i64;
        if remaining < 0 {
            return Err(out_of_range(date.to_string()));
        }

        for row in BS_YEARS.iter() {
            let year_days = row.total_days() as i64;
            if remaining >= year_days {
                remaining -= year_days;
                continue;
            }
            for (index, &month_days) in row.months.iter().enumerate() {
                let month_days = month_days as i64;
                if remaining < month_days {
                    return Ok(Self {
                        year: row.year,
                        month: index as u32 + 1,
                        day: remaining as u32 + 1,
                    });
                }
                remaining -= month_days;
            }
        }

        Err(out_of_range(date.to_string()))
    }
}

impl fmt::Display for BsDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }
}

impl FromStr for BsDate {
    type Err = RenewalError;

    fn from_str(s: &str) -> Result<Self> {
        BsDate::parse(s)
    }
}

impl TryFrom<String> for BsDate {
    type Error = RenewalError;

    fn try_from(value: String) -> Result<Self> {
        BsDate::parse(&value)
    }
}

impl From<BsDate> for String {
    fn from(date: BsDate) -> Self {
        date.to_string()
    }
}

/// convert a "YYYY-MM-DD" BS string to AD
pub fn to_ad(bs_date: &str) -> Result<NaiveDate> {
    BsDate::parse(bs_date)?.to_ad()
}

/// convert an AD date to BS
pub fn to_bs(ad_date: NaiveDate) -> Result<BsDate> {
    BsDate::from_ad(ad_date)
}

/// number of days in a BS month
pub fn days_in_month(year: i32, month: u32) -> Result<u32> {
    if !(1..=12).contains(&month) {
        return Err(RenewalError::InvalidDateFormat {
            input: format!("{:04}-{:02}", year, month),
            reason: format!("month {} is not between 1 and 12", month),
        });
    }
    Ok(year_row(year)?.months[(month - 1) as usize] as u32)
}

/// number of days in a BS year
pub fn days_in_year(year: i32) -> Result<u32> {
    Ok(year_row(year)?.total_days())
}

/// first and last AD dates the converter accepts
pub fn supported_ad_range() -> Result<(NaiveDate, NaiveDate)> {
    let first = BsDate::new(FIRST_BS_YEAR, 1, 1)?.to_ad()?;
    let last_month_len = days_in_month(LAST_BS_YEAR, 12)?;
    let last = BsDate::new(LAST_BS_YEAR, 12, last_month_len)?.to_ad()?;
    Ok((first, last))
}

fn year_row(year: i32) -> Result<&'static BsYear> {
    if !(FIRST_BS_YEAR..=LAST_BS_YEAR).contains(&year) {
        return Err(out_of_range(year.to_string()));
    }
    Ok(&BS_YEARS[(year - FIRST_BS_YEAR) as usize])
}

fn out_of_range(date: String) -> RenewalError {
    RenewalError::DateOutOfRange {
        date,
        min_year: FIRST_BS_YEAR,
        max_year: LAST_BS_YEAR,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ad(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_known_new_years() {
        assert_eq!(to_ad("1975-01-01").unwrap(), ad(1918, 4, 13));
        assert_eq!(to_ad("2000-01-01").unwrap(), ad(1943, 4, 14));
        assert_eq!(to_ad("2080-01-01").unwrap(), ad(2023, 4, 14));
        assert_eq!(to_ad("2081-01-01").unwrap(), ad(2024, 4, 13));
        assert_eq!(to_ad("2082-01-01").unwrap(), ad(2025, 4, 14));
    }

    #[test]
    fn test_to_bs() {
        assert_eq!(to_bs(ad(2023, 4, 14)).unwrap().to_string(), "2080-01-01");
        assert_eq!(to_bs(ad(2024, 4, 12)).unwrap().to_string(), "2080-12-30");
        // last day of Baisakh 2081 (31 days)
        assert_eq!(to_bs(ad(2024, 5, 13)).unwrap().to_string(), "2081-01-31");
        assert_eq!(to_bs(ad(2024, 5, 14)).unwrap().to_string(), "2081-02-01");
    }

    #[test]
    fn test_round_trip_every_day_of_a_year() {
        let mut date = ad(2023, 1, 1);
        while date < ad(2025, 1, 1) {
            let bs = to_bs(date).unwrap();
            assert_eq!(bs.to_ad().unwrap(), date);
            assert_eq!(to_bs(bs.to_ad().unwrap()).unwrap(), bs);
            date = date.succ_opt().unwrap();
        }
    }

    #[test]
    fn test_round_trip_across_whole_table() {
        let (first, last) = supported_ad_range().unwrap();
        let mut date = first;
        while date <= last {
            let bs = to_bs(date).unwrap();
            assert_eq!(bs.to_ad().unwrap(), date);
            date = date + chrono::Duration::days(37);
        }
        assert_eq!(to_bs(last).unwrap().to_string(), "2095-12-30");
    }

    #[test]
    fn test_bs_dates_round_trip_through_ad() {
        for year in [FIRST_BS_YEAR, 2000, 2050, 2081, LAST_BS_YEAR] {
            for month in 1..=12 {
                let len = days_in_month(year, month).unwrap();
                for day in [1, len] {
                    let bs = BsDate::new(year, month, day).unwrap();
                    assert_eq!(to_bs(bs.to_ad().unwrap()).unwrap(), bs);
                }
            }
        }
    }

    #[test]
    fn test_out_of_range() {
        assert!(matches!(to_ad("1974-12-30"), Err(RenewalError::DateOutOfRange { .. })));
        assert!(matches!(to_ad("2096-01-01"), Err(RenewalError::DateOutOfRange { .. })));
        assert!(matches!(to_bs(ad(1918, 4, 12)), Err(RenewalError::DateOutOfRange { .. })));
        assert!(matches!(to_bs(ad(2040, 1, 1)), Err(RenewalError::DateOutOfRange { .. })));
    }

    #[test]
    fn test_invalid_format() {
        for input in ["2080/01/01", "80-01-01", "2080-1-01", "2080-01-01-01", "abcd-ef-gh", ""] {
            assert!(
                matches!(to_ad(input), Err(RenewalError::InvalidDateFormat { .. })),
                "{input}"
            );
        }
        // Baisakh 2080 has 31 days
        assert!(matches!(to_ad("2080-01-32"), Err(RenewalError::InvalidDateFormat { .. })));
        assert!(matches!(to_ad("2080-13-01"), Err(RenewalError::InvalidDateFormat { .. })));
        assert!(matches!(to_ad("2080-01-00"), Err(RenewalError::InvalidDateFormat { .. })));
    }

    #[test]
    fn test_serde_as_string() {
        let date = BsDate::parse("2081-04-15").unwrap();
        let json = serde_json::to_string(&date).unwrap();
        assert_eq!(json, "\"2081-04-15\"");
        let back: BsDate = serde_json::from_str(&json).unwrap();
        assert_eq!(back, date);
        assert!(serde_json::from_str::<BsDate>("\"2081-04-40\"").is_err());
    }

    #[test]
    fn test_year_lengths() {
        assert_eq!(days_in_year(2080).unwrap(), 365);
        assert_eq!(days_in_year(2081).unwrap(), 366);
        assert_eq!(days_in_month(2081, 1).unwrap(), 31);
        assert!(days_in_month(2081, 0).is_err());
    }
}
