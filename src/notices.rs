use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::errors::RateKind;
use crate::rates::LookupStep;
use crate::types::FiscalYearId;

/// operator-visible anomalies noticed while calculating
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Notice {
    /// overdue days with no active penalty tier; charged at 0%
    PenaltyTierGap {
        fiscal_year_id: FiscalYearId,
        overdue_days: u32,
    },
    /// no owed year matched a fiscal year, a single estimated year was used
    DegradedExpansion {
        fallback_fiscal_year_id: FiscalYearId,
        days_delayed: u32,
    },
    /// an overdue cycle's expiry fell outside every configured fiscal year and
    /// was left off the bill
    CycleWithoutFiscalYear {
        expiry_date: NaiveDate,
        days_overdue_after_grace: u32,
    },
    /// overdue cycles beyond the cap that were not charged
    AmnestyCapApplied {
        charged_years: u32,
        uncharged_years: u32,
    },
    /// a rate came from a relaxed lookup step
    RateFallback {
        kind: RateKind,
        step: LookupStep,
        requested_fiscal_year_id: FiscalYearId,
        requested_capacity: u32,
        matched_fiscal_year_id: FiscalYearId,
        matched_capacity: u32,
    },
    /// the cached expiry disagreed with the BS-derived one
    CachedExpiryDiscarded {
        cached: NaiveDate,
        derived: NaiveDate,
    },
}

impl Notice {
    /// whether an operator has to act on this notice
    pub fn needs_attention(&self) -> bool {
        matches!(
            self,
            Notice::PenaltyTierGap { .. }
                | Notice::DegradedExpansion { .. }
                | Notice::CycleWithoutFiscalYear { .. }
        )
    }
}

/// append-only store of notices for one calculation
#[derive(Debug, Default)]
pub struct NoticeLog {
    notices: Vec<Notice>,
}

impl NoticeLog {
    pub fn new() -> Self {
        Self {
            notices: Vec::new(),
        }
    }

    pub fn emit(&mut self, notice: Notice) {
        if notice.needs_attention() {
            log::warn!("{:?}", notice);
        } else {
            log::info!("{:?}", notice);
        }
        self.notices.push(notice);
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emit_and_take() {
        let mut log = NoticeLog::new();
        log.emit(Notice::AmnestyCapApplied {
            charged_years: 4,
            uncharged_years: 6,
        });
        log.emit(Notice::PenaltyTierGap {
            fiscal_year_id: 2,
            overdue_days: 31,
        });

        assert_eq!(log.notices().len(), 2);
        assert!(!log.notices()[0].needs_attention());
        assert!(log.notices()[1].needs_attention());

        let taken = log.take_notices();
        assert_eq!(taken.len(), 2);
        assert!(log.notices().is_empty());
    }
}
