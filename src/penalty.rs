use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::errors::{RenewalError, Result};

/// days after expiry during which no penalty accrues
pub const GRACE_PERIOD_DAYS: u32 = 90;

/// where "today" sits relative to the fiscal year the expiry fell in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FiscalPosition {
    WithinExpiryFiscalYear,
    AfterExpiryFiscalYear,
}

/// which fiscal positions a tier applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum TierScope {
    #[default]
    Any,
    WithinExpiryFiscalYear,
    AfterExpiryFiscalYear,
}

impl TierScope {
    pub fn admits(&self, position: FiscalPosition) -> bool {
        match self {
            TierScope::Any => true,
            TierScope::WithinExpiryFiscalYear => position == FiscalPosition::WithinExpiryFiscalYear,
            TierScope::AfterExpiryFiscalYear => position == FiscalPosition::AfterExpiryFiscalYear,
        }
    }
}

/// progressive penalty tier, counted in days past the grace period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PenaltyTier {
    pub duration_label: String,
    /// inclusive lower bound
    pub days_from: u32,
    /// inclusive upper bound, `None` is unbounded
    pub days_to: Option<u32>,
    pub tax_penalty_percent: Decimal,
    pub renewal_fee_penalty_percent: Decimal,
    #[serde(default)]
    pub scope: TierScope,
    pub is_active: bool,
}

impl PenaltyTier {
    pub fn new(
        label: &str,
        days_from: u32,
        days_to: Option<u32>,
        tax_penalty_percent: Decimal,
        renewal_fee_penalty_percent: Decimal,
    ) -> Self {
        Self {
            duration_label: label.to_string(),
            days_from,
            days_to,
            tax_penalty_percent,
            renewal_fee_penalty_percent,
            scope: TierScope::Any,
            is_active: true,
        }
    }

    pub fn scoped(mut self, scope: TierScope) -> Self {
        self.scope = scope;
        self
    }

    pub fn matches(&self, overdue_days: u32, position: FiscalPosition) -> bool {
        self.is_active
            && self.days_from <= overdue_days
            && self.days_to.map_or(true, |to| to >= overdue_days)
            && self.scope.admits(position)
    }

    pub fn percentages(&self) -> PenaltyPercentages {
        PenaltyPercentages {
            tax_penalty_percent: self.tax_penalty_percent,
            renewal_fee_penalty_percent: self.renewal_fee_penalty_percent,
        }
    }
}

/// penalty percentages applied to tax and renewal fee
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct PenaltyPercentages {
    pub tax_penalty_percent: Decimal,
    pub renewal_fee_penalty_percent: Decimal,
}

impl PenaltyPercentages {
    pub const NONE: PenaltyPercentages = PenaltyPercentages {
        tax_penalty_percent: Decimal::ZERO,
        renewal_fee_penalty_percent: Decimal::ZERO,
    };
}

/// outcome of a tier lookup
#[derive(Debug, Clone, PartialEq)]
pub enum TierResolution<'a> {
    /// still inside the grace period
    NotOverdue,
    Matched(&'a PenaltyTier),
    /// overdue but no active tier covers the day count; charged at 0%
    Gap { overdue_days: u32 },
}

impl<'a> TierResolution<'a> {
    pub fn percentages(&self) -> PenaltyPercentages {
        match self {
            TierResolution::Matched(tier) => tier.percentages(),
            TierResolution::NotOverdue | TierResolution::Gap { .. } => PenaltyPercentages::NONE,
        }
    }

    pub fn tier_label(&self) -> Option<&'a str> {
        match self {
            TierResolution::Matched(tier) => Some(tier.duration_label.as_str()),
            _ => None,
        }
    }

    pub fn is_gap(&self) -> bool {
        matches!(self, TierResolution::Gap { .. })
    }
}

/// resolves overdue days to the most specific active tier
#[derive(Debug, Clone, Copy)]
pub struct PenaltyTierResolver<'a> {
    tiers: &'a [PenaltyTier],
}

impl<'a> PenaltyTierResolver<'a> {
    pub fn new(tiers: &'a [PenaltyTier]) -> Self {
        Self { tiers }
    }

    /// the matching tier with the greatest `days_from` wins
    pub fn resolve(&self, overdue_days: u32, position: FiscalPosition) -> TierResolution<'a> {
        if overdue_days == 0 {
            return TierResolution::NotOverdue;
        }

        match self
            .tiers
            .iter()
            .filter(|tier| tier.matches(overdue_days, position))
            .max_by_key(|tier| tier.days_from)
        {
            Some(tier) => TierResolution::Matched(tier),
            None => {
                log::warn!(
                    "no active penalty tier covers {} overdue days ({:?}); charging 0%",
                    overdue_days,
                    position
                );
                TierResolution::Gap { overdue_days }
            }
        }
    }
}

/// days past expiry beyond the grace period, never negative
pub fn overdue_days_after_grace(today: NaiveDate, expiry: NaiveDate, grace_period_days: u32) -> u32 {
    let elapsed = (today - expiry).num_days() - grace_period_days as i64;
    elapsed.max(0) as u32
}

/// the documented ladder: 5% to day 30, 10% to day 45, then 20% within the
/// expiry fiscal year or 32% after it; the renewal fee penalty is always 100%
pub fn standard_ladder() -> Vec<PenaltyTier> {
    vec![
        PenaltyTier::new("Up to 30 days", 1, Some(30), dec!(5), dec!(100)),
        PenaltyTier::new("31 to 45 days", 31, Some(45), dec!(10), dec!(100)),
        PenaltyTier::new("Beyond 45 days, same fiscal year", 46, None, dec!(20), dec!(100))
            .scoped(TierScope::WithinExpiryFiscalYear),
        PenaltyTier::new("Beyond the fiscal year", 46, None, dec!(32), dec!(100))
            .scoped(TierScope::AfterExpiryFiscalYear),
    ]
}

/// check tier bounds are well-formed
pub fn validate_tiers(tiers: &[PenaltyTier]) -> Result<()> {
    for tier in tiers {
        if let Some(to) = tier.days_to {
            if to < tier.days_from {
                return Err(RenewalError::InvalidConfiguration {
                    message: format!(
                        "penalty tier {:?} ends at day {} before it starts at day {}",
                        tier.duration_label, to, tier.days_from
                    ),
                });
            }
        }
        if tier.tax_penalty_percent.is_sign_negative()
            || tier.renewal_fee_penalty_percent.is_sign_negative()
        {
            return Err(RenewalError::InvalidConfiguration {
                message: format!("penalty tier {:?} has a negative percentage", tier.duration_label),
            });
        }
    }
    Ok(())
}
