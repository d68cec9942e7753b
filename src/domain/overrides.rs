//! Recorded actuals and planned changes that take precedence over an income's base amount.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::month::YearMonth;

/// Granularity of a recorded historical amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Monthly,
    Yearly,
}

/// The period a historical entry covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "granularity", content = "period", rename_all = "lowercase")]
pub enum IncomePeriod {
    #[serde(rename = "monthly")]
    Month(YearMonth),
    #[serde(rename = "yearly")]
    Year(i32),
}

impl IncomePeriod {
    /// Parses the stored `(period, granularity)` pair. Monthly periods are `YYYY-MM`,
    /// yearly periods are `YYYY`; a yearly entry stored as `YYYY-MM` keeps its year.
    pub fn parse(period: &str, granularity: Granularity) -> Option<IncomePeriod> {
        let period = period.trim();
        match granularity {
            Granularity::Monthly => period.parse().ok().map(IncomePeriod::Month),
            Granularity::Yearly => {
                let year = period.split('-').next()?;
                if year.len() != 4 {
                    return None;
                }
                year.parse().ok().map(IncomePeriod::Year)
            }
        }
    }
}

/// One recorded actual from an income's past history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PastIncomeEntry {
    pub period: IncomePeriod,
    pub amount: Decimal,
}

impl PastIncomeEntry {
    pub fn monthly(month: YearMonth, amount: Decimal) -> Self {
        Self {
            period: IncomePeriod::Month(month),
            amount,
        }
    }

    pub fn yearly(year: i32, amount: Decimal) -> Self {
        Self {
            period: IncomePeriod::Year(year),
            amount,
        }
    }
}

/// A known upcoming change to an income, effective from `target_month` onwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FutureMilestone {
    pub target_month: YearMonth,
    pub amount: Decimal,
}

impl FutureMilestone {
    pub fn new(target_month: YearMonth, amount: Decimal) -> Self {
        Self {
            target_month,
            amount,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_period_for_each_granularity() {
        assert_eq!(
            IncomePeriod::parse("2024-03", Granularity::Monthly),
            Some(IncomePeriod::Month(YearMonth::new(2024, 3).unwrap()))
        );
        assert_eq!(
            IncomePeriod::parse("2023", Granularity::Yearly),
            Some(IncomePeriod::Year(2023))
        );
        assert_eq!(
            IncomePeriod::parse("2023-06", Granularity::Yearly),
            Some(IncomePeriod::Year(2023))
        );
        assert_eq!(IncomePeriod::parse("2023", Granularity::Monthly), None);
        assert_eq!(IncomePeriod::parse("23", Granularity::Yearly), None);
    }
}
