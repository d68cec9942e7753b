//! Month-by-month compounding of investment holdings, kept apart from the cash balance.

use rust_decimal::Decimal;

use crate::{
    domain::{FinancialItem, InvestmentDetails, YearMonth},
    schedule::frequency::{frequency_matches, is_active_for_month, monthly_equivalent},
    utils::money::{round_balance, round_money},
};

const PERCENT: u32 = 100;
const MONTHS_PER_YEAR: u32 = 12;

#[derive(Debug, Clone)]
struct Holding<'a> {
    item: &'a FinancialItem,
    details: &'a InvestmentDetails,
    monthly_growth: Decimal,
    balance: Decimal,
    /// Set once growth no longer fits in a `Decimal`; the balance stays put from then on.
    frozen: bool,
}

impl Holding<'_> {
    fn advance(&mut self, month: YearMonth) {
        if self.frozen {
            return;
        }
        let next = self
            .balance
            .checked_mul(self.monthly_growth)
            .map(round_balance)
            .and_then(|grown| grown.checked_add(contribution_for(self.item, self.details, month)));
        match next {
            Some(balance) => self.balance = balance,
            None => {
                tracing::warn!(
                    item = %self.item.id,
                    name = %self.item.name,
                    %month,
                    balance = %self.balance,
                    "investment value overflows; holding frozen"
                );
                self.frozen = true;
            }
        }
    }
}

/// Contribution an investment receives in `month`: the monthly equivalent of its
/// contribution amount when the contribution schedule lands, otherwise zero.
pub fn contribution_for_month(item: &FinancialItem, month: YearMonth) -> Decimal {
    item.investment
        .as_ref()
        .map_or(Decimal::ZERO, |details| contribution_for(item, details, month))
}

fn contribution_for(
    item: &FinancialItem,
    details: &InvestmentDetails,
    month: YearMonth,
) -> Decimal {
    let lands = is_active_for_month(item, month)
        && frequency_matches(
            details.contribution_frequency,
            &item.custom_months,
            item.start_date,
            month,
        );
    if !lands {
        return Decimal::ZERO;
    }
    monthly_equivalent(details.contribution_amount, details.contribution_frequency)
        .unwrap_or_else(|| {
            tracing::warn!(item = %item.id, %month, "contribution overflows; skipped");
            Decimal::ZERO
        })
}

/// Simulates every active investment independently and reports their combined value.
#[derive(Debug, Clone)]
pub struct InvestmentSimulator<'a> {
    holdings: Vec<Holding<'a>>,
}

impl<'a> InvestmentSimulator<'a> {
    /// Starts each active investment at its current capital. Items without investment
    /// details or switched off are left out.
    pub fn new(items: &'a [FinancialItem]) -> Self {
        let holdings = items
            .iter()
            .filter(|item| item.is_active && !item.has_blocking_defect())
            .filter_map(|item| {
                let details = item.investment.as_ref()?;
                let monthly_rate = details.projected_yield
                    / Decimal::from(PERCENT)
                    / Decimal::from(MONTHS_PER_YEAR);
                Some(Holding {
                    item,
                    details,
                    monthly_growth: Decimal::ONE + monthly_rate,
                    balance: details.current_capital,
                    frozen: false,
                })
            })
            .collect();
        Self { holdings }
    }

    pub fn is_empty(&self) -> bool {
        self.holdings.is_empty()
    }

    /// Combined value, rounded to cents.
    pub fn total(&self) -> Decimal {
        let sum = self
            .holdings
            .iter()
            .fold(Decimal::ZERO, |sum, holding| sum.saturating_add(holding.balance));
        round_money(sum)
    }

    /// Applies one month of growth then any contribution due in `month`; returns the
    /// new combined value.
    pub fn advance(&mut self, month: YearMonth) -> Decimal {
        for holding in &mut self.holdings {
            holding.advance(month);
        }
        self.total()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CustomMonths, Frequency};
    use rust_decimal_macros::dec;

    fn ym(year: i32, month: u32) -> YearMonth {
        YearMonth::new(year, month).unwrap()
    }

    #[test]
    fn compounds_monthly_then_adds_contribution() {
        let items = vec![FinancialItem::investment(
            "Fund",
            dec!(10000),
            dec!(12),
            dec!(100),
            Frequency::Monthly,
        )];
        let mut simulator = InvestmentSimulator::new(&items);
        assert_eq!(simulator.total(), dec!(10000));
        assert_eq!(simulator.advance(ym(2025, 1)), dec!(10200));
        assert_eq!(simulator.advance(ym(2025, 2)), dec!(10402));
    }

    #[test]
    fn custom_contributions_land_only_in_listed_months() {
        let items = vec![FinancialItem::investment(
            "Bonus top-up",
            dec!(0),
            dec!(0),
            dec!(1000),
            Frequency::Custom,
        )
        .with_custom_months(CustomMonths::from_values([12]))];
        let mut simulator = InvestmentSimulator::new(&items);
        assert_eq!(simulator.advance(ym(2025, 11)), dec!(0));
        assert_eq!(simulator.advance(ym(2025, 12)), dec!(1000));
        assert_eq!(simulator.advance(ym(2026, 1)), dec!(1000));
    }

    #[test]
    fn inactive_investments_are_excluded() {
        let items = vec![
            FinancialItem::investment("Closed", dec!(5000), dec!(5), dec!(0), Frequency::Monthly)
                .with_active(false),
            FinancialItem::expense("Not an investment", dec!(10), Frequency::Monthly),
        ];
        let simulator = InvestmentSimulator::new(&items);
        assert!(simulator.is_empty());
        assert_eq!(simulator.total(), dec!(0));
    }

    #[test]
    fn runaway_growth_freezes_at_the_last_value() {
        let items = vec![FinancialItem::investment(
            "Moonshot",
            dec!(100000),
            dec!(100),
            dec!(0),
            Frequency::Monthly,
        )];
        let mut simulator = InvestmentSimulator::new(&items);
        let mut values = vec![simulator.total()];
        let mut month = ym(2025, 1);
        for _ in 0..1200 {
            month = month.offset(1);
            values.push(simulator.advance(month));
        }

        assert_eq!(values.len(), 1201);
        assert!(values.windows(2).all(|pair| pair[0] <= pair[1]));
        assert!(simulator.holdings[0].frozen);
        assert_eq!(values[1199], values[1200]);
        assert!(values[1200] > dec!(1000000000000000000000000));
    }
}
