//! Multi-month balance projection.
//!
//! Frame 0 anchors the chart at the starting balance with no flows. Every later frame
//! resolves each income and expense through the override layer, adds the month's net
//! flow to the running balance, and records one-off and custom-month events for
//! annotation. Investments compound in a separate series that never feeds the cash
//! balance.

pub mod chart;
pub mod investments;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{
    domain::{FinancialItem, Frequency, YearMonth},
    schedule::{
        overrides::{resolve_amount, ResolutionContext, ResolvedAmount},
        time::Clock,
    },
    utils::money::round_money,
};

pub use chart::{ChartMode, ChartPoint};
pub use investments::{contribution_for_month, InvestmentSimulator};

/// Whether CPF-subject incomes count gross or net of the employee contribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IncomeBasis {
    Gross,
    #[default]
    NetOfCpf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionRequest {
    /// Number of months projected after the anchor.
    pub months: u32,
    pub starting_balance: Decimal,
    /// Anchor month; defaults to the month containing the context's `today`.
    #[serde(default)]
    pub start: Option<YearMonth>,
    #[serde(default = "ProjectionRequest::default_include_investments")]
    pub include_investments: bool,
    #[serde(default)]
    pub income_basis: IncomeBasis,
}

impl ProjectionRequest {
    pub fn new(months: u32, starting_balance: Decimal) -> Self {
        Self {
            months,
            starting_balance,
            start: None,
            include_investments: Self::default_include_investments(),
            income_basis: IncomeBasis::default(),
        }
    }

    pub fn starting_at(mut self, start: YearMonth) -> Self {
        self.start = Some(start);
        self
    }

    pub fn with_investments(mut self, include: bool) -> Self {
        self.include_investments = include;
        self
    }

    pub fn with_income_basis(mut self, basis: IncomeBasis) -> Self {
        self.income_basis = basis;
        self
    }

    fn default_include_investments() -> bool {
        true
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SpecialItemKind {
    OneOffIncome,
    OneOffExpense,
    CustomExpense,
}

/// A one-off or custom-month event that landed in a frame. Already included in the
/// frame's sums; carried for chart annotation only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecialItem {
    #[serde(rename = "type")]
    pub kind: SpecialItemKind,
    pub amount: Decimal,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyBalanceFrame {
    pub month: YearMonth,
    pub label: String,
    pub income: Decimal,
    pub expense: Decimal,
    pub monthly_balance: Decimal,
    pub cumulative_balance: Decimal,
    pub special_items: Vec<SpecialItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub investment_value: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub balance_with_investments: Option<Decimal>,
}

impl MonthlyBalanceFrame {
    fn anchor(month: YearMonth, balance: Decimal, investment_value: Option<Decimal>) -> Self {
        Self {
            month,
            label: month.label(),
            income: Decimal::ZERO,
            expense: Decimal::ZERO,
            monthly_balance: Decimal::ZERO,
            cumulative_balance: balance,
            special_items: Vec::new(),
            investment_value,
            balance_with_investments: investment_value
                .map(|value| balance.saturating_add(value)),
        }
    }
}

/// Income and expense totals over a projection horizon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionTotals {
    pub income: Decimal,
    pub expense: Decimal,
    pub net: Decimal,
}

/// The computed frame series; chart views derive from it without recomputation.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Projection {
    pub frames: Vec<MonthlyBalanceFrame>,
}

impl Projection {
    pub fn chart(&self, mode: ChartMode) -> Vec<ChartPoint> {
        self.frames
            .iter()
            .map(|frame| ChartPoint::from_frame(frame, mode))
            .collect()
    }

    pub fn final_balance(&self) -> Option<Decimal> {
        self.frames.last().map(|frame| frame.cumulative_balance)
    }

    /// Frame with the smallest running balance; the earliest wins ties.
    pub fn lowest_point(&self) -> Option<&MonthlyBalanceFrame> {
        self.frames.iter().fold(None, |lowest, frame| match lowest {
            Some(current) if current.cumulative_balance <= frame.cumulative_balance => {
                Some(current)
            }
            _ => Some(frame),
        })
    }

    pub fn totals(&self) -> ProjectionTotals {
        let (income, expense) = self
            .frames
            .iter()
            .fold((Decimal::ZERO, Decimal::ZERO), |(income, expense), frame| {
                (
                    income.saturating_add(frame.income),
                    expense.saturating_add(frame.expense),
                )
            });
        ProjectionTotals {
            income,
            expense,
            net: income.saturating_sub(expense),
        }
    }

    /// Every annotated event paired with the month it landed in.
    pub fn special_items(&self) -> impl Iterator<Item = (YearMonth, &SpecialItem)> {
        self.frames
            .iter()
            .flat_map(|frame| frame.special_items.iter().map(move |item| (frame.month, item)))
    }
}

/// Runs projections against a fixed resolution context.
#[derive(Debug, Clone, Copy)]
pub struct BalanceProjector<'a> {
    ctx: ResolutionContext<'a>,
}

impl BalanceProjector<'static> {
    pub fn from_clock(clock: &dyn Clock) -> Self {
        Self::new(ResolutionContext::from_clock(clock))
    }
}

impl<'a> BalanceProjector<'a> {
    pub fn new(ctx: ResolutionContext<'a>) -> Self {
        Self { ctx }
    }

    /// Projects the balance for `request.months` months after the anchor month.
    pub fn project(
        &self,
        incomes: &[FinancialItem],
        expenses: &[FinancialItem],
        investments: Option<&[FinancialItem]>,
        request: &ProjectionRequest,
    ) -> Projection {
        let start = request
            .start
            .unwrap_or_else(|| YearMonth::from_date(self.ctx.today));
        let mut simulator = investments
            .filter(|_| request.include_investments)
            .map(InvestmentSimulator::new)
            .filter(|simulator| !simulator.is_empty());

        let mut cumulative = round_money(request.starting_balance);
        let mut frames = Vec::with_capacity(request.months as usize + 1);
        frames.push(MonthlyBalanceFrame::anchor(
            start,
            cumulative,
            simulator.as_ref().map(InvestmentSimulator::total),
        ));

        for offset in 1..=request.months {
            let month = start.offset(offset as i32);
            let mut special_items = Vec::new();

            let mut income = Decimal::ZERO;
            for item in incomes {
                let resolved = resolve_amount(item, month, &self.ctx);
                if !resolved.applies() {
                    continue;
                }
                let amount = match request.income_basis {
                    IncomeBasis::Gross => resolved.amount,
                    IncomeBasis::NetOfCpf => resolved.net_amount(),
                };
                if !accumulate(&mut income, amount, item, month) {
                    continue;
                }
                if let Some(kind) = special_kind(&resolved, Flow::Income) {
                    special_items.push(SpecialItem {
                        kind,
                        amount: round_money(resolved.amount),
                        name: item.name.clone(),
                    });
                }
            }

            let mut expense = Decimal::ZERO;
            for item in expenses {
                let resolved = resolve_amount(item, month, &self.ctx);
                if !resolved.applies() {
                    continue;
                }
                if !accumulate(&mut expense, resolved.amount, item, month) {
                    continue;
                }
                if let Some(kind) = special_kind(&resolved, Flow::Expense) {
                    special_items.push(SpecialItem {
                        kind,
                        amount: round_money(resolved.amount),
                        name: item.name.clone(),
                    });
                }
            }

            let income = round_money(income);
            let expense = round_money(expense);
            let monthly_balance = income.saturating_sub(expense);
            cumulative = cumulative.saturating_add(monthly_balance);

            let investment_value = simulator.as_mut().map(|sim| sim.advance(month));
            frames.push(MonthlyBalanceFrame {
                month,
                label: month.label(),
                income,
                expense,
                monthly_balance,
                cumulative_balance: cumulative,
                special_items,
                investment_value,
                balance_with_investments: investment_value
                    .map(|value| cumulative.saturating_add(value)),
            });
        }

        tracing::debug!(
            start = %start,
            months = request.months,
            incomes = incomes.len(),
            expenses = expenses.len(),
            final_balance = %cumulative,
            "balance projection complete"
        );
        Projection { frames }
    }
}

/// Projects with the built-in CPF table and the given `today`.
pub fn project(
    incomes: &[FinancialItem],
    expenses: &[FinancialItem],
    investments: Option<&[FinancialItem]>,
    request: &ProjectionRequest,
    today: chrono::NaiveDate,
) -> Projection {
    BalanceProjector::new(ResolutionContext::new(today)).project(
        incomes,
        expenses,
        investments,
        request,
    )
}

// Adds one item's amount to a month total; an amount that would overflow the total is
// left out and logged.
fn accumulate(
    total: &mut Decimal,
    amount: Decimal,
    item: &FinancialItem,
    month: YearMonth,
) -> bool {
    match total.checked_add(amount) {
        Some(sum) => {
            *total = sum;
            true
        }
        None => {
            tracing::warn!(
                item = %item.id,
                name = %item.name,
                %month,
                %amount,
                "amount overflows month total; item skipped"
            );
            false
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Flow {
    Income,
    Expense,
}

fn special_kind(resolved: &ResolvedAmount, flow: Flow) -> Option<SpecialItemKind> {
    match (resolved.frequency_path?, flow) {
        (Frequency::OneTime, Flow::Income) => Some(SpecialItemKind::OneOffIncome),
        (Frequency::OneTime, Flow::Expense) => Some(SpecialItemKind::OneOffExpense),
        (Frequency::Custom, Flow::Expense) => Some(SpecialItemKind::CustomExpense),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::CustomMonths;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 15).unwrap()
    }

    fn ym(year: i32, month: u32) -> YearMonth {
        YearMonth::new(year, month).unwrap()
    }

    #[test]
    fn anchor_frame_holds_starting_balance() {
        let incomes = vec![FinancialItem::income("Salary", dec!(4000), Frequency::Monthly)];
        let projection = project(
            &incomes,
            &[],
            None,
            &ProjectionRequest::new(12, dec!(1000)),
            today(),
        );
        assert_eq!(projection.frames.len(), 13);
        let anchor = &projection.frames[0];
        assert_eq!(anchor.month, ym(2025, 1));
        assert_eq!(anchor.cumulative_balance, dec!(1000));
        assert_eq!(anchor.income, dec!(0));
        assert_eq!(anchor.expense, dec!(0));
        assert!(anchor.special_items.is_empty());
        assert_eq!(projection.frames[1].month, ym(2025, 2));
    }

    #[test]
    fn running_balance_accumulates_monthly_net() {
        let incomes = vec![FinancialItem::income("Salary", dec!(4000), Frequency::Monthly)];
        let expenses = vec![
            FinancialItem::expense("Rent", dec!(1500), Frequency::Monthly),
            FinancialItem::expense("Insurance", dec!(1200), Frequency::Yearly),
        ];
        let projection = project(
            &incomes,
            &expenses,
            None,
            &ProjectionRequest::new(3, dec!(0)),
            today(),
        );
        let balances: Vec<Decimal> = projection
            .frames
            .iter()
            .map(|frame| frame.cumulative_balance)
            .collect();
        assert_eq!(balances, vec![dec!(0), dec!(2400), dec!(4800), dec!(7200)]);
        assert_eq!(projection.frames[1].expense, dec!(1600));
        assert_eq!(projection.final_balance(), Some(dec!(7200)));
    }

    #[test]
    fn special_items_are_annotated_but_summed_normally() {
        let expenses = vec![
            FinancialItem::expense("Holiday", dec!(3000), Frequency::OneTime)
                .with_start_date(NaiveDate::from_ymd_opt(2025, 3, 5).unwrap()),
            FinancialItem::expense("Road tax", dec!(700), Frequency::Custom)
                .with_custom_months(CustomMonths::from_values([3])),
        ];
        let incomes = vec![FinancialItem::income("Bonus", dec!(5000), Frequency::OneTime)
            .with_start_date(NaiveDate::from_ymd_opt(2025, 3, 1).unwrap())];
        let projection = project(
            &incomes,
            &expenses,
            None,
            &ProjectionRequest::new(3, dec!(0)),
            today(),
        );
        let march = &projection.frames[2];
        assert_eq!(march.month, ym(2025, 3));
        assert_eq!(march.income, dec!(5000));
        assert_eq!(march.expense, dec!(3700));
        let kinds: Vec<SpecialItemKind> =
            march.special_items.iter().map(|item| item.kind).collect();
        assert_eq!(
            kinds,
            vec![
                SpecialItemKind::OneOffIncome,
                SpecialItemKind::OneOffExpense,
                SpecialItemKind::CustomExpense
            ]
        );
        assert!(projection.frames[1].special_items.is_empty());
        assert_eq!(projection.special_items().count(), 3);
    }

    #[test]
    fn cpf_is_deducted_unless_gross_requested() {
        let incomes = vec![
            FinancialItem::income("Salary", dec!(5000), Frequency::Monthly).with_cpf(dec!(1000)),
        ];
        let net = project(&incomes, &[], None, &ProjectionRequest::new(1, dec!(0)), today());
        assert_eq!(net.frames[1].income, dec!(4000));

        let request = ProjectionRequest::new(1, dec!(0)).with_income_basis(IncomeBasis::Gross);
        let gross = project(&incomes, &[], None, &request, today());
        assert_eq!(gross.frames[1].income, dec!(5000));
    }

    #[test]
    fn investments_run_in_a_parallel_series() {
        let investments = vec![FinancialItem::investment(
            "Fund",
            dec!(10000),
            dec!(12),
            dec!(0),
            Frequency::Monthly,
        )];
        let expenses = vec![FinancialItem::expense("Rent", dec!(100), Frequency::Monthly)];
        let request = ProjectionRequest::new(2, dec!(500));
        let projection = project(&[], &expenses, Some(&investments), &request, today());

        assert_eq!(projection.frames[0].investment_value, Some(dec!(10000)));
        assert_eq!(projection.frames[0].balance_with_investments, Some(dec!(10500)));
        assert_eq!(projection.frames[1].cumulative_balance, dec!(400));
        assert_eq!(projection.frames[1].investment_value, Some(dec!(10100)));
        assert_eq!(projection.frames[1].balance_with_investments, Some(dec!(10500)));

        let without = project(
            &[],
            &expenses,
            Some(&investments),
            &request.clone().with_investments(false),
            today(),
        );
        assert!(without.frames.iter().all(|frame| frame.investment_value.is_none()));
        assert_eq!(without.frames[1].cumulative_balance, dec!(400));
    }

    #[test]
    fn chart_modes_derive_from_the_same_frames() {
        let incomes = vec![FinancialItem::income("Salary", dec!(3000), Frequency::Monthly)];
        let expenses = vec![FinancialItem::expense("Rent", dec!(1000), Frequency::Monthly)];
        let projection = project(
            &incomes,
            &expenses,
            None,
            &ProjectionRequest::new(2, dec!(100)),
            today(),
        );
        let cumulative = projection.chart(ChartMode::Cumulative);
        let flow = projection.chart(ChartMode::NonCumulative);
        assert_eq!(cumulative.len(), flow.len());
        match &cumulative[2] {
            ChartPoint::Cumulative { balance, .. } => assert_eq!(*balance, dec!(4100)),
            other => panic!("unexpected point {other:?}"),
        }
        match &flow[2] {
            ChartPoint::NonCumulative {
                income,
                expense,
                net,
                ..
            } => {
                assert_eq!(*income, dec!(3000));
                assert_eq!(*expense, dec!(1000));
                assert_eq!(*net, dec!(2000));
            }
            other => panic!("unexpected point {other:?}"),
        }
    }

    #[test]
    fn lowest_point_and_totals_summarise_the_horizon() {
        let expenses = vec![FinancialItem::expense("Renovation", dec!(5000), Frequency::OneTime)
            .with_start_date(NaiveDate::from_ymd_opt(2025, 2, 1).unwrap())];
        let incomes = vec![FinancialItem::income("Salary", dec!(2000), Frequency::Monthly)];
        let projection = project(
            &incomes,
            &expenses,
            None,
            &ProjectionRequest::new(4, dec!(1000)),
            today(),
        );
        let lowest = projection.lowest_point().expect("frames");
        assert_eq!(lowest.month, ym(2025, 2));
        assert_eq!(lowest.cumulative_balance, dec!(-2000));
        let totals = projection.totals();
        assert_eq!(totals.income, dec!(8000));
        assert_eq!(totals.expense, dec!(5000));
        assert_eq!(totals.net, dec!(3000));
    }

    #[test]
    fn oversized_amounts_never_panic() {
        let incomes = vec![FinancialItem::income("Windfall", Decimal::MAX, Frequency::Monthly)];
        let expenses = vec![
            FinancialItem::expense("Rent", dec!(1500), Frequency::Monthly),
            FinancialItem::expense("Corrupt", Decimal::MAX, Frequency::Weekly),
            FinancialItem::expense("Also corrupt", Decimal::MAX, Frequency::Monthly),
        ];
        let projection = project(
            &incomes,
            &expenses,
            None,
            &ProjectionRequest::new(3, dec!(0)),
            today(),
        );

        assert_eq!(projection.frames.len(), 4);
        for frame in &projection.frames[1..] {
            assert_eq!(frame.expense, dec!(1500));
        }
        assert_eq!(projection.final_balance(), Some(Decimal::MAX));
        assert_eq!(projection.totals().income, Decimal::MAX);
    }
}
