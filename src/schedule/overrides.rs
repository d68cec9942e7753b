//! Layers recorded actuals and future milestones over the frequency resolver.
//!
//! Precedence, first match wins:
//! 1. historical month with a monthly history entry for that month (verbatim);
//! 2. historical month with a yearly history entry for that year (amount / 12);
//! 3. future month, `account_for_future_change` set, and a milestone at or before
//!    the month (the most recent one, never smoothed);
//! 4. the item's base amount through the frequency resolver.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{
    cpf::{default_calculator, round_contribution, CpfCalculator},
    domain::{
        FinancialItem, Frequency, FutureMilestone, IncomeDetails, IncomePeriod, MonthPhase,
        PastIncomeEntry, YearMonth,
    },
    schedule::{
        frequency::{frequency_matches, monthly_equivalent, not_ended_before, starts_by},
        time::Clock,
    },
};

/// Which source produced a resolved amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverrideSource {
    #[default]
    None,
    Historical,
    Milestone,
}

/// Inputs shared by every resolution in one calculation.
#[derive(Debug, Clone, Copy)]
pub struct ResolutionContext<'a> {
    pub today: NaiveDate,
    pub cpf: &'a CpfCalculator,
    /// Age of the earner; enables CPF recomputation when an override crosses the ceiling.
    pub age: Option<u32>,
}

impl ResolutionContext<'static> {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            today,
            cpf: default_calculator(),
            age: None,
        }
    }

    pub fn from_clock(clock: &dyn Clock) -> Self {
        Self::new(clock.today())
    }
}

impl<'a> ResolutionContext<'a> {
    pub fn with_cpf<'b>(self, cpf: &'b CpfCalculator) -> ResolutionContext<'b> {
        ResolutionContext {
            today: self.today,
            cpf,
            age: self.age,
        }
    }

    pub fn with_age(mut self, age: Option<u32>) -> Self {
        self.age = age;
        self
    }
}

/// Amount an item contributes to one month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedAmount {
    pub amount: Decimal,
    pub used_override: OverrideSource,
    /// Frequency through which the base amount resolved; `None` when an override was
    /// used or the item does not land this month.
    pub frequency_path: Option<Frequency>,
    /// Employee CPF share of `amount` (zero for non-CPF items).
    pub employee_cpf: Decimal,
}

impl ResolvedAmount {
    pub fn nothing() -> Self {
        Self {
            amount: Decimal::ZERO,
            used_override: OverrideSource::None,
            frequency_path: None,
            employee_cpf: Decimal::ZERO,
        }
    }

    pub fn applies(&self) -> bool {
        self.used_override != OverrideSource::None || self.frequency_path.is_some()
    }

    /// Amount after the employee CPF share.
    pub fn net_amount(&self) -> Decimal {
        self.amount.saturating_sub(self.employee_cpf)
    }
}

/// First monthly entry for `month`, otherwise the first yearly entry for its year
/// spread over twelve months.
pub fn historical_override(history: &[PastIncomeEntry], month: YearMonth) -> Option<Decimal> {
    history
        .iter()
        .find(|entry| entry.period == IncomePeriod::Month(month))
        .map(|entry| entry.amount)
        .or_else(|| {
            history
                .iter()
                .find(|entry| entry.period == IncomePeriod::Year(month.year()))
                .map(|entry| entry.amount / Decimal::from(12))
        })
}

/// The milestone with the latest `target_month` not after `month`. Among entries for
/// the same target month the first listed wins.
pub fn applicable_milestone(
    milestones: &[FutureMilestone],
    month: YearMonth,
) -> Option<&FutureMilestone> {
    milestones
        .iter()
        .filter(|milestone| milestone.target_month <= month)
        .fold(None, |best: Option<&FutureMilestone>, candidate| match best {
            Some(current) if current.target_month >= candidate.target_month => Some(current),
            _ => Some(candidate),
        })
}

/// Resolves the amount `item` contributes to `month`. Never fails: unreadable or
/// inconsistent records resolve to nothing.
pub fn resolve_amount(
    item: &FinancialItem,
    month: YearMonth,
    ctx: &ResolutionContext<'_>,
) -> ResolvedAmount {
    if !item.is_active || item.has_blocking_defect() {
        return ResolvedAmount::nothing();
    }
    let phase = month.phase(ctx.today);
    let income = item.income.as_ref();

    let milestone = income
        .filter(|details| phase == MonthPhase::Future && details.account_for_future_change)
        .and_then(|details| applicable_milestone(&details.future_milestones, month));

    // A milestone continues the income past its end date.
    let in_window = starts_by(item.start_date, month)
        && (milestone.is_some() || not_ended_before(item.end_date, month));
    if !in_window {
        return ResolvedAmount::nothing();
    }

    if phase == MonthPhase::Historical {
        if let Some(amount) =
            income.and_then(|details| historical_override(&details.past_income_history, month))
        {
            tracing::trace!(item = %item.id, %month, %amount, "historical override");
            return overridden(item, income, amount, OverrideSource::Historical, ctx);
        }
    }

    if let Some(milestone) = milestone {
        tracing::trace!(
            item = %item.id,
            %month,
            target = %milestone.target_month,
            "milestone override"
        );
        return overridden(item, income, milestone.amount, OverrideSource::Milestone, ctx);
    }

    if !frequency_matches(item.frequency, &item.custom_months, item.start_date, month) {
        return ResolvedAmount::nothing();
    }
    let Some(amount) = monthly_equivalent(item.amount, item.frequency) else {
        tracing::warn!(
            item = %item.id,
            amount = %item.amount,
            frequency = %item.frequency,
            "monthly amount overflows; item skipped"
        );
        return ResolvedAmount::nothing();
    };
    ResolvedAmount {
        amount,
        used_override: OverrideSource::None,
        frequency_path: Some(item.frequency),
        employee_cpf: base_cpf(item, income, amount, ctx),
    }
}

fn overridden(
    item: &FinancialItem,
    income: Option<&IncomeDetails>,
    amount: Decimal,
    source: OverrideSource,
    ctx: &ResolutionContext<'_>,
) -> ResolvedAmount {
    ResolvedAmount {
        amount,
        used_override: source,
        frequency_path: None,
        employee_cpf: override_cpf(item, income, amount, ctx),
    }
}

fn cpf_subject(income: Option<&IncomeDetails>) -> Option<&IncomeDetails> {
    income.filter(|details| details.subject_to_cpf)
}

// Stored snapshot wins; fall back to the calculator only when nothing was stored.
fn base_cpf(
    item: &FinancialItem,
    income: Option<&IncomeDetails>,
    amount: Decimal,
    ctx: &ResolutionContext<'_>,
) -> Decimal {
    let Some(details) = cpf_subject(income) else {
        return Decimal::ZERO;
    };
    match details.employee_cpf_contribution {
        Some(stored) => stored,
        None => computed_cpf(item, amount, ctx).unwrap_or(Decimal::ZERO),
    }
}

fn override_cpf(
    item: &FinancialItem,
    income: Option<&IncomeDetails>,
    amount: Decimal,
    ctx: &ResolutionContext<'_>,
) -> Decimal {
    let Some(details) = cpf_subject(income) else {
        return Decimal::ZERO;
    };
    let ceiling = ctx.cpf.ceiling();
    let base_wage = monthly_equivalent(item.amount, item.frequency).unwrap_or(Decimal::ZERO);
    let stored = details.employee_cpf_contribution;

    if amount >= ceiling {
        if let Some(contribution) = computed_cpf(item, amount, ctx) {
            return contribution;
        }
        // No age to price with: apply the stored rate to the capped wage.
        let capped_base = base_wage.min(ceiling);
        return match stored {
            Some(stored) if capped_base > Decimal::ZERO => scaled(stored, ceiling, capped_base),
            _ => Decimal::ZERO,
        };
    }

    match stored {
        Some(stored) if base_wage > Decimal::ZERO => scaled(stored, amount, base_wage),
        _ => computed_cpf(item, amount, ctx).unwrap_or(Decimal::ZERO),
    }
}

// `stored * wage / base`, zero when the product does not fit.
fn scaled(stored: Decimal, wage: Decimal, base: Decimal) -> Decimal {
    wage.checked_mul(stored)
        .and_then(|product| product.checked_div(base))
        .map_or(Decimal::ZERO, round_contribution)
}

fn computed_cpf(
    item: &FinancialItem,
    wage: Decimal,
    ctx: &ResolutionContext<'_>,
) -> Option<Decimal> {
    let age = ctx.age?;
    match ctx.cpf.compute(wage, age) {
        Ok(breakdown) => Some(breakdown.employee_contribution),
        Err(err) => {
            tracing::warn!(item = %item.id, %wage, age, error = %err, "CPF recomputation failed");
            None
        }
    }
}
