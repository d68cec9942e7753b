use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    config::validate_months,
    cpf::{CpfBreakdown, CpfCalculator},
    domain::{FinancialItem, ItemKind, MonthPhase, YearMonth},
    projection::{contribution_for_month, BalanceProjector, Projection, ProjectionRequest},
    schedule::overrides::{resolve_amount, OverrideSource, ResolutionContext},
    storage::Snapshot,
    utils::money::round_money,
};

use super::{ServiceError, ServiceResult};

const UNCATEGORIZED: &str = "Uncategorized";

/// One item's contribution to a month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedLine {
    pub item_id: Uuid,
    pub name: String,
    pub kind: ItemKind,
    pub amount: Decimal,
    pub employee_cpf: Decimal,
    pub source: OverrideSource,
}

/// Totals behind the dashboard's month cards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthSummary {
    pub month: YearMonth,
    pub phase: MonthPhase,
    pub income_gross: Decimal,
    pub employee_cpf: Decimal,
    pub income_net: Decimal,
    pub expense: Decimal,
    /// Reported alongside the cash figures; not deducted from `net_flow`.
    pub investment_contributions: Decimal,
    pub net_flow: Decimal,
    pub lines: Vec<ResolvedLine>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthComparison {
    pub current: MonthSummary,
    pub previous: MonthSummary,
    pub income_delta: Decimal,
    pub expense_delta: Decimal,
    pub net_flow_delta: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryTotal {
    pub category: String,
    pub kind: ItemKind,
    pub amount: Decimal,
    pub items: usize,
}

pub struct SummaryService;

impl SummaryService {
    pub fn month_summary(
        snapshot: &Snapshot,
        month: YearMonth,
        ctx: &ResolutionContext<'_>,
    ) -> MonthSummary {
        let mut lines = Vec::new();
        let mut income_gross = Decimal::ZERO;
        let mut employee_cpf = Decimal::ZERO;
        let mut expense = Decimal::ZERO;

        for item in snapshot.incomes.iter().chain(&snapshot.expenses) {
            let resolved = resolve_amount(item, month, ctx);
            if !resolved.applies() {
                continue;
            }
            if item.kind == ItemKind::Income {
                income_gross = income_gross.saturating_add(resolved.amount);
                employee_cpf = employee_cpf.saturating_add(resolved.employee_cpf);
            } else {
                expense = expense.saturating_add(resolved.amount);
            }
            lines.push(ResolvedLine {
                item_id: item.id,
                name: item.name.clone(),
                kind: item.kind,
                amount: round_money(resolved.amount),
                employee_cpf: round_money(resolved.employee_cpf),
                source: resolved.used_override,
            });
        }

        let investment_contributions: Decimal = snapshot
            .investments
            .iter()
            .map(|item| contribution_for_month(item, month))
            .fold(Decimal::ZERO, Decimal::saturating_add);

        let income_gross = round_money(income_gross);
        let employee_cpf = round_money(employee_cpf);
        let income_net = income_gross.saturating_sub(employee_cpf);
        let expense = round_money(expense);
        MonthSummary {
            month,
            phase: month.phase(ctx.today),
            income_gross,
            employee_cpf,
            income_net,
            expense,
            investment_contributions: round_money(investment_contributions),
            net_flow: income_net.saturating_sub(expense),
            lines,
        }
    }

    /// The current month next to the one before it. Both resolve independently
    /// against the same context.
    pub fn previous_month_comparison(
        snapshot: &Snapshot,
        ctx: &ResolutionContext<'_>,
    ) -> MonthComparison {
        Self::compare_with_previous(snapshot, YearMonth::from_date(ctx.today), ctx)
    }

    pub fn compare_with_previous(
        snapshot: &Snapshot,
        month: YearMonth,
        ctx: &ResolutionContext<'_>,
    ) -> MonthComparison {
        let current = Self::month_summary(snapshot, month, ctx);
        let previous = Self::month_summary(snapshot, month.pred(), ctx);
        MonthComparison {
            income_delta: current.income_net.saturating_sub(previous.income_net),
            expense_delta: current.expense.saturating_sub(previous.expense),
            net_flow_delta: current.net_flow.saturating_sub(previous.net_flow),
            current,
            previous,
        }
    }

    /// Resolved amounts grouped by kind and category label, largest first.
    pub fn category_totals(
        items: &[FinancialItem],
        month: YearMonth,
        ctx: &ResolutionContext<'_>,
    ) -> Vec<CategoryTotal> {
        let mut grouped: BTreeMap<(ItemKind, String), (Decimal, usize)> = BTreeMap::new();
        for item in items {
            let resolved = resolve_amount(item, month, ctx);
            if !resolved.applies() {
                continue;
            }
            let label = item
                .category
                .clone()
                .unwrap_or_else(|| UNCATEGORIZED.to_string());
            let entry = grouped.entry((item.kind, label)).or_default();
            entry.0 = entry.0.saturating_add(resolved.amount);
            entry.1 += 1;
        }

        let mut totals: Vec<CategoryTotal> = grouped
            .into_iter()
            .map(|((kind, category), (amount, items))| CategoryTotal {
                category,
                kind,
                amount: round_money(amount),
                items,
            })
            .collect();
        totals.sort_by(|a, b| {
            b.amount
                .cmp(&a.amount)
                .then_with(|| a.category.cmp(&b.category))
        });
        totals
    }

    pub fn project(
        snapshot: &Snapshot,
        request: &ProjectionRequest,
        ctx: &ResolutionContext<'_>,
    ) -> ServiceResult<Projection> {
        validate_months(request.months)?;
        let investments = request
            .include_investments
            .then_some(snapshot.investments.as_slice());
        Ok(BalanceProjector::new(*ctx).project(
            &snapshot.incomes,
            &snapshot.expenses,
            investments,
            request,
        ))
    }

    pub fn cpf_breakdown(
        calculator: &CpfCalculator,
        wage: Decimal,
        age: u32,
    ) -> ServiceResult<CpfBreakdown> {
        if age == 0 {
            return Err(ServiceError::Invalid("age must be at least 1".into()));
        }
        calculator.compute(wage, age).map_err(ServiceError::from)
    }
}
