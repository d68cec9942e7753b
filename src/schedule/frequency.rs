//! Decides whether an item lands in a month and how its stated amount converts to a
//! monthly figure.
//!
//! `monthly`, `yearly`, `weekly` and `bi-weekly` items land in every month of their
//! active window with a smoothed amount, so a yearly bonus contributes a twelfth of
//! itself to each month. `custom` and `one-time` items land in full, only in their
//! months.

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;

use crate::domain::{CustomMonths, FinancialItem, Frequency, YearMonth};

const MONTHS_PER_YEAR: u32 = 12;
const WEEKS_PER_YEAR: u32 = 52;
const FORTNIGHTS_PER_YEAR: u32 = 26;

/// True when the item is switched on, readable, and its date bounds overlap `month`.
pub fn is_active_for_month(item: &FinancialItem, month: YearMonth) -> bool {
    item.is_active
        && !item.has_blocking_defect()
        && starts_by(item.start_date, month)
        && not_ended_before(item.end_date, month)
}

/// `start ≤ last day of month`; a missing start date never excludes a month.
pub fn starts_by(start_date: Option<NaiveDate>, month: YearMonth) -> bool {
    start_date.map_or(true, |start| start <= month.last_day())
}

/// `end = None` or `end ≥ first day of month`.
pub fn not_ended_before(end_date: Option<NaiveDate>, month: YearMonth) -> bool {
    end_date.map_or(true, |end| end >= month.first_day())
}

/// The frequency rule on its own, ignoring the active window.
pub fn frequency_matches(
    frequency: Frequency,
    custom_months: &CustomMonths,
    start_date: Option<NaiveDate>,
    month: YearMonth,
) -> bool {
    match frequency {
        Frequency::Monthly | Frequency::Yearly | Frequency::Weekly | Frequency::BiWeekly => true,
        Frequency::Custom => custom_months.contains(month.month()),
        Frequency::OneTime => start_date
            .is_some_and(|start| start.year() == month.year() && start.month() == month.month()),
        Frequency::Unrecognized => false,
    }
}

/// Whether `item` contributes anything to `month`.
pub fn resolves_this_month(item: &FinancialItem, month: YearMonth) -> bool {
    if !is_active_for_month(item, month) {
        return false;
    }
    let applies = frequency_matches(item.frequency, &item.custom_months, item.start_date, month);
    if !applies && item.frequency == Frequency::Custom && item.custom_months.is_malformed() {
        tracing::trace!(item = %item.id, %month, "custom months unreadable; item skipped");
    }
    applies
}

/// Converts a stated amount to its per-month contribution. `None` when the
/// conversion does not fit in a `Decimal`.
pub fn monthly_equivalent(amount: Decimal, frequency: Frequency) -> Option<Decimal> {
    let per_year = |times: u32| {
        amount
            .checked_mul(Decimal::from(times))?
            .checked_div(Decimal::from(MONTHS_PER_YEAR))
    };
    match frequency {
        Frequency::Monthly | Frequency::Custom | Frequency::OneTime => Some(amount),
        Frequency::Yearly => amount.checked_div(Decimal::from(MONTHS_PER_YEAR)),
        Frequency::Weekly => per_year(WEEKS_PER_YEAR),
        Frequency::BiWeekly => per_year(FORTNIGHTS_PER_YEAR),
        Frequency::Unrecognized => Some(Decimal::ZERO),
    }
}

/// The item's base amount for `month` before any override: its monthly equivalent
/// when it lands, zero otherwise or when the conversion overflows.
pub fn scheduled_amount(item: &FinancialItem, month: YearMonth) -> Decimal {
    if !resolves_this_month(item, month) {
        return Decimal::ZERO;
    }
    monthly_equivalent(item.amount, item.frequency).unwrap_or_else(|| {
        tracing::warn!(item = %item.id, amount = %item.amount, "monthly amount overflows");
        Decimal::ZERO
    })
}
