use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{
    frequency::{CustomMonths, Frequency},
    overrides::{FutureMilestone, PastIncomeEntry},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Income,
    Expense,
    Investment,
}

/// Something the storage boundary could not read from a stored record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "defect", content = "detail", rename_all = "kebab-case")]
pub enum RecordDefect {
    MalformedCustomMonths,
    UnrecognizedFrequency(String),
    MalformedStartDate(String),
    MalformedEndDate(String),
    MalformedIncomeHistory,
    MalformedMilestones,
    /// A numeric field that is not a number, e.g. `"amount": "n/a"`.
    MalformedAmount { field: String, raw: String },
    /// A flag or optional figure of the wrong type; the default is used instead.
    MalformedField(String),
    /// The stored entry was not a record at all.
    UnreadableRecord,
}

impl RecordDefect {
    /// Defects that leave the item without a usable schedule.
    pub fn blocks_schedule(&self) -> bool {
        matches!(
            self,
            RecordDefect::MalformedStartDate(_)
                | RecordDefect::MalformedEndDate(_)
                | RecordDefect::MalformedAmount { .. }
                | RecordDefect::UnreadableRecord
        )
    }
}

/// Income-only attributes.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct IncomeDetails {
    pub subject_to_cpf: bool,
    /// Monthly employee contribution recorded when the income was last saved.
    pub employee_cpf_contribution: Option<Decimal>,
    pub past_income_history: Vec<PastIncomeEntry>,
    pub future_milestones: Vec<FutureMilestone>,
    pub account_for_future_change: bool,
}

/// Investment-only attributes. Contributions in `custom` months use the owning
/// item's `custom_months`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct InvestmentDetails {
    pub current_capital: Decimal,
    /// Annual yield in percent.
    pub projected_yield: Decimal,
    pub contribution_amount: Decimal,
    pub contribution_frequency: Frequency,
}

/// Immutable snapshot of a recurring income, expense, or investment definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialItem {
    pub id: Uuid,
    pub name: String,
    pub category: Option<String>,
    pub kind: ItemKind,
    pub amount: Decimal,
    pub frequency: Frequency,
    pub custom_months: CustomMonths,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub is_active: bool,
    pub income: Option<IncomeDetails>,
    pub investment: Option<InvestmentDetails>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub defects: Vec<RecordDefect>,
}

impl FinancialItem {
    pub fn new(
        name: impl Into<String>,
        kind: ItemKind,
        amount: Decimal,
        frequency: Frequency,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            category: None,
            kind,
            amount,
            frequency,
            custom_months: CustomMonths::Unset,
            start_date: None,
            end_date: None,
            is_active: true,
            income: match kind {
                ItemKind::Income => Some(IncomeDetails::default()),
                _ => None,
            },
            investment: match kind {
                ItemKind::Investment => Some(InvestmentDetails::default()),
                _ => None,
            },
            defects: Vec::new(),
        }
    }

    pub fn income(name: impl Into<String>, amount: Decimal, frequency: Frequency) -> Self {
        Self::new(name, ItemKind::Income, amount, frequency)
    }

    pub fn expense(name: impl Into<String>, amount: Decimal, frequency: Frequency) -> Self {
        Self::new(name, ItemKind::Expense, amount, frequency)
    }

    /// Investment whose contribution follows `contribution_frequency`.
    pub fn investment(
        name: impl Into<String>,
        current_capital: Decimal,
        projected_yield: Decimal,
        contribution_amount: Decimal,
        contribution_frequency: Frequency,
    ) -> Self {
        let mut item = Self::new(
            name,
            ItemKind::Investment,
            contribution_amount,
            contribution_frequency,
        );
        item.investment = Some(InvestmentDetails {
            current_capital,
            projected_yield,
            contribution_amount,
            contribution_frequency,
        });
        item
    }

    pub fn with_id(mut self, id: Uuid) -> Self {
        self.id = id;
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_custom_months(mut self, months: CustomMonths) -> Self {
        self.custom_months = months;
        self
    }

    pub fn with_start_date(mut self, date: NaiveDate) -> Self {
        self.start_date = Some(date);
        self
    }

    pub fn with_end_date(mut self, date: NaiveDate) -> Self {
        self.end_date = Some(date);
        self
    }

    pub fn with_active(mut self, active: bool) -> Self {
        self.is_active = active;
        self
    }

    /// Marks the income as CPF-subject with the stored monthly employee share.
    pub fn with_cpf(mut self, employee_contribution: Decimal) -> Self {
        let details = self.income.get_or_insert_with(IncomeDetails::default);
        details.subject_to_cpf = true;
        details.employee_cpf_contribution = Some(employee_contribution);
        self
    }

    pub fn with_history(mut self, entries: Vec<PastIncomeEntry>) -> Self {
        self.income
            .get_or_insert_with(IncomeDetails::default)
            .past_income_history = entries;
        self
    }

    /// Sets the milestones and turns on `account_for_future_change`.
    pub fn with_milestones(mut self, milestones: Vec<FutureMilestone>) -> Self {
        let details = self.income.get_or_insert_with(IncomeDetails::default);
        details.future_milestones = milestones;
        details.account_for_future_change = true;
        self
    }

    pub fn with_defect(mut self, defect: RecordDefect) -> Self {
        self.defects.push(defect);
        self
    }

    pub fn is_income(&self) -> bool {
        self.kind == ItemKind::Income
    }

    pub fn is_subject_to_cpf(&self) -> bool {
        self.income
            .as_ref()
            .is_some_and(|details| details.subject_to_cpf)
    }

    /// True when a defect prevents the item from landing in any month.
    pub fn has_blocking_defect(&self) -> bool {
        self.defects.iter().any(RecordDefect::blocks_schedule)
    }
}
