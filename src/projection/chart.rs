use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::MonthlyBalanceFrame;
use crate::domain::YearMonth;

/// How a balance chart presents the projected frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChartMode {
    /// Running balance over time.
    #[default]
    Cumulative,
    /// Raw monthly income, expense, and their difference.
    NonCumulative,
}

/// One plotted month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "kebab-case")]
pub enum ChartPoint {
    #[serde(rename_all = "camelCase")]
    Cumulative {
        month: YearMonth,
        label: String,
        balance: Decimal,
        balance_with_investments: Option<Decimal>,
        annotations: usize,
    },
    #[serde(rename_all = "camelCase")]
    NonCumulative {
        month: YearMonth,
        label: String,
        income: Decimal,
        expense: Decimal,
        net: Decimal,
        annotations: usize,
    },
}

impl ChartPoint {
    pub fn from_frame(frame: &MonthlyBalanceFrame, mode: ChartMode) -> Self {
        match mode {
            ChartMode::Cumulative => ChartPoint::Cumulative {
                month: frame.month,
                label: frame.label.clone(),
                balance: frame.cumulative_balance,
                balance_with_investments: frame.balance_with_investments,
                annotations: frame.special_items.len(),
            },
            ChartMode::NonCumulative => ChartPoint::NonCumulative {
                month: frame.month,
                label: frame.label.clone(),
                income: frame.income,
                expense: frame.expense,
                net: frame.monthly_balance,
                annotations: frame.special_items.len(),
            },
        }
    }

    pub fn label(&self) -> &str {
        match self {
            ChartPoint::Cumulative { label, .. } | ChartPoint::NonCumulative { label, .. } => label,
        }
    }
}
