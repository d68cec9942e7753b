//! Typed snapshots of the household's recurring financial items.

pub mod frequency;
pub mod item;
pub mod month;
pub mod overrides;

pub use frequency::{CustomMonths, Frequency};
pub use item::{FinancialItem, IncomeDetails, InvestmentDetails, ItemKind, RecordDefect};
pub use month::{MonthPhase, YearMonth};
pub use overrides::{FutureMilestone, Granularity, IncomePeriod, PastIncomeEntry};
