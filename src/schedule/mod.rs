//! Month-level schedule resolution: frequency rules, override layering, and the clock
//! that anchors historical/future classification.

pub mod frequency;
pub mod overrides;
pub mod time;

pub use frequency::{
    frequency_matches, is_active_for_month, monthly_equivalent, resolves_this_month,
    scheduled_amount,
};
pub use overrides::{
    applicable_milestone, historical_override, resolve_amount, OverrideSource, ResolutionContext,
    ResolvedAmount,
};
pub use time::{Clock, FixedClock, SystemClock};
