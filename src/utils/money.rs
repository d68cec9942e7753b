use rust_decimal::{Decimal, RoundingStrategy};

/// Scale of every monetary figure the engine reports.
pub const MONEY_SCALE: u32 = 2;

/// Scale kept on running investment balances between months.
pub const BALANCE_SCALE: u32 = 8;

/// Rounds to cents, halves away from zero.
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

pub(crate) fn round_balance(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(BALANCE_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn rounds_half_away_from_zero() {
        assert_eq!(round_money(dec!(1.005)), dec!(1.01));
        assert_eq!(round_money(dec!(-1.005)), dec!(-1.01));
        assert_eq!(round_money(dec!(433.3333)), dec!(433.33));
    }
}
