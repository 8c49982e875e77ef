//! Division and rounding primitives shared by every engine.
//!
//! Zero denominators never raise: the caller supplies the value to fall back
//! on, which is `Decimal::ZERO` unless a metric documents otherwise.

use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;

use crate::types::{Money, Percent, Rate};

/// Days in the commercial year used by every day-count metric.
pub const COMMERCIAL_YEAR_DAYS: Decimal = dec!(360);

/// Decimal places for fractional ratios.
pub const RATIO_DP: u32 = 4;
/// Decimal places for day counts.
pub const DAYS_DP: u32 = 0;
/// Decimal places for currency amounts.
pub const CURRENCY_DP: u32 = 2;

/// `numerator / denominator`, or `default` when the denominator is zero.
pub fn safe_div(numerator: Decimal, denominator: Decimal, default: Decimal) -> Decimal {
    if denominator.is_zero() {
        default
    } else {
        numerator.checked_div(denominator).unwrap_or(default)
    }
}

/// Shorthand for [`safe_div`] with a zero default.
pub fn div0(numerator: Decimal, denominator: Decimal) -> Decimal {
    safe_div(numerator, denominator, Decimal::ZERO)
}

pub fn round_to(value: Decimal, dp: u32) -> Decimal {
    value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero)
}

pub fn round_ratio(value: Rate) -> Rate {
    round_to(value, RATIO_DP)
}

pub fn round_days(value: Decimal) -> Decimal {
    round_to(value, DAYS_DP)
}

pub fn round_money(value: Money) -> Money {
    round_to(value, CURRENCY_DP)
}

/// Percent number (10 = 10%) to a fraction.
pub fn pct(value: Percent) -> Rate {
    value / dec!(100)
}

/// `base * (1 + growth%)`.
pub fn grow(base: Money, growth: Percent) -> Money {
    base * (Decimal::ONE + pct(growth))
}
