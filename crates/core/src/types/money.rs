//! Euro amounts.
//!
//! Amounts are `Decimal` euros everywhere in the application and are only
//! converted to integer cents at the payment gateway boundary.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

/// Format an amount the Italian way: `€ 1.234,50`.
#[must_use]
pub fn format_eur(amount: Decimal) -> String {
    let rounded = amount.round_dp(2);
    let negative = rounded.is_sign_negative() && !rounded.is_zero();
    let abs = rounded.abs();

    let whole = abs.trunc().to_u64().unwrap_or(0);
    let cents = ((abs - abs.trunc()) * Decimal::ONE_HUNDRED)
        .round()
        .to_u64()
        .unwrap_or(0);

    let digits = whole.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(c);
    }

    let sign = if negative { "-" } else { "" };
    format!("{sign}€ {grouped},{cents:02}")
}

/// Convert euros to integer cents for the payment gateway.
///
/// Returns `None` if the amount does not fit in an `i64`.
#[must_use]
pub fn to_cents(amount: Decimal) -> Option<i64> {
    (amount * Decimal::ONE_HUNDRED).round().to_i64()
}

/// Convert integer cents reported by the payment gateway into euros.
#[must_use]
pub fn from_cents(cents: i64) -> Decimal {
    Decimal::new(cents, 2)
}
