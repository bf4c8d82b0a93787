//! Money arithmetic and formatting.
//!
//! Every amount in the system is a [`Decimal`] with two-decimal scale; binary
//! floating point never touches money. The split here is the foundation of
//! the installment plan builder: the generated shares always reconstruct the
//! original total exactly, with any leftover cents pushed onto the first
//! shares.

use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

const CENT: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Splits `total` into `parts` shares that sum exactly back to `total`.
///
/// The base share is `total / parts` truncated to cents; the remainder cents
/// (always fewer than `parts`) are distributed as an extra cent to the first
/// shares. For `parts == 1` the single share equals the total.
#[must_use]
pub fn split_amount(total: Decimal, parts: u32) -> Vec<Decimal> {
    if parts == 0 {
        return Vec::new();
    }

    let count = Decimal::from(parts);
    let unit = (total / count).trunc_with_scale(2);
    let distributed = unit * count;
    let remainder_cents = ((total - distributed) * Decimal::ONE_HUNDRED)
        .round()
        .to_u32()
        .unwrap_or(0);

    (1..=parts)
        .map(|index| {
            if index <= remainder_cents {
                unit + CENT
            } else {
                unit
            }
        })
        .collect()
}

/// Formats an amount as Brazilian currency: `R$ 1.234,56`.
#[must_use]
pub fn format_currency_brl(amount: Decimal) -> String {
    let rounded = amount.round_dp(2);
    let plain = format!("{:.2}", rounded.abs());
    let (integer_part, fraction) = plain.split_once('.').unwrap_or((plain.as_str(), "00"));

    let mut grouped = String::with_capacity(integer_part.len() + integer_part.len() / 3);
    for (position, digit) in integer_part.chars().enumerate() {
        if position > 0 && (integer_part.len() - position) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(digit);
    }

    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    format!("R$ {sign}{grouped},{fraction}")
}

/// Formats a date as `dd/mm/yyyy`, or `-` when absent.
#[must_use]
pub fn format_date_br(date: Option<NaiveDate>) -> String {
    date.map_or_else(|| "-".to_string(), |value| value.format("%d/%m/%Y").to_string())
}
