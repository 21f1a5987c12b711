//! Custom Askama template filters.

#![allow(clippy::unnecessary_wraps)]

use std::fmt::Display;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};

/// Formats an amount as dollars with two decimals.
///
/// Accepts anything that displays as a decimal number. Values that don't
/// parse are passed through unchanged.
///
/// Usage in templates: `{{ item.price|money }}`
#[askama::filter_fn]
pub fn money(value: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    Ok(format_money(&value.to_string()))
}

fn format_money(raw: &str) -> String {
    Decimal::from_str(raw.trim()).map_or_else(
        |_| raw.to_string(),
        |amount| {
            let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
            if rounded.is_sign_negative() {
                format!("-${:.2}", rounded.abs())
            } else {
                format!("${rounded:.2}")
            }
        },
    )
}

/// Formats an RFC 3339 timestamp as a short date, e.g. `Mar 4, 2025`.
///
/// Usage in templates: `{{ order.placed_at|short_date }}`
#[askama::filter_fn]
pub fn short_date(value: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    let raw = value.to_string();
    Ok(DateTime::parse_from_rfc3339(&raw).map_or(raw, |dt| {
        dt.with_timezone(&Utc).format("%b %-d, %Y").to_string()
    }))
}

/// Returns the current year.
///
/// Usage in templates: `{{ ""|current_year }}`
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(Utc::now().year())
}
