//! Display helpers for amounts and months.

use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};

/// Direction of a change, for colouring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trend {
    Positive,
    Negative,
    Unknown,
}

impl Trend {
    /// Zero counts as positive; a missing value is unknown.
    pub fn of(value: Option<Decimal>) -> Self {
        match value {
            None => Self::Unknown,
            Some(v) if v >= Decimal::ZERO => Self::Positive,
            Some(_) => Self::Negative,
        }
    }
}

/// `$1,234.56`, `-$50.00`, or `N/A` for a missing value.
///
/// Cents are rounded half away from zero.
pub fn format_currency(value: Option<Decimal>) -> String {
    let Some(value) = value else {
        return "N/A".to_string();
    };

    let mut amount = value
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
        .abs();
    amount.rescale(2);
    let text = amount.to_string();
    let (whole, cents) = text.split_once('.').unwrap_or((text.as_str(), ""));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if value.is_sign_negative() && !amount.is_zero() {
        "-"
    } else {
        ""
    };
    format!("{sign}${grouped}.{cents:0<2}")
}

/// `"2025-01"` → `"January 2025"`. Unparseable input is returned as is.
pub fn format_month(month: &str) -> String {
    NaiveDate::parse_from_str(&format!("{month}-01"), "%Y-%m-%d")
        .map(|date| date.format("%B %Y").to_string())
        .unwrap_or_else(|_| month.to_string())
}
