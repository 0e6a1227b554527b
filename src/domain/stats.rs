//! 통계 계산 / number formatting helpers
//!
//! Small pure functions shared by the reconciliation step and log summaries.

use serde::{Deserialize, Serialize};

/// Average views per photo, rounded. 0 when there are no photos.
#[must_use]
pub fn avg_views_per_photo(photo_views: u64, photo_count: u64) -> u64 {
    if photo_count == 0 {
        return 0;
    }
    // round half up in integer arithmetic
    photo_views.saturating_add(photo_count / 2) / photo_count
}

/// Change between two monthly values
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyChange {
    pub change: i64,
    /// Percent with one decimal, 0 when there was no previous value to compare with
    pub percent_change: f64,
}

#[must_use]
pub fn monthly_change(current: u64, previous: Option<u64>) -> Option<MonthlyChange> {
    let previous = previous?;
    let change = signed_delta(current, previous);
    let percent_change = if previous > 0 {
        #[allow(clippy::cast_precision_loss)]
        let ratio = change as f64 / previous as f64;
        (ratio * 1000.0).round() / 10.0
    } else {
        0.0
    };
    Some(MonthlyChange { change, percent_change })
}

/// `next - previous` without overflow on huge counters
#[must_use]
pub fn signed_delta(next: u64, previous: u64) -> i64 {
    let diff = i128::from(next) - i128::from(previous);
    i64::try_from(diff).unwrap_or(if diff < 0 { i64::MIN } else { i64::MAX })
}

/// `1234567 -> "1.2M"`, `12345 -> "12.3K"`, `999 -> "999"`
#[must_use]
pub fn format_compact(value: u64) -> String {
    const UNITS: [(u64, &str); 3] = [(1_000_000_000, "B"), (1_000_000, "M"), (1_000, "K")];

    for (scale, suffix) in UNITS {
        if value >= scale {
            // one decimal, trailing ".0" dropped
            let tenths = (u128::from(value) * 10 + u128::from(scale) / 2) / u128::from(scale);
            return if tenths % 10 == 0 {
                format!("{}{suffix}", tenths / 10)
            } else {
                format!("{}.{}{suffix}", tenths / 10, tenths % 10)
            };
        }
    }
    value.to_string()
}

/// `1234567 -> "1,234,567"`
#[must_use]
pub fn format_with_commas(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// `1234 -> "+1,234"`, `-567 -> "-567"`, `0 -> "0"`
#[must_use]
pub fn format_change(change: i64) -> String {
    let formatted = format_with_commas(change.unsigned_abs());
    match change.signum() {
        1 => format!("+{formatted}"),
        -1 => format!("-{formatted}"),
        _ => formatted,
    }
}
