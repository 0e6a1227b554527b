//! Locale-tolerant numeral parsing
//!
//! Turns text such as `"1,234"`, `"1.2K"`, `"1.2만"` or `"12 345 ★"` into an
//! integer. Never fails: anything unparsable becomes 0, so a
//! missing number cannot be told apart from a real zero at this level.

use once_cell::sync::Lazy;
use regex::Regex;

/// Leading numeral: digits with optional grouping/decimal separators
static NUMERAL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[0-9]+(?:(?:[.,'\u{00A0}\u{202F}][0-9]+)|(?: [0-9]{3}\b))*").expect("numeral regex")
});

/// Magnitude words, longest first so `백만` wins over `만`
const MAGNITUDE_WORDS: &[(&str, f64)] = &[
    ("십억", 1e9),
    ("천만", 1e7),
    ("백만", 1e6),
    ("억", 1e8),
    ("만", 1e4),
    ("천", 1e3),
    ("千万", 1e7),
    ("百万", 1e6),
    ("億", 1e8),
    ("亿", 1e8),
    ("萬", 1e4),
    ("万", 1e4),
    ("千", 1e3),
];

/// Parse numeric text into an integer, 0 for empty or unparsable input.
///
/// Accepts `&str` and `Option<&str>`.
pub fn normalize<'a>(text: impl Into<Option<&'a str>>) -> u64 {
    let Some(text) = text.into() else {
        return 0;
    };
    let text = text.trim();
    if text.is_empty() {
        return 0;
    }

    let Some(found) = NUMERAL_RE.find(text) else {
        return 0;
    };
    let multiplier = magnitude(&text[found.end()..]);
    let Some(value) = parse_numeral(found.as_str(), multiplier.is_some()) else {
        return 0;
    };

    to_count(value * multiplier.unwrap_or(1.0))
}

/// Multiplier named right after the numeral, if any
fn magnitude(rest: &str) -> Option<f64> {
    let rest = rest.trim_start_matches([' ', '\t', '\u{00A0}', '\u{202F}']);

    for (word, factor) in MAGNITUDE_WORDS {
        if rest.starts_with(word) {
            return Some(*factor);
        }
    }

    let mut chars = rest.chars();
    let factor = match chars.next()? {
        'K' | 'k' => 1e3,
        // lowercase m/b are units ("12 m"), only K is written both ways
        'M' => 1e6,
        'B' => 1e9,
        _ => return None,
    };
    // "12 Bewertungen" or "5 months" are words, not suffixes
    match chars.next() {
        Some(next) if next.is_alphabetic() => None,
        _ => Some(factor),
    }
}

/// Decide which separator (if any) is the decimal point and parse.
///
/// - both `.` and `,` present: the last one is decimal
/// - one kind, repeated: grouping
/// - one kind, once: decimal when a magnitude follows, otherwise grouping
///   only if exactly three digits follow it (`1,234` vs `12.5`)
fn parse_numeral(token: &str, has_magnitude: bool) -> Option<f64> {
    let cleaned: String = token
        .chars()
        .filter(|c| !matches!(c, ' ' | '\'' | '\u{00A0}' | '\u{202F}'))
        .collect();

    let dots = cleaned.matches('.').count();
    let commas = cleaned.matches(',').count();

    let decimal = match (dots, commas) {
        (0, 0) => None,
        (_, _) if dots > 0 && commas > 0 => {
            let last_dot = cleaned.rfind('.');
            let last_comma = cleaned.rfind(',');
            if last_dot > last_comma { Some('.') } else { Some(',') }
        }
        _ => {
            let sep = if dots > 0 { '.' } else { ',' };
            let count = dots.max(commas);
            let fraction_len = cleaned.rsplit(sep).next().map_or(0, str::len);
            if count > 1 || (!has_magnitude && fraction_len == 3) {
                None
            } else {
                Some(sep)
            }
        }
    };

    let numeric: String = cleaned
        .chars()
        .filter_map(|c| match c {
            '0'..='9' => Some(c),
            c if Some(c) == decimal => Some('.'),
            _ => None,
        })
        .collect();

    numeric.parse::<f64>().ok()
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
fn to_count(value: f64) -> u64 {
    if !value.is_finite() || value <= 0.0 {
        return 0;
    }
    let rounded = value.round();
    if rounded >= u64::MAX as f64 { u64::MAX } else { rounded as u64 }
}
