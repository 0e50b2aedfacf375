//! Normalization of heterogeneous numeric-ish values into floats.
//!
//! Model output and stored documents mix plain numbers with strings like
//! `"INR 1,23,456.78"` or `"12%"`. Everything funnels through [`parse`] so
//! downstream totals never have to care which form a value arrived in.

use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

fn number_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"-?[0-9]+(\.[0-9]+)?").unwrap())
}

/// Coerce a JSON value into a float. Returns `None` for null, booleans,
/// containers, and strings with no recognizable number.
pub fn parse(value: &Value) -> Option<f64> {
    match value {
        Value::Null => None,
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_str(s),
        _ => None,
    }
}

/// Extract the first signed decimal number from a string, after stripping
/// currency symbols, thousands separators, and a trailing percent sign.
///
/// Percent values stay percent-scaled: `"12%"` parses to `12.0`, not `0.12`.
pub fn parse_str(raw: &str) -> Option<f64> {
    let mut s = raw.trim();
    if s.is_empty() {
        return None;
    }

    // Percent flag is noted by stripping the sign; the value is not rescaled.
    if let Some(stripped) = s.strip_suffix('%') {
        s = stripped;
    }

    let cleaned: String = s
        .chars()
        .filter(|c| !matches!(c, '$' | '£' | '€' | '₹' | ','))
        .collect();

    let m = number_pattern().find(&cleaned)?;
    m.as_str().parse::<f64>().ok()
}
