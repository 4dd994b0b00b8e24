use once_cell::sync::Lazy;
use regex::{Captures, Regex};

// The optional leading whole number marks a mixed number ("2 1/4"), which is
// left as written.
static FRACTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:(\d+)[ \t]+)?(\d+)/(\d+)\b").expect("fraction pattern is valid")
});

/// Rewrite bare `<int>/<int>` tokens as decimals, so `1/2` becomes `0.5`.
///
/// Tokens that cannot be divided (zero denominator, overflow) are kept
/// unchanged rather than failing the whole reply.
pub fn normalize_fractions(candidate: &str) -> String {
    FRACTION
        .replace_all(candidate, |caps: &Captures| {
            let whole = &caps[0];
            if caps.get(1).is_some() {
                return whole.to_string();
            }
            divide(&caps[2], &caps[3]).unwrap_or_else(|| whole.to_string())
        })
        .into_owned()
}

fn divide(numerator: &str, denominator: &str) -> Option<String> {
    let numerator: f64 = numerator.parse().ok()?;
    let denominator: f64 = denominator.parse().ok()?;
    if denominator == 0.0 {
        return None;
    }

    let value = numerator / denominator;
    if !value.is_finite() {
        return None;
    }
    Some(format_float(value))
}

/// Shortest round-trip form, always carrying a decimal point (`2.0`, `0.5`).
fn format_float(value: f64) -> String {
    let text = value.to_string();
    if text.contains('.') {
        text
    } else {
        format!("{}.0", text)
    }
}
