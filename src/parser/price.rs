use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use rust_decimal::Decimal;

static NUMBER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[.,]?\d[\d.,]*").unwrap());

/// Normalize a locale-formatted price ("€ 1.299,95", "89,95", "89.95") to "D.DD".
///
/// Returns an empty string when the input holds no digits.
pub fn normalize(raw: &str) -> String {
    let Some(m) = NUMBER_RE.find(raw) else {
        return String::new();
    };
    let run = m.as_str().trim_end_matches(['.', ',']);

    let decimal_sep = match (run.rfind(','), run.rfind('.')) {
        (Some(c), Some(d)) => Some(if c > d { ',' } else { '.' }),
        (Some(_), None) => single_separator(run, ','),
        (None, Some(_)) => single_separator(run, '.'),
        (None, None) => None,
    };

    let canonical: String = match decimal_sep {
        Some(sep) => {
            let split = run.rfind(sep).unwrap_or(run.len());
            let (int_part, frac_part) = run.split_at(split);
            let int_digits: String = int_part.chars().filter(char::is_ascii_digit).collect();
            let int_digits = if int_digits.is_empty() { "0".to_string() } else { int_digits };
            format!("{}.{}", int_digits, &frac_part[1..])
        }
        None => run.chars().filter(char::is_ascii_digit).collect(),
    };

    match Decimal::from_str(&canonical) {
        Ok(d) => format!("{:.2}", d.round_dp(2)),
        Err(_) => String::new(),
    }
}

/// A lone separator kind is decimal only if it appears once and is followed by 1-2 digits.
fn single_separator(run: &str, sep: char) -> Option<char> {
    let count = run.matches(sep).count();
    let tail = run.rsplit(sep).next().unwrap_or("");
    if count == 1 && (1..=2).contains(&tail.len()) {
        Some(sep)
    } else {
        None
    }
}

/// Parse a normalized price into a decimal. Empty or garbage input yields `None`.
pub fn to_decimal(normalized: &str) -> Option<Decimal> {
    Decimal::from_str(normalized.trim()).ok().map(|d| d.round_dp(2))
}
