//! Display formatting and parsing.
//!
//! Every string the engine shows goes through [`format_value`], and every
//! numeric read of the display goes through [`parse_display`]. The pair
//! round-trips: `parse_display(&format_value(x)) == Ok(x)` for any value the
//! user can type (at most [`MAX_DIGITS`] digits), and `format_value` is
//! idempotent under re-parsing for every finite value.

use crate::error::{CalcError, CalcResult};

/// Maximum number of digits (separators excluded) the display may hold,
/// whether typed or computed.
pub const MAX_DIGITS: usize = 15;

/// Decimal separator.
pub const DECIMAL_SEPARATOR: char = '.';

/// Thousands separator.
pub const GROUP_SEPARATOR: char = ',';

/// Sentinel shown after division by zero or overflow.
pub const ERROR_DISPLAY: &str = "Error";

/// Format a value as canonical display text.
///
/// The result never holds more than [`MAX_DIGITS`] digits. Plain notation is
/// used whenever the integer part fits and rounding keeps at least one
/// significant digit; otherwise the value is shown in exponent form with the
/// mantissa shortened to leave room for the exponent's digits.
///
/// Non-finite values format as [`ERROR_DISPLAY`].
pub fn format_value(value: f64) -> String {
    if !value.is_finite() {
        return ERROR_DISPLAY.to_string();
    }
    if value == 0.0 {
        // Also folds -0 into "0".
        return "0".to_string();
    }

    format_plain(value)
        .or_else(|| format_exponent(value))
        .unwrap_or_else(|| format!("{:e}", value))
}

/// Plain notation rounded to the decimal places left over after the integer
/// part, or `None` if the integer part alone is too wide or rounding leaves
/// nothing but zeros.
fn format_plain(value: f64) -> Option<String> {
    let integer_digits = format!("{}", value.abs().trunc()).len();
    if integer_digits > MAX_DIGITS {
        return None;
    }

    for places in (0..=MAX_DIGITS - integer_digits).rev() {
        let rounded: f64 = format!("{:.*}", places, value).parse().ok()?;
        if rounded == 0.0 {
            return None;
        }
        let shortest = format!("{}", rounded);
        if digit_count(&shortest) <= MAX_DIGITS {
            return Some(group_plain(&shortest));
        }
    }
    None
}

/// Exponent notation whose mantissa and exponent digits together fit.
fn format_exponent(value: f64) -> Option<String> {
    for significant in (1..=MAX_DIGITS).rev() {
        let rounded: f64 = match format!("{:.*e}", significant - 1, value).parse() {
            Ok(rounded) => rounded,
            Err(_) => continue,
        };
        // Rounding up next to f64::MAX can overflow.
        if !rounded.is_finite() {
            continue;
        }
        let shortest = format!("{:e}", rounded);
        if digit_count(&shortest) <= MAX_DIGITS {
            return Some(shortest);
        }
    }
    None
}

/// Parse display text back into a number. Group separators are ignored.
pub fn parse_display(display: &str) -> CalcResult<f64> {
    let cleaned: String = display
        .trim()
        .chars()
        .filter(|c| *c != GROUP_SEPARATOR)
        .collect();

    let value: f64 = cleaned
        .parse()
        .map_err(|_| CalcError::Format(format!("'{display}' is not a number")))?;

    if value.is_finite() {
        Ok(value)
    } else {
        Err(CalcError::Format(format!("'{display}' is not finite")))
    }
}

/// Canonical grouped form of a display string.
pub fn normalize(display: &str) -> CalcResult<String> {
    parse_display(display).map(format_value)
}

/// Number of digits in `display`, separators and sign excluded.
pub fn digit_count(display: &str) -> usize {
    display.chars().filter(|c| c.is_ascii_digit()).count()
}

/// Whether `display` is a plain decimal (no exponent, not the error sentinel).
pub fn is_plain(display: &str) -> bool {
    display
        .chars()
        .all(|c| c.is_ascii_digit() || c == '-' || c == DECIMAL_SEPARATOR || c == GROUP_SEPARATOR)
}

/// Insert group separators into a plain `-?digits(.digits)?` string.
fn group_plain(plain: &str) -> String {
    let (sign, unsigned) = match plain.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", plain),
    };
    let (integer, fraction) = match unsigned.split_once(DECIMAL_SEPARATOR) {
        Some((integer, fraction)) => (integer, Some(fraction)),
        None => (unsigned, None),
    };

    let mut out = String::with_capacity(plain.len() + integer.len() / 3);
    out.push_str(sign);
    for (i, ch) in integer.chars().enumerate() {
        if i > 0 && (integer.len() - i) % 3 == 0 {
            out.push(GROUP_SEPARATOR);
        }
        out.push(ch);
    }
    if let Some(fraction) = fraction {
        out.push(DECIMAL_SEPARATOR);
        out.push_str(fraction);
    }
    out
}
