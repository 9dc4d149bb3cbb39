//! Numeric conversions with C-library semantics.
//!
//! String-to-number conversion in the language follows `strtoll`/`strtod`:
//! leading whitespace is skipped, the longest valid numeric prefix is
//! consumed, and no digits at all yield zero rather than an error.

/// Converts a float to an integer by truncating toward zero.
///
/// Out-of-range values saturate at the `i64` limits and NaN becomes 0,
/// matching Rust's `as` cast; C leaves these cases undefined.
///
/// ## Example
/// ```
/// use patlang::util::num::truncate_to_i64;
///
/// assert_eq!(truncate_to_i64(3.9), 3);
/// assert_eq!(truncate_to_i64(-3.9), -3);
/// assert_eq!(truncate_to_i64(f64::NAN), 0);
/// ```
#[must_use]
pub fn truncate_to_i64(value: f64) -> i64 {
    value as i64
}

/// Parses the longest integer prefix of a string, like `strtoll`.
///
/// Skips leading whitespace, accepts an optional sign and then decimal
/// digits. Returns 0 when no digits are present. Values outside the `i64`
/// range saturate at the nearest limit.
///
/// ## Example
/// ```
/// use patlang::util::num::parse_i64_prefix;
///
/// assert_eq!(parse_i64_prefix("42"), 42);
/// assert_eq!(parse_i64_prefix("  -17 apples"), -17);
/// assert_eq!(parse_i64_prefix("apples"), 0);
/// ```
#[must_use]
pub fn parse_i64_prefix(s: &str) -> i64 {
    let s = s.trim_start();
    let (negative, digits) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s.strip_prefix('+').unwrap_or(s)),
    };

    let mut value: i64 = 0;
    let mut seen = false;
    for c in digits.chars() {
        let Some(d) = c.to_digit(10) else { break };
        seen = true;
        let digit = if negative { -i64::from(d) } else { i64::from(d) };
        value = match value.checked_mul(10).and_then(|v| v.checked_add(digit)) {
            Some(v) => v,
            None => return if negative { i64::MIN } else { i64::MAX },
        };
    }

    if seen { value } else { 0 }
}

/// Parses the longest floating-point prefix of a string, like `strtod`.
///
/// Skips leading whitespace, then accepts an optional sign, digits, an
/// optional fraction and an optional exponent. Returns 0.0 when no numeric
/// prefix is present.
///
/// ## Example
/// ```
/// use patlang::util::num::parse_f64_prefix;
///
/// assert_eq!(parse_f64_prefix("2.5"), 2.5);
/// assert_eq!(parse_f64_prefix("  1e3 rest"), 1000.0);
/// assert_eq!(parse_f64_prefix("rest"), 0.0);
/// ```
#[must_use]
pub fn parse_f64_prefix(s: &str) -> f64 {
    let s = s.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;

    if end < bytes.len() && (bytes[end] == b'+' || bytes[end] == b'-') {
        end += 1;
    }
    let int_digits = count_digits(&bytes[end..]);
    end += int_digits;

    let mut frac_digits = 0;
    if end < bytes.len() && bytes[end] == b'.' {
        frac_digits = count_digits(&bytes[end + 1..]);
        if int_digits > 0 || frac_digits > 0 {
            end += 1 + frac_digits;
        }
    }
    if int_digits == 0 && frac_digits == 0 {
        return 0.0;
    }

    if end < bytes.len() && (bytes[end] == b'e' || bytes[end] == b'E') {
        let mut exp_end = end + 1;
        if exp_end < bytes.len() && (bytes[exp_end] == b'+' || bytes[exp_end] == b'-') {
            exp_end += 1;
        }
        let exp_digits = count_digits(&bytes[exp_end..]);
        if exp_digits > 0 {
            end = exp_end + exp_digits;
        }
    }

    s[..end].parse().unwrap_or(0.0)
}

fn count_digits(bytes: &[u8]) -> usize {
    bytes.iter().take_while(|b| b.is_ascii_digit()).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_prefixes() {
        assert_eq!(parse_i64_prefix("123abc"), 123);
        assert_eq!(parse_i64_prefix("+9"), 9);
        assert_eq!(parse_i64_prefix("-"), 0);
        assert_eq!(parse_i64_prefix(""), 0);
        assert_eq!(parse_i64_prefix("99999999999999999999"), i64::MAX);
        assert_eq!(parse_i64_prefix("-99999999999999999999"), i64::MIN);
    }

    #[test]
    fn float_prefixes() {
        assert_eq!(parse_f64_prefix("3.25suffix"), 3.25);
        assert_eq!(parse_f64_prefix("-0.5"), -0.5);
        assert_eq!(parse_f64_prefix(".5"), 0.5);
        assert_eq!(parse_f64_prefix("7."), 7.0);
        assert_eq!(parse_f64_prefix("1e"), 1.0);
        assert_eq!(parse_f64_prefix("2e2"), 200.0);
        assert_eq!(parse_f64_prefix("."), 0.0);
    }

    #[test]
    fn truncation() {
        assert_eq!(truncate_to_i64(1e300), i64::MAX);
        assert_eq!(truncate_to_i64(-1e300), i64::MIN);
    }
}
