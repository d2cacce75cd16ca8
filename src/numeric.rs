//! Coercion and guarded arithmetic used by every derivation in the app.
//!
//! Report exports routinely carry numbers as strings, blank cells, and junk
//! like `"--"`. Nothing here is allowed to panic or return a non-finite
//! value; malformed input degrades to 0.

use crate::models::CellValue;

/// Coerce an optional cell to a finite-or-as-is number. A numeric cell is
/// returned unchanged; text is parsed as a leading decimal prefix the way
/// `parseFloat` would read it; anything else is 0.
pub fn to_number(cell: Option<&CellValue>) -> f64 {
    match cell {
        Some(CellValue::Number(value)) => *value,
        Some(CellValue::Text(text)) => {
            let parsed = parse_leading_float(text);
            if parsed.is_finite() {
                parsed
            } else {
                0.0
            }
        }
        None => 0.0,
    }
}

/// Same contract as [`to_number`], truncating text input at the first
/// non-digit (base 10).
pub fn to_integer(cell: Option<&CellValue>) -> i64 {
    match cell {
        Some(CellValue::Number(value)) if value.is_finite() => *value as i64,
        Some(CellValue::Number(_)) => 0,
        Some(CellValue::Text(text)) => parse_leading_int(text),
        None => 0,
    }
}

/// `(numerator / denominator) * 100`, or 0 whenever the denominator is zero,
/// either operand is non-finite, or the result itself is non-finite.
pub fn safe_percentage(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 || !denominator.is_finite() || !numerator.is_finite() {
        return 0.0;
    }
    let result = (numerator / denominator) * 100.0;
    if result.is_finite() {
        result
    } else {
        0.0
    }
}

/// Plain guarded division, used for averaging share sums.
pub fn safe_divide(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 || !denominator.is_finite() || !numerator.is_finite() {
        return 0.0;
    }
    let result = numerator / denominator;
    if result.is_finite() {
        result
    } else {
        0.0
    }
}

/// Addition where a non-finite addend contributes 0.
pub fn safe_add(accumulator: f64, addend: f64) -> f64 {
    let a = if accumulator.is_finite() { accumulator } else { 0.0 };
    let b = if addend.is_finite() { addend } else { 0.0 };
    a + b
}

/// Compact display string for KPI cards and funnel labels: `1.5K`, `2.3M`,
/// `1.1B`.
pub fn format_compact(value: f64) -> String {
    if !value.is_finite() {
        return "0".to_string();
    }
    let magnitude = value.abs();
    if magnitude >= 1_000_000_000.0 {
        format!("{:.1}B", value / 1_000_000_000.0)
    } else if magnitude >= 1_000_000.0 {
        format!("{:.1}M", value / 1_000_000.0)
    } else if magnitude >= 1_000.0 {
        format!("{:.1}K", value / 1_000.0)
    } else {
        format!("{}", value.round() as i64)
    }
}

fn parse_leading_float(text: &str) -> f64 {
    let trimmed = text.trim();
    let bytes = trimmed.as_bytes();
    let mut end = 0;
    let mut seen_digit = false;
    let mut seen_dot = false;
    let mut seen_exp = false;
    while end < bytes.len() {
        let b = bytes[end];
        match b {
            b'0'..=b'9' => seen_digit = true,
            b'+' | b'-' if end == 0 => {}
            b'+' | b'-' if matches!(bytes[end - 1], b'e' | b'E') => {}
            b'.' if !seen_dot && !seen_exp => seen_dot = true,
            b'e' | b'E' if seen_digit && !seen_exp => seen_exp = true,
            _ => break,
        }
        end += 1;
    }
    if !seen_digit {
        return f64::NAN;
    }
    // Walk back over a dangling exponent marker or sign.
    let mut slice = &trimmed[..end];
    while slice
        .chars()
        .last()
        .is_some_and(|c| matches!(c, 'e' | 'E' | '+' | '-' | '.'))
    {
        slice = &slice[..slice.len() - 1];
    }
    slice.parse::<f64>().unwrap_or(f64::NAN)
}

fn parse_leading_int(text: &str) -> i64 {
    let trimmed = text.trim();
    let bytes = trimmed.as_bytes();
    let mut end = 0;
    while end < bytes.len() {
        let b = bytes[end];
        let is_sign = (b == b'+' || b == b'-') && end == 0;
        if b.is_ascii_digit() || is_sign {
            end += 1;
        } else {
            break;
        }
    }
    trimmed[..end].parse::<i64>().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CellValue;

    fn text(value: &str) -> CellValue {
        CellValue::Text(value.to_string())
    }

    #[test]
    fn to_number_coerces_strings_and_numbers() {
        assert_eq!(to_number(Some(&text(""))), 0.0);
        assert_eq!(to_number(Some(&text("abc"))), 0.0);
        assert_eq!(to_number(Some(&text("12.5"))), 12.5);
        assert_eq!(to_number(Some(&text("  42 "))), 42.0);
        assert_eq!(to_number(Some(&text("12.5abc"))), 12.5);
        assert_eq!(to_number(Some(&text("-3.25"))), -3.25);
        assert_eq!(to_number(Some(&CellValue::Number(7.0))), 7.0);
        assert_eq!(to_number(None), 0.0);
    }

    #[test]
    fn to_integer_truncates() {
        assert_eq!(to_integer(Some(&text("12.5"))), 12);
        assert_eq!(to_integer(Some(&text("-8 units"))), -8);
        assert_eq!(to_integer(Some(&text("none"))), 0);
        assert_eq!(to_integer(Some(&CellValue::Number(9.9))), 9);
    }

    #[test]
    fn safe_percentage_guards_denominator() {
        assert_eq!(safe_percentage(5.0, 0.0), 0.0);
        assert_eq!(safe_percentage(f64::NAN, 10.0), 0.0);
        assert_eq!(safe_percentage(5.0, f64::INFINITY), 0.0);
        assert_eq!(safe_percentage(10.0, 40.0), 25.0);
    }

    #[test]
    fn safe_percentage_guards_overflowing_result() {
        assert_eq!(safe_percentage(f64::MAX, f64::MIN_POSITIVE), 0.0);
    }

    #[test]
    fn safe_add_drops_non_finite_addends() {
        assert_eq!(safe_add(1.0, f64::NAN), 1.0);
        assert_eq!(safe_add(f64::INFINITY, 2.0), 2.0);
        assert_eq!(safe_add(1.5, 2.5), 4.0);
    }

    #[test]
    fn safe_divide_does_not_scale() {
        assert_eq!(safe_divide(30.0, 3.0), 10.0);
        assert_eq!(safe_divide(30.0, 0.0), 0.0);
    }

    #[test]
    fn compact_formatting() {
        assert_eq!(format_compact(950.0), "950");
        assert_eq!(format_compact(15_420.0), "15.4K");
        assert_eq!(format_compact(2_500_000.0), "2.5M");
        assert_eq!(format_compact(1_200_000_000.0), "1.2B");
        assert_eq!(format_compact(f64::NAN), "0");
    }
}
