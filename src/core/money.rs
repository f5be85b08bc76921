//! Rounding, guarded ratios and display formatting for monetary values.

pub fn round_cents(value: f64) -> f64 {
    round_to(value, 2)
}

pub fn round_to(value: f64, decimals: i32) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    let factor = 10_f64.powi(decimals);
    let rounded = (value * factor).round() / factor;
    // Normalise -0.0 so serialized output never shows a negative zero.
    if rounded == 0.0 { 0.0 } else { rounded }
}

/// `numerator / denominator`, or `0.0` when the denominator is zero or
/// the result would not be finite.
pub fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        return 0.0;
    }
    let value = numerator / denominator;
    if value.is_finite() { value } else { 0.0 }
}

/// Formats whole dollars with thousands separators, e.g. `$12,345`.
pub fn format_dollars(value: f64) -> String {
    let rounded = if value.is_finite() { value.round() } else { 0.0 };
    let negative = rounded < 0.0;
    let digits = format!("{:.0}", rounded.abs());
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if negative {
        format!("-${grouped}")
    } else {
        format!("${grouped}")
    }
}

/// Formats a fraction as a whole percentage, e.g. `0.256` -> `26%`.
pub fn format_percent(fraction: f64) -> String {
    let value = if fraction.is_finite() { fraction } else { 0.0 };
    format!("{:.0}%", value * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_cents_handles_non_finite_and_negative_zero() {
        assert_eq!(round_cents(1.005_1), 1.01);
        assert_eq!(round_cents(f64::NAN), 0.0);
        assert_eq!(round_cents(f64::INFINITY), 0.0);
        assert!(round_cents(-0.001).is_sign_positive());
    }

    #[test]
    fn ratio_guards_zero_denominator() {
        assert_eq!(ratio(5.0, 0.0), 0.0);
        assert_eq!(ratio(5.0, 2.0), 2.5);
        assert_eq!(ratio(f64::MAX, f64::MIN_POSITIVE), 0.0);
    }

    #[test]
    fn format_dollars_groups_thousands() {
        assert_eq!(format_dollars(0.0), "$0");
        assert_eq!(format_dollars(999.4), "$999");
        assert_eq!(format_dollars(1_000.0), "$1,000");
        assert_eq!(format_dollars(1_234_567.8), "$1,234,568");
        assert_eq!(format_dollars(-25_000.0), "-$25,000");
    }

    #[test]
    fn format_percent_rounds_to_whole_numbers() {
        assert_eq!(format_percent(0.256), "26%");
        assert_eq!(format_percent(0.0), "0%");
    }
}
