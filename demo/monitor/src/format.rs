//! Display formatting for monetary values, greeks and chart axes.
//!
//! All functions are pure. Grouped numbers and currency scale by the power
//! of ten and round half away from zero, so `0.125` renders as `0.13`.
//! [`format_fixed`] rounds the exact binary value instead and breaks only
//! exact ties away from zero: `0.15` is `0.1` but `0.25` is `0.3`.
//! Non-finite input is a caller contract violation and is not special-cased.

use serde::Serialize;

/// Colour tone applied to a displayed value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Positive,
    Negative,
    Neutral,
}

impl Tone {
    /// Tone derived from the sign of `value`
    pub fn of(value: f64) -> Self {
        if value > 0.0 {
            Self::Positive
        } else if value < 0.0 {
            Self::Negative
        } else {
            Self::Neutral
        }
    }
}

/// A formatted value ready for the view layer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayValue {
    pub text: String,
    pub tone: Tone,
}

impl DisplayValue {
    /// Currency text toned by sign
    pub fn currency(value: f64) -> Self {
        Self {
            text: format_currency(value),
            tone: Tone::of(value),
        }
    }

    /// Currency text without tone (exposure figures are shown unstyled)
    pub fn plain_currency(value: f64) -> Self {
        Self::plain(format_currency(value))
    }

    /// Untoned text
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            tone: Tone::Neutral,
        }
    }
}

/// Fixed-point rendering with `decimals` fraction digits.
///
/// Rounds the exact binary value to the nearest representable decimal; only
/// an exact tie rounds away from zero. The sign is kept for any negative
/// input, so `-0.001` at two decimals is `-0.00`.
pub fn format_fixed(value: f64, decimals: usize) -> String {
    let sign = if value < 0.0 { "-" } else { "" };
    let abs = value.abs();
    // Exact ties are the odd multiples of 2^-(decimals + 1); `{:.N}` would pick the even digit
    let scaled = abs * 2f64.powi(decimals as i32 + 1);
    let abs = if scaled.fract() == 0.0 && scaled % 2.0 == 1.0 {
        f64::from_bits(abs.to_bits() + 1)
    } else {
        abs
    };
    format!("{}{:.*}", sign, decimals, abs)
}

/// Grouped decimal, e.g. `format_number(1234567.891, 2) == "1,234,567.89"`
pub fn format_number(value: f64, decimals: usize) -> String {
    let sign = if value < 0.0 { "-" } else { "" };
    let fixed = fixed_abs(value, decimals);
    match fixed.split_once('.') {
        Some((int_part, frac)) => format!("{}{}.{}", sign, group_thousands(int_part), frac),
        None => format!("{}{}", sign, group_thousands(&fixed)),
    }
}

/// Dollar amount with two decimals; negatives render as `-$1,234.50`
pub fn format_currency(value: f64) -> String {
    let prefix = if value < 0.0 { "-" } else { "" };
    format!("{}${}", prefix, format_number(value.abs(), 2))
}

/// Value-axis tick label: `2.5M`, `3K`, or the value itself below a thousand
pub fn format_axis_tick(value: f64) -> String {
    let magnitude = value.abs();
    if magnitude >= 1_000_000.0 {
        format!("{}M", format_fixed(value / 1_000_000.0, 1))
    } else if magnitude >= 1_000.0 {
        format!("{}K", format_fixed(value / 1_000.0, 0))
    } else {
        format!("{}", value)
    }
}

/// Time-axis label for a year offset, e.g. `0.25` → `0.3Y`
pub fn format_year_label(years: f64) -> String {
    format!("{}Y", format_fixed(years, 1))
}

fn fixed_abs(value: f64, decimals: usize) -> String {
    let scale = 10f64.powi(decimals as i32);
    // f64::round breaks ties away from zero; `{:.N}` alone would round to even
    let rounded = (value.abs() * scale).round() / scale;
    format!("{:.*}", decimals, rounded)
}

fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_format_currency_sign() {
        assert_eq!(format_currency(-1234.5), "-$1,234.50");
        assert_eq!(format_currency(0.0), "$0.00");
        assert_eq!(format_currency(1_000_000.0), "$1,000,000.00");
        assert_eq!(format_currency(-500.0), "-$500.00");
    }

    #[test]
    fn test_format_number_grouping() {
        assert_eq!(format_number(1234567.891, 2), "1,234,567.89");
        assert_eq!(format_number(10_000_000.0, 0), "10,000,000");
        assert_eq!(format_number(999.0, 0), "999");
        assert_eq!(format_number(-45_000.0, 2), "-45,000.00");
        assert_eq!(format_number(0.125, 2), "0.13");
    }

    #[test]
    fn test_axis_tick_abbreviation() {
        assert_eq!(format_axis_tick(500.0), "500");
        assert_eq!(format_axis_tick(2_500.0), "3K");
        assert_eq!(format_axis_tick(2_500_000.0), "2.5M");
        assert_eq!(format_axis_tick(-250_000.0), "-250K");
        assert_eq!(format_axis_tick(1_000.0), "1K");
        assert_eq!(format_axis_tick(999_999.0), "1000K");
        assert_eq!(format_axis_tick(0.0), "0");
    }

    #[test]
    fn test_year_label() {
        assert_eq!(format_year_label(0.0), "0.0Y");
        assert_eq!(format_year_label(0.25), "0.3Y");
        assert_eq!(format_year_label(10.0), "10.0Y");
        assert_eq!(format_year_label(0.15), "0.1Y");
        assert_eq!(format_year_label(0.35), "0.3Y");
        assert_eq!(format_year_label(0.75), "0.8Y");
        assert_eq!(format_year_label(1.05), "1.1Y");
    }

    #[test]
    fn test_format_fixed_greeks() {
        assert_eq!(format_fixed(0.65, 4), "0.6500");
        assert_eq!(format_fixed(4.5, 4), "4.5000");
        assert_eq!(format_fixed(-0.02, 4), "-0.0200");
        assert_eq!(format_fixed(2.5, 0), "3");
        assert_eq!(format_fixed(-2.5, 0), "-3");
        assert_eq!(format_fixed(1.005, 2), "1.00");
    }

    #[test]
    fn test_tone() {
        assert_eq!(Tone::of(1.0), Tone::Positive);
        assert_eq!(Tone::of(-1.0), Tone::Negative);
        assert_eq!(Tone::of(0.0), Tone::Neutral);
        assert_eq!(DisplayValue::currency(-500.0).tone, Tone::Negative);
        assert_eq!(DisplayValue::plain_currency(-500.0).tone, Tone::Neutral);
    }

    proptest! {
        #[test]
        fn test_currency_sign_moves_before_symbol(value in -1.0e12f64..1.0e12f64) {
            let text = format_currency(value);
            prop_assert!(!text.contains("$-"));
            if value < 0.0 {
                prop_assert!(text.starts_with("-$"));
                prop_assert_eq!(&text[1..], format_currency(-value));
            } else {
                prop_assert!(text.starts_with('$'));
            }
        }

        #[test]
        fn test_number_groups_are_three_digits(value in 0.0f64..1.0e15f64) {
            let text = format_number(value, 2);
            let int_part = text.split('.').next().unwrap_or_default();
            let groups: Vec<&str> = int_part.split(',').collect();
            prop_assert!(!groups[0].is_empty() && groups[0].len() <= 3);
            for group in &groups[1..] {
                prop_assert_eq!(group.len(), 3);
            }
        }
    }
}
