use chrono::NaiveDate;

/// Significant digits kept when rendering amounts.
const SIGNIFICANT_DIGITS: usize = 6;

/// Format an amount for display: general precision (six significant
/// digits, no trailing zeros) with thousands grouped by spaces.
/// Example: 1234.5 -> "1 234.5", 100000 -> "100 000", 1234567 -> "1.23457e+06"
pub fn format_amount(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    if value == 0.0 {
        return "0".to_string();
    }

    // Rounding to the target precision first decides the exponent, so
    // 999999.9 becomes 1e+06 rather than 1 000 000.
    let scientific = format!("{:.*e}", SIGNIFICANT_DIGITS - 1, value);
    let (mantissa, exponent) = match scientific.split_once('e') {
        Some((m, e)) => (m, e.parse::<i32>().unwrap_or(0)),
        None => (scientific.as_str(), 0),
    };

    if exponent < -4 || exponent >= SIGNIFICANT_DIGITS as i32 {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!(
            "{}e{}{:02}",
            strip_trailing_zeros(mantissa),
            sign,
            exponent.abs()
        )
    } else {
        let decimals = (SIGNIFICANT_DIGITS as i32 - 1 - exponent) as usize;
        let fixed = format!("{:.*}", decimals, value);
        group_thousands(strip_trailing_zeros(&fixed))
    }
}

/// Format a date as `dd.mm.yyyy`.
pub fn format_date(date: NaiveDate) -> String {
    date.format("%d.%m.%Y").to_string()
}

fn strip_trailing_zeros(number: &str) -> &str {
    if number.contains('.') {
        number.trim_end_matches('0').trim_end_matches('.')
    } else {
        number
    }
}

fn group_thousands(number: &str) -> String {
    let (sign, unsigned) = match number.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", number),
    };
    let (integer, fraction) = match unsigned.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (unsigned, None),
    };

    let mut grouped = String::with_capacity(integer.len() + integer.len() / 3);
    for (idx, digit) in integer.chars().enumerate() {
        if idx > 0 && (integer.len() - idx) % 3 == 0 {
            grouped.push(' ');
        }
        grouped.push(digit);
    }

    match fraction {
        Some(f) => format!("{}{}.{}", sign, grouped, f),
        None => format!("{}{}", sign, grouped),
    }
}
