/// Dollar amount with thousands separators: `$1,234.56`.
pub fn format_money(value: f64) -> String {
    let negative = value < 0.0;
    let cents = format!("{:.2}", value.abs());
    let (whole, frac) = cents.split_once('.').unwrap_or((cents.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, c) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    if negative {
        format!("-${}.{}", grouped, frac)
    } else {
        format!("${}.{}", grouped, frac)
    }
}

/// Optional dollar amount, `n/a` for null.
pub fn format_opt_money(value: Option<f64>) -> String {
    match value {
        Some(v) => format_money(v),
        None => "n/a".to_string(),
    }
}

/// Signed percentage to two decimals: `+1.23%`, `-0.50%`, `n/a` for null.
pub fn format_pct(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:+.2}%", v),
        None => "n/a".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn money_groups_thousands() {
        assert_eq!(format_money(0.0), "$0.00");
        assert_eq!(format_money(7.5), "$7.50");
        assert_eq!(format_money(1234.5), "$1,234.50");
        assert_eq!(format_money(1234567.891), "$1,234,567.89");
        assert_eq!(format_money(-980.25), "-$980.25");
    }

    #[test]
    fn pct_keeps_sign_and_two_decimals() {
        for (input, expected) in [
            (1.234, "+1.23%"),
            (-0.5, "-0.50%"),
            (0.0, "+0.00%"),
            (10.5, "+10.50%"),
            (-44.444, "-44.44%"),
        ] {
            assert_eq!(format_pct(Some(input)), expected);
        }
        assert_eq!(format_pct(None), "n/a");
    }

    #[test]
    fn pct_always_ends_with_percent() {
        for v in [-120.0, -1.0, 0.0, 0.004, 99.999] {
            let s = format_pct(Some(v));
            assert!(s.ends_with('%'));
            let digits: &str = s.trim_start_matches(['+', '-']).trim_end_matches('%');
            assert_eq!(digits.split('.').nth(1).map(|d| d.len()), Some(2));
        }
    }
}
