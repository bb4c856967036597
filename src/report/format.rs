use rust_decimal::Decimal;

/// Belgian notation: `.` groups thousands, `,` separates two decimals.
///
/// ```
/// use voorafbetaling::report::format_amount;
/// use rust_decimal_macros::dec;
///
/// assert_eq!(format_amount(dec!(136250)), "136.250,00");
/// assert_eq!(format_amount(dec!(-1234.567)), "-1.234,57");
/// ```
pub fn format_amount(amount: Decimal) -> String {
    let rounded = amount.round_dp(2);
    let plain = format!("{:.2}", rounded.abs());
    let (int, frac) = plain.split_once('.').unwrap_or((plain.as_str(), "00"));

    let mut grouped = String::with_capacity(int.len() + int.len() / 3);
    for (i, ch) in int.chars().enumerate() {
        if i > 0 && (int.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }

    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    format!("{sign}{grouped},{frac}")
}

/// Rate as a percentage with a decimal comma, e.g. `0.0675` → `6,75%`.
pub fn format_rate(rate: Decimal) -> String {
    let pct = (rate * Decimal::ONE_HUNDRED).normalize();
    format!("{}%", pct.to_string().replace('.', ","))
}
