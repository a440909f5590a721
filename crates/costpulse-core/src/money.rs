//! Money formatting shared by the text report and the chart
//!
//! Every monetary value that reaches a human goes through [`format_amount`],
//! so the table and the chart legend can never disagree on rounding.
//!
//! Amounts are `f64` USD values. Formatting rounds the exact binary value
//! to the nearest two-decimal string (Rust's `{:.2}`), so a literal such as
//! `2.675`, stored as `2.67499...`, renders as `2.67`.

/// Format an amount with exactly two decimal digits
///
/// # Examples
/// ```
/// use costpulse_core::money::format_amount;
///
/// assert_eq!(format_amount(1.1 + 3.2), "4.30");
/// assert_eq!(format_amount(12.8), "12.80");
/// assert_eq!(format_amount(0.0), "0.00");
/// ```
pub fn format_amount(amount: f64) -> String {
    // Avoid rendering "-0.00" for tiny negative credits
    let amount = if amount.abs() < 0.005 { 0.0 } else { amount };
    format!("{amount:.2}")
}

/// Format an amount followed by the currency unit
pub fn format_usd(amount: f64) -> String {
    format!("{} USD", format_amount(amount))
}

/// Sum amounts in iteration order
pub fn sum<I>(amounts: I) -> f64
where
    I: IntoIterator<Item = f64>,
{
    amounts.into_iter().fold(0.0, |acc, a| acc + a)
}
