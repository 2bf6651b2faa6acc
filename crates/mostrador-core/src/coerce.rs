//! # Lenient Numeric Coercion
//!
//! Sale line items arrive from a form where any field may be blank, `null`,
//! a number, or a number typed as text. Totals must still be computed, so
//! anything that is not a finite number counts as zero.
//!
//! ```text
//!   1500        → 1500
//!   "1500"      → 1500
//!   " 12.5 "    → 12.5
//!   null / ""   → 0
//!   "abc"       → 0
//!   {} / []     → 0
//!   -3          → rejected (Negative)
//!   1e300       → rejected (TooLarge)
//! ```
//!
//! Blank input is forgiven; a negative or unstorable number is not, since it
//! would silently change the totals.

use serde_json::Value;

use crate::money::Money;

/// Reads a JSON value as a finite float, or 0.
pub fn number_or_zero(value: &Value) -> f64 {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|n| n.is_finite()).unwrap_or(0.0)
}

/// Why a numeric line field was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejected {
    Negative,
    TooLarge,
}

/// Reads a JSON value as an amount in currency units, or zero.
pub fn money_or_zero(value: &Value) -> Result<Money, Rejected> {
    let n = number_or_zero(value);
    if n < 0.0 {
        return Err(Rejected::Negative);
    }
    Money::from_units_f64(n).ok_or(Rejected::TooLarge)
}

/// Reads a JSON value as a whole quantity, rounding to nearest, or 0.
pub fn quantity_or_zero(value: &Value) -> Result<i64, Rejected> {
    let n = number_or_zero(value).round();
    if n < 0.0 {
        return Err(Rejected::Negative);
    }
    if n >= i64::MAX as f64 {
        return Err(Rejected::TooLarge);
    }
    Ok(n as i64)
}

/// Strict variant for places where a bad number is an error, not a zero.
pub fn positive_quantity(value: &Value) -> Option<i64> {
    let n = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    if !n.is_finite() || n <= 0.0 || n.fract() != 0.0 || n >= i64::MAX as f64 {
        return None;
    }
    Some(n as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_numbers_and_numeric_strings() {
        assert_eq!(number_or_zero(&json!(1500)), 1500.0);
        assert_eq!(number_or_zero(&json!("285")), 285.0);
        assert_eq!(number_or_zero(&json!(" 12.5 ")), 12.5);
    }

    #[test]
    fn test_everything_else_is_zero() {
        for value in [json!(null), json!(""), json!("abc"), json!({}), json!([1]), json!(true)] {
            assert_eq!(number_or_zero(&value), 0.0, "value: {value}");
        }
    }

    #[test]
    fn test_quantities_round_to_whole_units() {
        assert_eq!(quantity_or_zero(&json!(2)), Ok(2));
        assert_eq!(quantity_or_zero(&json!("2.6")), Ok(3));
        assert_eq!(quantity_or_zero(&json!("dos")), Ok(0));
        assert_eq!(quantity_or_zero(&json!(-0.4)), Ok(0));
    }

    #[test]
    fn test_negative_and_huge_quantities_are_rejected() {
        assert_eq!(quantity_or_zero(&json!(-5)), Err(Rejected::Negative));
        assert_eq!(quantity_or_zero(&json!("-1")), Err(Rejected::Negative));
        assert_eq!(quantity_or_zero(&json!(1e19)), Err(Rejected::TooLarge));
    }

    #[test]
    fn test_money_is_read_in_currency_units() {
        assert_eq!(money_or_zero(&json!(1500)), Ok(Money::from_units(1500)));
        assert_eq!(money_or_zero(&json!("285.50")), Ok(Money::from_cents(28_550)));
        assert_eq!(money_or_zero(&json!(null)), Ok(Money::zero()));
        assert_eq!(money_or_zero(&json!(-10)), Err(Rejected::Negative));
        assert_eq!(money_or_zero(&json!(1e300)), Err(Rejected::TooLarge));
    }

    #[test]
    fn test_positive_quantity_is_strict() {
        assert_eq!(positive_quantity(&json!(5)), Some(5));
        assert_eq!(positive_quantity(&json!("7")), Some(7));
        assert_eq!(positive_quantity(&json!(0)), None);
        assert_eq!(positive_quantity(&json!(-1)), None);
        assert_eq!(positive_quantity(&json!(1.5)), None);
        assert_eq!(positive_quantity(&json!("x")), None);
    }
}
