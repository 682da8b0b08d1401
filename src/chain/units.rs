//! Conversions between human amounts and integer base units.
//!
//! Base-unit math is done on `U256` only; `Decimal` is used for parsing user
//! input and for display math (USD values), never for balance comparisons.

use std::str::FromStr;

use alloy_primitives::U256;
use rust_decimal::{Decimal, RoundingStrategy};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum UnitsError {
    #[error("'{0}' is not a decimal amount")]
    NotANumber(String),
    #[error("amount must not be negative: {0}")]
    Negative(String),
    #[error("decimals {0} out of range")]
    Decimals(u8),
    #[error("amount {0} is too large")]
    Overflow(String),
}

/// Parses a user amount such as `"0.5"`.
pub fn parse_amount(raw: &str) -> Result<Decimal, UnitsError> {
    let raw = raw.trim();
    let value = Decimal::from_str(raw)
        .or_else(|_| Decimal::from_scientific(raw))
        .map_err(|_| UnitsError::NotANumber(raw.to_string()))?;
    if value.is_sign_negative() && !value.is_zero() {
        return Err(UnitsError::Negative(raw.to_string()));
    }
    Ok(value)
}

/// `amount × 10^decimals`, truncating digits the token can't represent.
pub fn to_base_units(amount: Decimal, decimals: u8) -> Result<U256, UnitsError> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(UnitsError::Negative(amount.to_string()));
    }
    if decimals > 77 {
        return Err(UnitsError::Decimals(decimals));
    }
    let truncated = amount.round_dp_with_strategy(decimals as u32, RoundingStrategy::ToZero);
    let mantissa = U256::from(truncated.mantissa().unsigned_abs());
    let scale = truncated.scale();
    let shift = U256::from(decimals as u32 - scale);
    mantissa
        .checked_mul(U256::from(10u64).pow(shift))
        .ok_or_else(|| UnitsError::Overflow(amount.to_string()))
}

/// Exact decimal string, trailing zeros trimmed: `1500000000000000000, 18 → "1.5"`.
pub fn format_units(value: U256, decimals: u8) -> String {
    let digits = value.to_string();
    let decimals = decimals as usize;
    if decimals == 0 {
        return digits;
    }
    let padded = format!("{digits:0>width$}", width = decimals + 1);
    let (int_part, frac_part) = padded.split_at(padded.len() - decimals);
    let frac_part = frac_part.trim_end_matches('0');
    if frac_part.is_empty() {
        int_part.to_string()
    } else {
        format!("{int_part}.{frac_part}")
    }
}

/// Fixed number of fraction digits, truncated: `(…, 18, 4) → "312.4521"`.
pub fn format_units_fixed(value: U256, decimals: u8, dp: usize) -> String {
    let exact = format_units(value, decimals);
    let (int_part, frac_part) = exact.split_once('.').unwrap_or((exact.as_str(), ""));
    if dp == 0 {
        return int_part.to_string();
    }
    let frac: String = frac_part.chars().chain(std::iter::repeat('0')).take(dp).collect();
    format!("{int_part}.{frac}")
}

/// Decimal view for display math; `None` if it doesn't fit a `Decimal`.
pub fn to_decimal(value: U256, decimals: u8) -> Option<Decimal> {
    Decimal::from_str(&format_units(value, decimals)).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn wei(s: &str) -> U256 {
        U256::from_str_radix(s, 10).unwrap()
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("0.5").unwrap(), Decimal::new(5, 1));
        assert_eq!(parse_amount(" 2 ").unwrap(), Decimal::from(2));
        assert!(matches!(parse_amount("abc"), Err(UnitsError::NotANumber(_))));
        assert!(matches!(parse_amount("-1"), Err(UnitsError::Negative(_))));
    }

    #[test]
    fn test_to_base_units() {
        let half = parse_amount("0.5").unwrap();
        assert_eq!(to_base_units(half, 18).unwrap(), wei("500000000000000000"));
        assert_eq!(to_base_units(half, 6).unwrap(), U256::from(500_000u64));

        let one_and_half = parse_amount("1.5").unwrap();
        assert!(to_base_units(one_and_half, 18).unwrap() > wei("1000000000000000000"));
    }

    #[test]
    fn test_excess_precision_truncates() {
        let amount = parse_amount("1.1234567").unwrap();
        assert_eq!(to_base_units(amount, 6).unwrap(), U256::from(1_123_456u64));
        assert_eq!(to_base_units(amount, 0).unwrap(), U256::from(1u64));
    }

    #[test]
    fn test_format_units() {
        assert_eq!(format_units(wei("1500000000000000000"), 18), "1.5");
        assert_eq!(format_units(wei("1000000000000000000"), 18), "1");
        assert_eq!(format_units(U256::from(1u64), 18), "0.000000000000000001");
        assert_eq!(format_units(U256::ZERO, 18), "0");
        assert_eq!(format_units(U256::from(42u64), 0), "42");
    }

    #[test]
    fn test_format_units_fixed() {
        assert_eq!(format_units_fixed(wei("312452199999999999999"), 18, 4), "312.4521");
        assert_eq!(format_units_fixed(U256::ZERO, 18, 4), "0.0000");
        assert_eq!(format_units_fixed(U256::from(5u64), 1, 2), "0.50");
    }

    proptest! {
        #[test]
        fn prop_base_units_preserve_order(
            a_int in 0u64..1_000_000,
            a_frac in 0u64..1_000_000_000,
            b_int in 0u64..1_000_000,
            b_frac in 0u64..1_000_000_000,
        ) {
            let a = parse_amount(&format!("{a_int}.{a_frac:09}")).unwrap();
            let b = parse_amount(&format!("{b_int}.{b_frac:09}")).unwrap();
            let ua = to_base_units(a, 18).unwrap();
            let ub = to_base_units(b, 18).unwrap();
            prop_assert_eq!(a.cmp(&b), ua.cmp(&ub));
        }

        #[test]
        fn prop_formatted_value_parses_back(raw in any::<u64>(), decimals in 0u8..=18) {
            let value = U256::from(raw);
            let shown = format_units(value, decimals);
            let reparsed = to_base_units(parse_amount(&shown).unwrap(), decimals).unwrap();
            prop_assert_eq!(reparsed, value);
        }
    }
}
