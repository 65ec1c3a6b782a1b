//! Monetary amounts
//!
//! All ledger amounts are fixed-point values with at most two decimal
//! places, carried as `rust_decimal::Decimal`. Client-facing strings MUST
//! go through [`parse_amount`]; no silent truncation, no floats.

use rust_decimal::Decimal;
use thiserror::Error;

/// Decimal places every ledger amount is limited to.
pub const AMOUNT_SCALE: u32 = 2;

#[derive(Debug, Error)]
pub enum MoneyError {
    #[error("Precision overflow: provided {provided} decimals, max allowed {max}")]
    PrecisionOverflow { provided: u32, max: u32 },

    #[error("Invalid amount format: {0}")]
    InvalidFormat(String),
}

/// Parse a client-provided amount string into a `Decimal`.
///
/// Strict on format: requires digits on both sides of the dot (use `0.5`,
/// not `.5`) and rejects more than [`AMOUNT_SCALE`] fractional digits.
/// Sign is accepted here; positivity is a ledger rule, enforced at append.
pub fn parse_amount(amount_str: &str) -> Result<Decimal, MoneyError> {
    let amount_str = amount_str.trim();
    if amount_str.is_empty() {
        return Err(MoneyError::InvalidFormat("empty string".into()));
    }

    let digits = amount_str.strip_prefix('-').unwrap_or(amount_str);
    if let Some((whole, frac)) = digits.split_once('.') {
        if whole.is_empty() {
            return Err(MoneyError::InvalidFormat(
                "missing leading zero (e.g., use 0.5 instead of .5)".into(),
            ));
        }
        if frac.is_empty() {
            return Err(MoneyError::InvalidFormat(
                "missing fractional part (e.g., use 5.0 instead of 5.)".into(),
            ));
        }
        if frac.len() as u32 > AMOUNT_SCALE {
            return Err(MoneyError::PrecisionOverflow {
                provided: frac.len() as u32,
                max: AMOUNT_SCALE,
            });
        }
    }

    let value: Decimal = amount_str
        .parse()
        .map_err(|_| MoneyError::InvalidFormat(amount_str.to_string()))?;
    Ok(value.normalize())
}

/// Round a derived amount (e.g. interest) back to ledger scale, half-up.
pub fn to_ledger_scale(value: Decimal) -> Decimal {
    value.round_dp(AMOUNT_SCALE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_parse_plain_and_fractional() {
        assert_eq!(parse_amount("100").unwrap(), Decimal::from(100));
        assert_eq!(
            parse_amount("600.50").unwrap(),
            Decimal::from_str("600.5").unwrap()
        );
        assert_eq!(
            parse_amount("-3.25").unwrap(),
            Decimal::from_str("-3.25").unwrap()
        );
    }

    #[test]
    fn test_parse_rejects_excess_precision() {
        assert!(matches!(
            parse_amount("1.999"),
            Err(MoneyError::PrecisionOverflow {
                provided: 3,
                max: 2
            })
        ));
    }

    #[test]
    fn test_parse_rejects_ambiguous_forms() {
        assert!(parse_amount("").is_err());
        assert!(parse_amount(".5").is_err());
        assert!(parse_amount("5.").is_err());
        assert!(parse_amount("abc").is_err());
    }

    #[test]
    fn test_interest_rounding() {
        // 333.33 * 0.05 = 16.6665 -> 16.67
        let raw = Decimal::from_str("333.33").unwrap() * Decimal::from_str("0.05").unwrap();
        assert_eq!(to_ledger_scale(raw), Decimal::from_str("16.67").unwrap());
    }
}
