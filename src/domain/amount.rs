//! Token quantities in smallest units
//!
//! Comparisons and arithmetic always use the integer form; decimal
//! formatting is applied only at the display boundary.

use std::fmt;

use alloy_primitives::U256;

use super::error::ValidationError;

/// A non-negative token quantity with display decimals
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Amount {
    raw: U256,
    decimals: u8,
}

impl Amount {
    pub const fn new(raw: U256, decimals: u8) -> Self {
        Self { raw, decimals }
    }

    pub const fn zero(decimals: u8) -> Self {
        Self::new(U256::ZERO, decimals)
    }

    /// Value in smallest units
    pub const fn raw(&self) -> U256 {
        self.raw
    }

    pub const fn decimals(&self) -> u8 {
        self.decimals
    }

    pub fn is_zero(&self) -> bool {
        self.raw.is_zero()
    }

    /// Full-precision decimal string with trailing zeros trimmed
    pub fn format(&self) -> String {
        if self.decimals == 0 {
            return self.raw.to_string();
        }

        let divisor = U256::from(10u64).saturating_pow(U256::from(self.decimals));
        let whole = self.raw / divisor;
        let frac = self.raw % divisor;

        if frac.is_zero() {
            return whole.to_string();
        }
        let frac_str = format!("{:0>width$}", frac, width = self.decimals as usize);
        let trimmed = frac_str.trim_end_matches('0');
        if trimmed.is_empty() {
            whole.to_string()
        } else {
            format!("{}.{}", whole, trimmed)
        }
    }

    /// Decimal string rounded half-up to `places` fractional digits
    pub fn format_fixed(&self, places: u8) -> String {
        let decimals = self.decimals;
        if places >= decimals {
            let scale = U256::from(10u64).saturating_pow(U256::from(places - decimals));
            let padded = self.raw.saturating_mul(scale);
            return split_fixed(padded, places);
        }

        let drop = U256::from(10u64).saturating_pow(U256::from(decimals - places));
        let mut kept = self.raw / drop;
        if self.raw % drop >= drop / U256::from(2u64) {
            kept = kept.saturating_add(U256::from(1u64));
        }
        split_fixed(kept, places)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format())
    }
}

fn split_fixed(value: U256, places: u8) -> String {
    if places == 0 {
        return value.to_string();
    }
    let divisor = U256::from(10u64).saturating_pow(U256::from(places));
    let whole = value / divisor;
    let frac = value % divisor;
    format!("{}.{:0>width$}", whole, frac, width = places as usize)
}

/// Parse a user-supplied quantity that must be a positive integer
///
/// Accepts plain decimal digits only: signs, fractions, exponents and hex
/// are rejected along with zero.
pub fn parse_positive_integer(input: &str) -> Result<U256, ValidationError> {
    let trimmed = input.trim();
    let invalid = || ValidationError::InvalidAmount {
        input: trimmed.to_string(),
    };

    if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    let value = U256::from_str_radix(trimmed, 10).map_err(|_| invalid())?;
    if value.is_zero() {
        return Err(invalid());
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn usdc(raw: u64) -> Amount {
        Amount::new(U256::from(raw), 6)
    }

    #[test]
    fn test_format_trims_fraction() {
        assert_eq!(usdc(10_000_000).format(), "10");
        assert_eq!(usdc(1_500_000).format(), "1.5");
        assert_eq!(usdc(1).format(), "0.000001");
        assert_eq!(Amount::new(U256::from(42u64), 0).format(), "42");
    }

    #[test]
    fn test_format_fixed_rounds_half_up() {
        assert_eq!(usdc(10_000_000).format_fixed(2), "10.00");
        assert_eq!(usdc(1_234_999).format_fixed(2), "1.23");
        assert_eq!(usdc(1_235_000).format_fixed(2), "1.24");
        assert_eq!(usdc(999_999_999).format_fixed(2), "1000.00");
        assert_eq!(Amount::new(U256::from(7u64), 0).format_fixed(2), "7.00");
    }

    #[test]
    fn test_format_saturates_on_extreme_values() {
        assert!(Amount::new(U256::MAX, 0).format_fixed(2).ends_with(".35"));
        assert_eq!(Amount::new(U256::MAX, 255).format_fixed(2), "0.01");
        assert_eq!(Amount::new(U256::MAX, 255).format(), "1");
    }

    #[test]
    fn test_ordering_uses_integer_form() {
        assert!(usdc(1_000_001) > usdc(1_000_000));
        assert!(Amount::zero(6).is_zero());
    }

    #[test]
    fn test_parse_positive_integer() {
        assert_eq!(parse_positive_integer("1").unwrap(), U256::from(1u64));
        assert_eq!(parse_positive_integer("  25 ").unwrap(), U256::from(25u64));
        assert_eq!(
            parse_positive_integer("10000000000").unwrap(),
            U256::from(10_000_000_000u64)
        );
    }

    #[test]
    fn test_parse_rejects_invalid_amounts() {
        for input in ["", "0", "000", "-1", "1.5", "1e3", "0x10", "abc", "+3", "1 000"] {
            assert!(
                matches!(
                    parse_positive_integer(input),
                    Err(ValidationError::InvalidAmount { .. })
                ),
                "accepted {input:?}"
            );
        }
    }
}
