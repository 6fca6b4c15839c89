//! Fixed-point conversion between decimal amount strings and integer base
//! units. Fractional digits beyond the target precision are truncated, never
//! rounded.

use crate::error::X402Error;
use ethers::types::U256;

pub const NATIVE_DECIMALS: u32 = 18;

/// Allowed deviation between required and observed amount, in 18-decimal
/// base units (0.001 of a whole unit).
pub fn amount_tolerance() -> U256 {
    U256::exp10(15)
}

/// Largest exponent for which `10^n` fits in a `U256`.
const MAX_DECIMALS: u32 = 77;

fn pow10(decimals: u32) -> Option<U256> {
    (decimals <= MAX_DECIMALS).then(|| U256::exp10(decimals as usize))
}

pub fn parse_amount_to_wei(amount: &str, decimals: u32) -> Result<U256, X402Error> {
    let invalid = || X402Error::InvalidAmount(amount.to_string());

    let trimmed = amount.trim();
    let (whole, fraction) = trimmed.split_once('.').unwrap_or((trimmed, ""));
    if whole.is_empty() && fraction.is_empty() {
        return Err(invalid());
    }
    let digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
    if !digits(whole) || !digits(fraction) {
        return Err(invalid());
    }

    let scale = pow10(decimals).ok_or_else(invalid)?;
    let width = decimals as usize;
    let mut fraction = fraction[..fraction.len().min(width)].to_string();
    while fraction.len() < width {
        fraction.push('0');
    }

    let whole = if whole.is_empty() {
        U256::zero()
    } else {
        U256::from_dec_str(whole).map_err(|_| invalid())?
    };
    let fraction = if fraction.is_empty() {
        U256::zero()
    } else {
        U256::from_dec_str(&fraction).map_err(|_| invalid())?
    };

    whole
        .checked_mul(scale)
        .and_then(|scaled| scaled.checked_add(fraction))
        .ok_or_else(invalid)
}

/// Minimal decimal rendering: no trailing fractional zeros, no point when
/// the remainder is zero.
pub fn wei_to_token_units(value: U256, decimals: u32) -> String {
    let Some(scale) = pow10(decimals) else {
        return value.to_string();
    };
    if decimals == 0 {
        return value.to_string();
    }

    let (whole, remainder) = value.div_mod(scale);
    if remainder.is_zero() {
        return whole.to_string();
    }

    let fraction = format!("{:0>width$}", remainder.to_string(), width = decimals as usize);
    format!("{}.{}", whole, fraction.trim_end_matches('0'))
}

/// Tolerance rescaled to a token's own precision.
pub fn tolerance_for_decimals(decimals: u32) -> U256 {
    let base = amount_tolerance();
    if decimals <= NATIVE_DECIMALS {
        pow10(NATIVE_DECIMALS - decimals)
            .map(|divisor| base / divisor)
            .unwrap_or_default()
    } else {
        pow10(decimals - NATIVE_DECIMALS)
            .and_then(|factor| base.checked_mul(factor))
            .unwrap_or(U256::MAX)
    }
}

pub fn within_tolerance(actual: U256, required: U256, tolerance: U256) -> bool {
    let diff = if actual > required {
        actual - required
    } else {
        required - actual
    };
    diff <= tolerance
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_whole_and_fractional_amounts() {
        assert_eq!(
            parse_amount_to_wei("1", 18).unwrap(),
            U256::from_dec_str("1000000000000000000").unwrap()
        );
        assert_eq!(
            parse_amount_to_wei("0.001", 18).unwrap(),
            U256::from(1_000_000_000_000_000u64)
        );
        assert_eq!(parse_amount_to_wei("1.5", 6).unwrap(), U256::from(1_500_000u64));
        assert_eq!(parse_amount_to_wei(".25", 2).unwrap(), U256::from(25u64));
        assert_eq!(parse_amount_to_wei("7", 0).unwrap(), U256::from(7u64));
    }

    #[test]
    fn truncates_excess_fraction_digits() {
        assert_eq!(parse_amount_to_wei("0.1234569", 6).unwrap(), U256::from(123_456u64));
        assert_eq!(parse_amount_to_wei("2.999", 0).unwrap(), U256::from(2u64));
    }

    #[test]
    fn rejects_malformed_amounts() {
        for bad in ["", ".", "-1", "1.2.3", "abc", "1e18", "0x10"] {
            assert!(parse_amount_to_wei(bad, 18).is_err(), "accepted {bad:?}");
        }
        assert!(parse_amount_to_wei("1", 78).is_err());
    }

    #[test]
    fn renders_minimal_decimal_strings() {
        assert_eq!(wei_to_token_units(U256::exp10(18), 18), "1");
        assert_eq!(wei_to_token_units(U256::from(1_500_000u64), 6), "1.5");
        assert_eq!(wei_to_token_units(U256::from(1_000u64), 6), "0.001");
        assert_eq!(wei_to_token_units(U256::zero(), 6), "0");
        assert_eq!(wei_to_token_units(U256::from(42u64), 0), "42");
    }

    #[test]
    fn canonical_round_trip() {
        let cases = [
            ("1.5", "1.5"),
            ("1.50", "1.5"),
            ("1", "1"),
            ("0.010", "0.01"),
            ("12.000", "12"),
        ];
        for decimals in [6, 18] {
            for (input, canonical) in cases {
                let wei = parse_amount_to_wei(input, decimals).unwrap();
                assert_eq!(wei_to_token_units(wei, decimals), canonical);
            }
        }
    }

    #[test]
    fn tolerance_scales_with_decimals() {
        assert_eq!(tolerance_for_decimals(18), U256::exp10(15));
        assert_eq!(tolerance_for_decimals(6), U256::from(1_000u64));
        assert_eq!(tolerance_for_decimals(2), U256::zero());
        assert_eq!(tolerance_for_decimals(20), U256::exp10(17));
    }

    #[test]
    fn tolerance_boundary_is_inclusive() {
        let required = U256::exp10(18);
        let tol = amount_tolerance();
        assert!(within_tolerance(required + tol, required, tol));
        assert!(within_tolerance(required - tol, required, tol));
        assert!(!within_tolerance(required + tol + 1, required, tol));
    }
}
