//! Micro-USDC unit conversion
//!
//! All amounts cross the contract boundary as integers in the stablecoin's
//! smallest unit (6 decimals) and stay integral through every computation.
//! This module is the single place where amounts become display decimals,
//! so rounding cannot diverge between call sites.

use anyhow::{bail, Context, Result};
use ethers::types::U256;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

/// Amount in the stablecoin's smallest unit (10^-6 USDC)
pub type MicroUsdc = u64;

/// Decimal places of the settlement token
pub const USDC_DECIMALS: u32 = 6;

/// Smallest units per whole USDC
pub const MICRO_PER_USDC: u64 = 1_000_000;

/// Exact decimal view of a micro-USDC amount
pub fn to_decimal(amount: MicroUsdc) -> Decimal {
    Decimal::from_i128_with_scale(amount as i128, USDC_DECIMALS)
}

/// Render as a dollar string with two decimals, e.g. "$12.34"
pub fn format_usdc(amount: MicroUsdc) -> String {
    format!("${:.2}", to_decimal(amount))
}

/// Parse user input like "12.50" into micro-USDC.
///
/// More than 6 fractional digits is rejected rather than silently rounded.
pub fn parse_usdc(input: &str) -> Result<MicroUsdc> {
    let value: Decimal = input
        .trim()
        .trim_start_matches('$')
        .parse()
        .with_context(|| format!("Invalid USDC amount '{input}'"))?;
    if value.is_sign_negative() {
        bail!("USDC amount cannot be negative: '{input}'");
    }
    let scaled = value
        .checked_mul(Decimal::from(MICRO_PER_USDC))
        .context("USDC amount out of range")?;
    if scaled.fract() != Decimal::ZERO {
        bail!("USDC amount '{input}' has more than {USDC_DECIMALS} decimal places");
    }
    scaled
        .trunc()
        .to_u64()
        .with_context(|| format!("USDC amount '{input}' exceeds the representable range"))
}

/// Narrow a contract uint256 into micro-USDC
pub fn try_from_u256(value: U256) -> Result<MicroUsdc> {
    if value > U256::from(u64::MAX) {
        bail!("Amount {value} exceeds u64 micro-USDC range");
    }
    Ok(value.as_u64())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn decimal_view_is_exact() {
        assert_eq!(to_decimal(1_500_000), dec!(1.5));
        assert_eq!(to_decimal(1), dec!(0.000001));
        assert_eq!(to_decimal(0), dec!(0));
    }

    #[test]
    fn parse_accepts_dollar_prefix_and_fractions() {
        assert_eq!(parse_usdc("10").unwrap(), 10_000_000);
        assert_eq!(parse_usdc("$0.25").unwrap(), 250_000);
        assert_eq!(parse_usdc("12.345678").unwrap(), 12_345_678);
    }

    #[test]
    fn parse_rejects_bad_input() {
        assert!(parse_usdc("-1").is_err());
        assert!(parse_usdc("0.1234567").is_err());
        assert!(parse_usdc("not-a-number").is_err());
    }

    #[test]
    fn u256_narrowing_guards_overflow() {
        assert_eq!(try_from_u256(U256::from(42u64)).unwrap(), 42);
        assert!(try_from_u256(U256::MAX).is_err());
    }

    #[test]
    fn format_rounds_for_display_only() {
        assert_eq!(format_usdc(18_181_818), "$18.18");
        assert_eq!(format_usdc(20_000_000), "$20.00");
    }
}
