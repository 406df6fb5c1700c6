//! Common amount types and unit conversions

use alloy_primitives::U256;

use crate::shared::errors::PricingError;

/// Token amount in base units (wei for 18-decimal assets)
pub type Amount = U256;

/// 1e18, the fixed-point scale used by the lending pools
pub const WAD: U256 = U256::from_limbs([1_000_000_000_000_000_000, 0, 0, 0]);

pub const ETHER_DECIMALS: u8 = 18;
pub const GWEI_DECIMALS: u8 = 9;

/// 10^decimals as a U256
pub fn ten_pow(decimals: u8) -> U256 {
    let ten = U256::from(10u64);
    (0..decimals).fold(U256::from(1u64), |acc, _| acc * ten)
}

/// Parse a textual amount into base units.
///
/// Accepts plain integers (`"1000"`, taken as wei), `0x` hex, and decimal
/// values with a unit suffix (`"10 ether"`, `"1.5gwei"`, `"7 wei"`).
pub fn parse_amount(input: &str) -> Result<Amount, PricingError> {
    let raw = input.trim();
    if raw.is_empty() {
        return Err(PricingError::InvalidAmount("empty amount".to_string()));
    }
    if raw.starts_with('-') {
        return Err(PricingError::InvalidAmount(format!("negative amount {}", raw)));
    }

    if let Some(hex) = raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        return U256::from_str_radix(hex, 16)
            .map_err(|e| PricingError::InvalidAmount(format!("{}: {}", raw, e)));
    }

    let lower = raw.to_ascii_lowercase();
    let (number, decimals) = if let Some(n) = lower.strip_suffix("ether") {
        (n.trim(), ETHER_DECIMALS)
    } else if let Some(n) = lower.strip_suffix("gwei") {
        (n.trim(), GWEI_DECIMALS)
    } else if let Some(n) = lower.strip_suffix("wei") {
        (n.trim(), 0)
    } else {
        (lower.as_str(), 0)
    };

    parse_units(number, decimals)
}

/// Parse a decimal string scaled by `10^decimals`.
pub fn parse_units(number: &str, decimals: u8) -> Result<Amount, PricingError> {
    let invalid = |why: &str| PricingError::InvalidAmount(format!("{}: {}", number, why));

    let (whole, frac) = match number.split_once('.') {
        Some((w, f)) => (w, f),
        None => (number, ""),
    };
    if whole.is_empty() && frac.is_empty() {
        return Err(invalid("no digits"));
    }
    if !whole.chars().chain(frac.chars()).all(|c| c.is_ascii_digit()) {
        return Err(invalid("not a decimal number"));
    }
    if frac.len() > decimals as usize {
        return Err(invalid("more fractional digits than the unit allows"));
    }

    let mut value = U256::ZERO;
    let ten = U256::from(10u64);
    let padded = format!("{}{:0<width$}", whole, frac, width = decimals as usize);
    for digit in padded.bytes() {
        value = value
            .checked_mul(ten)
            .and_then(|v| v.checked_add(U256::from(digit - b'0')))
            .ok_or_else(|| invalid("exceeds 256 bits"))?;
    }
    Ok(value)
}

/// Render base units as a trimmed decimal string, e.g. `19.6643298887982`.
pub fn format_units(amount: Amount, decimals: u8) -> String {
    let scale = ten_pow(decimals);
    let whole = amount / scale;
    let frac = amount % scale;
    if frac.is_zero() {
        return whole.to_string();
    }
    let frac = format!("{:0>width$}", frac.to_string(), width = decimals as usize);
    format!("{}.{}", whole, frac.trim_end_matches('0'))
}

pub fn format_ether(amount: Amount) -> String {
    format_units(amount, ETHER_DECIMALS)
}

/// Shorthand for `n` whole 18-decimal tokens
pub fn ether(n: u64) -> Amount {
    U256::from(n) * WAD
}
