//! Decimal scaling between a token's native units and the 18-decimal fixed
//! point the fee registry works in.

use num_bigint::BigUint;

use crate::error::ConfigError;

pub const FIXED_POINT_DECIMALS: u8 = 18;

fn scale_factor(symbol: &str, decimals: u8) -> Result<BigUint, ConfigError> {
    if decimals > FIXED_POINT_DECIMALS {
        return Err(ConfigError::UnsupportedDecimals {
            symbol: symbol.to_string(),
            decimals,
        });
    }
    Ok(BigUint::from(10u32).pow(u32::from(FIXED_POINT_DECIMALS - decimals)))
}

/// `amount * 10^(18 - decimals)`.
pub fn to_fixed_point(amount: &BigUint, decimals: u8, symbol: &str) -> Result<BigUint, ConfigError> {
    Ok(amount * scale_factor(symbol, decimals)?)
}

/// Inverse of [`to_fixed_point`]; any sub-unit remainder is truncated.
pub fn from_fixed_point(amount: &BigUint, decimals: u8, symbol: &str) -> Result<BigUint, ConfigError> {
    Ok(amount / scale_factor(symbol, decimals)?)
}

/// Parse a human decimal string like `"1.5"` into native units.
///
/// Fractional digits beyond `decimals` are rejected rather than rounded.
pub fn ui_to_native(value: &str, decimals: u8) -> Result<BigUint, ConfigError> {
    let value = value.trim();
    let invalid = || ConfigError::InvalidAmount(value.to_string());

    let (integer, fraction) = match value.split_once('.') {
        Some((i, f)) => (i, f),
        None => (value, ""),
    };
    if integer.is_empty() && fraction.is_empty() {
        return Err(invalid());
    }
    if !integer.chars().chain(fraction.chars()).all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }

    let fraction = fraction.trim_end_matches('0');
    let decimals = decimals as usize;
    if fraction.len() > decimals {
        return Err(invalid());
    }

    let mut digits = String::with_capacity(integer.len() + decimals);
    digits.push_str(integer);
    digits.push_str(fraction);
    digits.push_str(&"0".repeat(decimals - fraction.len()));

    if digits.is_empty() {
        return Ok(BigUint::default());
    }
    BigUint::parse_bytes(digits.as_bytes(), 10).ok_or_else(invalid)
}

/// Format a native amount with `decimals` decimal places, trimming trailing
/// zeros: `format_units(1_500_000, 6) == "1.5"`.
pub fn format_units(amount: &BigUint, decimals: u8) -> String {
    let s = amount.to_string();
    let decimals = decimals as usize;

    if decimals == 0 {
        return s;
    }

    if s.len() <= decimals {
        let zeros = decimals - s.len();
        let mut result = String::from("0.");
        result.push_str(&"0".repeat(zeros));
        result.push_str(&s);
        let trimmed = result.trim_end_matches('0');
        if trimmed.ends_with('.') {
            return format!("{trimmed}0");
        }
        return trimmed.to_string();
    }

    let (integer_part, decimal_part) = s.split_at(s.len() - decimals);
    let trimmed = decimal_part.trim_end_matches('0');
    if trimmed.is_empty() {
        integer_part.to_string()
    } else {
        format!("{integer_part}.{trimmed}")
    }
}
