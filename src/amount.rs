//! Fixed-point token amounts

use alloy_primitives::U256;

/// Decimal places of the tracked token
pub const TOKEN_DECIMALS: u8 = 18;

/// Convert a raw 18-decimal token amount into a human-readable quantity
pub fn from_wei(raw: U256) -> f64 {
    let scale = U256::from(10u64).pow(U256::from(TOKEN_DECIMALS));
    let (whole, fraction) = raw.div_rem(scale);

    // whole may exceed u128 for absurd supplies; the decimal string always parses
    let whole = whole.to_string().parse::<f64>().unwrap_or(f64::MAX);
    let fraction = fraction.to::<u128>() as f64 / 1e18;
    whole + fraction
}
