// src/math.rs
//! Integer arithmetic for reserve bookkeeping.
//!
//! Reserves and liquidity are `u64`; every intermediate product is taken in
//! `u128`, which holds the product of any two `u64` values. All divisions
//! floor unless the function name says otherwise.

use crate::shared::errors::PoolError;

/// Basis points scale (10,000 bps = 100%)
pub const BPS_SCALE: u64 = 10_000;

/// `floor(a * b / denominator)`
pub fn mul_div_floor(a: u64, b: u64, denominator: u64) -> Result<u64, PoolError> {
    if denominator == 0 {
        return Err(PoolError::ArithmeticOverflow);
    }
    let quotient = (a as u128) * (b as u128) / denominator as u128;
    u64::try_from(quotient).map_err(|_| PoolError::ArithmeticOverflow)
}

/// `ceil(a * b / denominator)`
pub fn mul_div_ceil(a: u64, b: u64, denominator: u64) -> Result<u64, PoolError> {
    if denominator == 0 {
        return Err(PoolError::ArithmeticOverflow);
    }
    let product = (a as u128) * (b as u128);
    let denominator = denominator as u128;
    let quotient = product.div_ceil(denominator);
    u64::try_from(quotient).map_err(|_| PoolError::ArithmeticOverflow)
}

/// Constant product `reserve_a * reserve_b`, exact in `u128`
pub fn product(reserve_a: u64, reserve_b: u64) -> u128 {
    (reserve_a as u128) * (reserve_b as u128)
}

/// Input amount left after the swap fee: `floor(amount_in * (10000 - fee_bps) / 10000)`
pub fn apply_fee(amount_in: u64, fee_bps: u16) -> Result<u64, PoolError> {
    if fee_bps as u64 >= BPS_SCALE {
        return Err(PoolError::InvalidFee(fee_bps));
    }
    mul_div_floor(amount_in, BPS_SCALE - fee_bps as u64, BPS_SCALE)
}

/// Constant product output: `floor(amount_in * reserve_out / (reserve_in + amount_in))`
pub fn swap_output(amount_in: u64, reserve_in: u64, reserve_out: u64) -> Result<u64, PoolError> {
    let denominator = (reserve_in as u128) + (amount_in as u128);
    if denominator == 0 {
        return Err(PoolError::ArithmeticOverflow);
    }
    let amount_out = (amount_in as u128) * (reserve_out as u128) / denominator;
    u64::try_from(amount_out).map_err(|_| PoolError::ArithmeticOverflow)
}

/// Proportional share of a reserve for `units` out of `total_liquidity`
pub fn redeem_amounts(
    units: u64,
    reserve_a: u64,
    reserve_b: u64,
    total_liquidity: u64,
) -> Result<(u64, u64), PoolError> {
    Ok((
        mul_div_floor(units, reserve_a, total_liquidity)?,
        mul_div_floor(units, reserve_b, total_liquidity)?,
    ))
}
