// src/math.rs
use alloy_primitives::{Uint, U256};

use crate::pool::ReserveState;
use crate::shared::errors::PricingError;
use crate::shared::types::{Amount, WAD};

const BPS: u64 = 10_000;

/// Holds a 256-bit amount times a 64-bit factor times another 256-bit amount
type Wide = Uint<768, 12>;

fn widen(value: U256) -> Wide {
    let mut limbs = [0u64; 12];
    limbs[..4].copy_from_slice(value.as_limbs());
    Wide::from_limbs(limbs)
}

fn narrow(value: Wide, context: &'static str) -> Result<U256, PricingError> {
    let limbs = value.as_limbs();
    if limbs[4..].iter().any(|limb| *limb != 0) {
        return Err(PricingError::Overflow(context));
    }
    Ok(U256::from_limbs([limbs[0], limbs[1], limbs[2], limbs[3]]))
}

fn wide_mul(a: Wide, b: Wide, context: &'static str) -> Result<Wide, PricingError> {
    a.checked_mul(b).ok_or(PricingError::Overflow(context))
}

fn wide_div(numerator: Wide, denominator: Wide, context: &'static str) -> Result<Wide, PricingError> {
    if denominator.is_zero() {
        return Err(PricingError::Overflow(context));
    }
    Ok(numerator / denominator)
}

/// floor(a * b / c); only the quotient has to fit in 256 bits
pub fn mul_div(a: U256, b: U256, c: U256, context: &'static str) -> Result<U256, PricingError> {
    mul_div_ratio(a, b, 1, c, 1, context)
}

/// floor(a * b * n / (c * d)) as a single division
pub fn mul_div_ratio(
    a: U256,
    b: U256,
    n: u64,
    c: U256,
    d: u64,
    context: &'static str,
) -> Result<U256, PricingError> {
    let numerator = wide_mul(wide_mul(widen(a), widen(b), context)?, Wide::from(n), context)?;
    let denominator = wide_mul(widen(c), Wide::from(d), context)?;
    narrow(wide_div(numerator, denominator, context)?, context)
}

fn check_fee(fee_numerator: u64, fee_denominator: u64) -> Result<(), PricingError> {
    if fee_denominator == 0 || fee_numerator == 0 || fee_numerator > fee_denominator {
        return Err(PricingError::InvalidFee {
            numerator: fee_numerator,
            denominator: fee_denominator,
        });
    }
    Ok(())
}

/// Output of a constant-product swap with a proportional input fee.
///
/// `amount_out = floor(amount_in * n * reserve_out / (reserve_in * d + amount_in * n))`
/// where `n/d` is the share of the input counted toward the price
/// (997/1000 for a 0.3% fee). The result is always strictly below
/// `reserve_out` when the pool holds any output asset, so it is defined for
/// every 256-bit input.
pub fn quote_output_for_input(
    amount_in: Amount,
    reserve_in: Amount,
    reserve_out: Amount,
    fee_numerator: u64,
    fee_denominator: u64,
) -> Result<Amount, PricingError> {
    if reserve_in.is_zero() {
        return Err(PricingError::InvalidReserve);
    }
    check_fee(fee_numerator, fee_denominator)?;

    let amount_in_with_fee = wide_mul(widen(amount_in), Wide::from(fee_numerator), "fee-adjusted input")?;
    let denominator = wide_mul(widen(reserve_in), Wide::from(fee_denominator), "swap denominator")?
        .checked_add(amount_in_with_fee)
        .ok_or(PricingError::Overflow("swap denominator"))?;
    let numerator = wide_mul(amount_in_with_fee, widen(reserve_out), "swap numerator")?;

    narrow(wide_div(numerator, denominator, "swap")?, "swap")
}

/// Input needed to take exactly `amount_out` out of the pool, rounded up
/// by one base unit so the resulting swap never under-delivers.
pub fn quote_input_for_output(
    amount_out: Amount,
    reserve_in: Amount,
    reserve_out: Amount,
    fee_numerator: u64,
    fee_denominator: u64,
) -> Result<Amount, PricingError> {
    if reserve_in.is_zero() {
        return Err(PricingError::InvalidReserve);
    }
    check_fee(fee_numerator, fee_denominator)?;
    if amount_out >= reserve_out {
        return Err(PricingError::InsufficientLiquidity {
            requested: amount_out,
            available: reserve_out,
        });
    }

    let needed = mul_div_ratio(
        reserve_in,
        amount_out,
        fee_denominator,
        reserve_out - amount_out,
        fee_numerator,
        "inverse quote",
    )?;
    needed
        .checked_add(U256::from(1u64))
        .ok_or(PricingError::Overflow("inverse quote"))
}

/// Fee-free reserve-ratio quote: `floor(amount * reserve_out / reserve_in)`.
pub fn spot_quote(amount: Amount, reserve_in: Amount, reserve_out: Amount) -> Result<Amount, PricingError> {
    if reserve_in.is_zero() {
        return Err(PricingError::InvalidReserve);
    }
    mul_div(amount, reserve_out, reserve_in, "spot quote")
}

/// Drop of the spot price (out per in) between two snapshots of the same
/// pool, in bps. Rising prices report 0.
pub fn price_impact_bps(before: &ReserveState, after: &ReserveState) -> Result<u64, PricingError> {
    if before.asset_in.is_zero() || after.asset_in.is_zero() {
        return Err(PricingError::InvalidReserve);
    }
    if before.asset_out.is_zero() {
        return Ok(0);
    }
    // kept = BPS * (after_out / after_in) / (before_out / before_in)
    let numerator = wide_mul(
        wide_mul(Wide::from(BPS), widen(after.asset_out), "price impact")?,
        widen(before.asset_in),
        "price impact",
    )?;
    let denominator = wide_mul(widen(after.asset_in), widen(before.asset_out), "price impact")?;
    let kept = wide_div(numerator, denominator, "price impact")?;
    if kept >= Wide::from(BPS) {
        return Ok(0);
    }
    Ok(BPS - kept.as_limbs()[0])
}

/// Collateral a lending pool demands for `borrow_amount`.
///
/// `reserves.asset_in` is the oracle pool's reserve of the borrowed asset and
/// `reserves.asset_out` its reserve of the collateral asset. The borrowed
/// amount is valued at the instantaneous reserve ratio with 1e18 precision,
/// then scaled by `multiplier_numerator / multiplier_denominator`.
pub fn required_collateral(
    borrow_amount: Amount,
    reserves: &ReserveState,
    multiplier_numerator: u64,
    multiplier_denominator: u64,
) -> Result<Amount, PricingError> {
    if multiplier_denominator == 0 {
        return Err(PricingError::InvalidMultiplier {
            numerator: multiplier_numerator,
            denominator: multiplier_denominator,
        });
    }
    if reserves.asset_in.is_zero() {
        return Err(PricingError::InvalidReserve);
    }

    // The 1e18-scaled quote is floored before the multiplier is applied.
    let scaled_borrow = wide_mul(widen(borrow_amount), widen(WAD), "collateral quote")?;
    let quote = wide_div(
        wide_mul(scaled_borrow, widen(reserves.asset_out), "collateral quote")?,
        widen(reserves.asset_in),
        "collateral quote",
    )?;
    let scale = wide_mul(widen(WAD), Wide::from(multiplier_denominator), "collateral scale")?;
    let deposit = wide_div(
        wide_mul(quote, Wide::from(multiplier_numerator), "collateral")?,
        scale,
        "collateral",
    )?;

    narrow(deposit, "collateral")
}
