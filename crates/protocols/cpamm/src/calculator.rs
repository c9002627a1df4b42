//! AMM Calculator
//!
//! Single-hop swap math using the constant product formula (x * y = k),
//! with the trade fee and transfer tax deducted around the curve.

use num_bigint::BigUint;
use routekit_core::Asset;

use crate::constants::fees::FEE_RATE_DENOMINATOR;
use crate::math::{apply_rate, div_round, gross_up, to_amount, MathError, Rounding};
use crate::state::{AmmError, PoolOperation, PoolSnapshot, SwapBreakdown, SwapQuote};

/// Curve output for an input that has already paid its fee.
///
/// Formula: output = reserve_out * amount_after_fee / (reserve_in + amount_after_fee)
pub fn calculate_output(
    reserve_in: u64,
    reserve_out: u64,
    amount_after_fee: u64,
) -> Result<u64, AmmError> {
    if reserve_in == 0 || reserve_out == 0 {
        return Err(AmmError::InsufficientLiquidity);
    }
    // The pool's vault must still fit a u64 after the deposit.
    let new_reserve_in = reserve_in
        .checked_add(amount_after_fee)
        .ok_or(AmmError::InsufficientLiquidity)?;

    let numerator = BigUint::from(reserve_out) * BigUint::from(amount_after_fee);
    let output = div_round(&numerator, &BigUint::from(new_reserve_in), Rounding::Down)?;
    let output = to_amount(&output)?;

    if output >= reserve_out {
        return Err(AmmError::InsufficientLiquidity);
    }
    check_constant_product(reserve_in, reserve_out, new_reserve_in, reserve_out - output)?;
    Ok(output)
}

/// Least post-fee input whose curve output reaches `output`.
///
/// Formula: input = ceil(reserve_in * output / (reserve_out - output))
pub fn calculate_input(reserve_in: u64, reserve_out: u64, output: u64) -> Result<u64, AmmError> {
    if reserve_in == 0 || reserve_out == 0 {
        return Err(AmmError::InsufficientLiquidity);
    }
    if output >= reserve_out {
        // Can't take the whole reserve
        return Err(AmmError::InsufficientLiquidity);
    }
    let numerator = BigUint::from(reserve_in) * BigUint::from(output);
    let input = div_round(&numerator, &BigUint::from(reserve_out - output), Rounding::Up)?;
    let input = to_amount(&input).map_err(|_| AmmError::InsufficientLiquidity)?;
    if reserve_in.checked_add(input).is_none() {
        return Err(AmmError::InsufficientLiquidity);
    }
    Ok(input)
}

/// The product of reserves must never shrink across a swap.
fn check_constant_product(
    reserve_in: u64,
    reserve_out: u64,
    new_reserve_in: u64,
    new_reserve_out: u64,
) -> Result<(), MathError> {
    let before = BigUint::from(reserve_in) * BigUint::from(reserve_out);
    let after = BigUint::from(new_reserve_in) * BigUint::from(new_reserve_out);
    if after < before {
        return Err(MathError::InvariantViolated {
            context: "constant product decreased",
        });
    }
    Ok(())
}

/// Fees charged on `amount_after_tax`, returned with the amount left for the curve
fn deduct_fees(pool: &PoolSnapshot, amount_after_tax: u64) -> Result<(u64, SwapBreakdown), AmmError> {
    let fees = &pool.fees;
    let total_fee = apply_rate(amount_after_tax, fees.total_rate(), FEE_RATE_DENOMINATOR)?;
    let trade_fee = apply_rate(amount_after_tax, fees.trade_fee_rate, FEE_RATE_DENOMINATOR)?;
    let breakdown = SwapBreakdown {
        trade_fee,
        protocol_fee: apply_rate(trade_fee, fees.protocol_fee_rate, FEE_RATE_DENOMINATOR)?,
        fund_fee: apply_rate(trade_fee, fees.fund_fee_rate, FEE_RATE_DENOMINATOR)?,
        lp_fee: total_fee.saturating_sub(trade_fee),
        ..SwapBreakdown::default()
    };
    let amount_after_fee = amount_after_tax
        .checked_sub(total_fee)
        .ok_or(MathError::Underflow)?;
    Ok((amount_after_fee, breakdown))
}

struct ForwardSwap {
    amount_out: u64,
    breakdown: SwapBreakdown,
}

/// Exact-input pipeline: inbound tax, fees, curve, outbound tax.
fn swap_forward(
    pool: &PoolSnapshot,
    input: &Asset,
    output: &Asset,
    reserve_in: u64,
    reserve_out: u64,
    amount_in: u64,
) -> Result<ForwardSwap, AmmError> {
    let in_tax = apply_rate(amount_in, pool.in_tax_rate_for(input), FEE_RATE_DENOMINATOR)?;
    let amount_after_tax = amount_in.checked_sub(in_tax).ok_or(MathError::Underflow)?;

    let (amount_after_fee, mut breakdown) = deduct_fees(pool, amount_after_tax)?;
    if amount_after_fee == 0 {
        return Err(AmmError::InsufficientLiquidity);
    }

    let gross_out = calculate_output(reserve_in, reserve_out, amount_after_fee)?;
    let out_tax = apply_rate(gross_out, pool.out_tax_rate_for(output), FEE_RATE_DENOMINATOR)?;
    let amount_out = gross_out.checked_sub(out_tax).ok_or(MathError::Underflow)?;
    if amount_out == 0 {
        return Err(AmmError::InsufficientLiquidity);
    }

    breakdown.in_tax = in_tax;
    breakdown.out_tax = out_tax;
    Ok(ForwardSwap {
        amount_out,
        breakdown,
    })
}

/// Gross up through a rate the pool charges; a 100% rate can never be met.
fn gross_up_checked(net: u64, rate: u64) -> Result<u64, AmmError> {
    if rate >= FEE_RATE_DENOMINATOR {
        return Err(AmmError::InsufficientLiquidity);
    }
    gross_up(net, rate, FEE_RATE_DENOMINATOR).map_err(|e| match e {
        MathError::Overflow => AmmError::InsufficientLiquidity,
        other => AmmError::Arithmetic(other),
    })
}

/// Exact-output pipeline, inverted: every step takes the least amount that
/// still satisfies the step after it.
fn swap_backward(
    pool: &PoolSnapshot,
    input: &Asset,
    output: &Asset,
    reserve_in: u64,
    reserve_out: u64,
    amount_out: u64,
) -> Result<u64, AmmError> {
    let gross_out = gross_up_checked(amount_out, pool.out_tax_rate_for(output))?;
    if gross_out >= reserve_out {
        return Err(AmmError::InsufficientLiquidity);
    }
    let amount_after_fee = calculate_input(reserve_in, reserve_out, gross_out)?;
    let amount_after_tax = gross_up_checked(amount_after_fee, pool.fees.total_rate())?;
    gross_up_checked(amount_after_tax, pool.in_tax_rate_for(input))
}

/// Quote one swap through `pool`.
///
/// With `amount_specified_is_input` the taker sells exactly
/// `specified_amount` of `input_asset`; otherwise the taker receives exactly
/// `specified_amount` of the other asset and the quote reports the input
/// required for it. Snapshots that fail `PoolSnapshot::validate` are
/// rejected with `InvalidPool`.
pub fn quote_swap(
    pool: &PoolSnapshot,
    input_asset: &Asset,
    specified_amount: u64,
    amount_specified_is_input: bool,
) -> Result<SwapQuote, AmmError> {
    pool.validate()?;
    let output_asset = pool
        .other_asset(input_asset)
        .ok_or_else(|| AmmError::InvalidAsset(input_asset.to_string()))?;
    if !pool.is_enabled(PoolOperation::Swap) {
        return Err(AmmError::PoolDisabled {
            pool_id: pool.pool_id.to_string(),
            operation: PoolOperation::Swap,
        });
    }
    if specified_amount == 0 {
        return Err(AmmError::InvalidAmount(
            "swap amount must be positive".to_string(),
        ));
    }
    let (reserve_in, reserve_out) = pool
        .reserves_for(input_asset)
        .ok_or_else(|| AmmError::InvalidAsset(input_asset.to_string()))?;
    if reserve_in == 0 || reserve_out == 0 {
        return Err(AmmError::InsufficientLiquidity);
    }

    let (amount_in, amount_out, breakdown) = if amount_specified_is_input {
        let forward = swap_forward(
            pool,
            input_asset,
            &output_asset,
            reserve_in,
            reserve_out,
            specified_amount,
        )?;
        (specified_amount, forward.amount_out, forward.breakdown)
    } else {
        let amount_in = swap_backward(
            pool,
            input_asset,
            &output_asset,
            reserve_in,
            reserve_out,
            specified_amount,
        )?;
        // Replay forward so the breakdown matches what the pool will charge.
        let forward = swap_forward(
            pool,
            input_asset,
            &output_asset,
            reserve_in,
            reserve_out,
            amount_in,
        )?;
        if forward.amount_out < specified_amount {
            return Err(MathError::InvariantViolated {
                context: "exact-output input does not cover the requested output",
            }
            .into());
        }
        (amount_in, specified_amount, forward.breakdown)
    };

    Ok(SwapQuote {
        pool_id: pool.pool_id,
        input_asset: *input_asset,
        output_asset,
        amount_in,
        amount_out,
        amount_specified_is_input,
        breakdown,
    })
}
