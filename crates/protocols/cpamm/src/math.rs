//! Fixed-point Math
//!
//! Exact integer arithmetic for quotes. Amounts cross the API as `u64`
//! (the on-chain width); every product and quotient in between is a
//! `BigUint`, so nothing overflows until a result is narrowed back.

use num_bigint::BigUint;
use num_traits::{ToPrimitive, Zero};
use routekit_core::Percentage;
use thiserror::Error;

/// Arithmetic failures. Always fatal for the computation that hit them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MathError {
    #[error("Division by zero")]
    DivisionByZero,

    #[error("Result does not fit in a 64-bit amount")]
    Overflow,

    #[error("Result would be negative")]
    Underflow,

    #[error("Invariant violated: {context}")]
    InvariantViolated { context: &'static str },
}

/// Rounding direction for a division
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rounding {
    /// Toward zero (floor)
    Down,
    /// Toward positive infinity (ceiling)
    Up,
}

/// Which side of an amount a slippage bound protects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundDirection {
    /// Scale down: minimum received for exact-input trades
    Minimum,
    /// Scale up: maximum sold for exact-output trades
    Maximum,
}

impl BoundDirection {
    pub fn for_exact_input(amount_specified_is_input: bool) -> Self {
        if amount_specified_is_input {
            Self::Minimum
        } else {
            Self::Maximum
        }
    }
}

/// Narrow a big integer back to an amount
pub fn to_amount(value: &BigUint) -> Result<u64, MathError> {
    value.to_u64().ok_or(MathError::Overflow)
}

/// `numerator / denominator` with explicit rounding
pub fn div_round(
    numerator: &BigUint,
    denominator: &BigUint,
    rounding: Rounding,
) -> Result<BigUint, MathError> {
    if denominator.is_zero() {
        return Err(MathError::DivisionByZero);
    }
    let quotient = numerator / denominator;
    match rounding {
        Rounding::Down => Ok(quotient),
        Rounding::Up => {
            if (numerator % denominator).is_zero() {
                Ok(quotient)
            } else {
                Ok(quotient + 1u32)
            }
        }
    }
}

/// `a * b / denominator` over big integers
pub fn mul_div_big(
    a: &BigUint,
    b: &BigUint,
    denominator: &BigUint,
    rounding: Rounding,
) -> Result<BigUint, MathError> {
    div_round(&(a * b), denominator, rounding)
}

/// `a * b / denominator` for amounts
///
/// Fails with `DivisionByZero` on a zero denominator and `Overflow` when the
/// quotient is wider than 64 bits.
pub fn mul_div(a: u64, b: u64, denominator: u64, rounding: Rounding) -> Result<u64, MathError> {
    let result = mul_div_big(
        &BigUint::from(a),
        &BigUint::from(b),
        &BigUint::from(denominator),
        rounding,
    )?;
    to_amount(&result)
}

/// Portion of `amount` taken at `rate / denominator`, rounded down
pub fn apply_rate(amount: u64, rate: u64, denominator: u64) -> Result<u64, MathError> {
    mul_div(amount, rate, denominator, Rounding::Down)
}

/// Smallest gross amount that still nets `net` after `apply_rate` is
/// deducted from it.
///
/// For `g - floor(g * r / d) >= net` the least solution is
/// `floor((net - 1) * d / (d - r)) + 1`. That is never larger than the
/// gross amount a forward computation started from, which keeps exact-output
/// quotes from asking for more than an exact-input quote would have spent.
pub fn gross_up(net: u64, rate: u64, denominator: u64) -> Result<u64, MathError> {
    if rate > denominator {
        return Err(MathError::Underflow);
    }
    if rate == denominator {
        return Err(MathError::DivisionByZero);
    }
    if net == 0 || rate == 0 {
        return Ok(net);
    }
    let scaled = mul_div_big(
        &BigUint::from(net - 1),
        &BigUint::from(denominator),
        &BigUint::from(denominator - rate),
        Rounding::Down,
    )?;
    to_amount(&(scaled + 1u32))
}

/// Widen or narrow `amount` by a percentage, rounding against the taker.
///
/// `Minimum` returns `floor(amount * (1 - pct))`, `Maximum` returns
/// `ceil(amount * (1 + pct))`.
pub fn apply_percentage_bounds(
    amount: u64,
    percentage: &Percentage,
    direction: BoundDirection,
) -> Result<u64, MathError> {
    if percentage.exceeds_whole() && direction == BoundDirection::Minimum {
        return Err(MathError::Underflow);
    }
    if percentage.is_zero() {
        return Ok(amount);
    }
    let num = BigUint::from(percentage.numerator());
    let den = BigUint::from(percentage.denominator());
    let factor = match direction {
        BoundDirection::Minimum => &den - &num,
        BoundDirection::Maximum => &den + &num,
    };
    let rounding = match direction {
        BoundDirection::Minimum => Rounding::Down,
        BoundDirection::Maximum => Rounding::Up,
    };
    let result = mul_div_big(&BigUint::from(amount), &factor, &den, rounding)?;
    to_amount(&result)
}

/// Round a non-negative rational half-up to an integer
pub fn round_half_up(numerator: &BigUint, denominator: &BigUint) -> Result<BigUint, MathError> {
    if denominator.is_zero() {
        return Err(MathError::DivisionByZero);
    }
    let doubled: BigUint = numerator * 2u32 + denominator;
    Ok(doubled / (denominator * 2u32))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pct(n: u64, d: u64) -> Percentage {
        Percentage::new(n, d).unwrap()
    }

    #[test]
    fn test_mul_div_rounding() {
        assert_eq!(mul_div(10, 1, 3, Rounding::Down), Ok(3));
        assert_eq!(mul_div(10, 1, 3, Rounding::Up), Ok(4));
        assert_eq!(mul_div(9, 1, 3, Rounding::Up), Ok(3));
        assert_eq!(mul_div(0, 7, 5, Rounding::Up), Ok(0));
    }

    #[test]
    fn test_mul_div_wide_intermediate() {
        // u64::MAX * u64::MAX / u64::MAX does not overflow the intermediate
        assert_eq!(
            mul_div(u64::MAX, u64::MAX, u64::MAX, Rounding::Down),
            Ok(u64::MAX)
        );
    }

    #[test]
    fn test_mul_div_errors() {
        assert_eq!(
            mul_div(1, 1, 0, Rounding::Down),
            Err(MathError::DivisionByZero)
        );
        assert_eq!(
            mul_div(u64::MAX, 2, 1, Rounding::Down),
            Err(MathError::Overflow)
        );
    }

    #[test]
    fn test_apply_rate() {
        // 0.3% of 1e9
        assert_eq!(apply_rate(1_000_000_000, 3_000, 1_000_000), Ok(3_000_000));
        // 0.3% of 1001 floors to 3
        assert_eq!(apply_rate(1_001, 3_000, 1_000_000), Ok(3));
        assert_eq!(apply_rate(1_000, 0, 1_000_000), Ok(0));
    }

    #[test]
    fn test_gross_up_is_least_preimage() {
        let d = 1_000;
        let r = 3;
        for gross in 1..5_000u64 {
            let net = gross - apply_rate(gross, r, d).unwrap();
            let least = gross_up(net, r, d).unwrap();
            assert!(least <= gross, "gross {} net {} least {}", gross, net, least);
            assert!(least - apply_rate(least, r, d).unwrap() >= net);
            if least > 1 {
                let below = least - 1;
                assert!(below - apply_rate(below, r, d).unwrap() < net);
            }
        }
    }

    #[test]
    fn test_gross_up_edges() {
        assert_eq!(gross_up(0, 3_000, 1_000_000), Ok(0));
        assert_eq!(gross_up(500, 0, 1_000_000), Ok(500));
        assert_eq!(
            gross_up(500, 1_000_000, 1_000_000),
            Err(MathError::DivisionByZero)
        );
        assert_eq!(gross_up(500, 1_000_001, 1_000_000), Err(MathError::Underflow));
        // 1001 nets 998 at 0.3%: the naive ceil(998 / 0.997) = 1002 overshoots
        assert_eq!(gross_up(998, 3, 1_000), Ok(1_001));
    }

    #[test]
    fn test_percentage_bounds_zero_tolerance() {
        let zero = Percentage::zero();
        assert_eq!(
            apply_percentage_bounds(12_345, &zero, BoundDirection::Minimum),
            Ok(12_345)
        );
        assert_eq!(
            apply_percentage_bounds(12_345, &zero, BoundDirection::Maximum),
            Ok(12_345)
        );
    }

    #[test]
    fn test_percentage_bounds_full_tolerance() {
        assert_eq!(
            apply_percentage_bounds(12_345, &pct(100, 100), BoundDirection::Minimum),
            Ok(0)
        );
        assert_eq!(
            apply_percentage_bounds(12_345, &pct(100, 100), BoundDirection::Maximum),
            Ok(24_690)
        );
    }

    #[test]
    fn test_percentage_bounds_round_against_taker() {
        // 10% of 1005: min floors 904.5 -> 904, max ceils 1105.5 -> 1106
        assert_eq!(
            apply_percentage_bounds(1_005, &pct(10, 100), BoundDirection::Minimum),
            Ok(904)
        );
        assert_eq!(
            apply_percentage_bounds(1_005, &pct(10, 100), BoundDirection::Maximum),
            Ok(1_106)
        );
    }

    #[test]
    fn test_percentage_bounds_errors() {
        assert_eq!(
            apply_percentage_bounds(10, &pct(101, 100), BoundDirection::Minimum),
            Err(MathError::Underflow)
        );
        assert_eq!(
            apply_percentage_bounds(u64::MAX, &pct(1, 100), BoundDirection::Maximum),
            Err(MathError::Overflow)
        );
    }

    #[test]
    fn test_bound_direction_for_mode() {
        assert_eq!(BoundDirection::for_exact_input(true), BoundDirection::Minimum);
        assert_eq!(BoundDirection::for_exact_input(false), BoundDirection::Maximum);
    }

    #[test]
    fn test_round_half_up() {
        let r = |n: u32, d: u32| round_half_up(&BigUint::from(n), &BigUint::from(d)).unwrap();
        assert_eq!(r(5, 2), BigUint::from(3u32));
        assert_eq!(r(7, 3), BigUint::from(2u32));
        assert_eq!(r(0, 3), BigUint::from(0u32));
        assert!(round_half_up(&BigUint::from(1u32), &BigUint::zero()).is_err());
    }
}
