//! Liquidity Quotes
//!
//! Proportional deposit and withdrawal amounts against current reserves and
//! LP supply.

use routekit_core::{Asset, Percentage};

use crate::math::{apply_percentage_bounds, mul_div, BoundDirection, Rounding};
use crate::state::{AmmError, DepositQuote, PoolOperation, PoolSnapshot, WithdrawQuote};

fn ensure_enabled(pool: &PoolSnapshot, operation: PoolOperation) -> Result<(), AmmError> {
    if pool.is_enabled(operation) {
        Ok(())
    } else {
        Err(AmmError::PoolDisabled {
            pool_id: pool.pool_id.to_string(),
            operation,
        })
    }
}

/// Quote a deposit of `input_amount` of `input_asset`.
///
/// other_amount = ceil(input * other_reserve / input_reserve)
/// lp_amount    = floor(input * lp_supply / input_reserve)
///
/// The other side rounds up so the ratio is preserved; LP units round down so
/// existing holders are not diluted. `other_amount` is widened by `slippage`.
pub fn get_deposit_quote(
    pool: &PoolSnapshot,
    input_amount: u64,
    input_asset: &Asset,
    slippage: &Percentage,
) -> Result<DepositQuote, AmmError> {
    pool.validate()?;
    let (input_reserve, other_reserve) = pool
        .reserves_for(input_asset)
        .ok_or_else(|| AmmError::InvalidAsset(input_asset.to_string()))?;
    ensure_enabled(pool, PoolOperation::Deposit)?;
    if input_amount == 0 {
        return Err(AmmError::InvalidAmount(
            "deposit amount must be positive".to_string(),
        ));
    }
    // First deposit belongs to pool creation
    if pool.lp_supply == 0 || input_reserve == 0 || other_reserve == 0 {
        return Err(AmmError::ZeroLiquidity);
    }

    let expected_other_amount = mul_div(input_amount, other_reserve, input_reserve, Rounding::Up)?;
    let lp_amount = mul_div(input_amount, pool.lp_supply, input_reserve, Rounding::Down)?;
    let other_amount =
        apply_percentage_bounds(expected_other_amount, slippage, BoundDirection::Maximum)?;

    Ok(DepositQuote {
        pool_id: pool.pool_id,
        input_asset: *input_asset,
        input_amount,
        expected_other_amount,
        other_amount,
        lp_amount,
    })
}

/// Quote burning `lp_amount` LP units.
///
/// amountN = floor(lp_amount * reserveN / lp_supply), then narrowed by
/// `slippage` into the minimum the withdrawer accepts.
pub fn get_withdraw_quote(
    pool: &PoolSnapshot,
    lp_amount: u64,
    slippage: &Percentage,
) -> Result<WithdrawQuote, AmmError> {
    pool.validate()?;
    ensure_enabled(pool, PoolOperation::Withdraw)?;
    if lp_amount == 0 {
        return Err(AmmError::InvalidAmount(
            "withdraw amount must be positive".to_string(),
        ));
    }
    if pool.lp_supply == 0 {
        return Err(AmmError::ZeroLiquidity);
    }
    if lp_amount > pool.lp_supply {
        return Err(AmmError::InsufficientLiquidity);
    }

    let expected_amount0 = mul_div(lp_amount, pool.reserve0, pool.lp_supply, Rounding::Down)?;
    let expected_amount1 = mul_div(lp_amount, pool.reserve1, pool.lp_supply, Rounding::Down)?;

    Ok(WithdrawQuote {
        pool_id: pool.pool_id,
        withdraw_amount: lp_amount,
        expected_amount0,
        expected_amount1,
        min_amount0_out: apply_percentage_bounds(
            expected_amount0,
            slippage,
            BoundDirection::Minimum,
        )?,
        min_amount1_out: apply_percentage_bounds(
            expected_amount1,
            slippage,
            BoundDirection::Minimum,
        )?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{FeeSchedule, PoolStatus, TaxConfig};
    use routekit_core::PoolId;

    fn asset(b: u8) -> Asset {
        Asset::from_bytes([b; 32])
    }

    fn make_pool(reserve0: u64, reserve1: u64, lp_supply: u64) -> PoolSnapshot {
        PoolSnapshot {
            pool_id: PoolId::from_bytes([0xbb; 32]),
            asset0: asset(1),
            asset1: asset(2),
            reserve0,
            reserve1,
            fees: FeeSchedule::new(3_000),
            tax: TaxConfig::default(),
            status: PoolStatus::default(),
            lp_supply,
            open_time: 0,
        }
    }

    #[test]
    fn test_deposit_quote_proportional() {
        let pool = make_pool(100_000_000_000, 10_000_000, 5_000);
        let quote =
            get_deposit_quote(&pool, 10_000_000_000, &asset(1), &Percentage::zero()).unwrap();
        assert_eq!(quote.expected_other_amount, 1_000_000);
        assert_eq!(quote.other_amount, 1_000_000);
        assert_eq!(quote.lp_amount, 500);
    }

    #[test]
    fn test_deposit_quote_from_other_side() {
        let pool = make_pool(100_000_000_000, 10_000_000, 5_000);
        let quote =
            get_deposit_quote(&pool, 1_000_000, &asset(2), &Percentage::zero()).unwrap();
        assert_eq!(quote.expected_other_amount, 10_000_000_000);
        assert_eq!(quote.lp_amount, 500);
    }

    #[test]
    fn test_deposit_quote_rounding_and_slippage() {
        let pool = make_pool(3_000, 1_000, 7);
        let slippage = Percentage::new(10, 100).unwrap();
        let quote = get_deposit_quote(&pool, 100, &asset(1), &slippage).unwrap();
        // 100 * 1000 / 3000 = 33.3 -> 34, lp 100 * 7 / 3000 = 0.23 -> 0
        assert_eq!(quote.expected_other_amount, 34);
        assert_eq!(quote.lp_amount, 0);
        // 34 * 1.1 = 37.4 -> 38
        assert_eq!(quote.other_amount, 38);
    }

    #[test]
    fn test_deposit_quote_errors() {
        let pool = make_pool(1_000, 1_000, 0);
        assert!(matches!(
            get_deposit_quote(&pool, 10, &asset(1), &Percentage::zero()),
            Err(AmmError::ZeroLiquidity)
        ));

        let pool = make_pool(1_000, 1_000, 10);
        assert!(matches!(
            get_deposit_quote(&pool, 10, &asset(3), &Percentage::zero()),
            Err(AmmError::InvalidAsset(_))
        ));
        assert!(matches!(
            get_deposit_quote(&pool, 0, &asset(1), &Percentage::zero()),
            Err(AmmError::InvalidAmount(_))
        ));

        let mut pool = make_pool(1_000, 1_000, 10);
        pool.status = PoolStatus(PoolStatus::DEPOSIT_DISABLED);
        assert!(matches!(
            get_deposit_quote(&pool, 10, &asset(1), &Percentage::zero()),
            Err(AmmError::PoolDisabled {
                operation: PoolOperation::Deposit,
                ..
            })
        ));
    }

    #[test]
    fn test_liquidity_quotes_reject_invalid_snapshot() {
        let mut pool = make_pool(1_000, 1_000, 10);
        pool.fees.trade_fee_rate = 1_500_000;
        assert!(matches!(
            get_deposit_quote(&pool, 10, &asset(1), &Percentage::zero()),
            Err(AmmError::InvalidPool { .. })
        ));
        assert!(matches!(
            get_withdraw_quote(&pool, 1, &Percentage::zero()),
            Err(AmmError::InvalidPool { .. })
        ));
    }

    #[test]
    fn test_withdraw_quote_shares() {
        let pool = make_pool(100_000_000_000, 10_000_000, 5_000);
        let quote = get_withdraw_quote(&pool, 500, &Percentage::zero()).unwrap();
        assert_eq!(quote.expected_amount0, 10_000_000_000);
        assert_eq!(quote.expected_amount1, 1_000_000);
        assert_eq!(quote.min_amount0_out, 10_000_000_000);
        assert_eq!(quote.withdraw_amount, 500);
    }

    #[test]
    fn test_withdraw_quote_slippage_narrows() {
        let pool = make_pool(100_000_000_000, 10_000_000, 5_000);
        let slippage = Percentage::new(10, 100).unwrap();
        let quote = get_withdraw_quote(&pool, 500, &slippage).unwrap();
        assert_eq!(quote.min_amount0_out, 9_000_000_000);
        assert_eq!(quote.min_amount1_out, 900_000);
    }

    #[test]
    fn test_withdraw_quote_errors() {
        let pool = make_pool(1_000, 1_000, 0);
        assert!(matches!(
            get_withdraw_quote(&pool, 1, &Percentage::zero()),
            Err(AmmError::ZeroLiquidity)
        ));

        let pool = make_pool(1_000, 1_000, 10);
        assert!(matches!(
            get_withdraw_quote(&pool, 11, &Percentage::zero()),
            Err(AmmError::InsufficientLiquidity)
        ));

        let mut pool = make_pool(1_000, 1_000, 10);
        pool.status = PoolStatus(PoolStatus::WITHDRAW_DISABLED);
        assert!(matches!(
            get_withdraw_quote(&pool, 1, &Percentage::zero()),
            Err(AmmError::PoolDisabled { .. })
        ));
    }
}
