//! AMM State Types
//!
//! Pool snapshots, quotes, and protocol errors.

use routekit_core::{Asset, PoolId, UnixTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::constants::fees::FEE_RATE_DENOMINATOR;
use crate::constants::status;
use crate::math::MathError;

/// Operations a pool can have switched off
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PoolOperation {
    Deposit,
    Withdraw,
    Swap,
}

impl PoolOperation {
    /// Status bit that disables this operation
    pub fn status_bit(&self) -> u8 {
        match self {
            Self::Deposit => status::DEPOSIT_DISABLED,
            Self::Withdraw => status::WITHDRAW_DISABLED,
            Self::Swap => status::SWAP_DISABLED,
        }
    }
}

impl fmt::Display for PoolOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Deposit => write!(f, "deposit"),
            Self::Withdraw => write!(f, "withdraw"),
            Self::Swap => write!(f, "swap"),
        }
    }
}

/// Pool status bitset
///
/// bit0: deposit disabled, bit1: withdraw disabled, bit2: swap disabled.
/// A clear bit means the operation is allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PoolStatus(pub u8);

impl PoolStatus {
    pub const DEPOSIT_DISABLED: u8 = status::DEPOSIT_DISABLED;
    pub const WITHDRAW_DISABLED: u8 = status::WITHDRAW_DISABLED;
    pub const SWAP_DISABLED: u8 = status::SWAP_DISABLED;

    pub fn is_enabled(&self, operation: PoolOperation) -> bool {
        self.0 & operation.status_bit() == 0
    }

    pub fn with_disabled(self, operation: PoolOperation) -> Self {
        Self(self.0 | operation.status_bit())
    }
}

/// Fee schedule, every rate over `FEE_RATE_DENOMINATOR`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FeeSchedule {
    /// Fee taken from the post-tax input
    pub trade_fee_rate: u64,
    /// Share of the trade fee booked to the protocol
    #[serde(default)]
    pub protocol_fee_rate: u64,
    /// Share of the trade fee booked to the fund
    #[serde(default)]
    pub fund_fee_rate: u64,
    /// Extra pool-level fee kept by liquidity providers
    #[serde(default)]
    pub lp_fee_rate: u64,
}

impl FeeSchedule {
    pub fn new(trade_fee_rate: u64) -> Self {
        Self {
            trade_fee_rate,
            ..Self::default()
        }
    }

    /// Combined rate deducted from the swap input
    pub fn total_rate(&self) -> u64 {
        self.trade_fee_rate.saturating_add(self.lp_fee_rate)
    }
}

/// Transfer tax configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TaxConfig {
    /// Tax on the tax asset when it enters the pool
    #[serde(default)]
    pub in_tax_rate: u64,
    /// Tax on the tax asset when it leaves the pool
    #[serde(default)]
    pub out_tax_rate: u64,
    /// Tax asset is asset0 when set, asset1 otherwise
    #[serde(default)]
    pub tax_use_token0: bool,
    #[serde(default)]
    pub disabled: bool,
}

/// Read-only view of one pool at a point in time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolSnapshot {
    /// Pool account address (unique identifier)
    pub pool_id: PoolId,
    /// Lower asset of the pair
    pub asset0: Asset,
    /// Higher asset of the pair
    pub asset1: Asset,
    /// Tradable balance of asset0 (fees and taxes owed excluded)
    pub reserve0: u64,
    /// Tradable balance of asset1
    pub reserve1: u64,
    pub fees: FeeSchedule,
    #[serde(default)]
    pub tax: TaxConfig,
    #[serde(default)]
    pub status: PoolStatus,
    /// Circulating LP supply
    pub lp_supply: u64,
    /// Swaps are rejected before this time
    #[serde(default)]
    pub open_time: UnixTime,
}

impl PoolSnapshot {
    /// Check the structural invariants a snapshot must satisfy before it
    /// can join a pool graph.
    pub fn validate(&self) -> Result<(), AmmError> {
        let invalid = |reason: String| AmmError::InvalidPool {
            pool_id: self.pool_id.to_string(),
            reason,
        };
        if self.asset0 == self.asset1 {
            return Err(invalid("pool connects an asset to itself".to_string()));
        }
        if self.asset0 > self.asset1 {
            return Err(invalid("asset0 must sort below asset1".to_string()));
        }
        if self.fees.total_rate() >= FEE_RATE_DENOMINATOR {
            return Err(invalid(format!(
                "trade fee {} plus lp fee {} must stay below {}",
                self.fees.trade_fee_rate, self.fees.lp_fee_rate, FEE_RATE_DENOMINATOR
            )));
        }
        if self.fees.protocol_fee_rate.saturating_add(self.fees.fund_fee_rate)
            > FEE_RATE_DENOMINATOR
        {
            return Err(invalid(
                "protocol and fund shares exceed the whole trade fee".to_string(),
            ));
        }
        if self.tax.in_tax_rate > FEE_RATE_DENOMINATOR
            || self.tax.out_tax_rate > FEE_RATE_DENOMINATOR
        {
            return Err(invalid("tax rate above 100%".to_string()));
        }
        Ok(())
    }

    /// The pool's other asset, or `None` if `asset` is not in the pool
    pub fn other_asset(&self, asset: &Asset) -> Option<Asset> {
        if *asset == self.asset0 {
            Some(self.asset1)
        } else if *asset == self.asset1 {
            Some(self.asset0)
        } else {
            None
        }
    }

    /// `(reserve_in, reserve_out)` for a swap that sells `input`
    pub fn reserves_for(&self, input: &Asset) -> Option<(u64, u64)> {
        if *input == self.asset0 {
            Some((self.reserve0, self.reserve1))
        } else if *input == self.asset1 {
            Some((self.reserve1, self.reserve0))
        } else {
            None
        }
    }

    pub fn is_enabled(&self, operation: PoolOperation) -> bool {
        self.status.is_enabled(operation)
    }

    pub fn has_liquidity(&self) -> bool {
        self.reserve0 > 0 && self.reserve1 > 0
    }

    pub fn is_open_at(&self, now: UnixTime) -> bool {
        now >= self.open_time
    }

    /// Whether swaps may route through this pool at `now` (any time if `None`)
    pub fn is_swap_eligible(&self, now: Option<UnixTime>) -> bool {
        self.is_enabled(PoolOperation::Swap)
            && self.has_liquidity()
            && now.map_or(true, |t| self.is_open_at(t))
    }

    /// The asset the transfer tax is levied on
    pub fn tax_asset(&self) -> Asset {
        if self.tax.tax_use_token0 {
            self.asset0
        } else {
            self.asset1
        }
    }

    /// Inbound tax rate charged when `input` enters the pool
    pub fn in_tax_rate_for(&self, input: &Asset) -> u64 {
        if !self.tax.disabled && self.tax.in_tax_rate > 0 && self.tax_asset() == *input {
            self.tax.in_tax_rate
        } else {
            0
        }
    }

    /// Outbound tax rate charged when `output` leaves the pool
    pub fn out_tax_rate_for(&self, output: &Asset) -> u64 {
        if !self.tax.disabled && self.tax.out_tax_rate > 0 && self.tax_asset() == *output {
            self.tax.out_tax_rate
        } else {
            0
        }
    }
}

impl fmt::Display for PoolSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Pool {} | {}: {} | {}: {} | fee: {}/{}",
            self.pool_id.short(),
            self.asset0.short(),
            self.reserve0,
            self.asset1.short(),
            self.reserve1,
            self.fees.total_rate(),
            FEE_RATE_DENOMINATOR
        )
    }
}

/// Fee and tax amounts charged by one swap
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SwapBreakdown {
    /// Inbound tax, in the input asset
    pub in_tax: u64,
    /// Trade fee, in the input asset
    pub trade_fee: u64,
    /// Protocol share of the trade fee
    pub protocol_fee: u64,
    /// Fund share of the trade fee
    pub fund_fee: u64,
    /// Pool-level LP fee, in the input asset
    pub lp_fee: u64,
    /// Outbound tax, in the output asset
    pub out_tax: u64,
}

/// Single-hop swap quote
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapQuote {
    pub pool_id: PoolId,
    pub input_asset: Asset,
    pub output_asset: Asset,
    /// Amount the taker sends, taxes included
    pub amount_in: u64,
    /// Amount the taker receives, taxes deducted
    pub amount_out: u64,
    pub amount_specified_is_input: bool,
    pub breakdown: SwapBreakdown,
}

/// Liquidity deposit quote
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositQuote {
    pub pool_id: PoolId,
    pub input_asset: Asset,
    pub input_amount: u64,
    /// Other-side amount that keeps the reserve ratio
    pub expected_other_amount: u64,
    /// Most of the other asset the depositor agrees to supply
    pub other_amount: u64,
    /// LP units minted for the deposit
    pub lp_amount: u64,
}

/// Liquidity withdrawal quote
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawQuote {
    pub pool_id: PoolId,
    /// LP units burned
    pub withdraw_amount: u64,
    pub expected_amount0: u64,
    pub expected_amount1: u64,
    pub min_amount0_out: u64,
    pub min_amount1_out: u64,
}

/// AMM protocol errors
#[derive(Debug, Error)]
pub enum AmmError {
    #[error("Arithmetic error: {0}")]
    Arithmetic(#[from] MathError),

    #[error("Insufficient liquidity for swap")]
    InsufficientLiquidity,

    #[error("Pool {pool_id} has {operation} disabled")]
    PoolDisabled {
        pool_id: String,
        operation: PoolOperation,
    },

    #[error("Invalid asset for pool: {0}")]
    InvalidAsset(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Invalid pool {pool_id}: {reason}")]
    InvalidPool { pool_id: String, reason: String },

    #[error("Input and output asset are the same")]
    IdenticalAssets,

    #[error("Hop bound must be at least 1")]
    InvalidHopBound,

    #[error("No route found from {token_in} to {token_out}")]
    NoRouteFound { token_in: String, token_out: String },

    #[error("Pool has no liquidity")]
    ZeroLiquidity,

    #[error(transparent)]
    Core(#[from] routekit_core::Error),
}

impl AmmError {
    /// Hop-level errors drop the path being quoted; everything else aborts
    /// the routing call.
    pub fn is_hop_recoverable(&self) -> bool {
        matches!(
            self,
            Self::InsufficientLiquidity
                | Self::PoolDisabled { .. }
                | Self::InvalidAsset(_)
                | Self::ZeroLiquidity
        )
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Arithmetic(_) => "arithmetic",
            Self::InsufficientLiquidity => "insufficient_liquidity",
            Self::PoolDisabled { .. } => "pool_disabled",
            Self::InvalidAsset(_) => "invalid_asset",
            Self::InvalidAmount(_) => "invalid_amount",
            Self::InvalidPool { .. } => "invalid_pool",
            Self::IdenticalAssets => "identical_assets",
            Self::InvalidHopBound => "invalid_hop_bound",
            Self::NoRouteFound { .. } => "no_route_found",
            Self::ZeroLiquidity => "zero_liquidity",
            Self::Core(e) => e.error_code(),
        }
    }
}
