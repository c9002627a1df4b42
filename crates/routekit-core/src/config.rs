//! Configuration types for routekit

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_MAX_HOPS, DEFAULT_TRADE_FEE_RATE, FEE_RATE_DENOMINATOR};
use crate::{Error, Percentage, Result};

/// Routing configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouterConfig {
    /// Longest route considered, in hops
    #[serde(default = "default_max_hops")]
    pub max_hops: usize,

    /// Number of ranked routes returned to the caller
    #[serde(default = "default_max_routes")]
    pub max_routes: usize,

    /// Slippage tolerance applied to each returned route
    #[serde(default = "default_slippage")]
    pub slippage: Percentage,

    /// Trade fee rate (over 1_000_000) removed from the reference price
    /// when computing price impact
    #[serde(default = "default_base_trade_fee_rate")]
    pub base_trade_fee_rate: u64,

    /// Fractional digits kept in price impact figures
    #[serde(default = "default_price_impact_precision")]
    pub price_impact_precision: u32,
}

/// Most fractional digits a price impact can carry
pub const MAX_PRICE_IMPACT_PRECISION: u32 = 16;

fn default_max_hops() -> usize {
    DEFAULT_MAX_HOPS
}

fn default_max_routes() -> usize {
    5
}

fn default_slippage() -> Percentage {
    // 0.5%
    Percentage::from_bps(50)
}

fn default_base_trade_fee_rate() -> u64 {
    DEFAULT_TRADE_FEE_RATE
}

fn default_price_impact_precision() -> u32 {
    2
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            max_hops: default_max_hops(),
            max_routes: default_max_routes(),
            slippage: default_slippage(),
            base_trade_fee_rate: default_base_trade_fee_rate(),
            price_impact_precision: default_price_impact_precision(),
        }
    }
}

impl RouterConfig {
    /// Parse a JSON document and validate it
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_hops == 0 {
            return Err(Error::Config("max_hops must be at least 1".to_string()));
        }
        if self.max_routes == 0 {
            return Err(Error::Config("max_routes must be at least 1".to_string()));
        }
        if self.base_trade_fee_rate >= FEE_RATE_DENOMINATOR {
            return Err(Error::Config(format!(
                "base_trade_fee_rate {} must be below {}",
                self.base_trade_fee_rate, FEE_RATE_DENOMINATOR
            )));
        }
        // 100% scaled by 10^16 is 10^18, which still fits a u64
        if self.price_impact_precision > MAX_PRICE_IMPACT_PRECISION {
            return Err(Error::Config(format!(
                "price_impact_precision {} is too large",
                self.price_impact_precision
            )));
        }
        Ok(())
    }
}
