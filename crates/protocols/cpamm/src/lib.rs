//! Constant-Product AMM Routing
//!
//! Exact quoting for constant-product pools with fee schedules and transfer
//! taxes, plus multi-hop route discovery and evaluation across a pool graph.

pub mod calculator;
pub mod constants;
pub mod liquidity;
pub mod math;
pub mod router;
pub mod state;

// Re-exports
pub use calculator::{calculate_input, calculate_output, quote_swap};
pub use constants::{fees, status};
pub use liquidity::{get_deposit_quote, get_withdraw_quote};
pub use math::{
    apply_percentage_bounds, apply_rate, gross_up, mul_div, mul_div_big, BoundDirection,
    MathError, Rounding,
};
pub use router::{
    apply_slippage_for_route, best_route, build_pool_graph, calculate_price_impact,
    evaluate_route, find_all_routes, find_best_routes, find_paths, quote_path, rank_routes,
    route_swap, PoolEdge, PoolGraph, PriceImpact, Route, SubRoute, SwapQuery,
};
pub use state::{
    AmmError, DepositQuote, FeeSchedule, PoolOperation, PoolSnapshot, PoolStatus, SwapBreakdown,
    SwapQuote, TaxConfig, WithdrawQuote,
};
