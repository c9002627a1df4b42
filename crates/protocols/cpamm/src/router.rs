//! Smart Router: Multi-Hop Route Discovery & Evaluation
//!
//! Builds an asset graph over pool snapshots, enumerates simple paths between
//! two assets, quotes every hop exactly in either direction, and ranks the
//! resulting routes. Ranking is always explicit: the order `find_all_routes`
//! returns carries no meaning.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use num_bigint::BigUint;
use num_traits::Zero;
use routekit_core::{Asset, Percentage, PoolId, RouterConfig, UnixTime};
use serde::{Deserialize, Serialize};

use crate::calculator::quote_swap;
use crate::constants::fees::FEE_RATE_DENOMINATOR;
use crate::math::{apply_percentage_bounds, round_half_up, to_amount, BoundDirection, MathError};
use crate::state::{AmmError, PoolSnapshot, SwapBreakdown, SwapQuote};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// An edge in the pool graph, oriented away from `token_in`.
#[derive(Debug, Clone)]
pub struct PoolEdge {
    pub pool: Arc<PoolSnapshot>,
    pub token_in: Asset,
    pub token_out: Asset,
}

/// Adjacency-list pool graph.
///
/// Parallel pools between one pair stay distinct edges. The graph is never
/// mutated after construction; a new pool list means a new graph.
#[derive(Debug, Clone, Default)]
pub struct PoolGraph {
    adjacency: HashMap<Asset, Vec<PoolEdge>>,
    pool_count: usize,
    skipped_pools: usize,
}

impl PoolGraph {
    /// Every asset touched by at least one pool, sorted
    pub fn assets(&self) -> Vec<Asset> {
        let mut assets: Vec<Asset> = self.adjacency.keys().copied().collect();
        assets.sort();
        assets
    }

    /// Edges leaving `asset`, in pool insertion order
    pub fn edges_from(&self, asset: &Asset) -> &[PoolEdge] {
        self.adjacency
            .get(asset)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn pool_count(&self) -> usize {
        self.pool_count
    }

    /// Snapshots rejected by validation during construction
    pub fn skipped_pools(&self) -> usize {
        self.skipped_pools
    }

    pub fn contains_asset(&self, asset: &Asset) -> bool {
        self.adjacency.contains_key(asset)
    }
}

/// A single hop in a swap route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubRoute {
    pub input_asset: Asset,
    pub output_asset: Asset,
    pub pool: Arc<PoolSnapshot>,
    pub amount_in: u64,
    pub amount_out: u64,
    pub breakdown: SwapBreakdown,
}

impl SubRoute {
    fn from_quote(edge: &PoolEdge, quote: SwapQuote) -> Self {
        Self {
            input_asset: quote.input_asset,
            output_asset: quote.output_asset,
            pool: Arc::clone(&edge.pool),
            amount_in: quote.amount_in,
            amount_out: quote.amount_out,
            breakdown: quote.breakdown,
        }
    }
}

/// A complete route from source asset to target asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    pub sub_routes: Vec<SubRoute>,
    pub amount_specified_is_input: bool,
    /// Amount the caller fixed (input for exact-input, output otherwise)
    pub specified_amount: u64,
    /// Amount the route computed on the other side
    pub other_side_amount: u64,
    /// Minimum received (exact-input) or maximum sold (exact-output)
    pub threshold_amount: Option<u64>,
    pub price_impact: Option<PriceImpact>,
}

impl Route {
    /// Amount entering the first hop
    pub fn amount_in(&self) -> u64 {
        self.sub_routes.first().map_or(0, |hop| hop.amount_in)
    }

    /// Amount leaving the last hop
    pub fn amount_out(&self) -> u64 {
        self.sub_routes.last().map_or(0, |hop| hop.amount_out)
    }

    pub fn hops(&self) -> usize {
        self.sub_routes.len()
    }

    /// Visited asset sequence, source first
    pub fn assets(&self) -> Vec<Asset> {
        let mut assets = Vec::with_capacity(self.sub_routes.len() + 1);
        if let Some(first) = self.sub_routes.first() {
            assets.push(first.input_asset);
        }
        assets.extend(self.sub_routes.iter().map(|hop| hop.output_asset));
        assets
    }

    pub fn pool_ids(&self) -> Vec<PoolId> {
        self.sub_routes.iter().map(|hop| hop.pool.pool_id).collect()
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let labels: Vec<String> = self.assets().iter().map(Asset::short).collect();
        write!(
            f,
            "{} (in: {}, out: {})",
            labels.join(" -> "),
            self.amount_in(),
            self.amount_out()
        )
    }
}

/// Price impact as a percentage scaled by `10^precision`.
///
/// `PriceImpact { scaled: 27, precision: 2 }` is 0.27%.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceImpact {
    pub scaled: u64,
    pub precision: u32,
}

impl fmt::Display for PriceImpact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits = self.scaled.to_string();
        let precision = self.precision as usize;
        if precision == 0 {
            return write!(f, "{}", digits);
        }
        let padded = format!("{:0>width$}", digits, width = precision + 1);
        let (whole, fraction) = padded.split_at(padded.len() - precision);
        write!(f, "{}.{}", whole, fraction)
    }
}

/// A routing request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapQuery {
    pub token_in: Asset,
    pub token_out: Asset,
    pub trade_amount: u64,
    pub amount_specified_is_input: bool,
    /// Overrides the configured hop bound
    #[serde(default)]
    pub max_hops: Option<usize>,
    /// Pools not yet open at this time are skipped; no check when absent
    #[serde(default)]
    pub timestamp: Option<UnixTime>,
}

impl SwapQuery {
    pub fn exact_input(token_in: Asset, token_out: Asset, amount_in: u64) -> Self {
        Self {
            token_in,
            token_out,
            trade_amount: amount_in,
            amount_specified_is_input: true,
            max_hops: None,
            timestamp: None,
        }
    }

    pub fn exact_output(token_in: Asset, token_out: Asset, amount_out: u64) -> Self {
        Self {
            amount_specified_is_input: false,
            ..Self::exact_input(token_in, token_out, amount_out)
        }
    }

    pub fn with_max_hops(mut self, max_hops: usize) -> Self {
        self.max_hops = Some(max_hops);
        self
    }

    pub fn at(mut self, timestamp: UnixTime) -> Self {
        self.timestamp = Some(timestamp);
        self
    }
}

// ---------------------------------------------------------------------------
// Step 1: Pool Graph & Path Finding
// ---------------------------------------------------------------------------

/// Build a pool graph from pool snapshots.
///
/// Each valid pool adds edges asset0 -> asset1 and asset1 -> asset0. Invalid
/// snapshots are skipped and counted. Pools that cannot swap right now stay
/// in the graph; the path search skips them.
pub fn build_pool_graph(pools: &[PoolSnapshot]) -> PoolGraph {
    let mut graph = PoolGraph::default();

    for pool in pools {
        if let Err(e) = pool.validate() {
            tracing::warn!("Skipping pool {}: {}", pool.pool_id.short(), e);
            graph.skipped_pools += 1;
            continue;
        }
        let pool = Arc::new(pool.clone());

        graph
            .adjacency
            .entry(pool.asset0)
            .or_default()
            .push(PoolEdge {
                pool: Arc::clone(&pool),
                token_in: pool.asset0,
                token_out: pool.asset1,
            });
        graph
            .adjacency
            .entry(pool.asset1)
            .or_default()
            .push(PoolEdge {
                pool: Arc::clone(&pool),
                token_in: pool.asset1,
                token_out: pool.asset0,
            });

        graph.pool_count += 1;
    }

    tracing::info!(
        "Built pool graph: {} pools over {} assets ({} skipped)",
        graph.pool_count,
        graph.adjacency.len(),
        graph.skipped_pools
    );
    graph
}

struct PathSearch<'a> {
    graph: &'a PoolGraph,
    target: Asset,
    max_hops: usize,
    now: Option<UnixTime>,
    path: Vec<PoolEdge>,
    visited: HashSet<Asset>,
    results: Vec<Vec<PoolEdge>>,
}

impl PathSearch<'_> {
    fn extend(&mut self, current: &Asset) {
        let graph = self.graph;
        for edge in graph.edges_from(current) {
            if !edge.pool.is_swap_eligible(self.now) || self.visited.contains(&edge.token_out) {
                continue;
            }
            self.path.push(edge.clone());
            if edge.token_out == self.target {
                self.results.push(self.path.clone());
            } else if self.path.len() < self.max_hops {
                self.visited.insert(edge.token_out);
                self.extend(&edge.token_out);
                self.visited.remove(&edge.token_out);
            }
            self.path.pop();
        }
    }
}

/// Find all simple paths from `source` to `target` with at most `max_hops`
/// hops.
///
/// Depth-first; no asset is visited twice, and a path stops at the first
/// arrival at `target`. Edges whose pool is not swap-eligible at `now` are
/// never taken.
pub fn find_paths(
    graph: &PoolGraph,
    source: &Asset,
    target: &Asset,
    max_hops: usize,
    now: Option<UnixTime>,
) -> Vec<Vec<PoolEdge>> {
    if max_hops == 0 || source == target {
        return Vec::new();
    }

    let mut search = PathSearch {
        graph,
        target: *target,
        max_hops,
        now,
        path: Vec::with_capacity(max_hops),
        visited: HashSet::from([*source]),
        results: Vec::new(),
    };
    search.extend(source);
    search.results
}

// ---------------------------------------------------------------------------
// Step 2: Multi-Hop Quoting
// ---------------------------------------------------------------------------

/// Quote a path by chaining `quote_swap` through each hop.
///
/// Exact-input runs forward from the first hop; exact-output runs backward
/// from the last hop, each hop's required input becoming the previous hop's
/// target output.
pub fn quote_path(
    path: &[PoolEdge],
    trade_amount: u64,
    amount_specified_is_input: bool,
) -> Result<Route, AmmError> {
    if path.is_empty() {
        return Err(AmmError::InvalidHopBound);
    }

    let mut sub_routes = Vec::with_capacity(path.len());
    let mut amount = trade_amount;

    if amount_specified_is_input {
        for edge in path {
            let quote = quote_swap(&edge.pool, &edge.token_in, amount, true)?;
            amount = quote.amount_out;
            sub_routes.push(SubRoute::from_quote(edge, quote));
        }
    } else {
        for edge in path.iter().rev() {
            let quote = quote_swap(&edge.pool, &edge.token_in, amount, false)?;
            amount = quote.amount_in;
            sub_routes.push(SubRoute::from_quote(edge, quote));
        }
        sub_routes.reverse();
    }

    Ok(Route {
        sub_routes,
        amount_specified_is_input,
        specified_amount: trade_amount,
        other_side_amount: amount,
        threshold_amount: None,
        price_impact: None,
    })
}

fn describe_path(path: &[PoolEdge]) -> String {
    let mut labels: Vec<String> = path.first().map(|e| e.token_in.short()).into_iter().collect();
    labels.extend(path.iter().map(|e| e.token_out.short()));
    labels.join(" -> ")
}

fn collect_routes(
    graph: &PoolGraph,
    query: &SwapQuery,
    max_hops: usize,
) -> Result<Vec<Route>, AmmError> {
    if query.token_in == query.token_out {
        return Err(AmmError::IdenticalAssets);
    }
    if query.trade_amount == 0 {
        return Err(AmmError::InvalidAmount(
            "trade amount must be positive".to_string(),
        ));
    }
    if max_hops == 0 {
        return Err(AmmError::InvalidHopBound);
    }

    let paths = find_paths(
        graph,
        &query.token_in,
        &query.token_out,
        max_hops,
        query.timestamp,
    );

    let mut routes = Vec::with_capacity(paths.len());
    for path in &paths {
        match quote_path(path, query.trade_amount, query.amount_specified_is_input) {
            Ok(route) => routes.push(route),
            Err(e) if e.is_hop_recoverable() => {
                tracing::debug!("Dropping path {}: {}", describe_path(path), e);
            }
            Err(e) => return Err(e),
        }
    }

    if routes.is_empty() {
        return Err(AmmError::NoRouteFound {
            token_in: query.token_in.to_string(),
            token_out: query.token_out.to_string(),
        });
    }
    Ok(routes)
}

/// Find and quote every route between two assets.
///
/// Paths that fail on a hop-level condition (liquidity, disabled pool) are
/// dropped; arithmetic failures abort the call. The result is unranked.
pub fn find_all_routes(
    graph: &PoolGraph,
    token_in: &Asset,
    token_out: &Asset,
    trade_amount: u64,
    amount_specified_is_input: bool,
    max_hops: usize,
) -> Result<Vec<Route>, AmmError> {
    let query = SwapQuery {
        token_in: *token_in,
        token_out: *token_out,
        trade_amount,
        amount_specified_is_input,
        max_hops: Some(max_hops),
        timestamp: None,
    };
    collect_routes(graph, &query, max_hops)
}

fn compare_routes(a: &Route, b: &Route) -> Ordering {
    let by_amount = if a.amount_specified_is_input {
        b.other_side_amount.cmp(&a.other_side_amount)
    } else {
        a.other_side_amount.cmp(&b.other_side_amount)
    };
    by_amount
        .then_with(|| a.hops().cmp(&b.hops()))
        .then_with(|| a.pool_ids().cmp(&b.pool_ids()))
}

/// Sort routes best first.
///
/// Exact-input prefers the largest output, exact-output the smallest input.
/// Ties go to fewer hops, then to the lower pool id sequence.
pub fn rank_routes(routes: &mut [Route]) {
    routes.sort_by(compare_routes);
}

/// Find, quote and rank routes, returning the top `max_routes`.
pub fn find_best_routes(
    graph: &PoolGraph,
    token_in: &Asset,
    token_out: &Asset,
    trade_amount: u64,
    amount_specified_is_input: bool,
    max_hops: usize,
    max_routes: usize,
) -> Result<Vec<Route>, AmmError> {
    let mut routes = find_all_routes(
        graph,
        token_in,
        token_out,
        trade_amount,
        amount_specified_is_input,
        max_hops,
    )?;
    rank_routes(&mut routes);
    routes.truncate(max_routes);
    Ok(routes)
}

/// The single best route, by the same ordering as `rank_routes`.
pub fn best_route(
    graph: &PoolGraph,
    token_in: &Asset,
    token_out: &Asset,
    trade_amount: u64,
    amount_specified_is_input: bool,
    max_hops: usize,
) -> Result<Route, AmmError> {
    find_best_routes(
        graph,
        token_in,
        token_out,
        trade_amount,
        amount_specified_is_input,
        max_hops,
        1,
    )?
    .into_iter()
    .next()
    .ok_or_else(|| AmmError::NoRouteFound {
        token_in: token_in.to_string(),
        token_out: token_out.to_string(),
    })
}

// ---------------------------------------------------------------------------
// Step 3: Route Evaluation
// ---------------------------------------------------------------------------

/// Copy of `route` with its slippage threshold set.
///
/// Exact-input routes get a minimum received, exact-output routes a maximum
/// sold.
pub fn apply_slippage_for_route(route: &Route, tolerance: &Percentage) -> Result<Route, AmmError> {
    let direction = BoundDirection::for_exact_input(route.amount_specified_is_input);
    let threshold = apply_percentage_bounds(route.other_side_amount, tolerance, direction)?;
    Ok(Route {
        threshold_amount: Some(threshold),
        ..route.clone()
    })
}

/// End-to-end price impact of a route.
///
/// reference = product over hops of reserve_out / reserve_in * (D - fee) / D
/// realized  = amount_out / amount_in
/// impact    = |reference - realized| / reference * 100
///
/// Charging the base fee in the reference makes a vanishing trade read as
/// ~0%. Everything stays rational until the final half-up rounding to
/// `decimal_precision` digits.
pub fn calculate_price_impact(
    route: &Route,
    base_trade_fee_rate: u64,
    decimal_precision: u32,
) -> Result<PriceImpact, AmmError> {
    if base_trade_fee_rate > FEE_RATE_DENOMINATOR {
        return Err(MathError::Underflow.into());
    }
    let fee_factor = BigUint::from(FEE_RATE_DENOMINATOR - base_trade_fee_rate);
    let denominator = BigUint::from(FEE_RATE_DENOMINATOR);

    let mut spot_num = BigUint::from(1u32);
    let mut spot_den = BigUint::from(1u32);
    for hop in &route.sub_routes {
        let (reserve_in, reserve_out) = hop
            .pool
            .reserves_for(&hop.input_asset)
            .ok_or_else(|| AmmError::InvalidAsset(hop.input_asset.to_string()))?;
        spot_num *= BigUint::from(reserve_out) * &fee_factor;
        spot_den *= BigUint::from(reserve_in) * &denominator;
    }
    if spot_den.is_zero() {
        return Err(MathError::DivisionByZero.into());
    }

    // Cross-multiplied: reference * amount_in vs realized * amount_in
    let reference = spot_num * route.amount_in();
    let realized = spot_den * route.amount_out();
    if reference.is_zero() {
        return Err(MathError::DivisionByZero.into());
    }
    let deviation = if reference >= realized {
        &reference - &realized
    } else {
        &realized - &reference
    };

    let scale = BigUint::from(100u32) * BigUint::from(10u32).pow(decimal_precision);
    let scaled = round_half_up(&(deviation * scale), &reference)?;

    Ok(PriceImpact {
        scaled: to_amount(&scaled)?,
        precision: decimal_precision,
    })
}

/// Copy of `route` with both threshold and price impact filled in.
pub fn evaluate_route(
    route: &Route,
    tolerance: &Percentage,
    base_trade_fee_rate: u64,
    decimal_precision: u32,
) -> Result<Route, AmmError> {
    let mut evaluated = apply_slippage_for_route(route, tolerance)?;
    evaluated.price_impact = Some(calculate_price_impact(
        &evaluated,
        base_trade_fee_rate,
        decimal_precision,
    )?);
    Ok(evaluated)
}

/// Route a query end to end: find, rank, truncate to `config.max_routes`,
/// then evaluate each surviving route.
pub fn route_swap(
    graph: &PoolGraph,
    query: &SwapQuery,
    config: &RouterConfig,
) -> Result<Vec<Route>, AmmError> {
    config.validate()?;
    let max_hops = query.max_hops.unwrap_or(config.max_hops);

    let mut routes = collect_routes(graph, query, max_hops)?;
    let found = routes.len();
    rank_routes(&mut routes);
    routes.truncate(config.max_routes);

    let evaluated = routes
        .iter()
        .map(|route| {
            evaluate_route(
                route,
                &config.slippage,
                config.base_trade_fee_rate,
                config.price_impact_precision,
            )
        })
        .collect::<Result<Vec<_>, _>>()?;

    if let Some(best) = evaluated.first() {
        tracing::info!(
            "Routed {} candidate routes, returning {}; best: {}",
            found,
            evaluated.len(),
            best
        );
    }
    Ok(evaluated)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
