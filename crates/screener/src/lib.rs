//! Batch screening over dataset rows: quality-floor filtering with
//! progressive relaxation, dividend-style ranking, and sector-balanced
//! dollar allocation by largest-remainder apportionment.

pub mod allocation;

pub use allocation::{apportion_slots, build_portfolio_sector_balanced, PortfolioOptions};

use serde::{Deserialize, Serialize};
use stats_core::{normalize_ticker, IndicatorRow};

/// Screening floors. The include list is informational only — it never
/// bypasses the quality floors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreenCriteria {
    pub min_yield: f64,
    pub min_market_cap: f64,
    pub min_price: f64,
    pub exclude: Vec<String>,
    pub include: Vec<String>,
}

impl Default for ScreenCriteria {
    fn default() -> Self {
        Self {
            min_yield: 0.0,
            min_market_cap: 0.0,
            // Price sanity guard: never relaxed away
            min_price: 1.0,
            exclude: Vec::new(),
            include: Vec::new(),
        }
    }
}

/// How floors are loosened when a strict screen comes up short:
/// yield steps down first, then market cap shrinks multiplicatively,
/// then everything but the price guard is dropped.
#[derive(Debug, Clone)]
pub struct RelaxationPolicy {
    pub yield_step: f64,
    pub yield_min: f64,
    pub cap_factor: f64,
    pub cap_min: f64,
}

impl Default for RelaxationPolicy {
    fn default() -> Self {
        Self {
            yield_step: 0.5,
            yield_min: 0.0,
            cap_factor: 0.5,
            cap_min: 1.0e9,
        }
    }
}

fn passes(row: &IndicatorRow, criteria: &ScreenCriteria) -> bool {
    match row.price {
        Some(p) if p >= criteria.min_price => {}
        _ => return false,
    }

    if criteria.min_yield > 0.0 && row.dividend_yield.unwrap_or(0.0) < criteria.min_yield {
        return false;
    }
    if criteria.min_market_cap > 0.0 && row.market_cap.unwrap_or(0.0) < criteria.min_market_cap {
        return false;
    }
    if criteria
        .exclude
        .iter()
        .any(|t| normalize_ticker(t) == row.ticker)
    {
        return false;
    }
    true
}

/// Dividend-style ranking: yield descending, market cap descending,
/// price ascending. Missing values rank last within their key.
pub fn rank_rows(rows: &mut [IndicatorRow]) {
    rows.sort_by(|a, b| {
        let ya = a.dividend_yield.unwrap_or(f64::NEG_INFINITY);
        let yb = b.dividend_yield.unwrap_or(f64::NEG_INFINITY);
        yb.partial_cmp(&ya)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| {
                let ca = a.market_cap.unwrap_or(f64::NEG_INFINITY);
                let cb = b.market_cap.unwrap_or(f64::NEG_INFINITY);
                cb.partial_cmp(&ca).unwrap_or(std::cmp::Ordering::Equal)
            })
            .then_with(|| {
                let pa = a.price.unwrap_or(f64::INFINITY);
                let pb = b.price.unwrap_or(f64::INFINITY);
                pa.partial_cmp(&pb).unwrap_or(std::cmp::Ordering::Equal)
            })
    });
}

/// Filter and rank under the given criteria.
pub fn screen_rows(rows: &[IndicatorRow], criteria: &ScreenCriteria) -> Vec<IndicatorRow> {
    let mut out: Vec<IndicatorRow> = rows
        .iter()
        .filter(|r| passes(r, criteria))
        .cloned()
        .collect();
    rank_rows(&mut out);
    out
}

/// The full floor-relaxation sequence, strictest first. Each step
/// loosens one floor, so the candidate pool can only grow from one
/// step to the next.
pub fn relaxation_schedule(
    criteria: &ScreenCriteria,
    policy: &RelaxationPolicy,
) -> Vec<ScreenCriteria> {
    let mut schedule = vec![criteria.clone()];

    // Yield floor steps down first
    let mut min_yield = criteria.min_yield;
    while min_yield > policy.yield_min {
        min_yield = (min_yield - policy.yield_step).max(policy.yield_min);
        let mut step = criteria.clone();
        step.min_yield = min_yield;
        schedule.push(step);
    }

    // Then market cap shrinks multiplicatively
    let mut min_cap = criteria.min_market_cap;
    while min_cap > policy.cap_min {
        min_cap = (min_cap * policy.cap_factor).max(policy.cap_min);
        let mut step = criteria.clone();
        step.min_yield = policy.yield_min;
        step.min_market_cap = min_cap;
        schedule.push(step);
    }

    // Last resort: price guard only
    let mut open = criteria.clone();
    open.min_yield = 0.0;
    open.min_market_cap = 0.0;
    schedule.push(open);

    schedule
}

/// Screen toward a target count, relaxing floors step by step until the
/// pool is large enough or every relaxation is spent. Whenever any
/// price-valid candidate exists, something comes back.
pub fn select_with_fallback(
    rows: &[IndicatorRow],
    criteria: &ScreenCriteria,
    target: usize,
    policy: &RelaxationPolicy,
) -> Vec<IndicatorRow> {
    if target == 0 {
        return Vec::new();
    }

    let mut pool = Vec::new();
    for (i, step) in relaxation_schedule(criteria, policy).iter().enumerate() {
        pool = screen_rows(rows, step);
        if pool.len() >= target {
            if i > 0 {
                tracing::debug!(
                    "screen relaxed {} step(s) to reach {} candidates",
                    i,
                    pool.len()
                );
            }
            break;
        }
    }

    pool.truncate(target);
    pool
}
