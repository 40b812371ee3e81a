use crate::{select_with_fallback, RelaxationPolicy, ScreenCriteria};
use stats_core::{Allocation, IndicatorRow};
use std::collections::HashSet;

#[derive(Debug, Clone)]
pub struct PortfolioOptions {
    pub amount: f64,
    pub slots: usize,
    pub criteria: ScreenCriteria,
    pub relaxation: RelaxationPolicy,
}

impl Default for PortfolioOptions {
    fn default() -> Self {
        Self {
            amount: 10_000.0,
            slots: 10,
            criteria: ScreenCriteria::default(),
            relaxation: RelaxationPolicy::default(),
        }
    }
}

/// Largest-remainder apportionment of `total` integer slots across
/// weighted sectors. Weights are normalized first; leftover slots go to
/// the largest fractional remainders, ties broken by sector name, so
/// the split is fully deterministic.
pub fn apportion_slots(sector_weights: &[(String, f64)], total: usize) -> Vec<(String, usize)> {
    let weights: Vec<(&str, f64)> = sector_weights
        .iter()
        .filter(|(_, w)| *w > 0.0 && w.is_finite())
        .map(|(s, w)| (s.as_str(), *w))
        .collect();

    let weight_sum: f64 = weights.iter().map(|(_, w)| w).sum();
    if weights.is_empty() || weight_sum <= 0.0 || total == 0 {
        return Vec::new();
    }

    let mut shares: Vec<(String, usize, f64)> = weights
        .iter()
        .map(|(sector, w)| {
            let exact = w / weight_sum * total as f64;
            (sector.to_string(), exact.floor() as usize, exact.fract())
        })
        .collect();

    let assigned: usize = shares.iter().map(|(_, floor, _)| floor).sum();
    let mut remaining = total - assigned;

    // Largest fractional remainder first, name ascending on ties
    shares.sort_by(|a, b| {
        b.2.partial_cmp(&a.2)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.0.cmp(&b.0))
    });
    for share in shares.iter_mut() {
        if remaining == 0 {
            break;
        }
        share.1 += 1;
        remaining -= 1;
    }

    shares.sort_by(|a, b| a.0.cmp(&b.0));
    shares
        .into_iter()
        .map(|(sector, slots, _)| (sector, slots))
        .collect()
}

/// Build a sector-balanced portfolio: slots per sector by
/// largest-remainder apportionment, names per sector by the screened
/// ranking with progressive relaxation, dollars per sector in
/// proportion to its weight split equally within the sector. A
/// shortfall is backfilled from the remaining pool by the same ranking
/// regardless of sector, and the unused sector budget follows the
/// backfilled names so the total always sums to the requested amount.
pub fn build_portfolio_sector_balanced(
    rows: &[IndicatorRow],
    opts: &PortfolioOptions,
    sector_weights: &[(String, f64)],
) -> Vec<Allocation> {
    if opts.amount <= 0.0 || opts.slots == 0 {
        return Vec::new();
    }

    let slot_plan = apportion_slots(sector_weights, opts.slots);
    if slot_plan.is_empty() {
        return Vec::new();
    }
    let weight_sum: f64 = sector_weights
        .iter()
        .filter(|(_, w)| *w > 0.0 && w.is_finite())
        .map(|(_, w)| w)
        .sum();

    let mut selected: Vec<(IndicatorRow, String)> = Vec::new();
    let mut taken: HashSet<String> = HashSet::new();
    // (sector, per-slot dollars, names found)
    let mut sector_dollars: Vec<(String, f64, usize)> = Vec::new();

    for (sector, slots) in &slot_plan {
        if *slots == 0 {
            continue;
        }
        let sector_rows: Vec<IndicatorRow> = rows
            .iter()
            .filter(|r| r.sector.as_deref() == Some(sector.as_str()))
            .cloned()
            .collect();

        let picks = select_with_fallback(&sector_rows, &opts.criteria, *slots, &opts.relaxation);
        let weight = sector_weights
            .iter()
            .find(|(s, _)| s == sector)
            .map(|(_, w)| *w)
            .unwrap_or(0.0);
        let budget = opts.amount * weight / weight_sum;
        sector_dollars.push((sector.clone(), budget / *slots as f64, picks.len()));

        for pick in picks {
            taken.insert(pick.ticker.clone());
            selected.push((pick, sector.clone()));
        }
    }

    // Backfill the shortfall from everything not yet taken, ranked the
    // same way but ignoring sector targeting.
    let shortfall = opts.slots.saturating_sub(selected.len());
    let mut backfilled: Vec<IndicatorRow> = Vec::new();
    if shortfall > 0 {
        let remaining: Vec<IndicatorRow> = rows
            .iter()
            .filter(|r| !taken.contains(&r.ticker))
            .cloned()
            .collect();
        backfilled = select_with_fallback(&remaining, &opts.criteria, shortfall, &opts.relaxation);
    }

    if selected.is_empty() && backfilled.is_empty() {
        return Vec::new();
    }

    // Dollars: each filled slot carries its sector's per-slot share of
    // the budget; the budget of unfilled slots follows the backfilled
    // names, or spreads across all picks when there are none.
    let used_budget: f64 = sector_dollars
        .iter()
        .map(|(_, per_slot, count)| per_slot * *count as f64)
        .sum();
    let leftover = opts.amount - used_budget;

    let mut allocations: Vec<Allocation> = Vec::new();
    for (sector, per_slot, count) in &sector_dollars {
        if *count == 0 {
            continue;
        }
        for (row, row_sector) in selected.iter().filter(|(_, s)| s == sector) {
            allocations.push(make_allocation(row, *per_slot, Some(row_sector.clone()), None));
        }
    }

    if !backfilled.is_empty() {
        let per_name = leftover / backfilled.len() as f64;
        for row in &backfilled {
            allocations.push(make_allocation(
                row,
                per_name,
                row.sector.clone(),
                Some("backfill".to_string()),
            ));
        }
    } else if leftover.abs() > f64::EPSILON && !allocations.is_empty() {
        // No backfill available: spread the leftover evenly so the
        // total still matches the requested amount.
        let bump = leftover / allocations.len() as f64;
        for a in allocations.iter_mut() {
            a.dollars += bump;
            if let Some(price) = price_of(rows, &a.ticker) {
                a.est_shares = Some(a.dollars / price);
            }
        }
    }

    allocations
}

fn make_allocation(
    row: &IndicatorRow,
    dollars: f64,
    sector: Option<String>,
    notes: Option<String>,
) -> Allocation {
    Allocation {
        ticker: row.ticker.clone(),
        dollars,
        est_shares: row.price.filter(|p| *p > 0.0).map(|p| dollars / p),
        sector,
        notes,
    }
}

fn price_of(rows: &[IndicatorRow], ticker: &str) -> Option<f64> {
    rows.iter()
        .find(|r| r.ticker == ticker)
        .and_then(|r| r.price)
        .filter(|p| *p > 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(ticker: &str, yield_pct: f64, cap: f64, price: f64, sector: &str) -> IndicatorRow {
        IndicatorRow {
            ticker: ticker.to_string(),
            price: Some(price),
            dividend_yield: Some(yield_pct),
            market_cap: Some(cap),
            sector: Some(sector.to_string()),
            ..Default::default()
        }
    }

    fn universe() -> Vec<IndicatorRow> {
        vec![
            row("T1", 3.0, 100.0e9, 50.0, "Technology"),
            row("T2", 2.5, 90.0e9, 60.0, "Technology"),
            row("T3", 2.0, 80.0e9, 70.0, "Technology"),
            row("U1", 4.0, 40.0e9, 30.0, "Utilities"),
            row("U2", 3.5, 35.0e9, 25.0, "Utilities"),
            row("E1", 5.0, 60.0e9, 40.0, "Energy"),
        ]
    }

    fn weights(pairs: &[(&str, f64)]) -> Vec<(String, f64)> {
        pairs.iter().map(|(s, w)| (s.to_string(), *w)).collect()
    }

    #[test]
    fn test_apportion_largest_remainder() {
        let result = apportion_slots(
            &weights(&[("Technology", 0.5), ("Utilities", 0.3), ("Energy", 0.2)]),
            7,
        );
        // Exact shares 3.5 / 2.1 / 1.4: floors 3/2/1, leftover goes to
        // the largest remainder (Technology)
        assert_eq!(
            result,
            vec![
                ("Energy".to_string(), 1),
                ("Technology".to_string(), 4),
                ("Utilities".to_string(), 2),
            ]
        );
    }

    #[test]
    fn test_apportion_tie_broken_by_name() {
        let result = apportion_slots(&weights(&[("B", 0.5), ("A", 0.5)]), 3);
        // Equal remainders: "A" wins the leftover slot alphabetically
        assert_eq!(result, vec![("A".to_string(), 2), ("B".to_string(), 1)]);
    }

    #[test]
    fn test_apportion_unnormalized_weights() {
        let result = apportion_slots(&weights(&[("A", 2.0), ("B", 2.0)]), 4);
        assert_eq!(result, vec![("A".to_string(), 2), ("B".to_string(), 2)]);
    }

    #[test]
    fn test_allocation_conserves_amount() {
        let opts = PortfolioOptions {
            amount: 9_000.0,
            slots: 5,
            ..Default::default()
        };
        let allocations = build_portfolio_sector_balanced(
            &universe(),
            &opts,
            &weights(&[("Technology", 0.5), ("Utilities", 0.3), ("Energy", 0.2)]),
        );

        assert_eq!(allocations.len(), 5);
        let total: f64 = allocations.iter().map(|a| a.dollars).sum();
        assert!((total - 9_000.0).abs() < 1e-6);
    }

    #[test]
    fn test_count_capped_by_eligible_pool() {
        let opts = PortfolioOptions {
            amount: 6_000.0,
            slots: 10,
            ..Default::default()
        };
        let allocations = build_portfolio_sector_balanced(
            &universe(),
            &opts,
            &weights(&[("Technology", 0.6), ("Utilities", 0.4)]),
        );

        // Only six price-valid rows exist in total (backfill included)
        assert_eq!(allocations.len(), 6);
        let total: f64 = allocations.iter().map(|a| a.dollars).sum();
        assert!((total - 6_000.0).abs() < 1e-6);
    }

    #[test]
    fn test_backfill_ignores_sector_targets() {
        let opts = PortfolioOptions {
            amount: 4_000.0,
            slots: 4,
            ..Default::default()
        };
        // Utilities can only supply two names; the rest must backfill
        // from other sectors.
        let allocations = build_portfolio_sector_balanced(
            &universe(),
            &opts,
            &weights(&[("Utilities", 1.0)]),
        );

        assert_eq!(allocations.len(), 4);
        assert!(allocations.iter().any(|a| a.notes.as_deref() == Some("backfill")));
        let total: f64 = allocations.iter().map(|a| a.dollars).sum();
        assert!((total - 4_000.0).abs() < 1e-6);
    }

    #[test]
    fn test_est_shares_follow_price() {
        let opts = PortfolioOptions {
            amount: 1_000.0,
            slots: 1,
            ..Default::default()
        };
        let allocations = build_portfolio_sector_balanced(
            &universe(),
            &opts,
            &weights(&[("Energy", 1.0)]),
        );

        assert_eq!(allocations.len(), 1);
        let a = &allocations[0];
        assert_eq!(a.ticker, "E1");
        assert!((a.est_shares.unwrap() - 1_000.0 / 40.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_universe_returns_empty() {
        let opts = PortfolioOptions::default();
        let allocations =
            build_portfolio_sector_balanced(&[], &opts, &weights(&[("Technology", 1.0)]));
        assert!(allocations.is_empty());
    }

    #[test]
    fn test_zero_amount_or_slots_rejected() {
        let mut opts = PortfolioOptions::default();
        opts.amount = 0.0;
        assert!(build_portfolio_sector_balanced(
            &universe(),
            &opts,
            &weights(&[("Energy", 1.0)])
        )
        .is_empty());

        let mut opts = PortfolioOptions::default();
        opts.slots = 0;
        assert!(build_portfolio_sector_balanced(
            &universe(),
            &opts,
            &weights(&[("Energy", 1.0)])
        )
        .is_empty());
    }
}
