//! Grid-search constraint solver.
//!
//! Enumerates leverage × stop-loss × take-profit combinations in a fixed
//! order. For each combination the first (largest) candidate size that
//! satisfies every constraint is taken; the combination with the strictly
//! greatest `size / leverage` wins.

use std::collections::BTreeMap;

use tracing::debug;

use super::constraint::{Assignment, ConstraintKind, ConstraintSet};
use super::solution::RiskSolution;
use crate::domain::{Portfolio, ProfileParams};

/// Smallest tradable position, in units.
pub const MIN_POSITION_SIZE: f64 = 100.0;
/// Largest position as a fraction of capital.
pub const MAX_POSITION_FRACTION: f64 = 0.5;

pub const STOP_LOSS_RANGE: (f64, f64) = (0.005, 0.05);
pub const TAKE_PROFIT_RANGE: (f64, f64) = (0.01, 0.15);

const STOP_LOSS_CANDIDATES: [f64; 4] = [0.005, 0.01, 0.02, 0.05];
const TAKE_PROFIT_MULTIPLIERS: [f64; 3] = [1.5, 2.0, 3.0];
const SIZE_CANDIDATES: [f64; 6] = [100_000.0, 50_000.0, 10_000.0, 5_000.0, 1_000.0, 100.0];

pub const NO_SOLUTION: &str = "No assignment satisfies all risk constraints";

/// Slack for domain bounds hit by products like `0.05 * 3`.
const DOMAIN_EPS: f64 = 1e-12;

fn within(value: f64, (lo, hi): (f64, f64)) -> bool {
    value >= lo - DOMAIN_EPS && value <= hi + DOMAIN_EPS
}

/// Variable domains for one solve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Domains {
    pub position: (f64, f64),
    pub stop_loss: (f64, f64),
    pub take_profit: (f64, f64),
    pub leverage: (f64, f64),
}

impl Domains {
    pub fn new(params: &ProfileParams, capital: f64) -> Self {
        Self {
            position: (MIN_POSITION_SIZE, capital * MAX_POSITION_FRACTION),
            stop_loss: STOP_LOSS_RANGE,
            take_profit: TAKE_PROFIT_RANGE,
            leverage: (1.0, params.max_leverage),
        }
    }

    /// Leverage candidates `{max, max/2, 1}`, descending and deduplicated.
    pub fn leverage_candidates(&self) -> Vec<f64> {
        let (lo, hi) = self.leverage;
        let mut out: Vec<f64> = [hi, hi / 2.0, 1.0]
            .into_iter()
            .filter(|l| (lo..=hi).contains(l))
            .collect();
        out.sort_by(|a, b| b.total_cmp(a));
        out.dedup();
        out
    }

    pub fn stop_loss_candidates(&self) -> impl Iterator<Item = f64> + '_ {
        STOP_LOSS_CANDIDATES
            .into_iter()
            .filter(|s| within(*s, self.stop_loss))
    }

    /// Take-profit candidates for a given stop, skipping those outside the domain.
    pub fn take_profit_candidates(&self, stop_loss: f64) -> impl Iterator<Item = f64> + '_ {
        TAKE_PROFIT_MULTIPLIERS
            .into_iter()
            .map(move |m| stop_loss * m)
            .filter(|t| within(*t, self.take_profit))
    }

    /// Size candidates clipped to the upper bound, descending, deduplicated,
    /// and never below the floor.
    pub fn size_candidates(&self) -> Vec<f64> {
        let (lo, hi) = self.position;
        let mut out: Vec<f64> = Vec::with_capacity(SIZE_CANDIDATES.len());
        for size in SIZE_CANDIDATES.map(|s| s.min(hi)) {
            if size < lo || out.last() == Some(&size) {
                continue;
            }
            out.push(size);
        }
        out
    }

    pub fn position_is_empty(&self) -> bool {
        self.position.1 < self.position.0
    }
}

/// First-failing-constraint counts over every assignment the search tested.
#[derive(Debug, Default)]
struct Rejections {
    tested: usize,
    by_kind: BTreeMap<ConstraintKind, usize>,
}

impl Rejections {
    fn record(&mut self, kind: ConstraintKind) {
        *self.by_kind.entry(kind).or_default() += 1;
    }

    fn into_violations(self, constraints: &ConstraintSet) -> Vec<String> {
        let mut lines = vec![NO_SOLUTION.to_string()];
        for (kind, count) in &self.by_kind {
            let bound = constraints
                .get(*kind)
                .map(|c| c.describe())
                .unwrap_or_default();
            lines.push(format!(
                "{kind} ({bound}) rejected {count} of {} candidate assignments",
                self.tested
            ));
        }
        lines
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RiskConstraintSolver;

impl RiskConstraintSolver {
    pub fn new() -> Self {
        Self
    }

    /// Finds the largest margin-efficient position the profile allows.
    ///
    /// Never fails: an infeasible problem yields an invalid solution whose
    /// violation list explains what blocked the search.
    pub fn solve(
        &self,
        params: &ProfileParams,
        portfolio: &Portfolio,
        current_price: f64,
    ) -> RiskSolution {
        let capital = portfolio.capital();
        let constraints = ConstraintSet::for_profile(params, capital);
        let domains = Domains::new(params, capital);

        if domains.position_is_empty() {
            debug!(capital, "position size domain is empty");
            return RiskSolution::infeasible(
                current_price,
                vec![
                    NO_SOLUTION.to_string(),
                    format!(
                        "position size domain is empty: {:.0}% of capital ({:.2}) is below the {:.0} unit minimum",
                        MAX_POSITION_FRACTION * 100.0,
                        domains.position.1,
                        MIN_POSITION_SIZE
                    ),
                ],
            );
        }

        let leverages = domains.leverage_candidates();
        if leverages.is_empty() {
            return RiskSolution::infeasible(
                current_price,
                vec![
                    NO_SOLUTION.to_string(),
                    format!(
                        "leverage domain is empty: max leverage {:.1}x is below 1x",
                        params.max_leverage
                    ),
                ],
            );
        }
        let sizes = domains.size_candidates();

        let mut best: Option<Assignment> = None;
        let mut rejections = Rejections::default();

        for &leverage in &leverages {
            for stop_loss_pct in domains.stop_loss_candidates() {
                for take_profit_pct in domains.take_profit_candidates(stop_loss_pct) {
                    for &position_size in &sizes {
                        let a = Assignment {
                            position_size,
                            stop_loss_pct,
                            take_profit_pct,
                            leverage,
                        };
                        rejections.tested += 1;
                        match constraints.first_violation(&a) {
                            Some(c) => rejections.record(c.kind()),
                            None => {
                                if best.map_or(true, |b| a.objective() > b.objective()) {
                                    best = Some(a);
                                }
                                break;
                            }
                        }
                    }
                }
            }
        }

        match best {
            Some(a) => {
                debug!(
                    size = a.position_size,
                    leverage = a.leverage,
                    stop_loss_pct = a.stop_loss_pct,
                    take_profit_pct = a.take_profit_pct,
                    tested = rejections.tested,
                    "risk solution found"
                );
                RiskSolution::from_assignment(&a, current_price)
            }
            None => {
                debug!(tested = rejections.tested, "no feasible risk assignment");
                RiskSolution::infeasible(current_price, rejections.into_violations(&constraints))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TraderProfile;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    fn portfolio(capital: f64) -> Portfolio {
        Portfolio::with_capital(capital).unwrap()
    }

    #[test]
    fn size_candidates_clipped_and_deduplicated() {
        let d = Domains::new(&TraderProfile::Balanced.params(), 10_000.0);
        // 100000, 50000, 10000 all clip to 5000
        assert_eq!(d.size_candidates(), vec![5_000.0, 1_000.0, 100.0]);

        let d = Domains::new(&TraderProfile::Balanced.params(), 1_000_000.0);
        assert_eq!(
            d.size_candidates(),
            vec![100_000.0, 50_000.0, 10_000.0, 5_000.0, 1_000.0, 100.0]
        );
    }

    #[test]
    fn size_candidates_skip_below_floor() {
        // upper bound 150: 150 (clipped) then 100
        let d = Domains::new(&TraderProfile::Balanced.params(), 300.0);
        assert_eq!(d.size_candidates(), vec![150.0, 100.0]);
    }

    #[test]
    fn leverage_candidates_descending() {
        let d = Domains::new(&TraderProfile::Aggressive.params(), 10_000.0);
        assert_eq!(d.leverage_candidates(), vec![10.0, 5.0, 1.0]);
        let d = Domains::new(&TraderProfile::Conservative.params(), 10_000.0);
        assert_eq!(d.leverage_candidates(), vec![2.0, 1.0]);
    }

    #[test]
    fn take_profit_candidates_respect_domain() {
        let d = Domains::new(&TraderProfile::Balanced.params(), 10_000.0);
        // 0.005 * 1.5 = 0.0075 is below 0.01
        let tps: Vec<f64> = d.take_profit_candidates(0.005).collect();
        assert_eq!(tps.len(), 2);
        assert_approx(tps[0], 0.01);
        assert_approx(tps[1], 0.015);
        // 0.05 * 3 = 0.15 is on the boundary
        assert_eq!(d.take_profit_candidates(0.05).count(), 3);
    }

    #[test]
    fn balanced_solution_on_ten_thousand() {
        let s = RiskConstraintSolver::new().solve(
            &TraderProfile::Balanced.params(),
            &portfolio(10_000.0),
            1.1,
        );
        assert!(s.is_valid);
        // size 5000 at leverage 1 maximizes size / leverage
        assert_eq!(s.max_position_size, 5_000.0);
        assert_eq!(s.leverage, 1.0);
        // first tie winner: stop 0.5 %, take 1 %
        assert_approx(s.stop_loss_pct, 0.005);
        assert_approx(s.take_profit_pct, 0.01);
        assert_approx(s.stop_loss, 1.1 * 0.995);
        assert_approx(s.take_profit, 1.1 * 1.01);
        assert_approx(s.risk_amount, 25.0);
    }

    #[test]
    fn aggressive_needs_wider_take_profit() {
        let s = RiskConstraintSolver::new().solve(
            &TraderProfile::Aggressive.params(),
            &portfolio(10_000.0),
            1.1,
        );
        // multiplier 3: take 0.005 * 3 = 0.015
        assert_approx(s.take_profit_pct, 0.015);
    }

    #[test]
    fn tiny_capital_is_infeasible() {
        let s = RiskConstraintSolver::new().solve(
            &TraderProfile::Conservative.params(),
            &portfolio(10.0),
            1.1,
        );
        assert!(!s.is_valid);
        assert_eq!(s.max_position_size, 0.0);
        assert_eq!(s.stop_loss, 1.1);
        assert_eq!(s.violations[0], NO_SOLUTION);
        assert!(s.violations[1].starts_with("position size domain is empty"));
    }

    #[test]
    fn small_capital_still_feasible() {
        // capital 250: sizes {125, 100}; risk 125 * 0.005 = 0.625 ≤ 2.5,
        // margin 125 ≤ 225
        let s = RiskConstraintSolver::new().solve(
            &TraderProfile::Conservative.params(),
            &portfolio(250.0),
            1.0,
        );
        assert!(s.is_valid);
        assert_eq!(s.max_position_size, 125.0);
    }

    #[test]
    fn empty_leverage_domain_is_infeasible() {
        let solver = RiskConstraintSolver::new();
        // leverage domain [1, 0.5] is empty
        let mut params = TraderProfile::Conservative.params();
        params.max_leverage = 0.5;
        let s = solver.solve(&params, &portfolio(10_000.0), 1.0);
        assert!(!s.is_valid);
        assert!(s.violations[1].starts_with("leverage domain is empty"));
    }

    #[test]
    fn tally_lists_blocking_constraint() {
        // cap 10000 * 0.00001 = 0.1 < smallest risk 100 * 0.005 = 0.5
        let mut params = TraderProfile::Conservative.params();
        params.max_risk_per_trade = 0.00001;
        let s = RiskConstraintSolver::new().solve(&params, &portfolio(10_000.0), 1.0);
        assert!(!s.is_valid);
        assert_eq!(s.violations.len(), 2);
        assert!(s.violations[1].starts_with("risk cap"), "{:?}", s.violations);
    }

    #[test]
    fn valid_solution_has_no_violations() {
        for profile in TraderProfile::ALL {
            let s = RiskConstraintSolver::new().solve(&profile.params(), &portfolio(50_000.0), 1.3);
            assert!(s.is_valid);
            assert!(s.violations.is_empty());
            let set = ConstraintSet::for_profile(&profile.params(), 50_000.0);
            assert!(set.violations(&s.assignment().unwrap()).is_empty());
        }
    }
}
