//! Risk sizing as a small constraint-satisfaction problem.

pub mod constraint;
pub mod solution;
pub mod solver;

pub use constraint::{Assignment, Constraint, ConstraintKind, ConstraintSet, MARGIN_FRACTION};
pub use solution::RiskSolution;
pub use solver::{Domains, RiskConstraintSolver, MIN_POSITION_SIZE, NO_SOLUTION};
