//! Dense linear programming engine for the portfolio solver.
//!
//! This crate provides the continuous relaxation engine that the
//! branch-and-bound layer (`portfolio-mip`) re-solves at every node:
//!
//! - **Problem types**: linear objective, `<=`/`>=`/`=` rows, per-variable
//!   bounds with infinities allowed
//! - **Algorithm**: two-phase dense tableau simplex with Bland's rule
//!
//! The master relaxations this engine sees are small (tens of variables,
//! tens of rows plus accumulated cuts), so a dense tableau is the right
//! tool; there is no sparse path.
//!
//! # Example
//!
//! ```
//! use portfolio_core::{solve, LpProblem, LpSettings, LpStatus};
//!
//! // min -x0 - x1  s.t.  x0 + x1 <= 1,  x >= 0
//! let mut prob = LpProblem::new(2);
//! prob.set_objective(vec![-1.0, -1.0]);
//! prob.add_le_row(vec![1.0, 1.0], 1.0);
//! prob.set_bounds(0, 0.0, f64::INFINITY);
//! prob.set_bounds(1, 0.0, f64::INFINITY);
//!
//! let result = solve(&prob, &LpSettings::default()).unwrap();
//! assert_eq!(result.status, LpStatus::Optimal);
//! assert!((result.obj_val + 1.0).abs() < 1e-9);
//! ```

#![warn(clippy::all)]

pub mod problem;
pub mod simplex;

pub use problem::{LpError, LpProblem, LpResult, LpSettings, LpStatus, RowOp};

/// Solve a linear program.
///
/// Validates the problem, converts it to standard form, and runs the
/// two-phase simplex.
pub fn solve(problem: &LpProblem, settings: &LpSettings) -> Result<LpResult, LpError> {
    problem.validate()?;
    simplex::solve_simplex(problem, settings)
}
