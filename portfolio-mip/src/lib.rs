//! Robust cardinality-constrained portfolio selection.
//!
//! Solves
//!
//! ```text
//! maximize    z
//! subject to  z <= p . x            for all p in U     (enforced lazily)
//!             sum(x) = 1
//!             0 <= x_i <= y_i,  y_i in {0, 1}
//!             sum(y) <= max_assets
//! U = { p : p_i = mean_i + stddev_i * d_i,  ||d||_2 <= gamma }
//! ```
//!
//! by branch-and-bound over the selection indicators. The semi-infinite
//! robust constraint never enters the master problem whole: at each
//! integer-feasible candidate a separation oracle minimizes `p . x` over
//! the uncertainty ball and, when the worst case undercuts the surrogate
//! `z` by more than a tolerance, injects the single violated cut
//! `z <= worst_p . x` and the relaxation is re-solved. Cuts accumulate
//! monotonically until every candidate the search certifies is
//! conservative with respect to its own worst case.
//!
//! # Example
//!
//! ```no_run
//! use portfolio_mip::{solve_robust, Instance, SolveSettings};
//!
//! let instance = Instance::synthetic(20, 10.0_f64.sqrt()).unwrap();
//! let solution = solve_robust(&instance, &SolveSettings::default()).unwrap();
//!
//! println!("worst-case return: {:.4}", solution.obj_val);
//! for &i in &solution.selected {
//!     println!("asset {:2}: {:.4}", i, solution.weights[i]);
//! }
//! ```

#![warn(missing_docs)]

pub mod cuts;
pub mod error;
pub mod feasibility;
pub mod master;
pub mod model;
pub mod oracle;
pub mod search;
pub mod settings;

mod solve;

pub use error::{SolveError, SolveResult};
pub use feasibility::{audit, FeasibilityReport, FeasibilityViolation};
pub use model::{Instance, RobustSolution, SolveStatus};
pub use oracle::{Candidate, CutGenerator, WorstCase, WorstCaseOracle};
pub use settings::{BranchingRule, NodeSelection, OracleMode, SolveSettings};
pub use solve::solve_robust;
