//! LP problem representation and solver settings.

use thiserror::Error;

/// Errors from the LP engine.
#[derive(Error, Debug)]
pub enum LpError {
    /// Problem validation failed.
    #[error("Invalid LP: {0}")]
    InvalidProblem(String),

    /// The simplex ran into numerical trouble it could not recover from.
    #[error("Numerical error: {0}")]
    Numerical(String),
}

/// Row sense for a linear constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowOp {
    /// `a · x <= rhs`
    Le,
    /// `a · x >= rhs`
    Ge,
    /// `a · x == rhs`
    Eq,
}

/// A dense linear constraint row.
#[derive(Debug, Clone)]
pub struct LpRow {
    /// Coefficients, one per variable.
    pub coefs: Vec<f64>,

    /// Row sense.
    pub op: RowOp,

    /// Right-hand side.
    pub rhs: f64,
}

/// A linear program: `min c · x` subject to rows and variable bounds.
///
/// Bounds default to `(-inf, +inf)`; infinities are allowed on either side.
#[derive(Debug, Clone)]
pub struct LpProblem {
    /// Number of variables.
    num_vars: usize,

    /// Objective coefficients (minimization).
    pub objective: Vec<f64>,

    /// Constraint rows.
    pub rows: Vec<LpRow>,

    /// Per-variable `(lower, upper)` bounds.
    pub bounds: Vec<(f64, f64)>,
}

impl LpProblem {
    /// Create an empty problem over `num_vars` free variables with a zero
    /// objective.
    pub fn new(num_vars: usize) -> Self {
        Self {
            num_vars,
            objective: vec![0.0; num_vars],
            rows: Vec::new(),
            bounds: vec![(f64::NEG_INFINITY, f64::INFINITY); num_vars],
        }
    }

    /// Number of variables.
    pub fn num_vars(&self) -> usize {
        self.num_vars
    }

    /// Number of constraint rows.
    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    /// Set the (minimization) objective vector.
    pub fn set_objective(&mut self, objective: Vec<f64>) {
        self.objective = objective;
    }

    /// Set bounds for one variable.
    pub fn set_bounds(&mut self, var: usize, lower: f64, upper: f64) {
        self.bounds[var] = (lower, upper);
    }

    /// Add a `<=` row.
    pub fn add_le_row(&mut self, coefs: Vec<f64>, rhs: f64) {
        self.rows.push(LpRow { coefs, op: RowOp::Le, rhs });
    }

    /// Add a `>=` row.
    pub fn add_ge_row(&mut self, coefs: Vec<f64>, rhs: f64) {
        self.rows.push(LpRow { coefs, op: RowOp::Ge, rhs });
    }

    /// Add an `=` row.
    pub fn add_eq_row(&mut self, coefs: Vec<f64>, rhs: f64) {
        self.rows.push(LpRow { coefs, op: RowOp::Eq, rhs });
    }

    /// Check structural consistency: dimensions match, data finite where it
    /// must be, bounds ordered.
    pub fn validate(&self) -> Result<(), LpError> {
        if self.objective.len() != self.num_vars {
            return Err(LpError::InvalidProblem(format!(
                "objective has {} entries for {} variables",
                self.objective.len(),
                self.num_vars
            )));
        }
        if self.objective.iter().any(|c| !c.is_finite()) {
            return Err(LpError::InvalidProblem("non-finite objective coefficient".into()));
        }
        for (i, row) in self.rows.iter().enumerate() {
            if row.coefs.len() != self.num_vars {
                return Err(LpError::InvalidProblem(format!(
                    "row {} has {} coefficients for {} variables",
                    i,
                    row.coefs.len(),
                    self.num_vars
                )));
            }
            if row.coefs.iter().any(|c| !c.is_finite()) || !row.rhs.is_finite() {
                return Err(LpError::InvalidProblem(format!("non-finite data in row {}", i)));
            }
        }
        for (j, &(lb, ub)) in self.bounds.iter().enumerate() {
            if lb.is_nan() || ub.is_nan() || lb > ub {
                return Err(LpError::InvalidProblem(format!(
                    "inconsistent bounds [{}, {}] for variable {}",
                    lb, ub, j
                )));
            }
        }
        Ok(())
    }
}

/// LP solver settings.
#[derive(Debug, Clone)]
pub struct LpSettings {
    /// Maximum simplex pivots across both phases.
    pub max_iter: usize,

    /// Feasibility tolerance (phase-1 objective below this is feasible).
    pub tol_feas: f64,

    /// Pivot/reduced-cost tolerance.
    pub tol_pivot: f64,
}

impl Default for LpSettings {
    fn default() -> Self {
        Self {
            max_iter: 10_000,
            tol_feas: 1e-7,
            tol_pivot: 1e-9,
        }
    }
}

/// Status of an LP solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LpStatus {
    /// Optimal solution found.
    Optimal,

    /// No feasible point exists.
    Infeasible,

    /// Objective unbounded below over the feasible region.
    Unbounded,

    /// Pivot limit reached before convergence.
    IterationLimit,
}

/// Result of an LP solve.
#[derive(Debug, Clone)]
pub struct LpResult {
    /// Solve status.
    pub status: LpStatus,

    /// Primal solution in the original variable space (empty unless
    /// `status == Optimal`).
    pub x: Vec<f64>,

    /// Objective value (`f64::INFINITY` when infeasible,
    /// `f64::NEG_INFINITY` when unbounded).
    pub obj_val: f64,

    /// Simplex pivots performed.
    pub iterations: usize,
}

impl LpResult {
    /// Result for an infeasible problem.
    pub fn infeasible(iterations: usize) -> Self {
        Self {
            status: LpStatus::Infeasible,
            x: Vec::new(),
            obj_val: f64::INFINITY,
            iterations,
        }
    }

    /// Result for an unbounded problem.
    pub fn unbounded(iterations: usize) -> Self {
        Self {
            status: LpStatus::Unbounded,
            x: Vec::new(),
            obj_val: f64::NEG_INFINITY,
            iterations,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_dimensions() {
        let mut prob = LpProblem::new(2);
        prob.set_objective(vec![1.0]);
        assert!(prob.validate().is_err());

        prob.set_objective(vec![1.0, 2.0]);
        assert!(prob.validate().is_ok());

        prob.add_le_row(vec![1.0], 0.0);
        assert!(prob.validate().is_err());
    }

    #[test]
    fn test_validate_bounds() {
        let mut prob = LpProblem::new(1);
        prob.set_bounds(0, 1.0, 0.0);
        assert!(prob.validate().is_err());

        prob.set_bounds(0, 0.0, 1.0);
        assert!(prob.validate().is_ok());
    }

    #[test]
    fn test_validate_finiteness() {
        let mut prob = LpProblem::new(1);
        prob.add_le_row(vec![f64::NAN], 1.0);
        assert!(prob.validate().is_err());
    }
}
