//! Master problem backend trait and types.

use crate::error::SolveResult;
use crate::model::Instance;

/// Column layout of the master variable vector `[x | y | z]`.
///
/// `x` are the portfolio weights, `y` the binary selection indicators and
/// `z` the scalar surrogate for the worst-case expected return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VarLayout {
    /// Number of assets.
    n: usize,
}

impl VarLayout {
    /// Layout for an `n`-asset master.
    pub fn new(n: usize) -> Self {
        Self { n }
    }

    /// Number of assets.
    pub fn num_assets(&self) -> usize {
        self.n
    }

    /// Total number of master variables.
    pub fn num_vars(&self) -> usize {
        2 * self.n + 1
    }

    /// Column of weight `x_i`.
    pub fn x(&self, i: usize) -> usize {
        i
    }

    /// Column of indicator `y_i`.
    pub fn y(&self, i: usize) -> usize {
        self.n + i
    }

    /// Column of the surrogate objective `z`.
    pub fn z(&self) -> usize {
        2 * self.n
    }

    /// Slice the weight block out of a master point.
    pub fn weights<'a>(&self, point: &'a [f64]) -> &'a [f64] {
        &point[..self.n]
    }

    /// Slice the indicator block out of a master point.
    pub fn indicators<'a>(&self, point: &'a [f64]) -> &'a [f64] {
        &point[self.n..2 * self.n]
    }
}

/// Status of a master problem solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MasterStatus {
    /// Optimal solution found.
    Optimal,

    /// Relaxation is infeasible (node can be pruned).
    Infeasible,

    /// Relaxation is unbounded (indicates a model-construction bug: the
    /// surrogate is always bounded above by the best single-asset mean).
    Unbounded,

    /// Numerical difficulties.
    NumericalError,
}

/// Result from solving the master problem.
#[derive(Debug, Clone)]
pub struct MasterResult {
    /// Solve status.
    pub status: MasterStatus,

    /// Primal point over the full master layout `[x | y | z]`.
    pub point: Vec<f64>,

    /// Surrogate objective value `z` (the relaxation bound, maximization).
    pub obj_val: f64,
}

impl MasterResult {
    /// Create an infeasible result.
    pub fn infeasible() -> Self {
        Self {
            status: MasterStatus::Infeasible,
            point: Vec::new(),
            obj_val: f64::NEG_INFINITY,
        }
    }
}

/// Source of a cut (for tracking and debugging).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CutSource {
    /// Worst-case return cut from the separation oracle.
    WorstCase,

    /// User-provided cut.
    User,
}

/// A linear cut: `a . v <= rhs` over the master variable vector `v`.
#[derive(Debug, Clone)]
pub struct LinearCut {
    /// Coefficient vector (dense, master layout length).
    pub coefs: Vec<f64>,

    /// Right-hand side.
    pub rhs: f64,

    /// Optional name for debugging.
    pub name: Option<String>,

    /// Source of this cut.
    pub source: CutSource,
}

impl LinearCut {
    /// Create a new cut.
    pub fn new(coefs: Vec<f64>, rhs: f64, source: CutSource) -> Self {
        Self {
            coefs,
            rhs,
            name: None,
            source,
        }
    }

    /// Create a surrogate bound cut `z <= prices . x` for the given layout.
    pub fn surrogate_bound(layout: VarLayout, prices: &[f64], source: CutSource) -> Self {
        let mut coefs = vec![0.0; layout.num_vars()];
        for (i, &p) in prices.iter().enumerate() {
            coefs[layout.x(i)] = -p;
        }
        coefs[layout.z()] = 1.0;
        Self::new(coefs, 0.0, source)
    }

    /// Create a cut with a name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Compute violation: `a . v - rhs` (positive means violated).
    pub fn violation(&self, point: &[f64]) -> f64 {
        let lhs: f64 = self.coefs.iter().zip(point).map(|(a, v)| a * v).sum();
        lhs - self.rhs
    }

    /// Check if the cut is violated by more than `tol`.
    pub fn is_violated(&self, point: &[f64], tol: f64) -> bool {
        self.violation(point) > tol
    }

    /// Check that the cut has usable coefficients (not all zero, finite).
    pub fn is_valid(&self) -> bool {
        let has_nonzero = self.coefs.iter().any(|c| c.abs() > 1e-12);
        let all_finite = self.coefs.iter().all(|c| c.is_finite()) && self.rhs.is_finite();
        has_nonzero && all_finite
    }
}

/// Trait for master problem backends.
///
/// The backend maintains the LP relaxation of the robust portfolio model:
/// the structural constraints, the accumulated cuts and the per-node
/// indicator bounds. Cuts only accumulate; the pool they came from owns
/// deduplication.
pub trait MasterBackend {
    /// Initialize the backend from the instance: budget equality, indicator
    /// coupling, cardinality cap, and the surrogate upper bound.
    fn initialize(&mut self, instance: &Instance) -> SolveResult<()>;

    /// Add a cut. Returns its row identifier.
    fn add_cut(&mut self, cut: &LinearCut) -> usize;

    /// Update bounds of one master variable (used on the indicators when
    /// entering a node).
    fn set_var_bounds(&mut self, var: usize, lb: f64, ub: f64);

    /// Solve the current relaxation.
    fn solve(&mut self) -> SolveResult<MasterResult>;

    /// Number of cuts added so far.
    fn num_cuts(&self) -> usize;

    /// Number of master variables.
    fn num_vars(&self) -> usize;

    /// Number of structural constraints (excluding cuts).
    fn num_base_constraints(&self) -> usize;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout() {
        let layout = VarLayout::new(3);
        assert_eq!(layout.num_vars(), 7);
        assert_eq!(layout.x(2), 2);
        assert_eq!(layout.y(0), 3);
        assert_eq!(layout.z(), 6);

        let point: Vec<f64> = (0..7).map(|v| v as f64).collect();
        assert_eq!(layout.weights(&point), &[0.0, 1.0, 2.0]);
        assert_eq!(layout.indicators(&point), &[3.0, 4.0, 5.0]);
    }

    #[test]
    fn test_surrogate_bound_cut() {
        let layout = VarLayout::new(2);
        let cut = LinearCut::surrogate_bound(layout, &[1.1, 1.2], CutSource::User);

        // z - 1.1 x0 - 1.2 x1 <= 0
        assert_eq!(cut.coefs, vec![-1.1, -1.2, 0.0, 0.0, 1.0]);
        assert_eq!(cut.rhs, 0.0);

        // Point with z above the worst-case return violates the cut.
        let point = vec![0.5, 0.5, 1.0, 1.0, 1.2];
        assert!(cut.is_violated(&point, 1e-9));

        // Point with z at the bound does not.
        let point = vec![0.5, 0.5, 1.0, 1.0, 1.15];
        assert!(!cut.is_violated(&point, 1e-9));
    }

    #[test]
    fn test_cut_validity() {
        let valid = LinearCut::new(vec![1.0, 0.0], 1.0, CutSource::User);
        assert!(valid.is_valid());

        let zero = LinearCut::new(vec![0.0, 0.0], 1.0, CutSource::User);
        assert!(!zero.is_valid());

        let non_finite = LinearCut::new(vec![1.0, f64::NAN], 1.0, CutSource::User);
        assert!(!non_finite.is_valid());
    }
}
