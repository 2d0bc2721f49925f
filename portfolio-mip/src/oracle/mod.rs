//! Separation oracle for the robust return constraint.
//!
//! The master problem enforces `z <= p . x` for every return vector `p` in
//! the uncertainty ball lazily: at each integer-feasible candidate the
//! oracle finds the worst-case `p` and either certifies the candidate or
//! hands back a violated cut.

mod ball_qp;
mod worst_case;

pub use ball_qp::{BallQp, BallQpResult, BallQpSettings};
pub use worst_case::{WorstCase, WorstCaseOracle};

use crate::error::SolveResult;
use crate::master::LinearCut;

/// A candidate incumbent handed to a cut generator: the current weight
/// vector and the surrogate objective value.
#[derive(Debug, Clone, Copy)]
pub struct Candidate<'a> {
    /// Portfolio weights at the candidate.
    pub weights: &'a [f64],

    /// Surrogate objective value `z` at the candidate.
    pub surrogate: f64,
}

/// Strategy interface between the search driver and cut generation.
///
/// One operation: inspect a candidate and either return a violated cut for
/// the master problem or `None` when the candidate is already conservative.
/// Implementations must be stateless and side-effect-free per call so a
/// driver may invoke them from any search context.
pub trait CutGenerator {
    /// Propose a cut for the candidate, or `None` if no cut is needed.
    fn propose_cut(&self, candidate: &Candidate<'_>) -> SolveResult<Option<LinearCut>>;
}
