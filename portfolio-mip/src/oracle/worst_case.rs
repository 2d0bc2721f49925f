//! Worst-case return oracle.
//!
//! Given candidate weights `x`, the oracle solves
//!
//! ```text
//! minimize  p . x
//! over      p_i = mean_i + stddev_i * d_i,  ||d||_2 <= gamma
//! ```
//!
//! By Cauchy-Schwarz the minimizing direction is
//! `d* = -gamma * (stddev . x) / ||stddev . x||_2` (elementwise product),
//! which gives `worst_p_i = mean_i - gamma * stddev_i^2 * x_i / norm` and
//! worst value `mean . x - gamma * norm`. The ball always contains `d = 0`,
//! so the subproblem is feasible for every candidate; any failure here is a
//! model-construction bug and is reported as a fatal oracle error.

use super::ball_qp::{BallQp, BallQpSettings};
use super::{Candidate, CutGenerator};
use crate::error::{SolveError, SolveResult};
use crate::master::{CutSource, LinearCut, VarLayout};
use crate::model::Instance;
use crate::settings::OracleMode;

/// Numerical floor below which the perturbation norm is treated as zero.
const NORM_FLOOR: f64 = 1e-14;

/// Worst-case return vector and its value for a fixed candidate.
#[derive(Debug, Clone)]
pub struct WorstCase {
    /// The minimizing return vector `worst_p`.
    pub prices: Vec<f64>,

    /// `worst_p . x` at the candidate.
    pub value: f64,
}

/// Separation oracle over the uncertainty ball.
///
/// Holds its own copy of the instance data so calls are self-contained:
/// no ambient state, no mutation, safe to invoke from any search driver.
pub struct WorstCaseOracle {
    /// Problem data.
    instance: Instance,

    /// Cut admission tolerance.
    cut_tol: f64,

    /// Subproblem solve mode.
    mode: OracleMode,

    /// Layout used to materialize cuts for the master.
    layout: VarLayout,
}

impl WorstCaseOracle {
    /// Create an oracle for the given instance.
    pub fn new(instance: Instance, cut_tol: f64, mode: OracleMode) -> Self {
        let layout = VarLayout::new(instance.num_assets());
        Self {
            instance,
            cut_tol,
            mode,
            layout,
        }
    }

    /// Compute the worst-case return vector for candidate weights.
    pub fn worst_case(&self, weights: &[f64]) -> SolveResult<WorstCase> {
        let wc = match self.mode {
            OracleMode::ClosedForm => self.worst_case_closed_form(weights),
            OracleMode::ProjectedGradient => self.worst_case_projected(weights)?,
        };

        if !wc.value.is_finite() || wc.prices.iter().any(|p| !p.is_finite()) {
            // Cannot happen for finite instance data; a non-finite result
            // means the model upstream is broken.
            return Err(SolveError::Oracle(format!(
                "worst-case subproblem produced non-finite result (value {})",
                wc.value
            )));
        }
        Ok(wc)
    }

    /// Closed-form minimizer over the ball.
    fn worst_case_closed_form(&self, weights: &[f64]) -> WorstCase {
        let means = self.instance.means();
        let stddevs = self.instance.stddevs();
        let gamma = self.instance.gamma();

        let norm: f64 = stddevs
            .iter()
            .zip(weights)
            .map(|(s, x)| (s * x) * (s * x))
            .sum::<f64>()
            .sqrt();

        // With no uncertainty (gamma = 0) or no exposure to it, the worst
        // case is the nominal mean vector, exactly.
        if gamma == 0.0 || norm < NORM_FLOOR {
            let value = self.instance.expected_return(weights);
            return WorstCase {
                prices: means.to_vec(),
                value,
            };
        }

        let prices: Vec<f64> = means
            .iter()
            .zip(stddevs)
            .zip(weights)
            .map(|((m, s), x)| m - gamma * s * s * x / norm)
            .collect();
        let value = self.instance.expected_return(weights) - gamma * norm;

        WorstCase { prices, value }
    }

    /// Iterative minimizer: delegate the ball subproblem to the projected
    /// gradient solver and map the perturbation back to return space.
    fn worst_case_projected(&self, weights: &[f64]) -> SolveResult<WorstCase> {
        let means = self.instance.means();
        let stddevs = self.instance.stddevs();
        let gamma = self.instance.gamma();

        let gradient: Vec<f64> = stddevs.iter().zip(weights).map(|(s, x)| s * x).collect();
        let result = BallQp::new(BallQpSettings::default()).minimize(&gradient, gamma);
        if !result.converged {
            return Err(SolveError::Oracle(format!(
                "ball subproblem did not converge in {} iterations",
                result.iterations
            )));
        }

        let prices: Vec<f64> = means
            .iter()
            .zip(stddevs)
            .zip(&result.d)
            .map(|((m, s), d)| m + s * d)
            .collect();
        let value = prices.iter().zip(weights).map(|(p, x)| p * x).sum();

        Ok(WorstCase { prices, value })
    }
}

impl CutGenerator for WorstCaseOracle {
    /// Decide whether the candidate needs a cut.
    ///
    /// A cut `z <= worst_p . x` is emitted iff the worst case undercuts the
    /// surrogate by more than the admission tolerance; the tolerance keeps
    /// floating-point noise from re-proposing the same hyperplane forever.
    fn propose_cut(&self, candidate: &Candidate<'_>) -> SolveResult<Option<LinearCut>> {
        let wc = self.worst_case(candidate.weights)?;

        if wc.value < candidate.surrogate - self.cut_tol {
            let cut = LinearCut::surrogate_bound(self.layout, &wc.prices, CutSource::WorstCase);
            if !cut.is_valid() {
                return Err(SolveError::CutGeneration(
                    "oracle produced a degenerate cut".into(),
                ));
            }
            Ok(Some(cut))
        } else {
            Ok(None)
        }
    }
}
