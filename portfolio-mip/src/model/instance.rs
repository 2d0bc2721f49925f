//! Problem instance: the asset universe and the uncertainty set.

use serde::{Deserialize, Serialize};

use crate::error::{SolveError, SolveResult};

/// A robust portfolio selection instance.
///
/// Holds the immutable problem data: per-asset historical mean returns and
/// standard deviations, the uncertainty radius, and the cardinality cap.
/// All data is threaded explicitly through constructors; nothing lives in
/// module-level state, so instances can be solved repeatedly or in parallel
/// without cross-contamination.
///
/// The uncertainty set is the ball
/// `U = { p : p_i = mean_i + stddev_i * d_i, ||d||_2 <= gamma }`,
/// i.e. membership constrains `sum(d_i^2) <= gamma^2` (the squared radius).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Instance {
    /// Historical mean return per asset.
    means: Vec<f64>,

    /// Historical standard deviation per asset.
    stddevs: Vec<f64>,

    /// Radius of the perturbation ball.
    gamma: f64,

    /// Maximum number of assets that may be held.
    max_assets: usize,
}

impl Instance {
    /// Create an instance with the default cardinality cap of
    /// `max(1, n/4)` held assets.
    pub fn new(means: Vec<f64>, stddevs: Vec<f64>, gamma: f64) -> SolveResult<Self> {
        let n = means.len();
        Self::with_max_assets(means, stddevs, gamma, (n / 4).max(1))
    }

    /// Create an instance with an explicit cardinality cap.
    pub fn with_max_assets(
        means: Vec<f64>,
        stddevs: Vec<f64>,
        gamma: f64,
        max_assets: usize,
    ) -> SolveResult<Self> {
        let instance = Self {
            means,
            stddevs,
            gamma,
            max_assets,
        };
        instance.validate()?;
        Ok(instance)
    }

    /// The classic Ben-Tal/Nemirovski synthetic universe:
    /// `mean_i = 1.15 + i * 0.05/150` and
    /// `stddev_i = 0.05/450 * sqrt(2 * i * n * (n+1))` for `i = 1..n`.
    ///
    /// Later assets return more on average and fluctuate more.
    pub fn synthetic(n: usize, gamma: f64) -> SolveResult<Self> {
        let means = (1..=n).map(|i| 1.15 + i as f64 * 0.05 / 150.0).collect();
        let stddevs = (1..=n)
            .map(|i| 0.05 / 450.0 * (2.0 * i as f64 * n as f64 * (n as f64 + 1.0)).sqrt())
            .collect();
        Self::new(means, stddevs, gamma)
    }

    /// Check instance consistency.
    pub fn validate(&self) -> SolveResult<()> {
        let n = self.means.len();
        if n == 0 {
            return Err(SolveError::InvalidInstance("no assets".into()));
        }
        if self.stddevs.len() != n {
            return Err(SolveError::InvalidInstance(format!(
                "{} means but {} stddevs",
                n,
                self.stddevs.len()
            )));
        }
        if self.means.iter().any(|m| !m.is_finite()) {
            return Err(SolveError::InvalidInstance("non-finite mean return".into()));
        }
        if self.stddevs.iter().any(|s| !s.is_finite() || *s < 0.0) {
            return Err(SolveError::InvalidInstance(
                "standard deviations must be finite and nonnegative".into(),
            ));
        }
        if !self.gamma.is_finite() || self.gamma < 0.0 {
            return Err(SolveError::InvalidInstance(format!(
                "gamma must be finite and nonnegative, got {}",
                self.gamma
            )));
        }
        if self.max_assets == 0 || self.max_assets > n {
            return Err(SolveError::InvalidInstance(format!(
                "cardinality cap {} outside 1..={}",
                self.max_assets, n
            )));
        }
        Ok(())
    }

    /// Number of assets.
    pub fn num_assets(&self) -> usize {
        self.means.len()
    }

    /// Mean returns.
    pub fn means(&self) -> &[f64] {
        &self.means
    }

    /// Standard deviations.
    pub fn stddevs(&self) -> &[f64] {
        &self.stddevs
    }

    /// Uncertainty ball radius.
    pub fn gamma(&self) -> f64 {
        self.gamma
    }

    /// Maximum number of assets that may be held.
    pub fn max_assets(&self) -> usize {
        self.max_assets
    }

    /// Largest single-asset mean return; an upper bound on any expected
    /// portfolio return and hence on the surrogate objective.
    pub fn max_mean(&self) -> f64 {
        self.means.iter().fold(f64::NEG_INFINITY, |a, &b| a.max(b))
    }

    /// Nominal expected return of a weight vector.
    pub fn expected_return(&self, weights: &[f64]) -> f64 {
        self.means.iter().zip(weights).map(|(m, x)| m * x).sum()
    }
}
