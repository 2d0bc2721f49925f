//! Post-solve feasibility audit.
//!
//! Pure predicate checks against the three physical constraints of a
//! portfolio, run unconditionally after every solve that produced weights.
//! Violations are collected into a report and surfaced as a dedicated
//! error by the driver, never logged-and-ignored: a portfolio that fails
//! these checks must halt whatever pipeline consumes it.

use std::fmt;

use crate::model::Instance;

/// Tolerance for the budget identity `sum(x) = 1`.
pub const BUDGET_TOL: f64 = 1e-12;

/// A weight at or above this threshold counts as a held position; below
/// its negation it counts as a short sale.
pub const HOLDING_TOL: f64 = 1e-12;

/// A single violated constraint.
#[derive(Debug, Clone, PartialEq)]
pub enum FeasibilityViolation {
    /// `|sum(x) - 1|` exceeded the budget tolerance.
    Budget {
        /// Actual weight sum.
        sum: f64,
    },

    /// More assets held than the cardinality cap allows.
    Cardinality {
        /// Number of held assets.
        held: usize,
        /// Cap from the instance.
        max_assets: usize,
    },

    /// Some weight is below the short-sale tolerance.
    ShortSale {
        /// Offending asset.
        asset: usize,
        /// Its weight.
        weight: f64,
    },
}

impl fmt::Display for FeasibilityViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeasibilityViolation::Budget { sum } => {
                write!(f, "weights sum to {} instead of 1", sum)
            }
            FeasibilityViolation::Cardinality { held, max_assets } => {
                write!(f, "{} assets held, cap is {}", held, max_assets)
            }
            FeasibilityViolation::ShortSale { asset, weight } => {
                write!(f, "asset {} has negative weight {}", asset, weight)
            }
        }
    }
}

/// Outcome of auditing one portfolio.
#[derive(Debug, Clone)]
pub struct FeasibilityReport {
    /// Weight sum.
    pub weight_sum: f64,

    /// Number of held assets.
    pub assets_held: usize,

    /// Smallest weight.
    pub min_weight: f64,

    /// All violations found (empty for a feasible portfolio).
    pub violations: Vec<FeasibilityViolation>,
}

impl FeasibilityReport {
    /// True when no constraint was violated.
    pub fn is_feasible(&self) -> bool {
        self.violations.is_empty()
    }
}

impl fmt::Display for FeasibilityReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_feasible() {
            return write!(
                f,
                "feasible (sum={}, held={}, min={})",
                self.weight_sum, self.assets_held, self.min_weight
            );
        }
        for (i, v) in self.violations.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{}", v)?;
        }
        Ok(())
    }
}

/// Audit a weight vector against the instance's physical constraints.
pub fn audit(instance: &Instance, weights: &[f64]) -> FeasibilityReport {
    let weight_sum: f64 = weights.iter().sum();
    let assets_held = weights.iter().filter(|&&w| w >= HOLDING_TOL).count();
    let min_weight = weights.iter().copied().fold(f64::INFINITY, f64::min);

    let mut violations = Vec::new();

    if (weight_sum - 1.0).abs() > BUDGET_TOL {
        violations.push(FeasibilityViolation::Budget { sum: weight_sum });
    }

    if assets_held > instance.max_assets() {
        violations.push(FeasibilityViolation::Cardinality {
            held: assets_held,
            max_assets: instance.max_assets(),
        });
    }

    if let Some((asset, &weight)) = weights
        .iter()
        .enumerate()
        .find(|(_, &w)| w < -HOLDING_TOL)
    {
        violations.push(FeasibilityViolation::ShortSale { asset, weight });
    }

    FeasibilityReport {
        weight_sum,
        assets_held,
        min_weight,
        violations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn instance() -> Instance {
        Instance::with_max_assets(vec![1.1; 4], vec![0.1; 4], 1.0, 2).unwrap()
    }

    #[test]
    fn test_feasible_portfolio() {
        let report = audit(&instance(), &[0.5, 0.5, 0.0, 0.0]);
        assert!(report.is_feasible());
        assert_eq!(report.assets_held, 2);
    }

    #[test]
    fn test_budget_violation() {
        let report = audit(&instance(), &[0.5, 0.4, 0.0, 0.0]);
        assert!(!report.is_feasible());
        assert!(matches!(report.violations[0], FeasibilityViolation::Budget { .. }));
    }

    #[test]
    fn test_cardinality_violation() {
        let report = audit(&instance(), &[0.4, 0.3, 0.3, 0.0]);
        assert!(!report.is_feasible());
        assert!(matches!(
            report.violations[0],
            FeasibilityViolation::Cardinality { held: 3, max_assets: 2 }
        ));
    }

    #[test]
    fn test_short_sale_violation() {
        let report = audit(&instance(), &[1.1, -0.1, 0.0, 0.0]);
        assert!(!report.is_feasible());
        assert!(report
            .violations
            .iter()
            .any(|v| matches!(v, FeasibilityViolation::ShortSale { asset: 1, .. })));
    }

    #[test]
    fn test_tolerances_are_tight_but_not_exact() {
        // Noise below the tolerance passes.
        let report = audit(&instance(), &[0.5 + 4e-13, 0.5 + 4e-13, 0.0, -4e-13]);
        assert!(report.is_feasible());

        // Noise above it does not.
        let report = audit(&instance(), &[0.5, 0.5 + 1e-10, 0.0, 0.0]);
        assert!(!report.is_feasible());
    }
}
