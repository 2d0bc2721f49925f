//! Branching variable selection.

use super::BoundChange;
use crate::settings::BranchingRule;

/// A branching decision on one selection indicator.
#[derive(Debug, Clone)]
pub struct BranchDecision {
    /// Asset to branch on.
    pub asset: usize,

    /// Current (fractional) indicator value.
    pub value: f64,

    /// Fixing for the "exclude" child (y = 0).
    pub down_branch: BoundChange,

    /// Fixing for the "include" child (y = 1).
    pub up_branch: BoundChange,
}

/// Branching variable selector.
pub struct BranchingSelector {
    /// Branching rule to use.
    rule: BranchingRule,
}

impl BranchingSelector {
    /// Create a selector for the given rule.
    pub fn new(rule: BranchingRule) -> Self {
        Self { rule }
    }

    /// Select an indicator to branch on.
    ///
    /// Returns None if all indicators are integral within tolerance.
    pub fn select(&self, indicators: &[f64], tol: f64) -> Option<BranchDecision> {
        let fractional: Vec<(usize, f64, f64)> = indicators
            .iter()
            .enumerate()
            .filter_map(|(i, &v)| {
                let frac = fractionality(v);
                (frac > tol).then_some((i, v, frac))
            })
            .collect();

        if fractional.is_empty() {
            return None;
        }

        let (asset, value, _) = match self.rule {
            BranchingRule::MostFractional => {
                // Max fractionality; ties go to the lowest index so
                // identical re-solves branch identically.
                let mut best = fractional[0];
                for &cand in &fractional[1..] {
                    if cand.2 > best.2 + 1e-12 {
                        best = cand;
                    }
                }
                best
            }
            BranchingRule::FirstFractional => fractional[0],
        };

        Some(BranchDecision {
            asset,
            value,
            down_branch: BoundChange::exclude(asset),
            up_branch: BoundChange::include(asset),
        })
    }
}

/// Distance to the nearest integer.
fn fractionality(val: f64) -> f64 {
    let frac = val.fract().abs();
    frac.min(1.0 - frac)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fractionality() {
        assert!((fractionality(0.5) - 0.5).abs() < 1e-10);
        assert!((fractionality(0.3) - 0.3).abs() < 1e-10);
        assert!((fractionality(0.7) - 0.3).abs() < 1e-10);
        assert!(fractionality(1.0) < 1e-10);
        assert!(fractionality(0.0) < 1e-10);
    }

    #[test]
    fn test_integral_solution_selects_nothing() {
        let selector = BranchingSelector::new(BranchingRule::MostFractional);
        assert!(selector.select(&[0.0, 1.0, 1.0], 1e-6).is_none());
        assert!(selector.select(&[0.0, 0.9999999, 1.0], 1e-6).is_none());
    }

    #[test]
    fn test_most_fractional() {
        let selector = BranchingSelector::new(BranchingRule::MostFractional);
        let decision = selector.select(&[0.9, 0.5, 0.2], 1e-6).unwrap();
        assert_eq!(decision.asset, 1);
        assert_eq!(decision.down_branch.ub, 0.0);
        assert_eq!(decision.up_branch.lb, 1.0);
    }

    #[test]
    fn test_first_fractional() {
        let selector = BranchingSelector::new(BranchingRule::FirstFractional);
        let decision = selector.select(&[0.9, 0.5, 0.2], 1e-6).unwrap();
        assert_eq!(decision.asset, 0);
    }
}
