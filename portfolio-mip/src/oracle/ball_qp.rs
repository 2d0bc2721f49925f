//! Projected-gradient solver for the ball-constrained subproblem.
//!
//! Minimizes a linear functional `g . d` over the Euclidean ball
//! `||d||_2 <= radius`. This is the generic-solver counterpart to the
//! closed form in the oracle: it treats the subproblem as an opaque convex
//! program and iterates gradient steps with projection back onto the ball.
//! Tests use it as the cross-check against the closed form.

/// Settings for the projected-gradient solve.
#[derive(Debug, Clone)]
pub struct BallQpSettings {
    /// Maximum gradient iterations.
    pub max_iter: usize,

    /// Convergence tolerance on the iterate displacement.
    pub tol: f64,
}

impl Default for BallQpSettings {
    fn default() -> Self {
        Self {
            max_iter: 100,
            tol: 1e-12,
        }
    }
}

/// Result of a ball subproblem solve.
#[derive(Debug, Clone)]
pub struct BallQpResult {
    /// Minimizing perturbation.
    pub d: Vec<f64>,

    /// Objective value `g . d` at the minimizer.
    pub value: f64,

    /// Iterations performed.
    pub iterations: usize,

    /// Whether the displacement dropped below tolerance.
    pub converged: bool,
}

/// Projected-gradient minimizer over a Euclidean ball.
#[derive(Debug, Clone)]
pub struct BallQp {
    settings: BallQpSettings,
}

impl BallQp {
    /// Create a solver with the given settings.
    pub fn new(settings: BallQpSettings) -> Self {
        Self { settings }
    }

    /// Minimize `gradient . d` subject to `||d||_2 <= radius`.
    pub fn minimize(&self, gradient: &[f64], radius: f64) -> BallQpResult {
        let n = gradient.len();
        let gnorm: f64 = gradient.iter().map(|g| g * g).sum::<f64>().sqrt();

        if radius <= 0.0 || gnorm == 0.0 {
            // The ball degenerates to the origin, or the objective is
            // constant; either way d = 0 is optimal.
            return BallQpResult {
                d: vec![0.0; n],
                value: 0.0,
                iterations: 0,
                converged: true,
            };
        }

        // Constant gradient: a step long enough to exit the ball makes the
        // projection land on the optimal boundary point immediately, but we
        // still iterate to convergence like a generic solver would.
        let step = (radius + 1.0) / gnorm;

        let mut d = vec![0.0; n];
        let mut iterations = 0;
        let mut converged = false;
        while iterations < self.settings.max_iter {
            let proposal: Vec<f64> = d.iter().zip(gradient).map(|(di, g)| di - step * g).collect();
            let next = project_onto_ball(&proposal, radius);

            let displacement: f64 = next
                .iter()
                .zip(&d)
                .map(|(a, b)| (a - b) * (a - b))
                .sum::<f64>()
                .sqrt();

            d = next;
            iterations += 1;

            if displacement <= self.settings.tol {
                converged = true;
                break;
            }
        }

        let value = gradient.iter().zip(&d).map(|(g, di)| g * di).sum();
        BallQpResult {
            d,
            value,
            iterations,
            converged,
        }
    }
}

/// Euclidean projection onto the ball of the given radius.
fn project_onto_ball(point: &[f64], radius: f64) -> Vec<f64> {
    let norm: f64 = point.iter().map(|p| p * p).sum::<f64>().sqrt();
    if norm <= radius {
        return point.to_vec();
    }
    let scale = radius / norm;
    point.iter().map(|p| p * scale).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimizer_on_boundary() {
        let solver = BallQp::new(BallQpSettings::default());
        let g = [3.0, 4.0];
        let res = solver.minimize(&g, 2.0);

        assert!(res.converged);
        // Optimal d = -radius * g / ||g|| = (-1.2, -1.6), value -2 * 5.
        assert!((res.d[0] + 1.2).abs() < 1e-10);
        assert!((res.d[1] + 1.6).abs() < 1e-10);
        assert!((res.value + 10.0).abs() < 1e-10);
    }

    #[test]
    fn test_zero_radius() {
        let solver = BallQp::new(BallQpSettings::default());
        let res = solver.minimize(&[1.0, 1.0], 0.0);
        assert!(res.converged);
        assert_eq!(res.d, vec![0.0, 0.0]);
        assert_eq!(res.value, 0.0);
    }

    #[test]
    fn test_zero_gradient() {
        let solver = BallQp::new(BallQpSettings::default());
        let res = solver.minimize(&[0.0, 0.0, 0.0], 5.0);
        assert!(res.converged);
        assert_eq!(res.value, 0.0);
    }

    #[test]
    fn test_projection() {
        // Inside the ball: unchanged.
        let p = project_onto_ball(&[0.3, 0.4], 1.0);
        assert_eq!(p, vec![0.3, 0.4]);

        // Outside: scaled back to the boundary.
        let p = project_onto_ball(&[3.0, 4.0], 1.0);
        assert!((p[0] - 0.6).abs() < 1e-12);
        assert!((p[1] - 0.8).abs() < 1e-12);
    }
}
