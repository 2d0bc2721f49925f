//! End-to-end tests for robust cardinality-constrained portfolio solves.

use portfolio_mip::{
    audit, solve_robust, Instance, OracleMode, SolveSettings, WorstCaseOracle,
};

/// Feasibility tolerances from the physical constraints.
const BUDGET_TOL: f64 = 1e-12;
const HOLDING_TOL: f64 = 1e-12;

fn assert_physical_constraints(instance: &Instance, weights: &[f64]) {
    let sum: f64 = weights.iter().sum();
    assert!(
        (sum - 1.0).abs() <= BUDGET_TOL,
        "weights sum to {} instead of 1",
        sum
    );

    let held = weights.iter().filter(|&&w| w >= HOLDING_TOL).count();
    assert!(
        held <= instance.max_assets(),
        "{} assets held, cap is {}",
        held,
        instance.max_assets()
    );

    let min = weights.iter().copied().fold(f64::INFINITY, f64::min);
    assert!(min >= -HOLDING_TOL, "negative weight {}", min);
}

#[test]
fn test_small_universe_solves_to_optimality() {
    let instance = Instance::synthetic(10, 10.0_f64.sqrt()).unwrap();
    let settings = SolveSettings::default().with_cut_tol(1e-4);

    let solution = solve_robust(&instance, &settings).unwrap();

    assert!(solution.status.is_optimal(), "status {:?}", solution.status);
    assert!(solution.cuts_added > 0, "robust solve generated no cuts");
    assert!(solution.oracle_calls > 0);
    assert_physical_constraints(&instance, &solution.weights);

    // The worst case can never beat the best nominal mean, and a sensible
    // robust portfolio on this universe stays well above 1.
    assert!(solution.obj_val < instance.max_mean());
    assert!(solution.obj_val > 1.05, "objective {}", solution.obj_val);

    // Reported objective is the exact worst case of the returned weights.
    let oracle = WorstCaseOracle::new(instance.clone(), 1e-4, OracleMode::ClosedForm);
    let wc = oracle.worst_case(&solution.weights).unwrap();
    assert!((wc.value - solution.obj_val).abs() < 1e-12);

    // Selected assets are exactly the held weights.
    for &i in &solution.selected {
        assert!(solution.weights[i] >= HOLDING_TOL);
    }
    assert_eq!(
        solution.selected.len(),
        solution.weights.iter().filter(|&&w| w >= HOLDING_TOL).count()
    );
}

#[test]
fn test_benchmark_universe_feasibility() {
    // The classic 20-asset universe with gamma = sqrt(10). The search is
    // bounded so the test stays cheap; the physical constraints must hold
    // for whatever portfolio comes back.
    let instance = Instance::synthetic(20, 10.0_f64.sqrt()).unwrap();
    let settings = SolveSettings::default()
        .with_max_nodes(2_000)
        .with_time_limit(20.0);

    let solution = solve_robust(&instance, &settings).unwrap();

    assert!(solution.status.has_solution(), "status {:?}", solution.status);
    assert!(solution.cuts_added > 0);
    assert_physical_constraints(&instance, &solution.weights);
    assert!(solution.obj_val > 1.05 && solution.obj_val < instance.max_mean());

    // The audit helper agrees with the inline checks.
    assert!(audit(&instance, &solution.weights).is_feasible());
}

#[test]
fn test_squared_radius_regression() {
    // The uncertainty ball constrains sum(d^2) <= gamma^2. The historical
    // defect constrained sum(d^2) <= gamma, i.e. an effective radius of
    // sqrt(gamma): for gamma > 1 a strictly smaller ball, hence a strictly
    // larger "optimal" return. Solving with the defect's effective radius
    // must therefore come out strictly above the correct model.
    let gamma = 10.0_f64.sqrt();
    let correct = Instance::synthetic(10, gamma).unwrap();
    let shrunk = Instance::synthetic(10, gamma.sqrt()).unwrap();

    let settings = SolveSettings::default().with_cut_tol(1e-4);

    let correct_sol = solve_robust(&correct, &settings).unwrap();
    let shrunk_sol = solve_robust(&shrunk, &settings).unwrap();

    assert!(correct_sol.status.is_optimal());
    assert!(shrunk_sol.status.is_optimal());

    assert!(
        shrunk_sol.obj_val > correct_sol.obj_val + 1e-3,
        "shrunken ball gave {} which does not dominate {}",
        shrunk_sol.obj_val,
        correct_sol.obj_val
    );
}

#[test]
fn test_resolve_is_deterministic() {
    let instance = Instance::synthetic(10, 10.0_f64.sqrt()).unwrap();
    let settings = SolveSettings::default().with_cut_tol(1e-4);

    let first = solve_robust(&instance, &settings).unwrap();
    let second = solve_robust(&instance, &settings).unwrap();

    assert_eq!(first.status, second.status);
    assert!((first.obj_val - second.obj_val).abs() <= 1e-12);
    assert_eq!(first.weights.len(), second.weights.len());
    for (a, b) in first.weights.iter().zip(&second.weights) {
        assert!((a - b).abs() <= 1e-12, "weights diverged: {} vs {}", a, b);
    }
    assert_eq!(first.nodes_explored, second.nodes_explored);
    assert_eq!(first.cuts_added, second.cuts_added);
}

#[test]
fn test_zero_gamma_collapses_to_nominal() {
    // With no uncertainty the model is plain cardinality-constrained mean
    // maximization: everything goes into the best single asset.
    let instance = Instance::synthetic(12, 0.0).unwrap();
    let settings = SolveSettings::default().with_cut_tol(1e-6);

    let solution = solve_robust(&instance, &settings).unwrap();

    assert!(solution.status.is_optimal());
    assert_physical_constraints(&instance, &solution.weights);

    let best_mean = instance.max_mean();
    assert!(
        (solution.obj_val - best_mean).abs() < 1e-6,
        "nominal optimum {} but best mean is {}",
        solution.obj_val,
        best_mean
    );
    // The best asset is the last one (means increase with the index).
    assert!((solution.weights[11] - 1.0).abs() < 1e-6);
}

#[test]
fn test_oracle_modes_agree_end_to_end() {
    let instance = Instance::synthetic(10, 2.0).unwrap();

    let closed = solve_robust(
        &instance,
        &SolveSettings::default()
            .with_cut_tol(1e-4)
            .with_oracle_mode(OracleMode::ClosedForm),
    )
    .unwrap();

    let iterative = solve_robust(
        &instance,
        &SolveSettings::default()
            .with_cut_tol(1e-4)
            .with_oracle_mode(OracleMode::ProjectedGradient),
    )
    .unwrap();

    assert!(closed.status.is_optimal());
    assert!(iterative.status.is_optimal());
    assert!(
        (closed.obj_val - iterative.obj_val).abs() < 1e-6,
        "closed form {} vs projected gradient {}",
        closed.obj_val,
        iterative.obj_val
    );
}

#[test]
fn test_tighter_cardinality_cannot_improve() {
    // Shrinking the feasible set can only lower the optimum.
    let gamma = 2.0;
    let means: Vec<f64> = (1..=8).map(|i| 1.1 + 0.01 * i as f64).collect();
    let stddevs: Vec<f64> = (1..=8).map(|i| 0.01 * i as f64).collect();

    let loose = Instance::with_max_assets(means.clone(), stddevs.clone(), gamma, 4).unwrap();
    let tight = Instance::with_max_assets(means, stddevs, gamma, 1).unwrap();

    let settings = SolveSettings::default().with_cut_tol(1e-4);
    let loose_sol = solve_robust(&loose, &settings).unwrap();
    let tight_sol = solve_robust(&tight, &settings).unwrap();

    assert!(loose_sol.status.is_optimal());
    assert!(tight_sol.status.is_optimal());
    assert!(tight_sol.obj_val <= loose_sol.obj_val + 1e-6);
    assert!(tight_sol.selected.len() <= 1);
}

#[test]
fn test_invalid_instance_is_rejected() {
    let err = Instance::new(vec![1.0, 1.1], vec![0.1], 1.0).unwrap_err();
    assert!(err.to_string().contains("Invalid instance"));
}
