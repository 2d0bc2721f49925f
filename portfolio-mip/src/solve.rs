//! Cutting-plane branch-and-bound driver.
//!
//! The driver owns the control flow the original design delegates to an
//! external engine: pop a node, solve the master relaxation, prune or
//! branch on a fractional indicator, and at integer-feasible candidates
//! run the separation loop — ask the cut generator for a violated cut,
//! add it, re-solve, and repeat until the candidate is certified.

use crate::cuts::CutPool;
use crate::error::{SolveError, SolveResult};
use crate::feasibility::{self, HOLDING_TOL};
use crate::master::{MasterBackend, MasterStatus, SimplexMaster, VarLayout};
use crate::model::{Instance, RobustSolution, SolveStatus};
use crate::oracle::{Candidate, CutGenerator, WorstCaseOracle};
use crate::search::{BranchAndBound, SearchNode};
use crate::settings::SolveSettings;

/// Solve a robust portfolio instance.
///
/// Returns the best portfolio found together with search diagnostics; the
/// reported objective is the exact worst-case expected return of the
/// returned weights, recomputed after the search. The returned weights are
/// audited against the physical constraints and any violation is an error,
/// never a silent downgrade.
pub fn solve_robust(instance: &Instance, settings: &SolveSettings) -> SolveResult<RobustSolution> {
    instance.validate()?;

    let oracle = WorstCaseOracle::new(instance.clone(), settings.cut_tol, settings.oracle_mode);
    let mut solution = solve_with_generator(instance, settings, &oracle)?;

    if solution.status.has_solution() && !solution.weights.is_empty() {
        polish_weights(&mut solution.weights);

        let wc = oracle.worst_case(&solution.weights)?;
        solution.obj_val = wc.value;
        solution.bound = solution.bound.max(wc.value);
        solution.gap = RobustSolution::compute_gap(solution.obj_val, solution.bound);
        solution.selected = solution
            .weights
            .iter()
            .enumerate()
            .filter_map(|(i, &w)| (w >= HOLDING_TOL).then_some(i))
            .collect();

        let report = feasibility::audit(instance, &solution.weights);
        if !report.is_feasible() {
            return Err(SolveError::Feasibility(report));
        }
    }

    Ok(solution)
}

/// Outcome of processing one search node.
enum NodeOutcome {
    /// Node relaxation is infeasible.
    Infeasible,

    /// Node bound fell below the incumbent during the cut loop.
    Dominated,

    /// Relaxation is integer-infeasible; branch on an indicator.
    Fractional {
        /// Indicator block of the relaxed point.
        indicators: Vec<f64>,

        /// LP bound at the node.
        bound: f64,
    },

    /// Certified integer-feasible candidate.
    Incumbent {
        /// Candidate weights.
        weights: Vec<f64>,

        /// Surrogate objective at the candidate.
        obj: f64,
    },
}

/// Search driver, generic over the cut generation strategy.
pub(crate) fn solve_with_generator<C: CutGenerator>(
    instance: &Instance,
    settings: &SolveSettings,
    generator: &C,
) -> SolveResult<RobustSolution> {
    let layout = VarLayout::new(instance.num_assets());
    let mut master = SimplexMaster::new(layout, settings.master_lp.clone());
    master.initialize(instance)?;

    let mut pool = CutPool::new();
    let mut tree = BranchAndBound::new(settings.clone());
    tree.initialize();

    let final_status = loop {
        if let Some(status) = tree.check_termination() {
            break status;
        }

        let node = match tree.next_node() {
            Some(node) => node,
            None => break tree.check_termination().unwrap_or(SolveStatus::Optimal),
        };

        if tree.incumbent.has_incumbent() && node.can_prune(tree.incumbent.obj_val) {
            tree.node_pruned();
            continue;
        }

        enter_node(&mut master, layout, instance.num_assets(), &node);
        let outcome = process_node(&mut master, layout, generator, settings, &mut pool, &mut tree, &node)?;
        tree.node_explored();

        match outcome {
            NodeOutcome::Infeasible | NodeOutcome::Dominated => tree.node_pruned(),
            NodeOutcome::Fractional { indicators, bound } => {
                let mut node = node;
                node.dual_bound = bound;
                match tree.select_branching(&indicators) {
                    Some(decision) => tree.branch(&node, &decision),
                    None => {
                        return Err(SolveError::Internal(
                            "fractional node produced no branching candidate".into(),
                        ))
                    }
                }
            }
            NodeOutcome::Incumbent { weights, obj } => {
                tree.update_incumbent(&weights, obj);
            }
        }

        tree.log_progress();
    };

    Ok(tree.finalize(final_status))
}

/// Apply a node's indicator fixings to the master.
fn enter_node(master: &mut SimplexMaster, layout: VarLayout, n: usize, node: &SearchNode) {
    for i in 0..n {
        master.set_var_bounds(layout.y(i), 0.0, 1.0);
    }
    for bc in &node.bound_changes {
        master.set_var_bounds(layout.y(bc.asset), bc.lb, bc.ub);
    }
}

/// Solve one node to a verdict: prune, branch, or certified candidate.
#[allow(clippy::too_many_arguments)]
fn process_node<C: CutGenerator>(
    master: &mut SimplexMaster,
    layout: VarLayout,
    generator: &C,
    settings: &SolveSettings,
    pool: &mut CutPool,
    tree: &mut BranchAndBound,
    node: &SearchNode,
) -> SolveResult<NodeOutcome> {
    let mut rounds = 0;

    loop {
        let res = master.solve()?;
        match res.status {
            MasterStatus::Optimal => {}
            MasterStatus::Infeasible => return Ok(NodeOutcome::Infeasible),
            MasterStatus::Unbounded => {
                return Err(SolveError::MasterSolve(
                    "master relaxation unbounded: surrogate upper bound missing".into(),
                ))
            }
            MasterStatus::NumericalError => {
                return Err(SolveError::MasterSolve(format!(
                    "master relaxation failed at node {}",
                    node.id
                )))
            }
        }

        let bound = res.obj_val;
        if tree.incumbent.has_incumbent() && bound <= tree.incumbent.obj_val + 1e-9 {
            return Ok(NodeOutcome::Dominated);
        }

        let indicators = layout.indicators(&res.point).to_vec();
        if tree.select_branching(&indicators).is_some() {
            return Ok(NodeOutcome::Fractional { indicators, bound });
        }

        // Integer-feasible candidate: run the separation oracle.
        let weights = layout.weights(&res.point).to_vec();
        let surrogate = res.point[layout.z()];
        let candidate = Candidate { weights: &weights, surrogate };
        tree.oracle_called();

        match generator.propose_cut(&candidate)? {
            None => return Ok(NodeOutcome::Incumbent { weights, obj: surrogate }),
            Some(cut) => {
                rounds += 1;
                if rounds > settings.max_cut_rounds {
                    return Err(SolveError::CutGeneration(format!(
                        "separation stalled after {} rounds at node {}",
                        rounds, node.id
                    )));
                }

                match pool.add(cut.clone(), node.id) {
                    Some(_) => {
                        master.add_cut(&cut);
                        tree.cuts_added(1);
                    }
                    None => {
                        // The oracle re-derived a hyperplane that is already
                        // in the master: floating-point noise around the
                        // admission tolerance. The candidate is as certified
                        // as it is going to get.
                        return Ok(NodeOutcome::Incumbent { weights, obj: surrogate });
                    }
                }
            }
        }
    }
}

/// Clean LP noise out of an incumbent weight vector: drop sub-tolerance
/// entries and restore the budget identity exactly.
fn polish_weights(weights: &mut [f64]) {
    for w in weights.iter_mut() {
        if w.abs() < HOLDING_TOL {
            *w = 0.0;
        }
    }
    let sum: f64 = weights.iter().sum();
    if sum > 0.0 {
        for w in weights.iter_mut() {
            *w /= sum;
        }
    }
}
