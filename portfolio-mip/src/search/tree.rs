//! Branch-and-bound tree controller.

use std::time::Instant;

use super::{BranchDecision, BranchingSelector, NodeQueue, SearchNode};
use crate::model::{IncumbentTracker, RobustSolution, SolveStatus};
use crate::settings::SolveSettings;

/// Branch-and-bound tree controller.
///
/// Manages the node queue, the incumbent, termination and statistics.
/// Maximization orientation: dual bounds are upper bounds and shrink toward
/// the incumbent as the tree closes.
pub struct BranchAndBound {
    /// Node queue.
    queue: NodeQueue,

    /// Branching variable selector.
    branching: BranchingSelector,

    /// Incumbent portfolio tracker.
    pub incumbent: IncumbentTracker,

    /// Next node ID to assign.
    next_node_id: u64,

    /// Total nodes explored.
    nodes_explored: u64,

    /// Nodes pruned.
    nodes_pruned: u64,

    /// Cuts added.
    cuts_added: u64,

    /// Oracle invocations.
    oracle_calls: u64,

    /// Start time.
    start_time: Option<Instant>,

    /// Settings.
    settings: SolveSettings,
}

impl BranchAndBound {
    /// Create a new controller.
    pub fn new(settings: SolveSettings) -> Self {
        Self {
            queue: NodeQueue::new(settings.node_selection),
            branching: BranchingSelector::new(settings.branching_rule),
            incumbent: IncumbentTracker::new(),
            next_node_id: 1, // 0 reserved for the root
            nodes_explored: 0,
            nodes_pruned: 0,
            cuts_added: 0,
            oracle_calls: 0,
            start_time: None,
            settings,
        }
    }

    /// Start the clock and enqueue the root node.
    pub fn initialize(&mut self) {
        self.start_time = Some(Instant::now());
        self.queue.push(SearchNode::root());
    }

    /// Get the next node to process.
    pub fn next_node(&mut self) -> Option<SearchNode> {
        self.queue.pop()
    }

    /// Mark a node as explored.
    pub fn node_explored(&mut self) {
        self.nodes_explored += 1;
    }

    /// Record that a node was pruned.
    pub fn node_pruned(&mut self) {
        self.nodes_pruned += 1;
    }

    /// Record cuts added.
    pub fn cuts_added(&mut self, count: usize) {
        self.cuts_added += count as u64;
    }

    /// Record an oracle invocation.
    pub fn oracle_called(&mut self) {
        self.oracle_calls += 1;
    }

    /// Create and enqueue both children of a branching decision.
    pub fn branch(&mut self, parent: &SearchNode, decision: &BranchDecision) {
        let down_id = self.next_node_id;
        let up_id = self.next_node_id + 1;
        self.next_node_id += 2;

        self.queue.push(parent.child(down_id, decision.down_branch));
        self.queue.push(parent.child(up_id, decision.up_branch));
    }

    /// Select a branching indicator for a fractional point.
    pub fn select_branching(&self, indicators: &[f64]) -> Option<BranchDecision> {
        self.branching.select(indicators, self.settings.int_feas_tol)
    }

    /// Update the incumbent with a new portfolio.
    ///
    /// Returns true if the incumbent improved.
    pub fn update_incumbent(&mut self, weights: &[f64], obj: f64) -> bool {
        let improved = self.incumbent.update(weights, obj);

        if improved {
            let pruned = self.queue.prune_by_bound(obj);
            self.nodes_pruned += pruned as u64;

            if self.settings.verbose {
                log::info!("New incumbent: obj={:.6}, pruned {} nodes", obj, pruned);
            }
        }

        improved
    }

    /// Current optimality gap.
    pub fn gap(&self) -> f64 {
        self.incumbent.gap(self.global_bound())
    }

    /// Best dual bound over the remaining tree, never below the incumbent.
    pub fn global_bound(&self) -> f64 {
        if self.queue.is_empty() {
            // Tree exhausted: the incumbent value is proven optimal.
            self.incumbent.obj_val
        } else {
            self.queue.best_bound().max(self.incumbent.obj_val)
        }
    }

    /// Elapsed time in milliseconds.
    pub fn elapsed_ms(&self) -> u64 {
        self.start_time
            .map(|t| t.elapsed().as_millis() as u64)
            .unwrap_or(0)
    }

    /// Check if the time limit is exceeded.
    pub fn time_limit_exceeded(&self) -> bool {
        self.settings
            .time_limit_ms
            .is_some_and(|limit| self.elapsed_ms() >= limit)
    }

    /// Check termination conditions.
    ///
    /// Returns Some(status) if the search should stop, None otherwise.
    pub fn check_termination(&self) -> Option<SolveStatus> {
        if self.time_limit_exceeded() {
            return Some(SolveStatus::TimeLimit);
        }

        if self.nodes_explored >= self.settings.max_nodes {
            return Some(SolveStatus::NodeLimit);
        }

        if self.incumbent.has_incumbent() && self.gap() <= self.settings.gap_tol {
            return Some(if self.queue.is_empty() {
                SolveStatus::Optimal
            } else {
                SolveStatus::GapLimit
            });
        }

        if self.queue.is_empty() {
            return Some(if self.incumbent.has_incumbent() {
                SolveStatus::Optimal
            } else {
                SolveStatus::Infeasible
            });
        }

        None
    }

    /// Assemble the solution skeleton (weights still unpolished).
    pub fn finalize(&self, status: SolveStatus) -> RobustSolution {
        RobustSolution {
            status,
            weights: self.incumbent.weights.clone().unwrap_or_default(),
            selected: Vec::new(),
            obj_val: self.incumbent.obj_val,
            bound: self.global_bound(),
            gap: self.gap(),
            nodes_explored: self.nodes_explored,
            cuts_added: self.cuts_added,
            oracle_calls: self.oracle_calls,
            solve_time_ms: self.elapsed_ms(),
            incumbent_updates: self.incumbent.update_count,
        }
    }

    /// Log progress (if verbose).
    pub fn log_progress(&self) {
        if !self.settings.verbose {
            return;
        }

        if self.nodes_explored % self.settings.log_freq != 0 {
            return;
        }

        log::info!(
            "Nodes: {} ({} open) | Bound: {:.6} | Incumbent: {:.6} | Gap: {:.2}% | Cuts: {} | Time: {:.1}s",
            self.nodes_explored,
            self.queue.len(),
            self.global_bound(),
            self.incumbent.obj_val,
            self.gap() * 100.0,
            self.cuts_added,
            self.elapsed_ms() as f64 / 1000.0,
        );
    }

    /// Current statistics.
    pub fn stats(&self) -> TreeStats {
        TreeStats {
            nodes_explored: self.nodes_explored,
            nodes_pruned: self.nodes_pruned,
            nodes_open: self.queue.len() as u64,
            cuts_added: self.cuts_added,
            oracle_calls: self.oracle_calls,
            incumbent_updates: self.incumbent.update_count,
            bound: self.global_bound(),
            incumbent_obj: self.incumbent.obj_val,
            gap: self.gap(),
            elapsed_ms: self.elapsed_ms(),
        }
    }
}

/// Statistics from the search tree.
#[derive(Debug, Clone)]
pub struct TreeStats {
    /// Nodes explored.
    pub nodes_explored: u64,
    /// Nodes pruned.
    pub nodes_pruned: u64,
    /// Nodes still open.
    pub nodes_open: u64,
    /// Cuts added.
    pub cuts_added: u64,
    /// Oracle invocations.
    pub oracle_calls: u64,
    /// Incumbent updates.
    pub incumbent_updates: u64,
    /// Best dual bound.
    pub bound: f64,
    /// Incumbent objective.
    pub incumbent_obj: f64,
    /// Relative gap.
    pub gap: f64,
    /// Elapsed milliseconds.
    pub elapsed_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initialization() {
        let mut tree = BranchAndBound::new(SolveSettings::default());
        tree.initialize();

        assert!(tree.next_node().is_some());
        assert!(tree.next_node().is_none());
    }

    #[test]
    fn test_incumbent_update_prunes_queue() {
        let mut tree = BranchAndBound::new(SolveSettings::default());
        tree.initialize();
        let root = tree.next_node().unwrap();

        // Two children with known bounds.
        let decision = BranchDecision {
            asset: 0,
            value: 0.5,
            down_branch: crate::search::BoundChange::exclude(0),
            up_branch: crate::search::BoundChange::include(0),
        };
        tree.branch(&root, &decision);

        // First incumbent accepted.
        assert!(tree.update_incumbent(&[1.0, 0.0], 1.1));
        // Worse one rejected.
        assert!(!tree.update_incumbent(&[0.0, 1.0], 1.0));
        // Better one accepted.
        assert!(tree.update_incumbent(&[0.5, 0.5], 1.2));
        assert_eq!(tree.incumbent.update_count, 2);
    }

    #[test]
    fn test_termination_optimal_when_queue_empty() {
        let mut tree = BranchAndBound::new(SolveSettings::default());
        tree.initialize();

        tree.update_incumbent(&[1.0], 1.15);
        tree.next_node();

        assert_eq!(tree.check_termination(), Some(SolveStatus::Optimal));
        assert!((tree.global_bound() - 1.15).abs() < 1e-12);
        assert!(tree.gap() < 1e-12);
    }

    #[test]
    fn test_termination_infeasible_without_incumbent() {
        let mut tree = BranchAndBound::new(SolveSettings::default());
        tree.initialize();
        tree.next_node();

        assert_eq!(tree.check_termination(), Some(SolveStatus::Infeasible));
    }

    #[test]
    fn test_node_limit() {
        let mut tree = BranchAndBound::new(SolveSettings::default().with_max_nodes(2));
        tree.initialize();

        tree.node_explored();
        assert_eq!(tree.check_termination(), None);
        tree.node_explored();
        assert_eq!(tree.check_termination(), Some(SolveStatus::NodeLimit));
    }
}
