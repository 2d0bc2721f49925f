//! Configuration settings for the robust portfolio solver.

use portfolio_core::LpSettings;

/// Branching variable selection rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BranchingRule {
    /// Select the indicator with fractional part closest to 0.5.
    #[default]
    MostFractional,

    /// Select the first fractional indicator by index.
    FirstFractional,
}

/// Node selection strategy for the search tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NodeSelection {
    /// Always select the node with the best (highest) dual bound.
    #[default]
    BestBound,

    /// Depth-first search (finds incumbents quickly).
    DepthFirst,
}

/// How the separation oracle solves the worst-case subproblem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OracleMode {
    /// Closed-form Cauchy-Schwarz minimizer over the uncertainty ball.
    #[default]
    ClosedForm,

    /// Iterative projected-gradient solve of the ball subproblem.
    ProjectedGradient,
}

/// Solver settings.
#[derive(Debug, Clone)]
pub struct SolveSettings {
    // === Termination criteria ===
    /// Maximum number of nodes to explore.
    pub max_nodes: u64,

    /// Time limit in milliseconds (None = unlimited).
    pub time_limit_ms: Option<u64>,

    /// Relative optimality gap tolerance.
    /// Stop when (bound - incumbent) / |incumbent| <= gap_tol.
    pub gap_tol: f64,

    /// Integer feasibility tolerance for the selection indicators.
    pub int_feas_tol: f64,

    // === Search strategy ===
    /// Branching variable selection rule.
    pub branching_rule: BranchingRule,

    /// Node selection strategy.
    pub node_selection: NodeSelection,

    // === Oracle / cuts ===
    /// Minimum violation of the surrogate bound before a cut is admitted:
    /// a cut is generated only when worst_p . x < z - cut_tol. Guards
    /// against re-adding the same cut on floating-point noise.
    pub cut_tol: f64,

    /// How the oracle solves the worst-case subproblem.
    pub oracle_mode: OracleMode,

    /// Maximum cut rounds at a single candidate before the solve is
    /// declared stalled.
    pub max_cut_rounds: usize,

    // === LP engine ===
    /// Settings for the master relaxation solves.
    pub master_lp: LpSettings,

    // === Output ===
    /// Emit progress information through the `log` facade.
    pub verbose: bool,

    /// Log frequency (progress line every N nodes).
    pub log_freq: u64,
}

impl Default for SolveSettings {
    fn default() -> Self {
        Self {
            // Termination
            max_nodes: 100_000,
            time_limit_ms: None,
            gap_tol: 1e-6,
            int_feas_tol: 1e-6,

            // Search
            branching_rule: BranchingRule::default(),
            node_selection: NodeSelection::default(),

            // Oracle / cuts
            cut_tol: 1e-2,
            oracle_mode: OracleMode::default(),
            max_cut_rounds: 200,

            // LP engine
            master_lp: LpSettings::default(),

            // Output
            verbose: false,
            log_freq: 100,
        }
    }
}

impl SolveSettings {
    /// Create settings with verbose output enabled.
    pub fn verbose() -> Self {
        let mut s = Self::default();
        s.verbose = true;
        s.log_freq = 1;
        s
    }

    /// Set the time limit in seconds.
    pub fn with_time_limit(mut self, seconds: f64) -> Self {
        self.time_limit_ms = Some((seconds * 1000.0) as u64);
        self
    }

    /// Set the maximum node count.
    pub fn with_max_nodes(mut self, nodes: u64) -> Self {
        self.max_nodes = nodes;
        self
    }

    /// Set the cut admission tolerance.
    pub fn with_cut_tol(mut self, tol: f64) -> Self {
        self.cut_tol = tol;
        self
    }

    /// Set the oracle subproblem mode.
    pub fn with_oracle_mode(mut self, mode: OracleMode) -> Self {
        self.oracle_mode = mode;
        self
    }
}
