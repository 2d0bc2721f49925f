//! Simplex-backed master problem.

use portfolio_core::{solve, LpProblem, LpSettings, LpStatus};

use super::backend::{LinearCut, MasterBackend, MasterResult, MasterStatus, VarLayout};
use crate::error::{SolveError, SolveResult};
use crate::model::Instance;

/// Master problem backed by the dense simplex engine.
///
/// The LP is kept as a single `LpProblem`: structural rows first, then the
/// accumulated cut rows. Entering a search node only touches the indicator
/// bounds, so re-solves share the same problem object.
pub struct SimplexMaster {
    /// Variable layout.
    layout: VarLayout,

    /// Current LP (structural rows + cuts + bounds).
    lp: LpProblem,

    /// Structural row count (rows before the first cut).
    base_rows: usize,

    /// Cuts added so far.
    cuts: usize,

    /// LP engine settings.
    lp_settings: LpSettings,
}

impl SimplexMaster {
    /// Create an uninitialized backend; call `initialize` before solving.
    pub fn new(layout: VarLayout, lp_settings: LpSettings) -> Self {
        Self {
            layout,
            lp: LpProblem::new(layout.num_vars()),
            base_rows: 0,
            cuts: 0,
            lp_settings,
        }
    }

    /// The variable layout this master was built for.
    pub fn layout(&self) -> VarLayout {
        self.layout
    }
}

impl MasterBackend for SimplexMaster {
    fn initialize(&mut self, instance: &Instance) -> SolveResult<()> {
        let n = instance.num_assets();
        if n != self.layout.num_assets() {
            return Err(SolveError::Internal(format!(
                "layout built for {} assets, instance has {}",
                self.layout.num_assets(),
                n
            )));
        }

        let nv = self.layout.num_vars();
        let mut lp = LpProblem::new(nv);

        // Maximize z.
        let mut objective = vec![0.0; nv];
        objective[self.layout.z()] = -1.0;
        lp.set_objective(objective);

        // Weights live in [0, 1]; indicators start relaxed to [0, 1] and
        // are tightened per node; z is bounded above by the best
        // single-asset mean.
        for i in 0..n {
            lp.set_bounds(self.layout.x(i), 0.0, 1.0);
            lp.set_bounds(self.layout.y(i), 0.0, 1.0);
        }
        lp.set_bounds(self.layout.z(), f64::NEG_INFINITY, instance.max_mean());

        // Budget: sum(x) = 1.
        let mut budget = vec![0.0; nv];
        for i in 0..n {
            budget[self.layout.x(i)] = 1.0;
        }
        lp.add_eq_row(budget, 1.0);

        // Coupling: x_i <= y_i.
        for i in 0..n {
            let mut row = vec![0.0; nv];
            row[self.layout.x(i)] = 1.0;
            row[self.layout.y(i)] = -1.0;
            lp.add_le_row(row, 0.0);
        }

        // Cardinality: sum(y) <= max_assets.
        let mut card = vec![0.0; nv];
        for i in 0..n {
            card[self.layout.y(i)] = 1.0;
        }
        lp.add_le_row(card, instance.max_assets() as f64);

        self.base_rows = lp.num_rows();
        self.cuts = 0;
        self.lp = lp;
        Ok(())
    }

    fn add_cut(&mut self, cut: &LinearCut) -> usize {
        let id = self.base_rows + self.cuts;
        self.lp.add_le_row(cut.coefs.clone(), cut.rhs);
        self.cuts += 1;
        id
    }

    fn set_var_bounds(&mut self, var: usize, lb: f64, ub: f64) {
        self.lp.set_bounds(var, lb, ub);
    }

    fn solve(&mut self) -> SolveResult<MasterResult> {
        let result = solve(&self.lp, &self.lp_settings)
            .map_err(|e| SolveError::MasterSolve(e.to_string()))?;

        match result.status {
            LpStatus::Optimal => {
                let obj_val = result.x[self.layout.z()];
                Ok(MasterResult {
                    status: MasterStatus::Optimal,
                    point: result.x,
                    obj_val,
                })
            }
            LpStatus::Infeasible => Ok(MasterResult::infeasible()),
            LpStatus::Unbounded => Ok(MasterResult {
                status: MasterStatus::Unbounded,
                point: Vec::new(),
                obj_val: f64::INFINITY,
            }),
            LpStatus::IterationLimit => Ok(MasterResult {
                status: MasterStatus::NumericalError,
                point: Vec::new(),
                obj_val: f64::NEG_INFINITY,
            }),
        }
    }

    fn num_cuts(&self) -> usize {
        self.cuts
    }

    fn num_vars(&self) -> usize {
        self.layout.num_vars()
    }

    fn num_base_constraints(&self) -> usize {
        self.base_rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::master::CutSource;

    fn two_asset_instance() -> Instance {
        // Second asset returns more; no uncertainty.
        Instance::with_max_assets(vec![1.1, 1.2], vec![0.1, 0.2], 0.0, 2).unwrap()
    }

    #[test]
    fn test_relaxation_without_cuts_hits_z_bound() {
        let instance = two_asset_instance();
        let layout = VarLayout::new(2);
        let mut master = SimplexMaster::new(layout, LpSettings::default());
        master.initialize(&instance).unwrap();

        // Nothing ties z to x yet, so z climbs to its static upper bound.
        let res = master.solve().unwrap();
        assert_eq!(res.status, MasterStatus::Optimal);
        assert!((res.obj_val - 1.2).abs() < 1e-9);
    }

    #[test]
    fn test_cut_ties_surrogate_to_weights() {
        let instance = two_asset_instance();
        let layout = VarLayout::new(2);
        let mut master = SimplexMaster::new(layout, LpSettings::default());
        master.initialize(&instance).unwrap();

        // z <= mean . x forces the relaxation to pick the best asset.
        let cut = LinearCut::surrogate_bound(layout, instance.means(), CutSource::User);
        master.add_cut(&cut);
        assert_eq!(master.num_cuts(), 1);

        let res = master.solve().unwrap();
        assert_eq!(res.status, MasterStatus::Optimal);
        assert!((res.obj_val - 1.2).abs() < 1e-9);
        let w = layout.weights(&res.point);
        assert!((w[1] - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_indicator_fixing_changes_optimum() {
        let instance = two_asset_instance();
        let layout = VarLayout::new(2);
        let mut master = SimplexMaster::new(layout, LpSettings::default());
        master.initialize(&instance).unwrap();

        let cut = LinearCut::surrogate_bound(layout, instance.means(), CutSource::User);
        master.add_cut(&cut);

        // Exclude the better asset: y_1 = 0 forces x_1 = 0.
        master.set_var_bounds(layout.y(1), 0.0, 0.0);
        let res = master.solve().unwrap();
        assert_eq!(res.status, MasterStatus::Optimal);
        assert!((res.obj_val - 1.1).abs() < 1e-9);

        // Excluding every asset contradicts the budget row.
        master.set_var_bounds(layout.y(0), 0.0, 0.0);
        let res = master.solve().unwrap();
        assert_eq!(res.status, MasterStatus::Infeasible);
    }
}
