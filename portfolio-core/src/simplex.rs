//! Two-phase dense tableau simplex.
//!
//! Bounded variables are reduced to the nonnegative standard form: finite
//! lower bounds by shifting, upper-only bounds by mirroring, free variables
//! by splitting into a positive and a negative part. Finite upper bounds of
//! shifted variables become explicit rows. Phase 1 minimizes the sum of
//! artificial variables; phase 2 re-prices and minimizes the true objective.
//!
//! Pivot selection uses Bland's rule throughout, which rules out cycling at
//! the cost of a few extra pivots. The relaxations solved here are small, so
//! the trade is the right one.

use nalgebra::DMatrix;

use crate::problem::{LpError, LpProblem, LpResult, LpSettings, LpStatus, RowOp};

/// How an original variable is recovered from the transformed columns.
#[derive(Debug, Clone, Copy)]
enum VarMap {
    /// `x = lb + t[col]`
    Shifted { col: usize, lb: f64 },

    /// `x = ub - t[col]`
    Mirrored { col: usize, ub: f64 },

    /// `x = t[pos] - t[neg]`
    Split { pos: usize, neg: usize },
}

/// Standard-form image of an `LpProblem`: `min c·t, A t (<=|=) b, t >= 0`.
struct StandardForm {
    /// Structural column count.
    nstruct: usize,

    /// Rows over structural columns, senses reduced to `Le`/`Eq`.
    rows: Vec<(Vec<f64>, RowOp, f64)>,

    /// Costs over structural columns.
    cost: Vec<f64>,

    /// Recovery map, one entry per original variable.
    maps: Vec<VarMap>,
}

impl StandardForm {
    fn build(problem: &LpProblem) -> Self {
        let n = problem.num_vars();

        // Assign structural columns and record the recovery map.
        let mut maps = Vec::with_capacity(n);
        let mut nstruct = 0;
        for &(lb, ub) in &problem.bounds {
            if lb.is_finite() {
                maps.push(VarMap::Shifted { col: nstruct, lb });
                nstruct += 1;
            } else if ub.is_finite() {
                maps.push(VarMap::Mirrored { col: nstruct, ub });
                nstruct += 1;
            } else {
                maps.push(VarMap::Split { pos: nstruct, neg: nstruct + 1 });
                nstruct += 2;
            }
        }

        let transform_row = |coefs: &[f64], rhs: f64| -> (Vec<f64>, f64) {
            let mut out = vec![0.0; nstruct];
            let mut rhs = rhs;
            for (j, &a) in coefs.iter().enumerate() {
                if a == 0.0 {
                    continue;
                }
                match maps[j] {
                    VarMap::Shifted { col, lb } => {
                        out[col] += a;
                        rhs -= a * lb;
                    }
                    VarMap::Mirrored { col, ub } => {
                        out[col] -= a;
                        rhs -= a * ub;
                    }
                    VarMap::Split { pos, neg } => {
                        out[pos] += a;
                        out[neg] -= a;
                    }
                }
            }
            (out, rhs)
        };

        let mut rows = Vec::new();
        for row in &problem.rows {
            // Normalize Ge to Le by negation before transforming.
            let (coefs, op, rhs) = match row.op {
                RowOp::Ge => {
                    let neg: Vec<f64> = row.coefs.iter().map(|a| -a).collect();
                    (neg, RowOp::Le, -row.rhs)
                }
                op => (row.coefs.clone(), op, row.rhs),
            };
            let (out, rhs) = transform_row(&coefs, rhs);
            rows.push((out, op, rhs));
        }

        // Finite upper bounds of shifted variables become explicit rows.
        for (map, &(lb, ub)) in maps.iter().zip(&problem.bounds) {
            if let VarMap::Shifted { col, .. } = *map {
                if ub.is_finite() {
                    let mut coefs = vec![0.0; nstruct];
                    coefs[col] = 1.0;
                    rows.push((coefs, RowOp::Le, ub - lb));
                }
            }
        }

        let (cost, _) = transform_row(&problem.objective, 0.0);

        Self { nstruct, rows, cost, maps }
    }

    /// Recover the original variable vector from transformed values.
    fn recover(&self, t: &[f64]) -> Vec<f64> {
        self.maps
            .iter()
            .map(|map| match *map {
                VarMap::Shifted { col, lb } => lb + t[col],
                VarMap::Mirrored { col, ub } => ub - t[col],
                VarMap::Split { pos, neg } => t[pos] - t[neg],
            })
            .collect()
    }
}

/// Solve an LP with the two-phase tableau simplex.
pub fn solve_simplex(problem: &LpProblem, settings: &LpSettings) -> Result<LpResult, LpError> {
    let sf = StandardForm::build(problem);
    let m = sf.rows.len();
    let nslack = sf.rows.iter().filter(|(_, op, _)| *op == RowOp::Le).count();

    // Column layout: structural | slacks | artificials | rhs.
    // Artificial columns are assigned below, one per row without a usable
    // slack basis column.
    let slack_base = sf.nstruct;
    let arti_base = sf.nstruct + nslack;

    // First pass: structural and slack entries, rhs sign normalization.
    let mut raw_rows: Vec<Vec<f64>> = Vec::with_capacity(m);
    let mut rhs: Vec<f64> = Vec::with_capacity(m);
    let mut slack_col: Vec<Option<usize>> = Vec::with_capacity(m);
    let mut next_slack = slack_base;
    for (coefs, op, b) in &sf.rows {
        let mut row = vec![0.0; arti_base];
        row[..sf.nstruct].copy_from_slice(coefs);
        let sc = if *op == RowOp::Le {
            let c = next_slack;
            next_slack += 1;
            row[c] = 1.0;
            Some(c)
        } else {
            None
        };
        let mut b = *b;
        if b < 0.0 {
            for v in row.iter_mut() {
                *v = -*v;
            }
            b = -b;
        }
        raw_rows.push(row);
        rhs.push(b);
        slack_col.push(sc);
    }

    // Second pass: pick the basis, adding artificials where no slack with a
    // +1 entry survived the sign normalization.
    let mut basis: Vec<usize> = Vec::with_capacity(m);
    let mut narti = 0;
    for (i, sc) in slack_col.iter().enumerate() {
        match sc {
            Some(c) if raw_rows[i][*c] > 0.0 => basis.push(*c),
            _ => {
                basis.push(arti_base + narti);
                narti += 1;
            }
        }
    }

    let ncols = arti_base + narti;
    let mut t = DMatrix::<f64>::zeros(m + 1, ncols + 1);
    for i in 0..m {
        for (j, &v) in raw_rows[i].iter().enumerate() {
            t[(i, j)] = v;
        }
        if basis[i] >= arti_base {
            t[(i, basis[i])] = 1.0;
        }
        t[(i, ncols)] = rhs[i];
    }

    let mut banned = vec![false; ncols];
    let mut iterations = 0usize;

    // Phase 1: minimize the sum of artificials.
    if narti > 0 {
        for j in arti_base..ncols {
            t[(m, j)] = 1.0;
        }
        for i in 0..m {
            if basis[i] >= arti_base {
                for j in 0..=ncols {
                    t[(m, j)] -= t[(i, j)];
                }
            }
        }

        match pivot_until_optimal(&mut t, &mut basis, &banned, settings, &mut iterations)? {
            PivotOutcome::Optimal => {}
            PivotOutcome::Unbounded => {
                // The phase-1 objective is bounded below by zero.
                return Err(LpError::Numerical("phase-1 objective reported unbounded".into()));
            }
            PivotOutcome::IterationLimit => {
                return Ok(LpResult {
                    status: LpStatus::IterationLimit,
                    x: Vec::new(),
                    obj_val: f64::NAN,
                    iterations,
                });
            }
        }

        let phase1_obj = -t[(m, ncols)];
        if phase1_obj > settings.tol_feas {
            return Ok(LpResult::infeasible(iterations));
        }

        drive_out_artificials(&mut t, &mut basis, arti_base, ncols, settings);
        for b in banned.iter_mut().skip(arti_base) {
            *b = true;
        }
    }

    // Phase 2: re-price with the true objective.
    for j in 0..=ncols {
        t[(m, j)] = 0.0;
    }
    for (j, &c) in sf.cost.iter().enumerate() {
        t[(m, j)] = c;
    }
    for i in 0..m {
        let cb = if basis[i] < sf.nstruct { sf.cost[basis[i]] } else { 0.0 };
        if cb != 0.0 {
            for j in 0..=ncols {
                t[(m, j)] -= cb * t[(i, j)];
            }
        }
    }

    match pivot_until_optimal(&mut t, &mut basis, &banned, settings, &mut iterations)? {
        PivotOutcome::Optimal => {}
        PivotOutcome::Unbounded => return Ok(LpResult::unbounded(iterations)),
        PivotOutcome::IterationLimit => {
            return Ok(LpResult {
                status: LpStatus::IterationLimit,
                x: Vec::new(),
                obj_val: f64::NAN,
                iterations,
            });
        }
    }

    // Extract the transformed point and map it back.
    let mut tvals = vec![0.0; ncols];
    for i in 0..m {
        if basis[i] < arti_base {
            tvals[basis[i]] = t[(i, ncols)].max(0.0);
        }
    }
    let x = sf.recover(&tvals);
    let obj_val: f64 = problem.objective.iter().zip(&x).map(|(c, xi)| c * xi).sum();

    log::debug!(
        "simplex: {} rows, {} cols, {} pivots, obj={:.6e}",
        m,
        ncols,
        iterations,
        obj_val
    );

    Ok(LpResult {
        status: LpStatus::Optimal,
        x,
        obj_val,
        iterations,
    })
}

enum PivotOutcome {
    Optimal,
    Unbounded,
    IterationLimit,
}

/// Run Bland-rule pivots until the cost row has no improving column.
fn pivot_until_optimal(
    t: &mut DMatrix<f64>,
    basis: &mut [usize],
    banned: &[bool],
    settings: &LpSettings,
    iterations: &mut usize,
) -> Result<PivotOutcome, LpError> {
    let m = basis.len();
    let ncols = t.ncols() - 1;

    loop {
        if *iterations >= settings.max_iter {
            return Ok(PivotOutcome::IterationLimit);
        }

        // Entering column: lowest index with negative reduced cost.
        let entering = (0..ncols)
            .find(|&j| !banned[j] && t[(m, j)] < -settings.tol_pivot);
        let Some(col) = entering else {
            return Ok(PivotOutcome::Optimal);
        };

        // Ratio test; ties broken on the lowest basic variable index.
        let mut leave: Option<(usize, f64)> = None;
        for i in 0..m {
            let a = t[(i, col)];
            if a > settings.tol_pivot {
                let ratio = t[(i, ncols)] / a;
                match leave {
                    None => leave = Some((i, ratio)),
                    Some((best_i, best_ratio)) => {
                        if ratio < best_ratio - 1e-12
                            || (ratio < best_ratio + 1e-12 && basis[i] < basis[best_i])
                        {
                            leave = Some((i, ratio));
                        }
                    }
                }
            }
        }
        let Some((row, _)) = leave else {
            return Ok(PivotOutcome::Unbounded);
        };

        pivot(t, basis, row, col);
        *iterations += 1;
    }
}

/// Pivot the tableau on `(row, col)`.
fn pivot(t: &mut DMatrix<f64>, basis: &mut [usize], row: usize, col: usize) {
    let ncols = t.ncols();
    let piv = t[(row, col)];
    for j in 0..ncols {
        t[(row, j)] /= piv;
    }
    for i in 0..t.nrows() {
        if i == row {
            continue;
        }
        let factor = t[(i, col)];
        if factor != 0.0 {
            for j in 0..ncols {
                t[(i, j)] -= factor * t[(row, j)];
            }
        }
    }
    basis[row] = col;
}

/// Replace artificial basics at zero level by structural or slack columns,
/// zeroing out rows that turn out redundant.
fn drive_out_artificials(
    t: &mut DMatrix<f64>,
    basis: &mut [usize],
    arti_base: usize,
    ncols: usize,
    settings: &LpSettings,
) {
    let m = basis.len();
    for i in 0..m {
        if basis[i] < arti_base {
            continue;
        }
        // Pivot on the largest entry in the row to keep the degenerate
        // exchange well conditioned.
        let mut replacement: Option<usize> = None;
        let mut best_abs = settings.tol_pivot;
        for j in 0..arti_base {
            let a = t[(i, j)].abs();
            if a > best_abs {
                best_abs = a;
                replacement = Some(j);
            }
        }
        match replacement {
            Some(col) => pivot(t, basis, i, col),
            None => {
                // Redundant row: dependent on the others. Zero it so no
                // later pivot can touch it.
                for j in 0..=ncols {
                    t[(i, j)] = 0.0;
                }
            }
        }
    }
}
