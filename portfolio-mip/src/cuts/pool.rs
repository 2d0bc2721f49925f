//! Cut pool for the accumulated worst-case return cuts.
//!
//! The pool owns every cut generated during a solve. Cuts only accumulate:
//! once a cut enters the master problem it stays there for the rest of the
//! search (they are globally valid, so there is nothing to retract). The
//! pool's job besides bookkeeping is duplicate rejection, the second line
//! of defense after the oracle's admission tolerance against numerical
//! noise re-deriving the same hyperplane.

use crate::master::LinearCut;

/// A cut with pool metadata.
#[derive(Debug, Clone)]
pub struct PooledCut {
    /// The underlying linear cut.
    pub cut: LinearCut,

    /// Unique ID in the pool.
    pub id: usize,

    /// Search node that produced the cut.
    pub node: u64,
}

/// Statistics for the cut pool.
#[derive(Debug, Default, Clone)]
pub struct CutPoolStats {
    /// Cuts accepted into the pool.
    pub total_added: usize,

    /// Proposed cuts rejected as duplicates.
    pub duplicates_rejected: usize,
}

/// Pool of accumulated cuts.
#[derive(Debug, Default)]
pub struct CutPool {
    /// All cuts, in insertion order.
    cuts: Vec<PooledCut>,

    /// Statistics.
    stats: CutPoolStats,
}

impl CutPool {
    /// Create an empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a cut to the pool, unless an equivalent cut is already present.
    ///
    /// Returns `Some(id)` for a fresh cut and `None` for a duplicate.
    pub fn add(&mut self, cut: LinearCut, node: u64) -> Option<usize> {
        if self.cuts.iter().any(|p| is_duplicate(&cut, &p.cut)) {
            self.stats.duplicates_rejected += 1;
            return None;
        }

        let id = self.cuts.len();
        self.cuts.push(PooledCut { cut, id, node });
        self.stats.total_added += 1;
        Some(id)
    }

    /// Get a cut by ID.
    pub fn get(&self, id: usize) -> Option<&PooledCut> {
        self.cuts.get(id)
    }

    /// Iterate over all cuts.
    pub fn iter(&self) -> impl Iterator<Item = &PooledCut> {
        self.cuts.iter()
    }

    /// Pool statistics.
    pub fn stats(&self) -> &CutPoolStats {
        &self.stats
    }

    /// Number of cuts in the pool.
    pub fn len(&self) -> usize {
        self.cuts.len()
    }

    /// Check if the pool is empty.
    pub fn is_empty(&self) -> bool {
        self.cuts.is_empty()
    }
}

/// Check whether two cuts are the same hyperplane within tolerance.
fn is_duplicate(a: &LinearCut, b: &LinearCut) -> bool {
    if a.coefs.len() != b.coefs.len() {
        return false;
    }

    let a_norm: f64 = a.coefs.iter().map(|x| x * x).sum::<f64>().sqrt();
    let b_norm: f64 = b.coefs.iter().map(|x| x * x).sum::<f64>().sqrt();

    if a_norm < 1e-10 || b_norm < 1e-10 {
        return a_norm < 1e-10 && b_norm < 1e-10;
    }

    let dot: f64 = a.coefs.iter().zip(&b.coefs).map(|(ai, bi)| ai * bi).sum();
    let cos_angle = dot / (a_norm * b_norm);

    // Parallel within tolerance and matching normalized right-hand side.
    if cos_angle > 0.9999 {
        let rhs_diff = (a.rhs / a_norm - b.rhs / b_norm).abs();
        return rhs_diff < 1e-8;
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::master::CutSource;

    fn make_cut(coefs: Vec<f64>, rhs: f64) -> LinearCut {
        LinearCut::new(coefs, rhs, CutSource::WorstCase)
    }

    #[test]
    fn test_add_and_get() {
        let mut pool = CutPool::new();

        let id1 = pool.add(make_cut(vec![1.0, 2.0], 3.0), 0).unwrap();
        let id2 = pool.add(make_cut(vec![4.0, 5.0], 6.0), 1).unwrap();

        assert_ne!(id1, id2);
        assert_eq!(pool.len(), 2);
        assert_eq!(pool.get(id2).unwrap().node, 1);
    }

    #[test]
    fn test_duplicate_detection() {
        let mut pool = CutPool::new();

        assert!(pool.add(make_cut(vec![1.0, 2.0], 3.0), 0).is_some());
        // Same cut.
        assert!(pool.add(make_cut(vec![1.0, 2.0], 3.0), 1).is_none());
        // Parallel cut, same after normalization.
        assert!(pool.add(make_cut(vec![2.0, 4.0], 6.0), 2).is_none());
        // Parallel direction, different offset: a genuinely new cut.
        assert!(pool.add(make_cut(vec![1.0, 2.0], 4.0), 3).is_some());

        assert_eq!(pool.len(), 2);
        assert_eq!(pool.stats().duplicates_rejected, 2);
    }

    #[test]
    fn test_opposite_direction_not_duplicate() {
        let mut pool = CutPool::new();
        assert!(pool.add(make_cut(vec![1.0, 2.0], 3.0), 0).is_some());
        assert!(pool.add(make_cut(vec![-1.0, -2.0], -3.0), 0).is_some());
        assert_eq!(pool.len(), 2);
    }
}
