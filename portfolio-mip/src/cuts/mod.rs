//! Cut management for the lazily-constrained master problem.

mod pool;

pub use pool::{CutPool, CutPoolStats, PooledCut};
