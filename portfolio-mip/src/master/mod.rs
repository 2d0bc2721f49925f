//! Master problem (LP relaxation) management.

mod backend;
mod simplex_backend;

pub use backend::{CutSource, LinearCut, MasterBackend, MasterResult, MasterStatus, VarLayout};
pub use simplex_backend::SimplexMaster;
