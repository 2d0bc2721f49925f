//! Error types for the robust portfolio solver.

use thiserror::Error;

use crate::feasibility::FeasibilityReport;

/// Errors that can occur while solving a robust portfolio instance.
#[derive(Error, Debug)]
pub enum SolveError {
    /// Instance validation failed.
    #[error("Invalid instance: {0}")]
    InvalidInstance(String),

    /// Master LP solve failed.
    #[error("Master solve failed: {0}")]
    MasterSolve(String),

    /// The separation oracle failed. The worst-case subproblem is feasible
    /// for every candidate by construction, so this always indicates a
    /// model-construction bug upstream and aborts the solve.
    #[error("Separation oracle failed: {0}")]
    Oracle(String),

    /// Cut generation stalled or produced unusable coefficients.
    #[error("Cut generation failed: {0}")]
    CutGeneration(String),

    /// The returned weights failed the post-solve feasibility audit.
    ///
    /// Distinct from any termination status: a solve that ends early still
    /// reports its status through the solution, while an audit failure is an
    /// error that must halt whatever consumes the output.
    #[error("Solution failed feasibility audit: {0}")]
    Feasibility(FeasibilityReport),

    /// Internal solver error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type for solver operations.
pub type SolveResult<T> = Result<T, SolveError>;
