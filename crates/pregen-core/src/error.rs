//! Validation errors returned synchronously by `start` / `enqueue`.

use thiserror::Error;

/// Reason a selection or mode was rejected before any job state was created.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Selection has no target world.
    #[error("selection has no target")]
    MissingTarget,
    /// Radius must be strictly positive.
    #[error("radius must be greater than 0 (got {0})")]
    NonPositiveRadius(i32),
    #[error("unknown mode: {0} (expected normal, pro or fast)")]
    UnknownMode(String),
    #[error("unknown shape: {0} (expected square or circle)")]
    UnknownShape(String),
    #[error("unknown pattern: {0} (expected spiral or concentric)")]
    UnknownPattern(String),
}
