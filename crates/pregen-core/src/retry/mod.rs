//! Retry policy for load requests.
//!
//! A load request that reports failure, is abandoned by the loader, or stays
//! unresolved past the request timeout is retried a bounded number of times;
//! after that the unit is skipped with a warning so the job can still finish.

mod policy;

pub use policy::{FailureKind, RetryDecision, RetryPolicy};
