pub mod config;
pub mod control;
pub mod engine;
pub mod error;
pub mod host;
pub mod job;
pub mod logging;
pub mod notify;
pub mod queue;
pub mod rate;
pub mod retry;
pub mod scheduler;
pub mod selection;
pub mod stats;
pub mod traversal;
