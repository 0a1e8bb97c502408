//! Structured job events and their delivery to zero or more sinks.
//!
//! The core only builds `Notification` values; how they reach people
//! (chat, webhooks, console) is up to the sink. Sink errors are logged by the
//! hub and never reach the scheduler.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;

use crate::job::Mode;
use crate::scheduler::format_duration;
use crate::selection::TargetId;

#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    Started {
        target: TargetId,
        mode: Mode,
        total: u64,
    },
    /// Emitted every `milestone_units` processed units.
    Progress {
        target: TargetId,
        done: u64,
        total: u64,
        percent: f64,
        eta: Option<Duration>,
    },
    PausedForMemory {
        target: TargetId,
        used_ratio: f64,
    },
    Cancelled {
        target: TargetId,
        done: u64,
        total: u64,
        percent: f64,
    },
    Completed {
        target: TargetId,
        done: u64,
        skipped: u64,
        elapsed: Duration,
        units_per_sec: f64,
    },
    Error {
        target: Option<TargetId>,
        message: String,
    },
}

impl Notification {
    pub fn target(&self) -> Option<&TargetId> {
        match self {
            Notification::Started { target, .. }
            | Notification::Progress { target, .. }
            | Notification::PausedForMemory { target, .. }
            | Notification::Cancelled { target, .. }
            | Notification::Completed { target, .. } => Some(target),
            Notification::Error { target, .. } => target.as_ref(),
        }
    }

    /// One-line human readable summary.
    pub fn summary(&self) -> String {
        match self {
            Notification::Started { target, mode, total } => {
                format!("generation started on '{target}' in {mode} mode: {total} chunks")
            }
            Notification::Progress {
                target,
                done,
                total,
                percent,
                eta,
            } => {
                let eta = eta.map(format_duration).unwrap_or_else(|| "calculating".to_string());
                format!("'{target}' at {percent:.2}% ({done}/{total}), eta {eta}")
            }
            Notification::PausedForMemory { target, used_ratio } => format!(
                "generation on '{target}' paused: memory usage at {:.0}%",
                used_ratio * 100.0
            ),
            Notification::Cancelled {
                target,
                done,
                total,
                percent,
            } => format!("generation on '{target}' cancelled at {percent:.2}% ({done}/{total})"),
            Notification::Completed {
                target,
                done,
                skipped,
                elapsed,
                units_per_sec,
            } => format!(
                "generation on '{target}' completed: {done} chunks ({skipped} skipped) in {} at {units_per_sec:.2} chunks/s",
                format_duration(*elapsed)
            ),
            Notification::Error { target: Some(t), message } => format!("error on '{t}': {message}"),
            Notification::Error { target: None, message } => format!("error: {message}"),
        }
    }
}

/// Delivery backend for notifications.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, event: &Notification) -> Result<()>;
}

/// Backend writing every event to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl NotificationSink for LogNotifier {
    fn notify(&self, event: &Notification) -> Result<()> {
        match event {
            Notification::PausedForMemory { .. } | Notification::Error { .. } => {
                tracing::warn!("{}", event.summary())
            }
            _ => tracing::info!("{}", event.summary()),
        }
        Ok(())
    }
}

/// Fan-out over the configured sinks.
#[derive(Clone, Default)]
pub struct NotificationHub {
    sinks: Vec<Arc<dyn NotificationSink>>,
}

impl NotificationHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sink(mut self, sink: Arc<dyn NotificationSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    pub fn add_sink(&mut self, sink: Arc<dyn NotificationSink>) {
        self.sinks.push(sink);
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    pub fn notify(&self, event: &Notification) {
        for sink in &self.sinks {
            if let Err(e) = sink.notify(event) {
                tracing::warn!("notification delivery failed: {:#}", e);
            }
        }
    }
}
