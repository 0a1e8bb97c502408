//! Interfaces to the host environment.
//!
//! The core never reaches into host internals: the host integration layer
//! supplies a loader, the load/memory metrics and the side-effect hooks used by
//! FAST mode. Statistics and notification sinks live in [`crate::stats`] and
//! [`crate::notify`].

use std::sync::Mutex;

use sysinfo::{MemoryRefreshKind, RefreshKind, System};

use crate::control::LoadTicket;
use crate::selection::{Coord, TargetId};

/// Issues asynchronous chunk loads.
pub trait ChunkLoader: Send + Sync {
    /// Start loading `coord` on `target`. Must not block; resolve `ticket`
    /// later, from any thread.
    fn request_load(&self, target: &TargetId, coord: Coord, ticket: LoadTicket);
}

/// Host busyness signal; higher means less busy (ticks-per-second equivalent).
pub trait LoadSource: Send + Sync {
    fn current_load(&self) -> f64;
}

/// Fraction of host memory in use, in `[0, 1]`.
pub trait MemorySource: Send + Sync {
    fn used_ratio(&self) -> f64;
}

/// Host side effects FAST mode asks to suspend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FastModeEffects {
    pub disable_spawning: bool,
    pub disable_events: bool,
    pub kick_players: bool,
    pub kick_message: String,
}

impl From<&crate::config::FastConfig> for FastModeEffects {
    fn from(cfg: &crate::config::FastConfig) -> Self {
        Self {
            disable_spawning: cfg.disable_spawning,
            disable_events: cfg.disable_events,
            kick_players: cfg.kick_players,
            kick_message: cfg.kick_message.clone(),
        }
    }
}

/// Hooks for host behaviour that a job may temporarily switch off.
pub trait HostControl: Send + Sync {
    fn suspend_side_effects(&self, _target: &TargetId, _effects: &FastModeEffects) {}
    fn restore_side_effects(&self, _target: &TargetId) {}
}

/// Host control that ignores every request.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoHostControl;

impl HostControl for NoHostControl {}

/// Constant load sample; useful when the host exposes no metric.
#[derive(Debug, Clone, Copy)]
pub struct FixedLoad(pub f64);

impl LoadSource for FixedLoad {
    fn current_load(&self) -> f64 {
        self.0
    }
}

/// Process-wide memory usage from the operating system.
pub struct SystemMemory {
    system: Mutex<System>,
}

impl Default for SystemMemory {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemMemory {
    pub fn new() -> Self {
        Self {
            system: Mutex::new(System::new_with_specifics(
                RefreshKind::nothing().with_memory(MemoryRefreshKind::everything()),
            )),
        }
    }
}

impl MemorySource for SystemMemory {
    fn used_ratio(&self) -> f64 {
        let mut system = match self.system.lock() {
            Ok(s) => s,
            Err(poisoned) => poisoned.into_inner(),
        };
        system.refresh_memory();
        let total = system.total_memory();
        if total == 0 {
            return 0.0;
        }
        (system.used_memory() as f64 / total as f64).clamp(0.0, 1.0)
    }
}
