use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::job::Mode;
use crate::selection::{Pattern, Shape};

/// NORMAL mode: fixed throughput.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalConfig {
    /// Units requested per second; divided by `ticks_per_second` per tick.
    pub units_per_second: u32,
}

impl Default for NormalConfig {
    fn default() -> Self {
        Self {
            units_per_second: 20,
        }
    }
}

/// PRO mode: batch size interpolated between min and max by host load.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProConfig {
    /// Load at or above which `max_units_per_tick` is used.
    pub target_load: f64,
    /// Load at or below which `min_units_per_tick` is used.
    pub min_load: f64,
    pub max_units_per_tick: u32,
    pub min_units_per_tick: u32,
}

impl Default for ProConfig {
    fn default() -> Self {
        Self {
            target_load: 19.0,
            min_load: 18.0,
            max_units_per_tick: 8,
            min_units_per_tick: 1,
        }
    }
}

/// FAST mode: fixed high batch plus host side effects suspended for the job.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FastConfig {
    pub units_per_tick: u32,
    pub disable_spawning: bool,
    pub disable_events: bool,
    pub kick_players: bool,
    pub kick_message: String,
}

impl Default for FastConfig {
    fn default() -> Self {
        Self {
            units_per_tick: 16,
            disable_spawning: true,
            disable_events: true,
            kick_players: true,
            kick_message: "Server is processing chunks".to_string(),
        }
    }
}

/// Memory-pressure guard.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryConfig {
    /// Used-memory ratio above which running jobs are paused.
    pub threshold: f64,
    /// Minimum time between two memory samples.
    pub check_interval_ms: u64,
    /// Minimum time between two memory-pressure alerts.
    pub alert_cooldown_ms: u64,
    /// Pause every running target on a breach instead of only the first one observed.
    pub pause_all: bool,
    /// Resume jobs paused for memory once a sample is back under the threshold.
    pub auto_resume: bool,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            threshold: 0.85,
            check_interval_ms: 5_000,
            alert_cooldown_ms: 60_000,
            pause_all: true,
            auto_resume: false,
        }
    }
}

impl MemoryConfig {
    pub fn check_interval(&self) -> Duration {
        Duration::from_millis(self.check_interval_ms)
    }

    pub fn alert_cooldown(&self) -> Duration {
        Duration::from_millis(self.alert_cooldown_ms)
    }
}

/// Console progress logging.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Suppress periodic progress lines entirely.
    pub silent: bool,
    pub console_updates: bool,
    /// Seconds between two progress lines for the same target.
    pub quiet_interval_secs: u64,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            silent: false,
            console_updates: true,
            quiet_interval_secs: 10,
        }
    }
}

/// Retry policy for failed or stalled load requests (optional section in config.toml).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Maximum number of attempts per unit (including the first) before it is skipped.
    pub max_attempts: u32,
    /// Seconds an outstanding request may stay unresolved before it counts as failed.
    pub request_timeout_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            request_timeout_secs: 30,
        }
    }
}

/// Defaults applied by the command surface when a field is not given.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultsConfig {
    pub mode: Mode,
    pub shape: Shape,
    pub pattern: Pattern,
    pub radius: i32,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            mode: Mode::Normal,
            shape: Shape::Square,
            pattern: Pattern::Spiral,
            radius: 100,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    /// Emit a progress milestone every N processed units (0 disables milestones).
    pub milestone_units: u64,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            milestone_units: 1000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    /// Host ticks between two checks of the queue monitor.
    pub monitor_interval_ticks: u32,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            monitor_interval_ticks: 1,
        }
    }
}

/// Global configuration loaded from `~/.config/pregen/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PregenConfig {
    /// Host ticks per second; NORMAL mode divides its per-second rate by this.
    #[serde(default = "default_ticks_per_second")]
    pub ticks_per_second: u32,
    #[serde(default)]
    pub normal: NormalConfig,
    #[serde(default)]
    pub pro: ProConfig,
    #[serde(default)]
    pub fast: FastConfig,
    #[serde(default)]
    pub memory: MemoryConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Optional retry policy; if missing, built-in defaults are used.
    #[serde(default)]
    pub retry: Option<RetryConfig>,
    #[serde(default)]
    pub defaults: DefaultsConfig,
    #[serde(default)]
    pub notifications: NotificationConfig,
    #[serde(default)]
    pub queue: QueueConfig,
}

fn default_ticks_per_second() -> u32 {
    20
}

impl Default for PregenConfig {
    fn default() -> Self {
        Self {
            ticks_per_second: default_ticks_per_second(),
            normal: NormalConfig::default(),
            pro: ProConfig::default(),
            fast: FastConfig::default(),
            memory: MemoryConfig::default(),
            logging: LoggingConfig::default(),
            retry: None,
            defaults: DefaultsConfig::default(),
            notifications: NotificationConfig::default(),
            queue: QueueConfig::default(),
        }
    }
}

impl PregenConfig {
    /// Duration of one host tick.
    pub fn tick_duration(&self) -> Duration {
        Duration::from_secs(1) / self.ticks_per_second.max(1)
    }

    /// Render as the TOML written to the config file.
    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("pregen")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<PregenConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = PregenConfig::default();
        let toml = default_cfg.to_toml_string()?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let cfg: PregenConfig = toml::from_str(&data)?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_values() {
        let cfg = PregenConfig::default();
        assert_eq!(cfg.ticks_per_second, 20);
        assert_eq!(cfg.normal.units_per_second, 20);
        assert_eq!(cfg.pro.max_units_per_tick, 8);
        assert_eq!(cfg.pro.min_units_per_tick, 1);
        assert_eq!(cfg.fast.units_per_tick, 16);
        assert!((cfg.memory.threshold - 0.85).abs() < 1e-9);
        assert_eq!(cfg.logging.quiet_interval_secs, 10);
        assert!(cfg.retry.is_none());
        assert_eq!(cfg.tick_duration(), Duration::from_millis(50));
    }

    #[test]
    fn config_toml_roundtrip() {
        let cfg = PregenConfig::default();
        let toml = toml::to_string_pretty(&cfg).unwrap();
        let parsed: PregenConfig = toml::from_str(&toml).unwrap();
        assert_eq!(parsed.ticks_per_second, cfg.ticks_per_second);
        assert_eq!(parsed.pro.max_units_per_tick, cfg.pro.max_units_per_tick);
        assert_eq!(parsed.defaults.mode, cfg.defaults.mode);
        assert_eq!(parsed.fast.kick_message, cfg.fast.kick_message);
    }

    #[test]
    fn config_toml_custom_values() {
        let toml = r#"
            ticks_per_second = 10

            [pro]
            target_load = 19.5
            min_load = 15.0
            max_units_per_tick = 32
            min_units_per_tick = 2

            [defaults]
            mode = "pro"
            shape = "circle"
            pattern = "concentric"
            radius = 50

            [retry]
            max_attempts = 5
            request_timeout_secs = 10
        "#;
        let cfg: PregenConfig = toml::from_str(toml).unwrap();
        assert_eq!(cfg.ticks_per_second, 10);
        assert_eq!(cfg.pro.max_units_per_tick, 32);
        assert!((cfg.pro.min_load - 15.0).abs() < 1e-9);
        assert_eq!(cfg.defaults.mode, Mode::Pro);
        assert_eq!(cfg.defaults.shape, Shape::Circle);
        assert_eq!(cfg.defaults.pattern, Pattern::Concentric);
        let retry = cfg.retry.as_ref().unwrap();
        assert_eq!(retry.max_attempts, 5);
        assert_eq!(retry.request_timeout_secs, 10);
        // untouched sections keep their defaults
        assert_eq!(cfg.normal.units_per_second, 20);
        assert!(cfg.memory.pause_all);
    }

    #[test]
    fn config_toml_partial_sections_fill_missing_keys() {
        let toml = r#"
            [pro]
            target_load = 19.5

            [memory]
            auto_resume = true

            [retry]
            max_attempts = 7
        "#;
        let cfg: PregenConfig = toml::from_str(toml).unwrap();
        assert!((cfg.pro.target_load - 19.5).abs() < 1e-9);
        assert!((cfg.pro.min_load - 18.0).abs() < 1e-9);
        assert_eq!(cfg.pro.max_units_per_tick, 8);
        assert!(cfg.memory.auto_resume);
        assert!((cfg.memory.threshold - 0.85).abs() < 1e-9);
        let retry = cfg.retry.as_ref().unwrap();
        assert_eq!(retry.max_attempts, 7);
        assert_eq!(retry.request_timeout_secs, 30);
    }

    #[test]
    fn config_toml_unknown_mode_is_rejected() {
        let toml = r#"
            [defaults]
            mode = "turbo"
            shape = "square"
            pattern = "spiral"
            radius = 10
        "#;
        assert!(toml::from_str::<PregenConfig>(toml).is_err());
    }
}
