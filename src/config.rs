//! Configuration system.
//!
//! Grounded on the teacher's `config.rs`: hierarchical load from
//! `config.toml`, a git-ignored `config.local.toml` override, then
//! environment variables, merged with [`figment`] in that order. Only the
//! sections differ — solver tuning, planning heuristic choice, and
//! logging replace the teacher's storage/persistence/performance blocks,
//! none of which this evaluation core owns.
//!
//! ```toml
//! # config.toml
//! [solver]
//! conflict_counter_cap = 255
//!
//! [planning]
//! heuristic = "easy"
//! ```
//!
//! Environment variable overrides:
//! ```bash
//! ASPCORE_SOLVER__CONFLICT_COUNTER_CAP=511
//! ASPCORE_PLANNING__HEURISTIC=old
//! ```

use figment::providers::{Env, Format, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub solver: SolverConfig,
    #[serde(default)]
    pub planning: PlanningConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Tuning knobs for the CDNL solver (component C).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolverConfig {
    /// Conflict count at which every activity counter is halved (spec §4.3,
    /// "implementation-defined cap"; dlvhex uses 255).
    #[serde(default = "default_conflict_counter_cap")]
    pub conflict_counter_cap: u32,

    /// Initial capacity reserved for the nogood set, to reduce reallocation
    /// churn while Clark completion emits its nogoods.
    #[serde(default = "default_initial_nogood_capacity")]
    pub initial_nogood_capacity: usize,

    /// How many of the most recent conflict nogoods `guess()` scans before
    /// falling back to the globally most active unassigned variable.
    #[serde(default = "default_recent_conflicts_window")]
    pub recent_conflicts_window: usize,
}

fn default_conflict_counter_cap() -> u32 {
    255
}
fn default_initial_nogood_capacity() -> usize {
    1024
}
fn default_recent_conflicts_window() -> usize {
    16
}

impl Default for SolverConfig {
    fn default() -> Self {
        SolverConfig {
            conflict_counter_cap: default_conflict_counter_cap(),
            initial_nogood_capacity: default_initial_nogood_capacity(),
            recent_conflicts_window: default_recent_conflicts_window(),
        }
    }
}

/// Which eval-graph heuristic (component G) to use by default.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanningConfig {
    #[serde(default)]
    pub heuristic: HeuristicChoice,
    /// Command-list path, only consulted when `heuristic = "from_file"`.
    #[serde(default)]
    pub from_file_path: Option<String>,
}

impl Default for PlanningConfig {
    fn default() -> Self {
        PlanningConfig {
            heuristic: HeuristicChoice::default(),
            from_file_path: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum HeuristicChoice {
    Trivial,
    Old,
    #[default]
    Easy,
    FromFile,
}

/// Logging configuration (shape unchanged from the teacher's `LoggingConfig`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "text".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            solver: SolverConfig::default(),
            planning: PlanningConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from the default locations, merging
    /// `config.toml` < `config.local.toml` < `ASPCORE_`-prefixed env vars.
    pub fn load() -> Result<Self, figment::Error> {
        Figment::new()
            .merge(Toml::file("config.toml"))
            .merge(Toml::file("config.local.toml"))
            .merge(Env::prefixed("ASPCORE_").split("__"))
            .extract()
    }

    /// Load configuration from a specific file path, still applying env overrides.
    pub fn from_file(path: &str) -> Result<Self, figment::Error> {
        Figment::new()
            .merge(Toml::file(path))
            .merge(Env::prefixed("ASPCORE_").split("__"))
            .extract()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_matches_spec_defaults() {
        let config = Config::default();
        assert_eq!(config.solver.conflict_counter_cap, 255);
        assert_eq!(config.planning.heuristic, HeuristicChoice::Easy);
    }

    #[test]
    fn config_round_trips_through_toml() {
        let config = Config::default();
        let toml_str = toml::to_string(&config).unwrap();
        assert!(toml_str.contains("[solver]"));
        assert!(toml_str.contains("[planning]"));
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.solver.conflict_counter_cap, config.solver.conflict_counter_cap);
    }
}
