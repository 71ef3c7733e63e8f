use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::{mlog_debug, Error, Result};

/// Default bound on loop iterations before a run is declared runaway.
pub const DEFAULT_MAX_TICKS: usize = 100_000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Maximum number of tasks (micro plus macro) a single `run` may execute.
    #[serde(default = "default_max_ticks")]
    pub max_ticks: usize,
    /// Collect unobserved rejections when the loop drains.
    #[serde(default = "default_true")]
    pub report_unobserved: bool,
    /// Echo console lines to stdout as they are printed.
    #[serde(default)]
    pub echo_trace: bool,
}

fn default_max_ticks() -> usize {
    DEFAULT_MAX_TICKS
}

fn default_true() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_ticks: DEFAULT_MAX_TICKS,
            report_unobserved: true,
            echo_trace: false,
        }
    }
}

impl Config {
    pub fn home_dir() -> Result<PathBuf> {
        Ok(dirs::home_dir().ok_or(Error::NoHomeDir)?.join(".microloop"))
    }

    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::home_dir()?.join("microloop.toml"))
    }

    /// Load from `~/.microloop/microloop.toml`, or defaults if absent.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        mlog_debug!("Config::load path={}", path.display());
        if !path.exists() {
            mlog_debug!("Config file not found, using defaults");
            return Ok(Self::default());
        }
        let config: Self = toml::from_str(&fs::read_to_string(path)?)?;
        mlog_debug!(
            "Config loaded: max_ticks={}, report_unobserved={}, echo_trace={}",
            config.max_ticks,
            config.report_unobserved,
            config.echo_trace
        );
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, toml::to_string_pretty(self)?)?;
        mlog_debug!("Config saved to {}", path.display());
        Ok(())
    }
}
