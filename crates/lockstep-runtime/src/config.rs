//! Runtime configuration – loop period, logging and simulation settings.
//!
//! ```toml
//! period_ms = 20
//!
//! [log]
//! filter = "info"
//! format = "compact"   # or "json"
//!
//! [sim]
//! duration_s = 10.0
//! ```
//!
//! Every key is optional.  After the file is parsed, `LOCKSTEP_*` environment
//! variables are applied on top (see [`RuntimeConfig::apply_env_overrides`]).

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure to load or validate a [`RuntimeConfig`].
#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error("Failed to read config at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid config value for {field}: {details}")]
    Invalid { field: &'static str, details: String },
}

/// Output format of the console log layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogFormat::Compact => write!(f, "compact"),
            LogFormat::Json => write!(f, "json"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is not set.
    #[serde(default = "default_filter")]
    pub filter: String,

    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: default_filter(),
            format: LogFormat::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimConfig {
    /// How long the simulated match runs, in seconds.
    #[serde(default = "default_duration_s")]
    pub duration_s: f64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            duration_s: default_duration_s(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Loop period in milliseconds.
    #[serde(default = "default_period_ms")]
    pub period_ms: u64,

    #[serde(default)]
    pub log: LogConfig,

    #[serde(default)]
    pub sim: SimConfig,
}

fn default_period_ms() -> u64 {
    20
}
fn default_filter() -> String {
    "info".to_string()
}
fn default_duration_s() -> f64 {
    10.0
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            period_ms: default_period_ms(),
            log: LogConfig::default(),
            sim: SimConfig::default(),
        }
    }
}

impl RuntimeConfig {
    /// Parse and validate a TOML document.  Environment overrides are not
    /// applied.
    pub fn from_toml(raw: &str) -> Result<Self, RuntimeError> {
        let cfg: RuntimeConfig = toml::from_str(raw)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Read `path`, apply environment overrides and validate the result.
    pub fn load_from(path: &Path) -> Result<Self, RuntimeError> {
        let raw = fs::read_to_string(path).map_err(|source| RuntimeError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut cfg: RuntimeConfig = toml::from_str(&raw)?;
        cfg.apply_env_overrides();
        cfg.validate()?;
        Ok(cfg)
    }

    /// Apply `LOCKSTEP_*` environment variable overrides.
    ///
    /// | Variable | Config field |
    /// |---|---|
    /// | `LOCKSTEP_PERIOD_MS` | `period_ms` |
    /// | `LOCKSTEP_LOG_FORMAT` | `log.format` (`compact` or `json`) |
    ///
    /// Unparseable values are ignored.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// [`apply_env_overrides`][Self::apply_env_overrides] with an arbitrary
    /// variable lookup.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(v) = lookup("LOCKSTEP_PERIOD_MS")
            && let Ok(period_ms) = v.parse::<u64>()
        {
            self.period_ms = period_ms;
        }
        match lookup("LOCKSTEP_LOG_FORMAT").as_deref() {
            Some("json") => self.log.format = LogFormat::Json,
            Some("compact") => self.log.format = LogFormat::Compact,
            _ => {}
        }
    }

    pub fn validate(&self) -> Result<(), RuntimeError> {
        if self.period_ms == 0 {
            return Err(RuntimeError::Invalid {
                field: "period_ms",
                details: "loop period must be at least 1 ms".to_string(),
            });
        }
        let duration_s = self.sim.duration_s;
        if !(duration_s.is_finite() && duration_s > 0.0) {
            return Err(RuntimeError::Invalid {
                field: "sim.duration_s",
                details: format!("expected a positive number, got {duration_s}"),
            });
        }
        if let Err(e) = Duration::try_from_secs_f64(duration_s) {
            return Err(RuntimeError::Invalid {
                field: "sim.duration_s",
                details: format!("{duration_s} s is not a representable duration: {e}"),
            });
        }
        Ok(())
    }

    pub fn period(&self) -> Duration {
        Duration::from_millis(self.period_ms)
    }

    /// Match length; zero when `sim.duration_s` would not pass [`validate`].
    ///
    /// [`validate`]: Self::validate
    pub fn sim_duration(&self) -> Duration {
        Duration::try_from_secs_f64(self.sim.duration_s).unwrap_or(Duration::ZERO)
    }
}
