//! Planner configuration.
//!
//! Values come from an optional TOML file and are then overridden by
//! environment variables:
//!
//! | Variable | Field |
//! |---|---|
//! | `COMMESSE_CONFIG` | path of the TOML file |
//! | `COMMESSE_UPSERT_POLICY` | `upsert_policy` (`overwrite` or `reject_duplicate`) |
//! | `COMMESSE_HTTP_ADDR` | `http_addr` |
//! | `COMMESSE_LOG` | `log_filter` |
//!
//! The binaries also read `COMMESSE_DOCUMENT`, a JSON schedule loaded at
//! startup when present.
//!
//! ```toml
//! upsert_policy = "reject_duplicate"
//! http_addr = "127.0.0.1:8080"
//!
//! [calendar]
//! working_days = ["Mon", "Tue", "Wed", "Thu", "Fri"]
//! holidays = ["01/01", "25/12"]
//! ```

use crate::calendar::{CalendarError, WorkCalendar, WorkCalendarConfig};
use crate::schedule::{Schedule, UpsertPolicy};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const CONFIG_PATH_ENV: &str = "COMMESSE_CONFIG";
pub const UPSERT_POLICY_ENV: &str = "COMMESSE_UPSERT_POLICY";
pub const HTTP_ADDR_ENV: &str = "COMMESSE_HTTP_ADDR";
pub const LOG_FILTER_ENV: &str = "COMMESSE_LOG";
/// Optional JSON document the binaries load at startup.
pub const DOCUMENT_PATH_ENV: &str = "COMMESSE_DOCUMENT";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid calendar: {0}")]
    Calendar(#[from] CalendarError),
    #[error("invalid value for {var}: {message}")]
    InvalidEnv { var: &'static str, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    pub upsert_policy: UpsertPolicy,
    pub calendar: WorkCalendarConfig,
    pub http_addr: String,
    pub log_filter: String,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            upsert_policy: UpsertPolicy::default(),
            calendar: WorkCalendarConfig::default(),
            http_addr: "0.0.0.0:3000".to_string(),
            log_filter: "info".to_string(),
        }
    }
}

impl PlannerConfig {
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(contents)?;
        // Reject unusable calendars at load time rather than on first use.
        WorkCalendar::from_config(&config.calendar)?;
        Ok(config)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    /// File named by `COMMESSE_CONFIG` (or defaults), then environment overrides.
    pub fn from_env() -> Result<Self, ConfigError> {
        let base = match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) if !path.trim().is_empty() => Self::load(path.trim())?,
            _ => Self::default(),
        };
        base.with_overrides(|var| std::env::var(var).ok())
    }

    /// Applies overrides from `lookup`, which maps a variable name to its value.
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(policy) = lookup(UPSERT_POLICY_ENV) {
            self.upsert_policy = policy
                .parse()
                .map_err(|message| ConfigError::InvalidEnv {
                    var: UPSERT_POLICY_ENV,
                    message,
                })?;
        }
        if let Some(addr) = lookup(HTTP_ADDR_ENV) {
            self.http_addr = addr;
        }
        if let Some(filter) = lookup(LOG_FILTER_ENV) {
            self.log_filter = filter;
        }
        Ok(self)
    }

    pub fn work_calendar(&self) -> Result<WorkCalendar, ConfigError> {
        Ok(WorkCalendar::from_config(&self.calendar)?)
    }

    /// An empty schedule using the configured calendar and upsert policy.
    pub fn new_schedule(&self) -> Result<Schedule, ConfigError> {
        Ok(Schedule::from_parts(
            self.work_calendar()?,
            self.upsert_policy,
        ))
    }
}
