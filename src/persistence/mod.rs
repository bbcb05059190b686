use crate::Schedule;
use serde_json::Error as SerdeJsonError;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("malformed document: {0}")]
    MalformedDocument(String),
    #[error("serialization error: {0}")]
    Serialization(#[from] SerdeJsonError),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
}

impl PersistenceError {
    pub(crate) fn malformed(project: &str, code: &str, reason: impl std::fmt::Display) -> Self {
        PersistenceError::MalformedDocument(format!(
            "project '{project}', activity '{code}': {reason}"
        ))
    }
}

pub type PersistenceResult<T> = Result<T, PersistenceError>;

pub trait ScheduleStore {
    fn save_schedule(&self, schedule: &Schedule) -> PersistenceResult<()>;
    fn load_schedule(&self) -> PersistenceResult<Option<Schedule>>;
}

/// Keeps a schedule in a single JSON document on disk.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
    template: Schedule,
}

impl JsonFileStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self::with_template(path, Schedule::new())
    }

    /// Loaded schedules take their calendar and policy from `template`.
    pub fn with_template<P: AsRef<Path>>(path: P, template: Schedule) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            template: template.empty_like(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ScheduleStore for JsonFileStore {
    fn save_schedule(&self, schedule: &Schedule) -> PersistenceResult<()> {
        save_schedule_to_json(schedule, &self.path)
    }

    fn load_schedule(&self) -> PersistenceResult<Option<Schedule>> {
        if !self.path.exists() {
            info!(path = %self.path.display(), "no stored schedule");
            return Ok(None);
        }
        let mut schedule = self.template.empty_like();
        load_schedule_from_json_into(&self.path, &mut schedule)?;
        Ok(Some(schedule))
    }
}

pub mod document;
pub mod file;

pub use document::{ActivityRecord, schedule_from_json_str, schedule_to_json_string};
pub use file::{
    load_schedule_from_csv, load_schedule_from_csv_into, load_schedule_from_json,
    load_schedule_from_json_into, save_schedule_to_csv, save_schedule_to_json,
};
