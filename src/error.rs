use chrono::NaiveDate;
use thiserror::Error;

/// Failures raised by the schedule store. None of them leave the schedule
/// partially modified.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScheduleError {
    #[error("activity '{code}' not found in project '{project}'")]
    NotFound { project: String, code: String },
    #[error("project '{0}' not found")]
    ProjectNotFound(String),
    #[error("activity '{code}' already exists in project '{project}'")]
    DuplicateCode { project: String, code: String },
    #[error("duration must be between 1 and 60 working days (got {0})")]
    InvalidDuration(i64),
    #[error("no working day within the supported date range after {0}")]
    DateOutOfRange(NaiveDate),
    #[error("invalid activity: {0}")]
    InvalidActivity(String),
}

pub type ScheduleResult<T> = Result<T, ScheduleError>;
