use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::calendar::WorkCalendar;
use crate::error::ScheduleError;

/// A dated unit of work bound to a single resource.
///
/// `start` is always a working day and `end` is the date on which the
/// `duration_days`th working day (counting `start`) is reached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activity {
    /// Code unique within the owning project.
    pub code: String,
    /// Display name, also used to pick the timeline colour.
    pub name: String,
    pub resource: String,
    pub duration_days: u32,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl Activity {
    /// Builds an activity from a requested start, moving it onto the next
    /// working day and deriving the end date.
    pub fn planned(
        calendar: &WorkCalendar,
        code: impl Into<String>,
        name: impl Into<String>,
        resource: impl Into<String>,
        duration_days: u32,
        requested_start: NaiveDate,
    ) -> Result<Self, ScheduleError> {
        let (start, end) = working_span(calendar, requested_start, duration_days)?;
        Ok(Self {
            code: code.into(),
            name: name.into(),
            resource: resource.into(),
            duration_days,
            start,
            end,
        })
    }

    /// Moves the activity to begin on the first working day on or after
    /// `requested_start`, keeping its duration. Left unchanged on error.
    pub fn reschedule(
        &mut self,
        calendar: &WorkCalendar,
        requested_start: NaiveDate,
    ) -> Result<(), ScheduleError> {
        let (start, end) = working_span(calendar, requested_start, self.duration_days)?;
        self.start = start;
        self.end = end;
        Ok(())
    }

    /// Two activities are compatible when one finishes on or before the other starts.
    pub fn is_compatible_with(&self, other: &Activity) -> bool {
        self.end <= other.start || other.end <= self.start
    }
}

/// Partial change applied by [`crate::Schedule::update`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_days: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<NaiveDate>,
}

impl ActivityPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.resource.is_none()
            && self.duration_days.is_none()
            && self.start.is_none()
    }
}

/// Longest activity accepted, in working days.
pub const MAX_DURATION_DAYS: u32 = 60;

fn working_span(
    calendar: &WorkCalendar,
    requested_start: NaiveDate,
    duration_days: u32,
) -> Result<(NaiveDate, NaiveDate), ScheduleError> {
    let out_of_range = || ScheduleError::DateOutOfRange(requested_start);
    let start = calendar
        .next_working_day(requested_start)
        .ok_or_else(out_of_range)?;
    let end = calendar
        .add_working_days(start, duration_days)
        .ok_or_else(out_of_range)?;
    Ok((start, end))
}

pub(crate) fn validate_duration(duration_days: i64) -> Result<u32, ScheduleError> {
    match u32::try_from(duration_days) {
        Ok(days) if (1..=MAX_DURATION_DAYS).contains(&days) => Ok(days),
        _ => Err(ScheduleError::InvalidDuration(duration_days)),
    }
}

pub(crate) fn validate_label(field: &'static str, value: &str) -> Result<(), ScheduleError> {
    if value.trim().is_empty() {
        return Err(ScheduleError::InvalidActivity(format!(
            "{field} must not be blank"
        )));
    }
    Ok(())
}
