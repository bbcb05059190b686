//! Renderable view of a schedule.
//!
//! Charting front ends draw one bar per working day covered by an activity,
//! shade the non-working days of the overall span, and colour bars by the
//! lowercased activity name. Front ends render [`Timeline::resolved`], which
//! resolves resource conflicts before laying out bars.

use crate::{Activity, ConflictResolver, Schedule};
use chrono::{Datelike, NaiveDate};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

pub const DEFAULT_COLOR: &str = "#ffd92f";

const PALETTE: [(&str, &str); 5] = [
    ("sopralluogo", "#66c2a5"),
    ("pullout", "#fc8d62"),
    ("montaggio", "#8da0cb"),
    ("impianto pali", "#e78ac3"),
    ("montaggio pannelli", "#a6d854"),
];

/// Colour for an activity name, falling back to [`DEFAULT_COLOR`].
pub fn color_for(name: &str) -> &'static str {
    let key = name.trim().to_lowercase();
    PALETTE
        .iter()
        .find(|(category, _)| *category == key)
        .map(|(_, color)| *color)
        .unwrap_or(DEFAULT_COLOR)
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineFilter {
    #[serde(default)]
    pub project: Option<String>,
    /// Month (1-12) the activity starts in.
    #[serde(default)]
    pub month: Option<u32>,
}

impl TimelineFilter {
    pub fn project(name: impl Into<String>) -> Self {
        Self {
            project: Some(name.into()),
            month: None,
        }
    }

    pub fn with_month(mut self, month: u32) -> Self {
        self.month = Some(month);
        self
    }

    fn matches(&self, project: &str, activity: &Activity) -> bool {
        self.project.as_deref().is_none_or(|p| p == project)
            && self.month.is_none_or(|m| activity.start.month() == m)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimelineRow {
    pub project: String,
    pub code: String,
    pub label: String,
    pub resource: String,
    pub color: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    /// Working days in `[start, end]`, one bar each.
    pub bars: Vec<NaiveDate>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Timeline {
    rows: Vec<TimelineRow>,
    non_working_days: Vec<NaiveDate>,
}

impl Timeline {
    /// Rows are ordered by project name, then by activity insertion order.
    pub fn build(schedule: &Schedule, filter: &TimelineFilter) -> Self {
        let calendar = schedule.calendar();
        let mut projects: Vec<_> = schedule.projects().iter().collect();
        projects.sort_by(|a, b| a.name().cmp(b.name()));

        let mut rows = Vec::new();
        for project in projects {
            for activity in project.activities() {
                if !filter.matches(project.name(), activity) {
                    continue;
                }
                rows.push(TimelineRow {
                    project: project.name().to_string(),
                    code: activity.code.clone(),
                    label: format!("{}: {}", activity.code, activity.name),
                    resource: activity.resource.clone(),
                    color: color_for(&activity.name).to_string(),
                    start: activity.start,
                    end: activity.end,
                    bars: calendar.working_days_in_range(activity.start, activity.end),
                });
            }
        }

        let non_working_days = schedule
            .span()
            .map(|(start, end)| calendar.non_working_days_in_range(start, end))
            .unwrap_or_default();

        Self {
            rows,
            non_working_days,
        }
    }

    /// Builds from a conflict-resolved copy of `schedule`, so no resource is
    /// drawn double-booked. `schedule` itself is not modified.
    pub fn resolved(schedule: &Schedule, filter: &TimelineFilter) -> Self {
        let resolution = ConflictResolver::new().resolve(schedule);
        Self::build(&resolution.schedule, filter)
    }

    pub fn rows(&self) -> &[TimelineRow] {
        &self.rows
    }

    pub fn non_working_days(&self) -> &[NaiveDate] {
        &self.non_working_days
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// One row per bar with columns project, code, name, resource, color, day.
    pub fn to_dataframe(&self) -> PolarsResult<DataFrame> {
        let bar_count: usize = self.rows.iter().map(|r| r.bars.len()).sum();
        let mut projects: Vec<&str> = Vec::with_capacity(bar_count);
        let mut codes: Vec<&str> = Vec::with_capacity(bar_count);
        let mut labels: Vec<&str> = Vec::with_capacity(bar_count);
        let mut resources: Vec<&str> = Vec::with_capacity(bar_count);
        let mut colors: Vec<&str> = Vec::with_capacity(bar_count);
        let mut days: Vec<i32> = Vec::with_capacity(bar_count);

        for row in &self.rows {
            for day in &row.bars {
                projects.push(&row.project);
                codes.push(&row.code);
                labels.push(&row.label);
                resources.push(&row.resource);
                colors.push(&row.color);
                days.push(date_to_i32(*day));
            }
        }

        let day_series = Series::new(PlSmallStr::from_static("day"), days).cast(&DataType::Date)?;
        DataFrame::new(vec![
            Series::new(PlSmallStr::from_static("project"), projects).into_column(),
            Series::new(PlSmallStr::from_static("code"), codes).into_column(),
            Series::new(PlSmallStr::from_static("label"), labels).into_column(),
            Series::new(PlSmallStr::from_static("resource"), resources).into_column(),
            Series::new(PlSmallStr::from_static("color"), colors).into_column(),
            day_series.into_column(),
        ])
    }
}

/// Days since 1970-01-01, the polars `Date` representation.
fn date_to_i32(date: NaiveDate) -> i32 {
    (date - NaiveDate::default()).num_days() as i32
}
