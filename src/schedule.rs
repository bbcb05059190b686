use crate::activity::{self, Activity, ActivityPatch};
use crate::calendar::WorkCalendar;
use crate::error::{ScheduleError, ScheduleResult};
use crate::resolver::{ConflictResolver, Reschedule};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, warn};

/// What `upsert` does when the activity code already exists in the project.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpsertPolicy {
    /// Replace the stored activity, keeping its position in the project.
    #[default]
    Overwrite,
    /// Keep the stored activity and report [`ScheduleError::DuplicateCode`].
    RejectDuplicate,
}

impl UpsertPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            UpsertPolicy::Overwrite => "overwrite",
            UpsertPolicy::RejectDuplicate => "reject_duplicate",
        }
    }
}

impl fmt::Display for UpsertPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UpsertPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "overwrite" => Ok(UpsertPolicy::Overwrite),
            "reject_duplicate" | "reject" => Ok(UpsertPolicy::RejectDuplicate),
            other => Err(format!("unknown upsert policy '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Created,
    Updated,
}

/// A named group of activities, kept in insertion order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Project {
    name: String,
    activities: Vec<Activity>,
}

impl Project {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            activities: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn activities(&self) -> &[Activity] {
        &self.activities
    }

    pub fn get(&self, code: &str) -> Option<&Activity> {
        self.activities.iter().find(|a| a.code == code)
    }

    fn position(&self, code: &str) -> Option<usize> {
        self.activities.iter().position(|a| a.code == code)
    }
}

/// Location of an activity inside a [`Schedule`]; valid until the next
/// structural change (insert or delete).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ActivityRef {
    pub project: usize,
    pub activity: usize,
}

/// The full set of projects and their activities, together with the
/// calendar used for every date computation.
#[derive(Debug, Clone, PartialEq)]
pub struct Schedule {
    projects: Vec<Project>,
    calendar: WorkCalendar,
    policy: UpsertPolicy,
}

impl Default for Schedule {
    fn default() -> Self {
        Self::new()
    }
}

impl Schedule {
    pub fn new() -> Self {
        Self::from_parts(WorkCalendar::default(), UpsertPolicy::default())
    }

    pub fn from_parts(calendar: WorkCalendar, policy: UpsertPolicy) -> Self {
        Self {
            projects: Vec::new(),
            calendar,
            policy,
        }
    }

    /// An empty schedule sharing this schedule's calendar and policy.
    pub fn empty_like(&self) -> Self {
        Self::from_parts(self.calendar.clone(), self.policy)
    }

    pub fn with_policy(mut self, policy: UpsertPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn calendar(&self) -> &WorkCalendar {
        &self.calendar
    }

    pub fn policy(&self) -> UpsertPolicy {
        self.policy
    }

    pub fn set_policy(&mut self, policy: UpsertPolicy) {
        self.policy = policy;
    }

    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    pub fn list_projects(&self) -> Vec<&str> {
        self.projects.iter().map(Project::name).collect()
    }

    pub fn list_activities(&self, project: &str) -> ScheduleResult<&[Activity]> {
        self.project(project)
            .map(Project::activities)
            .ok_or_else(|| ScheduleError::ProjectNotFound(project.to_string()))
    }

    pub fn project(&self, name: &str) -> Option<&Project> {
        self.projects.iter().find(|p| p.name == name)
    }

    pub fn get(&self, project: &str, code: &str) -> Option<&Activity> {
        self.project(project).and_then(|p| p.get(code))
    }

    /// Every activity paired with its project name, in insertion order.
    pub fn activities(&self) -> impl Iterator<Item = (&str, &Activity)> {
        self.projects
            .iter()
            .flat_map(|p| p.activities.iter().map(move |a| (p.name(), a)))
    }

    pub fn len(&self) -> usize {
        self.projects.iter().map(|p| p.activities.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }

    /// Earliest start and latest end across the whole schedule.
    pub fn span(&self) -> Option<(NaiveDate, NaiveDate)> {
        let start = self.activities().map(|(_, a)| a.start).min()?;
        let end = self.activities().map(|(_, a)| a.end).max()?;
        Some((start, end))
    }

    /// Resource names in the order they are first referenced.
    pub fn resources(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for (_, activity) in self.activities() {
            if !names.contains(&activity.resource.as_str()) {
                names.push(activity.resource.as_str());
            }
        }
        names
    }

    /// Creates or replaces the activity `(project, code)`.
    ///
    /// The requested start is moved onto the next working day and the end is
    /// derived from the duration. The project is created when missing.
    pub fn upsert(
        &mut self,
        project: &str,
        code: &str,
        name: &str,
        resource: &str,
        duration_days: i64,
        requested_start: NaiveDate,
    ) -> ScheduleResult<UpsertOutcome> {
        activity::validate_label("project", project)?;
        activity::validate_label("activity code", code)?;
        activity::validate_label("resource", resource)?;
        let duration = activity::validate_duration(duration_days)?;

        let existing = self
            .project_index(project)
            .and_then(|p| self.projects[p].position(code).map(|a| (p, a)));
        if existing.is_some() && self.policy == UpsertPolicy::RejectDuplicate {
            warn!(project, code, "activity code already exists, keeping stored activity");
            return Err(ScheduleError::DuplicateCode {
                project: project.to_string(),
                code: code.to_string(),
            });
        }

        let record = Activity::planned(
            &self.calendar,
            code,
            name,
            resource,
            duration,
            requested_start,
        )?;
        debug!(
            project,
            code,
            start = %record.start,
            end = %record.end,
            "upserting activity"
        );
        match existing {
            Some((p, a)) => {
                self.projects[p].activities[a] = record;
                Ok(UpsertOutcome::Updated)
            }
            None => {
                self.project_entry(project).activities.push(record);
                Ok(UpsertOutcome::Created)
            }
        }
    }

    /// Applies a partial change to an existing activity and recomputes its dates.
    pub fn update(
        &mut self,
        project: &str,
        code: &str,
        patch: ActivityPatch,
    ) -> ScheduleResult<&Activity> {
        let (p, a) = self
            .locate(project, code)
            .ok_or_else(|| Self::not_found(project, code))?;

        if let Some(resource) = &patch.resource {
            activity::validate_label("resource", resource)?;
        }
        let duration = patch
            .duration_days
            .map(activity::validate_duration)
            .transpose()?;

        let mut candidate = self.projects[p].activities[a].clone();
        if let Some(name) = patch.name {
            candidate.name = name;
        }
        if let Some(resource) = patch.resource {
            candidate.resource = resource;
        }
        if let Some(duration) = duration {
            candidate.duration_days = duration;
        }
        let start = patch.start.unwrap_or(candidate.start);
        candidate.reschedule(&self.calendar, start)?;
        debug!(
            project,
            code,
            start = %candidate.start,
            end = %candidate.end,
            "updated activity"
        );
        self.projects[p].activities[a] = candidate;
        Ok(&self.projects[p].activities[a])
    }

    /// Removes `(project, code)`; a project left without activities is removed too.
    pub fn delete(&mut self, project: &str, code: &str) -> ScheduleResult<Activity> {
        let (p, a) = self
            .locate(project, code)
            .ok_or_else(|| Self::not_found(project, code))?;
        let removed = self.projects[p].activities.remove(a);
        if self.projects[p].activities.is_empty() {
            debug!(project, "removing empty project");
            self.projects.remove(p);
        }
        debug!(project, code, "deleted activity");
        Ok(removed)
    }

    /// Runs the conflict resolver over this schedule, mutating it in place.
    pub fn resolve_conflicts(&mut self) -> Vec<Reschedule> {
        ConflictResolver::new().resolve_in_place(self)
    }

    /// Inserts an activity exactly as given, without recomputing its dates.
    /// Used when loading persisted documents.
    pub(crate) fn insert_verbatim(&mut self, project: &str, record: Activity) -> ScheduleResult<()> {
        if self.get(project, &record.code).is_some() {
            return Err(ScheduleError::DuplicateCode {
                project: project.to_string(),
                code: record.code,
            });
        }
        self.project_entry(project).activities.push(record);
        Ok(())
    }

    /// Activities grouped by resource, resources in first-seen order and
    /// activities in insertion order.
    pub(crate) fn group_by_resource(&self) -> Vec<(String, Vec<ActivityRef>)> {
        let mut groups: Vec<(String, Vec<ActivityRef>)> = Vec::new();
        for (p, project) in self.projects.iter().enumerate() {
            for (a, record) in project.activities.iter().enumerate() {
                let entry = ActivityRef {
                    project: p,
                    activity: a,
                };
                match groups.iter_mut().find(|(name, _)| *name == record.resource) {
                    Some((_, refs)) => refs.push(entry),
                    None => groups.push((record.resource.clone(), vec![entry])),
                }
            }
        }
        groups
    }

    pub(crate) fn activity_at(&self, at: ActivityRef) -> &Activity {
        &self.projects[at.project].activities[at.activity]
    }

    pub(crate) fn project_name_at(&self, at: ActivityRef) -> &str {
        &self.projects[at.project].name
    }

    /// Moves the referenced activity to start on the first working day on or
    /// after `requested_start`. The activity is left unchanged on error.
    pub(crate) fn reschedule_at(
        &mut self,
        at: ActivityRef,
        requested_start: NaiveDate,
    ) -> ScheduleResult<()> {
        let calendar = &self.calendar;
        self.projects[at.project].activities[at.activity].reschedule(calendar, requested_start)
    }

    fn project_index(&self, name: &str) -> Option<usize> {
        self.projects.iter().position(|p| p.name == name)
    }

    fn locate(&self, project: &str, code: &str) -> Option<(usize, usize)> {
        let p = self.project_index(project)?;
        let a = self.projects[p].position(code)?;
        Some((p, a))
    }

    fn project_entry(&mut self, name: &str) -> &mut Project {
        let idx = match self.project_index(name) {
            Some(idx) => idx,
            None => {
                self.projects.push(Project::new(name));
                self.projects.len() - 1
            }
        };
        &mut self.projects[idx]
    }

    fn not_found(project: &str, code: &str) -> ScheduleError {
        ScheduleError::NotFound {
            project: project.to_string(),
            code: code.to_string(),
        }
    }
}
