//! Resource conflict resolution.
//!
//! Activities sharing a resource must not overlap. The resolver groups the
//! schedule by resource, sorts each group by start date (stable, so ties keep
//! insertion order) and pushes later activities forward in two passes:
//!
//! 1. a single sweep over consecutive pairs, shifting `curr` past `prev` when
//!    `curr.start < prev.end`;
//! 2. a pairwise check over every cross-project pair, shifting the later
//!    entry of an incompatible pair past the earlier one.
//!
//! Pass 1 reads the already-shifted end of `prev`, so each resource's list
//! leaves it chained (`curr.start >= prev.end`) and pass 2 is a defensive
//! re-check: it only finds an incompatible pair when a pass 1 shift was
//! skipped, so no same-resource overlaps remain otherwise.
//! Neither pass iterates to a fixed point. Every move between activities of
//! different projects is reported as a [`Reschedule`]. A shift that would run
//! past the last representable date is skipped and logged at `warn`.

use crate::error::ScheduleError;
use crate::schedule::{ActivityRef, Schedule};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, warn};

/// A cross-project adjustment made by the resolver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reschedule {
    pub resource: String,
    pub project: String,
    pub code: String,
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl fmt::Display for Reschedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Resource '{}': moved activity '{}' of project '{}' from {} to {}",
            self.resource,
            self.code,
            self.project,
            self.from.format("%d/%m"),
            self.to.format("%d/%m")
        )
    }
}

/// Output of the non-destructive [`ConflictResolver::resolve`].
#[derive(Debug, Clone)]
pub struct Resolution {
    pub schedule: Schedule,
    pub log: Vec<Reschedule>,
}

impl Resolution {
    pub fn has_changes(&self) -> bool {
        !self.log.is_empty()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ConflictResolver;

impl ConflictResolver {
    pub fn new() -> Self {
        Self
    }

    /// Resolves a copy of `schedule`, leaving the input untouched.
    pub fn resolve(&self, schedule: &Schedule) -> Resolution {
        let mut resolved = schedule.clone();
        let log = self.resolve_in_place(&mut resolved);
        Resolution {
            schedule: resolved,
            log,
        }
    }

    /// Resolves `schedule` destructively and returns the log of cross-project moves.
    pub fn resolve_in_place(&self, schedule: &mut Schedule) -> Vec<Reschedule> {
        let mut log = Vec::new();
        let mut groups = schedule.group_by_resource();

        for (resource, refs) in groups.iter_mut() {
            refs.sort_by_key(|at| schedule.activity_at(*at).start);
            Self::sequential_pass(schedule, resource, refs, &mut log);
        }
        for (resource, refs) in &groups {
            Self::cross_project_pass(schedule, resource, refs, &mut log);
        }

        for entry in &log {
            warn!("{entry}");
        }
        log
    }

    fn sequential_pass(
        schedule: &mut Schedule,
        resource: &str,
        refs: &[ActivityRef],
        log: &mut Vec<Reschedule>,
    ) {
        for pair in refs.windows(2) {
            let (prev, curr) = (pair[0], pair[1]);
            let prev_end = schedule.activity_at(prev).end;
            if schedule.activity_at(curr).start < prev_end {
                let cross_project = prev.project != curr.project;
                let sink = cross_project.then_some(&mut *log);
                Self::shift_after(schedule, resource, curr, prev_end, sink);
            }
        }
    }

    fn cross_project_pass(
        schedule: &mut Schedule,
        resource: &str,
        refs: &[ActivityRef],
        log: &mut Vec<Reschedule>,
    ) {
        for (i, &a) in refs.iter().enumerate() {
            for &b in &refs[i + 1..] {
                if a.project == b.project {
                    continue;
                }
                let earlier = schedule.activity_at(a);
                if !earlier.is_compatible_with(schedule.activity_at(b)) {
                    let after = earlier.end;
                    Self::shift_after(schedule, resource, b, after, Some(&mut *log));
                }
            }
        }
    }

    /// Moves `target` to the first working day after `after`.
    fn shift_after(
        schedule: &mut Schedule,
        resource: &str,
        target: ActivityRef,
        after: NaiveDate,
        log: Option<&mut Vec<Reschedule>>,
    ) {
        let from = schedule.activity_at(target).start;
        let moved = after
            .succ_opt()
            .ok_or(ScheduleError::DateOutOfRange(after))
            .and_then(|requested| schedule.reschedule_at(target, requested));
        if let Err(err) = moved {
            warn!(
                resource,
                code = %schedule.activity_at(target).code,
                %from,
                "cannot shift activity: {err}"
            );
            return;
        }

        let moved = schedule.activity_at(target);
        debug!(
            resource,
            code = %moved.code,
            %from,
            to = %moved.start,
            "shifted activity"
        );
        if let Some(log) = log {
            log.push(Reschedule {
                resource: resource.to_string(),
                project: schedule.project_name_at(target).to_string(),
                code: moved.code.clone(),
                from,
                to: moved.start,
            });
        }
    }
}
