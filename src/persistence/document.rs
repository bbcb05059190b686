//! The persisted schedule document.
//!
//! ```json
//! {
//!   "Commessa A": {
//!     "A1": {"nome": "Sopralluogo", "risorsa": "Squadra 1", "durata": 5,
//!            "inizio": "2025-01-02", "fine": "2025-01-09"}
//!   }
//! }
//! ```
//!
//! Project and activity order is preserved in both directions.

use super::{PersistenceError, PersistenceResult};
use crate::activity::{self, Activity};
use crate::Schedule;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub(crate) const DATE_FORMAT: &str = "%Y-%m-%d";

/// One activity as stored in the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityRecord {
    pub nome: String,
    pub risorsa: String,
    pub durata: i64,
    pub inizio: String,
    pub fine: String,
}

impl From<&Activity> for ActivityRecord {
    fn from(activity: &Activity) -> Self {
        Self {
            nome: activity.name.clone(),
            risorsa: activity.resource.clone(),
            durata: i64::from(activity.duration_days),
            inizio: format_date(activity.start),
            fine: format_date(activity.end),
        }
    }
}

impl ActivityRecord {
    /// Converts the record without recomputing dates; the stored end date is
    /// kept even when it disagrees with the current calendar.
    pub(crate) fn into_activity(self, project: &str, code: &str) -> PersistenceResult<Activity> {
        let duration_days = activity::validate_duration(self.durata)
            .map_err(|err| PersistenceError::malformed(project, code, err))?;
        let start = parse_date(project, code, "inizio", &self.inizio)?;
        let end = parse_date(project, code, "fine", &self.fine)?;
        if end < start {
            return Err(PersistenceError::malformed(
                project,
                code,
                format!("fine {end} precedes inizio {start}"),
            ));
        }
        Ok(Activity {
            code: code.to_string(),
            name: self.nome,
            resource: self.risorsa,
            duration_days,
            start,
            end,
        })
    }
}

pub(crate) fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub(crate) fn parse_date(
    project: &str,
    code: &str,
    field: &str,
    input: &str,
) -> PersistenceResult<NaiveDate> {
    NaiveDate::parse_from_str(input, DATE_FORMAT).map_err(|err| {
        PersistenceError::malformed(project, code, format!("invalid {field} '{input}': {err}"))
    })
}

pub fn to_document(schedule: &Schedule) -> PersistenceResult<Value> {
    let mut projects = Map::new();
    for project in schedule.projects() {
        let mut activities = Map::new();
        for activity in project.activities() {
            let record = serde_json::to_value(ActivityRecord::from(activity))?;
            activities.insert(activity.code.clone(), record);
        }
        projects.insert(project.name().to_string(), Value::Object(activities));
    }
    Ok(Value::Object(projects))
}

/// Builds a schedule from a parsed document, taking calendar and policy from
/// `template`. Projects without activities are dropped.
pub fn from_document(document: Value, template: &Schedule) -> PersistenceResult<Schedule> {
    let Value::Object(projects) = document else {
        return Err(PersistenceError::MalformedDocument(
            "top level must be an object of projects".into(),
        ));
    };

    let mut schedule = template.empty_like();
    for (project, activities) in projects {
        let Value::Object(activities) = activities else {
            return Err(PersistenceError::MalformedDocument(format!(
                "project '{project}' must be an object of activities"
            )));
        };
        for (code, value) in activities {
            let record: ActivityRecord = serde_json::from_value(value)
                .map_err(|err| PersistenceError::malformed(&project, &code, err))?;
            let activity = record.into_activity(&project, &code)?;
            schedule
                .insert_verbatim(&project, activity)
                .map_err(|err| PersistenceError::malformed(&project, &code, err))?;
        }
    }
    Ok(schedule)
}

pub fn schedule_to_json_string(schedule: &Schedule) -> PersistenceResult<String> {
    let document = to_document(schedule)?;
    Ok(serde_json::to_string_pretty(&document)?)
}

pub fn schedule_from_json_str(json: &str, template: &Schedule) -> PersistenceResult<Schedule> {
    let document: Value = serde_json::from_str(json)?;
    from_document(document, template)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn document_uses_italian_field_names() {
        let mut schedule = Schedule::new();
        schedule
            .upsert("A", "A1", "Sopralluogo", "R1", 5, d(2025, 1, 2))
            .unwrap();
        let doc = to_document(&schedule).unwrap();
        let record = &doc["A"]["A1"];
        assert_eq!(record["nome"], "Sopralluogo");
        assert_eq!(record["risorsa"], "R1");
        assert_eq!(record["durata"], 5);
        assert_eq!(record["inizio"], "2025-01-02");
        assert_eq!(record["fine"], "2025-01-09");
    }

    #[test]
    fn document_preserves_insertion_order() {
        let mut schedule = Schedule::new();
        schedule.upsert("Zeta", "Z2", "x", "R1", 1, d(2025, 1, 2)).unwrap();
        schedule.upsert("Zeta", "Z1", "x", "R1", 1, d(2025, 1, 3)).unwrap();
        schedule.upsert("Alfa", "A1", "x", "R2", 1, d(2025, 1, 2)).unwrap();

        let json = schedule_to_json_string(&schedule).unwrap();
        let loaded = schedule_from_json_str(&json, &Schedule::new()).unwrap();
        assert_eq!(loaded.list_projects(), vec!["Zeta", "Alfa"]);
        let codes: Vec<&str> = loaded
            .list_activities("Zeta")
            .unwrap()
            .iter()
            .map(|a| a.code.as_str())
            .collect();
        assert_eq!(codes, vec!["Z2", "Z1"]);
    }

    #[test]
    fn empty_projects_are_dropped() {
        let loaded = schedule_from_json_str(r#"{"A": {}}"#, &Schedule::new()).unwrap();
        assert!(loaded.is_empty());
    }

    #[test]
    fn end_before_start_is_malformed() {
        let json = r#"{"A": {"A1": {"nome": "x", "risorsa": "R1", "durata": 1,
            "inizio": "2025-01-10", "fine": "2025-01-02"}}}"#;
        let err = schedule_from_json_str(json, &Schedule::new()).unwrap_err();
        assert!(matches!(err, PersistenceError::MalformedDocument(_)));
    }
}
