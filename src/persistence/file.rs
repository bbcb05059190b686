use super::document::{self, ActivityRecord};
use super::{PersistenceError, PersistenceResult};
use crate::Schedule;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::info;

pub fn save_schedule_to_json<P: AsRef<Path>>(
    schedule: &Schedule,
    path: P,
) -> PersistenceResult<()> {
    let document = document::to_document(schedule)?;
    let file = File::create(path.as_ref())?;
    serde_json::to_writer_pretty(file, &document)?;
    info!(
        path = %path.as_ref().display(),
        activities = schedule.len(),
        "saved schedule document"
    );
    Ok(())
}

/// Loads a JSON document using the default calendar and upsert policy.
pub fn load_schedule_from_json<P: AsRef<Path>>(path: P) -> PersistenceResult<Schedule> {
    let mut schedule = Schedule::new();
    load_schedule_from_json_into(path, &mut schedule)?;
    Ok(schedule)
}

/// Replaces the contents of `target` with the document at `path`.
///
/// `target` keeps its calendar and policy, and is left unchanged on error.
pub fn load_schedule_from_json_into<P: AsRef<Path>>(
    path: P,
    target: &mut Schedule,
) -> PersistenceResult<()> {
    let file = File::open(path.as_ref())?;
    let value: serde_json::Value = serde_json::from_reader(BufReader::new(file))?;
    let loaded = document::from_document(value, target)?;
    info!(
        path = %path.as_ref().display(),
        activities = loaded.len(),
        "loaded schedule document"
    );
    *target = loaded;
    Ok(())
}

/// Flat CSV row: one activity per line.
#[derive(Debug, Serialize, Deserialize)]
struct ActivityCsvRecord {
    commessa: String,
    codice: String,
    nome: String,
    risorsa: String,
    durata: i64,
    inizio: String,
    fine: String,
}

impl ActivityCsvRecord {
    fn new(project: &str, code: &str, record: ActivityRecord) -> Self {
        Self {
            commessa: project.to_string(),
            codice: code.to_string(),
            nome: record.nome,
            risorsa: record.risorsa,
            durata: record.durata,
            inizio: record.inizio,
            fine: record.fine,
        }
    }

    fn split(self) -> (String, String, ActivityRecord) {
        let record = ActivityRecord {
            nome: self.nome,
            risorsa: self.risorsa,
            durata: self.durata,
            inizio: self.inizio,
            fine: self.fine,
        };
        (self.commessa, self.codice, record)
    }
}

pub fn save_schedule_to_csv<P: AsRef<Path>>(schedule: &Schedule, path: P) -> PersistenceResult<()> {
    let file = File::create(path.as_ref())?;
    let mut writer = csv::Writer::from_writer(file);
    for (project, activity) in schedule.activities() {
        let row = ActivityCsvRecord::new(project, &activity.code, ActivityRecord::from(activity));
        writer.serialize(row)?;
    }
    writer.flush()?;
    info!(
        path = %path.as_ref().display(),
        activities = schedule.len(),
        "exported schedule csv"
    );
    Ok(())
}

pub fn load_schedule_from_csv<P: AsRef<Path>>(path: P) -> PersistenceResult<Schedule> {
    let mut schedule = Schedule::new();
    load_schedule_from_csv_into(path, &mut schedule)?;
    Ok(schedule)
}

/// CSV counterpart of [`load_schedule_from_json_into`].
pub fn load_schedule_from_csv_into<P: AsRef<Path>>(
    path: P,
    target: &mut Schedule,
) -> PersistenceResult<()> {
    let file = File::open(path.as_ref())?;
    let mut reader = csv::Reader::from_reader(file);
    let mut loaded = target.empty_like();
    for (line, row) in reader.deserialize::<ActivityCsvRecord>().enumerate() {
        // Header is line 1.
        let row = row.map_err(|err| {
            PersistenceError::MalformedDocument(format!("csv row {}: {err}", line + 2))
        })?;
        let (project, code, record) = row.split();
        let activity = record.into_activity(&project, &code)?;
        loaded
            .insert_verbatim(&project, activity)
            .map_err(|err| PersistenceError::malformed(&project, &code, err))?;
    }
    info!(
        path = %path.as_ref().display(),
        activities = loaded.len(),
        "imported schedule csv"
    );
    *target = loaded;
    Ok(())
}
