use std::{net::SocketAddr, sync::Arc};

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use chrono::NaiveDate;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::info;

use crate::persistence::document;
use crate::{
    Activity, ActivityPatch, PersistenceError, Reschedule, Schedule, ScheduleError, Timeline,
    TimelineFilter, UpsertOutcome,
};

/// Shared handle on one loaded schedule. The resolver rewrites the whole
/// schedule, so every mutation takes the write lock for its full duration.
#[derive(Clone)]
pub struct AppState {
    schedule: Arc<RwLock<Schedule>>,
}

impl AppState {
    pub fn new(schedule: Schedule) -> Self {
        Self {
            schedule: Arc::new(RwLock::new(schedule)),
        }
    }

    pub fn with_shared(schedule: Arc<RwLock<Schedule>>) -> Self {
        Self { schedule }
    }

    fn schedule(&self) -> Arc<RwLock<Schedule>> {
        self.schedule.clone()
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    message: String,
}

#[derive(Debug)]
enum ApiError {
    NotFound(String),
    Conflict(String),
    Invalid(String),
    Internal(String),
}

impl From<ScheduleError> for ApiError {
    fn from(value: ScheduleError) -> Self {
        match value {
            ScheduleError::NotFound { .. } | ScheduleError::ProjectNotFound(_) => {
                ApiError::NotFound(value.to_string())
            }
            ScheduleError::DuplicateCode { .. } => ApiError::Conflict(value.to_string()),
            ScheduleError::InvalidDuration(_)
            | ScheduleError::InvalidActivity(_)
            | ScheduleError::DateOutOfRange(_) => ApiError::Invalid(value.to_string()),
        }
    }
}

impl From<PersistenceError> for ApiError {
    fn from(value: PersistenceError) -> Self {
        match value {
            PersistenceError::MalformedDocument(_) | PersistenceError::Serialization(_) => {
                ApiError::Invalid(value.to_string())
            }
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, message) = match self {
            ApiError::NotFound(message) => (StatusCode::NOT_FOUND, "not_found", message),
            ApiError::Conflict(message) => (StatusCode::CONFLICT, "conflict", message),
            ApiError::Invalid(message) => (StatusCode::BAD_REQUEST, "invalid_request", message),
            ApiError::Internal(message) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", message)
            }
        };
        (status, Json(ErrorBody { error, message })).into_response()
    }
}

#[derive(Debug, Deserialize)]
pub struct UpsertPayload {
    pub name: String,
    pub resource: String,
    pub duration_days: i64,
    pub start: NaiveDate,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ResolveResponse {
    pub log: Vec<Reschedule>,
    pub messages: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct WorkingDayResponse {
    pub date: NaiveDate,
    pub working_day: bool,
    /// `None` when no working day is reachable before the end of the date range.
    pub next_working_day: Option<NaiveDate>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/projects", get(list_projects))
        .route("/projects/:project/activities", get(list_activities))
        .route(
            "/projects/:project/activities/:code",
            get(get_activity)
                .put(upsert_activity)
                .patch(update_activity)
                .delete(delete_activity),
        )
        .route("/resolve", post(resolve_conflicts))
        .route("/timeline", get(timeline))
        .route("/document", put(replace_document).get(get_document))
        .route("/calendar/:date", get(working_day))
        .with_state(state)
}

pub async fn serve(addr: SocketAddr, schedule: Schedule) -> std::io::Result<()> {
    let state = AppState::new(schedule);
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "http api listening");
    axum::serve(listener, app).await
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn list_projects(State(state): State<AppState>) -> Json<Vec<String>> {
    let schedule = state.schedule();
    let guard = schedule.read();
    Json(
        guard
            .list_projects()
            .into_iter()
            .map(str::to_string)
            .collect(),
    )
}

async fn list_activities(
    State(state): State<AppState>,
    Path(project): Path<String>,
) -> Result<Json<Vec<Activity>>, ApiError> {
    let schedule = state.schedule();
    let guard = schedule.read();
    let activities = guard.list_activities(&project)?;
    Ok(Json(activities.to_vec()))
}

async fn get_activity(
    State(state): State<AppState>,
    Path((project, code)): Path<(String, String)>,
) -> Result<Json<Activity>, ApiError> {
    let schedule = state.schedule();
    let guard = schedule.read();
    guard
        .get(&project, &code)
        .cloned()
        .map(Json)
        .ok_or_else(|| {
            ApiError::from(ScheduleError::NotFound {
                project: project.clone(),
                code: code.clone(),
            })
        })
}

async fn upsert_activity(
    State(state): State<AppState>,
    Path((project, code)): Path<(String, String)>,
    Json(payload): Json<UpsertPayload>,
) -> Result<(StatusCode, Json<Activity>), ApiError> {
    let schedule = state.schedule();
    let mut guard = schedule.write();
    let outcome = guard.upsert(
        &project,
        &code,
        &payload.name,
        &payload.resource,
        payload.duration_days,
        payload.start,
    )?;
    let stored = guard
        .get(&project, &code)
        .cloned()
        .ok_or_else(|| ApiError::Internal("activity missing after upsert".into()))?;
    let status = match outcome {
        UpsertOutcome::Created => StatusCode::CREATED,
        UpsertOutcome::Updated => StatusCode::OK,
    };
    Ok((status, Json(stored)))
}

async fn update_activity(
    State(state): State<AppState>,
    Path((project, code)): Path<(String, String)>,
    Json(patch): Json<ActivityPatch>,
) -> Result<Json<Activity>, ApiError> {
    if patch.is_empty() {
        return Err(ApiError::Invalid("patch contains no changes".into()));
    }
    let schedule = state.schedule();
    let mut guard = schedule.write();
    let updated = guard.update(&project, &code, patch)?;
    Ok(Json(updated.clone()))
}

async fn delete_activity(
    State(state): State<AppState>,
    Path((project, code)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    let schedule = state.schedule();
    let mut guard = schedule.write();
    guard.delete(&project, &code)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn resolve_conflicts(State(state): State<AppState>) -> Json<ResolveResponse> {
    let schedule = state.schedule();
    let log = {
        let mut guard = schedule.write();
        guard.resolve_conflicts()
    };
    let messages = log.iter().map(ToString::to_string).collect();
    Json(ResolveResponse { log, messages })
}

async fn timeline(
    State(state): State<AppState>,
    Query(filter): Query<TimelineFilter>,
) -> Json<Timeline> {
    let schedule = state.schedule();
    let guard = schedule.read();
    Json(Timeline::resolved(&guard, &filter))
}

async fn get_document(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let schedule = state.schedule();
    let guard = schedule.read();
    Ok(Json(document::to_document(&guard)?))
}

async fn replace_document(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    let schedule = state.schedule();
    let mut guard = schedule.write();
    let loaded = document::from_document(body, &guard)?;
    *guard = loaded;
    Ok(Json(document::to_document(&guard)?))
}

async fn working_day(
    State(state): State<AppState>,
    Path(date): Path<NaiveDate>,
) -> Json<WorkingDayResponse> {
    let schedule = state.schedule();
    let guard = schedule.read();
    let calendar = guard.calendar();
    Json(WorkingDayResponse {
        date,
        working_day: calendar.is_working_day(date),
        next_working_day: calendar.next_working_day(date),
    })
}
