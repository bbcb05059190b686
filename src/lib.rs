pub mod activity;
pub mod calendar;
pub mod config;
pub mod error;
#[cfg(feature = "http_api")]
pub mod http_api;
pub mod logging;
pub mod persistence;
pub mod resolver;
pub mod schedule;
pub mod timeline;

pub use activity::{Activity, ActivityPatch};
pub use calendar::{CalendarError, HolidayDate, WorkCalendar, WorkCalendarConfig};
pub use config::{ConfigError, PlannerConfig};
pub use error::{ScheduleError, ScheduleResult};
pub use persistence::{
    JsonFileStore, PersistenceError, ScheduleStore, load_schedule_from_csv,
    load_schedule_from_csv_into, load_schedule_from_json, load_schedule_from_json_into,
    save_schedule_to_csv, save_schedule_to_json, schedule_from_json_str, schedule_to_json_string,
};
pub use resolver::{ConflictResolver, Reschedule, Resolution};
pub use schedule::{Project, Schedule, UpsertOutcome, UpsertPolicy};
pub use timeline::{Timeline, TimelineFilter, TimelineRow};
