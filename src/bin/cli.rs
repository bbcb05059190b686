use chrono::NaiveDate;
use commesse_planner::config::DOCUMENT_PATH_ENV;
use commesse_planner::{
    ActivityPatch, JsonFileStore, PlannerConfig, Schedule, ScheduleStore, Timeline,
    TimelineFilter, UpsertOutcome, UpsertPolicy, load_schedule_from_csv_into,
    load_schedule_from_json_into, logging, save_schedule_to_csv, save_schedule_to_json,
};
use polars::prelude::*;
use std::io::{self, Write};

fn cell(av: &AnyValue) -> String {
    match av {
        AnyValue::Null => String::new(),
        AnyValue::Int32(v) => v.to_string(),
        AnyValue::Int64(v) => v.to_string(),
        AnyValue::UInt32(v) => v.to_string(),
        AnyValue::String(s) => s.to_string(),
        _ => av.to_string(),
    }
}

fn render_df_as_text_table(df: &DataFrame) -> String {
    let columns = df.get_columns();
    let col_names: Vec<String> = columns.iter().map(|c| c.name().to_string()).collect();

    let mut rows: Vec<Vec<String>> = Vec::with_capacity(df.height());
    for row_idx in 0..df.height() {
        rows.push(
            columns
                .iter()
                .map(|col| col.get(row_idx).map(|av| cell(&av)).unwrap_or_default())
                .collect(),
        );
    }

    let mut widths: Vec<usize> = col_names.iter().map(|n| n.chars().count()).collect();
    for row in &rows {
        for (ci, s) in row.iter().enumerate() {
            widths[ci] = widths[ci].max(s.chars().count());
        }
    }

    let mut sep = String::from("+");
    for w in &widths {
        sep.push_str(&"-".repeat(*w + 2));
        sep.push('+');
    }

    let push_line = |out: &mut String, values: &[String]| {
        out.push('|');
        for (ci, s) in values.iter().enumerate() {
            out.push(' ');
            out.push_str(s);
            out.push_str(&" ".repeat(widths[ci].saturating_sub(s.chars().count())));
            out.push_str(" |");
        }
        out.push('\n');
    };

    let mut out = String::new();
    out.push_str(&sep);
    out.push('\n');
    push_line(&mut out, &col_names);
    out.push_str(&sep);
    out.push('\n');
    for row in &rows {
        push_line(&mut out, row);
    }
    out.push_str(&sep);
    out.push('\n');
    out
}

fn activities_frame(schedule: &Schedule, project: Option<&str>) -> PolarsResult<DataFrame> {
    let mut projects = Vec::new();
    let mut codes = Vec::new();
    let mut names = Vec::new();
    let mut resources = Vec::new();
    let mut durations = Vec::new();
    let mut starts = Vec::new();
    let mut ends = Vec::new();
    for (name, activity) in schedule.activities() {
        if project.is_some_and(|p| p != name) {
            continue;
        }
        projects.push(name.to_string());
        codes.push(activity.code.clone());
        names.push(activity.name.clone());
        resources.push(activity.resource.clone());
        durations.push(activity.duration_days);
        starts.push(activity.start.to_string());
        ends.push(activity.end.to_string());
    }
    DataFrame::new(vec![
        Series::new(PlSmallStr::from_static("project"), projects).into_column(),
        Series::new(PlSmallStr::from_static("code"), codes).into_column(),
        Series::new(PlSmallStr::from_static("name"), names).into_column(),
        Series::new(PlSmallStr::from_static("resource"), resources).into_column(),
        Series::new(PlSmallStr::from_static("duration_days"), durations).into_column(),
        Series::new(PlSmallStr::from_static("start"), starts).into_column(),
        Series::new(PlSmallStr::from_static("end"), ends).into_column(),
    ])
}

fn print_activities(schedule: &Schedule, project: Option<&str>) {
    match activities_frame(schedule, project) {
        Ok(df) => println!("{}", render_df_as_text_table(&df)),
        Err(e) => println!("Error rendering schedule: {}", e),
    }
}

fn print_help() {
    println!(
        "Commands:\n  help                                             Show this help\n  projects                                         List project names\n  list [project]                                   Show activities\n  add <project> <code> <resource> <days> <YYYY-MM-DD> <name...>\n                                                   Insert or replace an activity\n  edit <project> <code> <name|resource|days|start> <value...>\n                                                   Change one field of an activity\n  delete <project> <code>                          Delete an activity\n  resolve                                          Resolve resource conflicts\n  timeline [project|*] [month]                     Show timeline bars\n  workday <YYYY-MM-DD>                             Check a date against the calendar\n  policy [overwrite|reject_duplicate]              Show or set the upsert policy\n  save <json|csv> <path>                           Persist schedule to disk\n  load <json|csv> <path>                           Load schedule from disk\n  quit|exit                                        Exit"
    );
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

fn rest_of_line<'a>(parts: impl Iterator<Item = &'a str>) -> String {
    parts.collect::<Vec<_>>().join(" ")
}

fn initial_schedule(config: &PlannerConfig) -> anyhow::Result<Schedule> {
    let schedule = config.new_schedule()?;
    match std::env::var(DOCUMENT_PATH_ENV) {
        Ok(path) => {
            let store = JsonFileStore::with_template(&path, schedule.clone());
            Ok(store.load_schedule()?.unwrap_or(schedule))
        }
        Err(_) => Ok(schedule),
    }
}

fn main() -> anyhow::Result<()> {
    let config = PlannerConfig::from_env()?;
    logging::init(&config.log_filter);
    let mut schedule = initial_schedule(&config)?;

    println!("Commesse Planner (CLI) - type 'help' for commands\n");
    if !schedule.is_empty() {
        print_activities(&schedule, None);
    }

    let stdin = io::stdin();
    let mut line = String::new();
    loop {
        print!("> ");
        let _ = io::stdout().flush();
        line.clear();
        match stdin.read_line(&mut line) {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        let mut parts = input.split_whitespace();
        let cmd = parts.next().unwrap_or("");

        match cmd {
            "help" => print_help(),
            "quit" | "exit" => break,
            "projects" => {
                let projects = schedule.list_projects();
                if projects.is_empty() {
                    println!("No projects.");
                }
                for name in projects {
                    println!("  {}", name);
                }
            }
            "list" | "show" => {
                let project = parts.next();
                if let Some(Err(e)) = project.map(|name| schedule.list_activities(name)) {
                    println!("Error: {}", e);
                    continue;
                }
                print_activities(&schedule, project);
            }
            "add" => {
                let project = parts.next();
                let code = parts.next();
                let resource = parts.next();
                let days_s = parts.next();
                let start_s = parts.next();
                let name = rest_of_line(parts);
                match (project, code, resource, days_s, start_s) {
                    (Some(project), Some(code), Some(resource), Some(days_s), Some(start_s)) => {
                        let duration_days: i64 = match days_s.parse() {
                            Ok(v) => v,
                            Err(_) => {
                                println!("Invalid duration");
                                continue;
                            }
                        };
                        let Some(start) = parse_date(start_s) else {
                            println!("Invalid date (YYYY-MM-DD)");
                            continue;
                        };
                        match schedule.upsert(project, code, &name, resource, duration_days, start)
                        {
                            Ok(outcome) => {
                                let verb = match outcome {
                                    UpsertOutcome::Created => "added",
                                    UpsertOutcome::Updated => "updated",
                                };
                                println!("Activity {code} {verb} in project {project}.");
                                print_activities(&schedule, Some(project));
                            }
                            Err(e) => println!("Error: {}", e),
                        }
                    }
                    _ => println!(
                        "Usage: add <project> <code> <resource> <days> <YYYY-MM-DD> <name...>"
                    ),
                }
            }
            "edit" => {
                let project = parts.next();
                let code = parts.next();
                let field = parts.next();
                let value = rest_of_line(parts);
                let (Some(project), Some(code), Some(field)) = (project, code, field) else {
                    println!("Usage: edit <project> <code> <name|resource|days|start> <value...>");
                    continue;
                };
                let mut patch = ActivityPatch::default();
                match field {
                    "name" => patch.name = Some(value),
                    "resource" => patch.resource = Some(value),
                    "days" | "duration" => match value.parse::<i64>() {
                        Ok(v) => patch.duration_days = Some(v),
                        Err(_) => {
                            println!("Invalid duration");
                            continue;
                        }
                    },
                    "start" => match parse_date(&value) {
                        Some(date) => patch.start = Some(date),
                        None => {
                            println!("Invalid date (YYYY-MM-DD)");
                            continue;
                        }
                    },
                    other => {
                        println!("Unknown field '{other}'");
                        continue;
                    }
                }
                match schedule.update(project, code, patch) {
                    Ok(_) => {
                        println!("Activity {code} updated.");
                        print_activities(&schedule, Some(project));
                    }
                    Err(e) => println!("Error: {}", e),
                }
            }
            "delete" => match (parts.next(), parts.next()) {
                (Some(project), Some(code)) => match schedule.delete(project, code) {
                    Ok(_) => println!("Deleted activity {code} from project {project}."),
                    Err(e) => println!("Error: {}", e),
                },
                _ => println!("Usage: delete <project> <code>"),
            },
            "resolve" => {
                let log = schedule.resolve_conflicts();
                if log.is_empty() {
                    println!("No conflicts between projects.");
                } else {
                    for entry in &log {
                        println!("{}", entry);
                    }
                }
                print_activities(&schedule, None);
            }
            "timeline" => {
                let mut filter = TimelineFilter::default();
                if let Some(project) = parts.next().filter(|p| *p != "*") {
                    filter.project = Some(project.to_string());
                }
                if let Some(month_s) = parts.next() {
                    match month_s.parse::<u32>() {
                        Ok(m) if (1..=12).contains(&m) => filter.month = Some(m),
                        _ => {
                            println!("Invalid month (1-12)");
                            continue;
                        }
                    }
                }
                let timeline = Timeline::resolved(&schedule, &filter);
                if timeline.is_empty() {
                    println!("Nothing to show.");
                    continue;
                }
                match timeline.to_dataframe() {
                    Ok(df) => println!("{}", render_df_as_text_table(&df)),
                    Err(e) => println!("Error rendering timeline: {}", e),
                }
                let shaded = timeline
                    .non_working_days()
                    .iter()
                    .map(|d| d.format("%d/%m").to_string())
                    .collect::<Vec<_>>()
                    .join(", ");
                println!("Non-working days: {}", shaded);
            }
            "workday" => match parts.next().and_then(parse_date) {
                Some(date) => {
                    let calendar = schedule.calendar();
                    if calendar.is_working_day(date) {
                        println!("{date} is a working day.");
                    } else {
                        match calendar.next_working_day(date) {
                            Some(next) => println!(
                                "{date} is not a working day; next working day is {next}."
                            ),
                            None => println!(
                                "{date} is not a working day; no later working day exists."
                            ),
                        }
                    }
                }
                None => println!("Usage: workday <YYYY-MM-DD>"),
            },
            "policy" => match parts.next() {
                None => println!("Upsert policy: {}", schedule.policy()),
                Some(value) => match value.parse::<UpsertPolicy>() {
                    Ok(policy) => {
                        schedule.set_policy(policy);
                        println!("Upsert policy set to {}.", policy);
                    }
                    Err(e) => println!("Error: {}", e),
                },
            },
            "save" => match (parts.next(), parts.next()) {
                (Some("json"), Some(path)) => match save_schedule_to_json(&schedule, path) {
                    Ok(_) => println!("Schedule saved to {}.", path),
                    Err(e) => println!("Error saving schedule: {}", e),
                },
                (Some("csv"), Some(path)) => match save_schedule_to_csv(&schedule, path) {
                    Ok(_) => println!("Schedule saved to {}.", path),
                    Err(e) => println!("Error saving schedule: {}", e),
                },
                _ => println!("Usage: save <json|csv> <path>"),
            },
            "load" => {
                let result = match (parts.next(), parts.next()) {
                    (Some("json"), Some(path)) => {
                        Some((path, load_schedule_from_json_into(path, &mut schedule)))
                    }
                    (Some("csv"), Some(path)) => {
                        Some((path, load_schedule_from_csv_into(path, &mut schedule)))
                    }
                    _ => None,
                };
                match result {
                    Some((path, Ok(()))) => {
                        println!("Schedule loaded from {}.", path);
                        print_activities(&schedule, None);
                    }
                    Some((_, Err(e))) => println!("Error loading schedule: {}", e),
                    None => println!("Usage: load <json|csv> <path>"),
                }
            }
            _ => println!("Unknown command. Type 'help'."),
        }
    }
    Ok(())
}
