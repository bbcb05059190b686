#[cfg(feature = "http_api")]
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    use std::net::SocketAddr;

    use anyhow::Context;
    use commesse_planner::config::DOCUMENT_PATH_ENV;
    use commesse_planner::{JsonFileStore, PlannerConfig, ScheduleStore, http_api, logging};

    let config = PlannerConfig::from_env()?;
    logging::init(&config.log_filter);

    let addr: SocketAddr = config
        .http_addr
        .parse()
        .with_context(|| format!("invalid listen address '{}'", config.http_addr))?;

    let mut schedule = config.new_schedule()?;
    // Optional seed document, read once at startup.
    if let Ok(path) = std::env::var(DOCUMENT_PATH_ENV) {
        let store = JsonFileStore::with_template(&path, schedule.clone());
        if let Some(loaded) = store.load_schedule()? {
            schedule = loaded;
        }
    }

    println!("commesse-planner HTTP API listening on http://{addr}");
    http_api::serve(addr, schedule).await?;
    Ok(())
}

#[cfg(not(feature = "http_api"))]
fn main() {
    eprintln!("Rebuild with the `http_api` feature to enable the HTTP server.");
}
