//! Startup readiness check: wait until the run-history store holds at least
//! one successful pipeline run, or until the bounded wait elapses. Exits 0
//! in both cases so dependent services are never blocked indefinitely.

use std::time::{Duration, Instant};

use exchange_rates::config::Settings;
use exchange_rates::etl::load::normalize_db_url;
use exchange_rates::history;
use sqlx::postgres::PgPoolOptions;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let settings = Settings::from_env();
    let Some(url) = settings.run_history_url() else {
        log::info!("no RUN_HISTORY_DB_URL or EXCHANGE_DB_URL provided; skipping wait");
        return;
    };
    let url = normalize_db_url(url);
    let max_wait = Duration::from_secs(settings.max_wait_secs);
    let start = Instant::now();
    log::info!("waiting up to {}s for a successful pipeline run", settings.max_wait_secs);

    loop {
        match count_successes(&url).await {
            Ok(count) if count > 0 => {
                log::info!("found {count} successful run(s); proceeding");
                return;
            }
            Ok(_) => log::debug!("no successful runs yet"),
            Err(e) => log::debug!("store not ready or query failed: {e}"),
        }

        if start.elapsed() >= max_wait {
            log::info!("timeout reached ({}s); proceeding anyway", settings.max_wait_secs);
            return;
        }
        tokio::time::sleep(settings.poll_interval()).await;
    }
}

async fn count_successes(url: &str) -> Result<i64, exchange_rates::AppError> {
    let pool = PgPoolOptions::new()
        .max_connections(1)
        .acquire_timeout(Duration::from_secs(5))
        .connect(url)
        .await?;
    let result = history::successful_runs(&pool).await;
    pool.close().await;
    result
}
