use anyhow::Result;
use chrono::Utc;
use exchange_rates::config::Settings;
use exchange_rates::etl::{load, pipeline};
use exchange_rates::history::{self, RunRecord, RunState};
use uuid::Uuid;

/// One pipeline invocation: fetch → transform → load, then record the run
/// outcome. Scheduling and retries live outside this process.
#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let settings = Settings::from_env();
    let run_id = Uuid::new_v4();
    let started_at = Utc::now();

    let result = pipeline::run(&settings).await;
    let finished_at = Utc::now();

    let state = match &result {
        Ok(inserted) => {
            log::info!("run {run_id} finished: {inserted} rows loaded");
            RunState::Success
        }
        Err(e) => {
            log::error!("run {run_id} failed: {e}");
            RunState::Failed
        }
    };

    let record = RunRecord {
        run_id,
        state,
        started_at,
        finished_at,
    };
    if let Err(e) = record_run(&settings, &record).await {
        // Bookkeeping failure must not mask the run result.
        log::warn!("could not record run outcome: {e}");
    }

    result?;
    Ok(())
}

async fn record_run(settings: &Settings, record: &RunRecord) -> Result<()> {
    let url = match settings.run_history_url() {
        Some(url) => load::normalize_db_url(url),
        None => load::FALLBACK_DB_URL.to_string(),
    };
    let pool = load::connect(&url).await?;
    let result = async {
        history::ensure_schema(&pool).await?;
        history::record(&pool, record).await
    }
    .await;
    pool.close().await;
    result?;
    Ok(())
}
