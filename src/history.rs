//! Run-history bookkeeping.
//!
//! The pipeline binary records one row per run; the dashboard's run-log page
//! and the readiness utility read the same table. The table lives in the
//! run-history store, which defaults to the exchange store.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::prelude::FromRow;
use uuid::Uuid;

use crate::error::AppResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Success,
    Failed,
}

impl RunState {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunState::Success => "success",
            RunState::Failed => "failed",
        }
    }
}

/// Outcome of one pipeline run.
#[derive(Debug)]
pub struct RunRecord {
    pub run_id: Uuid,
    pub state: RunState,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// One row of the run log as read back for display.
#[derive(Debug, FromRow)]
pub struct RunRow {
    pub run_id: Uuid,
    pub state: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl RunRow {
    pub fn duration_seconds(&self) -> Option<i64> {
        self.finished_at
            .map(|end| (end - self.started_at).num_seconds())
    }
}

pub async fn ensure_schema(pool: &PgPool) -> AppResult<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS pipeline_runs (
            id SERIAL PRIMARY KEY,
            run_id UUID NOT NULL,
            state VARCHAR(16) NOT NULL,
            started_at TIMESTAMPTZ NOT NULL,
            finished_at TIMESTAMPTZ
        )
        "#,
    )
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn record(pool: &PgPool, run: &RunRecord) -> AppResult<()> {
    sqlx::query(
        "INSERT INTO pipeline_runs (run_id, state, started_at, finished_at) \
         VALUES ($1, $2, $3, $4)",
    )
    .bind(run.run_id)
    .bind(run.state.as_str())
    .bind(run.started_at)
    .bind(run.finished_at)
    .execute(pool)
    .await?;
    Ok(())
}

/// Number of successful runs on record. Used by the readiness check.
pub async fn successful_runs(pool: &PgPool) -> AppResult<i64> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM pipeline_runs WHERE state = 'success'")
            .fetch_one(pool)
            .await?;
    Ok(count)
}

/// Most recent runs, newest first.
pub async fn recent_runs(pool: &PgPool, limit: i64) -> AppResult<Vec<RunRow>> {
    let rows = sqlx::query_as::<_, RunRow>(
        "SELECT run_id, state, started_at, finished_at \
         FROM pipeline_runs ORDER BY started_at DESC LIMIT $1",
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}
