//! The three-stage fetch → transform → load contract.
//!
//! Each stage hands its output to the next as a JSON string, mirroring the
//! string-only transport of the external scheduler that drives these tasks.
//! Stages are strictly sequential; retries belong to the scheduler.

use crate::config::Settings;
use crate::error::{AppError, AppResult};
use crate::etl::clean::clean;
use crate::etl::fetch::RateClient;
use crate::etl::load;
use crate::etl::transform::transform;
use crate::model::{PayloadWire, RowWire};

fn non_blank(upstream: Option<&str>) -> Option<&str> {
    upstream.filter(|s| !s.trim().is_empty())
}

/// Fetch stage: one call to the rate source, output encoded for the
/// boundary.
pub async fn fetch_task(client: &RateClient) -> AppResult<String> {
    let payload = client.fetch().await?;
    log::info!("fetched {} rates for base {}", payload.rates.len(), payload.base);
    Ok(serde_json::to_string(&PayloadWire::encode(&payload))?)
}

/// Transform stage. Fails fast when the fetch stage left nothing behind;
/// "no upstream payload" and "empty payload" are different conditions, and
/// only the former is an error.
pub fn transform_task(upstream: Option<&str>) -> AppResult<String> {
    let raw = non_blank(upstream).ok_or(AppError::MissingUpstreamPayload)?;
    let wire: PayloadWire = serde_json::from_str(raw)?;
    let payload = wire.decode()?;
    let records = transform(&payload);
    log::info!("transformed into {} rows", records.len());
    let rows: Vec<RowWire> = records.iter().map(RowWire::encode).collect();
    Ok(serde_json::to_string(&rows)?)
}

/// Load stage: clean the rows and append the survivors.
///
/// An absent or empty row set is a successful no-op (nothing was fetched
/// this run), not a failure. Insert errors propagate after the pool has been
/// closed.
pub async fn load_task(
    upstream: Option<&str>,
    settings: &Settings,
    db_url: Option<&str>,
) -> AppResult<usize> {
    let Some(raw) = non_blank(upstream) else {
        log::info!("no rows to load; exiting");
        return Ok(0);
    };
    let rows: Vec<RowWire> = serde_json::from_str(raw)?;
    if rows.is_empty() {
        log::info!("no rows to load; exiting");
        return Ok(0);
    }

    let outcome = clean(rows);
    if outcome.dropped > 0 {
        log::warn!("dropped {} invalid rows", outcome.dropped);
    }
    if outcome.records.is_empty() {
        log::info!("after cleaning, no rows to insert");
        return Ok(0);
    }

    let url = load::effective_db_url(db_url, settings);
    let pool = load::connect(&url).await?;
    let result = async {
        load::ensure_schema(&pool).await?;
        load::load(&pool, &outcome.records).await
    }
    .await;
    pool.close().await;

    let inserted = result?;
    log::info!("inserted {inserted} rows into exchange_rates");
    Ok(inserted)
}

/// One full pipeline run: fetch, transform, load, in that order.
pub async fn run(settings: &Settings) -> AppResult<usize> {
    let client = RateClient::new(settings.fetch_timeout());
    let payload = fetch_task(&client).await?;
    let rows = transform_task(Some(&payload))?;
    load_task(Some(&rows), settings, None).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn transform_task_fails_without_upstream_payload() {
        assert!(matches!(
            transform_task(None),
            Err(AppError::MissingUpstreamPayload)
        ));
        assert!(matches!(
            transform_task(Some("   ")),
            Err(AppError::MissingUpstreamPayload)
        ));
    }

    #[test]
    fn transform_task_emits_wire_rows_in_payload_order() {
        let payload = json!({
            "base": "USD",
            "rates": {"EUR": 0.9, "JPY": 150},
            "fetched_at": "2025-06-01T12:00:00+00:00",
            "source": "test",
        });
        let out = transform_task(Some(&payload.to_string())).unwrap();
        let rows: Vec<RowWire> = serde_json::from_str(&out).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].target_currency.as_deref(), Some("EUR"));
        assert_eq!(rows[1].target_currency.as_deref(), Some("JPY"));
        // Timestamps stay ISO-8601 strings on the wire.
        assert_eq!(
            rows[0].fetched_at.as_deref(),
            Some("2025-06-01T12:00:00+00:00")
        );
    }

    #[tokio::test]
    async fn load_task_treats_missing_or_empty_rows_as_noop() {
        let settings = Settings::default();
        assert_eq!(load_task(None, &settings, None).await.unwrap(), 0);
        assert_eq!(load_task(Some(""), &settings, None).await.unwrap(), 0);
        assert_eq!(load_task(Some("[]"), &settings, None).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn load_task_is_noop_when_cleaning_drops_everything() {
        let rows = json!([
            {"base_currency": "USD", "target_currency": "EUR",
             "rate": "not-a-number", "fetched_at": "2025-06-01T12:00:00Z",
             "source": "test"},
        ]);
        let settings = Settings::default();
        // All rows invalid, so the store is never contacted.
        assert_eq!(
            load_task(Some(&rows.to_string()), &settings, None).await.unwrap(),
            0
        );
    }
}
