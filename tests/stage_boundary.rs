//! End-to-end checks of the stage-boundary contract, up to (but not
//! including) the database write.

use chrono::{TimeZone, Utc};
use exchange_rates::etl::clean::clean;
use exchange_rates::etl::pipeline::transform_task;
use exchange_rates::model::{FetchPayload, PayloadWire, RowWire};
use indexmap::IndexMap;

fn payload() -> FetchPayload {
    let mut rates = IndexMap::new();
    rates.insert("EUR".to_string(), "0.9".parse().unwrap());
    rates.insert("JPY".to_string(), "150".parse().unwrap());
    FetchPayload {
        base: "USD".to_string(),
        rates,
        fetched_at: Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap(),
        source: "test".to_string(),
    }
}

#[test]
fn payload_flows_through_transform_and_clean_unchanged() {
    // Fetch output crosses the boundary as a JSON string.
    let fetched = serde_json::to_string(&PayloadWire::encode(&payload())).unwrap();

    // Transform consumes the string and emits wire rows.
    let rows_json = transform_task(Some(&fetched)).unwrap();
    let rows: Vec<RowWire> = serde_json::from_str(&rows_json).unwrap();
    assert_eq!(rows.len(), 2);

    // Load-side cleaning restores typed records with values intact.
    let outcome = clean(rows);
    assert_eq!(outcome.dropped, 0);
    assert_eq!(outcome.records.len(), 2);

    assert_eq!(outcome.records[0].target_currency, "EUR");
    assert_eq!(outcome.records[0].rate, "0.9".parse().unwrap());
    assert_eq!(outcome.records[1].target_currency, "JPY");
    assert_eq!(outcome.records[1].rate, "150".parse().unwrap());
    for record in &outcome.records {
        assert_eq!(record.base_currency, "USD");
        assert_eq!(record.fetched_at, payload().fetched_at);
        assert_eq!(record.source, "test");
    }
}

#[test]
fn malformed_row_injected_at_the_boundary_is_dropped_and_counted() {
    let fetched = serde_json::to_string(&PayloadWire::encode(&payload())).unwrap();
    let rows_json = transform_task(Some(&fetched)).unwrap();
    let mut rows: Vec<RowWire> = serde_json::from_str(&rows_json).unwrap();

    rows.push(RowWire {
        base_currency: Some("USD".to_string()),
        target_currency: Some("XXX".to_string()),
        rate: Some(serde_json::json!("not-a-number")),
        fetched_at: Some("2025-06-01T12:00:00Z".to_string()),
        source: Some("test".to_string()),
    });

    let outcome = clean(rows);
    assert_eq!(outcome.dropped, 1);
    assert_eq!(outcome.records.len(), 2);
    assert!(outcome.records.iter().all(|r| r.target_currency != "XXX"));
}
