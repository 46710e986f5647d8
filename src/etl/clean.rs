//! Row validation and cleaning ahead of the load stage.

use crate::model::{RateRecord, RowWire, coerce_rate, coerce_timestamp};

/// Result of a cleaning pass: the surviving records plus the number of rows
/// that were dropped. The count is for the caller to log or report; dropped
/// rows are never an error.
#[derive(Debug)]
pub struct CleanOutcome {
    pub records: Vec<RateRecord>,
    pub dropped: usize,
}

/// Coerce and filter wire rows into persistable records.
///
/// A row is dropped when, after coercion, its target currency, rate, or
/// timestamp is missing. A missing base currency falls back to USD and a
/// missing source to an empty string; neither participates in validity.
pub fn clean(rows: Vec<RowWire>) -> CleanOutcome {
    let total = rows.len();
    let records: Vec<RateRecord> = rows.into_iter().filter_map(clean_row).collect();
    CleanOutcome {
        dropped: total - records.len(),
        records,
    }
}

fn clean_row(row: RowWire) -> Option<RateRecord> {
    let target_currency = row
        .target_currency
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())?;
    let rate = row.rate.as_ref().and_then(coerce_rate)?;
    let fetched_at = row.fetched_at.as_deref().and_then(coerce_timestamp)?;

    Some(RateRecord {
        base_currency: row.base_currency.unwrap_or_else(|| "USD".to_string()),
        target_currency,
        rate,
        fetched_at,
        source: row.source.unwrap_or_default(),
    })
}
