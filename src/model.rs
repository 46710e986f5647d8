//! Domain types and the stage-boundary wire format.
//!
//! The pipeline stages hand data to each other through a transport that only
//! carries plain structured data, so the in-memory domain types
//! ([`FetchPayload`], [`RateRecord`]) have wire counterparts ([`PayloadWire`],
//! [`RowWire`]) in which timestamps are ISO-8601 strings and rates are
//! strings or numbers. Encode/decode between the two lives here and nowhere
//! else.

use chrono::{DateTime, NaiveDateTime, Utc};
use indexmap::IndexMap;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::AppResult;

/// One snapshot of USD-denominated rates, as returned by the source client.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchPayload {
    pub base: String,
    /// Keyed by target currency; iteration order is the provider's order.
    pub rates: IndexMap<String, Decimal>,
    /// Local receipt time, always timezone-aware.
    pub fetched_at: DateTime<Utc>,
    pub source: String,
}

/// One flat rate row, ready for persistence.
#[derive(Debug, Clone, PartialEq)]
pub struct RateRecord {
    pub base_currency: String,
    pub target_currency: String,
    pub rate: Decimal,
    pub fetched_at: DateTime<Utc>,
    pub source: String,
}

/// Wire form of [`FetchPayload`] crossing the fetch→transform boundary.
#[derive(Debug, Serialize, Deserialize)]
pub struct PayloadWire {
    pub base: String,
    /// Raw provider values; coerced to [`Decimal`] on decode. The map type
    /// preserves insertion order so row order stays deterministic.
    pub rates: serde_json::Map<String, Value>,
    pub fetched_at: String,
    pub source: String,
}

impl PayloadWire {
    pub fn encode(payload: &FetchPayload) -> Self {
        let mut rates = serde_json::Map::new();
        for (currency, rate) in &payload.rates {
            rates.insert(currency.clone(), Value::String(rate.to_string()));
        }
        Self {
            base: payload.base.clone(),
            rates,
            fetched_at: payload.fetched_at.to_rfc3339(),
            source: payload.source.clone(),
        }
    }

    /// Rebuild the domain payload. Rate values that cannot be coerced to a
    /// number are skipped with a warning; a bad timestamp is an error since
    /// every downstream row would be dropped anyway.
    pub fn decode(self) -> AppResult<FetchPayload> {
        let fetched_at = coerce_timestamp(&self.fetched_at).ok_or_else(|| {
            crate::AppError::SourceUnavailable(format!(
                "unparseable fetched_at in payload: {}",
                self.fetched_at
            ))
        })?;

        let mut rates = IndexMap::with_capacity(self.rates.len());
        for (currency, value) in self.rates {
            match coerce_rate(&value) {
                Some(rate) => {
                    rates.insert(currency, rate);
                }
                None => log::warn!("skipping non-numeric rate for {currency}: {value}"),
            }
        }

        Ok(FetchPayload {
            base: self.base,
            rates,
            fetched_at,
            source: self.source,
        })
    }
}

/// Wire form of [`RateRecord`] crossing the transform→load boundary.
///
/// Every field is optional on the way in: the loader must tolerate rows
/// mangled upstream and leave the filtering to `etl::clean`.
#[derive(Debug, Serialize, Deserialize)]
pub struct RowWire {
    pub base_currency: Option<String>,
    pub target_currency: Option<String>,
    pub rate: Option<Value>,
    pub fetched_at: Option<String>,
    pub source: Option<String>,
}

impl RowWire {
    pub fn encode(record: &RateRecord) -> Self {
        Self {
            base_currency: Some(record.base_currency.clone()),
            target_currency: Some(record.target_currency.clone()),
            rate: Some(Value::String(record.rate.to_string())),
            fetched_at: Some(record.fetched_at.to_rfc3339()),
            source: Some(record.source.clone()),
        }
    }
}

/// Coerce a wire value to a finite decimal rate.
///
/// Accepts JSON numbers and numeric strings; anything else is "missing".
pub fn coerce_rate(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => n.to_string().parse::<Decimal>().ok(),
        Value::String(s) => s.trim().parse::<Decimal>().ok(),
        _ => None,
    }
}

/// Coerce a wire timestamp to a UTC-aware instant.
///
/// Accepts RFC 3339 as well as the `YYYY-MM-DD HH:MM:SS[.frac][±TZ]` shape
/// that loosely stringified timestamps tend to arrive in.
pub fn coerce_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f%:z") {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    None
}
