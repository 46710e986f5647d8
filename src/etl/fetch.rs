//! Rate source client.

use std::time::Duration;

use chrono::Utc;
use indexmap::IndexMap;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;

use crate::error::{AppError, AppResult};
use crate::model::{FetchPayload, coerce_rate};

pub const API_URL: &str = "https://api.exchangerate-api.com/v4/latest/USD";

#[derive(Debug, Deserialize)]
struct RatesResponse {
    #[serde(default)]
    base: Option<String>,
    #[serde(default)]
    rates: serde_json::Map<String, Value>,
}

/// Thin client around the rate provider. Performs exactly one outbound call
/// per [`fetch`](RateClient::fetch) and never retries; retry policy belongs
/// to the orchestration layer.
pub struct RateClient {
    client: Client,
    timeout: Duration,
}

impl RateClient {
    pub fn new(timeout: Duration) -> Self {
        Self {
            client: Client::new(),
            timeout,
        }
    }

    /// Fetch the latest snapshot of USD rates.
    ///
    /// `fetched_at` is the local receipt time, not a server-reported time,
    /// so successive successful fetches in one process carry non-decreasing
    /// timestamps.
    pub async fn fetch(&self) -> AppResult<FetchPayload> {
        let resp = self
            .client
            .get(API_URL)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| AppError::SourceUnavailable(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(AppError::SourceUnavailable(format!(
                "{API_URL} returned {status}"
            )));
        }

        let body: RatesResponse = resp
            .json()
            .await
            .map_err(|e| AppError::SourceUnavailable(format!("invalid response body: {e}")))?;

        let fetched_at = Utc::now();
        let mut rates = IndexMap::with_capacity(body.rates.len());
        for (currency, value) in body.rates {
            match coerce_rate(&value) {
                Some(rate) => {
                    rates.insert(currency, rate);
                }
                None => log::warn!("provider sent non-numeric rate for {currency}: {value}"),
            }
        }

        Ok(FetchPayload {
            base: body.base.unwrap_or_else(|| "USD".to_string()),
            rates,
            fetched_at,
            source: API_URL.to_string(),
        })
    }
}
