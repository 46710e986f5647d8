//! Payload-to-rows transformation.

use crate::model::{FetchPayload, RateRecord};

/// Flatten one fetch payload into rate records, one per target currency.
///
/// Pure function. Output order follows the iteration order of
/// `payload.rates`; an empty mapping yields an empty vector, not an error.
pub fn transform(payload: &FetchPayload) -> Vec<RateRecord> {
    payload
        .rates
        .iter()
        .map(|(currency, rate)| RateRecord {
            base_currency: payload.base.clone(),
            target_currency: currency.clone(),
            rate: *rate,
            fetched_at: payload.fetched_at,
            source: payload.source.clone(),
        })
        .collect()
}
