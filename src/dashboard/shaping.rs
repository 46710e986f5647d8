//! Pure data-shaping functions behind the dashboard views.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use rust_decimal::Decimal;

use crate::dashboard::schema::RateRow;

/// Latest rate per currency.
///
/// When rows carry timestamps the newest timestamp wins (later read order
/// breaks ties); without timestamps the last row in read order wins, which
/// is correct for an append-only table read in insertion order. Currencies
/// keep their first-seen order.
pub fn latest_rates(rows: &[RateRow]) -> Vec<(String, Decimal)> {
    let mut latest: IndexMap<String, (Option<DateTime<Utc>>, Decimal)> = IndexMap::new();
    for row in rows {
        let replace = match (latest.get(&row.currency), row.observed_at) {
            (Some((Some(prev), _)), Some(cur)) => cur >= *prev,
            _ => true,
        };
        if replace {
            latest.insert(row.currency.clone(), (row.observed_at, row.rate));
        }
    }
    latest
        .into_iter()
        .map(|(currency, (_, rate))| (currency, rate))
        .collect()
}

/// Order currencies for display: favorites first, in the store's iteration
/// order, then the remaining visible currencies in their original order.
pub fn order_with_favorites(visible: &[String], favorites: &[String]) -> Vec<String> {
    let mut ordered: Vec<String> = favorites.to_vec();
    ordered.extend(
        visible
            .iter()
            .filter(|c| !favorites.contains(c))
            .cloned(),
    );
    ordered
}

/// History of one currency, sorted ascending by timestamp. Rows without a
/// timestamp cannot be placed on a time axis and are excluded.
pub fn history_for(rows: &[RateRow], currency: &str) -> Vec<(DateTime<Utc>, Decimal)> {
    let mut points: Vec<(DateTime<Utc>, Decimal)> = rows
        .iter()
        .filter(|row| row.currency == currency)
        .filter_map(|row| row.observed_at.map(|at| (at, row.rate)))
        .collect();
    points.sort_by_key(|(at, _)| *at);
    points
}

/// Latest rates sorted strongest-rate-first for the comparison view.
pub fn sorted_for_comparison(latest: &[(String, Decimal)]) -> Vec<(String, Decimal)> {
    let mut sorted = latest.to_vec();
    sorted.sort_by(|a, b| b.1.cmp(&a.1));
    sorted
}

/// USD amount converted at a given rate.
pub fn convert(amount: Decimal, rate: Decimal) -> Decimal {
    amount * rate
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn row(currency: &str, rate: &str, minute: Option<u32>) -> RateRow {
        RateRow {
            currency: currency.to_string(),
            rate: rate.parse().unwrap(),
            observed_at: minute
                .map(|m| Utc.with_ymd_and_hms(2025, 6, 1, 12, m, 0).unwrap()),
        }
    }

    fn names(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn latest_prefers_newest_timestamp() {
        let rows = vec![
            row("EUR", "0.8", Some(10)),
            row("JPY", "149", Some(10)),
            row("EUR", "0.9", Some(20)),
            // Out-of-order append; must not shadow the newer EUR value.
            row("EUR", "0.7", Some(5)),
        ];
        let latest = latest_rates(&rows);
        assert_eq!(latest.len(), 2);
        assert_eq!(latest[0], ("EUR".to_string(), "0.9".parse().unwrap()));
        assert_eq!(latest[1], ("JPY".to_string(), "149".parse().unwrap()));
    }

    #[test]
    fn latest_falls_back_to_read_order_without_timestamps() {
        let rows = vec![
            row("EUR", "0.8", None),
            row("EUR", "0.9", None),
        ];
        let latest = latest_rates(&rows);
        assert_eq!(latest, [("EUR".to_string(), "0.9".parse().unwrap())]);
    }

    #[test]
    fn favorites_come_first_in_store_order() {
        let visible = names(&["AUD", "EUR", "GBP", "JPY"]);
        let favorites = names(&["JPY", "EUR"]);
        let ordered = order_with_favorites(&visible, &favorites);
        assert_eq!(ordered, names(&["JPY", "EUR", "AUD", "GBP"]));
    }

    #[test]
    fn no_favorites_keeps_original_order() {
        let visible = names(&["AUD", "EUR"]);
        assert_eq!(order_with_favorites(&visible, &[]), visible);
    }

    #[test]
    fn history_is_sorted_ascending_and_skips_untimestamped_rows() {
        let rows = vec![
            row("EUR", "0.9", Some(30)),
            row("EUR", "0.8", Some(10)),
            row("JPY", "150", Some(20)),
            row("EUR", "0.85", None),
        ];
        let history = history_for(&rows, "EUR");
        assert_eq!(history.len(), 2);
        assert!(history[0].0 < history[1].0);
        assert_eq!(history[0].1, "0.8".parse().unwrap());
        assert_eq!(history[1].1, "0.9".parse().unwrap());
    }

    #[test]
    fn history_of_unknown_currency_is_empty() {
        assert!(history_for(&[row("EUR", "0.9", Some(1))], "ZZZ").is_empty());
    }

    #[test]
    fn comparison_sorts_by_rate_descending() {
        let latest = vec![
            ("EUR".to_string(), "0.9".parse().unwrap()),
            ("JPY".to_string(), "150".parse().unwrap()),
            ("GBP".to_string(), "0.78".parse().unwrap()),
        ];
        let sorted = sorted_for_comparison(&latest);
        let order: Vec<&str> = sorted.iter().map(|(c, _)| c.as_str()).collect();
        assert_eq!(order, ["JPY", "EUR", "GBP"]);
    }

    #[test]
    fn converts_usd_amounts() {
        let amount: Decimal = "100".parse().unwrap();
        let rate: Decimal = "0.9".parse().unwrap();
        assert_eq!(convert(amount, rate), "90".parse::<Decimal>().unwrap());
    }
}
