//! Column-role inference and dynamic reads of the rate table.
//!
//! The dashboard does not assume it wrote the rate table, so it discovers
//! the table and its column roles from names alone, every render. When a
//! mandatory role cannot be assigned it refuses to guess.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use crate::error::{AppError, AppResult};

/// Keyword rules, in assignment order. The first column whose lowercased
/// name contains a keyword wins the role.
const CURRENCY_KEYWORDS: [&str; 2] = ["currency", "code"];
const RATE_KEYWORDS: [&str; 3] = ["rate", "price", "value"];
const TIMESTAMP_KEYWORDS: [&str; 2] = ["date", "time"];

/// Table-name keywords used to prefer a rate-looking table during discovery.
const TABLE_KEYWORDS: [&str; 3] = ["exchange", "rate", "currency"];

/// Which concrete columns play the currency, rate, and timestamp roles.
/// Currency and rate are mandatory; the timestamp is optional.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleMapping {
    pub currency: String,
    pub rate: String,
    pub timestamp: Option<String>,
}

fn first_match<'a>(columns: &'a [String], keywords: &[&str]) -> Option<&'a str> {
    columns.iter().map(String::as_str).find(|col| {
        let lower = col.to_lowercase();
        keywords.iter().any(|kw| lower.contains(kw))
    })
}

/// Assign roles to columns by keyword match.
pub fn infer_roles(columns: &[String]) -> AppResult<RoleMapping> {
    let currency = first_match(columns, &CURRENCY_KEYWORDS);
    let rate = first_match(columns, &RATE_KEYWORDS);
    let timestamp = first_match(columns, &TIMESTAMP_KEYWORDS);

    match (currency, rate) {
        (Some(currency), Some(rate)) => Ok(RoleMapping {
            currency: currency.to_string(),
            rate: rate.to_string(),
            timestamp: timestamp.map(str::to_string),
        }),
        _ => Err(AppError::SchemaDetection(format!(
            "could not detect currency and rate columns among: {}",
            columns.join(", ")
        ))),
    }
}

/// One decoded row of the discovered rate table.
#[derive(Debug, Clone, PartialEq)]
pub struct RateRow {
    pub currency: String,
    pub rate: Decimal,
    pub observed_at: Option<DateTime<Utc>>,
}

/// Pick the table to read: prefer the first whose name looks rate-related,
/// otherwise the first public base table. `None` when the store is empty.
pub async fn discover_rate_table(pool: &PgPool) -> AppResult<Option<String>> {
    let tables: Vec<String> = sqlx::query_scalar(
        "SELECT table_name::text FROM information_schema.tables \
         WHERE table_schema = 'public' AND table_type = 'BASE TABLE' \
         ORDER BY table_name",
    )
    .fetch_all(pool)
    .await?;

    let preferred = tables
        .iter()
        .find(|t| {
            let lower = t.to_lowercase();
            TABLE_KEYWORDS.iter().any(|kw| lower.contains(kw))
        })
        .or_else(|| tables.first());
    Ok(preferred.cloned())
}

/// Column names of a table, in ordinal position order.
pub async fn table_columns(pool: &PgPool, table: &str) -> AppResult<Vec<String>> {
    let columns: Vec<String> = sqlx::query_scalar(
        "SELECT column_name::text FROM information_schema.columns \
         WHERE table_schema = 'public' AND table_name = $1 \
         ORDER BY ordinal_position",
    )
    .bind(table)
    .fetch_all(pool)
    .await?;
    Ok(columns)
}

/// Read the role columns of `table`, ordered by the timestamp column when
/// one exists so that "latest" never depends on incidental read order.
pub async fn read_rates(
    pool: &PgPool,
    table: &str,
    roles: &RoleMapping,
) -> AppResult<Vec<RateRow>> {
    let mut sql = match &roles.timestamp {
        Some(ts) => format!(
            r#"SELECT "{c}" AS currency, "{r}" AS rate, "{t}" AS observed_at FROM "{table}""#,
            c = roles.currency,
            r = roles.rate,
            t = ts,
        ),
        None => format!(
            r#"SELECT "{c}" AS currency, "{r}" AS rate FROM "{table}""#,
            c = roles.currency,
            r = roles.rate,
        ),
    };
    if let Some(ts) = &roles.timestamp {
        sql.push_str(&format!(r#" ORDER BY "{ts}" ASC"#));
    }

    let rows = sqlx::query(&sql).fetch_all(pool).await?;
    let mut out = Vec::with_capacity(rows.len());
    let mut undecodable = 0usize;
    for row in rows {
        match decode_row(&row, roles.timestamp.is_some()) {
            Some(rate_row) => out.push(rate_row),
            None => undecodable += 1,
        }
    }
    if undecodable > 0 {
        log::debug!("skipped {undecodable} rows with undecodable currency or rate");
    }
    Ok(out)
}

/// Decode one dynamic row, tolerating rate columns typed as NUMERIC, float,
/// or text.
fn decode_row(row: &PgRow, has_timestamp: bool) -> Option<RateRow> {
    let currency: String = row.try_get("currency").ok()?;

    let rate = row
        .try_get::<Decimal, _>("rate")
        .ok()
        .or_else(|| row.try_get::<f64, _>("rate").ok().and_then(Decimal::from_f64))
        .or_else(|| {
            row.try_get::<String, _>("rate")
                .ok()
                .and_then(|s| s.trim().parse().ok())
        })?;

    let observed_at = if has_timestamp {
        row.try_get::<DateTime<Utc>, _>("observed_at")
            .ok()
            .or_else(|| {
                row.try_get::<chrono::NaiveDateTime, _>("observed_at")
                    .ok()
                    .map(|naive| naive.and_utc())
            })
    } else {
        None
    };

    Some(RateRow {
        currency,
        rate,
        observed_at,
    })
}

/// Full read path used by the data views: discover, infer, read.
/// `Ok(None)` means the store holds no tables yet.
pub async fn fetch_rate_rows(pool: &PgPool) -> AppResult<Option<(String, Vec<RateRow>)>> {
    let Some(table) = discover_rate_table(pool).await? else {
        return Ok(None);
    };
    let columns = table_columns(pool, &table).await?;
    let roles = infer_roles(&columns)?;
    let rows = read_rates(pool, &table, &roles).await?;
    Ok(Some((table, rows)))
}
