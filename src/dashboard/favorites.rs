//! Local favorites store.
//!
//! A single-file sqlite table `(currency TEXT PRIMARY KEY, fav INTEGER)`
//! opened once per dashboard process and threaded through the server state;
//! no process-wide globals. Un-favoriting deletes the row, so absence means
//! "not favorited".

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

use crate::error::AppResult;

#[derive(Clone)]
pub struct FavoriteStore {
    pool: SqlitePool,
}

impl FavoriteStore {
    /// Open (creating if needed) the store at `path`.
    pub async fn open(path: &str) -> AppResult<Self> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;
        let store = Self { pool };
        store.ensure_schema().await?;
        Ok(store)
    }

    /// In-memory store, used by tests and as a session-only fallback when
    /// the durable file cannot be opened.
    pub async fn open_in_memory() -> AppResult<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;
        let store = Self { pool };
        store.ensure_schema().await?;
        Ok(store)
    }

    async fn ensure_schema(&self) -> AppResult<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS favorites (\
                 currency TEXT PRIMARY KEY, \
                 fav INTEGER NOT NULL\
             )",
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Mark or unmark a currency. Favoriting upserts `(currency, 1)`;
    /// un-favoriting removes the row.
    pub async fn set(&self, currency: &str, fav: bool) -> AppResult<()> {
        if fav {
            sqlx::query(
                "INSERT INTO favorites (currency, fav) VALUES (?, 1) \
                 ON CONFLICT(currency) DO UPDATE SET fav = 1",
            )
            .bind(currency)
            .execute(&self.pool)
            .await?;
        } else {
            sqlx::query("DELETE FROM favorites WHERE currency = ?")
                .bind(currency)
                .execute(&self.pool)
                .await?;
        }
        Ok(())
    }

    /// Favorited currencies in the store's iteration (insertion) order.
    pub async fn list(&self) -> AppResult<Vec<String>> {
        let rows: Vec<String> =
            sqlx::query_scalar("SELECT currency FROM favorites WHERE fav = 1 ORDER BY rowid")
                .fetch_all(&self.pool)
                .await?;
        Ok(rows)
    }

    pub async fn is_favorite(&self, currency: &str) -> AppResult<bool> {
        let found: Option<i64> =
            sqlx::query_scalar("SELECT fav FROM favorites WHERE currency = ? AND fav = 1")
                .bind(currency)
                .fetch_optional(&self.pool)
                .await?;
        Ok(found.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn toggle_persists_and_removes_rows() {
        let store = FavoriteStore::open_in_memory().await.unwrap();
        assert!(store.list().await.unwrap().is_empty());
        assert!(!store.is_favorite("EUR").await.unwrap());

        store.set("EUR", true).await.unwrap();
        assert!(store.is_favorite("EUR").await.unwrap());
        assert_eq!(store.list().await.unwrap(), ["EUR"]);

        // Favoriting twice keeps a single row.
        store.set("EUR", true).await.unwrap();
        assert_eq!(store.list().await.unwrap(), ["EUR"]);

        store.set("EUR", false).await.unwrap();
        assert!(!store.is_favorite("EUR").await.unwrap());
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn list_follows_insertion_order() {
        let store = FavoriteStore::open_in_memory().await.unwrap();
        store.set("JPY", true).await.unwrap();
        store.set("EUR", true).await.unwrap();
        store.set("AUD", true).await.unwrap();
        assert_eq!(store.list().await.unwrap(), ["JPY", "EUR", "AUD"]);
    }

    #[tokio::test]
    async fn survives_reopen_of_the_same_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("favorites.db");
        let path = path.to_str().unwrap();

        {
            let store = FavoriteStore::open(path).await.unwrap();
            store.set("EUR", true).await.unwrap();
        }
        let store = FavoriteStore::open(path).await.unwrap();
        assert_eq!(store.list().await.unwrap(), ["EUR"]);
    }
}
