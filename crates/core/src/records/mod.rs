//! Record persistence for the cocktail catalog.
//!
//! Records and boolean preferences are stored as JSON values in the `kv`
//! table. Every operation tolerates storage failure: reads fall back to the
//! bundled catalog (or `false`), writes become logged no-ops.

mod model;

pub use model::{Cocktail, Ingredient, default_catalog};

use crate::{CacheDb, Error};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

const COCKTAILS_KEY: &str = "cocktail-app-cocktails";

/// Preference key for the dark mode toggle.
pub const DARK_MODE_KEY: &str = "cocktail-app-dark-mode";

impl CacheDb {
    /// Read a raw value from the key-value table.
    pub async fn get_value(&self, key: &str) -> Result<Option<String>, Error> {
        let key = key.to_string();
        self.conn
            .call(move |conn| -> Result<Option<String>, Error> {
                let result = conn.query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| row.get(0));
                match result {
                    Ok(value) => Ok(Some(value)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    /// Write a raw value to the key-value table.
    pub async fn set_value(&self, key: &str, value: &str) -> Result<(), Error> {
        let key = key.to_string();
        let value = value.to_string();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3)
                     ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
                    params![key, value, chrono::Utc::now().to_rfc3339()],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Remove a value from the key-value table.
    pub async fn remove_value(&self, key: &str) -> Result<(), Error> {
        let key = key.to_string();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute("DELETE FROM kv WHERE key = ?1", params![key])?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }
}

/// Catalog and preference persistence.
#[derive(Clone, Debug)]
pub struct RecordStore {
    db: CacheDb,
}

impl RecordStore {
    pub fn new(db: CacheDb) -> Self {
        Self { db }
    }

    /// Load all records, in stored order.
    ///
    /// Falls back to the bundled catalog when nothing is stored, the stored
    /// list is empty or malformed, or storage is unavailable.
    pub async fn load_cocktails(&self) -> Vec<Cocktail> {
        match self.db.get_value(COCKTAILS_KEY).await {
            Ok(Some(json)) => match serde_json::from_str::<Vec<Cocktail>>(&json) {
                Ok(cocktails) if !cocktails.is_empty() => return cocktails,
                Ok(_) => tracing::debug!("stored catalog is empty, using defaults"),
                Err(e) => tracing::error!(error = %e, "stored catalog is malformed, using defaults"),
            },
            Ok(None) => {}
            Err(e) => tracing::error!(error = %e, "failed to load cocktails"),
        }
        default_catalog()
    }

    /// Replace the stored record list.
    pub async fn save_cocktails(&self, cocktails: &[Cocktail]) {
        let json = match serde_json::to_string(cocktails) {
            Ok(json) => json,
            Err(e) => {
                tracing::error!(error = %e, "failed to serialize cocktails");
                return;
            }
        };
        if let Err(e) = self.db.set_value(COCKTAILS_KEY, &json).await {
            tracing::error!(error = %e, count = cocktails.len(), "failed to save cocktails");
        }
    }

    /// Load a boolean preference, `false` when unset or unreadable.
    pub async fn load_flag(&self, key: &str) -> bool {
        match self.db.get_value(key).await {
            Ok(Some(value)) => value == "true",
            Ok(None) => false,
            Err(e) => {
                tracing::error!(error = %e, key, "failed to load preference");
                false
            }
        }
    }

    /// Store a boolean preference.
    pub async fn save_flag(&self, key: &str, value: bool) {
        if let Err(e) = self.db.set_value(key, if value { "true" } else { "false" }).await {
            tracing::error!(error = %e, key, "failed to save preference");
        }
    }

    /// Remove stored records and the dark mode preference.
    pub async fn clear(&self) {
        for key in [COCKTAILS_KEY, DARK_MODE_KEY] {
            if let Err(e) = self.db.remove_value(key).await {
                tracing::error!(error = %e, key, "failed to clear stored value");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn store() -> RecordStore {
        RecordStore::new(CacheDb::open_in_memory().await.unwrap())
    }

    #[tokio::test]
    async fn test_load_defaults_when_empty() {
        let records = store().await;
        assert_eq!(records.load_cocktails().await, default_catalog());
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let records = store().await;
        let mut cocktails = default_catalog();
        cocktails.truncate(2);
        cocktails[1].is_favourite = Some(true);
        cocktails[1].rating = Some(4.5);

        records.save_cocktails(&cocktails).await;
        assert_eq!(records.load_cocktails().await, cocktails);
    }

    #[tokio::test]
    async fn test_saved_empty_list_falls_back() {
        let records = store().await;
        records.save_cocktails(&[]).await;
        assert_eq!(records.load_cocktails().await.len(), default_catalog().len());
    }

    #[tokio::test]
    async fn test_malformed_catalog_falls_back() {
        let records = store().await;
        records.db.set_value(COCKTAILS_KEY, "{not json").await.unwrap();
        assert_eq!(records.load_cocktails().await, default_catalog());
    }

    #[tokio::test]
    async fn test_flags() {
        let records = store().await;
        assert!(!records.load_flag(DARK_MODE_KEY).await);
        records.save_flag(DARK_MODE_KEY, true).await;
        assert!(records.load_flag(DARK_MODE_KEY).await);
        records.save_flag(DARK_MODE_KEY, false).await;
        assert!(!records.load_flag(DARK_MODE_KEY).await);
    }

    #[tokio::test]
    async fn test_clear() {
        let records = store().await;
        records.save_cocktails(&default_catalog()[..1]).await;
        records.save_flag(DARK_MODE_KEY, true).await;

        records.clear().await;

        assert_eq!(records.load_cocktails().await.len(), default_catalog().len());
        assert!(!records.load_flag(DARK_MODE_KEY).await);
    }
}
