//! Bucket operations on the SQLite store.

use super::connection::CacheDb;
use crate::Error;
use tokio_rusqlite::params;

impl CacheDb {
    /// Create a bucket if it does not exist yet.
    ///
    /// Returns true when the bucket was newly created.
    pub async fn open_bucket(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let inserted = conn.execute(
                    "INSERT OR IGNORE INTO buckets (name, created_at) VALUES (?1, ?2)",
                    params![name, chrono::Utc::now().to_rfc3339()],
                )?;
                Ok(inserted > 0)
            })
            .await
            .map_err(Error::from)
    }

    /// Check whether a bucket exists.
    pub async fn has_bucket(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let exists: bool = conn.query_row(
                    "SELECT EXISTS(SELECT 1 FROM buckets WHERE name = ?1)",
                    params![name],
                    |row| row.get(0),
                )?;
                Ok(exists)
            })
            .await
            .map_err(Error::from)
    }

    /// All bucket names in creation order.
    pub async fn bucket_names(&self) -> Result<Vec<String>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT name FROM buckets ORDER BY rowid ASC")?;
                let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

                let mut names = Vec::new();
                for row in rows {
                    names.push(row?);
                }
                Ok(names)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete a bucket and every entry in it.
    ///
    /// Returns false when the bucket did not exist.
    pub async fn delete_bucket(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let deleted = conn.execute("DELETE FROM buckets WHERE name = ?1", params![name])?;
                Ok(deleted > 0)
            })
            .await
            .map_err(Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::snapshots::tests::make_test_snapshot;

    #[tokio::test]
    async fn test_open_bucket_idempotent() {
        let db = CacheDb::open_in_memory().await.unwrap();
        assert!(db.open_bucket("cocktail-app-static-v1").await.unwrap());
        assert!(!db.open_bucket("cocktail-app-static-v1").await.unwrap());
        assert_eq!(db.bucket_names().await.unwrap(), vec!["cocktail-app-static-v1"]);
    }

    #[tokio::test]
    async fn test_bucket_names_in_creation_order() {
        let db = CacheDb::open_in_memory().await.unwrap();
        for name in ["app-static-v1", "app-images-v1", "app-fonts-v1"] {
            db.open_bucket(name).await.unwrap();
        }
        assert_eq!(db.bucket_names().await.unwrap(), vec!["app-static-v1", "app-images-v1", "app-fonts-v1"]);
    }

    #[tokio::test]
    async fn test_delete_bucket_cascades_entries() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let snapshot = make_test_snapshot("app-static-v1", "https://example.com/app.css", "body{}");
        db.put_snapshot(&snapshot).await.unwrap();
        assert!(db.has_bucket("app-static-v1").await.unwrap());

        assert!(db.delete_bucket("app-static-v1").await.unwrap());
        assert!(!db.has_bucket("app-static-v1").await.unwrap());
        assert!(db.list_entries("app-static-v1").await.unwrap().is_empty());

        db.open_bucket("app-static-v1").await.unwrap();
        assert!(db.get_snapshot("app-static-v1", &snapshot.key).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_missing_bucket() {
        let db = CacheDb::open_in_memory().await.unwrap();
        assert!(!db.delete_bucket("nope").await.unwrap());
    }
}
