//! Response snapshot storage.
//!
//! A snapshot is the captured status, headers and body of a successful
//! response, stored under its request identity inside one bucket.

use super::connection::CacheDb;
use super::hash::compute_cache_key;
use crate::Error;
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

/// An immutable captured copy of a response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub bucket: String,
    /// Request identity key, see [`compute_cache_key`].
    pub key: String,
    pub method: String,
    pub url: String,
    pub status_code: u16,
    pub content_type: Option<String>,
    /// Response headers as a JSON array of `[name, value]` pairs.
    pub headers_json: String,
    pub body: Vec<u8>,
    pub fetched_at: String,
}

impl Snapshot {
    /// Build a snapshot stamped with the current time.
    pub fn capture(
        bucket: &str, method: &str, url: &str, status_code: u16, headers: &[(String, String)], body: Vec<u8>,
    ) -> Result<Self, Error> {
        let content_type = headers
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case("content-type"))
            .map(|(_, value)| value.clone());

        Ok(Self {
            bucket: bucket.to_string(),
            key: compute_cache_key(method, url),
            method: method.to_ascii_uppercase(),
            url: url.to_string(),
            status_code,
            content_type,
            headers_json: serde_json::to_string(headers)?,
            body,
            fetched_at: chrono::Utc::now().to_rfc3339(),
        })
    }

    /// Decode the stored header pairs.
    pub fn headers(&self) -> Result<Vec<(String, String)>, Error> {
        Ok(serde_json::from_str(&self.headers_json)?)
    }

    /// Summary without the body, for listings.
    pub fn meta(&self) -> EntryMeta {
        EntryMeta {
            key: self.key.clone(),
            method: self.method.clone(),
            url: self.url.clone(),
            status_code: self.status_code,
            content_type: self.content_type.clone(),
            size: self.body.len() as u64,
            fetched_at: self.fetched_at.clone(),
        }
    }
}

/// Bucket entry summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct EntryMeta {
    pub key: String,
    pub method: String,
    pub url: String,
    pub status_code: u16,
    pub content_type: Option<String>,
    pub size: u64,
    pub fetched_at: String,
}

const UPSERT_ENTRY: &str = "INSERT INTO entries (
    bucket, key, method, url, status_code, content_type, headers_json, body, fetched_at
) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
ON CONFLICT(bucket, key) DO UPDATE SET
    method = excluded.method,
    url = excluded.url,
    status_code = excluded.status_code,
    content_type = excluded.content_type,
    headers_json = excluded.headers_json,
    body = excluded.body,
    fetched_at = excluded.fetched_at";

fn upsert_entry(tx: &rusqlite::Transaction<'_>, snapshot: &Snapshot) -> Result<(), Error> {
    tx.execute(
        UPSERT_ENTRY,
        params![
            &snapshot.bucket,
            &snapshot.key,
            &snapshot.method,
            &snapshot.url,
            snapshot.status_code,
            &snapshot.content_type,
            &snapshot.headers_json,
            &snapshot.body,
            &snapshot.fetched_at,
        ],
    )?;
    Ok(())
}

impl CacheDb {
    /// Insert or replace a snapshot, creating its bucket when missing.
    pub async fn put_snapshot(&self, snapshot: &Snapshot) -> Result<(), Error> {
        let snapshot = snapshot.clone();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                let tx = conn.transaction()?;
                tx.execute(
                    "INSERT OR IGNORE INTO buckets (name, created_at) VALUES (?1, ?2)",
                    params![&snapshot.bucket, chrono::Utc::now().to_rfc3339()],
                )?;
                upsert_entry(&tx, &snapshot)?;
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Insert or replace a snapshot only while its bucket exists.
    ///
    /// Returns false, writing nothing, when the bucket is gone.
    pub async fn replace_snapshot(&self, snapshot: &Snapshot) -> Result<bool, Error> {
        let snapshot = snapshot.clone();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let tx = conn.transaction()?;
                let exists: bool = tx.query_row(
                    "SELECT EXISTS(SELECT 1 FROM buckets WHERE name = ?1)",
                    params![&snapshot.bucket],
                    |row| row.get(0),
                )?;
                if !exists {
                    return Ok(false);
                }
                upsert_entry(&tx, &snapshot)?;
                tx.commit()?;
                Ok(true)
            })
            .await
            .map_err(Error::from)
    }

    /// Get a snapshot by bucket and request key.
    ///
    /// Returns None if either the bucket or the entry is absent.
    pub async fn get_snapshot(&self, bucket: &str, key: &str) -> Result<Option<Snapshot>, Error> {
        let bucket = bucket.to_string();
        let key = key.to_string();
        self.conn
            .call(move |conn| -> Result<Option<Snapshot>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT bucket, key, method, url, status_code, content_type, headers_json, body, fetched_at
                FROM entries WHERE bucket = ?1 AND key = ?2",
                )?;

                let result = stmt.query_row(params![bucket, key], |row| {
                    Ok(Snapshot {
                        bucket: row.get(0)?,
                        key: row.get(1)?,
                        method: row.get(2)?,
                        url: row.get(3)?,
                        status_code: row.get(4)?,
                        content_type: row.get(5)?,
                        headers_json: row.get(6)?,
                        body: row.get(7)?,
                        fetched_at: row.get(8)?,
                    })
                });

                match result {
                    Ok(s) => Ok(Some(s)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    /// List entry summaries of one bucket, oldest first.
    pub async fn list_entries(&self, bucket: &str) -> Result<Vec<EntryMeta>, Error> {
        let bucket = bucket.to_string();
        self.conn
            .call(move |conn| -> Result<Vec<EntryMeta>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT key, method, url, status_code, content_type, LENGTH(body), fetched_at
                FROM entries WHERE bucket = ?1 ORDER BY fetched_at ASC, url ASC",
                )?;

                let rows = stmt.query_map(params![bucket], |row| {
                    Ok(EntryMeta {
                        key: row.get(0)?,
                        method: row.get(1)?,
                        url: row.get(2)?,
                        status_code: row.get(3)?,
                        content_type: row.get(4)?,
                        size: row.get::<_, i64>(5)? as u64,
                        fetched_at: row.get(6)?,
                    })
                })?;

                let mut entries = Vec::new();
                for row in rows {
                    entries.push(row?);
                }
                Ok(entries)
            })
            .await
            .map_err(Error::from)
    }
}
