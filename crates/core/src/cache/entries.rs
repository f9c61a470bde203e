//! Per-store entry operations: get, put, delete and listing.
//!
//! Writes to the same key are last-writer-wins; there is no compare-and-swap.

use bytes::Bytes;
use tokio_rusqlite::{params, rusqlite};
use url::Url;

use super::connection::CacheStorage;
use super::hash::compute_key_hash;
use crate::{Error, RequestKey, Snapshot};

/// Handle to one named store.
#[derive(Clone, Debug)]
pub struct CacheStore {
    storage: CacheStorage,
    name: String,
}

impl CacheStore {
    pub(crate) fn new(storage: CacheStorage, name: String) -> Self {
        Self { storage, name }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Look up the snapshot stored under `key`.
    pub async fn get(&self, key: &RequestKey) -> Result<Option<Snapshot>, Error> {
        let store = self.name.clone();
        let hash = compute_key_hash(key);
        self.storage
            .conn
            .call(move |conn| -> Result<Option<Snapshot>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT status, headers_json, body, fetched_at
                     FROM entries WHERE store_name = ?1 AND key_hash = ?2",
                )?;

                let result = stmt.query_row(params![store, hash], |row| {
                    Ok((
                        row.get::<_, u16>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, Vec<u8>>(2)?,
                        row.get::<_, String>(3)?,
                    ))
                });

                match result {
                    Ok((status, headers_json, body, fetched_at)) => Ok(Some(Snapshot {
                        status,
                        headers: serde_json::from_str(&headers_json)?,
                        body: Bytes::from(body),
                        fetched_at,
                    })),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    /// Whether anything is stored under `key`.
    pub async fn has(&self, key: &RequestKey) -> Result<bool, Error> {
        let store = self.name.clone();
        let hash = compute_key_hash(key);
        self.storage
            .conn
            .call(move |conn| -> Result<bool, Error> {
                let exists: bool = conn.query_row(
                    "SELECT EXISTS(SELECT 1 FROM entries WHERE store_name = ?1 AND key_hash = ?2)",
                    params![store, hash],
                    |row| row.get(0),
                )?;
                Ok(exists)
            })
            .await
            .map_err(Error::from)
    }

    /// Insert or overwrite the snapshot stored under `key`.
    ///
    /// Fails with `STORE_NOT_FOUND` if the store has been deleted and with
    /// `QUOTA_EXCEEDED` if the write would exceed the storage quota.
    pub async fn put(&self, key: &RequestKey, snapshot: &Snapshot) -> Result<(), Error> {
        self.put_all(vec![(key.clone(), snapshot.clone())]).await
    }

    /// Insert every entry in one transaction: either all are written or none.
    pub async fn put_all(&self, entries: Vec<(RequestKey, Snapshot)>) -> Result<(), Error> {
        let store = self.name.clone();
        let quota = self.storage.quota_bytes;
        let count = entries.len();
        self.storage
            .conn
            .call(move |conn| -> Result<(), Error> {
                let tx = conn.transaction()?;
                ensure_store(&tx, &store)?;
                for (key, snapshot) in &entries {
                    upsert_entry(&tx, &store, key, snapshot, quota)?;
                }
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)?;

        tracing::trace!(store = %self.name, count, "stored entries");
        Ok(())
    }

    /// Remove the entry under `key`. Returns false if there was none.
    pub async fn delete(&self, key: &RequestKey) -> Result<bool, Error> {
        let store = self.name.clone();
        let hash = compute_key_hash(key);
        self.storage
            .conn
            .call(move |conn| -> Result<bool, Error> {
                let deleted = conn.execute(
                    "DELETE FROM entries WHERE store_name = ?1 AND key_hash = ?2",
                    params![store, hash],
                )?;
                Ok(deleted > 0)
            })
            .await
            .map_err(Error::from)
    }

    /// Every key held by this store, ordered by URL then method.
    pub async fn keys(&self) -> Result<Vec<RequestKey>, Error> {
        let store = self.name.clone();
        self.storage
            .conn
            .call(move |conn| -> Result<Vec<RequestKey>, Error> {
                let mut stmt =
                    conn.prepare("SELECT method, url FROM entries WHERE store_name = ?1 ORDER BY url, method")?;
                let rows = stmt
                    .query_map(params![store], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?
                    .collect::<Result<Vec<_>, _>>()?;

                rows.into_iter()
                    .map(|(method, url)| -> Result<RequestKey, Error> {
                        let url = Url::parse(&url).map_err(|e| Error::InvalidUrl(format!("{url}: {e}")))?;
                        Ok(RequestKey::new(&method, &url))
                    })
                    .collect()
            })
            .await
            .map_err(Error::from)
    }

    /// Number of entries in this store.
    pub async fn len(&self) -> Result<usize, Error> {
        let store = self.name.clone();
        self.storage
            .conn
            .call(move |conn| -> Result<usize, Error> {
                let count: i64 =
                    conn.query_row("SELECT COUNT(*) FROM entries WHERE store_name = ?1", params![store], |row| {
                        row.get(0)
                    })?;
                Ok(count as usize)
            })
            .await
            .map_err(Error::from)
    }

    pub async fn is_empty(&self) -> Result<bool, Error> {
        Ok(self.len().await? == 0)
    }
}

fn ensure_store(conn: &rusqlite::Connection, store: &str) -> Result<(), Error> {
    let exists: bool =
        conn.query_row("SELECT EXISTS(SELECT 1 FROM stores WHERE name = ?1)", params![store], |row| row.get(0))?;
    if exists { Ok(()) } else { Err(Error::StoreNotFound(store.to_string())) }
}

pub(super) fn upsert_entry(
    conn: &rusqlite::Connection, store: &str, key: &RequestKey, snapshot: &Snapshot, quota: Option<u64>,
) -> Result<(), Error> {
    let hash = compute_key_hash(key);

    if let Some(quota) = quota {
        let others: i64 = conn.query_row(
            "SELECT COALESCE(SUM(LENGTH(body)), 0) FROM entries
             WHERE NOT (store_name = ?1 AND key_hash = ?2)",
            params![store, hash],
            |row| row.get(0),
        )?;
        let needed = others as u64 + snapshot.body.len() as u64;
        if needed > quota {
            return Err(Error::QuotaExceeded { needed, quota });
        }
    }

    conn.execute(
        "INSERT INTO entries (
            store_name, key_hash, method, url, status, headers_json, body, fetched_at, stored_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        ON CONFLICT(store_name, key_hash) DO UPDATE SET
            method = excluded.method,
            url = excluded.url,
            status = excluded.status,
            headers_json = excluded.headers_json,
            body = excluded.body,
            fetched_at = excluded.fetched_at,
            stored_at = excluded.stored_at",
        params![
            store,
            hash,
            key.method(),
            key.url().as_str(),
            snapshot.status,
            serde_json::to_string(&snapshot.headers)?,
            snapshot.body.as_ref(),
            &snapshot.fetched_at,
            chrono::Utc::now().to_rfc3339(),
        ],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(path: &str) -> RequestKey {
        RequestKey::get(&Url::parse("https://example.com").unwrap().join(path).unwrap())
    }

    async fn store() -> CacheStore {
        let storage = CacheStorage::open_in_memory().await.unwrap();
        storage.open_store("brickshot-cache-v1").await.unwrap()
    }

    #[tokio::test]
    async fn test_put_and_get() {
        let store = store().await;
        let snapshot = Snapshot::new(200, vec![("content-type".into(), "image/png".into())], vec![0x89u8, 0x50]);

        store.put(&key("/icon.png"), &snapshot).await.unwrap();

        let retrieved = store.get(&key("/icon.png")).await.unwrap().unwrap();
        assert_eq!(retrieved, snapshot);
        assert!(store.has(&key("/icon.png")).await.unwrap());
    }

    #[tokio::test]
    async fn test_get_missing() {
        let store = store().await;
        assert!(store.get(&key("/nope.js")).await.unwrap().is_none());
        assert!(!store.has(&key("/nope.js")).await.unwrap());
    }

    #[tokio::test]
    async fn test_last_write_wins() {
        let store = store().await;
        store.put(&key("/app.js"), &Snapshot::new(200, vec![], "first")).await.unwrap();
        store.put(&key("/app.js"), &Snapshot::new(200, vec![], "second")).await.unwrap();

        let retrieved = store.get(&key("/app.js")).await.unwrap().unwrap();
        assert_eq!(&retrieved.body[..], b"second");
        assert_eq!(store.len().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_stores_are_isolated() {
        let storage = CacheStorage::open_in_memory().await.unwrap();
        let v0 = storage.open_store("v0").await.unwrap();
        let v1 = storage.open_store("v1").await.unwrap();
        v0.put(&key("/"), &Snapshot::new(200, vec![], "old")).await.unwrap();

        assert!(v1.get(&key("/")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_put_all_is_atomic() {
        let storage = CacheStorage::open_in_memory().await.unwrap().with_quota(Some(8));
        let store = storage.open_store("v1").await.unwrap();

        let result = store
            .put_all(vec![
                (key("/"), Snapshot::new(200, vec![], "12345")),
                (key("/index.html"), Snapshot::new(200, vec![], "67890")),
            ])
            .await;

        assert!(matches!(result, Err(Error::QuotaExceeded { .. })));
        assert!(store.is_empty().await.unwrap());
    }

    #[tokio::test]
    async fn test_quota_counts_overwrite_once() {
        let storage = CacheStorage::open_in_memory().await.unwrap().with_quota(Some(6));
        let store = storage.open_store("v1").await.unwrap();

        store.put(&key("/a"), &Snapshot::new(200, vec![], "12345")).await.unwrap();
        store.put(&key("/a"), &Snapshot::new(200, vec![], "123456")).await.unwrap();

        let result = store.put(&key("/b"), &Snapshot::new(200, vec![], "1")).await;
        assert!(matches!(result, Err(Error::QuotaExceeded { needed: 7, quota: 6 })));
    }

    #[tokio::test]
    async fn test_put_into_deleted_store() {
        let storage = CacheStorage::open_in_memory().await.unwrap();
        let store = storage.open_store("v0").await.unwrap();
        storage.delete_store("v0").await.unwrap();

        let result = store.put(&key("/"), &Snapshot::new(200, vec![], "x")).await;
        assert!(matches!(result, Err(Error::StoreNotFound(name)) if name == "v0"));
    }

    #[tokio::test]
    async fn test_keys_and_delete() {
        let store = store().await;
        store.put(&key("/b.css"), &Snapshot::new(200, vec![], "b")).await.unwrap();
        store.put(&key("/a.js"), &Snapshot::new(200, vec![], "a")).await.unwrap();

        let keys = store.keys().await.unwrap();
        assert_eq!(keys, vec![key("/a.js"), key("/b.css")]);

        assert!(store.delete(&key("/a.js")).await.unwrap());
        assert!(!store.delete(&key("/a.js")).await.unwrap());
        assert_eq!(store.keys().await.unwrap(), vec![key("/b.css")]);
    }
}
