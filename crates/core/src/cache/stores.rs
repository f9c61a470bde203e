//! Named store management: open, enumerate and delete whole stores.

use std::collections::BTreeSet;

use super::connection::CacheStorage;
use super::entries::{CacheStore, upsert_entry};
use crate::{Error, RequestKey, Snapshot};
use tokio_rusqlite::params;

impl CacheStorage {
    /// Open the store called `name`, creating it if absent.
    ///
    /// Idempotent: opening an existing store leaves its entries untouched.
    pub async fn open_store(&self, name: &str) -> Result<CacheStore, Error> {
        if name.is_empty() {
            return Err(Error::InvalidInput("store name must not be empty".to_string()));
        }
        let owned = name.to_string();
        let created = self
            .conn
            .call(move |conn| -> Result<bool, Error> {
                let inserted = conn.execute(
                    "INSERT OR IGNORE INTO stores (name, created_at) VALUES (?1, ?2)",
                    params![owned, chrono::Utc::now().to_rfc3339()],
                )?;
                Ok(inserted > 0)
            })
            .await
            .map_err(Error::from)?;

        if created {
            tracing::debug!(store = name, "created store");
        }
        Ok(CacheStore::new(self.clone(), name.to_string()))
    }

    /// Handle to the store called `name` without creating it.
    ///
    /// Reads from a missing store find nothing; writes fail with `STORE_NOT_FOUND`.
    pub fn store(&self, name: &str) -> CacheStore {
        CacheStore::new(self.clone(), name.to_string())
    }

    /// Create `name` if absent, write `entries` and mark the store installed.
    ///
    /// One transaction: on error nothing is written, not even the store row,
    /// and a store that already existed keeps its previous contents and marker.
    pub async fn install_store(&self, name: &str, entries: Vec<(RequestKey, Snapshot)>) -> Result<CacheStore, Error> {
        if name.is_empty() {
            return Err(Error::InvalidInput("store name must not be empty".to_string()));
        }
        let owned = name.to_string();
        let quota = self.quota_bytes;
        let count = entries.len();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                let now = chrono::Utc::now().to_rfc3339();
                let tx = conn.transaction()?;
                tx.execute(
                    "INSERT OR IGNORE INTO stores (name, created_at) VALUES (?1, ?2)",
                    params![owned, now],
                )?;
                for (key, snapshot) in &entries {
                    upsert_entry(&tx, &owned, key, snapshot, quota)?;
                }
                tx.execute("UPDATE stores SET installed_at = ?2 WHERE name = ?1", params![owned, now])?;
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)?;

        tracing::debug!(store = name, count, "installed store");
        Ok(CacheStore::new(self.clone(), name.to_string()))
    }

    /// Whether `name` exists and has completed an install.
    pub async fn is_installed(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let installed: bool = conn.query_row(
                    "SELECT EXISTS(SELECT 1 FROM stores WHERE name = ?1 AND installed_at IS NOT NULL)",
                    params![name],
                    |row| row.get(0),
                )?;
                Ok(installed)
            })
            .await
            .map_err(Error::from)
    }

    /// Names of every store currently held.
    pub async fn list_store_names(&self) -> Result<BTreeSet<String>, Error> {
        self.conn
            .call(|conn| -> Result<BTreeSet<String>, Error> {
                let mut stmt = conn.prepare("SELECT name FROM stores")?;
                let names = stmt
                    .query_map([], |row| row.get::<_, String>(0))?
                    .collect::<Result<BTreeSet<_>, _>>()?;
                Ok(names)
            })
            .await
            .map_err(Error::from)
    }

    /// Whether a store called `name` exists.
    pub async fn has_store(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let exists: bool = conn.query_row(
                    "SELECT EXISTS(SELECT 1 FROM stores WHERE name = ?1)",
                    params![name],
                    |row| row.get(0),
                )?;
                Ok(exists)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete the store called `name` together with all its entries.
    ///
    /// Returns false if no such store existed.
    pub async fn delete_store(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let tx = conn.transaction()?;
                tx.execute("DELETE FROM entries WHERE store_name = ?1", params![name])?;
                let deleted = tx.execute("DELETE FROM stores WHERE name = ?1", params![name])?;
                tx.commit()?;
                Ok(deleted > 0)
            })
            .await
            .map_err(Error::from)
    }
}

/// Fault injection for store deletion.
#[cfg(any(test, feature = "test-support"))]
impl CacheStorage {
    /// Make every `delete_store(name)` fail until [`Self::allow_store_deletion`].
    pub async fn block_store_deletion(&self, name: &str) -> Result<(), Error> {
        let sql = format!(
            "CREATE TRIGGER IF NOT EXISTS block_store_deletion BEFORE DELETE ON stores
             WHEN OLD.name = '{}'
             BEGIN SELECT RAISE(ABORT, 'store deletion blocked'); END;",
            name.replace('\'', "''")
        );
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute_batch(&sql)?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    pub async fn allow_store_deletion(&self) -> Result<(), Error> {
        self.conn
            .call(|conn| -> Result<(), Error> {
                conn.execute_batch("DROP TRIGGER IF EXISTS block_store_deletion;")?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }
}
