//! Local route store for courier-sync.
//!
//! This module provides `SQLite`-backed persistence for the on-device copy of
//! the courier's route, the queue of confirmations not yet acknowledged by the
//! backend, and the time of the last authoritative fetch.
//!
//! Everything lives in one key-value namespace. Each operation is a single
//! read or write of one key; nothing spans keys, so a crash between saving a
//! status update and saving a queue entry can leave the two out of step.
//! Concurrent read-modify-write cycles are not serialized either: the last
//! write to complete wins.

pub mod migrations;
pub mod schema;

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::route::{DeliveryConfirmation, DeliveryStatus, Route};

/// Default key namespace.
pub const DEFAULT_NAMESPACE: &str = "@courier_app";

const CURRENT_ROUTE_KEY: &str = "current_route";
const PENDING_CONFIRMATIONS_KEY: &str = "pending_confirmations";
const LAST_SYNC_KEY: &str = "last_sync";

/// Persistent store for the current route and the pending confirmation queue.
///
/// The store is the only owner of the on-device route; the sync client and
/// the confirmation workflow borrow it.
#[derive(Debug)]
pub struct RouteStore {
    /// Path to the database file.
    path: PathBuf,
    /// Prefix for every key.
    namespace: String,
    /// Database connection, held for one statement at a time.
    conn: Mutex<Connection>,
}

impl RouteStore {
    /// Open or create a store database at the given path.
    ///
    /// Creates the parent directories and database file if they don't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or schema initialization fails.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        debug!("Opening route store at {}", path.display());
        let conn = Connection::open(&path).map_err(|source| Error::DatabaseOpen {
            path: path.clone(),
            source,
        })?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
        migrations::initialize_schema(&conn)?;

        info!("Route store opened at {}", path.display());
        Ok(Self {
            path,
            namespace: DEFAULT_NAMESPACE.to_string(),
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory store.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| Error::DatabaseOpen {
            path: PathBuf::from(":memory:"),
            source,
        })?;
        migrations::initialize_schema(&conn)?;

        Ok(Self {
            path: PathBuf::from(":memory:"),
            namespace: DEFAULT_NAMESPACE.to_string(),
            conn: Mutex::new(conn),
        })
    }

    /// Use a different key namespace.
    #[must_use]
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Get the path to the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get the key namespace.
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    // === Route ===

    /// Persist the route, replacing whatever was stored before.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the database write fails.
    pub fn save_route(&self, route: &Route) -> Result<()> {
        let json = serde_json::to_string(route)?;
        self.set(CURRENT_ROUTE_KEY, &json)?;
        debug!(route_id = %route.id, points = route.points.len(), "Saved route");
        Ok(())
    }

    /// Load the persisted route.
    ///
    /// Returns `None` if nothing is stored or the stored value cannot be read;
    /// corrupt data counts as absent.
    #[must_use]
    pub fn get_route(&self) -> Option<Route> {
        self.get_json(CURRENT_ROUTE_KEY)
    }

    /// Set the status of one point in the persisted route.
    ///
    /// Loads the route, changes the matching point, and saves the whole route
    /// back. Returns `false` without writing when there is no route or no
    /// point with that identifier.
    ///
    /// # Errors
    ///
    /// Returns an error if saving the updated route fails.
    pub fn update_point_status(&self, point_id: &str, status: DeliveryStatus) -> Result<bool> {
        let Some(mut route) = self.get_route() else {
            debug!(point_id, "No stored route, skipping status update");
            return Ok(false);
        };

        if !route.set_point_status(point_id, status) {
            debug!(point_id, "Point not in stored route, skipping status update");
            return Ok(false);
        }

        self.save_route(&route)?;
        info!(point_id, %status, "Updated point status");
        Ok(true)
    }

    // === Pending confirmations ===

    /// Append a confirmation to the pending queue.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the database write fails.
    pub fn save_pending_confirmation(&self, confirmation: &DeliveryConfirmation) -> Result<()> {
        let mut pending = self.get_pending_confirmations();
        pending.push(confirmation.clone());
        self.set(PENDING_CONFIRMATIONS_KEY, &serde_json::to_string(&pending)?)?;
        info!(
            point_id = %confirmation.point_id,
            queued = pending.len(),
            "Queued confirmation for later sync"
        );
        Ok(())
    }

    /// Load the pending queue in submission order.
    ///
    /// An absent or unreadable queue is empty.
    #[must_use]
    pub fn get_pending_confirmations(&self) -> Vec<DeliveryConfirmation> {
        self.get_json(PENDING_CONFIRMATIONS_KEY).unwrap_or_default()
    }

    /// Reset the pending queue to empty.
    ///
    /// # Errors
    ///
    /// Returns an error if the database write fails.
    pub fn clear_pending_confirmations(&self) -> Result<()> {
        self.set(PENDING_CONFIRMATIONS_KEY, "[]")?;
        debug!("Cleared pending confirmations");
        Ok(())
    }

    // === Last sync ===

    /// Record now as the time of the last successful route fetch.
    ///
    /// The timestamp is for display only, so a failed write is logged and
    /// otherwise ignored.
    pub fn set_last_sync(&self) {
        if let Err(e) = self.set_last_sync_at(Utc::now()) {
            warn!("Failed to record last sync time: {}", e);
        }
    }

    /// Record the given time as the last successful route fetch.
    ///
    /// # Errors
    ///
    /// Returns an error if the database write fails.
    pub fn set_last_sync_at(&self, at: DateTime<Utc>) -> Result<()> {
        self.set(LAST_SYNC_KEY, &at.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    /// Time of the last successful route fetch, if any.
    #[must_use]
    pub fn get_last_sync(&self) -> Option<DateTime<Utc>> {
        let raw = self.get_logged(LAST_SYNC_KEY)?;
        match DateTime::parse_from_rfc3339(&raw) {
            Ok(dt) => Some(dt.with_timezone(&Utc)),
            Err(e) => {
                warn!("Ignoring unreadable last sync time {:?}: {}", raw, e);
                None
            }
        }
    }

    // === Maintenance ===

    /// Remove the route, the pending queue, and the last sync time.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn clear_all(&self) -> Result<()> {
        let removed = self.conn()?.execute(
            "DELETE FROM entries WHERE key IN (?1, ?2, ?3)",
            params![
                self.key(CURRENT_ROUTE_KEY),
                self.key(PENDING_CONFIRMATIONS_KEY),
                self.key(LAST_SYNC_KEY),
            ],
        )?;
        info!("Cleared route store ({} entries removed)", removed);
        Ok(())
    }

    /// Summarize what the store currently holds.
    #[must_use]
    pub fn stats(&self) -> StoreStats {
        let route = self.get_route();
        StoreStats {
            route_id: route.as_ref().map(|r| r.id.clone()),
            point_count: route.as_ref().map_or(0, |r| r.points.len()),
            pending_confirmations: self.get_pending_confirmations().len(),
            last_sync: self.get_last_sync(),
        }
    }

    // === Key-value primitives ===

    fn key(&self, name: &str) -> String {
        format!("{}:{}", self.namespace, name)
    }

    /// Reject every further write on this connection.
    #[cfg(test)]
    pub(crate) fn make_read_only(&self) {
        self.conn()
            .unwrap()
            .execute_batch("PRAGMA query_only = ON;")
            .unwrap();
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| Error::StoreLockPoisoned)
    }

    fn set(&self, name: &str, value: &str) -> Result<()> {
        self.conn()?.execute(
            r"
            INSERT INTO entries (key, value, updated_at)
            VALUES (?1, ?2, strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            ",
            params![self.key(name), value],
        )?;
        Ok(())
    }

    fn get(&self, name: &str) -> Result<Option<String>> {
        let value = self
            .conn()?
            .query_row(
                "SELECT value FROM entries WHERE key = ?1",
                [self.key(name)],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    /// Read a raw value, treating read failures as absence.
    fn get_logged(&self, name: &str) -> Option<String> {
        self.get(name).unwrap_or_else(|e| {
            warn!("Failed to read {}: {}", self.key(name), e);
            None
        })
    }

    /// Read and decode a JSON value, treating corrupt data as absence.
    fn get_json<T: DeserializeOwned>(&self, name: &str) -> Option<T> {
        let raw = self.get_logged(name)?;
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Ignoring corrupt value under {}: {}", self.key(name), e);
                None
            }
        }
    }
}

/// Summary of the store contents.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct StoreStats {
    /// Identifier of the stored route, if any.
    pub route_id: Option<String>,
    /// Number of points in the stored route.
    pub point_count: usize,
    /// Confirmations waiting to be sent.
    pub pending_confirmations: usize,
    /// Last successful route fetch.
    pub last_sync: Option<DateTime<Utc>>,
}
