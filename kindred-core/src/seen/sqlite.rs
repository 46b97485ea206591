//! SQLite-backed seen store.

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use log::debug;
use rusqlite::{Connection, OptionalExtension, params};
use thiserror::Error;

use super::{SeenRecord, SeenStore, SeenStoreError};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS seen_candidates (
    identity     TEXT    NOT NULL,
    destination  TEXT    NOT NULL,
    candidate_id TEXT    NOT NULL,
    first_seen   INTEGER NOT NULL,
    last_seen    INTEGER NOT NULL,
    view_count   INTEGER NOT NULL DEFAULT 0,
    is_saved     INTEGER NOT NULL DEFAULT 0,
    PRIMARY KEY (identity, destination, candidate_id)
);
CREATE INDEX IF NOT EXISTS seen_candidates_by_scope
    ON seen_candidates (identity, destination, is_saved);
";

const RECORD_VIEW: &str = "
INSERT INTO seen_candidates
    (identity, destination, candidate_id, first_seen, last_seen, view_count, is_saved)
VALUES (?1, ?2, ?3, ?4, ?4, 1, 0)
ON CONFLICT (identity, destination, candidate_id) DO UPDATE SET
    view_count = view_count + 1,
    first_seen = MIN(first_seen, excluded.first_seen),
    last_seen  = MAX(last_seen, excluded.last_seen)
";

const SET_SAVED: &str = "
INSERT INTO seen_candidates
    (identity, destination, candidate_id, first_seen, last_seen, view_count, is_saved)
VALUES (?1, ?2, ?3, ?4, ?4, 0, ?5)
ON CONFLICT (identity, destination, candidate_id) DO UPDATE SET
    is_saved = excluded.is_saved
";

/// Errors raised while opening a [`SqliteSeenStore`].
#[derive(Debug, Error)]
pub enum SqliteSeenStoreError {
    /// Opening the SQLite database failed.
    #[error("failed to open SQLite database at {path}: {source}")]
    Open {
        /// Location of the database on disk.
        path: PathBuf,
        /// Source error returned by `rusqlite`.
        #[source]
        source: rusqlite::Error,
    },
    /// Creating the schema failed.
    #[error("failed to initialise seen-candidate schema: {source}")]
    Schema {
        /// Source error returned by `rusqlite`.
        #[source]
        source: rusqlite::Error,
    },
}

/// Durable [`SeenStore`] persisted to a single SQLite table.
///
/// Timestamps are stored as milliseconds since the Unix epoch.
pub struct SqliteSeenStore {
    connection: Mutex<Connection>,
}

impl fmt::Debug for SqliteSeenStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteSeenStore").finish_non_exhaustive()
    }
}

impl SqliteSeenStore {
    /// Open or create a store at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SqliteSeenStoreError> {
        let path = path.as_ref();
        let connection = Connection::open(path).map_err(|source| SqliteSeenStoreError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        debug!("opened seen store at {}", path.display());
        Self::from_connection(connection)
    }

    /// Open a throwaway in-memory store.
    pub fn open_in_memory() -> Result<Self, SqliteSeenStoreError> {
        let connection =
            Connection::open_in_memory().map_err(|source| SqliteSeenStoreError::Open {
                path: PathBuf::from(":memory:"),
                source,
            })?;
        Self::from_connection(connection)
    }

    fn from_connection(connection: Connection) -> Result<Self, SqliteSeenStoreError> {
        connection
            .execute_batch(SCHEMA)
            .map_err(|source| SqliteSeenStoreError::Schema { source })?;
        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.connection
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

fn backend(operation: &'static str) -> impl FnOnce(rusqlite::Error) -> SeenStoreError {
    move |source| SeenStoreError::Backend {
        operation,
        source: Box::new(source),
    }
}

fn to_millis(at: SystemTime) -> i64 {
    let millis = at
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_millis();
    i64::try_from(millis).unwrap_or(i64::MAX)
}

fn from_millis(raw: i64) -> Result<SystemTime, SeenStoreError> {
    let millis = u64::try_from(raw).map_err(|_| SeenStoreError::TimestampOutOfRange { raw })?;
    UNIX_EPOCH
        .checked_add(Duration::from_millis(millis))
        .ok_or(SeenStoreError::TimestampOutOfRange { raw })
}

impl SeenStore for SqliteSeenStore {
    fn record_view(
        &self,
        identity: &str,
        destination: &str,
        candidate_id: &str,
        at: SystemTime,
    ) -> Result<(), SeenStoreError> {
        self.lock()
            .execute(
                RECORD_VIEW,
                params![identity, destination, candidate_id, to_millis(at)],
            )
            .map_err(backend("record a view"))?;
        Ok(())
    }

    fn unsaved_seen_ids(
        &self,
        identity: &str,
        destination: &str,
    ) -> Result<HashSet<String>, SeenStoreError> {
        let connection = self.lock();
        let mut statement = connection
            .prepare_cached(
                "SELECT candidate_id FROM seen_candidates \
                 WHERE identity = ?1 AND destination = ?2 AND is_saved = 0 AND view_count > 0",
            )
            .map_err(backend("prepare seen lookup"))?;
        let rows = statement
            .query_map(params![identity, destination], |row| row.get::<_, String>(0))
            .map_err(backend("query seen candidates"))?;
        rows.collect::<Result<HashSet<_>, _>>()
            .map_err(backend("read seen candidates"))
    }

    fn set_saved(
        &self,
        identity: &str,
        destination: &str,
        candidate_id: &str,
        saved: bool,
        at: SystemTime,
    ) -> Result<(), SeenStoreError> {
        self.lock()
            .execute(
                SET_SAVED,
                params![identity, destination, candidate_id, to_millis(at), saved],
            )
            .map_err(backend("update the saved flag"))?;
        Ok(())
    }

    fn record(
        &self,
        identity: &str,
        destination: &str,
        candidate_id: &str,
    ) -> Result<Option<SeenRecord>, SeenStoreError> {
        let row = self
            .lock()
            .query_row(
                "SELECT first_seen, last_seen, view_count, is_saved FROM seen_candidates \
                 WHERE identity = ?1 AND destination = ?2 AND candidate_id = ?3",
                params![identity, destination, candidate_id],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, i64>(1)?,
                        row.get::<_, u32>(2)?,
                        row.get::<_, bool>(3)?,
                    ))
                },
            )
            .optional()
            .map_err(backend("read a seen record"))?;

        row.map(|(first, last, view_count, is_saved)| {
            Ok(SeenRecord {
                identity: identity.to_owned(),
                candidate_id: candidate_id.to_owned(),
                destination: destination.to_owned(),
                first_seen: from_millis(first)?,
                last_seen: from_millis(last)?,
                view_count,
                is_saved,
            })
        })
        .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use tempfile::TempDir;

    fn at(secs: u64) -> SystemTime {
        UNIX_EPOCH + Duration::from_secs(secs)
    }

    #[rstest]
    fn views_persist_across_reopen() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("seen.db");
        {
            let store = SqliteSeenStore::open(&path).expect("open store");
            store.record_view("u", "lisbon", "p1", at(10)).expect("record");
            store.record_view("u", "lisbon", "p1", at(5)).expect("record");
        }
        let store = SqliteSeenStore::open(&path).expect("reopen store");
        let record = store
            .record("u", "lisbon", "p1")
            .expect("read")
            .expect("record present");
        assert_eq!(record.view_count, 2);
        assert_eq!(record.first_seen, at(5));
        assert_eq!(record.last_seen, at(10));
        assert!(!record.is_saved);
    }

    #[rstest]
    fn saving_hides_candidate_from_seen_ids() {
        let store = SqliteSeenStore::open_in_memory().expect("open store");
        store.record_view("u", "d", "p1", at(1)).expect("record");
        store.record_view("u", "d", "p2", at(1)).expect("record");
        store.set_saved("u", "d", "p1", true, at(2)).expect("save");
        store.record_view("u", "d", "p1", at(3)).expect("record");

        let seen = store.unsaved_seen_ids("u", "d").expect("read");
        assert_eq!(seen, HashSet::from(["p2".to_owned()]));
        let saved = store.record("u", "d", "p1").expect("read").expect("present");
        assert!(saved.is_saved);
        assert_eq!(saved.view_count, 2);
    }

    #[rstest]
    fn missing_record_is_none() {
        let store = SqliteSeenStore::open_in_memory().expect("open store");
        assert!(store.record("u", "d", "nope").expect("read").is_none());
    }

    #[rstest]
    fn open_reports_unwritable_path() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("missing").join("seen.db");
        let err = SqliteSeenStore::open(&path).expect_err("parent directory is absent");
        assert!(matches!(err, SqliteSeenStoreError::Open { .. }));
    }
}
