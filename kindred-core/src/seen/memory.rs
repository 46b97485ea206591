use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::SystemTime;

use super::{SeenRecord, SeenStore, SeenStoreError};

type RecordKey = (String, String, String);

/// In-process [`SeenStore`].
///
/// # Examples
/// ```
/// use std::time::SystemTime;
/// use kindred_core::{MemorySeenStore, SeenStore};
///
/// let store = MemorySeenStore::default();
/// store.record_view("u1", "lisbon", "p1", SystemTime::UNIX_EPOCH)?;
/// let seen = store.unsaved_seen_ids("u1", "lisbon")?;
/// assert!(seen.contains("p1"));
/// # Ok::<(), kindred_core::SeenStoreError>(())
/// ```
#[derive(Debug, Default)]
pub struct MemorySeenStore {
    records: Mutex<HashMap<RecordKey, SeenRecord>>,
}

impl MemorySeenStore {
    fn lock(&self) -> MutexGuard<'_, HashMap<RecordKey, SeenRecord>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn key(identity: &str, destination: &str, candidate_id: &str) -> RecordKey {
        (
            identity.to_owned(),
            destination.to_owned(),
            candidate_id.to_owned(),
        )
    }

    fn fresh(identity: &str, destination: &str, candidate_id: &str, at: SystemTime) -> SeenRecord {
        SeenRecord {
            identity: identity.to_owned(),
            candidate_id: candidate_id.to_owned(),
            destination: destination.to_owned(),
            first_seen: at,
            last_seen: at,
            view_count: 0,
            is_saved: false,
        }
    }
}

impl SeenStore for MemorySeenStore {
    fn record_view(
        &self,
        identity: &str,
        destination: &str,
        candidate_id: &str,
        at: SystemTime,
    ) -> Result<(), SeenStoreError> {
        self.lock()
            .entry(Self::key(identity, destination, candidate_id))
            .or_insert_with(|| Self::fresh(identity, destination, candidate_id, at))
            .observe(at);
        Ok(())
    }

    fn unsaved_seen_ids(
        &self,
        identity: &str,
        destination: &str,
    ) -> Result<HashSet<String>, SeenStoreError> {
        Ok(self
            .lock()
            .values()
            .filter(|r| r.identity == identity && r.destination == destination && !r.is_saved)
            .filter(|r| r.view_count > 0)
            .map(|r| r.candidate_id.clone())
            .collect())
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
            .entry(Self::key(identity, destination, candidate_id))
            .or_insert_with(|| Self::fresh(identity, destination, candidate_id, at))
            .is_saved = saved;
        Ok(())
    }

    fn record(
        &self,
        identity: &str,
        destination: &str,
        candidate_id: &str,
    ) -> Result<Option<SeenRecord>, SeenStoreError> {
        Ok(self
            .lock()
            .get(&Self::key(identity, destination, candidate_id))
            .cloned())
    }
}
