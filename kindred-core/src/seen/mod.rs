//! Persistence of "already shown" bookkeeping.
//!
//! A [`SeenRecord`] is created the first time a candidate is displayed to an
//! identity within a destination and updated on every later display. The
//! suppression key is `(identity, destination)` only: a place seen in a city
//! stays deprioritised there however the user searches next.
//!
//! Updates are idempotent merges: the view count increments, `last_seen`
//! takes the later timestamp and `first_seen` the earlier, so concurrent or
//! reordered writes converge.

use std::collections::HashSet;
use std::time::SystemTime;

use thiserror::Error;

mod memory;
#[cfg(feature = "store-sqlite")]
mod sqlite;

pub use memory::MemorySeenStore;
#[cfg(feature = "store-sqlite")]
pub use sqlite::{SqliteSeenStore, SqliteSeenStoreError};

/// One candidate shown to one identity within one destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeenRecord {
    /// User id or anonymised network identity.
    pub identity: String,
    /// Candidate place identifier.
    pub candidate_id: String,
    /// Destination key.
    pub destination: String,
    /// First display.
    pub first_seen: SystemTime,
    /// Most recent display.
    pub last_seen: SystemTime,
    /// Number of displays.
    pub view_count: u32,
    /// Set when the user saved the candidate. Never reverts on its own.
    pub is_saved: bool,
}

impl SeenRecord {
    /// Fold another view at `at` into this record.
    pub fn observe(&mut self, at: SystemTime) {
        self.view_count = self.view_count.saturating_add(1);
        self.first_seen = self.first_seen.min(at);
        self.last_seen = self.last_seen.max(at);
    }
}

/// Errors raised by [`SeenStore`] implementations.
#[derive(Debug, Error)]
pub enum SeenStoreError {
    /// The backing store failed.
    #[error("seen store failed to {operation}")]
    Backend {
        /// Description of the failed operation.
        operation: &'static str,
        /// Backend error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// A stored timestamp could not be represented.
    #[error("seen store timestamp {raw} is out of range")]
    TimestampOutOfRange {
        /// Raw stored value.
        raw: i64,
    },
}

/// Key-value persistence for seen records.
///
/// Implementations must be thread-safe: views are recorded from background
/// tasks while searches read.
pub trait SeenStore: Send + Sync {
    /// Upsert a view of `candidate_id` at `at`.
    fn record_view(
        &self,
        identity: &str,
        destination: &str,
        candidate_id: &str,
        at: SystemTime,
    ) -> Result<(), SeenStoreError>;

    /// Ids shown to `identity` in `destination` and not saved.
    fn unsaved_seen_ids(
        &self,
        identity: &str,
        destination: &str,
    ) -> Result<HashSet<String>, SeenStoreError>;

    /// Mark a candidate saved or unsaved, creating the record if needed.
    fn set_saved(
        &self,
        identity: &str,
        destination: &str,
        candidate_id: &str,
        saved: bool,
        at: SystemTime,
    ) -> Result<(), SeenStoreError>;

    /// Fetch a single record.
    fn record(
        &self,
        identity: &str,
        destination: &str,
        candidate_id: &str,
    ) -> Result<Option<SeenRecord>, SeenStoreError>;
}
