//! [`SearchStateCache`] persisted to a JSON file, so `kindred more` can
//! continue a search made by an earlier invocation.

use std::collections::BTreeMap;
use std::io::{self, Read};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, SystemTime};

use camino::Utf8PathBuf;
use kindred_core::{CachedSearch, Clock, SearchStateCache, SearchStateKey};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::CliError;
use crate::fs::{open_dir_and_file, open_utf8_file};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredSearch {
    stored_at: SystemTime,
    search: CachedSearch,
}

/// File-backed search state with the same TTL semantics as the in-memory
/// cache. Expired entries are dropped when the file is opened.
pub struct FileSearchStateCache {
    path: Utf8PathBuf,
    ttl: Duration,
    clock: Arc<dyn Clock>,
    entries: Mutex<BTreeMap<String, StoredSearch>>,
}

impl std::fmt::Debug for FileSearchStateCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileSearchStateCache")
            .field("path", &self.path)
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl FileSearchStateCache {
    /// Lifetime of a stored search.
    pub const DEFAULT_TTL: Duration = Duration::from_secs(30 * 60);

    /// Open the state file at `path`; a missing file starts empty.
    ///
    /// # Errors
    /// Returns [`CliError::ReadStateFile`] or [`CliError::ParseStateFile`]
    /// when an existing file cannot be read or decoded.
    pub fn open(
        path: Utf8PathBuf,
        ttl: Duration,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, CliError> {
        let raw = match open_utf8_file(&path) {
            Ok(mut file) => {
                let mut contents = String::new();
                file.read_to_string(&mut contents)
                    .map_err(|source| CliError::ReadStateFile {
                        path: path.clone(),
                        source,
                    })?;
                contents
            }
            Err(source) if source.kind() == io::ErrorKind::NotFound => String::new(),
            Err(source) => return Err(CliError::ReadStateFile { path, source }),
        };
        let stored: BTreeMap<String, StoredSearch> = if raw.trim().is_empty() {
            BTreeMap::new()
        } else {
            serde_json::from_str(&raw).map_err(|source| CliError::ParseStateFile {
                path: path.clone(),
                source,
            })?
        };

        let now = clock.now();
        let total = stored.len();
        let entries: BTreeMap<String, StoredSearch> = stored
            .into_iter()
            .filter(|(_, entry)| !expired(entry.stored_at, now, ttl))
            .collect();
        if entries.len() < total {
            debug!("dropped {} expired searches from {path}", total - entries.len());
        }
        Ok(Self {
            path,
            ttl,
            clock,
            entries: Mutex::new(entries),
        })
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, StoredSearch>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn persist(&self, entries: &BTreeMap<String, StoredSearch>) -> io::Result<()> {
        let payload = serde_json::to_vec_pretty(entries).map_err(io::Error::other)?;
        let (dir, name) = open_dir_and_file(&self.path)?;
        dir.write(name.as_str(), payload)
    }
}

fn expired(stored_at: SystemTime, now: SystemTime, ttl: Duration) -> bool {
    now.duration_since(stored_at).is_ok_and(|age| age > ttl)
}

impl SearchStateCache for FileSearchStateCache {
    fn load(&self, key: &SearchStateKey) -> Option<CachedSearch> {
        let now = self.clock.now();
        self.lock()
            .get(key.as_str())
            .filter(|entry| !expired(entry.stored_at, now, self.ttl))
            .map(|entry| entry.search.clone())
    }

    fn store(&self, key: SearchStateKey, search: CachedSearch) {
        let mut entries = self.lock();
        entries.insert(
            key.as_str().to_owned(),
            StoredSearch {
                stored_at: self.clock.now(),
                search,
            },
        );
        if let Err(error) = self.persist(&entries) {
            warn!("failed to write search state to {}: {error}", self.path);
        }
    }
}
