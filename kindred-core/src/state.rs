//! Cached search state for "show me more" requests.
//!
//! A ranked set is stored under a [`SearchStateKey`] derived from the
//! identity, the sorted reference ids, the destination, the sorted active
//! preference ids and the free text. Later requests page through the undisplayed remainder without
//! re-querying the provider.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::cache::TtlCache;
use crate::clock::{Clock, SystemClock};
use crate::{Place, ScoredCandidate, SearchRequest};

const FIELD_SEPARATOR: char = '|';
const LIST_SEPARATOR: char = ',';
const ESCAPE: char = '\\';

/// Order-insensitive key for a search's cached state.
///
/// # Examples
/// ```
/// use kindred_core::SearchStateKey;
///
/// let a = SearchStateKey::new("ana", ["r2", "r1"], "lisbon", ["quiet", "brunch"], None);
/// let b = SearchStateKey::new("ana", ["r1", "r2"], "lisbon", ["brunch", "quiet"], None);
/// assert_eq!(a, b);
/// let other = SearchStateKey::new("ben", ["r1", "r2"], "lisbon", ["brunch", "quiet"], None);
/// assert_ne!(a, other);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct SearchStateKey(String);

impl SearchStateKey {
    /// Derive a key; reference and preference ids are sorted and
    /// de-duplicated first. Separators inside components are escaped.
    pub fn new<R, P>(
        identity: &str,
        reference_ids: R,
        destination: &str,
        active_preferences: P,
        free_text: Option<&str>,
    ) -> Self
    where
        R: IntoIterator,
        R::Item: AsRef<str>,
        P: IntoIterator,
        P::Item: AsRef<str>,
    {
        let refs = sorted_list(reference_ids);
        let prefs = sorted_list(active_preferences);
        let fields = [
            escape(identity),
            refs,
            escape(destination),
            prefs,
            escape(free_text.map(str::trim).unwrap_or_default()),
        ];
        Self(fields.join(&FIELD_SEPARATOR.to_string()))
    }

    /// Derive the key for a request.
    pub fn for_request(request: &SearchRequest) -> Self {
        Self::new(
            &request.identity,
            request.references.iter().map(|place| place.id.as_str()),
            &request.destination.key,
            request.toggles.enabled(),
            request.free_text(),
        )
    }

    /// Wrap a key previously rendered with [`Self::as_str`].
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Canonical rendering.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn sorted_list<I>(items: I) -> String
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let mut items: Vec<String> = items
        .into_iter()
        .map(|item| escape(item.as_ref()))
        .collect();
    items.sort_unstable();
    items.dedup();
    items.join(&LIST_SEPARATOR.to_string())
}

fn escape(component: &str) -> String {
    let mut escaped = String::with_capacity(component.len());
    for ch in component.chars() {
        if matches!(ch, FIELD_SEPARATOR | LIST_SEPARATOR | ESCAPE) {
            escaped.push(ESCAPE);
        }
        escaped.push(ch);
    }
    escaped
}

impl fmt::Display for SearchStateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A ranked result set plus displayed-id bookkeeping.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CachedSearch {
    /// Identity the results were ranked for.
    pub identity: String,
    /// Destination key.
    pub destination: String,
    /// Source place the set was ranked against, for explanations.
    pub source: Option<Place>,
    /// Full ranked set.
    pub all: Vec<ScoredCandidate>,
    /// Ids already shown, in display order.
    pub displayed_ids: Vec<String>,
    /// Provider token for the next page.
    pub continuation_token: Option<String>,
}

impl CachedSearch {
    /// Take up to `limit` undisplayed entries in rank order and mark them
    /// displayed.
    pub fn take_next(&mut self, limit: usize) -> Vec<ScoredCandidate> {
        let shown: HashSet<&str> = self.displayed_ids.iter().map(String::as_str).collect();
        let batch: Vec<ScoredCandidate> = self
            .all
            .iter()
            .filter(|candidate| !shown.contains(candidate.id()))
            .take(limit)
            .cloned()
            .collect();
        self.displayed_ids
            .extend(batch.iter().map(|candidate| candidate.id().to_owned()));
        batch
    }

    /// Whether any ranked entry has not been shown.
    pub fn has_undisplayed(&self) -> bool {
        let shown: HashSet<&str> = self.displayed_ids.iter().map(String::as_str).collect();
        self.all.iter().any(|candidate| !shown.contains(candidate.id()))
    }
}

/// A batch served from cache with the context needed to explain it and
/// record views.
#[derive(Debug, Clone, PartialEq)]
pub struct ServedBatch {
    /// Identity the batch was ranked for.
    pub identity: String,
    /// Destination key.
    pub destination: String,
    /// Source place the batch was ranked against.
    pub source: Option<Place>,
    /// Candidates newly marked displayed.
    pub candidates: Vec<ScoredCandidate>,
}

/// Storage for cached search state.
pub trait SearchStateCache: Send + Sync {
    /// Fetch the state for `key`.
    fn load(&self, key: &SearchStateKey) -> Option<CachedSearch>;

    /// Store or replace the state for `key`.
    fn store(&self, key: SearchStateKey, search: CachedSearch);

    /// Take the next undisplayed batch for `key`.
    ///
    /// Returns `None` when the key is unknown or no undisplayed entries
    /// remain.
    fn next_batch(&self, key: &SearchStateKey, limit: usize) -> Option<ServedBatch> {
        let mut search = self.load(key)?;
        let candidates = search.take_next(limit);
        if candidates.is_empty() {
            return None;
        }
        let batch = ServedBatch {
            identity: search.identity.clone(),
            destination: search.destination.clone(),
            source: search.source.clone(),
            candidates,
        };
        self.store(key.clone(), search);
        Some(batch)
    }
}

/// [`SearchStateCache`] held in a [`TtlCache`].
#[derive(Debug)]
pub struct MemorySearchStateCache {
    entries: TtlCache<SearchStateKey, CachedSearch>,
}

impl MemorySearchStateCache {
    /// Default number of cached searches.
    pub const DEFAULT_CAPACITY: usize = 256;
    /// Default lifetime of a cached search.
    pub const DEFAULT_TTL: Duration = Duration::from_secs(30 * 60);

    /// Create a cache with explicit bounds.
    pub fn new(capacity: usize, ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: TtlCache::with_clock(capacity, ttl, clock),
        }
    }
}

impl Default for MemorySearchStateCache {
    fn default() -> Self {
        Self::new(
            Self::DEFAULT_CAPACITY,
            Self::DEFAULT_TTL,
            Arc::new(SystemClock),
        )
    }
}

impl SearchStateCache for MemorySearchStateCache {
    fn load(&self, key: &SearchStateKey) -> Option<CachedSearch> {
        self.entries.get(key)
    }

    fn store(&self, key: SearchStateKey, search: CachedSearch) {
        self.entries.insert(key, search);
    }

    fn next_batch(&self, key: &SearchStateKey, limit: usize) -> Option<ServedBatch> {
        let mut served = None;
        self.entries.update(key, |search| {
            let candidates = search.take_next(limit);
            if !candidates.is_empty() {
                served = Some(ServedBatch {
                    identity: search.identity.clone(),
                    destination: search.destination.clone(),
                    source: search.source.clone(),
                    candidates,
                });
            }
        });
        served
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ManualClock;
    use geo::Coord;
    use rstest::{fixture, rstest};

    fn ranked(n: u32) -> Vec<ScoredCandidate> {
        (0..n)
            .map(|i| {
                let place = Place::new(format!("p{i}"), "Cafe", Coord { x: 0.0, y: 0.0 });
                ScoredCandidate::new(place, 100.0 - f64::from(i), Vec::new())
            })
            .collect()
    }

    #[fixture]
    fn cached() -> CachedSearch {
        CachedSearch {
            identity: "u".into(),
            destination: "lisbon".into(),
            source: None,
            all: ranked(12),
            displayed_ids: vec!["p0".into(), "p1".into(), "p2".into(), "p3".into(), "p4".into()],
            continuation_token: None,
        }
    }

    #[rstest]
    fn key_includes_every_component() {
        let base = SearchStateKey::new("u", ["r1"], "lisbon", ["quiet"], Some("wifi"));
        assert_ne!(base, SearchStateKey::new("v", ["r1"], "lisbon", ["quiet"], Some("wifi")));
        assert_ne!(base, SearchStateKey::new("u", ["r2"], "lisbon", ["quiet"], Some("wifi")));
        assert_ne!(base, SearchStateKey::new("u", ["r1"], "porto", ["quiet"], Some("wifi")));
        assert_ne!(base, SearchStateKey::new("u", ["r1"], "lisbon", ["brunch"], Some("wifi")));
        assert_ne!(base, SearchStateKey::new("u", ["r1"], "lisbon", ["quiet"], None));
        assert_eq!(base, SearchStateKey::new("u", ["r1"], "lisbon", ["quiet"], Some(" wifi ")));
    }

    #[rstest]
    #[case::list_separator(&["a,b"], &["a", "b"])]
    #[case::field_separator(&["a|"], &["a"])]
    #[case::escape_char(&["a\\", "b"], &["a", "\\b"])]
    fn separators_inside_ids_do_not_collide(#[case] left: &[&str], #[case] right: &[&str]) {
        let none = Vec::<&str>::new();
        assert_ne!(
            SearchStateKey::new("u", left, "d", none.clone(), None),
            SearchStateKey::new("u", right, "d", none, None)
        );
    }

    #[rstest]
    fn separators_across_fields_do_not_collide() {
        let none = Vec::<&str>::new();
        assert_ne!(
            SearchStateKey::new("u|x", ["r"], "d", none.clone(), None),
            SearchStateKey::new("u", ["x|r"], "d", none, None)
        );
    }

    #[rstest]
    fn raw_key_round_trips_through_display() {
        let key = SearchStateKey::new("u", ["b", "a"], "d", Vec::<&str>::new(), None);
        assert_eq!(SearchStateKey::from_raw(key.to_string()), key);
    }

    #[rstest]
    fn take_next_pages_in_rank_order(mut cached: CachedSearch) {
        let batch = cached.take_next(5);
        let ids: Vec<_> = batch.iter().map(ScoredCandidate::id).collect();
        assert_eq!(ids, ["p5", "p6", "p7", "p8", "p9"]);
        assert_eq!(cached.take_next(5).len(), 2);
        assert!(!cached.has_undisplayed());
        assert!(cached.take_next(5).is_empty());
    }

    #[rstest]
    fn memory_cache_serves_until_exhausted(cached: CachedSearch) {
        let cache = MemorySearchStateCache::new(
            4,
            Duration::from_secs(60),
            Arc::new(ManualClock::default()),
        );
        let key = SearchStateKey::from_raw("k");
        cache.store(key.clone(), cached);

        let first = cache.next_batch(&key, 5).expect("first batch");
        assert_eq!(first.candidates.len(), 5);
        assert_eq!(first.identity, "u");
        let second = cache.next_batch(&key, 5).expect("second batch");
        assert_eq!(second.candidates.len(), 2);
        assert!(cache.next_batch(&key, 5).is_none());
        assert_eq!(cache.load(&key).map(|s| s.displayed_ids.len()), Some(12));
    }

    #[rstest]
    fn memory_cache_forgets_expired_state(cached: CachedSearch) {
        let clock = Arc::new(ManualClock::default());
        let cache = MemorySearchStateCache::new(4, Duration::from_secs(60), clock.clone());
        let key = SearchStateKey::from_raw("k");
        cache.store(key.clone(), cached);
        clock.advance(Duration::from_secs(61));
        assert!(cache.next_batch(&key, 5).is_none());
        assert!(cache.load(&key).is_none());
    }
}
