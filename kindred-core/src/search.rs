//! The exposed search contract: request type, error type and [`SearchApi`].

use std::collections::BTreeSet;

use async_trait::async_trait;
use thiserror::Error;

use crate::provider::ProviderError;
use crate::{Destination, Place, PreferenceToggles, ScoredCandidate, SearchResultSet};

/// One similar-place search.
///
/// # Examples
/// ```
/// use geo::Coord;
/// use kindred_core::{Destination, Place, SearchRequest};
///
/// let liked = Place::new("ref-1", "Blue Bottle", Coord { x: -122.4, y: 37.78 });
/// let request = SearchRequest::new(
///     "user-1",
///     vec![liked],
///     Destination::new("lisbon", Coord { x: -9.14, y: 38.72 }),
/// )
/// .with_free_text("specialty coffee")
/// .refining();
/// assert!(request.validate().is_ok());
/// assert!(request.refine);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SearchRequest {
    /// User id or anonymised network identity.
    pub identity: String,
    /// Liked places. The first is the source place for price comparison.
    pub references: Vec<Place>,
    /// Where to search.
    pub destination: Destination,
    /// Preference toggles.
    #[cfg_attr(feature = "serde", serde(default))]
    pub toggles: PreferenceToggles,
    /// Optional free-text steering.
    #[cfg_attr(feature = "serde", serde(default))]
    pub free_text: Option<String>,
    /// Externally supplied keywords replacing the default base terms.
    #[cfg_attr(feature = "serde", serde(default))]
    pub override_keywords: Vec<String>,
    /// Whether this is a refinement of a previous search.
    #[cfg_attr(feature = "serde", serde(default))]
    pub refine: bool,
    /// Provider continuation token for "load more".
    #[cfg_attr(feature = "serde", serde(default))]
    pub continuation: Option<String>,
    /// Candidate ids to drop before scoring.
    #[cfg_attr(feature = "serde", serde(default))]
    pub exclude_ids: BTreeSet<String>,
}

impl SearchRequest {
    /// Build a request with no toggles, free text or continuation.
    pub fn new(
        identity: impl Into<String>,
        references: Vec<Place>,
        destination: Destination,
    ) -> Self {
        Self {
            identity: identity.into(),
            references,
            destination,
            toggles: PreferenceToggles::new(),
            free_text: None,
            override_keywords: Vec::new(),
            refine: false,
            continuation: None,
            exclude_ids: BTreeSet::new(),
        }
    }

    /// Attach preference toggles.
    #[must_use]
    pub fn with_toggles(mut self, toggles: PreferenceToggles) -> Self {
        self.toggles = toggles;
        self
    }

    /// Attach free text.
    #[must_use]
    pub fn with_free_text(mut self, text: impl Into<String>) -> Self {
        self.free_text = Some(text.into());
        self
    }

    /// Replace the default base terms.
    #[must_use]
    pub fn with_override_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.override_keywords = keywords.into_iter().map(Into::into).collect();
        self
    }

    /// Mark the request as a refinement.
    #[must_use]
    pub fn refining(mut self) -> Self {
        self.refine = true;
        self
    }

    /// Continue from a provider page token.
    #[must_use]
    pub fn with_continuation(mut self, token: impl Into<String>) -> Self {
        self.continuation = Some(token.into());
        self
    }

    /// Hard-suppress additional ids.
    #[must_use]
    pub fn with_excluded<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude_ids.extend(ids.into_iter().map(Into::into));
        self
    }

    /// The place used for price comparison.
    pub fn source(&self) -> Option<&Place> {
        self.references.first()
    }

    /// Trimmed free text, if any remains.
    pub fn free_text(&self) -> Option<&str> {
        self.free_text
            .as_deref()
            .map(str::trim)
            .filter(|text| !text.is_empty())
    }

    /// Check the request is searchable.
    pub fn validate(&self) -> Result<(), SearchRequestValidationError> {
        if self.identity.trim().is_empty() {
            return Err(SearchRequestValidationError::EmptyIdentity);
        }
        if self.destination.key.trim().is_empty() {
            return Err(SearchRequestValidationError::EmptyDestination);
        }
        if self.references.is_empty() {
            return Err(SearchRequestValidationError::NoReferences);
        }
        Ok(())
    }
}

/// Reasons a [`SearchRequest`] is rejected before any provider call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SearchRequestValidationError {
    /// No identity to key suppression on.
    #[error("search request identity must not be empty")]
    EmptyIdentity,
    /// No destination key.
    #[error("search request destination key must not be empty")]
    EmptyDestination,
    /// Nothing to compare against.
    #[error("search request must include at least one reference place")]
    NoReferences,
}

/// Errors surfaced to callers of [`SearchApi::search`].
#[derive(Debug, Error)]
pub enum SearchError {
    /// The provider search or area verification failed.
    #[error(transparent)]
    Provider(#[from] ProviderError),
    /// The request was malformed.
    #[error(transparent)]
    InvalidRequest(#[from] SearchRequestValidationError),
}

/// The engine's exposed operations.
#[async_trait]
pub trait SearchApi: Send + Sync {
    /// Run a search and return ranked results.
    async fn search(&self, request: &SearchRequest) -> Result<SearchResultSet, SearchError>;

    /// Serve the next cached batch for `cache_key`, or `None` when the cached
    /// set is exhausted or gone.
    async fn get_next_batch(&self, cache_key: &str) -> Option<Vec<ScoredCandidate>>;
}
