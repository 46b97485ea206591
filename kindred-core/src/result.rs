//! Ranked search output.

use crate::Place;

/// Number of candidates shown per page.
pub const DEFAULT_DISPLAY_LIMIT: usize = 5;

/// A candidate with its score and the reasons behind it.
///
/// Every positive score contribution that has a human-readable label is
/// listed in `matched_reasons`, in the order the scoring rules ran.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScoredCandidate {
    /// The candidate place.
    pub place: Place,
    /// Aggregate score after any seen penalty.
    pub score: f64,
    /// Reasons in rule order.
    pub matched_reasons: Vec<String>,
    /// Great-circle distance from the destination centre.
    #[cfg_attr(feature = "serde", serde(default))]
    pub distance_km: Option<f64>,
    /// Narrative naming the reference places this candidate resembles.
    #[cfg_attr(feature = "serde", serde(default))]
    pub category_overlap: Option<String>,
    /// Set when the identity was shown this candidate before without saving it.
    #[cfg_attr(feature = "serde", serde(default))]
    pub seen_before: bool,
    /// Natural-language explanation, filled for displayed candidates.
    #[cfg_attr(feature = "serde", serde(default))]
    pub explanation: Option<String>,
}

impl ScoredCandidate {
    /// Wrap a place with a score and reasons.
    pub fn new(place: Place, score: f64, matched_reasons: Vec<String>) -> Self {
        Self {
            place,
            score,
            matched_reasons,
            distance_km: None,
            category_overlap: None,
            seen_before: false,
            explanation: None,
        }
    }

    /// The candidate's provider identifier.
    pub fn id(&self) -> &str {
        &self.place.id
    }
}

/// Outcome of one search.
///
/// `displayed` is always a prefix of `all`, and `all` is sorted by
/// descending score with ties kept in provider order.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SearchResultSet {
    /// Top slice shown to the user.
    pub displayed: Vec<ScoredCandidate>,
    /// Full ranked list.
    pub all: Vec<ScoredCandidate>,
    /// Whether more results can be served, from cache or the provider.
    pub has_more: bool,
    /// Provider continuation token for the next page.
    #[cfg_attr(feature = "serde", serde(default))]
    pub continuation_token: Option<String>,
    /// Key of the cached state backing "show more" requests.
    #[cfg_attr(feature = "serde", serde(default))]
    pub cache_key: Option<String>,
}

impl SearchResultSet {
    /// Build a result set from an already-ranked list.
    ///
    /// # Examples
    /// ```
    /// use geo::Coord;
    /// use kindred_core::{Place, ScoredCandidate, SearchResultSet};
    ///
    /// let ranked: Vec<_> = (0..7)
    ///     .map(|i| {
    ///         let place = Place::new(format!("p{i}"), "Cafe", Coord { x: 0.0, y: 0.0 });
    ///         ScoredCandidate::new(place, f64::from(10 - i), Vec::new())
    ///     })
    ///     .collect();
    /// let set = SearchResultSet::from_ranked(ranked, 5, None);
    /// assert_eq!(set.displayed.len(), 5);
    /// assert_eq!(set.all.len(), 7);
    /// assert!(set.has_more);
    /// ```
    pub fn from_ranked(
        all: Vec<ScoredCandidate>,
        display_limit: usize,
        continuation_token: Option<String>,
    ) -> Self {
        let displayed: Vec<_> = all.iter().take(display_limit).cloned().collect();
        let has_more = continuation_token.is_some() || all.len() > displayed.len();
        Self {
            displayed,
            all,
            has_more,
            continuation_token,
            cache_key: None,
        }
    }
}
