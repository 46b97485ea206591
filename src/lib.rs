//! Facade crate for the Kindred similar-place engine.
//!
//! This crate re-exports the core domain types, the scorer and the search
//! service, and exposes the HTTP collaborators and SQLite seen store behind
//! feature flags.

#![forbid(unsafe_code)]

pub use kindred_core::{
    Amenities, AreaRef, CachedSearch, Clock, Destination, ExplanationError, ExplanationGenerator,
    GeoConstraint, MemorySearchStateCache, MemorySeenStore, Place, PlaceDetails,
    PlaceSearchProvider, PreferenceRegistry, PreferenceToggles, ProviderError, ProviderQuery,
    ScoredCandidate, SearchApi, SearchError, SearchPage, SearchRequest,
    SearchRequestValidationError, SearchResultSet, SearchStateCache, SearchStateKey, SeenRecord,
    SeenStore, SeenStoreError, SystemClock,
};

#[cfg(feature = "store-sqlite")]
pub use kindred_core::{SqliteSeenStore, SqliteSeenStoreError};

pub use kindred_scorer::{CandidateScorer, RepeatSuppressor, ScoreWeights, ScoringContext};

pub use kindred_search::{
    FALLBACK_EXPLANATION, OrchestratorConfig, QueryBuilder, SearchOrchestrator, SearchService,
    ServiceConfig,
};

#[cfg(feature = "http")]
pub use kindred_data::{
    HttpExplanationGenerator, HttpExplanationGeneratorConfig, HttpPlaceProvider,
    HttpPlaceProviderConfig, ProviderBuildError,
};
