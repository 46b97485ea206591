//! Core domain types for the Kindred similar-place engine.
//!
//! The crate models places, destinations and preference toggles, provides the
//! geographic helpers shared by query planning and ranking, and declares the
//! collaborator traits (place-search provider, explanation generator, seen
//! store and search-state cache) that the engine depends on. Concrete
//! scoring and orchestration live in `kindred-scorer` and `kindred-search`.

#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

mod amenity;
pub mod cache;
mod clock;
mod destination;
pub mod geo_math;
mod place;
mod preference;
pub mod provider;
mod result;
mod search;
pub mod seen;
pub mod state;
#[doc(hidden)]
pub mod test_support;

pub use amenity::{AmenityField, Amenities, StructuredAmenity, UnknownAmenityField};
pub use cache::TtlCache;
pub use clock::{Clock, ManualClock, SystemClock};
pub use destination::{AREA_KINDS, Destination};
pub use place::{OpeningHours, PhotoRef, Place, PlaceDetails};
pub use preference::{PreferenceDefinition, PreferenceRegistry, PreferenceToggles};
pub use provider::{
    AreaRef, ExplanationError, ExplanationGenerator, ExplanationInput, GeoConstraint,
    PlaceSearchProvider, ProviderError, ProviderQuery, SearchPage,
};
pub use result::{DEFAULT_DISPLAY_LIMIT, ScoredCandidate, SearchResultSet};
pub use search::{SearchApi, SearchError, SearchRequest, SearchRequestValidationError};
pub use seen::{MemorySeenStore, SeenRecord, SeenStore, SeenStoreError};
#[cfg(feature = "store-sqlite")]
pub use seen::{SqliteSeenStore, SqliteSeenStoreError};
pub use state::{
    CachedSearch, MemorySearchStateCache, SearchStateCache, SearchStateKey, ServedBatch,
};
