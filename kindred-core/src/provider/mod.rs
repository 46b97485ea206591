//! Contracts for the external capabilities the engine consumes.
//!
//! The [`PlaceSearchProvider`] trait abstracts text/geo search, the
//! per-candidate details call and reverse geocoding. The
//! [`ExplanationGenerator`] trait abstracts the batched natural-language
//! explanation call. Both are asynchronous so independent requests can be
//! issued concurrently.

mod error;
mod explanation;
mod place_search;

pub use error::{ExplanationError, ProviderError};
pub use explanation::{ExplanationGenerator, ExplanationInput};
pub use place_search::{AreaRef, GeoConstraint, PlaceSearchProvider, ProviderQuery, SearchPage};
