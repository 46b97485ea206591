//! HTTP collaborators for the Kindred engine.
//!
//! [`places::HttpPlaceProvider`] talks to a Places-style JSON API for text
//! search, per-place details and reverse geocoding.
//! [`explain::HttpExplanationGenerator`] asks an OpenAI-compatible chat
//! completions endpoint for one sentence per candidate. Both implement the
//! async collaborator traits declared in `kindred-core`.

#![forbid(unsafe_code)]

mod error;
pub mod explain;
mod http;
pub mod places;

pub use error::ProviderBuildError;
pub use explain::{HttpExplanationGenerator, HttpExplanationGeneratorConfig};
pub use places::{HttpPlaceProvider, HttpPlaceProviderConfig};
