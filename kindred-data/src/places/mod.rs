//! Place search over a Places-style HTTP API.

mod provider;
mod wire;

pub use provider::{DEFAULT_USER_AGENT, HttpPlaceProvider, HttpPlaceProviderConfig};
