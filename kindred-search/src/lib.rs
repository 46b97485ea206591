//! Search orchestration for the Kindred similar-place engine.
//!
//! [`QueryBuilder`] turns liked places and preference toggles into a provider
//! text query and a geographic constraint. [`SearchOrchestrator`] runs one
//! search: it issues the query, drops unusable and suppressed results,
//! verifies area membership, enriches candidates concurrently under a hard
//! timeout, then scores and ranks them. [`SearchService`] wraps the
//! orchestrator with the seen store, the search-state cache and batched
//! explanations, and implements [`kindred_core::SearchApi`].
//!
//! Only a failed provider search surfaces as an error. Details, explanation
//! and seen-store failures degrade quietly and are logged through `log`.

#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

mod explain;
mod orchestrator;
mod query;
mod service;

pub use explain::{ExplanationCache, FALLBACK_EXPLANATION, explain_candidates};
pub use orchestrator::{OrchestratorConfig, SearchOrchestrator, Suppression};
pub use query::{QueryBuilder, QueryConfig, QueryPlan};
pub use service::{SearchService, ServiceConfig};
