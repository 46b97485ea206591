//! Error types emitted by the Kindred CLI.
//!
//! Keep this error type reasonably small, as many CLI helpers return
//! `Result<_, CliError>` and the workspace enables `clippy::result_large_err`.

use std::sync::Arc;

use camino::Utf8PathBuf;
use kindred_core::{SearchError, SearchRequestValidationError, SeenStoreError, SqliteSeenStoreError};
use kindred_data::ProviderBuildError;
use thiserror::Error;

/// Errors emitted by the Kindred CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// Provided arguments failed Clap validation.
    #[error(transparent)]
    ArgumentParsing(#[from] clap::Error),
    /// Configuration layering failed (files, env, CLI).
    #[error("failed to load configuration: {0}")]
    Configuration(#[from] Arc<ortho_config::OrthoError>),
    /// A required option is missing after configuration merging.
    #[error("missing {field} (set --{field} or {env})")]
    MissingArgument {
        field: &'static str,
        env: &'static str,
    },
    /// Opening the search request file failed.
    #[error("failed to open search request at {path:?}: {source}")]
    OpenSearchRequest {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Search request JSON could not be decoded.
    #[error("failed to parse search request JSON at {path:?}: {source}")]
    ParseSearchRequest {
        path: Utf8PathBuf,
        #[source]
        source: serde_json::Error,
    },
    /// The search request payload failed validation.
    #[error("search request in {path:?} failed validation: {source}")]
    InvalidSearchRequest {
        path: Utf8PathBuf,
        #[source]
        source: SearchRequestValidationError,
    },
    /// Opening the seen-candidate database failed.
    #[error(transparent)]
    OpenSeenStore(#[from] SqliteSeenStoreError),
    /// Updating the seen-candidate database failed.
    #[error("failed to update seen candidates: {0}")]
    UpdateSeenStore(#[source] SeenStoreError),
    /// Reading the search state file failed.
    #[error("failed to read search state at {path:?}: {source}")]
    ReadStateFile {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The search state file is not valid JSON.
    #[error("failed to parse search state at {path:?}: {source}")]
    ParseStateFile {
        path: Utf8PathBuf,
        #[source]
        source: serde_json::Error,
    },
    /// Constructing an HTTP collaborator failed.
    #[error("failed to build {collaborator} client for {base_url:?}: {source}")]
    BuildCollaborator {
        collaborator: &'static str,
        base_url: String,
        #[source]
        source: ProviderBuildError,
    },
    /// The async runtime could not be started.
    #[error("failed to start the async runtime: {0}")]
    Runtime(#[source] std::io::Error),
    /// The search failed.
    #[error("search failed: {source}")]
    Search {
        #[source]
        source: SearchError,
    },
    /// Serialising command output failed.
    #[error("failed to serialise output: {0}")]
    SerialiseOutput(#[source] serde_json::Error),
    /// Writing command output failed.
    #[error("failed to write output: {0}")]
    WriteOutput(#[source] std::io::Error),
}
