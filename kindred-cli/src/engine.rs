//! Resolved engine configuration and construction of the search service.

use std::sync::Arc;
use std::time::Duration;

use camino::Utf8PathBuf;
use kindred_core::{SearchApi, SqliteSeenStore, SystemClock};
use kindred_data::{
    HttpExplanationGenerator, HttpExplanationGeneratorConfig, HttpPlaceProvider,
    HttpPlaceProviderConfig,
};
use kindred_search::{OrchestratorConfig, SearchOrchestrator, SearchService, ServiceConfig};
use serde::Serialize;
use std::io::Write;
use tokio::runtime::Runtime;

use crate::CliError;
use crate::state_file::FileSearchStateCache;

pub(crate) const DEFAULT_SEEN_DB: &str = "kindred-seen.db";
pub(crate) const DEFAULT_STATE_FILE: &str = "kindred-state.json";

/// Everything needed to assemble a [`SearchService`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct EngineConfig {
    pub(crate) places: HttpPlaceProviderConfig,
    pub(crate) explainer: HttpExplanationGeneratorConfig,
    pub(crate) seen_db: Utf8PathBuf,
    pub(crate) state_file: Utf8PathBuf,
    pub(crate) orchestrator: OrchestratorConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            places: HttpPlaceProviderConfig::default(),
            explainer: HttpExplanationGeneratorConfig::default(),
            seen_db: Utf8PathBuf::from(DEFAULT_SEEN_DB),
            state_file: Utf8PathBuf::from(DEFAULT_STATE_FILE),
            orchestrator: OrchestratorConfig::default(),
        }
    }
}

/// Optional layered overrides shared by `search` and `more`.
#[derive(Debug, Clone, Default)]
pub(crate) struct EngineOverrides {
    pub(crate) places_url: Option<String>,
    pub(crate) places_api_key: Option<String>,
    pub(crate) geocode_url: Option<String>,
    pub(crate) explainer_url: Option<String>,
    pub(crate) explainer_model: Option<String>,
    pub(crate) explainer_api_key: Option<String>,
    pub(crate) seen_db: Option<Utf8PathBuf>,
    pub(crate) state_file: Option<Utf8PathBuf>,
    pub(crate) timeout_secs: Option<u64>,
    pub(crate) details_timeout_ms: Option<u64>,
    pub(crate) page_size: Option<u8>,
}

impl From<EngineOverrides> for EngineConfig {
    fn from(overrides: EngineOverrides) -> Self {
        let defaults = Self::default();

        let mut places = overrides
            .places_url
            .map_or(defaults.places, HttpPlaceProviderConfig::new);
        if let Some(key) = overrides.places_api_key {
            places = places.with_api_key(key);
        }
        if let Some(url) = overrides.geocode_url {
            places = places.with_geocode_url(url);
        }

        let mut explainer = overrides
            .explainer_url
            .map_or(defaults.explainer, HttpExplanationGeneratorConfig::new);
        if let Some(model) = overrides.explainer_model {
            explainer = explainer.with_model(model);
        }
        if let Some(key) = overrides.explainer_api_key {
            explainer = explainer.with_api_key(key);
        }
        if let Some(secs) = overrides.timeout_secs {
            let timeout = Duration::from_secs(secs);
            places = places.with_timeout(timeout);
            explainer = explainer.with_timeout(timeout);
        }

        let mut orchestrator = defaults.orchestrator;
        if let Some(ms) = overrides.details_timeout_ms {
            orchestrator.details_timeout = Duration::from_millis(ms);
        }
        if let Some(page_size) = overrides.page_size {
            orchestrator.page_size = page_size;
        }

        Self {
            places,
            explainer,
            seen_db: overrides.seen_db.unwrap_or(defaults.seen_db),
            state_file: overrides.state_file.unwrap_or(defaults.state_file),
            orchestrator,
        }
    }
}

/// Builds the search API for one CLI invocation.
pub(crate) trait EngineBuilder {
    fn build(&self, config: &EngineConfig) -> Result<Box<dyn SearchApi>, CliError>;
}

/// Production wiring: HTTP collaborators, SQLite seen store, state file.
pub(crate) struct HttpEngineBuilder;

impl EngineBuilder for HttpEngineBuilder {
    fn build(&self, config: &EngineConfig) -> Result<Box<dyn SearchApi>, CliError> {
        let provider = HttpPlaceProvider::with_config(config.places.clone()).map_err(|source| {
            CliError::BuildCollaborator {
                collaborator: "places",
                base_url: config.places.base_url.clone(),
                source,
            }
        })?;
        let explainer =
            HttpExplanationGenerator::with_config(config.explainer.clone()).map_err(|source| {
                CliError::BuildCollaborator {
                    collaborator: "explanation",
                    base_url: config.explainer.base_url.clone(),
                    source,
                }
            })?;
        Ok(Box::new(assemble(provider, explainer, config)?))
    }
}

/// Wire a service from the given collaborators and the configured stores.
pub(crate) fn assemble<P, E>(
    provider: P,
    explainer: E,
    config: &EngineConfig,
) -> Result<SearchService<P, E>, CliError>
where
    P: kindred_core::PlaceSearchProvider,
    E: kindred_core::ExplanationGenerator,
{
    let seen = SqliteSeenStore::open(config.seen_db.as_std_path())?;
    let state = FileSearchStateCache::open(
        config.state_file.clone(),
        FileSearchStateCache::DEFAULT_TTL,
        Arc::new(SystemClock),
    )?;
    let orchestrator = SearchOrchestrator::new(provider).with_config(config.orchestrator.clone());
    Ok(SearchService::with_config(
        orchestrator,
        explainer,
        Arc::new(seen),
        Arc::new(state),
        ServiceConfig::default(),
        Arc::new(SystemClock),
    ))
}

pub(crate) fn runtime() -> Result<Runtime, CliError> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(CliError::Runtime)
}

pub(crate) fn write_json<T: Serialize + ?Sized>(
    writer: &mut dyn Write,
    value: &T,
) -> Result<(), CliError> {
    let payload = serde_json::to_string_pretty(value).map_err(CliError::SerialiseOutput)?;
    writer
        .write_all(payload.as_bytes())
        .map_err(CliError::WriteOutput)?;
    writer.write_all(b"\n").map_err(CliError::WriteOutput)?;
    Ok(())
}
