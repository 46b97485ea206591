//! `search` and `more` command implementations.

use std::io::{BufReader, Write};

use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;
use kindred_core::SearchRequest;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};

use crate::engine::{EngineBuilder, EngineConfig, EngineOverrides, runtime, write_json};
use crate::fs::open_utf8_file;
use crate::{
    ARG_CACHE_KEY, ARG_DETAILS_TIMEOUT_MS, ARG_EXPLAINER_API_KEY, ARG_EXPLAINER_MODEL,
    ARG_EXPLAINER_URL, ARG_GEOCODE_URL, ARG_PAGE_SIZE, ARG_PLACES_API_KEY, ARG_PLACES_URL,
    ARG_SEARCH_REQUEST, ARG_SEEN_DB, ARG_STATE_FILE, ARG_TIMEOUT_SECS, CliError, ENV_CACHE_KEY,
    ENV_SEARCH_REQUEST,
};

/// CLI arguments for the `search` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    name = "search",
    long_about = "Rank places similar to the references in a JSON-encoded \
                 SearchRequest. Collaborator endpoints and stores can come \
                 from CLI flags, configuration files, or environment \
                 variables.",
    about = "Rank similar places for a search request"
)]
#[ortho_config(prefix = "KINDRED")]
pub(crate) struct SearchArgs {
    /// Path to a JSON file containing a SearchRequest.
    #[arg(value_name = "path")]
    #[serde(default)]
    pub(crate) request_path: Option<Utf8PathBuf>,
    /// Base URL of the places API.
    #[arg(long = ARG_PLACES_URL, value_name = "url")]
    #[serde(default)]
    pub(crate) places_url: Option<String>,
    /// API key for the places API.
    #[arg(long = ARG_PLACES_API_KEY, value_name = "key")]
    #[serde(default)]
    pub(crate) places_api_key: Option<String>,
    /// Base URL of the reverse-geocoding API, if it differs.
    #[arg(long = ARG_GEOCODE_URL, value_name = "url")]
    #[serde(default)]
    pub(crate) geocode_url: Option<String>,
    /// Base URL of the chat completions API used for explanations.
    #[arg(long = ARG_EXPLAINER_URL, value_name = "url")]
    #[serde(default)]
    pub(crate) explainer_url: Option<String>,
    /// Model name for explanations.
    #[arg(long = ARG_EXPLAINER_MODEL, value_name = "name")]
    #[serde(default)]
    pub(crate) explainer_model: Option<String>,
    /// API key for the explanation API.
    #[arg(long = ARG_EXPLAINER_API_KEY, value_name = "key")]
    #[serde(default)]
    pub(crate) explainer_api_key: Option<String>,
    /// SQLite database of seen candidates.
    #[arg(long = ARG_SEEN_DB, value_name = "path")]
    #[serde(default)]
    pub(crate) seen_db: Option<Utf8PathBuf>,
    /// JSON file holding search state for `kindred more`.
    #[arg(long = ARG_STATE_FILE, value_name = "path")]
    #[serde(default)]
    pub(crate) state_file: Option<Utf8PathBuf>,
    /// HTTP request timeout in seconds.
    #[arg(long = ARG_TIMEOUT_SECS, value_name = "secs")]
    #[serde(default)]
    pub(crate) timeout_secs: Option<u64>,
    /// Per-candidate details timeout in milliseconds.
    #[arg(long = ARG_DETAILS_TIMEOUT_MS, value_name = "ms")]
    #[serde(default)]
    pub(crate) details_timeout_ms: Option<u64>,
    /// Results requested per provider page.
    #[arg(long = ARG_PAGE_SIZE, value_name = "n")]
    #[serde(default)]
    pub(crate) page_size: Option<u8>,
}

impl SearchArgs {
    pub(crate) fn into_config(self) -> Result<SearchConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        SearchConfig::try_from(merged)
    }
}

/// Resolved `search` command configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SearchConfig {
    pub(crate) request_path: Utf8PathBuf,
    pub(crate) engine: EngineConfig,
}

impl TryFrom<SearchArgs> for SearchConfig {
    type Error = CliError;

    fn try_from(args: SearchArgs) -> Result<Self, Self::Error> {
        let request_path = args.request_path.ok_or(CliError::MissingArgument {
            field: ARG_SEARCH_REQUEST,
            env: ENV_SEARCH_REQUEST,
        })?;
        let engine = EngineConfig::from(EngineOverrides {
            places_url: args.places_url,
            places_api_key: args.places_api_key,
            geocode_url: args.geocode_url,
            explainer_url: args.explainer_url,
            explainer_model: args.explainer_model,
            explainer_api_key: args.explainer_api_key,
            seen_db: args.seen_db,
            state_file: args.state_file,
            timeout_secs: args.timeout_secs,
            details_timeout_ms: args.details_timeout_ms,
            page_size: args.page_size,
        });
        Ok(Self {
            request_path,
            engine,
        })
    }
}

/// CLI arguments for the `more` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    name = "more",
    about = "Print the next batch of a previous search",
    long_about = "Serve the next batch of not-yet-shown candidates for the \
                 cache key printed by `kindred search`. Prints `null` once \
                 the ranked set is exhausted or has expired."
)]
#[ortho_config(prefix = "KINDRED")]
pub(crate) struct MoreArgs {
    /// Cache key from a previous search result.
    #[arg(value_name = "key")]
    #[serde(default)]
    pub(crate) cache_key: Option<String>,
    /// Base URL of the chat completions API used for explanations.
    #[arg(long = ARG_EXPLAINER_URL, value_name = "url")]
    #[serde(default)]
    pub(crate) explainer_url: Option<String>,
    /// Model name for explanations.
    #[arg(long = ARG_EXPLAINER_MODEL, value_name = "name")]
    #[serde(default)]
    pub(crate) explainer_model: Option<String>,
    /// API key for the explanation API.
    #[arg(long = ARG_EXPLAINER_API_KEY, value_name = "key")]
    #[serde(default)]
    pub(crate) explainer_api_key: Option<String>,
    /// SQLite database of seen candidates.
    #[arg(long = ARG_SEEN_DB, value_name = "path")]
    #[serde(default)]
    pub(crate) seen_db: Option<Utf8PathBuf>,
    /// JSON file holding search state.
    #[arg(long = ARG_STATE_FILE, value_name = "path")]
    #[serde(default)]
    pub(crate) state_file: Option<Utf8PathBuf>,
}

impl MoreArgs {
    pub(crate) fn into_config(self) -> Result<MoreConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        MoreConfig::try_from(merged)
    }
}

/// Resolved `more` command configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct MoreConfig {
    pub(crate) cache_key: String,
    pub(crate) engine: EngineConfig,
}

impl TryFrom<MoreArgs> for MoreConfig {
    type Error = CliError;

    fn try_from(args: MoreArgs) -> Result<Self, Self::Error> {
        let cache_key = args
            .cache_key
            .filter(|key| !key.trim().is_empty())
            .ok_or(CliError::MissingArgument {
                field: ARG_CACHE_KEY,
                env: ENV_CACHE_KEY,
            })?;
        let engine = EngineConfig::from(EngineOverrides {
            explainer_url: args.explainer_url,
            explainer_model: args.explainer_model,
            explainer_api_key: args.explainer_api_key,
            seen_db: args.seen_db,
            state_file: args.state_file,
            ..EngineOverrides::default()
        });
        Ok(Self { cache_key, engine })
    }
}

/// Loads a JSON-encoded [`SearchRequest`] from disk.
pub(crate) fn load_search_request(path: &Utf8Path) -> Result<SearchRequest, CliError> {
    let file = open_utf8_file(path).map_err(|source| CliError::OpenSearchRequest {
        path: path.to_path_buf(),
        source,
    })?;
    let reader = BufReader::new(file);
    serde_json::from_reader(reader).map_err(|source| CliError::ParseSearchRequest {
        path: path.to_path_buf(),
        source,
    })
}

pub(crate) fn run_search(
    args: SearchArgs,
    builder: &dyn EngineBuilder,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    let config = args.into_config()?;
    run_search_with(&config, builder, writer)
}

pub(crate) fn run_search_with(
    config: &SearchConfig,
    builder: &dyn EngineBuilder,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    let request = load_search_request(&config.request_path)?;
    request
        .validate()
        .map_err(|source| CliError::InvalidSearchRequest {
            path: config.request_path.clone(),
            source,
        })?;
    let api = builder.build(&config.engine)?;
    let runtime = runtime()?;
    let result = runtime
        .block_on(api.search(&request))
        .map_err(|source| CliError::Search { source })?;
    // Dropping the runtime waits for the background view writes.
    drop(runtime);
    write_json(writer, &result)
}

pub(crate) fn run_more(
    args: MoreArgs,
    builder: &dyn EngineBuilder,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    let config = args.into_config()?;
    run_more_with(&config, builder, writer)
}

pub(crate) fn run_more_with(
    config: &MoreConfig,
    builder: &dyn EngineBuilder,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    let api = builder.build(&config.engine)?;
    let runtime = runtime()?;
    let batch = runtime.block_on(api.get_next_batch(&config.cache_key));
    drop(runtime);
    write_json(writer, &batch)
}

#[cfg(test)]
pub(crate) fn search_config_from_layers_for_test(
    layers: Vec<ortho_config::MergeLayer<'static>>,
) -> Result<SearchConfig, CliError> {
    let merged = SearchArgs::merge_from_layers(layers).map_err(CliError::from)?;
    SearchConfig::try_from(merged)
}
