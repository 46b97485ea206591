//! Command-line interface for the Kindred similar-place engine.
//!
//! `kindred search <request.json>` ranks places for a JSON-encoded
//! `SearchRequest` and prints the `SearchResultSet`. `kindred more <key>`
//! serves the next batch of a previous search, and `kindred save <id>`
//! flips a candidate's saved flag so it is no longer down-ranked.
#![forbid(unsafe_code)]

use clap::{Parser, Subcommand};

mod engine;
mod error;
mod fs;
mod logging;
mod save;
mod search;
mod state_file;

pub use error::CliError;
pub use state_file::FileSearchStateCache;

use save::SaveArgs;
use search::{MoreArgs, SearchArgs};

pub(crate) const ARG_SEARCH_REQUEST: &str = "request";
pub(crate) const ARG_CACHE_KEY: &str = "cache-key";
pub(crate) const ARG_CANDIDATE_ID: &str = "candidate-id";
pub(crate) const ARG_IDENTITY: &str = "identity";
pub(crate) const ARG_DESTINATION: &str = "destination";
pub(crate) const ARG_PLACES_URL: &str = "places-url";
pub(crate) const ARG_PLACES_API_KEY: &str = "places-api-key";
pub(crate) const ARG_GEOCODE_URL: &str = "geocode-url";
pub(crate) const ARG_EXPLAINER_URL: &str = "explainer-url";
pub(crate) const ARG_EXPLAINER_MODEL: &str = "explainer-model";
pub(crate) const ARG_EXPLAINER_API_KEY: &str = "explainer-api-key";
pub(crate) const ARG_SEEN_DB: &str = "seen-db";
pub(crate) const ARG_STATE_FILE: &str = "state-file";
pub(crate) const ARG_TIMEOUT_SECS: &str = "timeout-secs";
pub(crate) const ARG_DETAILS_TIMEOUT_MS: &str = "details-timeout-ms";
pub(crate) const ARG_PAGE_SIZE: &str = "page-size";
pub(crate) const ENV_SEARCH_REQUEST: &str = "KINDRED_CMDS_SEARCH_REQUEST_PATH";
pub(crate) const ENV_CACHE_KEY: &str = "KINDRED_CMDS_MORE_CACHE_KEY";
pub(crate) const ENV_CANDIDATE_ID: &str = "KINDRED_CMDS_SAVE_CANDIDATE_ID";
pub(crate) const ENV_IDENTITY: &str = "KINDRED_CMDS_SAVE_IDENTITY";
pub(crate) const ENV_DESTINATION: &str = "KINDRED_CMDS_SAVE_DESTINATION";

/// Run the Kindred CLI with the current process arguments and environment.
///
/// # Errors
/// Returns [`CliError`] when arguments or configuration are invalid, or the
/// selected command fails.
pub fn run() -> Result<(), CliError> {
    let cli = Cli::try_parse().map_err(CliError::ArgumentParsing)?;
    logging::init(cli.log_level.as_deref());
    let mut stdout = std::io::stdout().lock();
    match cli.command {
        Command::Search(args) => search::run_search(args, &engine::HttpEngineBuilder, &mut stdout),
        Command::More(args) => search::run_more(args, &engine::HttpEngineBuilder, &mut stdout),
        Command::Save(args) => save::run_save(args, &mut stdout),
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "kindred",
    about = "Find places that feel like the ones you already love",
    version
)]
struct Cli {
    /// Log filter directive, e.g. `debug` or `kindred_search=trace`.
    #[arg(long, global = true, value_name = "filter")]
    log_level: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Rank places for a JSON search request.
    Search(SearchArgs),
    /// Serve the next batch of a previous search.
    More(MoreArgs),
    /// Mark a candidate as saved, or unsaved with `--unsave`.
    Save(SaveArgs),
}

#[cfg(test)]
mod tests;
