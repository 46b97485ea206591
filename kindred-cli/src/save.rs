//! `save` command implementation.

use std::io::Write;
use std::time::SystemTime;

use camino::Utf8PathBuf;
use clap::Parser;
use kindred_core::{SeenStore, SqliteSeenStore};
use log::info;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};

use crate::engine::{DEFAULT_SEEN_DB, write_json};
use crate::{
    ARG_CANDIDATE_ID, ARG_DESTINATION, ARG_IDENTITY, ARG_SEEN_DB, CliError, ENV_CANDIDATE_ID,
    ENV_DESTINATION, ENV_IDENTITY,
};

/// CLI arguments for the `save` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    name = "save",
    about = "Mark a candidate saved so it is not down-ranked as already seen"
)]
#[ortho_config(prefix = "KINDRED")]
pub(crate) struct SaveArgs {
    /// Candidate place id.
    #[arg(value_name = "id")]
    #[serde(default)]
    pub(crate) candidate_id: Option<String>,
    /// Identity the candidate was shown to.
    #[arg(long = ARG_IDENTITY, value_name = "id")]
    #[serde(default)]
    pub(crate) identity: Option<String>,
    /// Destination key the candidate was shown for.
    #[arg(long = ARG_DESTINATION, value_name = "key")]
    #[serde(default)]
    pub(crate) destination: Option<String>,
    /// SQLite database of seen candidates.
    #[arg(long = ARG_SEEN_DB, value_name = "path")]
    #[serde(default)]
    pub(crate) seen_db: Option<Utf8PathBuf>,
    /// Clear the saved flag instead of setting it.
    #[arg(long)]
    #[serde(default)]
    pub(crate) unsave: bool,
}

/// Resolved `save` command configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SaveConfig {
    pub(crate) candidate_id: String,
    pub(crate) identity: String,
    pub(crate) destination: String,
    pub(crate) seen_db: Utf8PathBuf,
    pub(crate) saved: bool,
}

impl TryFrom<SaveArgs> for SaveConfig {
    type Error = CliError;

    fn try_from(args: SaveArgs) -> Result<Self, Self::Error> {
        let candidate_id = args.candidate_id.ok_or(CliError::MissingArgument {
            field: ARG_CANDIDATE_ID,
            env: ENV_CANDIDATE_ID,
        })?;
        let identity = args.identity.ok_or(CliError::MissingArgument {
            field: ARG_IDENTITY,
            env: ENV_IDENTITY,
        })?;
        let destination = args.destination.ok_or(CliError::MissingArgument {
            field: ARG_DESTINATION,
            env: ENV_DESTINATION,
        })?;
        Ok(Self {
            candidate_id,
            identity,
            destination,
            seen_db: args
                .seen_db
                .unwrap_or_else(|| Utf8PathBuf::from(DEFAULT_SEEN_DB)),
            saved: !args.unsave,
        })
    }
}

/// Printed after a successful update.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub(crate) struct SaveOutcome {
    pub(crate) candidate_id: String,
    pub(crate) saved: bool,
}

pub(crate) fn run_save(args: SaveArgs, writer: &mut dyn Write) -> Result<(), CliError> {
    let merged = args.load_and_merge().map_err(CliError::Configuration)?;
    run_save_with(&SaveConfig::try_from(merged)?, writer)
}

pub(crate) fn run_save_with(config: &SaveConfig, writer: &mut dyn Write) -> Result<(), CliError> {
    let store = SqliteSeenStore::open(config.seen_db.as_std_path())?;
    store
        .set_saved(
            &config.identity,
            &config.destination,
            &config.candidate_id,
            config.saved,
            SystemTime::now(),
        )
        .map_err(CliError::UpdateSeenStore)?;
    info!(
        "{} {} for {} in {}",
        if config.saved { "saved" } else { "unsaved" },
        config.candidate_id,
        config.identity,
        config.destination
    );
    write_json(
        writer,
        &SaveOutcome {
            candidate_id: config.candidate_id.clone(),
            saved: config.saved,
        },
    )
}
