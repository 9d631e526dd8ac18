//! Command-line interface parsing for ctgov
//!
//! This module handles parsing of CLI arguments using clap and turns them into
//! the immutable [`Config`] the rest of the program runs with.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use thiserror::Error;

use crate::config::{Config, DATA_HOME_ENV, ENDPOINT_ENV};
use crate::data::{FetchOptions, DEFAULT_FIELDS, SLIM_FIELDS, STUDIES_ENDPOINT_URL};

/// Error types for CLI argument handling
#[derive(Debug, Error)]
pub enum CliError {
    /// No data home given and none could be derived from the platform
    #[error("Could not determine a data directory; pass --data-home or set {}", DATA_HOME_ENV)]
    NoDataHome,
}

/// ctgov - Download and cache the ClinicalTrials.gov registry
#[derive(Parser, Debug)]
#[command(name = "ctgov")]
#[command(about = "Download and cache the ClinicalTrials.gov registry")]
#[command(version)]
pub struct Cli {
    /// Root directory for downloaded data
    #[arg(long, global = true, env = DATA_HOME_ENV, value_name = "DIR")]
    pub data_home: Option<PathBuf>,

    /// Studies endpoint URL
    #[arg(long, global = true, env = ENDPOINT_ENV, default_value = STUDIES_ENDPOINT_URL)]
    pub endpoint: String,

    /// Per-request timeout in seconds
    #[arg(long, global = true, default_value_t = 5, value_name = "SECS")]
    pub timeout: u64,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Load the full registry, downloading it if it isn't cached yet
    Get {
        /// Re-download even if a cached copy exists
        #[arg(long)]
        force: bool,
    },
    /// Stream studies from the API as JSON lines, bypassing the cache
    Stream(StreamArgs),
    /// Refresh the registry and upload it to Zenodo
    Republish,
}

/// Options for the `stream` subcommand
#[derive(Args, Debug, Clone, Default)]
pub struct StreamArgs {
    /// Studies per request (clamped to 1000)
    #[arg(long, value_name = "N")]
    pub page_size: Option<u32>,

    /// Comma-separated fields to download
    #[arg(long, value_delimiter = ',', conflicts_with_all = ["slim", "default_fields"])]
    pub fields: Option<Vec<String>>,

    /// Download the slim field list
    #[arg(long, conflicts_with = "default_fields")]
    pub slim: bool,

    /// Download only NCT id and brief title
    #[arg(long)]
    pub default_fields: bool,

    /// Stop after this many studies
    #[arg(long, value_name = "N")]
    pub limit: Option<usize>,
}

impl StreamArgs {
    /// Paging options for these arguments
    pub fn fetch_options(&self) -> FetchOptions {
        let options = FetchOptions {
            page_size: self.page_size,
            fields: None,
        };

        if let Some(fields) = &self.fields {
            options.with_fields(fields.iter().cloned())
        } else if self.slim {
            options.with_fields(SLIM_FIELDS.iter().copied())
        } else if self.default_fields {
            options.with_fields(DEFAULT_FIELDS.iter().copied())
        } else {
            options
        }
    }
}

impl Cli {
    /// Builds the runtime configuration from parsed arguments.
    ///
    /// # Returns
    /// * `Ok(Config)` with the data home, endpoint and timeout
    /// * `Err(CliError::NoDataHome)` if no data home was given or found
    pub fn config(&self) -> Result<Config, CliError> {
        let data_home = self
            .data_home
            .clone()
            .or_else(Config::default_data_home)
            .ok_or(CliError::NoDataHome)?;

        Ok(Config::new(data_home)
            .with_endpoint(self.endpoint.clone())
            .with_timeout(Duration::from_secs(self.timeout)))
    }
}
