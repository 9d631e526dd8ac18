//! Runtime configuration
//!
//! Built once at startup from the command line (with environment fallbacks)
//! and never changed afterwards.

use std::path::PathBuf;
use std::time::Duration;

use directories::ProjectDirs;

use crate::cache::StudyCache;
use crate::data::studies::REQUEST_TIMEOUT;
use crate::data::{StudiesClient, StudiesError, STUDIES_ENDPOINT_URL};

/// Environment variable overriding the data home
pub const DATA_HOME_ENV: &str = "CTGOV_HOME";

/// Environment variable overriding the studies endpoint
pub const ENDPOINT_ENV: &str = "CTGOV_ENDPOINT";

/// Where downloads live and where they come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Root of the local data home
    data_home: PathBuf,
    /// Studies endpoint URL
    endpoint: String,
    /// Per-request timeout
    timeout: Duration,
}

impl Config {
    /// Creates a configuration for the public API rooted at `data_home`
    pub fn new(data_home: PathBuf) -> Self {
        Self {
            data_home,
            endpoint: STUDIES_ENDPOINT_URL.to_string(),
            timeout: REQUEST_TIMEOUT,
        }
    }

    /// Points the configuration at another endpoint
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Sets the per-request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Platform data directory (`~/.local/share/ctgov` on Linux).
    ///
    /// Returns `None` if no home directory can be determined.
    pub fn default_data_home() -> Option<PathBuf> {
        ProjectDirs::from("", "", "ctgov").map(|dirs| dirs.data_dir().to_path_buf())
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Directory for the ClinicalTrials.gov artifacts, namespaced under the data home
    pub fn cache_dir(&self) -> PathBuf {
        self.data_home.join("bio").join("clinicaltrials")
    }

    /// HTTP client for the configured endpoint
    pub fn studies_client(&self) -> Result<StudiesClient, StudiesError> {
        StudiesClient::with_endpoint(self.endpoint.clone(), self.timeout)
    }

    /// Cache manager backed by the configured endpoint
    pub fn study_cache(&self) -> Result<StudyCache<StudiesClient>, StudiesError> {
        Ok(StudyCache::new(self.cache_dir(), self.studies_client()?))
    }
}
