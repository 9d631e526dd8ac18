//! Republishing the studies dump to a data archive
//!
//! The archive is reached through [`ArchiveClient`], which only needs a
//! default constructor and an upload operation. The Zenodo upload itself has
//! not been written yet, so [`ZenodoClient`] always refuses.

use thiserror::Error;
use tracing::info;

use crate::cache::{CacheError, StudyCache};
use crate::data::{PageSource, Record};

/// Errors that can occur while republishing the dump
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// Refreshing the dump before upload failed
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// The archive upload has no implementation
    #[error("Archive upload is not implemented")]
    NotImplemented,
}

/// A data archive that can receive the refreshed dump
pub trait ArchiveClient: Default {
    /// Uploads the full list of studies
    fn upload(&self, studies: &[Record]) -> Result<(), ArchiveError>;
}

/// Client for the Zenodo archive
#[derive(Debug, Clone, Default)]
pub struct ZenodoClient;

impl ArchiveClient for ZenodoClient {
    fn upload(&self, _studies: &[Record]) -> Result<(), ArchiveError> {
        // TODO: decide the deposition layout (dump plus sample?) before wiring up the Zenodo API
        Err(ArchiveError::NotImplemented)
    }
}

/// Forces a fresh download and hands it to the archive.
///
/// Builds the default client when none is given.
pub async fn republish<S, C>(cache: &StudyCache<S>, client: Option<C>) -> Result<(), ArchiveError>
where
    S: PageSource,
    C: ArchiveClient,
{
    let client = client.unwrap_or_default();
    let studies = cache.get_studies(true).await?;
    info!(count = studies.len(), "Uploading ClinicalTrials.gov to archive");
    client.upload(&studies)
}
