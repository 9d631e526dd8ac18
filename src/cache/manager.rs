//! Cache manager for the full ClinicalTrials.gov dump
//!
//! Provides a `StudyCache` that downloads every study once, stores the list as
//! gzip-compressed JSON, and serves later calls from disk until a refresh is
//! forced. A short pretty-printed sample is written next to the dump for quick
//! inspection.

use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use futures::TryStreamExt;
use thiserror::Error;
use tracing::info;

use crate::data::{FetchOptions, PageSource, Record, StudiesError, StudyPager, MAXIMUM_PAGE_SIZE};

/// File name of the compressed full dump
pub const RESULTS_FILE: &str = "results.json.gz";

/// File name of the uncompressed sample
pub const SAMPLE_FILE: &str = "results_sample.json";

/// Number of studies written to the sample file
pub const N_SAMPLE_ROWS: usize = 5;

/// Errors that can occur while loading or refreshing the cache
#[derive(Debug, Error)]
pub enum CacheError {
    /// Downloading the studies failed; nothing was written
    #[error("Failed to download studies: {0}")]
    Fetch(#[from] StudiesError),

    /// The existing cache artifact could not be read or parsed
    #[error("Failed to read cached studies from {}: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },

    /// Writing a cache artifact failed
    #[error("Failed to write {}: {source}", path.display())]
    Write { path: PathBuf, source: io::Error },
}

/// Manages the on-disk copy of the studies dump
///
/// The dump is always replaced as a whole: the registry has no stable
/// ordering, so there is nothing to merge. Nothing is written until the
/// download has finished, so a failed refresh leaves the previous dump intact.
pub struct StudyCache<S> {
    /// Directory holding the cache artifacts
    cache_dir: PathBuf,
    /// Where pages come from on a refresh
    source: S,
}

impl<S: PageSource> StudyCache<S> {
    /// Creates a cache rooted at `cache_dir`, refreshing from `source`
    pub fn new(cache_dir: PathBuf, source: S) -> Self {
        Self { cache_dir, source }
    }

    /// Directory holding the cache artifacts
    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Path of the compressed full dump
    pub fn results_path(&self) -> PathBuf {
        self.cache_dir.join(RESULTS_FILE)
    }

    /// Path of the uncompressed sample
    pub fn sample_path(&self) -> PathBuf {
        self.cache_dir.join(SAMPLE_FILE)
    }

    /// Whether a dump is already on disk
    pub fn is_cached(&self) -> bool {
        self.results_path().exists()
    }

    /// The page source used for refreshes
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Gets the full ClinicalTrials.gov dump.
    ///
    /// # Arguments
    /// * `force` - Re-download even if a dump is already cached
    ///
    /// # Behavior
    /// - Cached and not forced: the dump is decompressed and returned as-is
    /// - Otherwise every page is downloaded, then the sample and the dump are written
    /// - A corrupt dump is an error, never silently re-downloaded
    ///
    /// New studies are registered daily, so callers should refresh periodically.
    pub async fn get_studies(&self, force: bool) -> Result<Vec<Record>, CacheError> {
        if !force && self.is_cached() {
            return self.load();
        }

        let studies = self.download().await?;
        self.store(&studies)?;
        Ok(studies)
    }

    /// Downloads every study at the largest page size
    async fn download(&self) -> Result<Vec<Record>, CacheError> {
        let started = Instant::now();
        let options = FetchOptions::full().with_page_size(MAXIMUM_PAGE_SIZE);
        let studies: Vec<Record> = StudyPager::new(&self.source, options)
            .into_stream()
            .try_collect()
            .await?;

        info!(
            count = studies.len(),
            elapsed_secs = started.elapsed().as_secs_f64(),
            "Downloaded ClinicalTrials.gov"
        );
        Ok(studies)
    }

    /// Reads the cached dump
    fn load(&self) -> Result<Vec<Record>, CacheError> {
        let path = self.results_path();
        let started = Instant::now();
        info!(path = %path.display(), "Loading cached ClinicalTrials.gov");

        let read_error = |source: io::Error| CacheError::Read {
            path: path.clone(),
            source,
        };
        let file = File::open(&path).map_err(read_error)?;
        let decoder = GzDecoder::new(BufReader::new(file));
        let studies: Vec<Record> =
            serde_json::from_reader(decoder).map_err(|e| read_error(e.into()))?;

        info!(
            count = studies.len(),
            elapsed_secs = started.elapsed().as_secs_f64(),
            "Loaded cached ClinicalTrials.gov"
        );
        Ok(studies)
    }

    /// Writes the sample and the compressed dump
    fn store(&self, studies: &[Record]) -> Result<(), CacheError> {
        fs::create_dir_all(&self.cache_dir).map_err(|source| CacheError::Write {
            path: self.cache_dir.clone(),
            source,
        })?;

        // Both artifacts are staged before either is swapped in, so a failed
        // write leaves the previous sample and dump paired.
        let sample = &studies[..studies.len().min(N_SAMPLE_ROWS)];
        let sample_temp = stage(&self.sample_path(), |writer| {
            serde_json::to_writer_pretty(&mut *writer, sample)?;
            Ok(())
        })?;

        let staged_dump = stage(&self.results_path(), |writer| {
            let mut encoder = GzEncoder::new(writer, Compression::default());
            serde_json::to_writer(&mut encoder, studies)?;
            encoder.finish()?;
            Ok(())
        });
        let dump_temp = match staged_dump {
            Ok(temp) => temp,
            Err(err) => {
                let _ = fs::remove_file(&sample_temp);
                return Err(err);
            }
        };

        commit(&dump_temp, &self.results_path())?;
        commit(&sample_temp, &self.sample_path())?;

        info!(
            count = studies.len(),
            path = %self.results_path().display(),
            "Cached ClinicalTrials.gov"
        );
        Ok(())
    }
}

/// Writes the contents for `path` into a synced temp file next to it.
///
/// Returns the temp path, ready for [`commit`].
fn stage<F>(path: &Path, write: F) -> Result<PathBuf, CacheError>
where
    F: FnOnce(&mut BufWriter<File>) -> io::Result<()>,
{
    let write_error = |source: io::Error| CacheError::Write {
        path: path.to_path_buf(),
        source,
    };

    let temp_path = path.with_extension("tmp");
    let result = File::create(&temp_path).and_then(|file| {
        let mut writer = BufWriter::new(file);
        write(&mut writer)?;
        writer.flush()?;
        let file = writer.into_inner().map_err(|e| e.into_error())?;
        file.sync_all()
    });

    match result {
        Ok(()) => Ok(temp_path),
        Err(source) => {
            if temp_path.is_file() {
                let _ = fs::remove_file(&temp_path);
            }
            Err(write_error(source))
        }
    }
}

/// Moves a staged temp file over `path`
fn commit(temp_path: &Path, path: &Path) -> Result<(), CacheError> {
    fs::rename(temp_path, path).map_err(|source| CacheError::Write {
        path: path.to_path_buf(),
        source,
    })
}
