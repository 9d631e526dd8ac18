//! Cache module for storing the studies dump on disk
//!
//! This module provides a cache manager that keeps the most recent full
//! download as gzip-compressed JSON, plus a small uncompressed sample. The
//! dump is served as-is until a refresh is forced.

mod manager;

pub use manager::{CacheError, StudyCache, N_SAMPLE_ROWS, RESULTS_FILE, SAMPLE_FILE};
