//! ctgov library
//!
//! Pages through the ClinicalTrials.gov studies API, caches the full registry
//! on disk and exposes the pieces the `ctgov` binary is built from.

pub mod archive;
pub mod cache;
pub mod cli;
pub mod config;
pub mod data;
pub mod logging;
