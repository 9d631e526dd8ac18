//! Core data models for the ClinicalTrials.gov downloader
//!
//! Studies are kept as opaque JSON objects: the registry schema is large and
//! changes over time, so no fixed struct is imposed on a record. Field
//! selection is left to the caller through the `fields` query parameter.

pub mod studies;

#[cfg(test)]
pub(crate) mod testing;

pub use studies::{
    effective_page_size, FetchOptions, PageQuery, PageSource, StudiesClient, StudiesError,
    StudyPager,
};

use serde::Deserialize;

/// The API endpoint for studies
pub const STUDIES_ENDPOINT_URL: &str = "https://clinicaltrials.gov/api/v2/studies";

/// Largest page size the API accepts
pub const MAXIMUM_PAGE_SIZE: u32 = 1000;

/// Small field list, handy for quickly checking the registry.
///
/// See <https://clinicaltrials.gov/data-api/about-api/study-data-structure>
/// for the full list of field names.
pub const DEFAULT_FIELDS: &[&str] = &["NCTId", "BriefTitle"];

/// Commonly used fields for conditions, interventions and trial status
pub const SLIM_FIELDS: &[&str] = &[
    "NCTId",
    "BriefTitle",
    "Condition",
    "ConditionMeshTerm",
    "ConditionMeshId",
    "InterventionName",
    "InterventionType",
    "InterventionMeshTerm",
    "InterventionMeshId",
    "StudyType",
    "DesignAllocation",
    "OverallStatus",
    "Phase",
    "WhyStopped",
    "SecondaryIdType",
    "SecondaryId",
    // "November 1, 2023", "May 1984" or missing
    "StartDate",
    // "Actual" or "Anticipated"
    "StartDateType",
    "ReferencePMID",
];

/// A single study as returned by the API
pub type Record = serde_json::Map<String, serde_json::Value>;

/// One page of the studies listing
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageResponse {
    /// Total number of studies, only sent when `countTotal=true` was requested
    #[serde(default)]
    pub total_count: Option<u64>,
    /// Studies on this page
    pub studies: Vec<Record>,
    /// Continuation token, absent on the last page
    #[serde(default)]
    pub next_page_token: Option<String>,
}
