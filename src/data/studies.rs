//! Paginated client for the ClinicalTrials.gov studies API
//!
//! The API hands out pages of up to [`MAXIMUM_PAGE_SIZE`] studies together with
//! an opaque `nextPageToken`. [`StudyPager`] follows that token until it is
//! absent and hands out studies one at a time, either through
//! [`StudyPager::next_record`] or as a [`Stream`].
//!
//! The API does not promise a stable ordering, so paging can't be resumed or
//! done incrementally: every pager starts a fresh session at page one.

use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::{self, Stream};
use reqwest::Client;
use thiserror::Error;
use tracing::{debug, info};

use super::{PageResponse, Record, MAXIMUM_PAGE_SIZE, STUDIES_ENDPOINT_URL};

/// Timeout applied to every page request
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Errors that can occur while paging through the studies API
#[derive(Debug, Error)]
pub enum StudiesError {
    /// Transport failure, timeout or non-success HTTP status
    #[error("HTTP request failed: {0}")]
    Network(#[from] reqwest::Error),

    /// The response body was not the expected JSON shape
    #[error("Malformed API response: {0}")]
    MalformedResponse(String),
}

/// Clamps a requested page size to what the API accepts.
///
/// `None` asks for the largest page. Oversized requests are clamped rather
/// than rejected.
pub fn effective_page_size(requested: Option<u32>) -> u32 {
    requested.map_or(MAXIMUM_PAGE_SIZE, |size| size.min(MAXIMUM_PAGE_SIZE))
}

/// Caller-controlled options for a paging session
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchOptions {
    /// Requested page size, clamped to [`MAXIMUM_PAGE_SIZE`]
    pub page_size: Option<u32>,
    /// Fields to download; `None` lets the API return full records
    pub fields: Option<Vec<String>>,
}

impl FetchOptions {
    /// Options for downloading everything at the largest page size
    pub fn full() -> Self {
        Self::default()
    }

    /// Restricts the download to the given fields
    pub fn with_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    /// Sets the requested page size
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = Some(page_size);
        self
    }
}

/// Query parameters for a single page request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageQuery {
    /// Effective (already clamped) page size
    pub page_size: u32,
    /// Comma-joined field names
    pub fields: Option<String>,
    /// Ask the API for the total study count (first page only)
    pub count_total: bool,
    /// Continuation token from the previous page
    pub page_token: Option<String>,
}

impl PageQuery {
    /// Renders the query as URL parameters.
    ///
    /// `countTotal` must be sent as the string `"true"`, not as a JSON boolean.
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![("pageSize", self.page_size.to_string())];
        if let Some(fields) = &self.fields {
            params.push(("fields", fields.clone()));
        }
        if self.count_total {
            params.push(("countTotal", "true".to_string()));
        }
        if let Some(token) = &self.page_token {
            params.push(("pageToken", token.clone()));
        }
        params
    }
}

/// Something that can answer a single page request.
///
/// [`StudiesClient`] is the HTTP implementation; tests script pages directly.
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Fetches one page for the given query
    async fn fetch_page(&self, query: &PageQuery) -> Result<PageResponse, StudiesError>;
}

/// HTTP client for the ClinicalTrials.gov studies endpoint
#[derive(Debug, Clone)]
pub struct StudiesClient {
    /// HTTP client for making requests
    http_client: Client,
    /// Endpoint URL (allows override for testing)
    base_url: String,
}

impl StudiesClient {
    /// Creates a client for the public endpoint with the default timeout
    pub fn new() -> Result<Self, StudiesError> {
        Self::with_endpoint(STUDIES_ENDPOINT_URL, REQUEST_TIMEOUT)
    }

    /// Creates a client for a custom endpoint and per-request timeout
    pub fn with_endpoint(
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, StudiesError> {
        let http_client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("ctgov/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http_client,
            base_url: base_url.into(),
        })
    }

    /// The endpoint this client talks to
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl PageSource for StudiesClient {
    async fn fetch_page(&self, query: &PageQuery) -> Result<PageResponse, StudiesError> {
        debug!(url = %self.base_url, ?query, "Requesting studies page");

        let body = self
            .http_client
            .get(&self.base_url)
            .query(&query.to_params())
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        parse_page(&body)
    }
}

/// Parses a raw response body into a page
pub fn parse_page(body: &str) -> Result<PageResponse, StudiesError> {
    serde_json::from_str(body).map_err(|e| StudiesError::MalformedResponse(e.to_string()))
}

/// Where a paging session currently stands
#[derive(Debug)]
enum PagerState {
    /// Nothing requested yet
    Start,
    /// More pages remain behind this token
    Next(String),
    /// Last page seen, or a request failed
    Done,
}

/// Token-following pager over a [`PageSource`].
///
/// The pager is single-use: once exhausted (or after an error) it yields
/// nothing more. Re-reading the registry needs a new pager.
pub struct StudyPager<'a, S: PageSource + ?Sized> {
    source: &'a S,
    page_size: u32,
    fields: Option<String>,
    state: PagerState,
    buffer: VecDeque<Record>,
    total_count: Option<u64>,
    requests_made: usize,
    records_fetched: usize,
}

impl<'a, S: PageSource + ?Sized> StudyPager<'a, S> {
    /// Starts a new paging session. No request is made until the first pull.
    pub fn new(source: &'a S, options: FetchOptions) -> Self {
        Self {
            source,
            page_size: effective_page_size(options.page_size),
            fields: options.fields.map(|fields| fields.join(",")),
            state: PagerState::Start,
            buffer: VecDeque::new(),
            total_count: None,
            requests_made: 0,
            records_fetched: 0,
        }
    }

    /// Page size actually sent to the API
    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Total study count reported with the first page
    pub fn total_count(&self) -> Option<u64> {
        self.total_count
    }

    /// Number of page requests issued so far
    pub fn requests_made(&self) -> usize {
        self.requests_made
    }

    /// Fetches the next page, or `None` once the last page has been seen
    pub async fn next_page(&mut self) -> Result<Option<Vec<Record>>, StudiesError> {
        let (query, first) = match std::mem::replace(&mut self.state, PagerState::Done) {
            PagerState::Done => return Ok(None),
            PagerState::Start => (self.query(true, None), true),
            PagerState::Next(token) => (self.query(false, Some(token)), false),
        };

        self.requests_made += 1;
        let page = self.source.fetch_page(&query).await?;

        if first {
            let total = page.total_count.ok_or_else(|| {
                StudiesError::MalformedResponse("first page is missing totalCount".to_string())
            })?;
            self.total_count = Some(total);
            info!(total, page_size = self.page_size, "Downloading ClinicalTrials.gov");
        }

        self.records_fetched += page.studies.len();
        debug!(
            fetched = self.records_fetched,
            total = self.total_count,
            requests = self.requests_made,
            "Received studies page"
        );

        self.state = match page.next_page_token {
            Some(token) if !token.is_empty() => PagerState::Next(token),
            _ => PagerState::Done,
        };

        Ok(Some(page.studies))
    }

    /// Pulls the next study, requesting a new page when the current one is used up
    pub async fn next_record(&mut self) -> Result<Option<Record>, StudiesError> {
        loop {
            if let Some(record) = self.buffer.pop_front() {
                return Ok(Some(record));
            }
            match self.next_page().await? {
                Some(studies) => self.buffer.extend(studies),
                None => return Ok(None),
            }
        }
    }

    /// Turns the pager into a lazy stream of studies.
    ///
    /// The stream ends after the last page, or right after yielding the first error.
    pub fn into_stream(self) -> impl Stream<Item = Result<Record, StudiesError>> + 'a
    where
        S: 'a,
    {
        stream::try_unfold(self, |mut pager| async move {
            let record = pager.next_record().await?;
            Ok::<_, StudiesError>(record.map(|record| (record, pager)))
        })
    }

    fn query(&self, count_total: bool, page_token: Option<String>) -> PageQuery {
        PageQuery {
            page_size: self.page_size,
            fields: self.fields.clone(),
            count_total,
            page_token,
        }
    }
}
