//! Scripted page source shared by unit tests

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::json;

use super::{PageQuery, PageResponse, PageSource, Record, StudiesError};

/// Replays a fixed list of page results and records every query it receives
pub struct ScriptedSource {
    pages: Mutex<VecDeque<Result<PageResponse, StudiesError>>>,
    queries: Mutex<Vec<PageQuery>>,
}

impl ScriptedSource {
    pub fn new(pages: Vec<PageResponse>) -> Self {
        Self::with_results(pages.into_iter().map(Ok).collect())
    }

    pub fn with_results(results: Vec<Result<PageResponse, StudiesError>>) -> Self {
        Self {
            pages: Mutex::new(results.into()),
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn queries(&self) -> Vec<PageQuery> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl PageSource for ScriptedSource {
    async fn fetch_page(&self, query: &PageQuery) -> Result<PageResponse, StudiesError> {
        self.queries.lock().unwrap().push(query.clone());
        self.pages
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(StudiesError::MalformedResponse("script exhausted".to_string())))
    }
}

pub fn page(total: Option<u64>, studies: Vec<Record>, token: Option<&str>) -> PageResponse {
    PageResponse {
        total_count: total,
        studies,
        next_page_token: token.map(str::to_string),
    }
}

/// Records `{"id": start}` .. `{"id": start + count - 1}`
pub fn numbered_records(start: usize, count: usize) -> Vec<Record> {
    (start..start + count)
        .map(|id| {
            let mut record = Record::new();
            record.insert("id".to_string(), json!(id));
            record.insert("nctId".to_string(), json!(format!("NCT{:08}", id)));
            record
        })
        .collect()
}

/// A real transport-level error without touching the network
pub fn network_error() -> StudiesError {
    let err = reqwest::Client::new()
        .get("not a url")
        .build()
        .expect_err("relative URL must not build");
    StudiesError::Network(err)
}
