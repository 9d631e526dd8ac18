//! Minimal HTTP stub standing in for the studies endpoint

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// A running stub server and the request targets it has seen
pub struct StubServer {
    pub url: String,
    requests: Arc<Mutex<Vec<String>>>,
}

impl StubServer {
    /// Request targets (path and query) in arrival order
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

/// Serves one request per connection, answering with `responder(target)`
pub async fn spawn_stub<F>(responder: F) -> StubServer
where
    F: Fn(&str) -> (u16, String) + Send + Sync + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let requests = Arc::new(Mutex::new(Vec::new()));
    let seen = Arc::clone(&requests);

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let mut head = Vec::new();
            let mut chunk = [0u8; 1024];
            while !head.windows(4).any(|w| w == b"\r\n\r\n") {
                match socket.read(&mut chunk).await {
                    Ok(0) | Err(_) => break,
                    Ok(n) => head.extend_from_slice(&chunk[..n]),
                }
            }

            let head = String::from_utf8_lossy(&head);
            let target = head.split_whitespace().nth(1).unwrap_or("/").to_string();
            seen.lock().unwrap().push(target.clone());

            let (status, body) = responder(&target);
            let reason = if status == 200 { "OK" } else { "Error" };
            let response = format!(
                "HTTP/1.1 {} {}\r\n\
                 Content-Type: application/json\r\n\
                 Content-Length: {}\r\n\
                 Connection: close\r\n\r\n{}",
                status,
                reason,
                body.len(),
                body
            );
            let _ = socket.write_all(response.as_bytes()).await;
            let _ = socket.shutdown().await;
        }
    });

    StubServer {
        url: format!("http://{}/api/v2/studies", addr),
        requests,
    }
}

/// Studies `{"protocolSection": {"identificationModule": {"nctId": ...}}}` for ids in `range`
pub fn studies(range: std::ops::Range<usize>) -> Vec<Value> {
    range
        .map(|id| {
            json!({
                "protocolSection": {
                    "identificationModule": {
                        "nctId": format!("NCT{:08}", id),
                        "briefTitle": format!("Study {}", id)
                    }
                }
            })
        })
        .collect()
}

/// totalCount=12: ten studies behind "tok1", then two more.
///
/// With `fail_second_page`, the second page answers HTTP 500 instead.
pub fn twelve_study_responder(
    fail_second_page: bool,
) -> impl Fn(&str) -> (u16, String) + Send + Sync + 'static {
    move |target: &str| {
        if target.contains("pageToken=tok1") {
            if fail_second_page {
                return (500, json!({"error": "internal"}).to_string());
            }
            (200, json!({"studies": studies(10..12)}).to_string())
        } else {
            let body = json!({
                "totalCount": 12,
                "studies": studies(0..10),
                "nextPageToken": "tok1"
            });
            (200, body.to_string())
        }
    }
}
