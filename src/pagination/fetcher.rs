//! Page fetcher seam
//!
//! The sequencer never talks to the network directly; it is driven through
//! a [`PageFetcher`] so the termination logic can be exercised against a
//! scripted fetcher in tests.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// One page request as seen by a fetcher
#[derive(Debug, Clone, Copy)]
pub struct PageCall<'a> {
    /// Endpoint path relative to the service root, e.g. `/v2/entities/Room1`
    pub path: &'a str,
    /// Query parameters, including the page's `limit` and `offset`
    pub params: &'a [(String, String)],
    /// Correlation id shared by every page of one logical query
    pub correlator: &'a str,
}

/// Common trait for anything that can fetch one decoded page
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Perform a single GET and return the decoded JSON body
    async fn fetch_page(&self, call: PageCall<'_>) -> Result<Value, FetchError>;
}

/// Outcome of a failed HTTP exchange
#[derive(Error, Debug)]
pub enum FetchError {
    /// 404 whose body carries `"error": "Not Found"`
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Invalid response body: {0}")]
    Decode(String),
}

impl FetchError {
    /// Whether this is the service's "no data here" sentinel
    pub fn is_not_found(&self) -> bool {
        matches!(self, FetchError::NotFound(_))
    }
}

/// Extract the description of a "Not Found" error body, if it is one
pub(crate) fn not_found_description(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    if value.get("error")?.as_str()? != "Not Found" {
        return None;
    }
    Some(
        value
            .get("description")
            .and_then(Value::as_str)
            .unwrap_or("no records")
            .to_string(),
    )
}
