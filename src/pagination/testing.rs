//! Scripted fetcher for tests

use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Mutex;

use super::{FetchError, PageCall, PageFetcher};

/// A request the scripted fetcher received
#[derive(Debug, Clone)]
pub(crate) struct RecordedCall {
    pub path: String,
    pub params: Vec<(String, String)>,
    pub correlator: String,
}

impl RecordedCall {
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// Replays a fixed list of outcomes, then answers "not found"
pub(crate) struct ScriptedFetcher {
    outcomes: Mutex<VecDeque<Result<Value, FetchError>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedFetcher {
    pub fn new(outcomes: Vec<Result<Value, FetchError>>) -> Self {
        Self {
            outcomes: Mutex::new(outcomes.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Serve the given bodies as successive pages
    pub fn pages(bodies: Vec<Value>) -> Self {
        Self::new(bodies.into_iter().map(Ok).collect())
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl PageFetcher for ScriptedFetcher {
    async fn fetch_page(&self, call: PageCall<'_>) -> Result<Value, FetchError> {
        self.calls.lock().unwrap().push(RecordedCall {
            path: call.path.to_string(),
            params: call.params.to_vec(),
            correlator: call.correlator.to_string(),
        });

        self.outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(FetchError::NotFound("no records".into())))
    }
}
