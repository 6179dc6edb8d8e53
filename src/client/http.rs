//! HTTP transport
//!
//! reqwest-backed [`PageFetcher`] plus the plain requests used by the
//! non-paged endpoints. Every request carries the configured FIWARE
//! tenant headers.

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde_json::Value;
use std::time::Duration;

use crate::config::ClientConfig;
use crate::pagination::{not_found_description, FetchError, PageCall, PageFetcher};

const SERVICE_HEADER: &str = "Fiware-Service";
const SERVICE_PATH_HEADER: &str = "Fiware-ServicePath";
const CORRELATOR_HEADER: &str = "Fiware-Correlator";

/// QuantumLeap HTTP transport
pub struct HttpFetcher {
    client: Client,
    base_url: String,
    service: Option<String>,
    service_path: Option<String>,
}

impl HttpFetcher {
    /// Create a transport from client configuration
    pub fn new(config: &ClientConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            service: config.service.clone(),
            service_path: config.service_path.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for a path relative to the service root
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let mut builder = self.client.request(method, self.url(path));
        if let Some(service) = &self.service {
            builder = builder.header(SERVICE_HEADER, service);
        }
        if let Some(service_path) = &self.service_path {
            builder = builder.header(SERVICE_PATH_HEADER, service_path);
        }
        builder
    }

    /// Send a request and turn non-success statuses into errors
    async fn send(&self, builder: RequestBuilder) -> Result<Response, FetchError> {
        let response = builder.send().await?;
        if response.status().is_success() {
            Ok(response)
        } else {
            Err(error_from_response(response).await)
        }
    }

    /// GET a JSON document
    pub(crate) async fn get_json(&self, path: &str) -> Result<Value, FetchError> {
        let response = self.send(self.request(Method::GET, path)).await?;
        decode_json(response).await
    }

    /// DELETE with query parameters, discarding the body
    pub(crate) async fn delete(&self, path: &str, params: &[(String, String)]) -> Result<(), FetchError> {
        self.send(self.request(Method::DELETE, path).query(params))
            .await
            .map(|_| ())
    }

    /// POST with query parameters only, discarding the body
    pub(crate) async fn post_params(&self, path: &str, params: &[(String, String)]) -> Result<(), FetchError> {
        self.send(self.request(Method::POST, path).query(params))
            .await
            .map(|_| ())
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch_page(&self, call: PageCall<'_>) -> Result<Value, FetchError> {
        let builder = self
            .request(Method::GET, call.path)
            .header(CORRELATOR_HEADER, call.correlator)
            .query(call.params);

        let response = self.send(builder).await?;
        let body = decode_json(response).await?;
        tracing::trace!(body = %body, "Received page");
        Ok(body)
    }
}

async fn decode_json(response: Response) -> Result<Value, FetchError> {
    response
        .json::<Value>()
        .await
        .map_err(|e| FetchError::Decode(e.to_string()))
}

/// Classify a failed response, recognising the "Not Found" sentinel
async fn error_from_response(response: Response) -> FetchError {
    let status = response.status();
    let text = match response.text().await {
        Ok(text) => text,
        Err(e) => return FetchError::Transport(e),
    };

    if status == StatusCode::NOT_FOUND {
        if let Some(description) = not_found_description(&text) {
            return FetchError::NotFound(description);
        }
    }

    FetchError::Api {
        status: status.as_u16(),
        message: text,
    }
}
