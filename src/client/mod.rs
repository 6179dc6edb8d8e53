//! QuantumLeap Client
//!
//! - **Facade**: paged history queries, generic over the page fetcher
//! - **Http**: reqwest transport implementing the fetcher
//! - [`QuantumLeapClient`]: the facade over HTTP plus the service's
//!   non-paged endpoints (version, health, deletion, subscription)
//!
//! # Example
//!
//! ```rust,no_run
//! use quantumleap_client::{ClientConfig, QuantumLeapClient, QueryOptions};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = QuantumLeapClient::new(&ClientConfig::default())?;
//!
//!     let series = client
//!         .queries()
//!         .entity_attr_by_id("Room1", "temperature", &QueryOptions::new().limit(100))
//!         .await?;
//!
//!     println!("{} samples", series.len());
//!     Ok(())
//! }
//! ```

mod facade;
mod http;
mod options;
mod subscription;

pub use facade::QueryFacade;
pub use http::HttpFetcher;
pub use options::QueryOptions;
pub use subscription::SubscriptionRequest;

use serde_json::Value;

use crate::config::ClientConfig;
use crate::error::{require_non_empty, QueryError, QueryResult};
use crate::pagination::FetchError;

/// QuantumLeap REST API client
pub struct QuantumLeapClient {
    queries: QueryFacade<HttpFetcher>,
    orion_url: String,
}

impl QuantumLeapClient {
    /// Create a client with the given configuration
    pub fn new(config: &ClientConfig) -> QueryResult<Self> {
        let fetcher = HttpFetcher::new(config).map_err(|source| QueryError::Request {
            endpoint: config.url.clone(),
            source,
        })?;

        let queries = QueryFacade::new(fetcher)
            .with_page_size(config.page_size)
            .with_merge_strategy(config.merge_strategy);

        Ok(Self {
            queries,
            orion_url: config.orion_url.clone(),
        })
    }

    /// Paged history queries
    pub fn queries(&self) -> &QueryFacade<HttpFetcher> {
        &self.queries
    }

    fn http(&self) -> &HttpFetcher {
        self.queries.fetcher()
    }

    fn request_error(path: &str) -> impl FnOnce(FetchError) -> QueryError + '_ {
        move |source| {
            tracing::error!(endpoint = path, error = %source, "Request failed");
            QueryError::Request {
                endpoint: path.to_string(),
                source,
            }
        }
    }

    /// Service version information
    pub async fn version(&self) -> QueryResult<Value> {
        let path = "/version";
        self.http().get_json(path).await.map_err(Self::request_error(path))
    }

    /// Service and dependency health report
    pub async fn health(&self) -> QueryResult<Value> {
        let path = "/health";
        self.http().get_json(path).await.map_err(Self::request_error(path))
    }

    /// Delete all historical records of an entity
    pub async fn delete_entity(&self, entity_id: &str, entity_type: Option<&str>) -> QueryResult<String> {
        require_non_empty(entity_id, "entity_id")?;
        let path = format!("/v2/entities/{}", urlencoding::encode(entity_id));
        let params: Vec<(String, String)> = entity_type
            .map(|t| vec![("type".to_string(), t.to_string())])
            .unwrap_or_default();

        self.http()
            .delete(&path, &params)
            .await
            .map_err(Self::request_error(&path))?;

        tracing::info!("Entity id '{}' successfully deleted", entity_id);
        Ok(entity_id.to_string())
    }

    /// Delete the historical records of every entity of a type
    pub async fn delete_entity_type(&self, entity_type: &str) -> QueryResult<String> {
        require_non_empty(entity_type, "entity_type")?;
        let path = format!("/v2/types/{}", urlencoding::encode(entity_type));

        self.http()
            .delete(&path, &[])
            .await
            .map_err(Self::request_error(&path))?;

        tracing::info!("Entities of type '{}' successfully deleted", entity_type);
        Ok(entity_type.to_string())
    }

    /// Ask QuantumLeap to create an Orion subscription feeding it
    pub async fn subscribe(&self, request: &SubscriptionRequest) -> QueryResult<()> {
        let path = "/v2/subscribe";
        let params = request.to_params(&self.orion_url, self.http().base_url())?;

        self.http()
            .post_params(path, &params)
            .await
            .map_err(Self::request_error(path))?;

        tracing::info!("Subscription created successfully");
        Ok(())
    }
}
