//! # QuantumLeap Client
//!
//! Query client for the QuantumLeap time-series API (FIWARE NGSI v2).
//!
//! ## Features
//!
//! - **Paged queries**: logically unbounded history queries are split into
//!   bounded page requests, stopping cleanly at the service's end of data
//! - **Reassembly**: page fragments are merged back into ordered,
//!   attribute-aligned time series
//! - **Filter expressions**: validated statements for the simple query
//!   language
//!
//! ## Modules
//!
//! - [`constraint`]: Simple query language statements and operators
//! - [`pagination`]: Page sequencing and the fetcher seam
//! - [`timeseries`]: Data model and response assembly
//! - [`client`]: Query facade and HTTP client
//! - [`config`]: File and environment configuration
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use quantumleap_client::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_env();
//!     let client = QuantumLeapClient::new(&config.client)?;
//!
//!     // Hourly average temperature of every room, all pages merged
//!     let options = QueryOptions::new()
//!         .aggregate(AggrMethod::Avg, AggrPeriod::Hour)
//!         .limit(1000);
//!     let rooms = client
//!         .queries()
//!         .entity_attr_by_type("Room", "temperature", &options)
//!         .await?;
//!
//!     for room in &rooms {
//!         println!("{:?}: {} samples", room.entity_id(), room.len());
//!     }
//!
//!     // Filter expression for context queries
//!     let q = constraint::create_query([("temperature", ">", "20"), ("floor", "==", "1")])?;
//!     println!("q={}", q);
//!
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;
pub mod constraint;
pub mod error;
pub mod pagination;
pub mod timeseries;

// Re-export top-level types for convenience
pub use client::{HttpFetcher, QuantumLeapClient, QueryFacade, QueryOptions, SubscriptionRequest};

pub use config::{generate_default_config, ClientConfig, Config, ConfigError, LoggingConfig};

pub use constraint::{create_query, Operand, Operator, Statement};

pub use error::{QueryError, QueryResult, ValidationError};

pub use pagination::{
    fetch_pages, FetchError, PageCall, PageFetcher, PageRequest, PageSequencer, StopReason,
    DEFAULT_PAGE_SIZE,
};

pub use timeseries::{
    AggrMethod, AggrPeriod, AggrScope, AssemblyError, AttributeValues, Detail, MergeStrategy,
    QueryShape, ResponseAssembler, TimeSeries, TimeSeriesHeader,
};
