//! Client error types
//!
//! Defines the errors a caller can observe from a query, and the local
//! validation failures raised before any request is sent.

use std::convert::Infallible;
use thiserror::Error;

use crate::pagination::FetchError;
use crate::timeseries::AssemblyError;

/// Input rejected locally, before any network call
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Operator symbol is not part of the simple query language
    #[error("Unknown operator '{0}', expected one of: ==, !=, >, <, >=, <=, ~=")]
    UnknownOperator(String),

    /// Ordering operators only accept numbers on the right-hand side
    #[error("Operator '{operator}' requires a numeric right-hand side, got '{value}'")]
    NonNumericOperand {
        operator: &'static str,
        value: String,
    },

    /// NaN and infinities are never valid operands
    #[error("Right-hand side must be a finite number, got {0}")]
    NonFiniteNumber(f64),

    /// Statement has no attribute on the left of the operator
    #[error("Statement has an empty left-hand side")]
    EmptyLeftHandSide,

    /// Statement text could not be split into attribute, operator and value
    #[error("Invalid statement '{0}'")]
    InvalidStatement(String),

    /// Subscription throttling below one second
    #[error("Throttling must be a positive integer, got {0}")]
    InvalidThrottling(i64),

    /// A required argument was empty or absent
    #[error("Missing required value: {0}")]
    MissingValue(&'static str),

    /// Aggregation method, period or scope not recognised
    #[error("Unknown {kind} '{value}'")]
    UnknownAggregation { kind: &'static str, value: String },
}

impl From<Infallible> for ValidationError {
    fn from(never: Infallible) -> Self {
        match never {}
    }
}

/// Errors returned by client queries
#[derive(Error, Debug)]
pub enum QueryError {
    /// Arguments rejected before the first request
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// A page request failed and nothing could be salvaged
    #[error("Request to {endpoint} at offset {offset} failed: {source}")]
    Fetch {
        endpoint: String,
        offset: u64,
        #[source]
        source: FetchError,
    },

    /// A non-paged request failed
    #[error("Request to {endpoint} failed: {source}")]
    Request {
        endpoint: String,
        #[source]
        source: FetchError,
    },

    /// Page bodies did not match the shape the query expects
    #[error("Could not assemble response from {endpoint}: {source}")]
    Assembly {
        endpoint: String,
        #[source]
        source: AssemblyError,
    },
}

/// Result type for client queries
pub type QueryResult<T> = Result<T, QueryError>;

/// Reject empty identifiers that would otherwise produce a malformed path
pub(crate) fn require_non_empty(value: &str, name: &'static str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::MissingValue(name))
    } else {
        Ok(())
    }
}
