//! Time-Series Model and Assembly
//!
//! - **Types**: [`TimeSeries`], [`AttributeValues`], [`TimeSeriesHeader`]
//!   and the aggregation enums accepted by the service
//! - **Assembler**: rebuilds logical series from paged responses
//!
//! Series are created fresh for each query, grown page by page while the
//! response is assembled, and handed back read-only.

mod assembler;
mod types;

pub use assembler::{
    AssemblyError, AttributeSelection, Detail, MergeStrategy, QueryShape, ResponseAssembler,
};
pub use types::{
    parse_timestamp, AggrMethod, AggrPeriod, AggrScope, AttributeValues, TimeSeries,
    TimeSeriesHeader,
};
