//! Query options shared by every history endpoint

use chrono::{DateTime, SecondsFormat, Utc};

use crate::error::ValidationError;
use crate::timeseries::{AggrMethod, AggrPeriod, AggrScope};

/// Filters applied to a history query
///
/// Every option is optional and only set options are sent. `limit` and
/// `offset` drive pagination instead of being sent verbatim.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryOptions {
    pub(crate) entity_type: Option<String>,
    pub(crate) id: Option<String>,
    pub(crate) attrs: Option<String>,
    pub(crate) aggr_method: Option<AggrMethod>,
    pub(crate) aggr_period: Option<AggrPeriod>,
    pub(crate) aggr_scope: Option<AggrScope>,
    pub(crate) from_date: Option<String>,
    pub(crate) to_date: Option<String>,
    pub(crate) last_n: Option<u64>,
    pub(crate) limit: Option<u64>,
    pub(crate) offset: Option<u64>,
    pub(crate) georel: Option<String>,
    pub(crate) geometry: Option<String>,
    pub(crate) coords: Option<String>,
    pub(crate) options: Option<String>,
}

impl QueryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict to an entity type (disambiguates entity ids)
    pub fn entity_type(mut self, entity_type: impl Into<String>) -> Self {
        self.entity_type = Some(entity_type.into());
        self
    }

    /// Comma-separated entity ids, for type-scoped queries
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Attributes to include
    pub fn attrs<I, S>(mut self, attrs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let joined = attrs
            .into_iter()
            .map(|a| a.as_ref().to_string())
            .collect::<Vec<_>>()
            .join(",");
        self.attrs = Some(joined);
        self
    }

    /// Aggregate samples into buckets
    pub fn aggregate(mut self, method: AggrMethod, period: AggrPeriod) -> Self {
        self.aggr_method = Some(method);
        self.aggr_period = Some(period);
        self
    }

    pub fn aggr_method(mut self, method: AggrMethod) -> Self {
        self.aggr_method = Some(method);
        self
    }

    pub fn aggr_period(mut self, period: AggrPeriod) -> Self {
        self.aggr_period = Some(period);
        self
    }

    pub fn aggr_scope(mut self, scope: AggrScope) -> Self {
        self.aggr_scope = Some(scope);
        self
    }

    /// Inclusive start, ISO-8601
    pub fn from_date(mut self, from: impl Into<String>) -> Self {
        self.from_date = Some(from.into());
        self
    }

    /// Inclusive end, ISO-8601
    pub fn to_date(mut self, to: impl Into<String>) -> Self {
        self.to_date = Some(to.into());
        self
    }

    /// Inclusive time window
    pub fn between(self, from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        self.from_date(from.to_rfc3339_opts(SecondsFormat::Millis, true))
            .to_date(to.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    /// Only the most recent N samples
    pub fn last_n(mut self, n: u64) -> Self {
        self.last_n = Some(n);
        self
    }

    /// Total number of records to retrieve across all pages
    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Offset of the first record
    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Geographical filter; all three parts are required together
    pub fn geo(
        mut self,
        georel: impl Into<String>,
        geometry: impl Into<String>,
        coords: impl Into<String>,
    ) -> Self {
        self.georel = Some(georel.into());
        self.geometry = Some(geometry.into());
        self.coords = Some(coords.into());
        self
    }

    /// Free-form `options` parameter
    pub fn options(mut self, options: impl Into<String>) -> Self {
        self.options = Some(options.into());
        self
    }

    /// Check option combinations the service would reject
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.georel.is_some() {
            if self.geometry.is_none() {
                return Err(ValidationError::MissingValue("geometry"));
            }
            if self.coords.is_none() {
                return Err(ValidationError::MissingValue("coords"));
            }
        }
        Ok(())
    }

    /// Parameters sent with every page, excluding `limit` and `offset`
    pub fn to_params(&self) -> Vec<(String, String)> {
        let mut params = Vec::new();
        let mut push = |key: &str, value: Option<String>| {
            if let Some(value) = value {
                params.push((key.to_string(), value));
            }
        };

        push("options", self.options.clone());
        push("type", self.entity_type.clone());
        push("aggrMethod", self.aggr_method.map(|m| m.as_str().to_string()));
        push("aggrPeriod", self.aggr_period.map(|p| p.as_str().to_string()));
        push("fromDate", self.from_date.clone());
        push("toDate", self.to_date.clone());
        push("lastN", self.last_n.map(|n| n.to_string()));
        push("georel", self.georel.clone());
        push("coords", self.coords.clone());
        push("geometry", self.geometry.clone());
        push("attrs", self.attrs.clone());
        push("aggrScope", self.aggr_scope.map(|s| s.as_str().to_string()));
        push("id", self.id.clone());

        params
    }
}
