//! Time-series data model
//!
//! Types returned by history queries. A [`TimeSeries`] keeps one values
//! array per attribute, each parallel to the shared `index`.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::ValidationError;
use crate::timeseries::AssemblyError;

/// History of one attribute
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeValues {
    attr_name: String,
    #[serde(default)]
    values: Vec<Value>,
}

impl AttributeValues {
    pub fn new(attr_name: impl Into<String>, values: Vec<Value>) -> Self {
        Self {
            attr_name: attr_name.into(),
            values,
        }
    }

    pub fn attr_name(&self) -> &str {
        &self.attr_name
    }

    /// Samples, one per index entry; `null` where no value was recorded
    pub fn values(&self) -> &[Value] {
        &self.values
    }
}

/// History of one entity
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSeries {
    #[serde(skip_serializing_if = "Option::is_none")]
    entity_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    entity_type: Option<String>,
    index: Vec<DateTime<Utc>>,
    attributes: Vec<AttributeValues>,
}

impl TimeSeries {
    /// Create a series, checking every values array against the index
    ///
    /// Attribute names must be unique within a series.
    pub fn new(
        entity_id: Option<String>,
        entity_type: Option<String>,
        index: Vec<DateTime<Utc>>,
        attributes: Vec<AttributeValues>,
    ) -> Result<Self, AssemblyError> {
        for (i, attr) in attributes.iter().enumerate() {
            if attributes[..i].iter().any(|a| a.attr_name == attr.attr_name) {
                return Err(AssemblyError::DuplicateAttribute {
                    attr: attr.attr_name.clone(),
                });
            }
        }
        if let Some(attr) = attributes.iter().find(|a| a.values.len() != index.len()) {
            return Err(AssemblyError::LengthMismatch {
                attr: attr.attr_name.clone(),
                index: index.len(),
                values: attr.values.len(),
            });
        }

        Ok(Self {
            entity_id,
            entity_type,
            index,
            attributes,
        })
    }

    pub fn entity_id(&self) -> Option<&str> {
        self.entity_id.as_deref()
    }

    pub fn entity_type(&self) -> Option<&str> {
        self.entity_type.as_deref()
    }

    pub fn index(&self) -> &[DateTime<Utc>] {
        &self.index
    }

    pub fn attributes(&self) -> &[AttributeValues] {
        &self.attributes
    }

    /// Find an attribute by name
    pub fn attribute(&self, name: &str) -> Option<&AttributeValues> {
        self.attributes.iter().find(|a| a.attr_name == name)
    }

    /// Number of samples
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    fn attr_names(&self) -> Vec<String> {
        self.attributes.iter().map(|a| a.attr_name.clone()).collect()
    }

    /// Append a later slice of the same logical series
    ///
    /// Attributes are matched by name and both series must carry the same
    /// attribute set. Entity identity is not checked here; callers decide
    /// which series a fragment belongs to.
    pub(crate) fn extend(&mut self, other: TimeSeries) -> Result<(), AssemblyError> {
        let mut names = self.attr_names();
        let mut other_names = other.attr_names();
        names.sort();
        other_names.sort();
        if names != other_names {
            return Err(AssemblyError::AttributeMismatch {
                expected: names,
                found: other_names,
            });
        }

        for incoming in other.attributes {
            if let Some(attr) = self
                .attributes
                .iter_mut()
                .find(|a| a.attr_name == incoming.attr_name)
            {
                attr.values.extend(incoming.values);
            }
        }
        self.index.extend(other.index);

        Ok(())
    }
}

/// Entity summary returned by the listing endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSeriesHeader {
    pub entity_id: String,
    pub entity_type: String,
    /// First and/or last recorded timestamp
    #[serde(default, deserialize_with = "deserialize_index")]
    pub index: Vec<DateTime<Utc>>,
}

/// Aggregation function applied by the service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggrMethod {
    Count,
    Sum,
    Avg,
    Min,
    Max,
}

impl AggrMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Count => "count",
            Self::Sum => "sum",
            Self::Avg => "avg",
            Self::Min => "min",
            Self::Max => "max",
        }
    }
}

impl std::str::FromStr for AggrMethod {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "count" => Ok(Self::Count),
            "sum" => Ok(Self::Sum),
            "avg" => Ok(Self::Avg),
            "min" => Ok(Self::Min),
            "max" => Ok(Self::Max),
            _ => Err(ValidationError::UnknownAggregation {
                kind: "aggregation method",
                value: s.to_string(),
            }),
        }
    }
}

/// Time bucket for aggregation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggrPeriod {
    Year,
    Month,
    Day,
    Hour,
    Minute,
    Second,
}

impl AggrPeriod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Year => "year",
            Self::Month => "month",
            Self::Day => "day",
            Self::Hour => "hour",
            Self::Minute => "minute",
            Self::Second => "second",
        }
    }
}

impl std::str::FromStr for AggrPeriod {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "year" => Ok(Self::Year),
            "month" => Ok(Self::Month),
            "day" => Ok(Self::Day),
            "hour" => Ok(Self::Hour),
            "minute" => Ok(Self::Minute),
            "second" => Ok(Self::Second),
            _ => Err(ValidationError::UnknownAggregation {
                kind: "aggregation period",
                value: s.to_string(),
            }),
        }
    }
}

/// Whether aggregation runs per entity or across all matched entities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggrScope {
    Entity,
    Global,
}

impl AggrScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Entity => "entity",
            Self::Global => "global",
        }
    }
}

impl std::str::FromStr for AggrScope {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "entity" => Ok(Self::Entity),
            "global" => Ok(Self::Global),
            _ => Err(ValidationError::UnknownAggregation {
                kind: "aggregation scope",
                value: s.to_string(),
            }),
        }
    }
}

macro_rules! impl_display_as_str {
    ($($ty:ty),*) => {
        $(impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        })*
    };
}

impl_display_as_str!(AggrMethod, AggrPeriod, AggrScope);

/// Parse an ISO-8601 timestamp; values without an offset are taken as UTC
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

/// Deserialize an `index` that may be a single timestamp or a list
pub(crate) fn deserialize_index<'de, D>(deserializer: D) -> Result<Vec<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(single) => vec![single],
        OneOrMany::Many(many) => many,
    };

    raw.iter()
        .map(|s| {
            parse_timestamp(s)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp '{}'", s)))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn ts(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn test_parse_timestamp_formats() {
        let expected = Utc.with_ymd_and_hms(2018, 1, 5, 15, 44, 34).unwrap();
        assert_eq!(parse_timestamp("2018-01-05T15:44:34+00:00"), Some(expected));
        assert_eq!(parse_timestamp("2018-01-05T16:44:34.000+01:00"), Some(expected));
        assert_eq!(parse_timestamp("2018-01-05T15:44:34"), Some(expected));
        assert_eq!(parse_timestamp("2018-01-05T15:44:34.000"), Some(expected));
        assert_eq!(parse_timestamp("yesterday"), None);
    }

    #[test]
    fn test_new_rejects_misaligned_values() {
        let err = TimeSeries::new(
            Some("Room1".into()),
            None,
            vec![ts(0), ts(1)],
            vec![AttributeValues::new("temperature", vec![json!(20.1)])],
        )
        .unwrap_err();
        assert_eq!(
            err,
            AssemblyError::LengthMismatch {
                attr: "temperature".into(),
                index: 2,
                values: 1,
            }
        );
    }

    #[test]
    fn test_new_rejects_duplicate_attribute() {
        let err = TimeSeries::new(
            Some("Room1".into()),
            None,
            vec![ts(0)],
            vec![
                AttributeValues::new("t", vec![json!(1)]),
                AttributeValues::new("t", vec![json!(101)]),
            ],
        )
        .unwrap_err();
        assert_eq!(err, AssemblyError::DuplicateAttribute { attr: "t".into() });
    }

    #[test]
    fn test_extend_appends_by_attribute_name() {
        let mut first = TimeSeries::new(
            Some("Room1".into()),
            None,
            vec![ts(0)],
            vec![
                AttributeValues::new("temperature", vec![json!(20.1)]),
                AttributeValues::new("pressure", vec![json!(720)]),
            ],
        )
        .unwrap();
        let second = TimeSeries::new(
            Some("Room1".into()),
            None,
            vec![ts(1), ts(2)],
            vec![
                AttributeValues::new("pressure", vec![json!(721), Value::Null]),
                AttributeValues::new("temperature", vec![json!(20.3), json!(20.4)]),
            ],
        )
        .unwrap();

        first.extend(second).unwrap();

        assert_eq!(first.len(), 3);
        assert_eq!(
            first.attribute("temperature").unwrap().values(),
            &[json!(20.1), json!(20.3), json!(20.4)]
        );
        assert_eq!(
            first.attribute("pressure").unwrap().values(),
            &[json!(720), json!(721), Value::Null]
        );
    }

    #[test]
    fn test_extend_rejects_different_attributes() {
        let mut first = TimeSeries::new(
            None,
            None,
            vec![ts(0)],
            vec![AttributeValues::new("temperature", vec![json!(1)])],
        )
        .unwrap();
        let second = TimeSeries::new(
            None,
            None,
            vec![ts(1)],
            vec![AttributeValues::new("humidity", vec![json!(1)])],
        )
        .unwrap();

        assert!(matches!(
            first.extend(second),
            Err(AssemblyError::AttributeMismatch { .. })
        ));
        assert_eq!(first.len(), 1);
    }

    #[test]
    fn test_header_accepts_single_or_list_index() {
        let single: TimeSeriesHeader = serde_json::from_value(json!({
            "entityId": "Room1",
            "entityType": "Room",
            "index": "2018-01-05T15:44:34"
        }))
        .unwrap();
        assert_eq!(single.index.len(), 1);

        let many: TimeSeriesHeader = serde_json::from_value(json!({
            "entityId": "Room2",
            "entityType": "Room",
            "index": ["2018-01-05T15:44:34", "2018-01-06T15:44:34"]
        }))
        .unwrap();
        assert_eq!(many.index.len(), 2);
    }

    #[test]
    fn test_aggregation_parsing() {
        assert_eq!("AVG".parse::<AggrMethod>().unwrap(), AggrMethod::Avg);
        assert_eq!("minute".parse::<AggrPeriod>().unwrap(), AggrPeriod::Minute);
        assert_eq!(AggrScope::Global.to_string(), "global");
        assert!("median".parse::<AggrMethod>().is_err());
    }

    #[test]
    fn test_serializes_camel_case() {
        let series = TimeSeries::new(
            Some("Room1".into()),
            Some("Room".into()),
            vec![ts(0)],
            vec![AttributeValues::new("temperature", vec![json!(21)])],
        )
        .unwrap();

        let value = serde_json::to_value(&series).unwrap();
        assert_eq!(value["entityId"], "Room1");
        assert_eq!(value["attributes"][0]["attrName"], "temperature");
        assert_eq!(value["index"][0], "1970-01-01T00:00:00Z");
    }
}
