//! Response Assembler
//!
//! Merges the ordered page bodies of a paged query back into logical
//! series. Pages are trusted to be sequential, non-overlapping slices:
//! samples are appended in page order with no sorting or deduplication.
//!
//! Multi-entity pages are merged either by entity identity (default) or by
//! position. Positional merging assumes every page lists the same entities
//! in the same order; if the service reorders them, samples silently land
//! in the wrong series.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use thiserror::Error;

use crate::timeseries::types::deserialize_index;
use crate::timeseries::{AttributeValues, TimeSeries, TimeSeriesHeader};

/// Errors raised when page bodies do not match the requested shape
///
/// `page` is the zero-based position of the page in fetch order.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AssemblyError {
    #[error("No pages to assemble")]
    NoPages,

    #[error("Page {page}: expected a JSON object")]
    NotAnObject { page: usize },

    #[error("Page {page}: missing field '{field}'")]
    MissingField { page: usize, field: &'static str },

    #[error("Page {page}: invalid field '{field}': {message}")]
    InvalidField {
        page: usize,
        field: &'static str,
        message: String,
    },

    #[error("Attribute '{attr}' has {values} values but the index has {index} entries")]
    LengthMismatch {
        attr: String,
        index: usize,
        values: usize,
    },

    #[error("Attribute '{attr}' listed more than once")]
    DuplicateAttribute { attr: String },

    #[error("Attribute set mismatch: expected {expected:?}, found {found:?}")]
    AttributeMismatch {
        expected: Vec<String>,
        found: Vec<String>,
    },

    #[error("Page {page}: entities {found:?} do not match first page {expected:?}")]
    EntitySetMismatch {
        page: usize,
        expected: Vec<String>,
        found: Vec<String>,
    },

    #[error("Page {page}: entity {entity} listed more than once")]
    DuplicateEntity { page: usize, entity: String },
}

/// How fragments of later pages are matched to series of the first page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MergeStrategy {
    /// Match by `entityId` + `entityType`; mismatched entity sets are an error
    #[default]
    Identity,
    /// Fragment *i* of every page extends series *i*
    Positional,
}

/// Which attributes a query asks for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeSelection {
    All,
    Single(String),
}

/// Whether the response carries metadata or values only
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Detail {
    Full,
    ValuesOnly,
}

/// One of the four response shapes per scope
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryShape {
    pub selection: AttributeSelection,
    pub detail: Detail,
}

impl QueryShape {
    /// Every attribute of the entity
    pub fn all(detail: Detail) -> Self {
        Self {
            selection: AttributeSelection::All,
            detail,
        }
    }

    /// A single named attribute
    pub fn attribute(name: impl Into<String>, detail: Detail) -> Self {
        Self {
            selection: AttributeSelection::Single(name.into()),
            detail,
        }
    }

    /// Endpoint suffix after `/v2/entities/{id}` or `/v2/types/{type}`
    pub fn path_suffix(&self) -> String {
        let mut suffix = String::new();
        if let AttributeSelection::Single(name) = &self.selection {
            suffix.push_str("/attrs/");
            suffix.push_str(&urlencoding::encode(name));
        }
        if self.detail == Detail::ValuesOnly {
            suffix.push_str("/value");
        }
        suffix
    }

    /// Field holding per-entity fragments in multi-entity responses
    fn fragments_field(&self) -> &'static str {
        match self.detail {
            Detail::Full => "entities",
            Detail::ValuesOnly => "values",
        }
    }
}

/// Identity of a series across pages
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct EntityKey {
    id: Option<String>,
    entity_type: Option<String>,
}

impl EntityKey {
    fn of(series: &TimeSeries) -> Self {
        Self {
            id: series.entity_id().map(str::to_string),
            entity_type: series.entity_type().map(str::to_string),
        }
    }
}

impl std::fmt::Display for EntityKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{}",
            self.id.as_deref().unwrap_or("?"),
            self.entity_type.as_deref().unwrap_or("?")
        )
    }
}

/// Builds series from raw page bodies
#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseAssembler {
    strategy: MergeStrategy,
}

impl ResponseAssembler {
    pub fn new(strategy: MergeStrategy) -> Self {
        Self { strategy }
    }

    pub fn strategy(&self) -> MergeStrategy {
        self.strategy
    }

    /// Assemble a single-entity response
    pub fn assemble_entity(
        &self,
        pages: Vec<Value>,
        shape: &QueryShape,
        entity_id: &str,
    ) -> Result<TimeSeries, AssemblyError> {
        let mut pages = pages.into_iter().enumerate();
        let (_, first) = pages.next().ok_or(AssemblyError::NoPages)?;

        let mut series = decode_entity(0, first, shape, entity_id)?;
        for (page, body) in pages {
            series.extend(decode_entity(page, body, shape, entity_id)?)?;
        }

        Ok(series)
    }

    /// Assemble a multi-entity response, one series per entity of the first page
    pub fn assemble_type(
        &self,
        pages: Vec<Value>,
        shape: &QueryShape,
        entity_type: &str,
    ) -> Result<Vec<TimeSeries>, AssemblyError> {
        let mut pages = pages.into_iter().enumerate();
        let (_, first) = pages.next().ok_or(AssemblyError::NoPages)?;

        let series = decode_fragments(0, first, shape, entity_type)?;
        let rest = pages.map(|(page, body)| {
            decode_fragments(page, body, shape, entity_type).map(|fragments| (page, fragments))
        });

        match self.strategy {
            MergeStrategy::Identity => merge_by_identity(series, rest),
            MergeStrategy::Positional => merge_positional(series, rest),
        }
    }

    /// Concatenate the entity headers of every listing page
    pub fn assemble_headers(&self, pages: Vec<Value>) -> Result<Vec<TimeSeriesHeader>, AssemblyError> {
        if pages.is_empty() {
            return Err(AssemblyError::NoPages);
        }

        let mut headers = Vec::new();
        for (page, body) in pages.into_iter().enumerate() {
            let batch: Vec<TimeSeriesHeader> =
                serde_json::from_value(body).map_err(|e| AssemblyError::InvalidField {
                    page,
                    field: "entities",
                    message: e.to_string(),
                })?;
            headers.extend(batch);
        }

        Ok(headers)
    }
}

fn merge_by_identity<I>(mut series: Vec<TimeSeries>, rest: I) -> Result<Vec<TimeSeries>, AssemblyError>
where
    I: Iterator<Item = Result<(usize, Vec<TimeSeries>), AssemblyError>>,
{
    let keys: Vec<EntityKey> = series.iter().map(EntityKey::of).collect();
    let mut positions: HashMap<EntityKey, usize> = HashMap::with_capacity(keys.len());
    for (i, key) in keys.iter().enumerate() {
        if positions.insert(key.clone(), i).is_some() {
            return Err(AssemblyError::DuplicateEntity {
                page: 0,
                entity: key.to_string(),
            });
        }
    }

    for next in rest {
        let (page, fragments) = next?;
        let found: Vec<EntityKey> = fragments.iter().map(EntityKey::of).collect();

        let mismatch = || AssemblyError::EntitySetMismatch {
            page,
            expected: keys.iter().map(ToString::to_string).collect(),
            found: found.iter().map(ToString::to_string).collect(),
        };

        if found.len() != keys.len() {
            return Err(mismatch());
        }

        let mut seen = vec![false; keys.len()];
        for (key, fragment) in found.iter().zip(fragments) {
            let i = *positions.get(key).ok_or_else(mismatch)?;
            if seen[i] {
                return Err(AssemblyError::DuplicateEntity {
                    page,
                    entity: key.to_string(),
                });
            }
            seen[i] = true;
            series[i].extend(fragment)?;
        }
    }

    Ok(series)
}

fn merge_positional<I>(mut series: Vec<TimeSeries>, rest: I) -> Result<Vec<TimeSeries>, AssemblyError>
where
    I: Iterator<Item = Result<(usize, Vec<TimeSeries>), AssemblyError>>,
{
    for next in rest {
        let (_, fragments) = next?;
        // Extra or missing fragments are dropped, as zip does
        for (target, fragment) in series.iter_mut().zip(fragments) {
            target.extend(fragment)?;
        }
    }

    Ok(series)
}

fn decode_entity(
    page: usize,
    body: Value,
    shape: &QueryShape,
    entity_id: &str,
) -> Result<TimeSeries, AssemblyError> {
    let mut body = into_object(page, body)?;

    let index = take_index(page, &mut body)?;
    let id = take_string(&mut body, "entityId").unwrap_or_else(|| entity_id.to_string());
    let entity_type = take_string(&mut body, "entityType");

    let attributes = match &shape.selection {
        AttributeSelection::All => take_attributes(page, &mut body)?,
        AttributeSelection::Single(name) => {
            let attr_name = match shape.detail {
                Detail::Full => take_string(&mut body, "attrName").unwrap_or_else(|| name.clone()),
                Detail::ValuesOnly => name.clone(),
            };
            vec![AttributeValues::new(attr_name, take_values(page, &mut body)?)]
        }
    };

    TimeSeries::new(Some(id), entity_type, index, attributes)
}

fn decode_fragments(
    page: usize,
    body: Value,
    shape: &QueryShape,
    entity_type: &str,
) -> Result<Vec<TimeSeries>, AssemblyError> {
    let mut body = into_object(page, body)?;

    let field = shape.fragments_field();
    let fragments = match body.remove(field) {
        Some(Value::Array(items)) => items,
        Some(_) => {
            return Err(AssemblyError::InvalidField {
                page,
                field,
                message: "expected an array".to_string(),
            })
        }
        None => return Err(AssemblyError::MissingField { page, field }),
    };

    let attr_name = match &shape.selection {
        AttributeSelection::All => None,
        AttributeSelection::Single(name) => Some(match shape.detail {
            Detail::Full => take_string(&mut body, "attrName").unwrap_or_else(|| name.clone()),
            Detail::ValuesOnly => name.clone(),
        }),
    };

    fragments
        .into_iter()
        .map(|fragment| {
            let mut fragment = into_object(page, fragment)?;
            let index = take_index(page, &mut fragment)?;
            let entity_id = take_string(&mut fragment, "entityId");

            let attributes = match &attr_name {
                None => take_attributes(page, &mut fragment)?,
                Some(name) => vec![AttributeValues::new(
                    name.clone(),
                    take_values(page, &mut fragment)?,
                )],
            };

            TimeSeries::new(entity_id, Some(entity_type.to_string()), index, attributes)
        })
        .collect()
}

fn into_object(page: usize, value: Value) -> Result<Map<String, Value>, AssemblyError> {
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(AssemblyError::NotAnObject { page }),
    }
}

fn take_string(map: &mut Map<String, Value>, field: &str) -> Option<String> {
    match map.remove(field) {
        Some(Value::String(s)) => Some(s),
        _ => None,
    }
}

#[derive(Deserialize)]
struct Index(#[serde(deserialize_with = "deserialize_index")] Vec<DateTime<Utc>>);

fn take_index(page: usize, map: &mut Map<String, Value>) -> Result<Vec<DateTime<Utc>>, AssemblyError> {
    let raw = map
        .remove("index")
        .ok_or(AssemblyError::MissingField { page, field: "index" })?;

    serde_json::from_value::<Index>(raw)
        .map(|Index(index)| index)
        .map_err(|e| AssemblyError::InvalidField {
            page,
            field: "index",
            message: e.to_string(),
        })
}

fn take_values(page: usize, map: &mut Map<String, Value>) -> Result<Vec<Value>, AssemblyError> {
    match map.remove("values") {
        Some(Value::Array(values)) => Ok(values),
        Some(_) => Err(AssemblyError::InvalidField {
            page,
            field: "values",
            message: "expected an array".to_string(),
        }),
        None => Err(AssemblyError::MissingField {
            page,
            field: "values",
        }),
    }
}

fn take_attributes(page: usize, map: &mut Map<String, Value>) -> Result<Vec<AttributeValues>, AssemblyError> {
    // Values-only entity responses name the list `values`
    let (field, raw) = match map.remove("attributes") {
        Some(raw) => ("attributes", raw),
        None => (
            "values",
            map.remove("values").ok_or(AssemblyError::MissingField {
                page,
                field: "attributes",
            })?,
        ),
    };

    serde_json::from_value(raw).map_err(|e| AssemblyError::InvalidField {
        page,
        field,
        message: e.to_string(),
    })
}
