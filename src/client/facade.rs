//! Query Facade
//!
//! One method per history endpoint. Each runs the paged fetch, then hands
//! the collected pages to the assembler for its response shape.
//!
//! | Scope | Shape | Endpoint |
//! |---|---|---|
//! | entity | all attributes | `/v2/entities/{id}` |
//! | entity | all attributes, values only | `/v2/entities/{id}/value` |
//! | entity | one attribute | `/v2/entities/{id}/attrs/{attr}` |
//! | entity | one attribute, values only | `/v2/entities/{id}/attrs/{attr}/value` |
//! | type | (same four shapes) | `/v2/types/{type}...` |

use serde_json::Value;

use crate::client::QueryOptions;
use crate::error::{require_non_empty, QueryError, QueryResult};
use crate::pagination::{fetch_pages, PageFetcher, PageSequencer, DEFAULT_PAGE_SIZE};
use crate::timeseries::{
    Detail, MergeStrategy, QueryShape, ResponseAssembler, TimeSeries, TimeSeriesHeader,
};

/// Paged history queries over any [`PageFetcher`]
pub struct QueryFacade<F> {
    fetcher: F,
    assembler: ResponseAssembler,
    page_size: u64,
}

impl<F: PageFetcher> QueryFacade<F> {
    pub fn new(fetcher: F) -> Self {
        Self {
            fetcher,
            assembler: ResponseAssembler::default(),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Records requested per page (at least 1)
    pub fn with_page_size(mut self, page_size: u64) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn with_merge_strategy(mut self, strategy: MergeStrategy) -> Self {
        self.assembler = ResponseAssembler::new(strategy);
        self
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    pub fn page_size(&self) -> u64 {
        self.page_size
    }

    async fn collect(&self, path: &str, options: &QueryOptions) -> QueryResult<Vec<Value>> {
        options.validate()?;
        let sequencer = PageSequencer::with_page_size(options.limit, options.offset, self.page_size);
        fetch_pages(&self.fetcher, path, &options.to_params(), sequencer).await
    }

    async fn entity_series(
        &self,
        entity_id: &str,
        shape: QueryShape,
        options: &QueryOptions,
    ) -> QueryResult<TimeSeries> {
        require_non_empty(entity_id, "entity_id")?;
        let path = format!(
            "/v2/entities/{}{}",
            urlencoding::encode(entity_id),
            shape.path_suffix()
        );

        let pages = self.collect(&path, options).await?;
        self.assembler
            .assemble_entity(pages, &shape, entity_id)
            .map_err(|source| QueryError::Assembly {
                endpoint: path,
                source,
            })
    }

    async fn type_series(
        &self,
        entity_type: &str,
        shape: QueryShape,
        options: &QueryOptions,
    ) -> QueryResult<Vec<TimeSeries>> {
        require_non_empty(entity_type, "entity_type")?;
        let path = format!(
            "/v2/types/{}{}",
            urlencoding::encode(entity_type),
            shape.path_suffix()
        );

        let options = options.clone().entity_type(entity_type);
        let pages = self.collect(&path, &options).await?;
        self.assembler
            .assemble_type(pages, &shape, entity_type)
            .map_err(|source| QueryError::Assembly {
                endpoint: path,
                source,
            })
    }

    /// Entities with their type and last update
    pub async fn list_entities(&self, options: &QueryOptions) -> QueryResult<Vec<TimeSeriesHeader>> {
        let path = "/v2/entities";
        let pages = self.collect(path, options).await?;
        self.assembler
            .assemble_headers(pages)
            .map_err(|source| QueryError::Assembly {
                endpoint: path.to_string(),
                source,
            })
    }

    /// History of all attributes of one entity
    pub async fn entity_by_id(&self, entity_id: &str, options: &QueryOptions) -> QueryResult<TimeSeries> {
        self.entity_series(entity_id, QueryShape::all(Detail::Full), options)
            .await
    }

    /// History of all attributes of one entity, values only
    pub async fn entity_values_by_id(
        &self,
        entity_id: &str,
        options: &QueryOptions,
    ) -> QueryResult<TimeSeries> {
        self.entity_series(entity_id, QueryShape::all(Detail::ValuesOnly), options)
            .await
    }

    /// History of one attribute of one entity
    pub async fn entity_attr_by_id(
        &self,
        entity_id: &str,
        attr_name: &str,
        options: &QueryOptions,
    ) -> QueryResult<TimeSeries> {
        require_non_empty(attr_name, "attr_name")?;
        self.entity_series(entity_id, QueryShape::attribute(attr_name, Detail::Full), options)
            .await
    }

    /// History of one attribute of one entity, values only
    pub async fn entity_attr_values_by_id(
        &self,
        entity_id: &str,
        attr_name: &str,
        options: &QueryOptions,
    ) -> QueryResult<TimeSeries> {
        require_non_empty(attr_name, "attr_name")?;
        self.entity_series(
            entity_id,
            QueryShape::attribute(attr_name, Detail::ValuesOnly),
            options,
        )
        .await
    }

    /// History of all attributes of every entity of a type
    pub async fn entity_by_type(
        &self,
        entity_type: &str,
        options: &QueryOptions,
    ) -> QueryResult<Vec<TimeSeries>> {
        self.type_series(entity_type, QueryShape::all(Detail::Full), options)
            .await
    }

    /// History of all attributes of every entity of a type, values only
    pub async fn entity_values_by_type(
        &self,
        entity_type: &str,
        options: &QueryOptions,
    ) -> QueryResult<Vec<TimeSeries>> {
        self.type_series(entity_type, QueryShape::all(Detail::ValuesOnly), options)
            .await
    }

    /// History of one attribute of every entity of a type
    pub async fn entity_attr_by_type(
        &self,
        entity_type: &str,
        attr_name: &str,
        options: &QueryOptions,
    ) -> QueryResult<Vec<TimeSeries>> {
        require_non_empty(attr_name, "attr_name")?;
        self.type_series(entity_type, QueryShape::attribute(attr_name, Detail::Full), options)
            .await
    }

    /// History of one attribute of every entity of a type, values only
    pub async fn entity_attr_values_by_type(
        &self,
        entity_type: &str,
        attr_name: &str,
        options: &QueryOptions,
    ) -> QueryResult<Vec<TimeSeries>> {
        require_non_empty(attr_name, "attr_name")?;
        self.type_series(
            entity_type,
            QueryShape::attribute(attr_name, Detail::ValuesOnly),
            options,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;
    use crate::pagination::testing::ScriptedFetcher;
    use crate::pagination::FetchError;
    use crate::timeseries::AssemblyError;
    use serde_json::json;

    fn stamps(start: usize, len: usize) -> Vec<String> {
        (start..start + len)
            .map(|i| format!("2021-06-10T09:{:02}:00", i))
            .collect()
    }

    fn attr_page(start: usize, len: usize) -> Value {
        let values: Vec<usize> = (start..start + len).collect();
        json!({
            "entityId": "Room1",
            "attrName": "temperature",
            "index": stamps(start, len),
            "values": values
        })
    }

    #[tokio::test]
    async fn test_entity_attr_paged_and_merged() {
        let fetcher = ScriptedFetcher::pages(vec![attr_page(0, 5), attr_page(5, 5), attr_page(10, 2)]);
        let facade = QueryFacade::new(fetcher);

        let series = facade
            .entity_attr_by_id("Room1", "temperature", &QueryOptions::new().limit(12))
            .await
            .unwrap();

        assert_eq!(series.len(), 12);
        assert_eq!(series.attributes()[0].values().len(), 12);
        assert_eq!(series.attributes()[0].values()[11], json!(11));

        let calls = facade.fetcher().calls();
        assert_eq!(calls.len(), 3);
        assert_eq!(calls[0].path, "/v2/entities/Room1/attrs/temperature");
        assert_eq!(calls[2].param("offset"), Some("10"));
    }

    #[tokio::test]
    async fn test_unbounded_query_stops_at_sentinel() {
        let fetcher = ScriptedFetcher::pages(vec![attr_page(0, 5), attr_page(5, 3)]);
        let facade = QueryFacade::new(fetcher);

        let series = facade
            .entity_attr_values_by_id("Room1", "temperature", &QueryOptions::new())
            .await
            .unwrap();

        assert_eq!(series.len(), 8);
        assert_eq!(facade.fetcher().calls().len(), 3);
        assert_eq!(facade.fetcher().calls()[0].path, "/v2/entities/Room1/attrs/temperature/value");
    }

    #[tokio::test]
    async fn test_not_found_on_first_page_raises() {
        let facade = QueryFacade::new(ScriptedFetcher::new(vec![Err(FetchError::NotFound(
            "No records were found for such query.".into(),
        ))]));

        let err = facade
            .entity_by_id("Room1", &QueryOptions::new())
            .await
            .unwrap_err();
        assert!(matches!(err, QueryError::Fetch { offset: 0, .. }));
    }

    #[tokio::test]
    async fn test_type_query_sends_type_and_merges() {
        let page = |start: usize| {
            json!({
                "entityType": "Room",
                "entities": [
                    { "entityId": "E1", "index": stamps(start, 1), "attributes": [{ "attrName": "temperature", "values": [start] }] },
                    { "entityId": "E2", "index": stamps(start, 1), "attributes": [{ "attrName": "temperature", "values": [start + 100] }] }
                ]
            })
        };
        let facade = QueryFacade::new(ScriptedFetcher::pages(vec![page(0), page(1)])).with_page_size(2);

        let series = facade
            .entity_by_type("Room", &QueryOptions::new().id("E1,E2"))
            .await
            .unwrap();

        assert_eq!(series.len(), 2);
        assert_eq!(
            series[1].attribute("temperature").unwrap().values(),
            &[json!(100), json!(101)]
        );

        let calls = facade.fetcher().calls();
        assert_eq!(calls[0].path, "/v2/types/Room");
        assert_eq!(calls[0].param("type"), Some("Room"));
        assert_eq!(calls[0].param("id"), Some("E1,E2"));
        assert_eq!(calls[1].param("offset"), Some("2"));
    }

    #[tokio::test]
    async fn test_positional_strategy_configurable() {
        let page = |first: &str, second: &str, value: i64| {
            json!({
                "values": [
                    { "entityId": first, "index": stamps(value as usize, 1), "attributes": [{ "attrName": "t", "values": [value] }] },
                    { "entityId": second, "index": stamps(value as usize, 1), "attributes": [{ "attrName": "t", "values": [value + 10] }] }
                ]
            })
        };
        let pages = || vec![page("E1", "E2", 1), page("E2", "E1", 2)];

        let positional = QueryFacade::new(ScriptedFetcher::pages(pages()))
            .with_merge_strategy(MergeStrategy::Positional);
        let series = positional
            .entity_values_by_type("Room", &QueryOptions::new())
            .await
            .unwrap();
        assert_eq!(series[0].attribute("t").unwrap().values(), &[json!(1), json!(2)]);

        let identity = QueryFacade::new(ScriptedFetcher::pages(pages()));
        let series = identity
            .entity_values_by_type("Room", &QueryOptions::new())
            .await
            .unwrap();
        assert_eq!(series[0].attribute("t").unwrap().values(), &[json!(1), json!(12)]);
    }

    #[tokio::test]
    async fn test_assembly_error_names_endpoint() {
        let facade = QueryFacade::new(ScriptedFetcher::pages(vec![json!({ "entities": "oops" })]));

        let err = facade
            .entity_attr_values_by_type("Room", "temperature", &QueryOptions::new())
            .await
            .unwrap_err();
        match err {
            QueryError::Assembly { endpoint, source } => {
                assert_eq!(endpoint, "/v2/types/Room/attrs/temperature/value");
                assert_eq!(source, AssemblyError::MissingField { page: 0, field: "values" });
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_validation_happens_before_fetch() {
        let facade = QueryFacade::new(ScriptedFetcher::pages(Vec::new()));

        let err = facade
            .entity_attr_by_type("Room", "", &QueryOptions::new())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            QueryError::Validation(ValidationError::MissingValue("attr_name"))
        ));

        let mut options = QueryOptions::new();
        options.georel = Some("near;maxDistance:10".into());
        let err = facade.entity_by_id("Room1", &options).await.unwrap_err();
        assert!(matches!(err, QueryError::Validation(_)));

        assert!(facade.fetcher().calls().is_empty());
    }

    #[tokio::test]
    async fn test_list_entities() {
        let facade = QueryFacade::new(ScriptedFetcher::pages(vec![json!([
            { "entityId": "Room1", "entityType": "Room", "index": "2021-06-10T09:00:00" }
        ])]));

        let headers = facade
            .list_entities(&QueryOptions::new().entity_type("Room"))
            .await
            .unwrap();
        assert_eq!(headers.len(), 1);
        assert_eq!(headers[0].entity_type, "Room");
        assert_eq!(facade.fetcher().calls()[0].path, "/v2/entities");
    }

    #[tokio::test]
    async fn test_entity_id_is_encoded() {
        let facade = QueryFacade::new(ScriptedFetcher::pages(vec![json!({
            "index": stamps(0, 1),
            "attributes": []
        })]));

        facade
            .entity_by_id("urn:ngsi-ld:Room:1", &QueryOptions::new().limit(1))
            .await
            .unwrap();
        assert_eq!(facade.fetcher().calls()[0].path, "/v2/entities/urn%3Angsi-ld%3ARoom%3A1");
    }
}
