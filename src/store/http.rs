//! HTTP record store
//!
//! REST client for the platform's OData-style table endpoint:
//! - `GET  {base}/{entity_set}?$select=..&$top=..` to query
//! - `POST {base}/{entity_set}` to create
//! - `PATCH {base}/{entity_set}({id})` to update
//!
//! Columns on the wire carry a tenant prefix (e.g. `cr1d7_sleepscore`);
//! it is added on the way out and stripped on the way in.

use super::*;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde_json::{Map, Value};

/// REST client for the remote record store
pub struct HttpRecordStore {
    client: Client,
    config: HttpStoreConfig,
}

/// Configuration for the HTTP record store
#[derive(Debug, Clone)]
pub struct HttpStoreConfig {
    /// Base URL of the data API (e.g., "https://org.example.com/api/data/v9.2")
    pub base_url: String,
    /// Table (entity set) name
    pub entity_set: String,
    /// Tenant column prefix, prepended to every logical column name
    pub column_prefix: String,
    /// Bearer token, if the endpoint requires one
    pub token: Option<String>,
    /// Request timeout in milliseconds
    pub request_timeout_ms: u64,
}

impl Default for HttpStoreConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080/api/data/v9.2".to_string(),
            entity_set: "cr1d7_healthmetrics".to_string(),
            column_prefix: "cr1d7_".to_string(),
            token: None,
            request_timeout_ms: 10_000,
        }
    }
}

impl HttpRecordStore {
    /// Create a new store client with the given configuration
    pub fn new(config: HttpStoreConfig) -> StoreResult<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_millis(config.request_timeout_ms))
            .build()?;

        Ok(Self { client, config })
    }

    /// Get the current configuration
    pub fn config(&self) -> &HttpStoreConfig {
        &self.config
    }

    fn collection_url(&self) -> String {
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            self.config.entity_set
        )
    }

    fn record_url(&self, id: &str) -> String {
        format!("{}({})", self.collection_url(), urlencoding::encode(id))
    }

    fn column(&self, field: Field) -> String {
        format!("{}{}", self.config.column_prefix, field.wire_name())
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.config.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Build the `$select`/`$top`/`$orderby` parameters for a query
    fn query_params(&self, options: &QueryOptions) -> Vec<(&'static str, String)> {
        let select = options
            .select
            .iter()
            .map(|f| self.column(*f))
            .collect::<Vec<_>>()
            .join(",");

        let mut params = vec![("$select", select), ("$top", options.top.to_string())];
        if let Some(order) = options.order_by {
            let direction = if order.descending { "desc" } else { "asc" };
            params.push(("$orderby", format!("{} {}", self.column(order.field), direction)));
        }
        params
    }

    /// Add the tenant prefix to every key of a serialized record
    fn encode(&self, record: &HealthMetricRecord) -> StoreResult<Value> {
        let Value::Object(map) = serde_json::to_value(record)? else {
            return Err(StoreError::Decode("record did not serialize to an object".into()));
        };

        let prefixed: Map<String, Value> = map
            .into_iter()
            .filter(|(k, _)| k != Field::Id.wire_name())
            .map(|(k, v)| (format!("{}{}", self.config.column_prefix, k), v))
            .collect();

        Ok(Value::Object(prefixed))
    }

    /// Strip the tenant prefix from a returned row and decode it
    fn decode(&self, row: Value) -> StoreResult<HealthMetricRecord> {
        let Value::Object(map) = row else {
            return Err(StoreError::Decode("row is not an object".into()));
        };

        let prefix = self.config.column_prefix.as_str();
        let stripped: Map<String, Value> = map
            .into_iter()
            .filter_map(|(k, v)| {
                // OData annotations (`@odata.etag`, ...) are not columns
                if k.starts_with('@') {
                    return None;
                }
                let key = k
                    .strip_prefix(prefix)
                    .map(str::to_string)
                    .unwrap_or_else(|| k.clone());
                Some((key, v))
            })
            .collect();

        Ok(serde_json::from_value(Value::Object(stripped))?)
    }

    /// Decode a collection response: `{"value": [...]}` or `{"data": [...]}`
    fn decode_collection(&self, body: Value) -> StoreResult<Vec<HealthMetricRecord>> {
        let rows = match body {
            Value::Object(mut map) => map
                .remove("value")
                .or_else(|| map.remove("data"))
                .ok_or_else(|| StoreError::Decode("missing `value` array".into()))?,
            Value::Array(rows) => Value::Array(rows),
            _ => return Err(StoreError::Decode("unexpected response shape".into())),
        };

        match rows {
            Value::Array(rows) => rows.into_iter().map(|r| self.decode(r)).collect(),
            Value::Null => Ok(Vec::new()),
            _ => Err(StoreError::Decode("`value` is not an array".into())),
        }
    }

    /// Read a single-record body, falling back when the store returned none
    async fn read_record(
        &self,
        response: Response,
        fallback: HealthMetricRecord,
    ) -> StoreResult<HealthMetricRecord> {
        let text = response.text().await.map_err(map_send_error)?;
        if text.trim().is_empty() {
            return Ok(fallback);
        }
        let value: Value = serde_json::from_str(&text)?;
        self.decode(value)
    }
}

/// Classify a transport error
fn map_send_error(e: reqwest::Error) -> StoreError {
    if e.is_timeout() {
        StoreError::Timeout
    } else if e.is_connect() {
        StoreError::Unavailable
    } else {
        StoreError::Request(e)
    }
}

/// Turn a non-success response into an error
async fn error_for_status(response: Response) -> StoreResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    Err(match status.as_u16() {
        404 => StoreError::NotFound(text),
        400 | 422 => StoreError::Rejected(text),
        code => StoreError::Api {
            status: code,
            message: text,
        },
    })
}

#[async_trait]
impl RecordStore for HttpRecordStore {
    fn name(&self) -> &str {
        "http"
    }

    async fn query(&self, options: &QueryOptions) -> StoreResult<Vec<HealthMetricRecord>> {
        let request = self
            .client
            .get(self.collection_url())
            .query(&self.query_params(options));

        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(map_send_error)?;
        let response = error_for_status(response).await?;

        let body: Value = response.json().await.map_err(map_send_error)?;
        let mut records = self.decode_collection(body)?;

        // Some gateways ignore $top
        records.truncate(options.top);

        tracing::debug!(
            entity_set = %self.config.entity_set,
            rows = records.len(),
            "Queried record store"
        );
        Ok(records)
    }

    async fn create(&self, record: &HealthMetricRecord) -> StoreResult<HealthMetricRecord> {
        let body = self.encode(record)?;
        let request = self
            .client
            .post(self.collection_url())
            .header("Prefer", "return=representation")
            .json(&body);

        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(map_send_error)?;
        let response = error_for_status(response).await?;

        self.read_record(response, record.clone()).await
    }

    async fn update(
        &self,
        id: &str,
        partial: &HealthMetricRecord,
    ) -> StoreResult<HealthMetricRecord> {
        let body = self.encode(partial)?;
        let request = self
            .client
            .patch(self.record_url(id))
            .header("Prefer", "return=representation")
            .json(&body);

        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(map_send_error)?;
        let response = error_for_status(response).await?;

        let mut fallback = partial.clone();
        fallback.id = Some(id.to_string());
        self.read_record(response, fallback).await
    }

    async fn health_check(&self) -> StoreResult<()> {
        let options = QueryOptions::new(&[Field::Date], 1);
        self.query(&options).await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use httpmock::Method::PATCH;
    use serde_json::json;

    fn store_for(server: &MockServer) -> HttpRecordStore {
        HttpRecordStore::new(HttpStoreConfig {
            base_url: server.url("/api/data/v9.2"),
            token: Some("secret".to_string()),
            ..HttpStoreConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn test_default_config() {
        let config = HttpStoreConfig::default();
        assert_eq!(config.entity_set, "cr1d7_healthmetrics");
        assert_eq!(config.column_prefix, "cr1d7_");
        assert!(config.token.is_none());
    }

    #[test]
    fn test_query_params() {
        let store = HttpRecordStore::new(HttpStoreConfig::default()).unwrap();
        let options = QueryOptions::new(&HISTORY_FIELDS, 7).order_by(OrderBy::date_desc());
        let params = store.query_params(&options);

        assert_eq!(
            params[0],
            (
                "$select",
                "cr1d7_date,cr1d7_calorie,cr1d7_sleepscore,cr1d7_readinessscore".to_string()
            )
        );
        assert_eq!(params[1], ("$top", "7".to_string()));
        assert_eq!(params[2], ("$orderby", "cr1d7_date desc".to_string()));
    }

    #[test]
    fn test_encode_prefixes_and_drops_id() {
        let store = HttpRecordStore::new(HttpStoreConfig::default()).unwrap();
        let body = store
            .encode(&HealthMetricRecord::new().id("r1").sleep_score("90"))
            .unwrap();
        assert_eq!(body, json!({ "cr1d7_sleepscore": "90" }));
    }

    #[tokio::test]
    async fn test_query_strips_prefix() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/api/data/v9.2/cr1d7_healthmetrics")
                    .query_param("$top", "10")
                    .header("authorization", "Bearer secret");
                then.status(200).json_body(json!({
                    "@odata.context": "ignored",
                    "value": [
                        {
                            "@odata.etag": "W/\"1\"",
                            "cr1d7_healthmetricid": "r1",
                            "cr1d7_date": "2026-10-16T06:00:00Z",
                            "cr1d7_sleepscore": "92"
                        },
                        { "cr1d7_healthmetricid": "r2", "cr1d7_calorie": 2100 }
                    ]
                }));
            })
            .await;

        let store = store_for(&server);
        let rows = store
            .query(&QueryOptions::new(&TODAY_FIELDS, 10))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].id.as_deref(), Some("r1"));
        assert_eq!(rows[0].sleep_score, Some(FieldValue::from("92")));
        assert_eq!(rows[1].calories, Some(FieldValue::Number(2100.0)));
    }

    #[tokio::test]
    async fn test_query_accepts_numeric_metric_name() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/api/data/v9.2/cr1d7_healthmetrics");
                then.status(200).json_body(json!({
                    "value": [{
                        "cr1d7_healthmetricid": "r1",
                        "cr1d7_date": "2026-10-16T06:00:00Z",
                        "cr1d7_sleepscore": "92",
                        "cr1d7_metricname": 2026
                    }]
                }));
            })
            .await;

        let store = store_for(&server);
        let rows = store
            .query(&QueryOptions::new(&TODAY_FIELDS, 10))
            .await
            .unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].sleep_score, Some(FieldValue::from("92")));
        assert_eq!(rows[0].metric_name, Some(FieldValue::Number(2026.0)));
    }

    #[tokio::test]
    async fn test_query_api_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/api/data/v9.2/cr1d7_healthmetrics");
                then.status(500).body("boom");
            })
            .await;

        let store = store_for(&server);
        let err = store
            .query(&QueryOptions::new(&TODAY_FIELDS, 10))
            .await
            .unwrap_err();

        assert!(matches!(err, StoreError::Api { status: 500, .. }));
    }

    #[tokio::test]
    async fn test_query_rejects_bad_shape() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/api/data/v9.2/cr1d7_healthmetrics");
                then.status(200).json_body(json!({ "rows": [] }));
            })
            .await;

        let store = store_for(&server);
        let err = store
            .query(&QueryOptions::new(&TODAY_FIELDS, 10))
            .await
            .unwrap_err();

        assert!(matches!(err, StoreError::Decode(_)));
    }

    #[tokio::test]
    async fn test_create_returns_representation() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/api/data/v9.2/cr1d7_healthmetrics")
                    .header("prefer", "return=representation")
                    .json_body(json!({ "cr1d7_protein": "130" }));
                then.status(201).json_body(json!({
                    "cr1d7_healthmetricid": "new-id",
                    "cr1d7_protein": "130"
                }));
            })
            .await;

        let store = store_for(&server);
        let created = store
            .create(&HealthMetricRecord::new().protein("130"))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(created.id.as_deref(), Some("new-id"));
    }

    #[tokio::test]
    async fn test_update_without_body_echoes_partial() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(PATCH)
                    .path("/api/data/v9.2/cr1d7_healthmetrics(r1)");
                then.status(204);
            })
            .await;

        let store = store_for(&server);
        let updated = store
            .update("r1", &HealthMetricRecord::new().fat("70"))
            .await
            .unwrap();

        assert_eq!(updated.id.as_deref(), Some("r1"));
        assert_eq!(updated.fat, Some(FieldValue::from("70")));
    }

    #[tokio::test]
    async fn test_update_not_found() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(PATCH)
                    .path("/api/data/v9.2/cr1d7_healthmetrics(missing)");
                then.status(404).body("no such record");
            })
            .await;

        let store = store_for(&server);
        let err = store
            .update("missing", &HealthMetricRecord::new().fat("70"))
            .await
            .unwrap_err();

        assert!(matches!(err, StoreError::NotFound(_)));
    }
}
