//! Semantic Query Engine - near-text search over GraphQL
//!
//! Requests become `Get` queries against `POST /v1/graphql`. Hits are decoded
//! one at a time as [`SearchResults`] is iterated.

pub mod display;

use crate::client::{VectorStoreClient, describe_failure};
use crate::error::{Result, VectorDbError};
use crate::schema::{is_valid_collection_name, is_valid_field_name};
use reqwest::Method;
use serde_json::{Map, Value};
use tracing::debug;

/// A near-text query against one collection
#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    pub collection: String,
    pub concepts: Vec<String>,
    pub fields: Vec<String>,
    pub limit: usize,
    /// Also request `_additional { id distance }`
    pub with_additional: bool,
}

impl SearchRequest {
    pub fn new(collection: impl Into<String>, query: impl Into<String>, fields: &[&str], limit: usize) -> Self {
        Self {
            collection: collection.into(),
            concepts: vec![query.into()],
            fields: fields.iter().map(|f| f.to_string()).collect(),
            limit,
            with_additional: false,
        }
    }

    pub fn with_additional(mut self) -> Self {
        self.with_additional = true;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.limit == 0 {
            return Err(VectorDbError::Validation("search limit must be greater than zero".to_string()));
        }
        if self.concepts.iter().all(|c| c.trim().is_empty()) {
            return Err(VectorDbError::Query("search needs a non-empty concept".to_string()));
        }
        validate_projection(&self.collection, &self.fields)
    }

    /// Render the GraphQL document for this request.
    pub fn to_graphql(&self) -> String {
        // JSON string escaping is valid GraphQL string escaping.
        let concepts = serde_json::to_string(&self.concepts).unwrap_or_else(|_| "[]".to_string());
        format!(
            "{{ Get {{ {}(limit: {}, nearText: {{concepts: {}}}) {{ {} }} }} }}",
            self.collection,
            self.limit,
            concepts,
            selection(&self.fields, self.with_additional)
        )
    }
}

fn validate_projection(collection: &str, fields: &[String]) -> Result<()> {
    if !is_valid_collection_name(collection) {
        return Err(VectorDbError::Query(format!("invalid collection name '{}'", collection)));
    }
    if fields.is_empty() {
        return Err(VectorDbError::Query("at least one field must be projected".to_string()));
    }
    if let Some(bad) = fields.iter().find(|f| !is_valid_field_name(f)) {
        return Err(VectorDbError::Query(format!("invalid field name '{}'", bad)));
    }
    Ok(())
}

fn selection(fields: &[String], with_additional: bool) -> String {
    let mut selection = fields.join(" ");
    if with_additional {
        selection.push_str(" _additional { id distance }");
    }
    selection
}

fn list_graphql(collection: &str, fields: &[String], limit: usize) -> String {
    format!(
        "{{ Get {{ {}(limit: {}) {{ {} }} }} }}",
        collection,
        limit,
        selection(fields, false)
    )
}

/// One matched record with its projected fields
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub id: Option<String>,
    /// Vector distance reported by the server; smaller is closer
    pub distance: Option<f64>,
    pub properties: Map<String, Value>,
}

impl SearchHit {
    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.properties.get(field).and_then(|v| v.as_str())
    }

    fn from_value(value: Value) -> Self {
        let mut properties = match value {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        let additional = properties.remove("_additional");
        let id = additional
            .as_ref()
            .and_then(|a| a["id"].as_str())
            .map(|s| s.to_string());
        let distance = additional.as_ref().and_then(|a| a["distance"].as_f64());

        Self { id, distance, properties }
    }
}

/// Finite, single-pass sequence of hits in server ranking order
#[derive(Debug)]
pub struct SearchResults {
    items: std::iter::Take<std::vec::IntoIter<Value>>,
}

impl SearchResults {
    pub fn empty() -> Self {
        Self::from_raw(Vec::new(), 0)
    }

    /// Wrap raw result objects, keeping at most `limit` of them.
    pub fn from_raw(items: Vec<Value>, limit: usize) -> Self {
        Self {
            items: items.into_iter().take(limit),
        }
    }

    #[cfg(test)]
    pub fn from_hits(hits: Vec<SearchHit>) -> Self {
        let limit = hits.len();
        let raw = hits
            .into_iter()
            .map(|hit| {
                let mut map = hit.properties;
                if hit.id.is_some() || hit.distance.is_some() {
                    map.insert(
                        "_additional".to_string(),
                        serde_json::json!({ "id": hit.id, "distance": hit.distance }),
                    );
                }
                Value::Object(map)
            })
            .collect();
        Self::from_raw(raw, limit)
    }
}

impl Iterator for SearchResults {
    type Item = SearchHit;

    fn next(&mut self) -> Option<SearchHit> {
        self.items.next().map(SearchHit::from_value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.items.size_hint()
    }
}

impl ExactSizeIterator for SearchResults {}

/// Pull `data.Get.<collection>` out of a GraphQL response body.
pub(crate) fn parse_get_response(body: Value, collection: &str, limit: usize) -> Result<SearchResults> {
    if let Some(errors) = body.get("errors").and_then(|e| e.as_array()) {
        if !errors.is_empty() {
            let message = errors
                .iter()
                .filter_map(|e| e["message"].as_str())
                .collect::<Vec<_>>()
                .join("; ");
            return Err(VectorDbError::Query(format!("query on '{}' failed: {}", collection, message)));
        }
    }

    let items = match body.pointer(&format!("/data/Get/{}", collection)) {
        Some(Value::Array(items)) => items.clone(),
        _ => Vec::new(),
    };

    Ok(SearchResults::from_raw(items, limit))
}

impl VectorStoreClient {
    fn graphql(&self, query: String, collection: &str, limit: usize) -> Result<SearchResults> {
        debug!(collection = %collection, query = %query, "GraphQL request");

        let response = self
            .request(Method::POST, "/v1/graphql")?
            .json(&serde_json::json!({ "query": query }))
            .send()
            .map_err(|e| VectorDbError::transport("search", e))?;

        if response.status().is_server_error() {
            return Err(VectorDbError::Connection(format!(
                "search on '{}' failed: {}",
                collection,
                describe_failure(response)
            )));
        }
        if !response.status().is_success() {
            return Err(VectorDbError::Query(format!(
                "search on '{}' rejected: {}",
                collection,
                describe_failure(response)
            )));
        }

        let body: Value = response
            .json()
            .map_err(|e| VectorDbError::Query(format!("search on '{}' returned malformed JSON: {}", collection, e)))?;

        parse_get_response(body, collection, limit)
    }

    pub(crate) fn near_text(&self, request: &SearchRequest) -> Result<SearchResults> {
        request.validate()?;
        self.graphql(request.to_graphql(), &request.collection, request.limit)
    }

    pub(crate) fn list_objects(&self, collection: &str, fields: &[String], limit: usize) -> Result<SearchResults> {
        if limit == 0 {
            return Err(VectorDbError::Validation("listing limit must be greater than zero".to_string()));
        }
        validate_projection(collection, fields)?;
        self.graphql(list_graphql(collection, fields, limit), collection, limit)
    }
}
