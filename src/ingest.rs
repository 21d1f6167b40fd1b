//! Record Ingestor - insert records one call at a time
//!
//! There is no batching and no rollback: a failed insert leaves earlier
//! inserts committed.

use crate::client::{VectorStore, VectorStoreClient, describe_failure};
use crate::error::{Result, VectorDbError};
use crate::schema::Collection;
use reqwest::Method;
use serde_json::{Map, Value};
use tracing::{debug, warn};
use uuid::Uuid;

pub type RecordId = Uuid;

/// Field values for one record
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    pub properties: Map<String, Value>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(field.into(), value.into());
        self
    }

    #[cfg(test)]
    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.properties.get(field).and_then(|v| v.as_str())
    }
}

/// Reject records that reference fields the collection does not declare.
pub fn validate_record(collection: &Collection, record: &Record) -> Result<()> {
    for field in record.properties.keys() {
        if !collection.has_field(field) {
            return Err(VectorDbError::Validation(format!(
                "field '{}' is not declared by collection '{}' (declared: {})",
                field,
                collection.name,
                collection.field_names().join(", ")
            )));
        }
    }
    Ok(())
}

impl VectorStoreClient {
    pub(crate) fn create_object(&self, collection: &Collection, record: &Record) -> Result<RecordId> {
        validate_record(collection, record)?;

        let id = Uuid::new_v4();
        let body = serde_json::json!({
            "class": collection.name,
            "id": id.to_string(),
            "properties": record.properties,
        });

        let response = self
            .request(Method::POST, "/v1/objects")?
            .json(&body)
            .send()
            .map_err(|e| VectorDbError::transport("insert record", e))?;

        if !response.status().is_success() {
            return Err(VectorDbError::Validation(format!(
                "inserting into '{}' rejected: {}",
                collection.name,
                describe_failure(response)
            )));
        }

        debug!(collection = %collection.name, id = %id, "Record inserted");
        Ok(id)
    }
}

/// Per-record outcome of [`insert_all`]
#[derive(Debug, Default)]
pub struct IngestReport {
    pub inserted: Vec<RecordId>,
    /// Index into the input slice and the error it produced
    pub failed: Vec<(usize, VectorDbError)>,
}

impl IngestReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Insert every record independently, collecting failures instead of stopping.
pub fn insert_all<S: VectorStore + ?Sized>(store: &S, collection: &Collection, records: &[Record]) -> IngestReport {
    let mut report = IngestReport::default();

    for (index, record) in records.iter().enumerate() {
        match store.insert_record(collection, record) {
            Ok(id) => report.inserted.push(id),
            Err(e) => {
                warn!(collection = %collection.name, index, error = %e, "Insert failed");
                report.failed.push((index, e));
            }
        }
    }

    report
}
