//! In-process stand-in for the vector store service, used by workflow tests.
//!
//! Ranking counts query words that appear in a record's string fields, which
//! is enough to make near-text results deterministic.

use super::VectorStore;
use crate::error::{Result, VectorDbError};
use crate::ingest::{Record, RecordId, validate_record};
use crate::query::{SearchHit, SearchRequest, SearchResults};
use crate::schema::Collection;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Default)]
pub(crate) struct InMemoryStore {
    collections: RefCell<HashMap<String, (Collection, Vec<(RecordId, Record)>)>>,
    /// Number of `collection_exists` calls that still report a deleted collection
    delete_lag: Cell<usize>,
    lagging: RefCell<Option<String>>,
    /// Titles whose insert is rejected
    reject_titles: Vec<String>,
    pub(crate) ready: bool,
}

impl InMemoryStore {
    pub(crate) fn new() -> Self {
        Self {
            ready: true,
            ..Self::default()
        }
    }

    pub(crate) fn with_delete_lag(self, checks: usize) -> Self {
        self.delete_lag.set(checks);
        self
    }

    pub(crate) fn rejecting(mut self, title: &str) -> Self {
        self.reject_titles.push(title.to_string());
        self
    }

    pub(crate) fn record_count(&self, name: &str) -> usize {
        self.collections
            .borrow()
            .get(name)
            .map(|(_, records)| records.len())
            .unwrap_or(0)
    }

    fn hits(&self, name: &str, fields: &[String], limit: usize, query: Option<&str>) -> Result<SearchResults> {
        let collections = self.collections.borrow();
        let (_, records) = collections
            .get(name)
            .ok_or_else(|| VectorDbError::Query(format!("Cannot query field \"{}\" on type \"GetObjectsObj\".", name)))?;

        let words: Vec<String> = query
            .map(|q| q.to_lowercase().split_whitespace().map(|w| w.to_string()).collect())
            .unwrap_or_default();

        let mut scored: Vec<(usize, usize, &RecordId, &Record)> = records
            .iter()
            .enumerate()
            .map(|(pos, (id, record))| {
                let text = record
                    .properties
                    .values()
                    .filter_map(|v| v.as_str())
                    .collect::<Vec<_>>()
                    .join(" ")
                    .to_lowercase();
                let score = words.iter().filter(|w| text.contains(w.as_str())).count();
                (score, pos, id, record)
            })
            .collect();
        scored.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));

        let hits = scored
            .into_iter()
            .take(limit)
            .map(|(score, _, id, record)| SearchHit {
                id: Some(id.to_string()),
                distance: Some(1.0 / (score as f64 + 1.0)),
                properties: record
                    .properties
                    .iter()
                    .filter(|(k, _)| fields.contains(k))
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect(),
            })
            .collect();
        Ok(SearchResults::from_hits(hits))
    }
}

impl VectorStore for InMemoryStore {
    fn is_ready(&self) -> bool {
        self.ready
    }

    fn collection_exists(&self, name: &str) -> Result<bool> {
        if self.lagging.borrow().as_deref() == Some(name) && self.delete_lag.get() > 0 {
            self.delete_lag.set(self.delete_lag.get() - 1);
            return Ok(true);
        }
        Ok(self.collections.borrow().contains_key(name))
    }

    fn delete_collection(&self, name: &str) -> Result<()> {
        if self.collections.borrow_mut().remove(name).is_some() {
            *self.lagging.borrow_mut() = Some(name.to_string());
        }
        Ok(())
    }

    fn create_collection(&self, collection: &Collection) -> Result<()> {
        collection.validate()?;
        let mut collections = self.collections.borrow_mut();
        if collections.contains_key(&collection.name) {
            return Err(VectorDbError::Schema(format!("class name {} already exists", collection.name)));
        }
        collections.insert(collection.name.clone(), (collection.clone(), Vec::new()));
        Ok(())
    }

    fn insert_record(&self, collection: &Collection, record: &Record) -> Result<RecordId> {
        validate_record(collection, record)?;
        if let Some(title) = record.get_str("title") {
            if self.reject_titles.iter().any(|t| t == title) {
                return Err(VectorDbError::Validation(format!("rejected '{}'", title)));
            }
        }
        let mut collections = self.collections.borrow_mut();
        let (_, records) = collections
            .get_mut(&collection.name)
            .ok_or_else(|| VectorDbError::Validation(format!("class {} not found", collection.name)))?;
        let id = Uuid::new_v4();
        records.push((id, record.clone()));
        Ok(id)
    }

    fn search(&self, request: &SearchRequest) -> Result<SearchResults> {
        request.validate()?;
        let query = request.concepts.join(" ");
        self.hits(&request.collection, &request.fields, request.limit, Some(&query))
    }

    fn fetch_objects(&self, collection: &str, fields: &[String], limit: usize) -> Result<SearchResults> {
        self.hits(collection, fields, limit, None)
    }
}
