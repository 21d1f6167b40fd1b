//! Demo workflow: reset schema, load samples, verify, run example searches
//!
//! Failure policy per step:
//! - schema reset: fatal, returned to the caller
//! - inserts, verification listing, searches: logged and skipped

use crate::client::VectorStore;
use crate::config::VectorDbConfig;
use crate::error::Result;
use crate::ingest::insert_all;
use crate::query::display::format_hits;
use crate::query::{SearchHit, SearchRequest, SearchResults};
use crate::samples;
use crate::schema::manager::reset_collection;
use crate::schema::presets::Preset;
use std::io::Write;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct DemoOptions {
    pub preset: Preset,
    pub settle: Duration,
    pub search_limit: usize,
    pub verify_limit: usize,
    pub snippet_chars: usize,
    pub verify_snippet_chars: usize,
}

impl From<&VectorDbConfig> for DemoOptions {
    fn from(config: &VectorDbConfig) -> Self {
        Self {
            preset: config.preset,
            settle: config.settle(),
            search_limit: config.output.search_limit,
            verify_limit: config.output.verify_limit,
            snippet_chars: config.output.snippet_chars,
            verify_snippet_chars: config.output.verify_snippet_chars,
        }
    }
}

#[derive(Debug, Default)]
pub struct DemoSummary {
    pub inserted: usize,
    pub failed_inserts: usize,
    pub listed: usize,
    /// Example query and the number of hits it produced
    pub searches: Vec<(String, usize)>,
}

pub fn projected_fields(preset: Preset) -> Vec<String> {
    preset
        .collection()
        .field_names()
        .into_iter()
        .map(|f| f.to_string())
        .collect()
}

/// Collection to query and fields to project. A named collection is read
/// with the preset's schema.
pub fn search_target(preset: Preset, collection: Option<String>) -> (String, Vec<String>) {
    let name = collection.unwrap_or_else(|| preset.name().to_string());
    (name, projected_fields(preset))
}

/// Run a search, logging any failure and returning no hits instead.
pub fn search_or_empty<S: VectorStore + ?Sized>(store: &S, request: &SearchRequest) -> SearchResults {
    match store.search(request) {
        Ok(results) => results,
        Err(e) => {
            warn!(
                operation = "search",
                collection = %request.collection,
                kind = e.kind(),
                error = %e,
                "Search failed"
            );
            SearchResults::empty()
        }
    }
}

/// Run one near-text search and print its hits to `out`.
pub fn search_and_print<S: VectorStore + ?Sized, W: Write>(
    store: &S,
    request: &SearchRequest,
    snippet_chars: usize,
    out: &mut W,
) -> std::io::Result<Vec<SearchHit>> {
    let hits: Vec<SearchHit> = search_or_empty(store, request).collect();
    writeln!(out, "\nSearch results for: '{}'", request.concepts.join(" "))?;
    writeln!(out, "{}", format_hits(&hits, snippet_chars, "No results found."))?;
    Ok(hits)
}

pub fn run_demo<S: VectorStore + ?Sized, W: Write>(
    store: &S,
    options: &DemoOptions,
    out: &mut W,
) -> Result<DemoSummary> {
    let collection = options.preset.collection();
    let fields = projected_fields(options.preset);
    let mut summary = DemoSummary::default();

    reset_collection(store, &collection, options.settle)?;
    writeln!(out, "Collection {} created successfully!", collection.name)?;

    let records = samples::records(options.preset);
    let report = insert_all(store, &collection, &records);
    summary.inserted = report.inserted.len();
    summary.failed_inserts = report.failed.len();
    if report.is_complete() {
        writeln!(out, "Sample data added successfully! ({} records)", summary.inserted)?;
    } else {
        writeln!(
            out,
            "Added {} of {} records; {} failed (see log)",
            summary.inserted,
            records.len(),
            summary.failed_inserts
        )?;
    }

    writeln!(out, "\nVerifying collection contents...")?;
    match store.fetch_objects(&collection.name, &fields, options.verify_limit) {
        Ok(results) => {
            let hits: Vec<SearchHit> = results.collect();
            summary.listed = hits.len();
            writeln!(out, "\nCurrent records in {}:", collection.name)?;
            writeln!(out, "{}", format_hits(&hits, options.verify_snippet_chars, "No records found."))?;
        }
        Err(e) => {
            warn!(operation = "verify", collection = %collection.name, error = %e, "Verification failed");
            writeln!(out, "Verification error: {}", e)?;
        }
    }

    writeln!(out, "\nRunning example searches...")?;
    let field_refs: Vec<&str> = fields.iter().map(|f| f.as_str()).collect();
    for query in samples::example_queries(options.preset) {
        let request = SearchRequest::new(&collection.name, *query, &field_refs, options.search_limit);
        let hits = search_and_print(store, &request, options.snippet_chars, out)?;
        summary.searches.push((query.to_string(), hits.len()));
    }

    info!(
        collection = %collection.name,
        inserted = summary.inserted,
        failed = summary.failed_inserts,
        listed = summary.listed,
        "Demo workflow finished"
    );
    Ok(summary)
}
