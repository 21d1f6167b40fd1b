//! Schema Manager - inspect, create, drop and recreate collections
//!
//! `reset_collection` is the destructive drop-and-recreate used by the demo;
//! `ensure_collection` is the idempotent variant for everything else.

use super::Collection;
use crate::client::{VectorStore, VectorStoreClient, describe_failure};
use crate::error::{Result, VectorDbError};
use reqwest::{Method, StatusCode};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info};

const POLL_INTERVAL: Duration = Duration::from_millis(250);

impl VectorStoreClient {
    pub(crate) fn schema_contains(&self, name: &str) -> Result<bool> {
        let response = self
            .request(Method::GET, &format!("/v1/schema/{}", name))?
            .send()
            .map_err(|e| VectorDbError::transport("check collection", e))?;

        match response.status() {
            s if s.is_success() => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            _ => Err(VectorDbError::Schema(format!(
                "checking collection '{}' failed: {}",
                name,
                describe_failure(response)
            ))),
        }
    }

    pub(crate) fn schema_delete(&self, name: &str) -> Result<()> {
        let response = self
            .request(Method::DELETE, &format!("/v1/schema/{}", name))?
            .send()
            .map_err(|e| VectorDbError::transport("delete collection", e))?;

        match response.status() {
            s if s.is_success() => {
                debug!(collection = %name, "Collection deleted");
                Ok(())
            }
            StatusCode::NOT_FOUND => {
                debug!(collection = %name, "Collection already absent");
                Ok(())
            }
            _ => Err(VectorDbError::Schema(format!(
                "deleting collection '{}' failed: {}",
                name,
                describe_failure(response)
            ))),
        }
    }

    pub(crate) fn schema_create(&self, collection: &Collection) -> Result<()> {
        collection.validate()?;

        let response = self
            .request(Method::POST, "/v1/schema")?
            .json(&collection.to_class_json())
            .send()
            .map_err(|e| VectorDbError::transport("create collection", e))?;

        if !response.status().is_success() {
            return Err(VectorDbError::Schema(format!(
                "creating collection '{}' failed: {}",
                collection.name,
                describe_failure(response)
            )));
        }

        info!(collection = %collection.name, vectorizer = %collection.vectorizer, "Collection created");
        Ok(())
    }
}

/// Poll until `name` is gone or `settle` elapses.
pub fn wait_until_deleted<S: VectorStore + ?Sized>(store: &S, name: &str, settle: Duration) -> Result<()> {
    let deadline = Instant::now() + settle;
    loop {
        if !store.collection_exists(name)? {
            return Ok(());
        }
        let now = Instant::now();
        if now >= deadline {
            return Err(VectorDbError::Schema(format!(
                "collection '{}' still present {:?} after deletion",
                name, settle
            )));
        }
        thread::sleep(POLL_INTERVAL.min(deadline - now));
    }
}

/// Create `collection` only if it is absent. Returns whether it was created.
pub fn ensure_collection<S: VectorStore + ?Sized>(store: &S, collection: &Collection) -> Result<bool> {
    if store.collection_exists(&collection.name)? {
        debug!(collection = %collection.name, "Collection already exists");
        return Ok(false);
    }
    store.create_collection(collection)?;
    Ok(true)
}

/// Drop `collection` if present, wait for the drop to settle, then create it again.
pub fn reset_collection<S: VectorStore + ?Sized>(
    store: &S,
    collection: &Collection,
    settle: Duration,
) -> Result<()> {
    collection.validate()?;

    if store.collection_exists(&collection.name)? {
        store.delete_collection(&collection.name)?;
        info!(collection = %collection.name, "Deleted existing collection");
        wait_until_deleted(store, &collection.name, settle)?;
    }

    store.create_collection(collection)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::tests::{connect_to, live_server};
    use crate::schema::presets;
    use mockito::Matcher;

    #[test]
    fn test_exists_maps_status() {
        let mut server = live_server();
        server.mock("GET", "/v1/schema/Article").with_status(200).with_body("{}").create();
        server.mock("GET", "/v1/schema/Missing").with_status(404).create();
        server.mock("GET", "/v1/schema/Broken").with_status(500).create();
        let client = connect_to(&server);

        assert!(client.collection_exists("Article").unwrap());
        assert!(!client.collection_exists("Missing").unwrap());
        assert!(matches!(client.collection_exists("Broken"), Err(VectorDbError::Schema(_))));
    }

    #[test]
    fn test_delete_missing_is_noop() {
        let mut server = live_server();
        let mock = server.mock("DELETE", "/v1/schema/Ghost").with_status(404).create();
        let client = connect_to(&server);

        assert!(client.delete_collection("Ghost").is_ok());
        mock.assert();
    }

    #[test]
    fn test_create_posts_class_document() {
        let mut server = live_server();
        let mock = server
            .mock("POST", "/v1/schema")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "class": "Article",
                "vectorizer": "text2vec-transformers",
            })))
            .with_status(200)
            .create();
        let client = connect_to(&server);

        client.create_collection(&presets::article()).unwrap();
        mock.assert();
    }

    #[test]
    fn test_create_existing_is_schema_error() {
        let mut server = live_server();
        server
            .mock("POST", "/v1/schema")
            .with_status(422)
            .with_body(r#"{"error":[{"message":"class name \"Article\" already exists"}]}"#)
            .create();
        let client = connect_to(&server);

        match client.create_collection(&presets::article()) {
            Err(VectorDbError::Schema(msg)) => assert!(msg.contains("already exists")),
            other => panic!("expected schema error, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_definition_never_reaches_server() {
        let mut server = live_server();
        let mock = server.mock("POST", "/v1/schema").expect(0).create();
        let client = connect_to(&server);

        let mut bad = presets::article();
        bad.name = "lower".to_string();
        assert!(matches!(client.create_collection(&bad), Err(VectorDbError::Schema(_))));
        mock.assert();
    }

    #[test]
    fn test_create_then_exists() {
        let mut server = live_server();
        server.mock("POST", "/v1/schema").with_status(200).create();
        server.mock("GET", "/v1/schema/Article").with_status(200).with_body("{}").create();
        let client = connect_to(&server);

        client.create_collection(&presets::article()).unwrap();
        assert!(client.collection_exists("Article").unwrap());
    }

    #[test]
    fn test_ensure_skips_existing() {
        let mut server = live_server();
        server.mock("GET", "/v1/schema/Article").with_status(200).with_body("{}").create();
        let create = server.mock("POST", "/v1/schema").expect(0).create();
        let client = connect_to(&server);

        assert!(!ensure_collection(&client, &presets::article()).unwrap());
        create.assert();
    }

    #[test]
    fn test_ensure_creates_missing() {
        let mut server = live_server();
        server.mock("GET", "/v1/schema/Article").with_status(404).create();
        let create = server.mock("POST", "/v1/schema").with_status(200).create();
        let client = connect_to(&server);

        assert!(ensure_collection(&client, &presets::article()).unwrap());
        create.assert();
    }

    #[test]
    fn test_reset_without_existing_only_creates() {
        let mut server = live_server();
        server.mock("GET", "/v1/schema/Article").with_status(404).create();
        let delete = server.mock("DELETE", "/v1/schema/Article").expect(0).create();
        let create = server.mock("POST", "/v1/schema").with_status(200).create();
        let client = connect_to(&server);

        reset_collection(&client, &presets::article(), Duration::ZERO).unwrap();
        delete.assert();
        create.assert();
    }

    #[test]
    fn test_reset_times_out_when_delete_never_settles() {
        let mut server = live_server();
        server.mock("GET", "/v1/schema/Article").with_status(200).with_body("{}").create();
        server.mock("DELETE", "/v1/schema/Article").with_status(200).create();
        let create = server.mock("POST", "/v1/schema").expect(0).create();
        let client = connect_to(&server);

        let result = reset_collection(&client, &presets::article(), Duration::ZERO);
        assert!(matches!(result, Err(VectorDbError::Schema(msg)) if msg.contains("still present")));
        create.assert();
    }
}
