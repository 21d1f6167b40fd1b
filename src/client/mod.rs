//! Connection Manager - blocking HTTP handle to a Weaviate-compatible service
//!
//! [`VectorStoreClient`] owns the transport. Schema, ingest and query
//! operations are implemented on it in their own modules and exposed
//! together through the [`VectorStore`] trait.

#[cfg(test)]
pub(crate) mod memory;

use crate::config::VectorDbConfig;
use crate::error::{Result, VectorDbError};
use crate::ingest::{Record, RecordId};
use crate::query::{SearchRequest, SearchResults};
use crate::schema::Collection;
use reqwest::Method;
use reqwest::blocking::{Client, RequestBuilder, Response};
use std::time::Duration;
use tracing::{debug, info, warn};

const LIVE_PATH: &str = "/v1/.well-known/live";
const READY_PATH: &str = "/v1/.well-known/ready";

/// Operations the workflow needs from a vector store
pub trait VectorStore {
    /// Non-throwing readiness probe
    fn is_ready(&self) -> bool;

    fn collection_exists(&self, name: &str) -> Result<bool>;

    /// Drop a collection; a missing collection is not an error
    fn delete_collection(&self, name: &str) -> Result<()>;

    /// Create a collection; fails if one with the same name exists
    fn create_collection(&self, collection: &Collection) -> Result<()>;

    fn insert_record(&self, collection: &Collection, record: &Record) -> Result<RecordId>;

    /// Near-text search returning at most `request.limit` hits
    fn search(&self, request: &SearchRequest) -> Result<SearchResults>;

    /// List records without a similarity constraint
    fn fetch_objects(&self, collection: &str, fields: &[String], limit: usize) -> Result<SearchResults>;
}

#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub timeout: Duration,
    pub api_key: Option<String>,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            api_key: None,
        }
    }
}

impl From<&VectorDbConfig> for ClientOptions {
    fn from(config: &VectorDbConfig) -> Self {
        Self {
            timeout: config.timeout(),
            api_key: config.api_key.clone(),
        }
    }
}

/// Connection handle; released on `close` or drop
pub struct VectorStoreClient {
    base_url: String,
    api_key: Option<String>,
    http: Option<Client>,
}

impl VectorStoreClient {
    #[cfg(test)]
    pub fn connect(url: &str) -> Result<Self> {
        Self::connect_with(url, ClientOptions::default())
    }

    /// Build the transport and verify the service answers its liveness probe.
    pub fn connect_with(url: &str, options: ClientOptions) -> Result<Self> {
        let base_url = normalize_base_url(url)?;

        let http = Client::builder()
            .timeout(options.timeout)
            .build()
            .map_err(|e| VectorDbError::transport("build HTTP client", e))?;

        let client = Self {
            base_url,
            api_key: options.api_key,
            http: Some(http),
        };

        let response = client
            .request(Method::GET, LIVE_PATH)?
            .send()
            .map_err(|e| {
                VectorDbError::Connection(format!("service at {} is unreachable: {}", client.base_url, e))
            })?;

        if !response.status().is_success() {
            return Err(VectorDbError::Connection(format!(
                "service at {} failed its liveness probe (HTTP {})",
                client.base_url,
                response.status().as_u16()
            )));
        }

        if client.is_ready() {
            info!(url = %client.base_url, "Connected to vector store");
        } else {
            warn!(url = %client.base_url, "Vector store is live but not ready yet");
        }

        Ok(client)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[cfg(test)]
    pub fn is_closed(&self) -> bool {
        self.http.is_none()
    }

    /// Release the transport. Safe to call more than once.
    pub fn close(&mut self) {
        if self.http.take().is_some() {
            debug!(url = %self.base_url, "Vector store connection closed");
        }
    }

    pub(crate) fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Start a request against `path`, with auth applied.
    pub(crate) fn request(&self, method: Method, path: &str) -> Result<RequestBuilder> {
        let http = self.http.as_ref().ok_or_else(|| {
            VectorDbError::Connection(format!("connection to {} is closed", self.base_url))
        })?;

        let req = http.request(method, self.endpoint(path));
        Ok(match &self.api_key {
            Some(key) => req.header("Authorization", format!("Bearer {}", key)),
            None => req,
        })
    }

    fn probe_ready(&self) -> Result<bool> {
        let response = self
            .request(Method::GET, READY_PATH)?
            .send()
            .map_err(|e| VectorDbError::transport("readiness probe", e))?;
        Ok(response.status().is_success())
    }
}

impl Drop for VectorStoreClient {
    fn drop(&mut self) {
        self.close();
    }
}

impl VectorStore for VectorStoreClient {
    fn is_ready(&self) -> bool {
        self.probe_ready().unwrap_or(false)
    }

    fn collection_exists(&self, name: &str) -> Result<bool> {
        self.schema_contains(name)
    }

    fn delete_collection(&self, name: &str) -> Result<()> {
        self.schema_delete(name)
    }

    fn create_collection(&self, collection: &Collection) -> Result<()> {
        self.schema_create(collection)
    }

    fn insert_record(&self, collection: &Collection, record: &Record) -> Result<RecordId> {
        self.create_object(collection, record)
    }

    fn search(&self, request: &SearchRequest) -> Result<SearchResults> {
        self.near_text(request)
    }

    fn fetch_objects(&self, collection: &str, fields: &[String], limit: usize) -> Result<SearchResults> {
        self.list_objects(collection, fields, limit)
    }
}

/// Render a non-success response as `HTTP <status>: <server message>`.
pub(crate) fn describe_failure(response: Response) -> String {
    let status = response.status().as_u16();
    let body = response.text().unwrap_or_default();
    let message = serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|v| v["error"][0]["message"].as_str().map(|s| s.to_string()))
        .unwrap_or(body);
    format!("HTTP {}: {}", status, message)
}

/// Accept `http(s)://host[:port]` and strip any trailing slash.
fn normalize_base_url(url: &str) -> Result<String> {
    let parsed = reqwest::Url::parse(url)
        .map_err(|e| VectorDbError::Configuration(format!("invalid service URL '{}': {}", url, e)))?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(VectorDbError::Configuration(format!(
            "unsupported URL scheme '{}' (expected http or https)",
            parsed.scheme()
        )));
    }
    if parsed.host_str().is_none() {
        return Err(VectorDbError::Configuration(format!("service URL '{}' has no host", url)));
    }

    Ok(parsed.as_str().trim_end_matches('/').to_string())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use mockito::{Server, ServerGuard};

    /// Mock server that passes the connect-time probes.
    pub(crate) fn live_server() -> ServerGuard {
        let mut server = Server::new();
        server.mock("GET", LIVE_PATH).with_status(200).create();
        server.mock("GET", READY_PATH).with_status(200).create();
        server
    }

    pub(crate) fn connect_to(server: &ServerGuard) -> VectorStoreClient {
        VectorStoreClient::connect(&server.url()).expect("mock server should accept connection")
    }

    #[test]
    fn test_normalize_base_url() {
        assert_eq!(normalize_base_url("http://localhost:8080/").unwrap(), "http://localhost:8080");
        assert_eq!(normalize_base_url("https://cluster.example.net").unwrap(), "https://cluster.example.net");
        assert!(matches!(normalize_base_url("ftp://host"), Err(VectorDbError::Configuration(_))));
        assert!(matches!(normalize_base_url("not a url"), Err(VectorDbError::Configuration(_))));
    }

    #[test]
    fn test_describe_failure_prefers_server_message() {
        let mut server = Server::new();
        server
            .mock("GET", "/boom")
            .with_status(422)
            .with_body(r#"{"error":[{"message":"class name Article already exists"}]}"#)
            .create();

        let response = reqwest::blocking::get(format!("{}/boom", server.url())).unwrap();
        assert_eq!(describe_failure(response), "HTTP 422: class name Article already exists");
    }

    #[test]
    fn test_connect_and_ready() {
        let server = live_server();
        let client = connect_to(&server);
        assert!(client.is_ready());
        assert_eq!(client.base_url(), server.url());
    }

    #[test]
    fn test_connect_unreachable_is_connection_error() {
        let options = ClientOptions {
            timeout: Duration::from_secs(2),
            api_key: None,
        };
        match VectorStoreClient::connect_with("http://127.0.0.1:1", options) {
            Err(VectorDbError::Connection(msg)) => assert!(msg.contains("unreachable")),
            other => panic!("expected connection error, got {:?}", other.err()),
        }
    }

    #[test]
    fn test_live_but_not_ready_still_connects() {
        let mut server = Server::new();
        server.mock("GET", LIVE_PATH).with_status(200).create();
        server.mock("GET", READY_PATH).with_status(503).create();

        let client = connect_to(&server);
        assert!(!client.is_ready());
    }

    #[test]
    fn test_failed_liveness_probe() {
        let mut server = Server::new();
        server.mock("GET", LIVE_PATH).with_status(500).create();
        assert!(matches!(
            VectorStoreClient::connect(&server.url()),
            Err(VectorDbError::Connection(_))
        ));
    }

    #[test]
    fn test_close_is_idempotent_and_blocks_requests() {
        let server = live_server();
        let mut client = connect_to(&server);

        client.close();
        client.close();

        assert!(client.is_closed());
        assert!(!client.is_ready());
        assert!(matches!(client.collection_exists("Article"), Err(VectorDbError::Connection(_))));
    }

    #[test]
    fn test_api_key_sent_as_bearer() {
        let mut server = live_server();
        let mock = server
            .mock("GET", "/v1/schema/Article")
            .match_header("authorization", "Bearer wcs-secret")
            .with_status(200)
            .with_body("{}")
            .create();

        let options = ClientOptions {
            api_key: Some("wcs-secret".to_string()),
            ..ClientOptions::default()
        };
        let client = VectorStoreClient::connect_with(&server.url(), options).unwrap();
        assert!(client.collection_exists("Article").unwrap());
        mock.assert();
    }
}
