use thiserror::Error;

#[derive(Error, Debug)]
pub enum VectorDbError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Query error: {0}")]
    Query(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl VectorDbError {
    /// Wrap a transport failure from `reqwest` as a connection error for `operation`.
    pub fn transport(operation: &str, err: reqwest::Error) -> Self {
        VectorDbError::Connection(format!("{}: {}", operation, err))
    }

    /// Short kind label used in JSON output and log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            VectorDbError::Connection(_) | VectorDbError::Http(_) => "connection",
            VectorDbError::Schema(_) => "schema",
            VectorDbError::Validation(_) => "validation",
            VectorDbError::Query(_) => "query",
            VectorDbError::Configuration(_) => "configuration",
            VectorDbError::Io(_) => "io",
            VectorDbError::Json(_) => "json",
        }
    }
}

pub type Result<T> = std::result::Result<T, VectorDbError>;
