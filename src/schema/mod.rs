//! Collection Schema - typed collection definitions
//!
//! A [`Collection`] serializes to the class document accepted by `POST /v1/schema`.

pub mod manager;
pub mod presets;

use crate::error::{Result, VectorDbError};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

static CLASS_NAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Z][_0-9A-Za-z]*$").unwrap());
static FIELD_NAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[_A-Za-z][_0-9A-Za-z]*$").unwrap());

pub fn is_valid_collection_name(name: &str) -> bool {
    CLASS_NAME.is_match(name)
}

pub fn is_valid_field_name(name: &str) -> bool {
    FIELD_NAME.is_match(name)
}

/// Primitive field type
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    /// Short string, e.g. a title
    String,
    /// Long text, e.g. an article body
    Text,
}

impl DataType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::String => "string",
            DataType::Text => "text",
        }
    }
}

/// Per-field vectorization override
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldVectorization {
    /// Leave the field out of the embedding entirely
    pub skip: bool,
    /// Let the field name itself influence the vector
    pub vectorize_property_name: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub data_type: DataType,
    pub description: String,
    pub vectorization: Option<FieldVectorization>,
}

impl Field {
    pub fn new(name: impl Into<String>, data_type: DataType, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type,
            description: description.into(),
            vectorization: None,
        }
    }

    pub fn with_vectorization(mut self, vectorization: FieldVectorization) -> Self {
        self.vectorization = Some(vectorization);
        self
    }
}

/// A named collection with its fields and vectorizer
#[derive(Debug, Clone, PartialEq)]
pub struct Collection {
    pub name: String,
    pub description: String,
    pub vectorizer: String,
    /// Module settings for the vectorizer, e.g. model name and dimension
    pub vectorizer_config: Option<serde_json::Value>,
    pub fields: Vec<Field>,
}

impl Collection {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        vectorizer: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            vectorizer: vectorizer.into(),
            vectorizer_config: None,
            fields: Vec::new(),
        }
    }

    pub fn with_vectorizer_config(mut self, config: serde_json::Value) -> Self {
        self.vectorizer_config = Some(config);
        self
    }

    pub fn field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.fields.iter().any(|f| f.name == name)
    }

    /// Check the definition before it is sent to the server.
    pub fn validate(&self) -> Result<()> {
        if !is_valid_collection_name(&self.name) {
            return Err(VectorDbError::Schema(format!(
                "invalid collection name '{}': must start with an uppercase letter and contain only letters, digits or '_'",
                self.name
            )));
        }

        if self.fields.is_empty() {
            return Err(VectorDbError::Schema(format!(
                "collection '{}' declares no fields",
                self.name
            )));
        }

        let mut seen = HashSet::new();
        for field in &self.fields {
            if !is_valid_field_name(&field.name) {
                return Err(VectorDbError::Schema(format!(
                    "invalid field name '{}' in collection '{}'",
                    field.name, self.name
                )));
            }
            if !seen.insert(field.name.as_str()) {
                return Err(VectorDbError::Schema(format!(
                    "duplicate field '{}' in collection '{}'",
                    field.name, self.name
                )));
            }
        }

        Ok(())
    }

    /// Build the class document for `POST /v1/schema`.
    pub fn to_class_json(&self) -> serde_json::Value {
        let properties: Vec<serde_json::Value> = self
            .fields
            .iter()
            .map(|field| {
                let mut prop = serde_json::json!({
                    "name": field.name,
                    "dataType": [field.data_type.as_str()],
                    "description": field.description,
                });
                if let Some(v) = &field.vectorization {
                    prop["moduleConfig"] = serde_json::json!({
                        self.vectorizer.as_str(): {
                            "skip": v.skip,
                            "vectorizePropertyName": v.vectorize_property_name,
                        }
                    });
                }
                prop
            })
            .collect();

        let mut class = serde_json::json!({
            "class": self.name,
            "description": self.description,
            "vectorizer": self.vectorizer,
            "properties": properties,
        });

        if let Some(config) = &self.vectorizer_config {
            class["moduleConfig"] = serde_json::json!({ self.vectorizer.as_str(): config });
        }

        class
    }
}
