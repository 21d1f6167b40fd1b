//! Built-in collection definitions used by the demo workflow

use super::{Collection, DataType, Field, FieldVectorization};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Preset {
    /// Technology articles vectorized with text2vec-transformers
    #[default]
    Article,
    /// Documents vectorized with a Llama embedding model
    Document,
}

impl Preset {
    pub fn collection(&self) -> Collection {
        match self {
            Preset::Article => article(),
            Preset::Document => document(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Preset::Article => "Article",
            Preset::Document => "Document",
        }
    }
}

pub fn article() -> Collection {
    Collection::new("Article", "A news article about technology", "text2vec-transformers")
        .field(Field::new("title", DataType::String, "Title of the article"))
        .field(Field::new("content", DataType::Text, "Content of the article"))
}

pub fn document() -> Collection {
    Collection::new("Document", "A document class with Llama embeddings", "llama")
        .with_vectorizer_config(serde_json::json!({
            "model": "meta-llama/Llama-2-7b",
            "modelDimension": 4096,
            "pooling": "masked_mean",
        }))
        .field(Field::new("title", DataType::String, "The title of the document"))
        .field(
            Field::new("content", DataType::Text, "The content of the document").with_vectorization(
                FieldVectorization {
                    skip: false,
                    vectorize_property_name: true,
                },
            ),
        )
}
