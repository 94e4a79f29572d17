//! Retrieved context chunks

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A unit of retrieved source content
///
/// Position inside a result's chunk list is the rank: index 0 is the most
/// relevant chunk the provider returned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chunk {
    /// Identifier, unique within the provider's corpus
    pub id: String,
    /// Chunk text
    pub content: String,
    /// Provider-supplied source metadata (document, page, url, ...)
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub source_metadata: HashMap<String, serde_json::Value>,
    /// Relevance of the chunk to the query, higher is better
    pub relevance_score: f64,
    /// Relevance of the chunk to the query's topic, when the provider scores it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic_relevance_score: Option<f64>,
}

impl Chunk {
    /// Create a new chunk
    pub fn new(id: impl Into<String>, content: impl Into<String>, relevance_score: f64) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            source_metadata: HashMap::new(),
            relevance_score,
            topic_relevance_score: None,
        }
    }

    /// Add a metadata entry
    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.source_metadata.insert(key.into(), value);
        self
    }

    /// Set the topic relevance score
    pub fn with_topic_relevance(mut self, score: f64) -> Self {
        self.topic_relevance_score = Some(score);
        self
    }
}
