//! In-memory retrieval provider for local runs and testing
//!
//! Scores chunks by term overlap with the query. It is a stand-in for a real
//! retrieval service, not a search engine.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::domain::{
    Chunk, DomainError, RetrievalProvider, RetrievalProviderFactory, StrategyTag,
    TuningParameters,
};

const PROVIDER_TYPE: &str = "in_memory";

/// Metadata key holding a chunk's topic label
pub const TOPIC_METADATA_KEY: &str = "topic";

/// Handle over a shared, read-only corpus
///
/// kValue caps the number of chunks returned and rValue is the minimum
/// relevance a chunk needs to be selected.
#[derive(Debug, Clone)]
pub struct InMemoryRetrievalProvider {
    corpus: Arc<Vec<Chunk>>,
    configured: Option<(StrategyTag, TuningParameters)>,
}

impl InMemoryRetrievalProvider {
    pub fn new(corpus: Arc<Vec<Chunk>>) -> Self {
        Self {
            corpus,
            configured: None,
        }
    }
}

fn terms(text: &str) -> HashSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|term| !term.is_empty())
        .map(str::to_lowercase)
        .collect()
}

fn overlap(query: &HashSet<String>, chunk: &HashSet<String>) -> f64 {
    if query.is_empty() {
        return 0.0;
    }
    query.intersection(chunk).count() as f64 / query.len() as f64
}

/// Overlap where longer query terms weigh more
fn weighted_overlap(query: &HashSet<String>, chunk: &HashSet<String>) -> f64 {
    let total: usize = query.iter().map(|term| term.chars().count()).sum();
    if total == 0 {
        return 0.0;
    }
    let matched: usize = query
        .intersection(chunk)
        .map(|term| term.chars().count())
        .sum();
    matched as f64 / total as f64
}

fn topic_score(query: &HashSet<String>, chunk: &Chunk) -> Option<f64> {
    let topic = chunk.source_metadata.get(TOPIC_METADATA_KEY)?.as_str()?;
    let topic_terms = terms(topic);
    if topic_terms.is_empty() {
        return None;
    }
    Some(topic_terms.intersection(query).count() as f64 / topic_terms.len() as f64)
}

#[async_trait]
impl RetrievalProvider for InMemoryRetrievalProvider {
    fn provider_type(&self) -> &'static str {
        PROVIDER_TYPE
    }

    async fn configure(
        &mut self,
        strategy: &StrategyTag,
        params: TuningParameters,
    ) -> Result<(), DomainError> {
        self.configured = Some((strategy.clone(), params));
        Ok(())
    }

    async fn retrieve(&self, query: &str) -> Result<Vec<Chunk>, DomainError> {
        let (strategy, params) = self.configured.as_ref().ok_or_else(|| {
            DomainError::provider(PROVIDER_TYPE, "retrieve called before configure")
        })?;

        let query_terms = terms(query);

        let mut selected: Vec<Chunk> = self
            .corpus
            .iter()
            .filter_map(|chunk| {
                let chunk_terms = terms(&chunk.content);
                let score = match strategy {
                    StrategyTag::WeightedRelevance => weighted_overlap(&query_terms, &chunk_terms),
                    _ => overlap(&query_terms, &chunk_terms),
                };

                if score <= 0.0 || score < params.r_value {
                    return None;
                }

                let mut scored = chunk.clone();
                scored.relevance_score = score;
                scored.topic_relevance_score = match strategy {
                    StrategyTag::TopicClassification => topic_score(&query_terms, chunk),
                    _ => None,
                };
                Some(scored)
            })
            .collect();

        selected.sort_by(|a, b| {
            b.relevance_score
                .total_cmp(&a.relevance_score)
                .then_with(|| a.id.cmp(&b.id))
        });
        selected.truncate(params.k_value as usize);

        Ok(selected)
    }
}

/// Hands out handles over one loaded corpus
#[derive(Debug, Clone)]
pub struct InMemoryRetrievalProviderFactory {
    corpus: Arc<Vec<Chunk>>,
}

impl InMemoryRetrievalProviderFactory {
    pub fn new(corpus: Vec<Chunk>) -> Self {
        Self {
            corpus: Arc::new(corpus),
        }
    }

    /// Load a corpus from a JSON array of chunks
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, DomainError> {
        let path = path.as_ref();
        let raw = tokio::fs::read_to_string(path).await.map_err(|e| {
            DomainError::configuration(format!(
                "Failed to read corpus {}: {}",
                path.display(),
                e
            ))
        })?;

        let corpus: Vec<Chunk> = serde_json::from_str(&raw).map_err(|e| {
            DomainError::configuration(format!(
                "Invalid corpus {}: {}",
                path.display(),
                e
            ))
        })?;

        info!(path = %path.display(), chunks = corpus.len(), "Loaded in-memory corpus");

        Ok(Self::new(corpus))
    }

    pub fn len(&self) -> usize {
        self.corpus.len()
    }

    pub fn is_empty(&self) -> bool {
        self.corpus.is_empty()
    }
}

#[async_trait]
impl RetrievalProviderFactory for InMemoryRetrievalProviderFactory {
    fn provider_type(&self) -> &'static str {
        PROVIDER_TYPE
    }

    async fn create(&self) -> Result<Box<dyn RetrievalProvider>, DomainError> {
        Ok(Box::new(InMemoryRetrievalProvider::new(Arc::clone(
            &self.corpus,
        ))))
    }
}
