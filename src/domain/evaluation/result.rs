//! Evaluation results, one per grid combination

use serde::{Deserialize, Serialize};

use super::chunk::Chunk;
use super::strategy::{StrategyTag, TuningParameters};

/// Topic relevance attached to a chunk by topic classification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicRelevance {
    pub chunk_id: String,
    pub score: f64,
}

/// Strategy-specific part of an evaluation result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum StrategyDetails {
    /// Raw selected chunks, no enrichment
    Plain,
    /// Weighted relevance; only produced when at least one chunk was retrieved
    WeightedRelevance,
    /// Topic classification with a topic score per selected chunk
    #[serde(rename_all = "camelCase")]
    TopicClassification { topic_relevance: Vec<TopicRelevance> },
}

/// Outcome of running one (question, strategy, kValue, rValue) combination
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationResult {
    pub question: String,
    pub strategy: StrategyTag,
    pub k_value: u32,
    pub r_value: f64,
    /// Chunks in provider rank order
    pub selected_chunks: Vec<Chunk>,
    pub details: StrategyDetails,
}

impl EvaluationResult {
    /// Create a result with no strategy-specific enrichment
    pub fn new(
        question: impl Into<String>,
        strategy: StrategyTag,
        params: TuningParameters,
        selected_chunks: Vec<Chunk>,
    ) -> Self {
        Self {
            question: question.into(),
            strategy,
            k_value: params.k_value,
            r_value: params.r_value,
            selected_chunks,
            details: StrategyDetails::Plain,
        }
    }

    /// Replace the strategy-specific details
    pub fn with_details(mut self, details: StrategyDetails) -> Self {
        self.details = details;
        self
    }

    /// Tuning parameters the result was produced with
    pub fn params(&self) -> TuningParameters {
        TuningParameters::new(self.k_value, self.r_value)
    }

    /// Relevance scores of the selected chunks, in rank order
    pub fn relevance_scores(&self) -> Vec<f64> {
        self.selected_chunks
            .iter()
            .map(|chunk| chunk.relevance_score)
            .collect()
    }
}
