//! Relevance analytics value types

use serde::{Deserialize, Serialize};

use super::strategy::StrategyTag;

/// Descriptive statistics over a set of relevance scores
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelevanceStatistics {
    pub count: usize,
    pub minimum: f64,
    pub maximum: f64,
    pub range: f64,
    pub mean: f64,
    /// Population variance (divides by N)
    pub variance: f64,
    pub standard_deviation: f64,
    pub median: f64,
}

/// One cluster of relevance scores
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterSummary {
    pub centroid: f64,
    pub members: Vec<f64>,
}

/// Aggregate relevance profile of one strategy across a batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategySummary {
    pub strategy: StrategyTag,
    pub result_count: usize,
    pub chunk_count: usize,
    /// None when the strategy retrieved nothing in the batch
    pub statistics: Option<RelevanceStatistics>,
    /// None when the scores cannot support the requested cluster count
    pub clusters: Option<Vec<ClusterSummary>>,
}
