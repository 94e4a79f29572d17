//! Retrieval strategies and their tuning parameters

use std::fmt;

use serde::{Deserialize, Serialize};

/// Named retrieval configuration evaluated by a batch
///
/// Known strategies get dedicated variants; any other tag is carried through
/// unchanged as `Custom` so providers can expose new strategies without a
/// release of this crate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum StrategyTag {
    Default,
    WeightedRelevance,
    TopicClassification,
    Custom(String),
}

impl StrategyTag {
    /// Wire representation of the tag
    pub fn as_str(&self) -> &str {
        match self {
            Self::Default => "default",
            Self::WeightedRelevance => "weightedRelevance",
            Self::TopicClassification => "topicClassification",
            Self::Custom(name) => name,
        }
    }
}

impl From<String> for StrategyTag {
    fn from(value: String) -> Self {
        match value.as_str() {
            "default" => Self::Default,
            "weightedRelevance" => Self::WeightedRelevance,
            "topicClassification" => Self::TopicClassification,
            _ => Self::Custom(value),
        }
    }
}

impl From<&str> for StrategyTag {
    fn from(value: &str) -> Self {
        Self::from(value.to_string())
    }
}

impl From<StrategyTag> for String {
    fn from(tag: StrategyTag) -> Self {
        match tag {
            StrategyTag::Custom(name) => name,
            other => other.as_str().to_string(),
        }
    }
}

impl fmt::Display for StrategyTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Strategy tuning knobs; their meaning belongs to the provider
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TuningParameters {
    /// Positive integer, e.g. neighbour count
    pub k_value: u32,
    /// e.g. relevance radius
    pub r_value: f64,
}

impl TuningParameters {
    pub fn new(k_value: u32, r_value: f64) -> Self {
        Self { k_value, r_value }
    }
}
