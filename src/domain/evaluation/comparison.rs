//! Cross-strategy comparison records

use serde::{Deserialize, Serialize};

use super::chunk::Chunk;
use super::strategy::StrategyTag;

/// Position of a common chunk in both results
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkPosition {
    pub chunk_id: String,
    pub rank_in_a: usize,
    pub rank_in_b: usize,
}

impl ChunkPosition {
    /// Signed rank movement from A to B; positive means the chunk ranks lower in B
    pub fn drift(&self) -> i64 {
        self.rank_in_b as i64 - self.rank_in_a as i64
    }
}

/// Structural diff between two strategies' results for one question
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonRecord {
    pub question: String,
    pub strategy_a: StrategyTag,
    pub strategy_b: StrategyTag,
    /// Chunks present in both results, in A's order
    pub common_chunks: Vec<Chunk>,
    pub unique_to_a: Vec<Chunk>,
    pub unique_to_b: Vec<Chunk>,
    pub positions: Vec<ChunkPosition>,
}

impl ComparisonRecord {
    /// Share of the union of both chunk sets that is common to both
    pub fn overlap_ratio(&self) -> f64 {
        let union = self.common_chunks.len() + self.unique_to_a.len() + self.unique_to_b.len();

        if union == 0 {
            return 0.0;
        }

        self.common_chunks.len() as f64 / union as f64
    }
}

/// Identity of a comparison: a question plus an unordered strategy pair
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ComparisonKey {
    question: String,
    first: StrategyTag,
    second: StrategyTag,
}

impl ComparisonKey {
    pub fn new(question: &str, a: &StrategyTag, b: &StrategyTag) -> Self {
        let (first, second) = if a <= b { (a, b) } else { (b, a) };

        Self {
            question: question.to_string(),
            first: first.clone(),
            second: second.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comparison_key_is_unordered() {
        let a = StrategyTag::Default;
        let b = StrategyTag::WeightedRelevance;

        assert_eq!(ComparisonKey::new("q", &a, &b), ComparisonKey::new("q", &b, &a));
        assert_ne!(ComparisonKey::new("q", &a, &b), ComparisonKey::new("other", &a, &b));
    }

    #[test]
    fn test_position_drift() {
        let position = ChunkPosition {
            chunk_id: "c2".to_string(),
            rank_in_a: 1,
            rank_in_b: 0,
        };

        assert_eq!(position.drift(), -1);
    }

    #[test]
    fn test_overlap_ratio() {
        let record = ComparisonRecord {
            question: "q".to_string(),
            strategy_a: StrategyTag::Default,
            strategy_b: StrategyTag::WeightedRelevance,
            common_chunks: vec![Chunk::new("c2", "", 0.5), Chunk::new("c3", "", 0.4)],
            unique_to_a: vec![Chunk::new("c1", "", 0.9)],
            unique_to_b: vec![Chunk::new("c4", "", 0.3)],
            positions: Vec::new(),
        };

        assert!((record.overlap_ratio() - 0.5).abs() < f64::EPSILON);
    }
}
