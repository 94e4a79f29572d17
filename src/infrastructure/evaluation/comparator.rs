//! Pairwise structural diff of results across strategies

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::domain::{ChunkPosition, ComparisonKey, ComparisonRecord, EvaluationResult};

/// Diffs the chunk sets of results that share a question but not a strategy
#[derive(Debug, Clone, Default)]
pub struct StrategyComparator;

impl StrategyComparator {
    pub fn new() -> Self {
        Self
    }

    /// Compare every eligible pair in a batch's result sequence
    ///
    /// Pairs are scanned in batch order (A before B). Only the first pair for
    /// a given question and unordered strategy pair produces a record; later
    /// pairs that differ only in kValue or rValue are skipped.
    pub fn compare(&self, results: &[EvaluationResult]) -> Vec<ComparisonRecord> {
        let mut seen: HashSet<ComparisonKey> = HashSet::new();
        let mut records = Vec::new();

        for (i, a) in results.iter().enumerate() {
            for b in &results[i + 1..] {
                if a.question != b.question || a.strategy == b.strategy {
                    continue;
                }

                let key = ComparisonKey::new(&a.question, &a.strategy, &b.strategy);
                if !seen.insert(key) {
                    continue;
                }

                records.push(diff(a, b));
            }
        }

        debug!(
            results = results.len(),
            comparisons = records.len(),
            "Strategy comparison finished"
        );

        records
    }
}

/// Build the comparison record for one pair of results
pub fn diff(a: &EvaluationResult, b: &EvaluationResult) -> ComparisonRecord {
    let ranks_in_b = rank_index(b);
    let ids_in_a: HashSet<&str> = a.selected_chunks.iter().map(|c| c.id.as_str()).collect();

    let mut common_chunks = Vec::new();
    let mut unique_to_a = Vec::new();
    let mut positions = Vec::new();

    for (rank_in_a, chunk) in a.selected_chunks.iter().enumerate() {
        match ranks_in_b.get(chunk.id.as_str()) {
            Some(rank_in_b) => {
                positions.push(ChunkPosition {
                    chunk_id: chunk.id.clone(),
                    rank_in_a,
                    rank_in_b: *rank_in_b,
                });
                common_chunks.push(chunk.clone());
            }
            None => unique_to_a.push(chunk.clone()),
        }
    }

    let unique_to_b = b
        .selected_chunks
        .iter()
        .filter(|chunk| !ids_in_a.contains(chunk.id.as_str()))
        .cloned()
        .collect();

    ComparisonRecord {
        question: a.question.clone(),
        strategy_a: a.strategy.clone(),
        strategy_b: b.strategy.clone(),
        common_chunks,
        unique_to_a,
        unique_to_b,
        positions,
    }
}

/// First rank of every chunk id in a result
fn rank_index(result: &EvaluationResult) -> HashMap<&str, usize> {
    let mut ranks = HashMap::with_capacity(result.selected_chunks.len());
    for (rank, chunk) in result.selected_chunks.iter().enumerate() {
        ranks.entry(chunk.id.as_str()).or_insert(rank);
    }
    ranks
}
