//! One-dimensional iterative-centroid clustering of relevance scores

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::debug;

use crate::domain::{ClusterSummary, DomainError};

/// Cluster count used when a caller does not ask for one
pub const DEFAULT_CLUSTER_COUNT: usize = 2;

/// Iteration cap used when none is configured
pub const DEFAULT_MAX_ITERATIONS: usize = 100;

/// Groups relevance scores into k clusters (1-D k-means)
///
/// Initial centroids are k distinct input values picked at random. Each
/// iteration assigns every score to its nearest centroid (ties go to the
/// lower index) and moves each centroid to the mean of its members, until
/// assignments stop changing or the iteration cap is reached.
#[derive(Debug, Clone)]
pub struct RelevanceClusterer {
    max_iterations: usize,
    seed: Option<u64>,
}

impl Default for RelevanceClusterer {
    fn default() -> Self {
        Self::new()
    }
}

impl RelevanceClusterer {
    pub fn new() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            seed: None,
        }
    }

    /// Set the iteration cap (at least one iteration always runs)
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations.max(1);
        self
    }

    /// Seed centroid initialization for reproducible runs
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Partition `scores` into `k` non-empty clusters ordered by centroid
    pub fn cluster(&self, scores: &[f64], k: usize) -> Result<Vec<ClusterSummary>, DomainError> {
        if scores.is_empty() {
            return Err(DomainError::invalid_input(
                "clustering requires at least one score",
            ));
        }
        if scores.iter().any(|s| !s.is_finite()) {
            return Err(DomainError::invalid_input(
                "clustering requires finite scores",
            ));
        }

        let distinct = distinct_values(scores);
        if k < 1 || k > distinct.len() {
            return Err(DomainError::degenerate_clustering(k, distinct.len()));
        }

        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let mut centroids: Vec<f64> = distinct.choose_multiple(&mut rng, k).copied().collect();

        let mut assignments: Vec<usize> = Vec::new();
        let mut iterations = 0;

        while iterations < self.max_iterations {
            iterations += 1;

            let next = assign(scores, &centroids);
            if next == assignments {
                break;
            }
            assignments = next;
            centroids = relocate(scores, &mut assignments, k)?;
        }

        debug!(
            points = scores.len(),
            clusters = k,
            iterations = iterations,
            "Relevance clustering finished"
        );

        Ok(summarize(scores, &assignments, k))
    }
}

fn distinct_values(scores: &[f64]) -> Vec<f64> {
    let mut values = scores.to_vec();
    values.sort_by(f64::total_cmp);
    values.dedup();
    values
}

fn nearest(point: f64, centroids: &[f64]) -> usize {
    let mut best = 0;
    let mut best_distance = (point - centroids[0]).abs();

    for (index, centroid) in centroids.iter().enumerate().skip(1) {
        let distance = (point - centroid).abs();
        if distance < best_distance {
            best = index;
            best_distance = distance;
        }
    }

    best
}

fn assign(scores: &[f64], centroids: &[f64]) -> Vec<usize> {
    scores.iter().map(|s| nearest(*s, centroids)).collect()
}

fn means(scores: &[f64], assignments: &[usize], k: usize) -> (Vec<f64>, Vec<usize>) {
    let mut sums = vec![0.0; k];
    let mut counts = vec![0usize; k];

    for (score, cluster) in scores.iter().zip(assignments) {
        sums[*cluster] += score;
        counts[*cluster] += 1;
    }

    let centroids = sums
        .iter()
        .zip(&counts)
        .map(|(sum, count)| if *count > 0 { sum / *count as f64 } else { f64::NAN })
        .collect();

    (centroids, counts)
}

/// Move centroids to their members' means, reseeding emptied clusters
///
/// An empty cluster takes over the point farthest from its own centroid
/// among clusters with more than one member. Since k never exceeds the
/// number of distinct points, such a donor cluster always exists.
fn relocate(
    scores: &[f64],
    assignments: &mut [usize],
    k: usize,
) -> Result<Vec<f64>, DomainError> {
    loop {
        let (centroids, counts) = means(scores, assignments, k);

        let Some(empty) = counts.iter().position(|count| *count == 0) else {
            return Ok(centroids);
        };

        let donor = assignments
            .iter()
            .enumerate()
            .filter(|(_, cluster)| counts[**cluster] > 1)
            .map(|(index, cluster)| (index, (scores[index] - centroids[*cluster]).abs()))
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(index, _)| index)
            .ok_or_else(|| DomainError::internal("no cluster available to reseed an empty one"))?;

        assignments[donor] = empty;
    }
}

fn summarize(scores: &[f64], assignments: &[usize], k: usize) -> Vec<ClusterSummary> {
    let mut members: Vec<Vec<f64>> = vec![Vec::new(); k];
    for (score, cluster) in scores.iter().zip(assignments) {
        members[*cluster].push(*score);
    }

    let mut clusters: Vec<ClusterSummary> = members
        .into_iter()
        .map(|members| ClusterSummary {
            centroid: members.iter().sum::<f64>() / members.len() as f64,
            members,
        })
        .collect();

    clusters.sort_by(|a, b| a.centroid.total_cmp(&b.centroid));
    clusters
}
