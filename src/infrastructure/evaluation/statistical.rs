//! Descriptive statistics over relevance scores
//!
//! All functions reject empty or non-finite input instead of returning a
//! zero or NaN placeholder.

use crate::domain::{DomainError, RelevanceStatistics};

/// Summarize a set of relevance scores
///
/// Variance is the population variance (divides by N) and the standard
/// deviation is its square root. The median of an even-sized sample is the
/// mean of the two middle values.
pub fn describe(scores: &[f64]) -> Result<RelevanceStatistics, DomainError> {
    ensure_valid(scores)?;

    let mut sorted = scores.to_vec();
    sorted.sort_by(f64::total_cmp);

    let minimum = sorted[0];
    let maximum = sorted[sorted.len() - 1];
    let mean = mean_of(&sorted, minimum);
    let variance = population_variance_of(&sorted, minimum, mean);

    Ok(RelevanceStatistics {
        count: sorted.len(),
        minimum,
        maximum,
        range: maximum - minimum,
        mean,
        variance,
        standard_deviation: variance.sqrt(),
        median: median_of_sorted(&sorted),
    })
}

/// Arithmetic mean of a sample
pub fn mean(scores: &[f64]) -> Result<f64, DomainError> {
    ensure_valid(scores)?;
    Ok(mean_of(scores, minimum_of(scores)))
}

/// Population variance of a sample
pub fn population_variance(scores: &[f64]) -> Result<f64, DomainError> {
    ensure_valid(scores)?;

    let origin = minimum_of(scores);
    Ok(population_variance_of(scores, origin, mean_of(scores, origin)))
}

/// Median of a sample
pub fn median(scores: &[f64]) -> Result<f64, DomainError> {
    ensure_valid(scores)?;

    let mut sorted = scores.to_vec();
    sorted.sort_by(f64::total_cmp);

    Ok(median_of_sorted(&sorted))
}

fn ensure_valid(scores: &[f64]) -> Result<(), DomainError> {
    if scores.is_empty() {
        return Err(DomainError::invalid_input(
            "relevance statistics require at least one score",
        ));
    }

    if let Some(index) = scores.iter().position(|s| !s.is_finite()) {
        return Err(DomainError::invalid_input(format!(
            "score at index {} is not a finite number",
            index
        )));
    }

    Ok(())
}

fn minimum_of(scores: &[f64]) -> f64 {
    scores.iter().copied().fold(f64::INFINITY, f64::min)
}

/// Sums are taken over offsets from `origin` so a constant sample has
/// a mean equal to its element and a variance of exactly zero.
fn mean_of(scores: &[f64], origin: f64) -> f64 {
    let offset = scores.iter().map(|x| x - origin).sum::<f64>() / scores.len() as f64;
    origin + offset
}

fn population_variance_of(scores: &[f64], origin: f64, mean: f64) -> f64 {
    let shift = mean - origin;
    scores
        .iter()
        .map(|x| ((x - origin) - shift).powi(2))
        .sum::<f64>()
        / scores.len() as f64
}

fn median_of_sorted(sorted: &[f64]) -> f64 {
    let mid = sorted.len() / 2;

    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}
