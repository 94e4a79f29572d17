//! Batch request validation

use thiserror::Error;

use super::request::{BatchRequest, SenderRole};
use crate::domain::DomainError;

/// Validation errors for batch requests
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BatchValidationError {
    #[error("At least one question is required")]
    NoQuestions,

    #[error("Question at index {0} is blank")]
    BlankQuestion(usize),

    #[error("At least one strategy is required")]
    NoStrategies,

    #[error("At least one kValue is required")]
    NoKValues,

    #[error("kValue at index {0} must be a positive integer")]
    NonPositiveKValue(usize),

    #[error("At least one rValue is required")]
    NoRValues,

    #[error("rValue at index {0} must be a finite number")]
    NonFiniteRValue(usize),

    #[error("senderRole is required")]
    MissingSenderRole,

    #[error("Unknown senderRole: '{0}'")]
    UnknownSenderRole(String),

    #[error("senderRole '{actual}' is not allowed, expected '{expected}'")]
    UnexpectedSenderRole { expected: String, actual: String },

    #[error("clusterCount must be at least 1")]
    InvalidClusterCount,

    #[error("Batch spans {requested} combinations, the limit is {limit}")]
    TooManyCombinations { requested: String, limit: usize },
}

impl From<BatchValidationError> for DomainError {
    fn from(err: BatchValidationError) -> Self {
        DomainError::invalid_request(err.to_string())
    }
}

/// Validate the shape of a batch before any work starts
///
/// `max_combinations` bounds the grid size so planning never allocates
/// an unbounded grid.
pub fn validate_batch_request(
    request: &BatchRequest,
    expected_role: SenderRole,
    max_combinations: usize,
) -> Result<(), BatchValidationError> {
    validate_sender_role(request.sender_role.as_deref(), expected_role)?;

    if request.questions.is_empty() {
        return Err(BatchValidationError::NoQuestions);
    }

    if let Some(index) = request.questions.iter().position(|q| q.trim().is_empty()) {
        return Err(BatchValidationError::BlankQuestion(index));
    }

    if request.strategies.is_empty() {
        return Err(BatchValidationError::NoStrategies);
    }

    if request.k_values.is_empty() {
        return Err(BatchValidationError::NoKValues);
    }

    if let Some(index) = request.k_values.iter().position(|k| *k == 0) {
        return Err(BatchValidationError::NonPositiveKValue(index));
    }

    if request.r_values.is_empty() {
        return Err(BatchValidationError::NoRValues);
    }

    if let Some(index) = request.r_values.iter().position(|r| !r.is_finite()) {
        return Err(BatchValidationError::NonFiniteRValue(index));
    }

    if let Some(analytics) = &request.analytics {
        if analytics.cluster_count == Some(0) {
            return Err(BatchValidationError::InvalidClusterCount);
        }
    }

    match request.combination_count() {
        Some(count) if count <= max_combinations => Ok(()),
        Some(count) => Err(BatchValidationError::TooManyCombinations {
            requested: count.to_string(),
            limit: max_combinations,
        }),
        None => Err(BatchValidationError::TooManyCombinations {
            requested: "more than usize::MAX".to_string(),
            limit: max_combinations,
        }),
    }
}

fn validate_sender_role(
    role: Option<&str>,
    expected: SenderRole,
) -> Result<(), BatchValidationError> {
    let role = role.ok_or(BatchValidationError::MissingSenderRole)?;
    let parsed: SenderRole = role.parse()?;

    if parsed != expected {
        return Err(BatchValidationError::UnexpectedSenderRole {
            expected: expected.to_string(),
            actual: parsed.to_string(),
        });
    }

    Ok(())
}
