//! Batch evaluation request and report

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::analytics::StrategySummary;
use super::comparison::ComparisonRecord;
use super::result::EvaluationResult;
use super::strategy::StrategyTag;
use super::validation::BatchValidationError;

/// Role of the party submitting a batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SenderRole {
    #[default]
    User,
    Assistant,
    System,
}

impl SenderRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::System => "system",
        }
    }
}

impl FromStr for SenderRole {
    type Err = BatchValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "assistant" => Ok(Self::Assistant),
            "system" => Ok(Self::System),
            other => Err(BatchValidationError::UnknownSenderRole(other.to_string())),
        }
    }
}

impl fmt::Display for SenderRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Optional analytics enrichment for a batch
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsOptions {
    /// Clusters per strategy; falls back to the configured default
    #[serde(default)]
    pub cluster_count: Option<usize>,
}

/// A batch spanning questions x strategies x kValues x rValues
///
/// Collections default to empty so that a missing field is reported as an
/// invalid request rather than a JSON shape error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchRequest {
    #[serde(default)]
    pub questions: Vec<String>,
    #[serde(default)]
    pub strategies: Vec<StrategyTag>,
    #[serde(default)]
    pub k_values: Vec<u32>,
    #[serde(default)]
    pub r_values: Vec<f64>,
    #[serde(default)]
    pub sender_role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analytics: Option<AnalyticsOptions>,
}

impl BatchRequest {
    /// Number of grid combinations the batch spans; `None` on overflow
    pub fn combination_count(&self) -> Option<usize> {
        self.questions
            .len()
            .checked_mul(self.strategies.len())?
            .checked_mul(self.k_values.len())?
            .checked_mul(self.r_values.len())
    }

    /// Whether the batch compares more than one strategy
    pub fn is_multi_strategy(&self) -> bool {
        self.strategies.len() > 1
    }
}

/// Outcome of a completed batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchReport {
    pub batch_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub results: Vec<EvaluationResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comparisons: Option<Vec<ComparisonRecord>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summaries: Option<Vec<StrategySummary>>,
}
