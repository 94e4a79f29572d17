//! Evaluation domain - Strategy experiments, results and comparisons

mod analytics;
mod chunk;
mod comparison;
mod request;
mod result;
mod strategy;
mod validation;

pub use analytics::{ClusterSummary, RelevanceStatistics, StrategySummary};
pub use chunk::Chunk;
pub use comparison::{ChunkPosition, ComparisonKey, ComparisonRecord};
pub use request::{AnalyticsOptions, BatchReport, BatchRequest, SenderRole};
pub use result::{EvaluationResult, StrategyDetails, TopicRelevance};
pub use strategy::{StrategyTag, TuningParameters};
pub use validation::{validate_batch_request, BatchValidationError};
