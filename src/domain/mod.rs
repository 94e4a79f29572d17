//! Domain layer - Core evaluation entities and provider contracts

pub mod error;
pub mod evaluation;
pub mod retrieval;

pub use error::DomainError;
pub use evaluation::{
    validate_batch_request, AnalyticsOptions, BatchReport, BatchRequest, BatchValidationError,
    Chunk, ChunkPosition, ClusterSummary, ComparisonKey, ComparisonRecord, EvaluationResult,
    RelevanceStatistics, SenderRole, StrategyDetails, StrategySummary, StrategyTag,
    TopicRelevance, TuningParameters,
};
pub use retrieval::{RetrievalProvider, RetrievalProviderFactory};
