//! Evaluation service
//!
//! Runs one batch end to end: validation, grid execution, cross-strategy
//! comparison and optional relevance analytics. A batch either completes in
//! full or fails with a single error.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::EvaluationConfig;
use crate::domain::{
    validate_batch_request, BatchReport, BatchRequest, DomainError, EvaluationResult,
    RetrievalProviderFactory, SenderRole, StrategySummary, StrategyTag,
};
use crate::infrastructure::evaluation::{
    describe, ExperimentPlanner, GridPoint, RelevanceClusterer, StrategyComparator,
};
use crate::infrastructure::observability::{record_batch, BatchStatus};

/// Batch execution settings resolved from configuration
#[derive(Debug, Clone)]
pub struct EvaluationSettings {
    pub expected_role: SenderRole,
    pub max_concurrency: usize,
    pub batch_timeout: Duration,
    pub max_combinations: usize,
    pub default_cluster_count: usize,
    pub cluster_max_iterations: usize,
}

impl Default for EvaluationSettings {
    fn default() -> Self {
        Self {
            expected_role: SenderRole::User,
            max_concurrency: 1,
            batch_timeout: Duration::from_secs(300),
            max_combinations: 10_000,
            default_cluster_count: 2,
            cluster_max_iterations: 100,
        }
    }
}

impl EvaluationSettings {
    pub fn from_config(config: &EvaluationConfig) -> Result<Self, DomainError> {
        let expected_role = config.expected_sender_role.parse::<SenderRole>().map_err(|_| {
            DomainError::configuration(format!(
                "Unknown expected_sender_role '{}'",
                config.expected_sender_role
            ))
        })?;

        if config.default_cluster_count == 0 {
            return Err(DomainError::configuration(
                "default_cluster_count must be at least 1",
            ));
        }

        Ok(Self {
            expected_role,
            max_concurrency: config.max_concurrency.max(1),
            batch_timeout: Duration::from_secs(config.batch_timeout_secs),
            max_combinations: config.max_combinations,
            default_cluster_count: config.default_cluster_count,
            cluster_max_iterations: config.cluster_max_iterations,
        })
    }
}

/// Service evaluating retrieval strategy batches
#[derive(Debug)]
pub struct EvaluationService {
    factory: Arc<dyn RetrievalProviderFactory>,
    planner: ExperimentPlanner,
    comparator: StrategyComparator,
    clusterer: RelevanceClusterer,
    settings: EvaluationSettings,
}

impl EvaluationService {
    /// Create a new evaluation service
    pub fn new(factory: Arc<dyn RetrievalProviderFactory>, settings: EvaluationSettings) -> Self {
        let clusterer =
            RelevanceClusterer::new().with_max_iterations(settings.cluster_max_iterations);

        Self {
            factory,
            planner: ExperimentPlanner::new(),
            comparator: StrategyComparator::new(),
            clusterer,
            settings,
        }
    }

    /// Replace the clusterer (e.g. with a seeded one)
    pub fn with_clusterer(mut self, clusterer: RelevanceClusterer) -> Self {
        self.clusterer = clusterer;
        self
    }

    pub fn settings(&self) -> &EvaluationSettings {
        &self.settings
    }

    /// Evaluate a batch
    ///
    /// Cancelling `cancel`, or exceeding the batch timeout, discards every
    /// partial result and returns [`DomainError::Cancelled`].
    pub async fn evaluate(
        &self,
        request: BatchRequest,
        cancel: &CancellationToken,
    ) -> Result<BatchReport, DomainError> {
        let batch_id = Uuid::new_v4();
        let started_at = Utc::now();
        let start = Instant::now();

        if let Err(e) = validate_batch_request(
            &request,
            self.settings.expected_role,
            self.settings.max_combinations,
        ) {
            warn!(batch_id = %batch_id, error = %e, "Rejected evaluation batch");
            record_batch(BatchStatus::Rejected, start.elapsed(), 0);
            return Err(e.into());
        }

        let grid = self.planner.plan(&request);

        info!(
            batch_id = %batch_id,
            combinations = grid.len(),
            strategies = request.strategies.len(),
            provider = self.factory.provider_type(),
            concurrency = self.settings.max_concurrency,
            "Starting evaluation batch"
        );

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(DomainError::cancelled("batch cancelled by caller")),
            _ = tokio::time::sleep(self.settings.batch_timeout) => Err(DomainError::cancelled(
                format!("batch exceeded {}s timeout", self.settings.batch_timeout.as_secs()),
            )),
            results = self.execute(&grid) => results,
        };

        let results = match outcome {
            Ok(results) => results,
            Err(e) => {
                let status = match e {
                    DomainError::Cancelled { .. } => BatchStatus::Cancelled,
                    _ => BatchStatus::Failed,
                };
                warn!(batch_id = %batch_id, error = %e, "Evaluation batch aborted");
                record_batch(status, start.elapsed(), 0);
                return Err(e);
            }
        };

        let comparisons = request
            .is_multi_strategy()
            .then(|| self.comparator.compare(&results));

        let summaries = match &request.analytics {
            Some(options) => {
                let k = options
                    .cluster_count
                    .unwrap_or(self.settings.default_cluster_count);
                Some(self.summarize(&request.strategies, &results, k)?)
            }
            None => None,
        };

        record_batch(BatchStatus::Success, start.elapsed(), grid.len());

        info!(
            batch_id = %batch_id,
            results = results.len(),
            comparisons = comparisons.as_ref().map_or(0, Vec::len),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Evaluation batch completed"
        );

        Ok(BatchReport {
            batch_id,
            started_at,
            completed_at: Utc::now(),
            results,
            comparisons,
            summaries,
        })
    }

    async fn execute(&self, grid: &[GridPoint]) -> Result<Vec<EvaluationResult>, DomainError> {
        if self.settings.max_concurrency > 1 {
            return self
                .planner
                .execute_concurrent(self.factory.as_ref(), grid, self.settings.max_concurrency)
                .await;
        }

        let mut provider = self.factory.create().await?;
        self.planner.execute_sequential(provider.as_mut(), grid).await
    }

    /// Relevance profile per requested strategy, in request order
    fn summarize(
        &self,
        strategies: &[StrategyTag],
        results: &[EvaluationResult],
        cluster_count: usize,
    ) -> Result<Vec<StrategySummary>, DomainError> {
        let mut summaries: Vec<StrategySummary> = Vec::new();

        for strategy in strategies {
            if summaries.iter().any(|s| &s.strategy == strategy) {
                continue;
            }

            let strategy_results: Vec<&EvaluationResult> =
                results.iter().filter(|r| &r.strategy == strategy).collect();
            let scores: Vec<f64> = strategy_results
                .iter()
                .flat_map(|r| r.relevance_scores())
                .collect();

            let (statistics, clusters) = if scores.is_empty() {
                (None, None)
            } else {
                let clusters = match self.clusterer.cluster(&scores, cluster_count) {
                    Ok(clusters) => Some(clusters),
                    Err(DomainError::DegenerateClustering { requested, distinct }) => {
                        debug!(
                            strategy = %strategy,
                            requested,
                            distinct,
                            "Skipping clusters for strategy"
                        );
                        None
                    }
                    Err(e) => return Err(e),
                };
                (Some(describe(&scores)?), clusters)
            };

            summaries.push(StrategySummary {
                strategy: strategy.clone(),
                result_count: strategy_results.len(),
                chunk_count: scores.len(),
                statistics,
                clusters,
            });
        }

        Ok(summaries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::retrieval::{
        MockProviderFactory, MockRetrievalProvider, MockRetrievalProviderFactory,
    };
    use crate::domain::{AnalyticsOptions, Chunk};

    fn batch(questions: &[&str], strategies: &[StrategyTag], k: &[u32]) -> BatchRequest {
        BatchRequest {
            questions: questions.iter().map(|q| q.to_string()).collect(),
            strategies: strategies.to_vec(),
            k_values: k.to_vec(),
            r_values: vec![0.5],
            sender_role: Some("user".to_string()),
            analytics: None,
        }
    }

    fn provider() -> MockRetrievalProvider {
        MockRetrievalProvider::new()
            .with_response(
                "q1",
                vec![
                    Chunk::new("c1", "a", 0.9),
                    Chunk::new("c2", "b", 0.8),
                    Chunk::new("c3", "c", 0.2),
                ],
            )
            .with_strategy_response(
                "q1",
                StrategyTag::WeightedRelevance,
                vec![Chunk::new("c2", "b", 0.85), Chunk::new("c4", "d", 0.1)],
            )
            .with_response("q2", vec![Chunk::new("c5", "e", 0.6)])
    }

    fn service(provider: MockRetrievalProvider, max_concurrency: usize) -> EvaluationService {
        EvaluationService::new(
            Arc::new(MockProviderFactory::new(provider)),
            EvaluationSettings {
                max_concurrency,
                ..EvaluationSettings::default()
            },
        )
        .with_clusterer(RelevanceClusterer::new().with_seed(5))
    }

    #[tokio::test]
    async fn test_multi_strategy_batch() {
        let service = service(provider(), 1);
        let request = batch(
            &["q1", "q2"],
            &[StrategyTag::Default, StrategyTag::WeightedRelevance],
            &[3],
        );

        let report = service
            .evaluate(request, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(report.results.len(), 4);
        assert_eq!(report.results[1].strategy, StrategyTag::WeightedRelevance);
        assert_eq!(report.results[2].question, "q2");

        let comparisons = report.comparisons.unwrap();
        assert_eq!(comparisons.len(), 2);
        assert_eq!(comparisons[0].question, "q1");
        assert_eq!(comparisons[0].positions[0].chunk_id, "c2");
        assert_eq!(comparisons[0].positions[0].rank_in_a, 1);
        assert_eq!(comparisons[0].positions[0].rank_in_b, 0);
        assert!(report.summaries.is_none());
        assert!(report.completed_at >= report.started_at);
    }

    #[tokio::test]
    async fn test_single_strategy_has_no_comparisons() {
        let service = service(provider(), 1);
        let request = batch(&["q1", "q2"], &[StrategyTag::Default], &[3, 5]);

        let report = service
            .evaluate(request, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(report.results.len(), 4);
        assert!(report.comparisons.is_none());

        let json = serde_json::to_value(&report).unwrap();
        assert!(json.get("comparisons").is_none());
        assert!(json.get("batchId").is_some());
    }

    #[tokio::test]
    async fn test_invalid_request_runs_nothing() {
        let mock = provider();
        let service = service(mock.clone(), 1);
        let mut request = batch(&["q1"], &[StrategyTag::Default], &[3]);
        request.sender_role = Some("assistant".to_string());

        let result = service.evaluate(request, &CancellationToken::new()).await;

        assert!(matches!(result, Err(DomainError::InvalidRequest { .. })));
        assert_eq!(mock.handles_created(), 0);
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn test_oversized_grid_is_rejected_before_planning() {
        let mock = provider();
        let service = EvaluationService::new(
            Arc::new(MockProviderFactory::new(mock.clone())),
            EvaluationSettings {
                max_combinations: 3,
                ..EvaluationSettings::default()
            },
        );
        let request = batch(&["q1", "q2"], &[StrategyTag::Default], &[3, 5]);

        let result = service.evaluate(request, &CancellationToken::new()).await;

        match result {
            Err(DomainError::InvalidRequest { message }) => {
                assert!(message.contains("4 combinations"), "{message}");
            }
            other => panic!("expected InvalidRequest, got {other:?}"),
        }
        assert_eq!(mock.handles_created(), 0);
    }

    #[tokio::test]
    async fn test_provider_failure_on_third_of_eight() {
        let mock = provider().failing_on_call(3);
        let service = service(mock.clone(), 1);
        let request = batch(
            &["q1", "q2"],
            &[StrategyTag::Default, StrategyTag::TopicClassification],
            &[3, 5],
        );

        let result = service.evaluate(request, &CancellationToken::new()).await;

        assert!(matches!(result, Err(DomainError::Provider { .. })));
        assert_eq!(mock.call_count(), 3);
    }

    #[tokio::test]
    async fn test_concurrent_execution_matches_sequential() {
        let request = batch(
            &["q1", "q2"],
            &[
                StrategyTag::Default,
                StrategyTag::WeightedRelevance,
                StrategyTag::TopicClassification,
            ],
            &[1, 3],
        );

        let sequential = service(provider(), 1)
            .evaluate(request.clone(), &CancellationToken::new())
            .await
            .unwrap();
        let concurrent = service(provider(), 4)
            .evaluate(request, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(sequential.results, concurrent.results);
        assert_eq!(sequential.comparisons, concurrent.comparisons);
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let mock = provider();
        let service = service(mock.clone(), 1);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = service
            .evaluate(batch(&["q1"], &[StrategyTag::Default], &[3]), &cancel)
            .await;

        assert!(matches!(result, Err(DomainError::Cancelled { .. })));
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn test_cancelled_mid_batch() {
        let mock = provider().with_delay(Duration::from_millis(50));
        let service = service(mock, 1);
        let cancel = CancellationToken::new();

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            trigger.cancel();
        });

        let result = service
            .evaluate(
                batch(&["q1", "q2"], &[StrategyTag::Default, StrategyTag::WeightedRelevance], &[3]),
                &cancel,
            )
            .await;

        assert!(matches!(result, Err(DomainError::Cancelled { .. })));
    }

    #[tokio::test]
    async fn test_batch_timeout() {
        let service = EvaluationService::new(
            Arc::new(MockProviderFactory::new(
                provider().with_delay(Duration::from_millis(200)),
            )),
            EvaluationSettings {
                batch_timeout: Duration::from_millis(20),
                ..EvaluationSettings::default()
            },
        );

        let error = service
            .evaluate(batch(&["q1"], &[StrategyTag::Default], &[3]), &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(error, DomainError::Cancelled { .. }));
        assert!(error.to_string().contains("timeout"));
    }

    #[tokio::test]
    async fn test_factory_failure_aborts_batch() {
        let mut factory = MockRetrievalProviderFactory::new();
        factory.expect_provider_type().return_const("mock");
        factory
            .expect_create()
            .times(1)
            .returning(|| Err(DomainError::provider("mock", "backend unavailable")));

        let service = EvaluationService::new(Arc::new(factory), EvaluationSettings::default());

        let result = service
            .evaluate(batch(&["q1"], &[StrategyTag::Default], &[3]), &CancellationToken::new())
            .await;

        assert!(matches!(result, Err(DomainError::Provider { .. })));
    }

    #[tokio::test]
    async fn test_analytics_summaries() {
        let service = service(provider(), 1);
        let mut request = batch(
            &["q1", "q2"],
            &[StrategyTag::Default, StrategyTag::WeightedRelevance],
            &[3],
        );
        request.analytics = Some(AnalyticsOptions {
            cluster_count: Some(2),
        });

        let report = service
            .evaluate(request, &CancellationToken::new())
            .await
            .unwrap();
        let summaries = report.summaries.unwrap();

        assert_eq!(summaries.len(), 2);

        let default = &summaries[0];
        assert_eq!(default.strategy, StrategyTag::Default);
        assert_eq!(default.result_count, 2);
        assert_eq!(default.chunk_count, 4);
        let statistics = default.statistics.unwrap();
        assert_eq!(statistics.maximum, 0.9);
        assert_eq!(statistics.minimum, 0.2);
        let clusters = default.clusters.as_ref().unwrap();
        assert_eq!(clusters.len(), 2);
        assert!(clusters[0].members.contains(&0.2));
        assert!(clusters[1].members.contains(&0.9));
        assert_eq!(clusters.iter().map(|c| c.members.len()).sum::<usize>(), 4);

        // q2 under weighted relevance falls back to the shared q2 response
        let weighted = &summaries[1];
        assert_eq!(weighted.result_count, 2);
        assert_eq!(weighted.chunk_count, 3);
    }

    #[tokio::test]
    async fn test_degenerate_clusters_do_not_fail_batch() {
        let service = service(provider(), 1);
        let mut request = batch(&["q2"], &[StrategyTag::Default], &[3]);
        request.analytics = Some(AnalyticsOptions {
            cluster_count: Some(3),
        });

        let report = service
            .evaluate(request, &CancellationToken::new())
            .await
            .unwrap();
        let summary = &report.summaries.unwrap()[0];

        assert!(summary.statistics.is_some());
        assert!(summary.clusters.is_none());
    }

    #[test]
    fn test_settings_from_config() {
        let settings = EvaluationSettings::from_config(&EvaluationConfig {
            expected_sender_role: "system".to_string(),
            max_concurrency: 0,
            ..EvaluationConfig::default()
        })
        .unwrap();

        assert_eq!(settings.expected_role, SenderRole::System);
        assert_eq!(settings.max_concurrency, 1);
        assert_eq!(settings.max_combinations, 10_000);

        let invalid = EvaluationSettings::from_config(&EvaluationConfig {
            expected_sender_role: "robot".to_string(),
            ..EvaluationConfig::default()
        });
        assert!(matches!(invalid, Err(DomainError::Configuration { .. })));
    }
}
