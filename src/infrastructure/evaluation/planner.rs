//! Experiment planning and execution over the parameter grid

use std::time::Instant;

use futures::{stream, StreamExt, TryStreamExt};
use tracing::{debug, instrument};

use crate::domain::{
    BatchRequest, Chunk, DomainError, EvaluationResult, RetrievalProvider,
    RetrievalProviderFactory, StrategyDetails, StrategyTag, TopicRelevance, TuningParameters,
};
use crate::infrastructure::observability::{record_retrieval_request, RetrievalMetricParams};

/// One (question, strategy, kValue, rValue) combination
#[derive(Debug, Clone, PartialEq)]
pub struct GridPoint {
    /// Position in enumeration order
    pub index: usize,
    pub question: String,
    pub strategy: StrategyTag,
    pub params: TuningParameters,
}

/// Enumerates a batch's grid and drives the retrieval provider over it
#[derive(Debug, Clone, Default)]
pub struct ExperimentPlanner;

impl ExperimentPlanner {
    pub fn new() -> Self {
        Self
    }

    /// Enumerate the grid: question outermost, then strategy, kValue, rValue
    pub fn plan(&self, request: &BatchRequest) -> Vec<GridPoint> {
        let mut grid = Vec::with_capacity(request.combination_count().unwrap_or_default());

        for question in &request.questions {
            for strategy in &request.strategies {
                for k_value in &request.k_values {
                    for r_value in &request.r_values {
                        grid.push(GridPoint {
                            index: grid.len(),
                            question: question.clone(),
                            strategy: strategy.clone(),
                            params: TuningParameters::new(*k_value, *r_value),
                        });
                    }
                }
            }
        }

        grid
    }

    /// Run every grid point in order against a single provider handle
    ///
    /// The first failing point aborts the run; no partial results escape.
    #[instrument(skip_all, fields(provider = provider.provider_type(), combinations = grid.len()))]
    pub async fn execute_sequential(
        &self,
        provider: &mut dyn RetrievalProvider,
        grid: &[GridPoint],
    ) -> Result<Vec<EvaluationResult>, DomainError> {
        let mut results = Vec::with_capacity(grid.len());

        for point in grid {
            if let Some(result) = run_point(provider, point).await? {
                results.push(result);
            }
        }

        Ok(results)
    }

    /// Run grid points concurrently, each on its own provider handle
    ///
    /// At most `concurrency` points are in flight. Results come back in
    /// enumeration order regardless of completion order, and the first
    /// failure drops every in-flight point.
    #[instrument(skip_all, fields(provider = factory.provider_type(), combinations = grid.len(), concurrency = concurrency))]
    pub async fn execute_concurrent(
        &self,
        factory: &dyn RetrievalProviderFactory,
        grid: &[GridPoint],
        concurrency: usize,
    ) -> Result<Vec<EvaluationResult>, DomainError> {
        let mut completed: Vec<(usize, Option<EvaluationResult>)> = stream::iter(grid.to_vec())
            .map(|point| run_on_own_handle(factory, point))
            .buffer_unordered(concurrency.max(1))
            .try_collect()
            .await?;

        completed.sort_by_key(|(index, _)| *index);

        Ok(completed.into_iter().filter_map(|(_, result)| result).collect())
    }
}

/// Run one point on a fresh handle, tagged with its grid index
async fn run_on_own_handle(
    factory: &dyn RetrievalProviderFactory,
    point: GridPoint,
) -> Result<(usize, Option<EvaluationResult>), DomainError> {
    let mut handle = factory.create().await?;
    let result = run_point(handle.as_mut(), &point).await?;
    Ok((point.index, result))
}

/// Configure, retrieve and shape one grid point
async fn run_point(
    provider: &mut dyn RetrievalProvider,
    point: &GridPoint,
) -> Result<Option<EvaluationResult>, DomainError> {
    provider.configure(&point.strategy, point.params).await?;

    let start = Instant::now();
    let retrieved = provider.retrieve(&point.question).await;

    record_retrieval_request(RetrievalMetricParams {
        provider: provider.provider_type(),
        strategy: point.strategy.as_str(),
        duration: start.elapsed(),
        success: retrieved.is_ok(),
    });

    let chunks = retrieved?;

    debug!(
        index = point.index,
        strategy = %point.strategy,
        k_value = point.params.k_value,
        r_value = point.params.r_value,
        chunks = chunks.len(),
        "Grid point retrieved"
    );

    Ok(shape(point, chunks))
}

/// Attach strategy-specific details to a retrieval
///
/// A weighted-relevance retrieval with no chunks yields no result at all.
fn shape(point: &GridPoint, chunks: Vec<Chunk>) -> Option<EvaluationResult> {
    let result = EvaluationResult::new(
        point.question.clone(),
        point.strategy.clone(),
        point.params,
        chunks,
    );

    match point.strategy {
        StrategyTag::WeightedRelevance if result.selected_chunks.is_empty() => {
            debug!(
                index = point.index,
                question = %point.question,
                "Omitting weighted relevance result with no chunks"
            );
            None
        }
        StrategyTag::WeightedRelevance => {
            Some(result.with_details(StrategyDetails::WeightedRelevance))
        }
        StrategyTag::TopicClassification => {
            let topic_relevance = result
                .selected_chunks
                .iter()
                .map(|chunk| TopicRelevance {
                    chunk_id: chunk.id.clone(),
                    score: chunk.topic_relevance_score.unwrap_or(chunk.relevance_score),
                })
                .collect();

            Some(result.with_details(StrategyDetails::TopicClassification { topic_relevance }))
        }
        _ => Some(result),
    }
}
