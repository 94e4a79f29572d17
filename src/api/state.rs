//! Application state for shared services

use std::sync::Arc;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use tokio_util::sync::CancellationToken;

use crate::domain::{BatchReport, BatchRequest, DomainError, RetrievalProviderFactory};
use crate::infrastructure::services::EvaluationService;

/// Application state shared by all handlers
#[derive(Clone)]
pub struct AppState {
    pub evaluation_service: Arc<dyn EvaluationServiceTrait>,
    pub retrieval_factory: Arc<dyn RetrievalProviderFactory>,
}

impl AppState {
    pub fn new(
        evaluation_service: Arc<dyn EvaluationServiceTrait>,
        retrieval_factory: Arc<dyn RetrievalProviderFactory>,
    ) -> Self {
        Self {
            evaluation_service,
            retrieval_factory,
        }
    }
}

/// Batch evaluation as seen by the HTTP layer
#[cfg_attr(test, automock)]
#[async_trait]
pub trait EvaluationServiceTrait: Send + Sync {
    async fn evaluate(
        &self,
        request: BatchRequest,
        cancel: &CancellationToken,
    ) -> Result<BatchReport, DomainError>;
}

#[async_trait]
impl EvaluationServiceTrait for EvaluationService {
    async fn evaluate(
        &self,
        request: BatchRequest,
        cancel: &CancellationToken,
    ) -> Result<BatchReport, DomainError> {
        EvaluationService::evaluate(self, request, cancel).await
    }
}
