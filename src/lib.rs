//! Retrieval Strategy Evaluation
//!
//! Evaluates retrieval strategies over a grid of questions and tuning
//! parameters, with support for:
//! - Sequential or concurrent grid execution against a retrieval provider
//! - Relevance statistics and one-dimensional score clustering
//! - Pairwise chunk-level comparison between strategies

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use std::sync::Arc;

use api::state::AppState;
use domain::RetrievalProviderFactory;
use infrastructure::retrieval::create_retrieval_factory;
use infrastructure::services::{EvaluationService, EvaluationSettings};
use tracing::info;

/// Build the evaluation service and the provider factory it runs against
pub async fn create_evaluation_service(
    config: &AppConfig,
) -> anyhow::Result<(Arc<EvaluationService>, Arc<dyn RetrievalProviderFactory>)> {
    let settings = EvaluationSettings::from_config(&config.evaluation)?;
    let factory = create_retrieval_factory(&config.retrieval).await?;

    info!(
        provider = factory.provider_type(),
        expected_sender_role = %settings.expected_role,
        max_concurrency = settings.max_concurrency,
        "Evaluation service initialized"
    );

    let service = Arc::new(EvaluationService::new(Arc::clone(&factory), settings));

    Ok((service, factory))
}

/// Create the application state with default configuration
pub async fn create_app_state() -> anyhow::Result<AppState> {
    create_app_state_with_config(&AppConfig::default()).await
}

/// Create the application state with custom configuration
pub async fn create_app_state_with_config(config: &AppConfig) -> anyhow::Result<AppState> {
    let (service, factory) = create_evaluation_service(config).await?;

    Ok(AppState::new(service, factory))
}
