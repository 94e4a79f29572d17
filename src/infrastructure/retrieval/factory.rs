//! Retrieval provider factory selection from configuration

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::config::{RetrievalConfig, RetrievalProviderKind};
use crate::domain::{DomainError, RetrievalProviderFactory};

use super::http::{HttpRetrievalConfig, HttpRetrievalProviderFactory};
use super::http_client::HttpClient;
use super::in_memory::InMemoryRetrievalProviderFactory;

/// Build the provider factory named by the retrieval configuration
pub async fn create_retrieval_factory(
    config: &RetrievalConfig,
) -> Result<Arc<dyn RetrievalProviderFactory>, DomainError> {
    match config.provider {
        RetrievalProviderKind::Http => {
            let client = HttpClient::with_timeout(Duration::from_secs(config.timeout_secs))?;

            let mut http_config = HttpRetrievalConfig::new(&config.base_url);
            if let Some(api_key) = config.api_key.as_deref().filter(|key| !key.is_empty()) {
                http_config = http_config.with_api_key(api_key);
            }

            info!(base_url = %config.base_url, "Using HTTP retrieval provider");

            Ok(Arc::new(HttpRetrievalProviderFactory::new(
                Arc::new(client),
                http_config,
            )))
        }
        RetrievalProviderKind::InMemory => {
            let factory = match &config.corpus_path {
                Some(path) => InMemoryRetrievalProviderFactory::from_path(path).await?,
                None => {
                    info!("No corpus configured, in-memory retrieval starts empty");
                    InMemoryRetrievalProviderFactory::new(Vec::new())
                }
            };

            Ok(Arc::new(factory))
        }
    }
}
