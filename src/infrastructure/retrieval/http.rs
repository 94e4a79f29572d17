//! Retrieval provider backed by a remote HTTP retrieval service

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::domain::{
    Chunk, DomainError, RetrievalProvider, RetrievalProviderFactory, StrategyTag,
    TuningParameters,
};

use super::http_client::HttpClientTrait;

const PROVIDER_TYPE: &str = "http";

#[derive(Debug, Deserialize)]
struct RetrieveResponse {
    #[serde(default)]
    chunks: Vec<Chunk>,
}

/// Connection settings shared by every handle
#[derive(Debug, Clone)]
pub struct HttpRetrievalConfig {
    pub base_url: String,
    pub api_key: Option<String>,
}

impl HttpRetrievalConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: None,
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    fn retrieve_url(&self) -> String {
        format!("{}/retrieve", self.base_url.trim_end_matches('/'))
    }
}

/// One handle onto the remote service
///
/// The configured strategy lives on the handle and is sent with every
/// retrieve call; the remote service itself is never reconfigured.
#[derive(Debug)]
pub struct HttpRetrievalProvider {
    client: Arc<dyn HttpClientTrait>,
    config: Arc<HttpRetrievalConfig>,
    configured: Option<(StrategyTag, TuningParameters)>,
}

impl HttpRetrievalProvider {
    pub fn new(client: Arc<dyn HttpClientTrait>, config: Arc<HttpRetrievalConfig>) -> Self {
        Self {
            client,
            config,
            configured: None,
        }
    }
}

#[async_trait]
impl RetrievalProvider for HttpRetrievalProvider {
    fn provider_type(&self) -> &'static str {
        PROVIDER_TYPE
    }

    async fn configure(
        &mut self,
        strategy: &StrategyTag,
        params: TuningParameters,
    ) -> Result<(), DomainError> {
        self.configured = Some((strategy.clone(), params));
        Ok(())
    }

    async fn retrieve(&self, query: &str) -> Result<Vec<Chunk>, DomainError> {
        let (strategy, params) = self.configured.as_ref().ok_or_else(|| {
            DomainError::provider(PROVIDER_TYPE, "retrieve called before configure")
        })?;

        let body = json!({
            "query": query,
            "strategy": strategy.as_str(),
            "kValue": params.k_value,
            "rValue": params.r_value,
        });

        let authorization = self
            .config
            .api_key
            .as_ref()
            .map(|key| format!("Bearer {}", key));
        let mut headers = vec![("Accept", "application/json")];
        if let Some(value) = authorization.as_deref() {
            headers.push(("Authorization", value));
        }

        let url = self.config.retrieve_url();
        let response = self.client.post_json(&url, headers, &body).await?;

        let parsed: RetrieveResponse = serde_json::from_value(response).map_err(|e| {
            DomainError::provider(PROVIDER_TYPE, format!("Invalid retrieve response: {}", e))
        })?;

        debug!(
            url = %url,
            strategy = %strategy,
            chunks = parsed.chunks.len(),
            "Remote retrieval completed"
        );

        Ok(parsed.chunks)
    }
}

/// Hands out handles sharing one HTTP client
#[derive(Debug, Clone)]
pub struct HttpRetrievalProviderFactory {
    client: Arc<dyn HttpClientTrait>,
    config: Arc<HttpRetrievalConfig>,
}

impl HttpRetrievalProviderFactory {
    pub fn new(client: Arc<dyn HttpClientTrait>, config: HttpRetrievalConfig) -> Self {
        Self {
            client,
            config: Arc::new(config),
        }
    }
}

#[async_trait]
impl RetrievalProviderFactory for HttpRetrievalProviderFactory {
    fn provider_type(&self) -> &'static str {
        PROVIDER_TYPE
    }

    async fn create(&self) -> Result<Box<dyn RetrievalProvider>, DomainError> {
        Ok(Box::new(HttpRetrievalProvider::new(
            Arc::clone(&self.client),
            Arc::clone(&self.config),
        )))
    }

    async fn check(&self) -> Result<(), DomainError> {
        self.client.reachable(&self.config.base_url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::retrieval::http_client::mock::MockHttpClient;
    use crate::infrastructure::retrieval::http_client::HttpClient;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_retrieve_against_remote_service() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/retrieve"))
            .and(header("Authorization", "Bearer secret"))
            .and(body_json(json!({
                "query": "what is borrowing?",
                "strategy": "weightedRelevance",
                "kValue": 2,
                "rValue": 0.25,
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "chunks": [
                    {"id": "c1", "content": "borrowing rules", "relevanceScore": 0.91},
                    {"id": "c7", "content": "references", "relevanceScore": 0.64,
                     "sourceMetadata": {"page": 12}}
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let factory = HttpRetrievalProviderFactory::new(
            Arc::new(HttpClient::new()),
            HttpRetrievalConfig::new(format!("{}/", server.uri())).with_api_key("secret"),
        );
        let mut provider = factory.create().await.unwrap();
        provider
            .configure(&StrategyTag::WeightedRelevance, TuningParameters::new(2, 0.25))
            .await
            .unwrap();

        let chunks = provider.retrieve("what is borrowing?").await.unwrap();

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].id, "c1");
        assert_eq!(chunks[1].source_metadata["page"], json!(12));
    }

    #[tokio::test]
    async fn test_upstream_error_is_provider_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/retrieve"))
            .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
            .mount(&server)
            .await;

        let factory = HttpRetrievalProviderFactory::new(
            Arc::new(HttpClient::new()),
            HttpRetrievalConfig::new(server.uri()),
        );
        let mut provider = factory.create().await.unwrap();
        provider
            .configure(&StrategyTag::Default, TuningParameters::new(3, 0.0))
            .await
            .unwrap();

        let error = provider.retrieve("q").await.unwrap_err();
        assert!(matches!(error, DomainError::Provider { .. }));
        assert!(error.to_string().contains("502"));
    }

    #[tokio::test]
    async fn test_malformed_response_is_provider_error() {
        let client = Arc::new(MockHttpClient::with_response(json!({"chunks": "nope"})));
        let mut provider = HttpRetrievalProvider::new(
            client,
            Arc::new(HttpRetrievalConfig::new("http://retrieval.local")),
        );
        provider
            .configure(&StrategyTag::Default, TuningParameters::new(1, 0.0))
            .await
            .unwrap();

        let error = provider.retrieve("q").await.unwrap_err();
        assert!(error.to_string().contains("Invalid retrieve response"));
    }

    #[tokio::test]
    async fn test_handles_carry_their_own_configuration() {
        let client = Arc::new(MockHttpClient::with_response(json!({"chunks": []})));
        let factory = HttpRetrievalProviderFactory::new(
            client.clone(),
            HttpRetrievalConfig::new("http://retrieval.local"),
        );

        let mut first = factory.create().await.unwrap();
        let mut second = factory.create().await.unwrap();
        first
            .configure(&StrategyTag::Default, TuningParameters::new(1, 0.1))
            .await
            .unwrap();
        second
            .configure(&StrategyTag::TopicClassification, TuningParameters::new(9, 0.9))
            .await
            .unwrap();

        first.retrieve("q").await.unwrap();
        second.retrieve("q").await.unwrap();

        let requests = client.requests();
        assert_eq!(requests[0].url, "http://retrieval.local/retrieve");
        assert_eq!(requests[0].body["strategy"], "default");
        assert_eq!(requests[1].body["strategy"], "topicClassification");
        assert_eq!(requests[1].body["kValue"], 9);
        assert!(requests[0].headers.iter().all(|(k, _)| k != "Authorization"));
    }

    #[tokio::test]
    async fn test_retrieve_requires_configure() {
        let client = Arc::new(MockHttpClient::with_error("unreachable"));
        let provider = HttpRetrievalProvider::new(
            client.clone(),
            Arc::new(HttpRetrievalConfig::new("http://retrieval.local")),
        );

        assert!(provider.retrieve("q").await.is_err());
        assert!(client.requests().is_empty());
    }

    #[tokio::test]
    async fn test_check_reaches_remote_service() {
        let server = MockServer::start().await;

        Mock::given(method("HEAD"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        let factory = HttpRetrievalProviderFactory::new(
            Arc::new(HttpClient::new()),
            HttpRetrievalConfig::new(server.uri()),
        );

        assert!(factory.check().await.is_ok());
    }

    #[tokio::test]
    async fn test_check_fails_when_service_is_down() {
        let base_url = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            format!("http://{}", listener.local_addr().unwrap())
        };

        let factory = HttpRetrievalProviderFactory::new(
            Arc::new(HttpClient::new()),
            HttpRetrievalConfig::new(base_url),
        );

        let error = factory.check().await.unwrap_err();
        assert!(matches!(error, DomainError::Provider { .. }));
        // handle creation stays local
        assert!(factory.create().await.is_ok());
    }
}
