//! Retrieval provider traits

use std::fmt::Debug;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

use crate::domain::evaluation::{Chunk, StrategyTag, TuningParameters};
use crate::domain::error::DomainError;

/// A handle onto an external retrieval backend
///
/// The handle carries the currently configured strategy. `configure` takes
/// `&mut self`, so a configure + retrieve step on one handle can never
/// interleave with another combination's configuration. Concurrent callers
/// must each own their own handle (see [`RetrievalProviderFactory`]).
#[async_trait]
pub trait RetrievalProvider: Send + Sync + Debug {
    /// Get the provider type name
    fn provider_type(&self) -> &'static str;

    /// Select the strategy and tuning parameters used by subsequent retrievals
    async fn configure(
        &mut self,
        strategy: &StrategyTag,
        params: TuningParameters,
    ) -> Result<(), DomainError>;

    /// Retrieve ranked chunks for a query, most relevant first
    async fn retrieve(&self, query: &str) -> Result<Vec<Chunk>, DomainError>;
}

/// Creates independently configurable provider handles
#[cfg_attr(test, automock)]
#[async_trait]
pub trait RetrievalProviderFactory: Send + Sync + Debug {
    /// Get the provider type name
    fn provider_type(&self) -> &'static str;

    /// Create a fresh, unconfigured provider handle
    async fn create(&self) -> Result<Box<dyn RetrievalProvider>, DomainError>;

    /// Verify the backend can serve retrievals
    ///
    /// Local backends only need to hand out a handle; remote ones override
    /// this to reach the service.
    async fn check(&self) -> Result<(), DomainError> {
        self.create().await.map(|_| ())
    }
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    /// One recorded retrieve call
    #[derive(Debug, Clone, PartialEq)]
    pub struct RecordedCall {
        pub query: String,
        pub strategy: StrategyTag,
        pub params: TuningParameters,
    }

    #[derive(Debug, Default)]
    struct MockState {
        by_strategy: HashMap<(String, StrategyTag), Vec<Chunk>>,
        by_query: HashMap<String, Vec<Chunk>>,
        fail_on_call: Option<usize>,
        delay: Option<Duration>,
        calls: Mutex<Vec<RecordedCall>>,
        call_count: AtomicUsize,
        handles_created: AtomicUsize,
    }

    /// Scripted retrieval provider for testing
    ///
    /// Clones share scripted responses and the call log; each clone keeps its
    /// own configured strategy, like independent handles onto one backend.
    #[derive(Debug, Clone)]
    pub struct MockRetrievalProvider {
        state: Arc<MockState>,
        configured: Option<(StrategyTag, TuningParameters)>,
    }

    impl Default for MockRetrievalProvider {
        fn default() -> Self {
            Self::new()
        }
    }

    impl MockRetrievalProvider {
        /// Create a mock returning no chunks for every query
        pub fn new() -> Self {
            Self {
                state: Arc::new(MockState::default()),
                configured: None,
            }
        }

        fn state_mut(&mut self) -> &mut MockState {
            Arc::get_mut(&mut self.state).expect("configure the mock before sharing it")
        }

        /// Return `chunks` for `query` under every strategy
        pub fn with_response(mut self, query: &str, chunks: Vec<Chunk>) -> Self {
            self.state_mut().by_query.insert(query.to_string(), chunks);
            self
        }

        /// Return `chunks` for `query` under one strategy only
        pub fn with_strategy_response(
            mut self,
            query: &str,
            strategy: StrategyTag,
            chunks: Vec<Chunk>,
        ) -> Self {
            self.state_mut()
                .by_strategy
                .insert((query.to_string(), strategy), chunks);
            self
        }

        /// Fail the nth retrieve call (1-based)
        pub fn failing_on_call(mut self, call: usize) -> Self {
            self.state_mut().fail_on_call = Some(call);
            self
        }

        /// Sleep before answering each retrieve call
        pub fn with_delay(mut self, delay: Duration) -> Self {
            self.state_mut().delay = Some(delay);
            self
        }

        /// Number of retrieve calls across all clones
        pub fn call_count(&self) -> usize {
            self.state.call_count.load(Ordering::SeqCst)
        }

        /// Recorded retrieve calls across all clones, in arrival order
        pub fn calls(&self) -> Vec<RecordedCall> {
            self.state.calls.lock().unwrap().clone()
        }

        /// Number of handles handed out by [`MockProviderFactory`]
        pub fn handles_created(&self) -> usize {
            self.state.handles_created.load(Ordering::SeqCst)
        }

        fn fresh_handle(&self) -> Self {
            self.state.handles_created.fetch_add(1, Ordering::SeqCst);
            Self {
                state: Arc::clone(&self.state),
                configured: None,
            }
        }
    }

    #[async_trait]
    impl RetrievalProvider for MockRetrievalProvider {
        fn provider_type(&self) -> &'static str {
            "mock"
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
            let (strategy, params) = self
                .configured
                .clone()
                .ok_or_else(|| DomainError::provider("mock", "retrieve called before configure"))?;

            let call = self.state.call_count.fetch_add(1, Ordering::SeqCst) + 1;

            if let Some(delay) = self.state.delay {
                tokio::time::sleep(delay).await;
            }

            if self.state.fail_on_call == Some(call) {
                return Err(DomainError::provider(
                    "mock",
                    format!("Mock provider configured to fail on call {}", call),
                ));
            }

            self.state.calls.lock().unwrap().push(RecordedCall {
                query: query.to_string(),
                strategy: strategy.clone(),
                params,
            });

            let chunks = self
                .state
                .by_strategy
                .get(&(query.to_string(), strategy))
                .or_else(|| self.state.by_query.get(query))
                .cloned()
                .unwrap_or_default();

            Ok(chunks)
        }
    }

    /// Factory handing out handles onto one [`MockRetrievalProvider`]
    #[derive(Debug, Clone)]
    pub struct MockProviderFactory {
        template: MockRetrievalProvider,
    }

    impl MockProviderFactory {
        pub fn new(template: MockRetrievalProvider) -> Self {
            Self { template }
        }
    }

    #[async_trait]
    impl RetrievalProviderFactory for MockProviderFactory {
        fn provider_type(&self) -> &'static str {
            "mock"
        }

        async fn create(&self) -> Result<Box<dyn RetrievalProvider>, DomainError> {
            Ok(Box::new(self.template.fresh_handle()))
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[tokio::test]
        async fn test_mock_requires_configure() {
            let provider = MockRetrievalProvider::new();
            assert!(provider.retrieve("q").await.is_err());
        }

        #[tokio::test]
        async fn test_mock_strategy_specific_response() {
            let mut provider = MockRetrievalProvider::new()
                .with_response("q", vec![Chunk::new("c1", "a", 0.9)])
                .with_strategy_response(
                    "q",
                    StrategyTag::WeightedRelevance,
                    vec![Chunk::new("c2", "b", 0.8)],
                );

            provider
                .configure(&StrategyTag::Default, TuningParameters::new(1, 0.0))
                .await
                .unwrap();
            assert_eq!(provider.retrieve("q").await.unwrap()[0].id, "c1");

            provider
                .configure(&StrategyTag::WeightedRelevance, TuningParameters::new(1, 0.0))
                .await
                .unwrap();
            assert_eq!(provider.retrieve("q").await.unwrap()[0].id, "c2");
            assert_eq!(provider.call_count(), 2);
        }

        #[tokio::test]
        async fn test_mock_failure_on_nth_call() {
            let mut provider = MockRetrievalProvider::new().failing_on_call(2);
            provider
                .configure(&StrategyTag::Default, TuningParameters::new(1, 0.0))
                .await
                .unwrap();

            assert!(provider.retrieve("a").await.is_ok());
            assert!(provider.retrieve("b").await.is_err());
            assert!(provider.retrieve("c").await.is_ok());
        }

        #[tokio::test]
        async fn test_factory_handles_share_log_but_not_configuration() {
            let template = MockRetrievalProvider::new();
            let factory = MockProviderFactory::new(template.clone());

            let mut first = factory.create().await.unwrap();
            let second = factory.create().await.unwrap();

            first
                .configure(&StrategyTag::Default, TuningParameters::new(2, 0.1))
                .await
                .unwrap();

            assert!(first.retrieve("q").await.is_ok());
            assert!(second.retrieve("q").await.is_err());
            assert_eq!(template.handles_created(), 2);
            assert_eq!(template.calls().len(), 1);
        }
    }
}
