//! Retrieval provider implementations

mod factory;
mod http;
mod http_client;
mod in_memory;

pub use factory::create_retrieval_factory;
pub use http::{HttpRetrievalConfig, HttpRetrievalProvider, HttpRetrievalProviderFactory};
pub use http_client::{HttpClient, HttpClientTrait};
pub use in_memory::{
    InMemoryRetrievalProvider, InMemoryRetrievalProviderFactory, TOPIC_METADATA_KEY,
};
