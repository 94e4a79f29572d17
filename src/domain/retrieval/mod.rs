//! Retrieval domain - The external provider that executes strategies

mod provider;

pub use provider::{RetrievalProvider, RetrievalProviderFactory};

#[cfg(test)]
pub use provider::mock::{MockProviderFactory, MockRetrievalProvider, RecordedCall};
#[cfg(test)]
pub use provider::MockRetrievalProviderFactory;
