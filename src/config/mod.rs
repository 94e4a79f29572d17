//! Application configuration

mod app_config;

pub use app_config::{
    AppConfig, EvaluationConfig, LogFormat, LoggingConfig, RetrievalConfig, RetrievalProviderKind,
    ServerConfig,
};
