use serde::Deserialize;

use crate::infrastructure::observability::ObservabilityConfig;

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub evaluation: EvaluationConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Batch execution settings
#[derive(Debug, Clone, Deserialize)]
pub struct EvaluationConfig {
    /// Sender role every batch must declare
    #[serde(default = "default_sender_role")]
    pub expected_sender_role: String,
    /// Grid points in flight at once; 1 runs sequentially on one handle
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
    /// Upper bound on one batch's wall time
    #[serde(default = "default_batch_timeout_secs")]
    pub batch_timeout_secs: u64,
    /// Largest grid (questions x strategies x kValues x rValues) a batch may span
    #[serde(default = "default_max_combinations")]
    pub max_combinations: usize,
    #[serde(default = "default_cluster_max_iterations")]
    pub cluster_max_iterations: usize,
    #[serde(default = "default_cluster_count")]
    pub default_cluster_count: usize,
}

/// Which retrieval backend evaluations run against
#[derive(Debug, Clone, Copy, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RetrievalProviderKind {
    #[default]
    Http,
    InMemory,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RetrievalConfig {
    #[serde(default)]
    pub provider: RetrievalProviderKind,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_retrieval_timeout_secs")]
    pub timeout_secs: u64,
    /// JSON array of chunks served by the in-memory provider
    #[serde(default)]
    pub corpus_path: Option<String>,
}

fn default_sender_role() -> String {
    "user".to_string()
}

fn default_max_concurrency() -> usize {
    1
}

fn default_batch_timeout_secs() -> u64 {
    300
}

fn default_max_combinations() -> usize {
    10_000
}

fn default_cluster_max_iterations() -> usize {
    100
}

fn default_cluster_count() -> usize {
    2
}

fn default_base_url() -> String {
    "http://localhost:9000".to_string()
}

fn default_retrieval_timeout_secs() -> u64 {
    30
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            expected_sender_role: default_sender_role(),
            max_concurrency: default_max_concurrency(),
            batch_timeout_secs: default_batch_timeout_secs(),
            max_combinations: default_max_combinations(),
            cluster_max_iterations: default_cluster_max_iterations(),
            default_cluster_count: default_cluster_count(),
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            provider: RetrievalProviderKind::default(),
            base_url: default_base_url(),
            api_key: None,
            timeout_secs: default_retrieval_timeout_secs(),
            corpus_path: None,
        }
    }
}

impl AppConfig {
    /// Load configuration from config files and `APP__*` environment variables
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
