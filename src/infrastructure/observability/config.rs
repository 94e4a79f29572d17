//! Observability configuration

use serde::Deserialize;

/// `[observability]` section
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ObservabilityConfig {
    pub metrics: MetricsConfig,
}

/// Prometheus exporter settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// When false no recorder is installed and the scrape route is not mounted
    pub enabled: bool,
    /// Route the scrape endpoint is mounted on
    pub path: String,
}

impl MetricsConfig {
    /// Scrape route, normalised to start with `/`
    pub fn route(&self) -> String {
        let trimmed = self.path.trim();
        if trimmed.starts_with('/') {
            trimmed.to_string()
        } else {
            format!("/{trimmed}")
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: "/metrics".to_string(),
        }
    }
}
