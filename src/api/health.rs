//! Liveness and readiness probes

use std::time::Instant;

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use serde::Serialize;

use crate::api::types::Json;
use crate::domain::RetrievalProviderFactory;

use super::state::AppState;

#[derive(Serialize, Clone, Copy, PartialEq, Eq, Debug)]
#[serde(rename_all = "lowercase")]
pub enum ProbeStatus {
    Up,
    Down,
}

impl ProbeStatus {
    fn status_code(self) -> StatusCode {
        match self {
            Self::Up => StatusCode::OK,
            Self::Down => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: ProbeStatus,
    pub version: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<ProviderProbe>,
}

/// Outcome of obtaining one retrieval provider handle
#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ProviderProbe {
    pub name: &'static str,
    pub status: ProbeStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub latency_ms: u64,
}

pub async fn health_check() -> impl IntoResponse {
    Json(HealthResponse {
        status: ProbeStatus::Up,
        version: env!("CARGO_PKG_VERSION"),
        provider: None,
    })
}

/// Ready once the retrieval backend passes its check
///
/// For the HTTP provider this reaches `base_url`; the in-memory provider
/// only needs to hand out a handle.
pub async fn ready_check(State(state): State<AppState>) -> impl IntoResponse {
    let probe = probe_provider(state.retrieval_factory.as_ref()).await;
    let status = probe.status;

    (
        status.status_code(),
        Json(HealthResponse {
            status,
            version: env!("CARGO_PKG_VERSION"),
            provider: Some(probe),
        }),
    )
}

pub async fn live_check() -> impl IntoResponse {
    StatusCode::OK
}

async fn probe_provider(factory: &dyn RetrievalProviderFactory) -> ProviderProbe {
    let start = Instant::now();
    let outcome = factory.check().await;
    let latency_ms = start.elapsed().as_millis() as u64;

    match outcome {
        Ok(_) => ProviderProbe {
            name: factory.provider_type(),
            status: ProbeStatus::Up,
            error: None,
            latency_ms,
        },
        Err(e) => {
            tracing::warn!(provider = factory.provider_type(), error = %e, "Readiness probe failed");
            ProviderProbe {
                name: factory.provider_type(),
                status: ProbeStatus::Down,
                error: Some(e.to_string()),
                latency_ms,
            }
        }
    }
}
