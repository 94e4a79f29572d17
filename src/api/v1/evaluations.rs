//! Batch evaluation endpoint

use std::sync::Arc;

use axum::extract::State;
use tokio_util::sync::CancellationToken;
use tracing::error;

use crate::api::state::AppState;
use crate::api::types::{ApiError, Json};
use crate::domain::{BatchReport, BatchRequest, DomainError};

/// POST /v1/evaluations
///
/// The batch runs on its own task. If the client goes away the handler
/// future is dropped, the guard cancels the token and the batch is abandoned.
pub async fn create_evaluation(
    State(state): State<AppState>,
    Json(request): Json<BatchRequest>,
) -> Result<Json<BatchReport>, ApiError> {
    let cancel = CancellationToken::new();
    let _guard = cancel.clone().drop_guard();

    let service = Arc::clone(&state.evaluation_service);
    let task = tokio::spawn(async move { service.evaluate(request, &cancel).await });

    let report = task.await.map_err(|e| {
        error!(error = %e, "Evaluation task failed");
        DomainError::internal("evaluation task failed")
    })??;

    Ok(Json(report))
}
