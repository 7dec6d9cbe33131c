//! # HTTP Routes
//!
//! ```text
//! POST /process_bill   either bill shape → {"status": "success", ...}
//! GET  /health         "OK"
//! ```

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use tracing::info;

use billsplit_core::{BillInput, BillSubmission};

use crate::error::{ApiError, StatusBody};
use crate::state::AppState;

/// Message returned for a recorded expense.
pub const SUCCESS_MESSAGE: &str = "Expense added to Splitwise";

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/process_bill", post(process_bill))
        .route("/health", get(health_handler))
        .with_state(state)
}

/// Health check endpoint.
async fn health_handler() -> impl IntoResponse {
    "OK"
}

/// Reconciles one bill and records it in the ledger.
pub async fn process_bill(
    State(state): State<AppState>,
    payload: Result<Json<BillInput>, JsonRejection>,
) -> Result<Json<StatusBody>, ApiError> {
    let Json(input) = payload?;
    let submission = BillSubmission::try_from(input)?;

    let outcome = state.orchestrator.reconcile(&submission).await?;

    info!(
        request_id = %outcome.request_id,
        reference = %outcome.fingerprint,
        "Bill processed"
    );

    Ok(Json(StatusBody {
        status: "success",
        message: SUCCESS_MESSAGE.to_string(),
        reference: Some(outcome.fingerprint.to_string()),
    }))
}
