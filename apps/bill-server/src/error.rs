//! Error types for the HTTP boundary.
//!
//! Every failure becomes one JSON body, `{"status": "error", "message": ...}`,
//! with a status code picked from the error kind.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::{error, warn};

use billsplit_core::CoreError;
use billsplit_ledger::{LedgerError, ReconcileFailure};

/// Boundary error: a status code plus the cause's message.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

/// Wire shape of every response body.
#[derive(Debug, Serialize)]
pub struct StatusBody {
    pub status: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        ApiError {
            status,
            message: message.into(),
        }
    }
}

fn core_status(err: &CoreError) -> StatusCode {
    match err {
        CoreError::MissingAttribution { .. }
        | CoreError::UnresolvedMember { .. }
        | CoreError::Validation(_) => StatusCode::BAD_REQUEST,
        CoreError::ValidationMismatch { .. }
        | CoreError::UnsupportedSplit
        | CoreError::NoMembers => StatusCode::UNPROCESSABLE_ENTITY,
    }
}

fn ledger_status(err: &LedgerError) -> StatusCode {
    match err {
        LedgerError::Core(core) => core_status(core),
        LedgerError::GroupNotFound(_) => StatusCode::NOT_FOUND,
        LedgerError::EmptyGroup(_) => StatusCode::UNPROCESSABLE_ENTITY,
        LedgerError::Remote { .. }
        | LedgerError::Directory(_)
        | LedgerError::Transport(_)
        | LedgerError::Parse(_) => StatusCode::BAD_GATEWAY,
        LedgerError::Cache(_) | LedgerError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        ApiError::new(core_status(&err), err.to_string())
    }
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        ApiError::new(ledger_status(&err), err.to_string())
    }
}

impl From<ReconcileFailure> for ApiError {
    fn from(failure: ReconcileFailure) -> Self {
        if failure.error.is_client_error() {
            warn!(stage = %failure.stage, error = %failure.error, "Bill rejected");
        } else {
            error!(stage = %failure.stage, error = %failure.error, "Reconciliation failed");
        }
        failure.error.into()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::new(
            StatusCode::BAD_REQUEST,
            format!("Invalid input: {}", rejection.body_text()),
        )
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = StatusBody {
            status: "error",
            message: self.message,
            reference: None,
        };
        (self.status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use billsplit_core::{Money, ValidationError};

    #[test]
    fn test_status_mapping() {
        let cases: Vec<(LedgerError, StatusCode)> = vec![
            (
                CoreError::MissingAttribution {
                    item_name: "Soda".into(),
                }
                .into(),
                StatusCode::BAD_REQUEST,
            ),
            (
                CoreError::Validation(ValidationError::required("items")).into(),
                StatusCode::BAD_REQUEST,
            ),
            (
                CoreError::ValidationMismatch {
                    expected: Money::from_cents(2400),
                    actual: Money::from_cents(2500),
                }
                .into(),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                CoreError::UnsupportedSplit.into(),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                LedgerError::GroupNotFound("Trip".into()),
                StatusCode::NOT_FOUND,
            ),
            (LedgerError::EmptyGroup(1), StatusCode::UNPROCESSABLE_ENTITY),
            (
                LedgerError::Remote {
                    status: 401,
                    body: "nope".into(),
                },
                StatusCode::BAD_GATEWAY,
            ),
            (
                LedgerError::Cache("disk".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            let message = err.to_string();
            let api: ApiError = err.into();
            assert_eq!(api.status, expected, "{message}");
            assert_eq!(api.message, message);
        }
    }
}
