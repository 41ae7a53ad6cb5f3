//! Uniform `{ success, data | error }` bodies.

use crate::errors::Error;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tracing::error;

/// Body of every response.
#[derive(Debug, Serialize)]
pub struct ActionResult<T: Serialize> {
    /// Whether the operation committed
    pub success: bool,
    /// Payload of a successful operation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// Human-readable failure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// 200 with `{ success: true, data }`.
pub fn ok<T: Serialize>(data: T) -> Response {
    respond(StatusCode::OK, data)
}

/// 201 with `{ success: true, data }`.
pub fn created<T: Serialize>(data: T) -> Response {
    respond(StatusCode::CREATED, data)
}

fn respond<T: Serialize>(status: StatusCode, data: T) -> Response {
    (
        status,
        Json(ActionResult {
            success: true,
            data: Some(data),
            error: None,
        }),
    )
        .into_response()
}

/// HTTP status for each failure.
#[must_use]
pub const fn status_for(err: &Error) -> StatusCode {
    match err {
        Error::Validation { .. } | Error::Parse { .. } => StatusCode::BAD_REQUEST,
        Error::ProductNotFound { .. }
        | Error::EmployeeNotFound { .. }
        | Error::LoanNotFound { .. } => StatusCode::NOT_FOUND,
        Error::InsufficientStock { .. }
        | Error::InvalidTransition { .. }
        | Error::DuplicateCode { .. }
        | Error::EmployeeHasActiveLoans { .. } => StatusCode::CONFLICT,
        Error::Config { .. } | Error::Database(_) | Error::Io(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = status_for(&self);
        if status.is_server_error() {
            error!("Request failed: {self}");
        }
        (
            status,
            Json(ActionResult::<()> {
                success: false,
                data: None,
                error: Some(self.to_string()),
            }),
        )
            .into_response()
    }
}
