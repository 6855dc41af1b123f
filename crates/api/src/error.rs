//! Error responses.
//!
//! Every failing endpoint answers with `{ "error": ..., "details"?: ... }`.
//! `error` is shown to the user as is; `details` carries the underlying cause
//! for server-side failures and for requests axum could not extract.

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use ledgerbook_core::ledger::ErrorBody;
use ledgerbook_db::repositories::TransactionError;
use ledgerbook_shared::AppError;
use tracing::{debug, error};

/// An [`AppError`] on its way to becoming an HTTP response.
#[derive(Debug)]
pub struct ApiError {
    error: AppError,
    details: Option<String>,
}

impl ApiError {
    /// 400 with `message`.
    pub fn validation(message: impl Into<String>) -> Self {
        AppError::Validation(message.into()).into()
    }

    /// 404 with `message`.
    pub fn not_found(message: impl Into<String>) -> Self {
        AppError::NotFound(message.into()).into()
    }

    /// 500 for a failed database call; the cause is logged and sent as `details`.
    pub fn database(message: &str, cause: &impl std::fmt::Display) -> Self {
        let error = AppError::Database(message.to_string());
        error!(code = error.error_code(), error = %cause, "{message}");
        Self {
            error,
            details: Some(cause.to_string()),
        }
    }

    /// 400 for a request that could not be extracted, with axum's reason as `details`.
    fn rejected(message: &str, reason: String) -> Self {
        let error = AppError::Validation(message.to_string());
        debug!(code = error.error_code(), %reason, "{message}");
        Self {
            error,
            details: Some(reason),
        }
    }

    /// Maps a repository error, using `message` for database failures.
    pub fn from_transaction(message: &str, err: &TransactionError) -> Self {
        match err {
            TransactionError::NotFound(_) => Self::not_found("Transaction not found."),
            TransactionError::ClientNotFound(_) => Self::not_found("Client not found."),
            TransactionError::AmountOutOfRange => Self::validation("Amounts are out of range."),
            TransactionError::NegativeAmount => Self::validation("Amounts cannot be negative."),
            TransactionError::Database(cause) => Self::database(message, cause),
        }
    }

    /// The wrapped application error.
    #[must_use]
    pub const fn app_error(&self) -> &AppError {
        &self.error
    }
}

impl From<AppError> for ApiError {
    fn from(error: AppError) -> Self {
        Self {
            error,
            details: None,
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::rejected("Request body is not valid JSON for this endpoint.", rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::rejected("Invalid path parameter.", rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::rejected("Invalid query string.", rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.error.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let mut body = ErrorBody::new(self.error.message());
        if let Some(details) = self.details {
            body = body.with_details(details);
        }
        (status, Json(body)).into_response()
    }
}
