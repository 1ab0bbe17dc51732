//! HTTP error responses.
//!
//! Every failure is rendered as the `{ message, moreInfo }` envelope with a
//! status chosen from the error kind.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use scoreboard_core::messages::ApiEnvelope;
use serde_json::{json, Value};
use tracing::error;

use super::auth::AuthError;
use crate::ranking::RankingError;
use crate::service::{ClassifyError, OperationError};

/// Message sent with every 400 response.
pub const BAD_REQUEST_MESSAGE: &str = "what is that request lol goofy ahh";

/// Errors a score handler can return.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Classify(#[from] ClassifyError),
    #[error(transparent)]
    Operation(#[from] OperationError),
    /// Body or query string that could not be decoded at all.
    #[error("malformed request: {0}")]
    Malformed(String),
}

impl ApiError {
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Auth(_) => StatusCode::FORBIDDEN,
            Self::Classify(_) | Self::Malformed(_) => StatusCode::BAD_REQUEST,
            Self::Operation(OperationError::Timeout { .. }) => StatusCode::REQUEST_TIMEOUT,
            Self::Operation(OperationError::Overloaded) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Operation(OperationError::Ranking(err)) => match err {
                RankingError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
                RankingError::UnknownMode(_) | RankingError::RecordNotFound(_) => {
                    StatusCode::NOT_FOUND
                }
                RankingError::TransactionFailure(_)
                | RankingError::Storage(_)
                | RankingError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    fn envelope(&self) -> ApiEnvelope<Value> {
        match self {
            Self::Auth(err) => ApiEnvelope::error(err.to_string()),
            Self::Classify(ClassifyError::Validation { errors }) => {
                ApiEnvelope::error_with(BAD_REQUEST_MESSAGE, json!(errors))
            }
            Self::Classify(err) => {
                ApiEnvelope::error_with(BAD_REQUEST_MESSAGE, json!([err.to_string()]))
            }
            Self::Malformed(reason) => ApiEnvelope::error_with(BAD_REQUEST_MESSAGE, json!([reason])),
            Self::Operation(err) => match self.status() {
                StatusCode::BAD_REQUEST => {
                    ApiEnvelope::error_with(BAD_REQUEST_MESSAGE, json!([err.to_string()]))
                }
                StatusCode::NOT_FOUND => ApiEnvelope::error_with("Not found.", json!(err.to_string())),
                StatusCode::REQUEST_TIMEOUT => ApiEnvelope::error("Request timed out."),
                StatusCode::SERVICE_UNAVAILABLE => {
                    ApiEnvelope::error("Server overloaded, try again later.")
                }
                _ => ApiEnvelope::error("Internal server error."),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() && status != StatusCode::SERVICE_UNAVAILABLE {
            error!(error = %self, "request failed");
        }
        (status, Json(self.envelope())).into_response()
    }
}
