//! Caller-facing error envelopes.
//!
//! Order creation failures render as `{ "ok": false, "error": "..." }` and
//! webhook rejections as `{ "received": false }`, each with a status code
//! that reflects the failure's nature.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::dtos::WebhookAck;
use crate::services::provider::ProviderError;

#[derive(Debug, Error)]
pub enum RelayError {
    /// Bad client input. Raised before any outbound call.
    #[error("{0}")]
    Validation(String),

    /// Server misconfigured, e.g. missing provider credentials.
    #[error("{0}")]
    Configuration(String),

    /// Transport failure or timeout reaching the provider.
    #[error("{message}")]
    ProviderUnavailable { message: String, timed_out: bool },

    /// Provider reachable but returned a non-success status.
    #[error("{0}")]
    ProviderRejected(String),
}

impl RelayError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            RelayError::Validation(_) => StatusCode::BAD_REQUEST,
            RelayError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            RelayError::ProviderUnavailable {
                timed_out: true, ..
            } => StatusCode::GATEWAY_TIMEOUT,
            RelayError::ProviderUnavailable { .. } => StatusCode::BAD_GATEWAY,
            RelayError::ProviderRejected(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl From<ProviderError> for RelayError {
    fn from(err: ProviderError) -> Self {
        let timed_out = matches!(err, ProviderError::Timeout(_));
        RelayError::ProviderUnavailable {
            message: err.to_string(),
            timed_out,
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorEnvelope {
    ok: bool,
    error: String,
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        (
            status,
            Json(ErrorEnvelope {
                ok: false,
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}

#[derive(Debug, Error)]
pub enum WebhookRejection {
    #[error("Unknown webhook provider: {0}")]
    UnknownProvider(String),

    #[error("Webhook signature verification failed")]
    InvalidSignature,

    #[error("Malformed webhook payload: {0}")]
    MalformedPayload(String),
}

impl WebhookRejection {
    /// Every rejection is a plain 400; the variant is only logged.
    pub fn status_code(&self) -> StatusCode {
        StatusCode::BAD_REQUEST
    }
}

impl IntoResponse for WebhookRejection {
    fn into_response(self) -> Response {
        (self.status_code(), Json(WebhookAck::rejected())).into_response()
    }
}
