//! Body extractor for browser and server clients.
//!
//! Order requests arrive either as JSON or as `application/x-www-form-urlencoded`
//! form posts. Rejections are rendered in the relay's `{ ok: false }` envelope
//! instead of axum's plain-text defaults.

use axum::async_trait;
use axum::body::Bytes;
use axum::extract::{FromRequest, Request};
use axum::http::header::CONTENT_TYPE;
use axum::Form;
use serde::de::DeserializeOwned;

use crate::error::RelayError;

/// Deserializes the body as a form when the content type says so, else as JSON.
///
/// An empty JSON body is read as `{}` so that missing fields surface as
/// validation errors rather than parse errors.
#[derive(Debug, Clone)]
pub struct JsonOrForm<T>(pub T);

fn is_form(req: &Request) -> bool {
    req.headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|ct| ct.starts_with("application/x-www-form-urlencoded"))
        .unwrap_or(false)
}

#[async_trait]
impl<T, S> FromRequest<S> for JsonOrForm<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = RelayError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        if is_form(&req) {
            let Form(value) = Form::<T>::from_request(req, state).await.map_err(|e| {
                RelayError::Validation(format!("Invalid form body: {}", e.body_text()))
            })?;
            return Ok(Self(value));
        }

        let bytes = Bytes::from_request(req, state).await.map_err(|e| {
            RelayError::Validation(format!("Invalid request body: {}", e.body_text()))
        })?;
        let bytes = if bytes.iter().all(u8::is_ascii_whitespace) {
            Bytes::from_static(b"{}")
        } else {
            bytes
        };

        let value = serde_json::from_slice(&bytes)
            .map_err(|e| RelayError::Validation(format!("Invalid JSON body: {}", e)))?;
        Ok(Self(value))
    }
}
