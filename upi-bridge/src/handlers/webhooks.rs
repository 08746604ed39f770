use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, Path, State},
    http::HeaderMap,
    Json,
};

use crate::{dtos::WebhookAck, error::WebhookRejection, AppState};

/// Provider webhook.
///
/// Acknowledges as soon as the event is captured. Every failure path ends in
/// an explicit `{ "received": false }` response.
pub async fn receive(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<WebhookAck>, WebhookRejection> {
    let body = body.map_err(|e| {
        tracing::warn!(provider = %provider, error = %e, "Failed to read webhook body");
        WebhookRejection::MalformedPayload(e.body_text())
    })?;

    state.webhooks.receive(&provider, &headers, &body)?;

    Ok(Json(WebhookAck::accepted()))
}
