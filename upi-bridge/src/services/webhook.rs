//! Webhook intake.
//!
//! Notifications are verified, parsed and handed to a background processor
//! through a bounded queue. The HTTP acknowledgment never waits on
//! processing, so a slow consumer cannot drive the provider into retries.

use axum::http::{HeaderMap, HeaderName};
use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, Secret};
use serde_json::{Map, Value};
use std::sync::Arc;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;

use crate::error::WebhookRejection;

/// Pass/fail authenticity check over the raw notification.
pub trait WebhookVerifier: Send + Sync {
    fn verify(&self, headers: &HeaderMap, body: &[u8]) -> bool;
}

/// Accepts everything. Used when no webhook secret is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopVerifier;

impl WebhookVerifier for NoopVerifier {
    fn verify(&self, _headers: &HeaderMap, _body: &[u8]) -> bool {
        true
    }
}

/// Hex HMAC-SHA256 of the raw body, read from a configurable header.
pub struct HmacSignatureVerifier {
    secret: Secret<String>,
    header: HeaderName,
}

impl HmacSignatureVerifier {
    pub fn new(secret: Secret<String>, header: HeaderName) -> Self {
        Self { secret, header }
    }
}

impl WebhookVerifier for HmacSignatureVerifier {
    fn verify(&self, headers: &HeaderMap, body: &[u8]) -> bool {
        let Some(signature) = headers.get(&self.header).and_then(|v| v.to_str().ok()) else {
            tracing::warn!(header = %self.header, "Webhook signature header missing");
            return false;
        };

        service_core::utils::signature::verify_payload_signature(
            self.secret.expose_secret(),
            body,
            signature,
        )
        .unwrap_or_else(|e| {
            tracing::error!(error = %e, "Webhook signature verification error");
            false
        })
    }
}

/// A captured provider notification. No schema beyond "JSON object".
#[derive(Debug, Clone)]
pub struct WebhookEvent {
    pub provider: String,
    pub payload: Map<String, Value>,
    pub received_at: DateTime<Utc>,
}

impl WebhookEvent {
    pub fn order_id(&self) -> Option<&str> {
        self.payload.get("order_id").and_then(Value::as_str)
    }

    pub fn status(&self) -> Option<&str> {
        self.payload.get("status").and_then(Value::as_str)
    }
}

pub struct WebhookReceiver {
    provider: String,
    verifier: Arc<dyn WebhookVerifier>,
    events: mpsc::Sender<WebhookEvent>,
}

impl WebhookReceiver {
    pub fn new(
        provider: impl Into<String>,
        verifier: Arc<dyn WebhookVerifier>,
        events: mpsc::Sender<WebhookEvent>,
    ) -> Self {
        Self {
            provider: provider.into(),
            verifier,
            events,
        }
    }

    /// Verify, parse and capture one notification.
    ///
    /// `Ok` means the event was captured and may be acknowledged; downstream
    /// processing has not necessarily happened yet.
    pub fn receive(
        &self,
        provider: &str,
        headers: &HeaderMap,
        body: &[u8],
    ) -> Result<(), WebhookRejection> {
        if provider != self.provider {
            tracing::warn!(provider = %provider, "Webhook for unknown provider");
            return Err(WebhookRejection::UnknownProvider(provider.to_string()));
        }

        if !self.verifier.verify(headers, body) {
            tracing::warn!(provider = %provider, "Webhook rejected: invalid signature");
            return Err(WebhookRejection::InvalidSignature);
        }

        let payload = match serde_json::from_slice::<Value>(body) {
            Ok(Value::Object(payload)) => payload,
            Ok(_) => {
                tracing::warn!(provider = %provider, "Webhook payload is not a JSON object");
                return Err(WebhookRejection::MalformedPayload(
                    "expected a JSON object".to_string(),
                ));
            }
            Err(e) => {
                tracing::warn!(provider = %provider, error = %e, "Webhook payload unparseable");
                return Err(WebhookRejection::MalformedPayload(e.to_string()));
            }
        };

        let event = WebhookEvent {
            provider: provider.to_string(),
            payload,
            received_at: Utc::now(),
        };

        let payload = Value::Object(event.payload.clone());
        tracing::info!(
            provider = %event.provider,
            order_id = ?event.order_id(),
            status = ?event.status(),
            payload = %payload,
            "Webhook event captured"
        );

        match self.events.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(event)) => {
                tracing::warn!(
                    order_id = ?event.order_id(),
                    "Webhook queue full; event kept in log only"
                );
            }
            Err(TrySendError::Closed(event)) => {
                tracing::error!(
                    order_id = ?event.order_id(),
                    "Webhook processor stopped; event kept in log only"
                );
            }
        }

        Ok(())
    }
}

/// Drain the webhook queue until every sender is dropped.
pub fn spawn_event_processor(mut events: mpsc::Receiver<WebhookEvent>) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            process_event(&event);
        }
        tracing::debug!("Webhook processor stopped");
    })
}

/// Order-status hook. Persistence is out of scope; outcomes are logged.
fn process_event(event: &WebhookEvent) {
    let order_id = event.order_id().unwrap_or("-");
    let lag_ms = (Utc::now() - event.received_at).num_milliseconds();

    match event.status().map(str::to_ascii_lowercase).as_deref() {
        Some("success") | Some("completed") | Some("paid") => {
            tracing::info!(order_id = %order_id, lag_ms, "Payment confirmed by provider");
        }
        Some("failed") | Some("failure") | Some("cancelled") | Some("expired") => {
            tracing::warn!(order_id = %order_id, lag_ms, "Payment failed at provider");
        }
        Some(other) => {
            tracing::info!(order_id = %order_id, status = %other, lag_ms, "Payment status update");
        }
        None => {
            tracing::debug!(order_id = %order_id, "Webhook event without status");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use service_core::utils::signature::sign_payload;

    const BODY: &[u8] = br#"{"order_id":"BZR1700000000000","status":"Success","amount":"100"}"#;

    fn receiver(verifier: Arc<dyn WebhookVerifier>) -> (WebhookReceiver, mpsc::Receiver<WebhookEvent>) {
        let (tx, rx) = mpsc::channel(4);
        (WebhookReceiver::new("zapupi", verifier, tx), rx)
    }

    #[test]
    fn captured_event_is_queued() {
        let (receiver, mut rx) = receiver(Arc::new(NoopVerifier));

        receiver.receive("zapupi", &HeaderMap::new(), BODY).unwrap();

        let event = rx.try_recv().unwrap();
        assert_eq!(event.provider, "zapupi");
        assert_eq!(event.order_id(), Some("BZR1700000000000"));
        assert_eq!(event.status(), Some("Success"));
    }

    #[test]
    fn malformed_and_non_object_payloads_are_rejected() {
        let (receiver, mut rx) = receiver(Arc::new(NoopVerifier));

        for body in [&b"not json"[..], b"[1,2,3]", b"\"text\"", b""] {
            let err = receiver.receive("zapupi", &HeaderMap::new(), body).unwrap_err();
            assert!(matches!(err, WebhookRejection::MalformedPayload(_)));
        }
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn unknown_provider_is_rejected() {
        let (receiver, _rx) = receiver(Arc::new(NoopVerifier));
        let err = receiver.receive("razorpay", &HeaderMap::new(), BODY).unwrap_err();
        assert!(matches!(err, WebhookRejection::UnknownProvider(_)));
    }

    #[test]
    fn full_queue_still_acknowledges() {
        let (tx, _rx) = mpsc::channel(1);
        let receiver = WebhookReceiver::new("zapupi", Arc::new(NoopVerifier), tx);

        receiver.receive("zapupi", &HeaderMap::new(), BODY).unwrap();
        receiver.receive("zapupi", &HeaderMap::new(), BODY).unwrap();
    }

    #[test]
    fn hmac_verifier_checks_signature_header() {
        let header = HeaderName::from_static("x-webhook-signature");
        let verifier = HmacSignatureVerifier::new(Secret::new("whsec".to_string()), header.clone());
        let (receiver, _rx) = receiver(Arc::new(verifier));

        let mut headers = HeaderMap::new();
        let signature = sign_payload("whsec", BODY).unwrap();
        headers.insert(header.clone(), HeaderValue::from_str(&signature).unwrap());
        assert!(receiver.receive("zapupi", &headers, BODY).is_ok());

        headers.insert(header, HeaderValue::from_static("deadbeef"));
        assert!(matches!(
            receiver.receive("zapupi", &headers, BODY),
            Err(WebhookRejection::InvalidSignature)
        ));

        assert!(matches!(
            receiver.receive("zapupi", &HeaderMap::new(), BODY),
            Err(WebhookRejection::InvalidSignature)
        ));
    }

    #[tokio::test]
    async fn processor_drains_until_senders_drop() {
        let (tx, rx) = mpsc::channel(4);
        let handle = spawn_event_processor(rx);
        let receiver = WebhookReceiver::new("zapupi", Arc::new(NoopVerifier), tx);

        receiver.receive("zapupi", &HeaderMap::new(), BODY).unwrap();
        drop(receiver);

        tokio::time::timeout(std::time::Duration::from_secs(1), handle)
            .await
            .expect("processor should stop once the receiver is dropped")
            .unwrap();
    }
}
