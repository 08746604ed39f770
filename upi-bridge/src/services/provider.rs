//! Payment provider abstraction.
//!
//! The relay only depends on [`PaymentProvider`], so tests and alternative
//! gateways can stand in for the real ZapUPI client.

use async_trait::async_trait;
use rust_decimal::Decimal;
use secrecy::ExposeSecret;
use serde_json::{Map, Value};
use std::time::Duration;
use thiserror::Error;

use crate::config::ProviderCredentials;

/// Error type for provider calls that never produced a usable answer.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Payment provider did not respond within {0:?}")]
    Timeout(Duration),

    #[error("Payment provider unreachable: {0}")]
    Transport(String),

    #[error("Payment provider returned an unreadable response: {0}")]
    InvalidResponse(String),
}

/// Form fields sent to the provider's order-creation endpoint.
///
/// Built fresh per request and never persisted.
#[derive(Debug, Clone)]
pub struct ProviderPayload {
    pub credentials: ProviderCredentials,
    pub order_id: String,
    pub amount: Decimal,
    pub mobile: Option<String>,
    pub remark: Option<String>,
    pub redirect_url: Option<String>,
    pub webhook_url: Option<String>,
}

impl ProviderPayload {
    /// Field names and values in the provider's wire format.
    pub fn form_fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = vec![
            (
                "token_key",
                self.credentials.token_key.expose_secret().clone(),
            ),
            (
                "secret_key",
                self.credentials.secret_key.expose_secret().clone(),
            ),
            ("amount", self.amount.to_string()),
            ("order_id", self.order_id.clone()),
        ];

        // ZapUPI spells it "custumer"
        if let Some(mobile) = &self.mobile {
            fields.push(("custumer_mobile", mobile.clone()));
        }
        if let Some(remark) = &self.remark {
            fields.push(("remark", remark.clone()));
        }
        if let Some(url) = &self.redirect_url {
            fields.push(("redirect_url", url.clone()));
        }
        if let Some(url) = &self.webhook_url {
            fields.push(("webhook_url", url.clone()));
        }

        fields
    }
}

/// Provider answer, kept as an open JSON object.
///
/// Only `status` is interpreted; everything else is passed through.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderResponse(Map<String, Value>);

impl ProviderResponse {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    pub fn from_body(body: &str) -> Result<Self, ProviderError> {
        match serde_json::from_str::<Value>(body) {
            Ok(Value::Object(fields)) => Ok(Self(fields)),
            Ok(other) => Err(ProviderError::InvalidResponse(format!(
                "expected a JSON object, got {}",
                json_kind(&other)
            ))),
            Err(e) => Err(ProviderError::InvalidResponse(e.to_string())),
        }
    }

    pub fn is_success(&self) -> bool {
        self.0.get("status").and_then(Value::as_str) == Some("success")
    }

    pub fn status(&self) -> Option<&Value> {
        self.0.get("status")
    }

    /// Provider's failure description, if it sent a non-empty one.
    pub fn message(&self) -> Option<String> {
        match self.0.get("message")? {
            Value::Null => None,
            Value::String(text) if text.trim().is_empty() => None,
            Value::String(text) => Some(text.clone()),
            other => Some(other.to_string()),
        }
    }

    pub fn payment_url(&self) -> Option<&Value> {
        self.0.get("payment_url")
    }

    pub fn order_id(&self) -> Option<&Value> {
        self.0.get("order_id")
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// A gateway able to create UPI payment orders.
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    /// Short lowercase name, also used as the webhook path segment.
    fn name(&self) -> &str;

    /// Perform exactly one order-creation call. No retries.
    async fn create_order(
        &self,
        payload: &ProviderPayload,
    ) -> Result<ProviderResponse, ProviderError>;
}
