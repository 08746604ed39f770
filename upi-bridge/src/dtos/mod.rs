use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::str::FromStr;
use validator::Validate;

use crate::error::RelayError;

pub const INVALID_AMOUNT: &str = "Invalid amount";

/// Inbound order request, accepted as JSON or as a urlencoded form.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct CreateOrderRequest {
    #[serde(default)]
    pub amount: Option<RawAmount>,
    #[serde(default, deserialize_with = "text_or_number")]
    #[validate(length(max = 20, message = "mobile must be at most 20 characters"))]
    pub mobile: Option<String>,
    #[serde(default, deserialize_with = "text_or_number")]
    #[validate(length(max = 255, message = "remark must be at most 255 characters"))]
    pub remark: Option<String>,
}

/// Reads a free-text field that clients may also send as a bare JSON number.
fn text_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum TextOrNumber {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(
        Option::<TextOrNumber>::deserialize(deserializer)?.map(|value| match value {
            TextOrNumber::Text(text) => text,
            TextOrNumber::Number(number) => number.to_string(),
        }),
    )
}

/// Amount as the client sent it: a JSON number, or text from a form or JSON string.
///
/// Anything else (booleans, arrays, objects) is kept so it can be reported as an
/// invalid amount rather than a parse failure.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawAmount {
    Number(serde_json::Number),
    Text(String),
    Other(Value),
}

impl RawAmount {
    pub fn to_decimal(&self) -> Option<Decimal> {
        let text = match self {
            RawAmount::Number(number) => number.to_string(),
            RawAmount::Text(text) => text.trim().to_string(),
            RawAmount::Other(_) => return None,
        };
        Decimal::from_str(&text).ok()
    }
}

/// An order that passed validation and may be sent to the provider.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedOrder {
    pub amount: Decimal,
    pub mobile: Option<String>,
    pub remark: Option<String>,
}

impl CreateOrderRequest {
    pub fn into_validated(self) -> Result<ValidatedOrder, RelayError> {
        let amount = self
            .amount
            .as_ref()
            .and_then(RawAmount::to_decimal)
            .filter(|amount| *amount > Decimal::ZERO)
            .ok_or_else(|| RelayError::Validation(INVALID_AMOUNT.to_string()))?;

        self.validate()
            .map_err(|e| RelayError::Validation(e.to_string()))?;

        Ok(ValidatedOrder {
            amount,
            mobile: non_blank(self.mobile),
            remark: non_blank(self.remark),
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[derive(Debug, Serialize)]
pub struct CreateOrderResponse {
    pub ok: bool,
    pub provider: ProviderLink,
}

impl CreateOrderResponse {
    pub fn new(provider: ProviderLink) -> Self {
        Self { ok: true, provider }
    }
}

/// Provider fields relayed verbatim to the caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProviderLink {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_url: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_id: Option<Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookAck {
    pub received: bool,
}

impl WebhookAck {
    pub fn accepted() -> Self {
        Self { received: true }
    }

    pub fn rejected() -> Self {
        Self { received: false }
    }
}
