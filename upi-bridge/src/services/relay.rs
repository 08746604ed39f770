//! Order relay: credential injection, outbound call and response translation.

use secrecy::ExposeSecret;
use std::sync::Arc;
use std::time::Duration;

use super::order_id::OrderIdGenerator;
use super::provider::{PaymentProvider, ProviderError, ProviderPayload, ProviderResponse};
use crate::config::{CallbackConfig, ProviderCredentials};
use crate::dtos::{ProviderLink, ValidatedOrder};
use crate::error::RelayError;

pub const DEFAULT_REJECTION_MESSAGE: &str = "ZapUPI error";
pub const MISSING_CREDENTIALS_MESSAGE: &str = "Payment provider credentials are not configured";
const REDACTED: &str = "[REDACTED]";

pub struct OrderRelay {
    provider: Arc<dyn PaymentProvider>,
    credentials: Option<ProviderCredentials>,
    order_ids: OrderIdGenerator,
    callbacks: CallbackConfig,
    timeout: Duration,
}

impl OrderRelay {
    pub fn new(
        provider: Arc<dyn PaymentProvider>,
        credentials: Option<ProviderCredentials>,
        order_ids: OrderIdGenerator,
        timeout: Duration,
    ) -> Self {
        Self {
            provider,
            credentials,
            order_ids,
            callbacks: CallbackConfig::default(),
            timeout,
        }
    }

    pub fn with_callbacks(mut self, callbacks: CallbackConfig) -> Self {
        self.callbacks = callbacks;
        self
    }

    pub fn is_configured(&self) -> bool {
        self.credentials.is_some()
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Create an order with the provider and return its payment link.
    ///
    /// The provider call runs on its own task: if the caller goes away the
    /// call still completes (the provider may already have created the order),
    /// but never beyond the configured timeout.
    pub async fn create_order(&self, order: ValidatedOrder) -> Result<ProviderLink, RelayError> {
        let credentials = self.credentials.clone().ok_or_else(|| {
            tracing::error!("Order rejected: provider credentials missing");
            RelayError::Configuration(MISSING_CREDENTIALS_MESSAGE.to_string())
        })?;

        let order_id = self.order_ids.next_id();
        let payload = ProviderPayload {
            credentials,
            order_id: order_id.clone(),
            amount: order.amount,
            mobile: order.mobile,
            remark: order.remark,
            redirect_url: self.callbacks.redirect_url.clone(),
            webhook_url: self.callbacks.webhook_url(self.provider.name()),
        };

        tracing::info!(
            order_id = %order_id,
            amount = %payload.amount,
            provider = %self.provider.name(),
            "Forwarding order to payment provider"
        );

        let response = self
            .dispatch(payload)
            .await
            .map_err(|e| self.redact_error(e))?;

        self.translate(&order_id, response)
    }

    /// Run the provider call on its own task and log its outcome there, so an
    /// order created after the caller left is still traceable.
    async fn dispatch(&self, payload: ProviderPayload) -> Result<ProviderResponse, RelayError> {
        let provider = Arc::clone(&self.provider);
        let timeout = self.timeout;

        let call = tokio::spawn(async move {
            let result = match tokio::time::timeout(timeout, provider.create_order(&payload)).await
            {
                Ok(result) => result,
                Err(_) => Err(ProviderError::Timeout(timeout)),
            };
            log_outcome(&payload.order_id, &result);
            result
        });

        match call.await {
            Ok(result) => result.map_err(RelayError::from),
            Err(e) => Err(RelayError::ProviderUnavailable {
                message: format!("Payment provider call aborted: {}", e),
                timed_out: false,
            }),
        }
    }

    fn translate(
        &self,
        order_id: &str,
        response: ProviderResponse,
    ) -> Result<ProviderLink, RelayError> {
        if !response.is_success() {
            let message = response
                .message()
                .unwrap_or_else(|| DEFAULT_REJECTION_MESSAGE.to_string());
            let message = self.redact(message);

            tracing::warn!(
                order_id = %order_id,
                status = ?response.status(),
                message = %message,
                "Payment provider rejected order"
            );
            return Err(RelayError::ProviderRejected(message));
        }

        Ok(ProviderLink {
            payment_url: response.payment_url().cloned(),
            order_id: response.order_id().cloned(),
        })
    }

    fn redact_error(&self, err: RelayError) -> RelayError {
        match err {
            RelayError::ProviderUnavailable { message, timed_out } => {
                RelayError::ProviderUnavailable {
                    message: self.redact(message),
                    timed_out,
                }
            }
            other => other,
        }
    }

    /// Strip configured credentials from provider-derived text.
    fn redact(&self, text: String) -> String {
        let Some(credentials) = &self.credentials else {
            return text;
        };

        [
            credentials.token_key.expose_secret(),
            credentials.secret_key.expose_secret(),
        ]
        .into_iter()
        .filter(|secret| !secret.is_empty())
        .fold(text, |text, secret| text.replace(secret.as_str(), REDACTED))
    }
}

fn log_outcome(order_id: &str, result: &Result<ProviderResponse, ProviderError>) {
    match result {
        Ok(response) if response.is_success() => {
            tracing::info!(
                order_id = %order_id,
                provider_order_id = ?response.order_id(),
                payment_url = ?response.payment_url(),
                "Payment order created"
            );
        }
        Ok(response) => {
            tracing::info!(
                order_id = %order_id,
                status = ?response.status(),
                "Payment provider answered without success"
            );
        }
        // Transport errors are built without URLs, so no credentials end up here
        Err(e) => {
            tracing::error!(order_id = %order_id, error = %e, "Payment provider call failed");
        }
    }
}
