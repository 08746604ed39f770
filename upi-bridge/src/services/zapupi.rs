//! ZapUPI provider client.
//!
//! Posts form-encoded orders to `{base_url}/api/create-order` with a bounded
//! timeout. The HTTP status is not trusted; the JSON `status` field decides.

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use super::provider::{PaymentProvider, ProviderError, ProviderPayload, ProviderResponse};
use crate::config::PROVIDER_NAME;

pub const CREATE_ORDER_PATH: &str = "/api/create-order";

#[derive(Clone, Debug)]
pub struct ZapUpiClient {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl ZapUpiClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::Transport(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout,
        })
    }

    pub fn create_order_url(&self) -> String {
        format!("{}{}", self.base_url, CREATE_ORDER_PATH)
    }

    fn map_transport_error(&self, err: reqwest::Error) -> ProviderError {
        if err.is_timeout() {
            ProviderError::Timeout(self.timeout)
        } else {
            ProviderError::Transport(err.without_url().to_string())
        }
    }
}

#[async_trait]
impl PaymentProvider for ZapUpiClient {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    async fn create_order(
        &self,
        payload: &ProviderPayload,
    ) -> Result<ProviderResponse, ProviderError> {
        let response = self
            .client
            .post(self.create_order_url())
            .form(&payload.form_fields())
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        tracing::debug!(
            http_status = %status,
            order_id = %payload.order_id,
            body_len = body.len(),
            "ZapUPI create-order response"
        );

        ProviderResponse::from_body(&body)
    }
}
