//! Application startup and lifecycle management.

use crate::config::{Config, PROVIDER_NAME};
use crate::services::{
    spawn_event_processor, HmacSignatureVerifier, NoopVerifier, OrderIdGenerator, OrderRelay,
    PaymentProvider, WebhookReceiver, WebhookVerifier, ZapUpiClient,
};
use crate::{build_router, AppState};
use axum::http::HeaderName;
use axum::Router;
use service_core::error::AppError;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    router: Router,
    processor: JoinHandle<()>,
}

impl Application {
    /// Build the application against the ZapUPI API configured in `config`.
    pub async fn build(config: Config) -> Result<Self, AppError> {
        let client = ZapUpiClient::new(config.provider.base_url.clone(), config.provider.timeout)
            .map_err(|e| {
                tracing::error!("Failed to create ZapUPI client: {}", e);
                AppError::InternalError(e.into())
            })?;

        Self::build_with_provider(config, Arc::new(client)).await
    }

    /// Build the application around any payment provider.
    pub async fn build_with_provider(
        config: Config,
        provider: Arc<dyn PaymentProvider>,
    ) -> Result<Self, AppError> {
        if config.provider.credentials.is_none() {
            tracing::warn!(
                "ZapUPI credentials not configured (API_TOKEN/SECRET_KEY) - order creation will fail"
            );
        }

        let relay = OrderRelay::new(
            provider,
            config.provider.credentials.clone(),
            OrderIdGenerator::new(config.orders.id_prefix.clone()),
            config.provider.timeout,
        )
        .with_callbacks(config.callbacks.clone());

        let verifier: Arc<dyn WebhookVerifier> = match &config.webhook.secret {
            Some(secret) => {
                let header = HeaderName::try_from(config.webhook.signature_header.as_str())
                    .map_err(|e| {
                        AppError::config(format!(
                            "WEBHOOK_SIGNATURE_HEADER is not a valid header name: {}",
                            e
                        ))
                    })?;
                tracing::info!(header = %header, "Webhook signature verification enabled");
                Arc::new(HmacSignatureVerifier::new(secret.clone(), header))
            }
            None => {
                tracing::info!("Webhook signature verification disabled");
                Arc::new(NoopVerifier)
            }
        };

        let (events_tx, events_rx) = mpsc::channel(config.webhook.queue_capacity);
        let processor = spawn_event_processor(events_rx);
        let webhooks = WebhookReceiver::new(PROVIDER_NAME, verifier, events_tx);

        let state = AppState {
            relay: Arc::new(relay),
            webhooks: Arc::new(webhooks),
        };
        let router = build_router(state, &config.static_dir);

        // Port 0 = random port for testing
        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind HTTP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!(port, provider = PROVIDER_NAME, "UPI bridge ready");

        Ok(Self {
            port,
            listener,
            router,
            processor,
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Serve until Ctrl-C, then let the webhook processor drain.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        tracing::info!("Listening on {}", self.listener.local_addr()?);

        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        if let Err(e) = self.processor.await {
            tracing::error!("Webhook processor ended abnormally: {}", e);
        }

        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
