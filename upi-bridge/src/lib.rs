pub mod config;
pub mod dtos;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod services;
pub mod startup;

use axum::middleware::from_fn;
use axum::{
    routing::{get, post},
    Router,
};
use service_core::middleware::{
    security_headers::security_headers_middleware,
    tracing::{make_request_span, request_id_middleware},
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use services::{OrderRelay, WebhookReceiver};

/// Shared request-handling state. Everything in it is read-only.
#[derive(Clone)]
pub struct AppState {
    pub relay: Arc<OrderRelay>,
    pub webhooks: Arc<WebhookReceiver>,
}

/// Build the HTTP router. Unmatched paths fall through to static files.
pub fn build_router(state: AppState, static_dir: &str) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .route("/api/create-order", post(handlers::orders::create_order))
        .route("/webhook/:provider", post(handlers::webhooks::receive))
        .fallback_service(ServeDir::new(static_dir))
        .layer(from_fn(security_headers_middleware))
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http().make_span_with(make_request_span::<axum::body::Body>),
        )
        .layer(from_fn(request_id_middleware))
        .with_state(state)
}
