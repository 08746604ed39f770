use axum::{extract::State, Extension, Json};
use service_core::middleware::tracing::RequestId;

use crate::{
    dtos::{CreateOrderRequest, CreateOrderResponse},
    error::RelayError,
    middleware::JsonOrForm,
    AppState,
};

/// Create a payment order with the provider.
///
/// Validation happens before any outbound call; the provider's payment link
/// and order id are returned verbatim on success.
pub async fn create_order(
    State(state): State<AppState>,
    request_id: Option<Extension<RequestId>>,
    JsonOrForm(payload): JsonOrForm<CreateOrderRequest>,
) -> Result<Json<CreateOrderResponse>, RelayError> {
    let request_id = request_id.map(|Extension(id)| id.0).unwrap_or_default();

    let order = payload.into_validated().map_err(|e| {
        tracing::warn!(request_id = %request_id, error = %e, "Order request rejected");
        e
    })?;

    tracing::info!(
        request_id = %request_id,
        amount = %order.amount,
        has_mobile = order.mobile.is_some(),
        "Creating payment order"
    );

    let provider = state.relay.create_order(order).await?;

    Ok(Json(CreateOrderResponse::new(provider)))
}
