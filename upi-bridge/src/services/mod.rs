pub mod order_id;
pub mod provider;
pub mod relay;
pub mod webhook;
pub mod zapupi;

pub use order_id::OrderIdGenerator;
pub use provider::{PaymentProvider, ProviderError, ProviderPayload, ProviderResponse};
pub use relay::OrderRelay;
pub use webhook::{
    spawn_event_processor, HmacSignatureVerifier, NoopVerifier, WebhookEvent, WebhookReceiver,
    WebhookVerifier,
};
pub use zapupi::ZapUpiClient;
