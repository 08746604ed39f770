use secrecy::Secret;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;
use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

pub const PROVIDER_NAME: &str = "zapupi";
pub const DEFAULT_PROVIDER_BASE_URL: &str = "https://api.zapupi.com";
pub const DEFAULT_ORDER_ID_PREFIX: &str = "BZR";
pub const DEFAULT_PROVIDER_TIMEOUT_SECS: u64 = 15;
pub const DEFAULT_WEBHOOK_QUEUE_CAPACITY: usize = 1024;
pub const DEFAULT_SIGNATURE_HEADER: &str = "x-webhook-signature";

#[derive(Clone, Debug)]
pub struct Config {
    pub common: core_config::Config,
    pub provider: ProviderConfig,
    pub callbacks: CallbackConfig,
    pub orders: OrderConfig,
    pub webhook: WebhookConfig,
    pub static_dir: String,
    pub service_name: String,
}

#[derive(Clone, Debug)]
pub struct ProviderConfig {
    pub base_url: String,
    /// `None` when `API_TOKEN`/`SECRET_KEY` are unset; orders then fail with a
    /// configuration error instead of reaching the provider.
    pub credentials: Option<ProviderCredentials>,
    pub timeout: Duration,
}

/// Server-held provider credentials. Never serialized into a client response.
#[derive(Clone, Debug)]
pub struct ProviderCredentials {
    pub token_key: Secret<String>,
    pub secret_key: Secret<String>,
}

impl ProviderCredentials {
    pub fn new(token_key: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            token_key: Secret::new(token_key.into()),
            secret_key: Secret::new(secret_key.into()),
        }
    }
}

/// Externally reachable addresses handed to the provider.
#[derive(Clone, Debug, Default)]
pub struct CallbackConfig {
    pub public_base_url: Option<String>,
    pub redirect_url: Option<String>,
}

impl CallbackConfig {
    pub fn webhook_url(&self, provider: &str) -> Option<String> {
        self.public_base_url
            .as_deref()
            .map(|base| format!("{}/webhook/{}", base.trim_end_matches('/'), provider))
    }
}

#[derive(Clone, Debug)]
pub struct OrderConfig {
    pub id_prefix: String,
}

#[derive(Clone, Debug)]
pub struct WebhookConfig {
    /// Enables HMAC-SHA256 verification of inbound notifications.
    pub secret: Option<Secret<String>>,
    pub signature_header: String,
    pub queue_capacity: usize,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        // Loads .env as a side effect
        let common = core_config::Config::load()?;

        let credentials = match (non_empty_env("API_TOKEN"), non_empty_env("SECRET_KEY")) {
            (Some(token_key), Some(secret_key)) => {
                Some(ProviderCredentials::new(token_key, secret_key))
            }
            _ => None,
        };

        let timeout_secs: u64 = parse_env("PROVIDER_TIMEOUT_SECS", DEFAULT_PROVIDER_TIMEOUT_SECS)?;
        if timeout_secs == 0 {
            return Err(AppError::config("PROVIDER_TIMEOUT_SECS must be greater than zero"));
        }

        let queue_capacity: usize =
            parse_env("WEBHOOK_QUEUE_CAPACITY", DEFAULT_WEBHOOK_QUEUE_CAPACITY)?;
        if queue_capacity == 0 {
            return Err(AppError::config("WEBHOOK_QUEUE_CAPACITY must be greater than zero"));
        }

        Ok(Self {
            common,
            provider: ProviderConfig {
                base_url: non_empty_env("ZAPUPI_BASE_URL")
                    .unwrap_or_else(|| DEFAULT_PROVIDER_BASE_URL.to_string()),
                credentials,
                timeout: Duration::from_secs(timeout_secs),
            },
            callbacks: CallbackConfig {
                public_base_url: non_empty_env("PUBLIC_BASE_URL"),
                redirect_url: non_empty_env("REDIRECT_URL"),
            },
            orders: OrderConfig {
                id_prefix: non_empty_env("ORDER_ID_PREFIX")
                    .unwrap_or_else(|| DEFAULT_ORDER_ID_PREFIX.to_string()),
            },
            webhook: WebhookConfig {
                secret: non_empty_env("WEBHOOK_SECRET").map(Secret::new),
                signature_header: non_empty_env("WEBHOOK_SIGNATURE_HEADER")
                    .unwrap_or_else(|| DEFAULT_SIGNATURE_HEADER.to_string()),
                queue_capacity,
            },
            static_dir: non_empty_env("STATIC_DIR").unwrap_or_else(|| "public".to_string()),
            service_name: "upi-bridge".to_string(),
        })
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parse_env<T>(key: &str, default: T) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: Display,
{
    match non_empty_env(key) {
        Some(raw) => raw
            .parse()
            .map_err(|e| AppError::config(format!("{} is invalid ({}): {}", key, raw, e))),
        None => Ok(default),
    }
}
