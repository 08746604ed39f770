#![allow(dead_code)]

use secrecy::Secret;
use service_core::config::{Config as CoreConfig, LogFormat};
use std::time::Duration;
use upi_bridge::config::{
    CallbackConfig, Config, OrderConfig, ProviderConfig, ProviderCredentials, WebhookConfig,
    DEFAULT_SIGNATURE_HEADER,
};
use upi_bridge::startup::Application;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate, Times};

pub const TEST_TOKEN_KEY: &str = "tok_test_1f2e3d";
pub const TEST_SECRET_KEY: &str = "sk_test_must_not_leak_9a8b7c";
pub const TEST_WEBHOOK_SECRET: &str = "whsec_test_4d5e6f";
pub const CREATE_ORDER_PATH: &str = "/api/create-order";

pub struct TestOptions {
    pub credentials: bool,
    pub timeout: Duration,
    pub webhook_secret: Option<&'static str>,
    pub public_base_url: Option<String>,
    /// Point the relay somewhere other than the stub provider.
    pub provider_base_url: Option<String>,
}

impl Default for TestOptions {
    fn default() -> Self {
        Self {
            credentials: true,
            timeout: Duration::from_secs(5),
            webhook_secret: None,
            public_base_url: None,
            provider_base_url: None,
        }
    }
}

pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub provider: MockServer,
    pub client: reqwest::Client,
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::spawn_with(TestOptions::default()).await
    }

    pub async fn spawn_with(options: TestOptions) -> Self {
        let provider = MockServer::start().await;

        let config = Config {
            common: CoreConfig {
                port: 0, // Random port
                log_level: "debug".to_string(),
                log_format: LogFormat::Pretty,
            },
            provider: ProviderConfig {
                base_url: options
                    .provider_base_url
                    .clone()
                    .unwrap_or_else(|| provider.uri()),
                credentials: options
                    .credentials
                    .then(|| ProviderCredentials::new(TEST_TOKEN_KEY, TEST_SECRET_KEY)),
                timeout: options.timeout,
            },
            callbacks: CallbackConfig {
                public_base_url: options.public_base_url.clone(),
                redirect_url: None,
            },
            orders: OrderConfig {
                id_prefix: "BZR".to_string(),
            },
            webhook: WebhookConfig {
                secret: options
                    .webhook_secret
                    .map(|secret| Secret::new(secret.to_string())),
                signature_header: DEFAULT_SIGNATURE_HEADER.to_string(),
                queue_capacity: 16,
            },
            static_dir: "public".to_string(),
            service_name: "upi-bridge-test".to_string(),
        };

        let app = Application::build(config)
            .await
            .expect("Failed to build test application");

        let port = app.port();
        let address = format!("http://127.0.0.1:{}", port);

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        // Wait for HTTP server to be ready by polling health endpoint
        let client = reqwest::Client::new();
        let health_url = format!("{}/health", address);
        for _ in 0..50 {
            if client.get(&health_url).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }

        TestApp {
            address,
            port,
            provider,
            client,
        }
    }

    /// Stub the provider's create-order endpoint, expecting `calls` hits.
    pub async fn mock_provider(&self, response: ResponseTemplate, calls: impl Into<Times>) {
        Mock::given(method("POST"))
            .and(path(CREATE_ORDER_PATH))
            .respond_with(response)
            .expect(calls)
            .mount(&self.provider)
            .await;
    }

    pub async fn create_order(&self, body: serde_json::Value) -> reqwest::Response {
        self.client
            .post(format!("{}/api/create-order", self.address))
            .json(&body)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn create_order_form(&self, fields: &[(&str, &str)]) -> reqwest::Response {
        self.client
            .post(format!("{}/api/create-order", self.address))
            .form(fields)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn post_webhook(
        &self,
        provider: &str,
        body: &str,
        signature: Option<&str>,
    ) -> reqwest::Response {
        let mut request = self
            .client
            .post(format!("{}/webhook/{}", self.address, provider))
            .header("content-type", "application/json")
            .body(body.to_string());
        if let Some(signature) = signature {
            request = request.header(DEFAULT_SIGNATURE_HEADER, signature);
        }
        request.send().await.expect("Failed to execute request")
    }

    /// Form bodies the stub provider received, in arrival order.
    pub async fn provider_requests(&self) -> Vec<String> {
        self.provider
            .received_requests()
            .await
            .unwrap_or_default()
            .into_iter()
            .map(|request| String::from_utf8_lossy(&request.body).into_owned())
            .collect()
    }
}

/// Raw value of `name` in a urlencoded body (no percent-decoding).
pub fn form_field<'a>(body: &'a str, name: &str) -> Option<&'a str> {
    body.split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value)
}
