//! HTTP client for the SnelStart sales-order API

use crate::error::is_retryable_status;
use crate::{ClientError, ClientResult, SnelStartConfig, Verkooporder, VerkooporderCreate};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Subscription key header required by the API gateway
const SUBSCRIPTION_KEY_HEADER: &str = "Ocp-Apim-Subscription-Key";

/// SnelStart API client
#[derive(Debug, Clone)]
pub struct SnelStartClient {
    client: Client,
    config: SnelStartConfig,
}

impl SnelStartClient {
    /// Create a new client from configuration
    pub fn new(config: SnelStartConfig) -> ClientResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ClientError::Config(e.to_string()))?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &SnelStartConfig {
        &self.config
    }

    // ========== Sales Orders API ==========

    /// Create a sales order
    pub async fn create_verkooporder(&self, body: &VerkooporderCreate) -> ClientResult<Verkooporder> {
        let url = self.config.url("verkooporders");
        self.send_with_retry("create_verkooporder", || self.client.post(&url).json(body))
            .await
    }

    /// List sales orders for a customer (relatie)
    pub async fn verkooporders_for_relatie(&self, relatie_id: &str) -> ClientResult<Vec<Verkooporder>> {
        let url = self.config.url("verkooporders");
        let filter = format!("Relatie/Id eq guid'{}'", relatie_id);
        self.send_with_retry("verkooporders_for_relatie", || {
            self.client.get(&url).query(&[("$filter", filter.as_str())])
        })
        .await
    }

    // ========== Transport ==========

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let mut request = request;
        if !self.config.subscription_key.is_empty() {
            request = request.header(SUBSCRIPTION_KEY_HEADER, &self.config.subscription_key);
        }
        if !self.config.access_token.is_empty() {
            request = request.bearer_auth(&self.config.access_token);
        }
        request
    }

    /// Send a request, retrying transient failures per the retry policy
    async fn send_with_retry<T, F>(&self, op: &'static str, build: F) -> ClientResult<T>
    where
        T: DeserializeOwned,
        F: Fn() -> RequestBuilder,
    {
        let policy = &self.config.retry;
        let mut retry = 0u32;

        loop {
            let result = self.authorize(build()).send().await;

            let (error, server_delay) = match result {
                Ok(response) if response.status().is_success() => {
                    return Self::decode(response).await;
                }
                Ok(response) => {
                    let status = response.status().as_u16();
                    let retry_after = parse_retry_after(&response);
                    let body = response.text().await.unwrap_or_default();
                    (ClientError::Status { status, body }, retry_after)
                }
                Err(e) => (ClientError::Http(e), None),
            };

            if !error.is_retryable() || !policy.should_retry(retry) {
                return Err(error);
            }

            let delay = match server_delay {
                Some(d) => policy.clamp_server_delay(d),
                None => policy.delay_for_retry(retry),
            };
            tracing::warn!(
                op,
                error = %error,
                retry = retry + 1,
                max_retries = policy.max_retries,
                delay_ms = delay.as_millis() as u64,
                "SnelStart request failed, retrying"
            );
            tokio::time::sleep(delay).await;
            retry += 1;
        }
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> ClientResult<T> {
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| ClientError::InvalidResponse(e.to_string()))
    }
}

/// `Retry-After` in delta-seconds form; HTTP-date values fall back to backoff
fn parse_retry_after(response: &Response) -> Option<Duration> {
    if !is_retryable_status(response.status().as_u16()) {
        return None;
    }
    response
        .headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}
