use crate::error::{PulseError, Result};
use crate::market::config;
use crate::market::models::{Index, OptionChain};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use tokio_retry::RetryIf;
use tokio_retry::strategy::ExponentialBackoff;
use tracing::{debug, warn};

// -----------------------------------------------
// CLIENT FOR A PLAIN JSON MARKET-DATA BACKEND
// -----------------------------------------------
pub struct RemoteClient {
    client: Client,
    base_url: String,
}

impl RemoteClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(config::HTTP_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    /// GET with exponential backoff; only 429, 5xx and transport hiccups retry
    async fn fetch_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let backoff = ExponentialBackoff::from_millis(config::RETRY_BASE_DELAY_MS)
            .factor(config::RETRY_FACTOR)
            .max_delay(Duration::from_secs(config::RETRY_MAX_DELAY_SECS))
            .take(config::RETRY_MAX_ATTEMPTS);

        let client = &self.client;
        let text = RetryIf::spawn(
            backoff,
            || async move {
                let res = client.get(url).send().await?;
                let status = res.status();
                let body = res.text().await?;

                if status.is_success() {
                    Ok(body)
                } else {
                    warn!(%url, %status, "remote backend returned an error status");
                    Err(PulseError::RemoteStatus {
                        status,
                        body: error_message(&body).unwrap_or(body),
                    })
                }
            },
            PulseError::is_retryable,
        )
        .await?;

        debug!(%url, bytes = text.len(), "remote response received");

        let value: Value = serde_json::from_str(&text)?;
        if let Some(message) = value.get("error").and_then(Value::as_str) {
            return Err(PulseError::Remote(message.to_string()));
        }
        Ok(serde_json::from_value(value)?)
    }

    pub async fn fetch_indices(&self) -> Result<Vec<Index>> {
        let url = config::remote_indices_url(&self.base_url);
        self.fetch_json(&url).await
    }

    /// The backend does not know the underlying and sends a placeholder;
    /// the caller's price replaces it.
    pub async fn fetch_chain(&self, underlying_price: f64) -> Result<OptionChain> {
        let url = config::remote_option_chain_url(&self.base_url, config::REMOTE_CHAIN_SYMBOL);
        let mut chain: OptionChain = self.fetch_json(&url).await?;
        chain.underlying_price = underlying_price;
        Ok(chain.normalized())
    }
}

/// Message from an `{"error": "..."}` body, if that is what the body is
fn error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    value.get("error")?.as_str().map(str::to_string)
}
