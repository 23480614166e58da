//! alerts.in.ua IoT status client
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 1.1.0: Configurable active symbols, request timeout
//! - 1.0.0: Initial release

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use std::time::Duration;

use crate::core::Config;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Polled predicate answering "is an alert currently active?"
#[async_trait]
pub trait AlertGate: Send + Sync {
    async fn is_active(&self) -> Result<bool>;
}

/// Gate backed by the `active_air_raid_alerts` IoT endpoint
pub struct HttpAlertGate {
    client: Client,
    status_url: String,
    token: String,
    active_symbols: Vec<String>,
}

impl HttpAlertGate {
    pub fn new(
        base_url: &str,
        location_id: &str,
        token: impl Into<String>,
        active_symbols: Vec<String>,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to build alerts HTTP client")?;

        Ok(Self {
            client,
            status_url: format!(
                "{}/iot/active_air_raid_alerts/{location_id}.json",
                base_url.trim_end_matches('/')
            ),
            token: token.into(),
            active_symbols,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(
            &config.alerts_url,
            &config.alerts_location_id,
            config.alerts_token.clone(),
            config.alerts_active_symbols.clone(),
        )
    }

    pub fn status_url(&self) -> &str {
        &self.status_url
    }

    /// Interpret the endpoint body, a JSON string such as `"A"`, `"P"` or `"N"`
    pub fn parse_status(&self, body: &str) -> Result<bool> {
        let status = parse_status_symbol(body)?;
        Ok(self.active_symbols.iter().any(|s| *s == status))
    }
}

fn parse_status_symbol(body: &str) -> Result<String> {
    let value: serde_json::Value = serde_json::from_str(body.trim())
        .with_context(|| format!("Alert status is not JSON: {body}"))?;
    value
        .as_str()
        .map(String::from)
        .ok_or_else(|| anyhow!("Alert status is not a string: {value}"))
}

#[async_trait]
impl AlertGate for HttpAlertGate {
    async fn is_active(&self) -> Result<bool> {
        let response = self
            .client
            .get(&self.status_url)
            .header("Content-Type", "application/json")
            .bearer_auth(&self.token)
            .send()
            .await
            .context("Alert status request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error body".to_string());
            return Err(anyhow!("Alerts API returned {status}: {body}"));
        }

        let body = response.text().await?;
        let active = self.parse_status(&body)?;
        debug!("Alert status {} -> active={active}", body.trim());
        Ok(active)
    }
}
