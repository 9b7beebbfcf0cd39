//! Transmission client over reqwest

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use log::{debug, info};
use reqwest::StatusCode;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};

use super::models::{Transmission, TransmissionResponse};

/// Recipient counts reported by the endpoint for one transmission
#[derive(Debug, Clone, Copy, Default)]
pub struct SendOutcome {
    pub accepted: u32,
    pub rejected: u32,
}

impl SendOutcome {
    /// A transmission only counts as delivered when at least one recipient
    /// was accepted
    pub fn delivered(&self) -> bool {
        self.accepted >= 1
    }
}

/// Seam between the pipeline and the outbound mail service
#[async_trait]
pub trait MailSender: Send + Sync {
    async fn send(&self, transmission: &Transmission) -> Result<SendOutcome>;
}

/// SparkPost-style transmissions client
pub struct SparkPostClient {
    http: reqwest::Client,
    url: String,
    token: String,
}

impl SparkPostClient {
    pub fn new(url: impl Into<String>, token: impl Into<String>) -> Self {
        SparkPostClient {
            http: reqwest::Client::new(),
            url: url.into(),
            token: token.into(),
        }
    }
}

#[async_trait]
impl MailSender for SparkPostClient {
    async fn send(&self, transmission: &Transmission) -> Result<SendOutcome> {
        debug!("Posting transmission to {}", self.url);
        let response = self
            .http
            .post(&self.url)
            .header(AUTHORIZATION, self.token.as_str())
            .header(CONTENT_TYPE, "application/json")
            .json(transmission)
            .send()
            .await
            .context("Transmission request failed")?;

        let status = response.status();
        let body = response
            .text()
            .await
            .context("Failed to read transmission response")?;

        if status != StatusCode::OK && status != StatusCode::ACCEPTED {
            bail!("Transmission endpoint returned {}: {}", status, body);
        }

        let parsed: TransmissionResponse = serde_json::from_str(&body)
            .with_context(|| format!("Unparseable transmission response: {}", body))?;
        let results = parsed.results.unwrap_or_default();
        info!(
            "Transmission accepted {} recipient(s), rejected {}",
            results.total_accepted_recipients, results.total_rejected_recipients
        );

        Ok(SendOutcome {
            accepted: results.total_accepted_recipients,
            rejected: results.total_rejected_recipients,
        })
    }
}
