use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{error, info};

use crate::dto::webhook_dto::AnswerPayload;
use crate::error::{Error, Result};

/// Destination for completed answer sets.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AnswerSink: Send + Sync {
    async fn deliver(&self, payload: &AnswerPayload) -> Result<()>;
}

#[derive(Clone)]
pub struct WebhookService {
    client: Client,
    target_url: String,
}

impl WebhookService {
    pub fn new(target_url: String, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Internal(format!("Failed to create webhook HTTP client: {}", e)))?;
        info!("Answer webhook target: {}", target_url);
        Ok(Self { client, target_url })
    }
}

#[async_trait]
impl AnswerSink for WebhookService {
    async fn deliver(&self, payload: &AnswerPayload) -> Result<()> {
        let resp = self
            .client
            .post(&self.target_url)
            .json(payload)
            .send()
            .await
            .map_err(|e| {
                error!(candidate_id = %payload.candidate.id, "answer webhook unreachable: {}", e);
                e
            })?;

        let status = resp.status();
        if status.is_success() {
            info!(
                candidate_id = %payload.candidate.id,
                test_id = %payload.test.id,
                answers = payload.body.len(),
                "answers delivered"
            );
            return Ok(());
        }

        let body = resp.text().await.unwrap_or_default();
        error!(
            candidate_id = %payload.candidate.id,
            status = status.as_u16(),
            "answer webhook rejected submission: {}",
            body
        );
        Err(Error::Backend {
            status: 502,
            message: format!("Answer processing service responded with {}", status.as_u16()),
        })
    }
}
