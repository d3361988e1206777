use crate::error::LeadsError;
use crate::types::inference::{AiResponse, CfEnvelope, ChatMessage, ChatRequest};
use async_trait::async_trait;
use reqwest::StatusCode;
use tracing::{debug, error};

/// Chat-style text generation.
#[async_trait]
pub trait InferenceClient: Send + Sync {
    async fn run(&self, messages: &[ChatMessage]) -> Result<AiResponse, LeadsError>;
}

/// Cloudflare Workers AI REST endpoint for a single model.
pub struct WorkersAi {
    client: reqwest::Client,
    url: String,
    api_token: String,
}

impl WorkersAi {
    pub fn new(client: reqwest::Client, url: impl Into<String>, api_token: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
            api_token: api_token.into(),
        }
    }
}

#[async_trait]
impl InferenceClient for WorkersAi {
    async fn run(&self, messages: &[ChatMessage]) -> Result<AiResponse, LeadsError> {
        let resp = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_token)
            .json(&ChatRequest { messages })
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            error!(%status, "Workers AI request failed");
            return Err(LeadsError::Inference { status, body });
        }

        let envelope: CfEnvelope<AiResponse> = resp.json().await?;
        match envelope.result {
            Some(result) if envelope.success => {
                debug!(len = result.response.len(), "model responded");
                Ok(result)
            }
            _ => Err(LeadsError::Inference {
                status: StatusCode::OK,
                body: serde_json::to_string(&envelope.errors)?,
            }),
        }
    }
}
