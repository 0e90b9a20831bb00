//! Implements the `Completion` trait with a `reqwest::Client` posting to an OpenRouter-compatible
//! chat-completions endpoint.

use crate::chat::{ChatMessage, Completion};
use crate::config::ChatConfig;
use crate::Result;
use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, trace};
use url::Url;

pub struct OpenRouterClient {
    client: reqwest::Client,
    endpoint: Url,
    api_key: String,
    model: String,
    max_tokens: u32,
    referer: String,
    title: String,
}

impl OpenRouterClient {
    pub fn new(chat: &ChatConfig, api_key: impl Into<String>) -> Result<Self> {
        let endpoint = Url::parse(&chat.endpoint)
            .with_context(|| format!("Invalid chat endpoint '{}'", chat.endpoint))?;
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = chat.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder.build().context("Unable to create the HTTP client")?;
        Ok(Self {
            client,
            endpoint,
            api_key: api_key.into(),
            model: chat.model.clone(),
            max_tokens: chat.max_tokens,
            referer: chat.referer.clone(),
            title: chat.title.clone(),
        })
    }
}

impl std::fmt::Debug for OpenRouterClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenRouterClient")
            .field("endpoint", &self.endpoint.as_str())
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    max_tokens: u32,
}

#[derive(Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[async_trait::async_trait]
impl Completion for OpenRouterClient {
    async fn complete(&mut self, messages: &[ChatMessage]) -> Result<String> {
        debug!("Posting {} messages to {}", messages.len(), self.endpoint);
        let body = CompletionRequest {
            model: &self.model,
            messages,
            max_tokens: self.max_tokens,
        };
        let response = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(&self.api_key)
            .header("HTTP-Referer", &self.referer)
            .header("X-Title", &self.title)
            .json(&body)
            .send()
            .await
            .context("Failed to send the chat request")?;

        // Only 200 carries a completion.
        let status = response.status();
        if status != reqwest::StatusCode::OK {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read response body".to_string());
            bail!("The chat service returned status {status}: {body}");
        }

        let parsed: CompletionResponse = response
            .json()
            .await
            .context("Failed to parse the chat service response")?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .context("The chat service response has no message content")?;
        trace!("Received a reply of {} bytes", content.len());
        Ok(content.trim().to_string())
    }
}
