//! OpenRouter adapter (chat completions).
//!
//! One prompt in, one single-turn `chat/completions` request out. Every failure
//! is classified into a `FailureReason`; nothing is retried.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use orb_core::{
    config::{is_usable_api_key, Config},
    errors::Error,
    model::{
        client::CompletionClient,
        types::{CompletionOutcome, FailureReason},
    },
    Result,
};

const ERROR_BODY_PREVIEW: usize = 200;

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Clone, Debug)]
pub struct OpenRouterClient {
    api_key: Option<String>,
    model: String,
    url: String,
    http: reqwest::Client,
}

impl OpenRouterClient {
    pub fn from_config(cfg: &Config) -> Result<Self> {
        Self::with_options(
            cfg.openrouter_api_key.clone(),
            cfg.openrouter_model.clone(),
            cfg.openrouter_url.clone(),
            cfg.completion_timeout,
        )
    }

    pub fn with_options(
        api_key: Option<String>,
        model: impl Into<String>,
        url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::External(format!("openrouter http client build failed: {e}")))?;
        Ok(Self {
            api_key,
            model: model.into(),
            url: url.into(),
            http,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn is_configured(&self) -> bool {
        is_usable_api_key(self.api_key.as_deref())
    }
}

#[async_trait]
impl CompletionClient for OpenRouterClient {
    async fn complete(&self, prompt: &str) -> CompletionOutcome {
        let Some(api_key) = self
            .api_key
            .as_deref()
            .filter(|k| is_usable_api_key(Some(*k)))
        else {
            tracing::error!("OPENROUTER_KEY is not set; cannot get AI response");
            return CompletionOutcome::Failure(FailureReason::ConfigMissing);
        };

        let body = ChatRequest {
            model: &self.model,
            messages: [ChatMessage {
                role: "user",
                content: prompt,
            }],
        };

        let resp = match self
            .http
            .post(&self.url)
            .bearer_auth(api_key.trim())
            .json(&body)
            .send()
            .await
        {
            Ok(resp) => resp,
            Err(e) => {
                tracing::error!(error = %e, timeout = e.is_timeout(), "openrouter request error");
                return CompletionOutcome::Failure(FailureReason::NetworkError);
            }
        };

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            tracing::error!(
                %status,
                body = %body.chars().take(ERROR_BODY_PREVIEW).collect::<String>(),
                "openrouter returned error status"
            );
            return CompletionOutcome::Failure(FailureReason::BadStatus);
        }

        let text = match resp.text().await {
            Ok(text) => text,
            Err(e) => {
                tracing::error!(error = %e, "failed to read openrouter response body");
                return CompletionOutcome::Failure(FailureReason::NetworkError);
            }
        };

        match extract_content(&text) {
            Some(content) => CompletionOutcome::Success(content),
            None => {
                tracing::error!(
                    body = %text.chars().take(ERROR_BODY_PREVIEW).collect::<String>(),
                    "unexpected response format from openrouter"
                );
                CompletionOutcome::Failure(FailureReason::MalformedResponse)
            }
        }
    }
}

/// Pull `choices[0].message.content` out of a chat-completions body.
fn extract_content(body: &str) -> Option<String> {
    let v: serde_json::Value = serde_json::from_str(body).ok()?;
    v.get("choices")?
        .get(0)?
        .get("message")?
        .get("content")?
        .as_str()
        .map(str::to_string)
}
