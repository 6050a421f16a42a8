//! Chat-completion client
//!
//! Both backends speak the OpenAI-compatible `/chat/completions` API, so a
//! single HTTP client covers them; the [`Endpoint`] decides where it goes.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use super::error::RewriteError;
use super::prompt::ChatPrompt;
use crate::utils::logger::*;

/// Requests that outlive this are reported as transport errors
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Resolved target for one call
#[derive(Debug, Clone, PartialEq)]
pub struct Endpoint {
    pub base_url: String,
    pub model: String,
    pub api_key: String,
}

impl Endpoint {
    pub fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Send one system+user exchange and return the assistant's text
    async fn complete(&self, endpoint: &Endpoint, prompt: &ChatPrompt)
        -> Result<String, RewriteError>;
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

/// reqwest-backed [`ChatClient`]
#[derive(Debug, Clone)]
pub struct HttpChatClient {
    client: reqwest::Client,
}

impl HttpChatClient {
    pub fn new() -> Result<Self, RewriteError> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self, RewriteError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("Lexia/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ChatClient for HttpChatClient {
    async fn complete(
        &self,
        endpoint: &Endpoint,
        prompt: &ChatPrompt,
    ) -> Result<String, RewriteError> {
        let started = Instant::now();
        log_start("CHAT_COMPLETION");
        log_with_context(
            log::Level::Debug,
            "Sending chat completion",
            &[("model", &endpoint.model), ("url", &endpoint.completions_url())],
        );

        let body = ChatCompletionRequest {
            model: &endpoint.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: &prompt.system,
                },
                ChatMessage {
                    role: "user",
                    content: &prompt.user,
                },
            ],
            temperature: prompt.temperature,
        };

        let response = self
            .client
            .post(endpoint.completions_url())
            .bearer_auth(&endpoint.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                log_failed("CHAT_COMPLETION", &e.to_string());
                RewriteError::from(e)
            })?;

        let status = response.status();
        if !status.is_success() {
            let raw = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorBody>(&raw)
                .map(|b| b.error.message)
                .unwrap_or_else(|_| {
                    if raw.trim().is_empty() {
                        status
                            .canonical_reason()
                            .unwrap_or("unknown error")
                            .to_string()
                    } else {
                        raw.trim().to_string()
                    }
                });
            log_failed("CHAT_COMPLETION", &format!("{}: {}", status, message));
            return Err(RewriteError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| RewriteError::MalformedResponse(e.to_string()))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .ok_or(RewriteError::EmptyResponse)?;

        log_complete("CHAT_COMPLETION", started.elapsed().as_millis() as u64);
        log::debug!("Received {} chars from {}", content.len(), endpoint.model);
        Ok(content)
    }
}
