//! Rewrite pipeline
//!
//! Validates the selected text, resolves the backend credential, builds the
//! prompt for the backend's output format, performs one chat completion and
//! normalizes the reply into the requested number of alternatives.

mod backend;
pub mod client;
mod error;
pub mod format;
pub mod normalizer;
mod prompt;

pub use backend::Backend;
pub use client::{ChatClient, Endpoint, HttpChatClient};
pub use error::RewriteError;
pub use normalizer::normalize;
pub use prompt::{ChatPrompt, PresetTone, Tone};

use serde::Serialize;
use std::collections::HashMap;
use std::time::Instant;

use crate::settings::Settings;
use crate::utils::logger::*;

/// One user-triggered rewrite. Construction guarantees non-empty text and a
/// count of at least one.
#[derive(Debug, Clone, PartialEq)]
pub struct RewriteRequest {
    original_text: String,
    tone: Tone,
    requested_count: usize,
    backend: Backend,
}

impl RewriteRequest {
    pub fn new(
        original_text: impl Into<String>,
        tone: Tone,
        requested_count: usize,
        backend: Backend,
    ) -> Result<Self, RewriteError> {
        let original_text = original_text.into().trim().to_string();
        if original_text.is_empty() {
            return Err(RewriteError::EmptyInput);
        }
        if requested_count == 0 {
            return Err(RewriteError::InvalidCount);
        }
        Ok(Self {
            original_text,
            tone,
            requested_count,
            backend,
        })
    }

    pub fn original_text(&self) -> &str {
        &self.original_text
    }

    pub fn tone(&self) -> &Tone {
        &self.tone
    }

    pub fn requested_count(&self) -> usize {
        self.requested_count
    }

    pub fn backend(&self) -> Backend {
        self.backend
    }

    pub fn prompt(&self, temperature: f32) -> ChatPrompt {
        let format = self.backend.format();
        ChatPrompt {
            system: format.system_prompt(&self.tone, self.requested_count),
            user: format.user_prompt(&self.original_text, &self.tone, self.requested_count),
            temperature,
        }
    }
}

/// What the popup shows after a rewrite. Every variant yields at least one string.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum RewriteOutcome {
    Alternatives(Vec<String>),
    /// Informational result, e.g. nothing was selected
    Notice(String),
    /// Human-readable failure in place of alternatives
    Failed(String),
}

impl RewriteOutcome {
    pub fn from_error(error: &RewriteError) -> Self {
        match error {
            RewriteError::EmptyInput => RewriteOutcome::Notice(error.to_string()),
            other => RewriteOutcome::Failed(format!("Error: {}", other)),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, RewriteOutcome::Alternatives(_))
    }

    pub fn choices(&self) -> Vec<String> {
        match self {
            RewriteOutcome::Alternatives(list) => list.clone(),
            RewriteOutcome::Notice(msg) | RewriteOutcome::Failed(msg) => vec![msg.clone()],
        }
    }

    pub fn into_choices(self) -> Vec<String> {
        match self {
            RewriteOutcome::Alternatives(list) => list,
            RewriteOutcome::Notice(msg) | RewriteOutcome::Failed(msg) => vec![msg],
        }
    }
}

/// Runs rewrites against a settings snapshot
pub struct Rewriter<C> {
    client: C,
    settings: Settings,
    base_url_overrides: HashMap<Backend, String>,
}

impl<C: ChatClient> Rewriter<C> {
    pub fn new(client: C, settings: Settings) -> Self {
        Self {
            client,
            settings,
            base_url_overrides: HashMap::new(),
        }
    }

    /// Point a backend at a different OpenAI-compatible root (proxies, tests)
    pub fn with_base_url(mut self, backend: Backend, base_url: impl Into<String>) -> Self {
        self.base_url_overrides.insert(backend, base_url.into());
        self
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Stored key first, then the backend's environment variable
    pub fn endpoint_for(&self, backend: Backend) -> Result<Endpoint, RewriteError> {
        let api_key = self
            .settings
            .api_keys
            .get(backend)
            .map(str::to_string)
            .or_else(|| {
                std::env::var(backend.env_var())
                    .ok()
                    .map(|v| v.trim().to_string())
                    .filter(|v| !v.is_empty())
            })
            .ok_or(RewriteError::MissingCredential(backend))?;

        let base_url = self
            .base_url_overrides
            .get(&backend)
            .cloned()
            .unwrap_or_else(|| backend.default_base_url().to_string());

        Ok(Endpoint {
            base_url,
            model: backend.model().to_string(),
            api_key,
        })
    }

    /// Full pipeline; errors are returned to the caller untouched
    pub async fn rewrite(&self, request: &RewriteRequest) -> Result<Vec<String>, RewriteError> {
        let started = Instant::now();
        let endpoint = self.endpoint_for(request.backend())?;
        let prompt = request.prompt(self.settings.temperature);

        log_with_context(
            log::Level::Info,
            "Rewrite requested",
            &[
                ("backend", request.backend().id()),
                ("tone", &request.tone().to_string()),
                ("count", &request.requested_count().to_string()),
                ("chars", &request.original_text().len().to_string()),
            ],
        );

        let raw = self.client.complete(&endpoint, &prompt).await?;
        if raw.trim().is_empty() {
            return Err(RewriteError::EmptyResponse);
        }

        let alternatives = normalize(&raw, request);
        log_performance(
            "REWRITE",
            started.elapsed().as_millis() as u64,
            Some(&format!("{} alternatives", alternatives.len())),
        );
        Ok(alternatives)
    }

    /// Display-facing entry point: never fails, always at least one string
    pub async fn rewrite_text(
        &self,
        text: &str,
        tone: Tone,
        requested_count: usize,
        backend: Backend,
    ) -> RewriteOutcome {
        let request = match RewriteRequest::new(text, tone, requested_count, backend) {
            Ok(request) => request,
            Err(e) => {
                log::info!("Rewrite skipped: {}", e);
                return RewriteOutcome::from_error(&e);
            }
        };

        match self.rewrite(&request).await {
            Ok(alternatives) => RewriteOutcome::Alternatives(alternatives),
            Err(e) => {
                if e.is_local() {
                    log::warn!("Rewrite not attempted: {}", e);
                } else {
                    log_failed("REWRITE", &e.to_string());
                }
                RewriteOutcome::from_error(&e)
            }
        }
    }
}
