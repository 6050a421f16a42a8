use thiserror::Error;

use super::Backend;

#[derive(Debug, Error)]
pub enum RewriteError {
    #[error("No text provided.")]
    EmptyInput,

    #[error("Number of alternatives must be at least 1")]
    InvalidCount,

    #[error("No API key configured for {0}. Add one in Settings or set {env}.", env = .0.env_var())]
    MissingCredential(Backend),

    #[error("Failed to reach the API: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("API returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("The model returned an empty response")]
    EmptyResponse,

    #[error("Failed to parse response: {0}")]
    MalformedResponse(String),
}

impl RewriteError {
    /// True for failures detected before any network traffic
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            RewriteError::EmptyInput
                | RewriteError::InvalidCount
                | RewriteError::MissingCredential(_)
        )
    }
}
