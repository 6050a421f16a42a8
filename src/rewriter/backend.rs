use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::format::{DelimitedFormat, LabeledFormat, ResponseFormat};

static DELIMITED: DelimitedFormat = DelimitedFormat;
static LABELED: LabeledFormat = LabeledFormat;

/// One of the two preconfigured chat-completion providers.
///
/// The serialized ids match what older settings files store under `model`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Backend {
    #[serde(rename = "gpt-4", alias = "openai")]
    OpenAi,
    #[default]
    #[serde(rename = "llama-4-scout", alias = "groq")]
    Groq,
}

impl Backend {
    pub const ALL: [Backend; 2] = [Backend::OpenAi, Backend::Groq];

    /// Stable id used in settings files and on the command line
    pub fn id(self) -> &'static str {
        match self {
            Backend::OpenAi => "gpt-4",
            Backend::Groq => "llama-4-scout",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Backend::OpenAi => "GPT-4 (OpenAI)",
            Backend::Groq => "Llama-4-Scout (Groq)",
        }
    }

    /// OpenAI-compatible API root; `/chat/completions` is appended per call
    pub fn default_base_url(self) -> &'static str {
        match self {
            Backend::OpenAi => "https://api.openai.com/v1",
            Backend::Groq => "https://api.groq.com/openai/v1",
        }
    }

    /// Model identifier sent in the request body
    pub fn model(self) -> &'static str {
        match self {
            Backend::OpenAi => "gpt-4",
            Backend::Groq => "meta-llama/llama-4-scout-17b-16e-instruct",
        }
    }

    /// Key under `api_keys` in the settings document
    pub fn credential_key(self) -> &'static str {
        match self {
            Backend::OpenAi => "openai",
            Backend::Groq => "groq",
        }
    }

    /// Environment variable consulted when no key is stored
    pub fn env_var(self) -> &'static str {
        match self {
            Backend::OpenAi => "OPENAI_API_KEY",
            Backend::Groq => "GROQ_API_KEY",
        }
    }

    /// Prompt/parse strategy for the output layout this provider handles best
    pub fn format(self) -> &'static dyn ResponseFormat {
        match self {
            Backend::OpenAi => &DELIMITED,
            Backend::Groq => &LABELED,
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gpt-4" | "openai" | "gpt" => Ok(Backend::OpenAi),
            "llama-4-scout" | "groq" | "llama" => Ok(Backend::Groq),
            other => Err(format!(
                "Unknown backend '{}'. Expected one of: gpt-4, llama-4-scout",
                other
            )),
        }
    }
}
