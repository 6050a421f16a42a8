use serde::{Deserialize, Serialize};
use std::fmt;

/// Preset styles offered in the popup's dropdown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PresetTone {
    Neutral,
    Formal,
    Friendly,
    Professional,
    Concise,
    Creative,
}

impl PresetTone {
    pub const ALL: [PresetTone; 6] = [
        PresetTone::Neutral,
        PresetTone::Formal,
        PresetTone::Friendly,
        PresetTone::Professional,
        PresetTone::Concise,
        PresetTone::Creative,
    ];

    pub fn label(self) -> &'static str {
        match self {
            PresetTone::Neutral => "Neutral",
            PresetTone::Formal => "Formal",
            PresetTone::Friendly => "Friendly",
            PresetTone::Professional => "Professional",
            PresetTone::Concise => "Concise",
            PresetTone::Creative => "Creative",
        }
    }
}

/// Either a preset style label or a free-form rewriting instruction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Tone {
    Preset(PresetTone),
    Custom(String),
}

impl Tone {
    /// Interpret user input: preset names match case-insensitively,
    /// blank input means Neutral, anything else is a custom instruction.
    pub fn parse(input: &str) -> Self {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Tone::Preset(PresetTone::Neutral);
        }
        PresetTone::ALL
            .into_iter()
            .find(|p| p.label().eq_ignore_ascii_case(trimmed))
            .map(Tone::Preset)
            .unwrap_or_else(|| Tone::Custom(trimmed.to_string()))
    }

    /// "Use a formal tone." or "Rewriting instruction: ..."
    pub(crate) fn instruction_line(&self) -> String {
        match self {
            Tone::Preset(p) => format!("Use a {} tone.", p.label().to_lowercase()),
            Tone::Custom(instruction) => format!("Rewriting instruction: {}", instruction),
        }
    }
}

impl Default for Tone {
    fn default() -> Self {
        Tone::Preset(PresetTone::Neutral)
    }
}

impl fmt::Display for Tone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tone::Preset(p) => f.write_str(p.label()),
            Tone::Custom(instruction) => f.write_str(instruction),
        }
    }
}

/// Everything the chat client needs for one call, apart from the endpoint
#[derive(Debug, Clone, PartialEq)]
pub struct ChatPrompt {
    pub system: String,
    pub user: String,
    pub temperature: f32,
}

/// Opening of every system prompt; the format strategy appends its own ask.
pub(crate) fn base_system_prompt(tone: &Tone) -> String {
    match tone {
        Tone::Preset(p) => format!(
            "You are a helpful assistant that rewrites text to improve grammar, clarity, and tone. Use a {} tone.",
            p.label().to_lowercase()
        ),
        Tone::Custom(_) => "You are a helpful assistant that rewrites text according to specific \
                            instructions. Follow the user's rewriting requirements precisely"
            .to_string(),
    }
}
