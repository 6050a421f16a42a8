//! Output layouts the backends are prompted for, and how to read them back.
//!
//! Each backend is paired with one strategy. The strategy writes the prompt
//! that asks for its layout and knows how to recover sections when the
//! explicit delimiter is missing from the reply.

use super::normalizer::{extract_labeled_sections, split_paragraphs, ALTERNATIVE_DELIMITER};
use super::prompt::{base_system_prompt, Tone};

pub trait ResponseFormat: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &'static str;

    fn system_prompt(&self, tone: &Tone, count: usize) -> String;

    fn user_prompt(&self, text: &str, tone: &Tone, count: usize) -> String;

    /// Called when the delimiter split produced fewer than two distinct segments.
    /// `None` keeps the delimiter result as is.
    fn recover_sections(&self, raw: &str, count: usize) -> Option<Vec<String>>;
}

/// Alternatives separated by `---ALTERNATIVE---` markers
#[derive(Debug, Clone, Copy, Default)]
pub struct DelimitedFormat;

impl ResponseFormat for DelimitedFormat {
    fn name(&self) -> &'static str {
        "delimited"
    }

    fn system_prompt(&self, tone: &Tone, count: usize) -> String {
        let base = base_system_prompt(tone);
        match tone {
            Tone::Preset(p) => format!(
                "{} Provide {} different alternative rewrites, each with a slightly different approach or style while maintaining the {} tone.",
                base,
                count,
                p.label().to_lowercase()
            ),
            Tone::Custom(_) => format!("{} while providing {} different variations.", base, count),
        }
    }

    fn user_prompt(&self, text: &str, tone: &Tone, count: usize) -> String {
        format!(
            "Rewrite the following text in {count} different ways:\n\n{text}\n\n{instruction}\n\nPlease provide {count} alternatives, separated by '{delimiter}' markers.",
            count = count,
            text = text,
            instruction = tone.instruction_line(),
            delimiter = ALTERNATIVE_DELIMITER,
        )
    }

    fn recover_sections(&self, _raw: &str, _count: usize) -> Option<Vec<String>> {
        None
    }
}

/// Alternatives introduced by "Version N:" style labels
#[derive(Debug, Clone, Copy, Default)]
pub struct LabeledFormat;

impl ResponseFormat for LabeledFormat {
    fn name(&self) -> &'static str {
        "labeled"
    }

    fn system_prompt(&self, tone: &Tone, _count: usize) -> String {
        match tone {
            Tone::Preset(_) => base_system_prompt(tone),
            Tone::Custom(_) => format!("{}.", base_system_prompt(tone)),
        }
    }

    fn user_prompt(&self, text: &str, tone: &Tone, count: usize) -> String {
        format!(
            "Rewrite the following text in {count} different ways. Label each version clearly as 'Version 1:', 'Version 2:', etc.\n\nOriginal text: {text}\n\n{instruction}\n\nPlease provide exactly {count} rewritten versions.",
            count = count,
            text = text,
            instruction = tone.instruction_line(),
        )
    }

    fn recover_sections(&self, raw: &str, count: usize) -> Option<Vec<String>> {
        let labeled = extract_labeled_sections(raw);
        if !labeled.is_empty() {
            return Some(labeled);
        }

        let paragraphs = split_paragraphs(raw);
        if paragraphs.len() >= count {
            return Some(paragraphs.into_iter().take(count).collect());
        }

        let whole = raw.trim();
        if whole.is_empty() {
            Some(Vec::new())
        } else {
            Some(vec![whole.to_string()])
        }
    }
}
