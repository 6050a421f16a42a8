//! Turns raw model output into exactly the requested number of alternatives.
//!
//! The cascade is: explicit delimiter split, then the backend format's own
//! recovery (labeled sections, blank-line paragraphs, whole text). Whatever
//! comes out is trimmed, emptied segments are dropped, and the list is padded
//! with copies of its first entry or truncated to the requested count.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;

use super::format::ResponseFormat;
use super::RewriteRequest;

/// Marker the delimited backend is asked to put between alternatives
pub const ALTERNATIVE_DELIMITER: &str = "---ALTERNATIVE---";

// Models sometimes shorten the marker; both spellings split.
static DELIMITER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"---ALT(?:ERNATIVE)?---").expect("valid delimiter regex"));

// "**Version 1:**", "**Option 2: Casual**", "**Alternative 3**:" or a plain
// "Version 4:" at the start of a line.
static LABEL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\*\*[ \t]*(?:version|alternative|option)[ \t]*\d+[ \t]*(?::[^*\n]*\*\*|\*\*[ \t]*:)|(?m:^)[ \t]*(?:version|alternative|option)[ \t]*\d+[ \t]*:",
    )
    .expect("valid label regex")
});

static BLANK_LINE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\r?\n[ \t]*\r?\n").expect("valid paragraph regex"));

/// Normalize the reply to `request` into `request.requested_count()` alternatives
pub fn normalize(raw: &str, request: &RewriteRequest) -> Vec<String> {
    normalize_with(
        raw,
        request.requested_count(),
        request.backend().format(),
        request.original_text(),
    )
}

pub(crate) fn normalize_with(
    raw: &str,
    count: usize,
    format: &dyn ResponseFormat,
    fallback: &str,
) -> Vec<String> {
    let count = count.max(1);
    let mut segments = split_on_delimiter(raw);

    // Repeated copies of one rewrite are not alternatives
    let distinct = distinct_count(&segments);
    if distinct < 2 {
        if let Some(recovered) = format.recover_sections(raw, count) {
            log::debug!(
                "Delimiter split found {} distinct segment(s); {} format recovered {}",
                distinct,
                format.name(),
                recovered.len()
            );
            segments = recovered;
        }
    }

    reconcile(segments, count, fallback)
}

/// Stage 1: split on the explicit marker
pub fn split_on_delimiter(raw: &str) -> Vec<String> {
    non_empty_trimmed(DELIMITER_RE.split(raw))
}

/// Stage 2: text between consecutive numbered labels, end of text closing the last one
pub fn extract_labeled_sections(raw: &str) -> Vec<String> {
    let labels: Vec<_> = LABEL_RE.find_iter(raw).collect();
    let sections = labels.iter().enumerate().map(|(i, label)| {
        let end = labels.get(i + 1).map(|next| next.start()).unwrap_or(raw.len());
        &raw[label.end()..end]
    });
    non_empty_trimmed(sections)
}

/// Stage 3: blank-line separated paragraphs
pub fn split_paragraphs(raw: &str) -> Vec<String> {
    non_empty_trimmed(BLANK_LINE_RE.split(raw))
}

/// Pad with the first segment (or the fallback text) and truncate to `count`
pub(crate) fn reconcile(segments: Vec<String>, count: usize, fallback: &str) -> Vec<String> {
    let mut segments = non_empty_trimmed(segments.iter().map(String::as_str));

    if segments.len() < count {
        let filler = segments
            .first()
            .cloned()
            .unwrap_or_else(|| fallback.trim().to_string());
        debug_assert!(!filler.is_empty(), "padding text must not be empty");
        log::debug!(
            "Padding {} alternative(s) up to {} by repeating the first",
            segments.len(),
            count
        );
        segments.resize(count, filler);
    }

    segments.truncate(count);
    segments
}

fn distinct_count(segments: &[String]) -> usize {
    segments.iter().map(String::as_str).collect::<HashSet<_>>().len()
}

fn non_empty_trimmed<'a>(parts: impl Iterator<Item = &'a str>) -> Vec<String> {
    parts
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
