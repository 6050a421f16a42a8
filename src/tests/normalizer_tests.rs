use crate::rewriter::format::{DelimitedFormat, LabeledFormat, ResponseFormat};
use crate::rewriter::normalizer::{normalize, normalize_with};
use crate::rewriter::{Backend, RewriteRequest, Tone};

fn request(backend: Backend, count: usize) -> RewriteRequest {
    RewriteRequest::new("the original text", Tone::default(), count, backend).unwrap()
}

const SAMPLE_REPLIES: &[&str] = &[
    "",
    "   \n\t ",
    "A---ALT---B---ALT---C",
    "Single block of text",
    "**Version 1:** Hi there\n\n**Version 2:** Hello",
    "Intro\n\nVersion 1: one\nVersion 2: two\nVersion 3: three",
    "p1\n\np2\n\np3\n\np4\n\np5\n\np6",
    "---ALTERNATIVE---\n---ALTERNATIVE---",
    "**Version 1:**   \n**Version 2:**",
    "x\r\n\r\ny",
];

#[test]
fn test_always_returns_requested_count_of_trimmed_non_empty_strings() {
    for backend in Backend::ALL {
        for count in 1..=5 {
            for raw in SAMPLE_REPLIES {
                let result = normalize(raw, &request(backend, count));
                assert_eq!(
                    result.len(),
                    count,
                    "backend {:?} count {} raw {:?}",
                    backend,
                    count,
                    raw
                );
                for alternative in &result {
                    assert!(!alternative.is_empty(), "empty alternative for {:?}", raw);
                    assert_eq!(alternative, alternative.trim());
                }
            }
        }
    }
}

#[test]
fn test_delimited_reply_splits_in_order() {
    for backend in Backend::ALL {
        assert_eq!(
            normalize("A---ALT---B---ALT---C", &request(backend, 3)),
            vec!["A", "B", "C"]
        );
    }
}

#[test]
fn test_labeled_reply_for_labeled_backend() {
    assert_eq!(
        normalize(
            "**Version 1:** Hi there\n\n**Version 2:** Hello",
            &request(Backend::Groq, 2)
        ),
        vec!["Hi there", "Hello"]
    );
}

#[test]
fn test_single_block_is_padded_with_copies_of_first() {
    for backend in Backend::ALL {
        let result = normalize("Just one rewrite.", &request(backend, 3));
        assert_eq!(result, vec!["Just one rewrite."; 3]);
    }
}

#[test]
fn test_surplus_segments_are_truncated() {
    let raw = "one---ALT---two---ALT---three---ALT---four---ALT---five";
    assert_eq!(normalize(raw, &request(Backend::OpenAi, 2)), vec!["one", "two"]);
}

#[test]
fn test_delimited_backend_does_not_use_label_or_paragraph_recovery() {
    let raw = "**Version 1:** first\n\n**Version 2:** second";
    let result = normalize_with(raw, 2, &DelimitedFormat, "orig");
    assert_eq!(result, vec![raw.to_string(), raw.to_string()]);
}

#[test]
fn test_paragraph_fallback_takes_first_count_paragraphs() {
    let raw = "First paragraph.\n\nSecond paragraph.\n\nThird paragraph.";
    assert_eq!(
        normalize_with(raw, 2, &LabeledFormat, "orig"),
        vec!["First paragraph.", "Second paragraph."]
    );
}

#[test]
fn test_too_few_paragraphs_falls_back_to_whole_text() {
    let raw = "First paragraph.\n\nSecond paragraph.";
    let result = normalize_with(raw, 4, &LabeledFormat, "orig");
    assert_eq!(result, vec![raw.to_string(); 4]);
}

#[test]
fn test_delimiter_wins_over_labels() {
    let raw = "Version 1: alpha---ALTERNATIVE---Version 2: beta";
    assert_eq!(
        normalize_with(raw, 2, &LabeledFormat, "orig"),
        vec!["Version 1: alpha", "Version 2: beta"]
    );
}

#[test]
fn test_blank_reply_pads_with_original_text() {
    assert_eq!(
        normalize("  \n ", &request(Backend::Groq, 2)),
        vec!["the original text", "the original text"]
    );
    assert_eq!(
        normalize("", &request(Backend::OpenAi, 1)),
        vec!["the original text"]
    );
}

#[test]
fn test_labels_with_descriptions_and_mixed_case() {
    let raw = "**OPTION 1: More formal**\nGood afternoon.\n**option 2: Casual**\nHey!";
    assert_eq!(
        normalize(raw, &request(Backend::Groq, 2)),
        vec!["Good afternoon.", "Hey!"]
    );
}

/// Recovery that always yields the same two sections
struct FixedRecovery;

impl ResponseFormat for FixedRecovery {
    fn name(&self) -> &'static str {
        "fixed"
    }

    fn system_prompt(&self, _tone: &Tone, _count: usize) -> String {
        String::new()
    }

    fn user_prompt(&self, _text: &str, _tone: &Tone, _count: usize) -> String {
        String::new()
    }

    fn recover_sections(&self, _raw: &str, _count: usize) -> Option<Vec<String>> {
        Some(vec!["x".to_string(), "y".to_string()])
    }
}

#[test]
fn test_repeated_delimited_segment_falls_through_to_recovery() {
    assert_eq!(normalize_with("A---ALT---A", 2, &FixedRecovery, "orig"), vec!["x", "y"]);
    assert_eq!(
        normalize_with(" A ---ALTERNATIVE---A\n", 2, &FixedRecovery, "orig"),
        vec!["x", "y"]
    );
    assert_eq!(normalize_with("A---ALT---B", 2, &FixedRecovery, "orig"), vec!["A", "B"]);
}

#[test]
fn test_repeated_segment_kept_when_format_has_no_recovery() {
    assert_eq!(normalize_with("A---ALT---A", 2, &DelimitedFormat, "orig"), vec!["A", "A"]);
}
