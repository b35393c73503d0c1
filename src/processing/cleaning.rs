//! Normalization of raw extracted text ahead of chunking.
//!
//! The cleaner is a pure transform pipeline: it strips markup remnants, folds
//! unicode compatibility variants, normalizes whitespace, and drops noise
//! lines. It never fails; an empty input yields an empty output.

use regex::Regex;
use std::sync::LazyLock;
use unicode_normalization::UnicodeNormalization;

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("valid regex"));
static HSPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[ \t]+").expect("valid regex"));
static BLANK_RUN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{3,}").expect("valid regex"));
static HEADING_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^#+\s").expect("valid regex"));
static ELLIPSIS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\.{4,}").expect("valid regex"));
static BANG_RUN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"!{2,}").expect("valid regex"));
static QUESTION_RUN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\?{2,}").expect("valid regex"));

/// Normalize raw extracted text for chunking.
///
/// Transforms are applied in a fixed order: strip `<...>` tags, NFKC
/// normalization, `\n` line endings, collapse horizontal whitespace runs,
/// collapse blank-line runs to a single paragraph separator, drop
/// non-meaningful lines, collapse repeated terminal punctuation, and trim.
pub fn clean_content(raw: &str) -> String {
    if raw.is_empty() {
        return String::new();
    }

    let text = TAG_RE.replace_all(raw, "");
    let text: String = text.nfkc().collect();
    let text = text.replace("\r\n", "\n").replace('\r', "\n");
    let text = HSPACE_RE.replace_all(&text, " ");
    let text = BLANK_RUN_RE.replace_all(&text, "\n\n");
    let text = retain_meaningful_lines(&text);
    let text = ELLIPSIS_RE.replace_all(&text, "...");
    let text = BANG_RUN_RE.replace_all(&text, "!");
    let text = QUESTION_RUN_RE.replace_all(&text, "?");
    text.trim().to_string()
}

/// Drop lines that carry no content, keeping blank lines as paragraph
/// separators.
fn retain_meaningful_lines(text: &str) -> String {
    let kept: Vec<&str> = text
        .lines()
        .filter(|line| {
            let trimmed = line.trim();
            trimmed.is_empty() || is_meaningful_line(trimmed)
        })
        .collect();
    kept.join("\n")
}

/// A line survives when it has more than two trimmed characters, ends in a
/// sentence terminator or colon, or looks like a Markdown heading.
fn is_meaningful_line(trimmed: &str) -> bool {
    trimmed.chars().count() > 2
        || trimmed.ends_with(['.', '!', '?', ':'])
        || HEADING_RE.is_match(trimmed)
}
