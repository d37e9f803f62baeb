//! Ordered text-cleaning passes.
//!
//! Each step is total (text in, text out) and assumes the ones before it ran:
//! front matter is located only after bullets and markup are gone, and
//! parentheticals are removed only after the language markers were used as
//! anchors.

use std::sync::LazyLock;

use regex::Regex;
use tracing::trace;

use super::attribute::is_speaker_line;

static CONTROL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\x00-\x08\x0b\x0c\x0e-\x1f\x7f]").unwrap());
static MARKUP_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[*_|]").unwrap());
static SPACES_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r" +").unwrap());
// Only the `.` form survives to this step: `*` bullets lost their star in
// StripMarkupSymbols and read as plain numbers, which stay in the text.
static BULLET_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^\d+\\*[.*]\s+").unwrap());
static PAGE_NUMBER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d+\s*$").unwrap());
static PARENTHETICAL_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)\(.*?\)").unwrap());
static BLANK_RUN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?:\n[ ]*){3,}").unwrap());

const LANGUAGE_MARKERS: &[&str] = &["(in Cantonese)", "(in English)", "(in Chinese)"];
const CLOSING_PHRASES: &[&str] = &["Suspended accordingly", "Adjourned accordingly"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    StripControlChars,
    StripMarkupSymbols,
    CollapseSpaces,
    StripNumericBullets,
    DropFrontMatter,
    TruncateAtClosing,
    DropPageFurniture,
    StripParentheticals,
    CollapseBlankLines,
}

impl Step {
    pub const ORDER: [Step; 9] = [
        Step::StripControlChars,
        Step::StripMarkupSymbols,
        Step::CollapseSpaces,
        Step::StripNumericBullets,
        Step::DropFrontMatter,
        Step::TruncateAtClosing,
        Step::DropPageFurniture,
        Step::StripParentheticals,
        Step::CollapseBlankLines,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Step::StripControlChars => "strip_control_chars",
            Step::StripMarkupSymbols => "strip_markup_symbols",
            Step::CollapseSpaces => "collapse_spaces",
            Step::StripNumericBullets => "strip_numeric_bullets",
            Step::DropFrontMatter => "drop_front_matter",
            Step::TruncateAtClosing => "truncate_at_closing",
            Step::DropPageFurniture => "drop_page_furniture",
            Step::StripParentheticals => "strip_parentheticals",
            Step::CollapseBlankLines => "collapse_blank_lines",
        }
    }

    pub fn apply(self, text: &str, cleaner: &Cleaner) -> String {
        match self {
            Step::StripControlChars => CONTROL_RE.replace_all(text, "").into_owned(),
            Step::StripMarkupSymbols => MARKUP_RE.replace_all(text, "").into_owned(),
            Step::CollapseSpaces => SPACES_RE.replace_all(text, " ").into_owned(),
            Step::StripNumericBullets => BULLET_RE.replace_all(text, "\n").into_owned(),
            Step::DropFrontMatter => drop_front_matter(text),
            Step::TruncateAtClosing => truncate_at_closing(text),
            Step::DropPageFurniture => drop_page_furniture(text, &cleaner.body_name),
            Step::StripParentheticals => PARENTHETICAL_RE.replace_all(text, "").into_owned(),
            Step::CollapseBlankLines => BLANK_RUN_RE.replace_all(text, "\n\n").into_owned(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Cleaner {
    body_name: String,
}

impl Default for Cleaner {
    fn default() -> Self {
        Cleaner::new("LEGISLATIVE COUNCIL")
    }
}

impl Cleaner {
    pub fn new(body_name: impl Into<String>) -> Self {
        Cleaner {
            body_name: body_name.into(),
        }
    }

    /// Run every step in order.
    pub fn run(&self, raw: &str) -> String {
        Step::ORDER.iter().fold(raw.to_string(), |text, step| {
            let before = text.len();
            let after = step.apply(&text, self);
            trace!(
                step = step.name(),
                before,
                after = after.len(),
                "cleaning pass"
            );
            after
        })
    }
}

/// Keep text from the first language marker or speaker line onward.
/// Without either, nothing in the document is speech.
pub fn drop_front_matter(text: &str) -> String {
    let lines: Vec<&str> = text.split('\n').collect();
    let start = lines.iter().position(|line| {
        LANGUAGE_MARKERS.iter().any(|m| line.contains(m)) || is_speaker_line(line)
    });
    match start {
        Some(i) => lines[i..].join("\n"),
        None => String::new(),
    }
}

/// Cut after the last line carrying a closing phrase, then drop every line
/// that still carries one.
pub fn truncate_at_closing(text: &str) -> String {
    let is_closing = |line: &str| CLOSING_PHRASES.iter().any(|p| line.contains(p));
    let text = truncate_after_last(text, is_closing);
    remove_lines(&text, is_closing)
}

pub fn drop_page_furniture(text: &str, body_name: &str) -> String {
    let text = remove_lines(text, |line| line.contains(body_name));
    remove_lines(&text, |line| PAGE_NUMBER_RE.is_match(line))
}

fn truncate_after_last<F>(text: &str, matches: F) -> String
where
    F: Fn(&str) -> bool,
{
    let lines: Vec<&str> = text.split('\n').collect();
    match lines.iter().rposition(|line| matches(line)) {
        Some(i) => lines[..=i].join("\n"),
        None => text.to_string(),
    }
}

fn remove_lines<F>(text: &str, drop: F) -> String
where
    F: Fn(&str) -> bool,
{
    if text.is_empty() {
        return String::new();
    }
    text.split('\n')
        .filter(|line| !drop(line))
        .collect::<Vec<_>>()
        .join("\n")
}
