use std::sync::LazyLock;

use regex::Regex;

use crate::document::Utterance;

/// Upper-case name, optional "asked", then a colon: `MR TAM:`, `THE PRESIDENT:`,
/// `DR THE HONOURABLE LEUNG KA-LAU asked:`.
static SPEAKER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*([A-Z][A-Z\s,'-]*)(?:asked)?:").unwrap());

/// Labels that look like speaker lines but annotate the record instead.
const ROLE_LABELS: &[&str] = &["MEMBER", "CLERKS", "CLERK IN", "PUBLIC OFFICER"];

/// Split a speaker line into (speaker, rest of line). `None` for anything else.
pub fn match_speaker(line: &str) -> Option<(String, &str)> {
    let trimmed = line.trim_start();
    if ROLE_LABELS.iter().any(|label| trimmed.starts_with(label)) {
        return None;
    }
    let caps = SPEAKER_RE.captures(line)?;
    let speaker = caps[1].trim().to_string();
    let rest = &line[caps.get(0)?.end()..];
    Some((speaker, rest))
}

pub fn is_speaker_line(line: &str) -> bool {
    match_speaker(line).is_some()
}

/// Segment cleaned transcript text into speaker turns, in order.
///
/// Only a speaker line opens a new turn; every other non-blank line continues
/// the current one, whatever colons it contains. Text before the first speaker
/// line belongs to nobody and is dropped, as are turns with no words.
pub fn attribute(text: &str) -> Vec<Utterance> {
    let mut utterances = Vec::new();
    let mut current: Option<String> = None;
    let mut buffer = String::new();

    for line in text.split('\n') {
        if line.trim().is_empty() {
            continue;
        }
        match match_speaker(line) {
            Some((speaker, rest)) => {
                if let Some(previous) = current.take() {
                    flush(&mut utterances, previous, &buffer);
                }
                current = Some(speaker);
                buffer.clear();
                buffer.push_str(rest.trim());
                buffer.push(' ');
            }
            None => {
                buffer.push_str(line.trim());
                buffer.push(' ');
            }
        }
    }

    if let Some(last) = current {
        flush(&mut utterances, last, &buffer);
    }
    utterances
}

fn flush(out: &mut Vec<Utterance>, speaker: String, buffer: &str) {
    let text = buffer.trim();
    if speaker.is_empty() || text.is_empty() {
        return;
    }
    out.push(Utterance {
        speaker,
        text: text.to_string(),
    });
}
