//! Plain-text rendering of RTF transcripts.
//!
//! Most pre-2000 `.doc` sittings on the archive are RTF underneath. `to_text`
//! is a group-aware reader that fails on malformed input; `strip_controls`
//! is the lenient fallback that just deletes control syntax.

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

static HEX_ESCAPE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\\'[0-9a-fA-F]{2}").unwrap());
static BREAK_WORD_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\\(?:par|line|sect|page)\b-?\d* ?").unwrap());
static CONTROL_WORD_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\\[a-zA-Z]+-?\d* ?").unwrap());
static CONTROL_SYMBOL_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\\[^a-zA-Z\n]").unwrap());

/// Control words whose group carries no readable text.
const SKIPPED_DESTINATIONS: &[&str] = &[
    "fonttbl", "colortbl", "stylesheet", "info", "pict", "listtable",
    "listoverridetable", "revtbl", "rsidtbl", "generator", "xmlnstbl",
    "themedata", "datastore", "latentstyles", "object", "filetbl",
];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RtfError {
    #[error("unbalanced group at byte {0}")]
    Unbalanced(usize),
    #[error("unterminated control sequence at byte {0}")]
    Truncated(usize),
}

pub fn is_rtf(text: &str) -> bool {
    text.trim_start().starts_with(r"{\rtf")
}

/// Render RTF to text, honouring groups and skipped destinations.
pub fn to_text(src: &str) -> Result<String, RtfError> {
    let chars: Vec<(usize, char)> = src.char_indices().collect();
    let mut out = String::with_capacity(src.len() / 2);
    let mut stack: Vec<bool> = Vec::new();
    let mut skip = false;
    let mut i = 0;

    while i < chars.len() {
        let (pos, c) = chars[i];
        match c {
            '{' => {
                stack.push(skip);
                i += 1;
            }
            '}' => {
                skip = stack.pop().ok_or(RtfError::Unbalanced(pos))?;
                i += 1;
            }
            '\\' => {
                let (next_i, action) = read_control(&chars, i)?;
                i = next_i;
                match action {
                    Control::Emit(ch) if !skip => out.push(ch),
                    Control::Emit(_) => {}
                    Control::SkipGroup => skip = true,
                    Control::Unicode(ch) => {
                        if !skip {
                            out.push(ch);
                        }
                        // one fallback character follows \uN
                        i = skip_fallback(&chars, i);
                    }
                    Control::Ignore => {}
                }
            }
            '\r' | '\n' => i += 1,
            _ => {
                if !skip {
                    out.push(c);
                }
                i += 1;
            }
        }
    }

    if !stack.is_empty() {
        return Err(RtfError::Unbalanced(src.len()));
    }
    Ok(out)
}

enum Control {
    Emit(char),
    Unicode(char),
    SkipGroup,
    Ignore,
}

fn read_control(chars: &[(usize, char)], start: usize) -> Result<(usize, Control), RtfError> {
    let pos = chars[start].0;
    let Some(&(_, next)) = chars.get(start + 1) else {
        return Err(RtfError::Truncated(pos));
    };

    if !next.is_ascii_alphabetic() {
        let i = start + 2;
        return match next {
            '\\' | '{' | '}' => Ok((i, Control::Emit(next))),
            '~' => Ok((i, Control::Emit(' '))),
            '_' => Ok((i, Control::Emit('-'))),
            '\n' | '\r' => Ok((i, Control::Emit('\n'))),
            '*' => Ok((i, Control::SkipGroup)),
            '\'' => {
                let hex: String = chars.iter().skip(i).take(2).map(|(_, c)| *c).collect();
                if hex.len() != 2 {
                    return Err(RtfError::Truncated(pos));
                }
                match u8::from_str_radix(&hex, 16) {
                    Ok(b) => Ok((i + 2, Control::Emit(cp1252(b)))),
                    Err(_) => Ok((i + 2, Control::Ignore)),
                }
            }
            _ => Ok((i, Control::Ignore)),
        };
    }

    let mut i = start + 1;
    let mut word = String::new();
    while let Some(&(_, c)) = chars.get(i) {
        if !c.is_ascii_alphabetic() {
            break;
        }
        word.push(c);
        i += 1;
    }

    let mut param = String::new();
    if let Some(&(_, '-')) = chars.get(i) {
        param.push('-');
        i += 1;
    }
    while let Some(&(_, c)) = chars.get(i) {
        if !c.is_ascii_digit() {
            break;
        }
        param.push(c);
        i += 1;
    }
    if let Some(&(_, ' ')) = chars.get(i) {
        i += 1;
    }

    let control = match word.as_str() {
        "par" | "line" | "sect" | "page" | "row" => Control::Emit('\n'),
        "tab" | "cell" => Control::Emit('\t'),
        "emdash" => Control::Emit('\u{2014}'),
        "endash" => Control::Emit('\u{2013}'),
        "lquote" => Control::Emit('\u{2018}'),
        "rquote" => Control::Emit('\u{2019}'),
        "ldblquote" => Control::Emit('\u{201C}'),
        "rdblquote" => Control::Emit('\u{201D}'),
        "u" => {
            let n: i32 = param.parse().unwrap_or(0);
            let code = if n < 0 { n + 65536 } else { n };
            match char::from_u32(code as u32) {
                Some(ch) => Control::Unicode(ch),
                None => Control::Ignore,
            }
        }
        w if SKIPPED_DESTINATIONS.contains(&w) => Control::SkipGroup,
        _ => Control::Ignore,
    };
    Ok((i, control))
}

fn skip_fallback(chars: &[(usize, char)], i: usize) -> usize {
    match chars.get(i) {
        Some(&(_, '\\')) if matches!(chars.get(i + 1), Some(&(_, '\''))) => i + 4,
        Some(&(_, '{')) | Some(&(_, '}')) | Some(&(_, '\\')) | None => i,
        Some(_) => i + 1,
    }
}

fn cp1252(b: u8) -> char {
    const HIGH: [char; 32] = [
        '\u{20AC}', '\u{FFFD}', '\u{201A}', '\u{0192}', '\u{201E}', '\u{2026}', '\u{2020}', '\u{2021}',
        '\u{02C6}', '\u{2030}', '\u{0160}', '\u{2039}', '\u{0152}', '\u{FFFD}', '\u{017D}', '\u{FFFD}',
        '\u{FFFD}', '\u{2018}', '\u{2019}', '\u{201C}', '\u{201D}', '\u{2022}', '\u{2013}', '\u{2014}',
        '\u{02DC}', '\u{2122}', '\u{0161}', '\u{203A}', '\u{0153}', '\u{FFFD}', '\u{017E}', '\u{0178}',
    ];
    match b {
        0x80..=0x9F => HIGH[(b - 0x80) as usize],
        _ => b as char,
    }
}

/// Lenient fallback: delete control syntax without tracking groups.
pub fn strip_controls(src: &str) -> String {
    let text = src.replace("\r\n", "\n");
    let text = HEX_ESCAPE_RE.replace_all(&text, "");
    let text = BREAK_WORD_RE.replace_all(&text, "\n");
    let text = CONTROL_WORD_RE.replace_all(&text, "");
    let text = CONTROL_SYMBOL_RE.replace_all(&text, "");
    text.chars()
        .filter(|c| !matches!(c, '{' | '}' | '\u{FFFD}'))
        .filter(|c| !c.is_control() || matches!(c, '\n' | '\t'))
        .collect()
}
