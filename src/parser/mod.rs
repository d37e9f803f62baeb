pub mod attribute;
pub mod clean;
pub mod extract;
pub mod rtf;

use crate::document::{Document, Utterance};
use clean::Cleaner;
use extract::ExtractError;

/// Three-stage pipeline: file → text → cleaned text → speaker turns.
pub fn parse_document(doc: &Document, cleaner: &Cleaner) -> Result<Vec<Utterance>, ExtractError> {
    let raw = extract::extract(&doc.path, doc.format)?;
    Ok(parse_text(&raw, cleaner))
}

pub fn parse_text(raw: &str, cleaner: &Cleaner) -> Vec<Utterance> {
    let cleaned = cleaner.run(raw);
    attribute::attribute(&cleaned)
}
