use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::naming;

/// Source format, decided by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Pdf,
    Html,
    /// RTF-like or legacy word-processor file (`.doc`, `.rtf`, ...).
    Legacy,
}

impl Format {
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        match ext.as_str() {
            "pdf" => Format::Pdf,
            "htm" | "html" => Format::Html,
            _ => Format::Legacy,
        }
    }
}

/// One transcript file on disk plus what its name tells us.
#[derive(Debug, Clone)]
pub struct Document {
    pub path: PathBuf,
    pub format: Format,
    pub date: Option<NaiveDate>,
    pub legislative_year: Option<String>,
}

impl Document {
    pub fn new(path: &Path, century_pivot: u32) -> Self {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();
        Document {
            path: path.to_path_buf(),
            format: Format::from_path(path),
            date: naming::infer_date(file_name, century_pivot),
            legislative_year: naming::infer_legislative_year(file_name),
        }
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// A single speaker turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Utterance {
    pub speaker: String,
    pub text: String,
}

/// One row of a per-document table and of the combined corpus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorpusRow {
    pub speaker: String,
    pub text: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub legislative_year: String,
}

impl CorpusRow {
    pub fn from_utterance(u: Utterance, doc: &Document) -> Self {
        CorpusRow {
            speaker: u.speaker,
            text: u.text,
            date: doc
                .date
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
            legislative_year: doc.legislative_year.clone().unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_dispatch() {
        assert_eq!(Format::from_path(Path::new("a/yr14-15_240115_0.pdf")), Format::Pdf);
        assert_eq!(Format::from_path(Path::new("yr98-99_990310_1.HTM")), Format::Html);
        assert_eq!(Format::from_path(Path::new("x.html")), Format::Html);
        assert_eq!(Format::from_path(Path::new("yr96-97_961009_0.doc")), Format::Legacy);
        assert_eq!(Format::from_path(Path::new("no_extension")), Format::Legacy);
    }

    #[test]
    fn document_from_archive_name() {
        let doc = Document::new(Path::new("files/yr14-15_240115_0.pdf"), 25);
        assert_eq!(doc.format, Format::Pdf);
        assert_eq!(doc.date, NaiveDate::from_ymd_opt(2024, 1, 15));
        assert_eq!(doc.legislative_year.as_deref(), Some("14-15"));
        assert_eq!(doc.file_name(), "yr14-15_240115_0.pdf");
    }

    #[test]
    fn row_carries_document_columns() {
        let doc = Document::new(Path::new("yr98-99_990310.htm"), 25);
        let row = CorpusRow::from_utterance(
            Utterance { speaker: "MR A".into(), text: "hello".into() },
            &doc,
        );
        assert_eq!(row.date, "1999-03-10");
        assert_eq!(row.legislative_year, "98-99");
    }

    #[test]
    fn row_without_date_has_empty_columns() {
        let doc = Document::new(Path::new("minutes.pdf"), 25);
        let row = CorpusRow::from_utterance(
            Utterance { speaker: "MR A".into(), text: "hello".into() },
            &doc,
        );
        assert!(row.date.is_empty());
        assert!(row.legislative_year.is_empty());
    }
}
