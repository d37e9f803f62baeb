//! Input table for the downstream topic model.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::corpus;
use crate::document::CorpusRow;

/// Seed topics the downstream zero-shot model is fitted against.
pub const CANDIDATE_TOPICS: &[&str] = &[
    "freedom",
    "healthcare",
    "education",
    "economy",
    "environment",
    "culture",
    "industry",
    "security",
    "justice",
    "housing",
    "abuse",
];

#[derive(Debug, Clone, Copy)]
pub struct ExportFilter {
    /// Rows need strictly more characters than this.
    pub min_chars: usize,
    pub since_year: i32,
}

impl Default for ExportFilter {
    fn default() -> Self {
        ExportFilter {
            min_chars: 100,
            since_year: 1995,
        }
    }
}

impl ExportFilter {
    pub fn keeps(&self, row: &CorpusRow) -> bool {
        let Some(year) = row.date.get(0..4).and_then(|y| y.parse::<i32>().ok()) else {
            return false;
        };
        row.text.chars().count() > self.min_chars && year >= self.since_year
    }
}

#[derive(Debug, Serialize)]
struct TopicInput<'a> {
    text: &'a str,
    date: &'a str,
}

/// Write the filtered `text,date` table. Returns (kept, total).
pub fn export(corpus_path: &Path, output: &Path, filter: ExportFilter) -> Result<(usize, usize)> {
    let rows = corpus::read_table(corpus_path)?;
    let mut writer = csv::Writer::from_path(output)
        .with_context(|| format!("Failed to create {}", output.display()))?;
    let mut kept = 0;
    for row in rows.iter().filter(|r| filter.keeps(r)) {
        writer.serialize(TopicInput {
            text: &row.text,
            date: &row.date,
        })?;
        kept += 1;
    }
    writer.flush()?;
    Ok((kept, rows.len()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(text: &str, date: &str) -> CorpusRow {
        CorpusRow {
            speaker: "MR A".into(),
            text: text.into(),
            date: date.into(),
            legislative_year: String::new(),
        }
    }

    #[test]
    fn filter_on_length_and_year() {
        let f = ExportFilter::default();
        let long = "x".repeat(101);
        assert!(f.keeps(&row(&long, "1995-01-04")));
        assert!(!f.keeps(&row(&"x".repeat(100), "2001-01-04")));
        assert!(!f.keeps(&row(&long, "1994-12-31")));
        assert!(!f.keeps(&row(&long, "")));
    }

    #[test]
    fn export_writes_text_and_date() {
        let dir = tempfile::tempdir().unwrap();
        let corpus_path = dir.path().join("transcripts.csv");
        let long = "housing ".repeat(20);
        corpus::write_table(
            &corpus_path,
            &[row(&long, "2024-01-15"), row("short", "2024-01-15"), row(&long, "1990-01-01")],
        )
        .unwrap();

        let out = dir.path().join("topics.csv");
        let (kept, total) = export(&corpus_path, &out, ExportFilter::default()).unwrap();
        assert_eq!((kept, total), (1, 3));
        let content = std::fs::read_to_string(&out).unwrap();
        assert!(content.starts_with("text,date\n"));
        assert!(content.contains("2024-01-15"));
    }
}
