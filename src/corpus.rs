use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::document::CorpusRow;

/// Combined table of every utterance across processed transcripts.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Corpus {
    rows: Vec<CorpusRow>,
}

impl Corpus {
    pub fn new() -> Self {
        Corpus::default()
    }

    /// Append one document's rows.
    pub fn merge(&mut self, rows: Vec<CorpusRow>) {
        self.rows.extend(rows);
    }

    pub fn rows(&self) -> &[CorpusRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Fold every per-document table in `parsed_dir` into one corpus.
    /// Tables that fail to read are logged and left out.
    pub fn from_parsed_dir(parsed_dir: &Path) -> Result<Self> {
        let mut corpus = Corpus::new();
        for path in table_paths(parsed_dir)? {
            match read_table(&path) {
                Ok(rows) => corpus.merge(rows),
                Err(e) => warn!("Error reading parsed table {}: {:#}", path.display(), e),
            }
        }
        Ok(corpus)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        write_table(path, &self.rows)?;
        info!("Wrote {} corpus rows to {}", self.rows.len(), path.display());
        Ok(())
    }
}

/// Sorted `*.csv` paths in a directory; missing directory means none.
pub fn table_paths(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }
    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)
        .with_context(|| format!("Failed to list {}", dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.extension().is_some_and(|ext| ext == "csv"))
        .collect();
    paths.sort();
    Ok(paths)
}

pub fn write_table(path: &Path, rows: &[CorpusRow]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    // Written by hand so a table with no rows still carries its header.
    writer.write_record(["speaker", "text", "date", "legislative_year"])?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn read_table(path: &Path) -> Result<Vec<CorpusRow>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;
    let mut rows = Vec::new();
    for record in reader.deserialize() {
        let row: CorpusRow =
            record.with_context(|| format!("Malformed row in {}", path.display()))?;
        rows.push(row);
    }
    Ok(rows)
}
