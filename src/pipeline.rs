use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::config::Settings;
use crate::corpus::{self, Corpus};
use crate::document::{CorpusRow, Document};
use crate::naming;
use crate::parser::{self, clean::Cleaner};

/// What happened to one input file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    Parsed { rows: usize },
    /// Extracted fine but no speaker turns were found.
    Empty,
    Failed { reason: String },
}

#[derive(Debug, Clone)]
pub struct FileResult {
    pub file_name: String,
    pub outcome: FileOutcome,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub skipped: usize,
    pub parsed: usize,
    pub empty: usize,
    pub failed: usize,
    pub new_rows: usize,
    pub corpus_rows: usize,
}

impl RunSummary {
    pub fn print(&self) {
        println!(
            "Parsed {} files ({} rows), {} without speakers, {} failed, {} already done.",
            self.parsed, self.new_rows, self.empty, self.failed, self.skipped,
        );
        println!("Total rows in combined table: {}", self.corpus_rows);
    }
}

/// Everything a worker needs; shared read-only across the pool.
pub struct ParseJob {
    pub parsed_dir: PathBuf,
    pub century_pivot: u32,
    pub cleaner: Cleaner,
}

impl ParseJob {
    pub fn from_settings(settings: &Settings) -> Self {
        ParseJob {
            parsed_dir: settings.parsed_dir.clone(),
            century_pivot: settings.century_pivot,
            cleaner: Cleaner::new(settings.body_name.clone()),
        }
    }

    /// Parse one file and write its table. Never panics the pool on bad input.
    pub fn parse_and_save(&self, path: &Path) -> FileOutcome {
        let doc = Document::new(path, self.century_pivot);
        let file_name = doc.file_name();

        let utterances = match parser::parse_document(&doc, &self.cleaner) {
            Ok(u) => u,
            Err(e) => {
                warn!("Exception in parsing {}: {}", file_name, e);
                return FileOutcome::Failed { reason: e.to_string() };
            }
        };
        info!("Parsing {}, rows found: {}", file_name, utterances.len());

        let rows: Vec<CorpusRow> = utterances
            .into_iter()
            .map(|u| CorpusRow::from_utterance(u, &doc))
            .collect();
        let count = rows.len();

        let target = naming::parsed_path(&self.parsed_dir, path);
        if let Err(e) = save_atomically(&target, &rows) {
            warn!("Failed to save {}: {:#}", target.display(), e);
            return FileOutcome::Failed { reason: format!("{:#}", e) };
        }

        if count == 0 {
            FileOutcome::Empty
        } else {
            FileOutcome::Parsed { rows: count }
        }
    }
}

/// Write next to the target and rename, so an interrupted run never leaves a
/// half-written table that a rerun would skip.
fn save_atomically(target: &Path, rows: &[CorpusRow]) -> Result<()> {
    let partial = target.with_extension("csv.part");
    corpus::write_table(&partial, rows)?;
    std::fs::rename(&partial, target)
        .with_context(|| format!("Failed to move table into {}", target.display()))?;
    Ok(())
}

/// Regular files in the input directory, sorted by name.
pub fn input_files(input_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(input_dir)
        .with_context(|| format!("Failed to list input directory {}", input_dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file())
        .collect();
    files.sort();
    Ok(files)
}

/// Inputs whose table does not exist yet.
pub fn pending_files(inputs: &[PathBuf], parsed_dir: &Path) -> Vec<PathBuf> {
    inputs
        .iter()
        .filter(|p| !naming::parsed_path(parsed_dir, p).exists())
        .cloned()
        .collect()
}

/// Parse files on a fixed-size pool and wait for all of them.
pub fn parse_all(job: &ParseJob, files: &[PathBuf], workers: usize) -> Result<Vec<FileResult>> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers.max(1))
        .build()
        .context("Failed to start parse pool")?;

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec})")?
            .progress_chars("#>-"),
    );

    let results = pool.install(|| {
        files
            .par_iter()
            .map(|path| {
                let outcome = job.parse_and_save(path);
                pb.inc(1);
                FileResult {
                    file_name: path
                        .file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or_default(),
                    outcome,
                }
            })
            .collect()
    });

    pb.finish_and_clear();
    Ok(results)
}

/// Parse every new input, then rebuild the combined table from all tables on disk.
pub fn run(settings: &Settings) -> Result<RunSummary> {
    std::fs::create_dir_all(&settings.parsed_dir)
        .with_context(|| format!("Failed to create {}", settings.parsed_dir.display()))?;

    let inputs = input_files(&settings.input_dir)?;
    let pending = pending_files(&inputs, &settings.parsed_dir);
    let mut summary = RunSummary {
        skipped: inputs.len() - pending.len(),
        ..Default::default()
    };

    if pending.is_empty() {
        println!("No new files to parse.");
    } else {
        println!("Parsing {} new files with {} workers...", pending.len(), settings.workers);
        let job = ParseJob::from_settings(settings);
        for result in parse_all(&job, &pending, settings.workers)? {
            match result.outcome {
                FileOutcome::Parsed { rows } => {
                    summary.parsed += 1;
                    summary.new_rows += rows;
                }
                FileOutcome::Empty => summary.empty += 1,
                FileOutcome::Failed { reason } => {
                    debug!("{} left for the next run: {}", result.file_name, reason);
                    summary.failed += 1;
                }
            }
        }
    }

    let corpus = Corpus::from_parsed_dir(&settings.parsed_dir)?;
    corpus.save(&settings.corpus_path)?;
    summary.corpus_rows = corpus.len();
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings_in(root: &Path) -> Settings {
        Settings {
            input_dir: root.join("files"),
            parsed_dir: root.join("parsed"),
            corpus_path: root.join("transcripts.csv"),
            workers: 4,
            ..Settings::default()
        }
    }

    fn seed_inputs(settings: &Settings) {
        std::fs::create_dir_all(&settings.input_dir).unwrap();
        for name in [
            "yr98-99_990310_0.htm",
            "yr96-97_961009_0.doc",
            "yr14-15_240115_0.pdf",
            "yr23-24_240117_0.pdf",
        ] {
            std::fs::copy(
                Path::new("tests/fixtures").join(name),
                settings.input_dir.join(name),
            )
            .unwrap();
        }
        std::fs::write(
            settings.input_dir.join("yr14-15_240116_0.htm"),
            "<p>Table of contents only</p>",
        )
        .unwrap();
    }

    #[test]
    fn full_run_builds_corpus() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings_in(dir.path());
        seed_inputs(&settings);

        let summary = run(&settings).unwrap();
        assert_eq!(summary.parsed, 3);
        assert_eq!(summary.empty, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.skipped, 0);
        assert_eq!(summary.new_rows, 11);
        assert_eq!(summary.corpus_rows, 11);

        // corrupt pdf leaves no table behind
        assert!(!settings.parsed_dir.join("yr14-15_240115_0.csv").exists());
        assert!(settings.parsed_dir.join("yr14-15_240116_0.csv").exists());

        let rows = corpus::read_table(&settings.corpus_path).unwrap();
        assert_eq!(rows.len(), 11);
        assert!(rows
            .iter()
            .any(|r| r.date == "1999-03-10" && r.legislative_year == "98-99"));
        assert!(rows
            .iter()
            .any(|r| r.date == "1996-10-09" && r.legislative_year == "96-97"));
        let from_pdf: Vec<&CorpusRow> = rows.iter().filter(|r| r.date == "2024-01-17").collect();
        assert_eq!(from_pdf.len(), 3);
        assert!(from_pdf
            .iter()
            .all(|r| r.legislative_year == "23-24" && !r.text.contains("Adjourned")));
        assert_eq!(from_pdf[1].speaker, "SECRETARY FOR HOUSING");
    }

    #[test]
    fn rerun_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings_in(dir.path());
        seed_inputs(&settings);

        run(&settings).unwrap();
        let first = std::fs::read_to_string(&settings.corpus_path).unwrap();

        let summary = run(&settings).unwrap();
        let second = std::fs::read_to_string(&settings.corpus_path).unwrap();
        assert_eq!(first, second);
        assert_eq!(summary.skipped, 4);
        assert_eq!(summary.parsed, 0);
        // the failed pdf is retried, and fails again
        assert_eq!(summary.failed, 1);
    }

    #[test]
    fn pending_skips_existing_tables() {
        let dir = tempfile::tempdir().unwrap();
        let parsed = dir.path().join("parsed");
        std::fs::create_dir_all(&parsed).unwrap();
        std::fs::write(parsed.join("yr14-15_240115_0.csv"), "speaker,text,date,legislative_year\n").unwrap();
        let inputs = vec![
            PathBuf::from("files/yr14-15_240115_0.pdf"),
            PathBuf::from("files/yr14-15_240116_0.pdf"),
        ];
        assert_eq!(
            pending_files(&inputs, &parsed),
            vec![PathBuf::from("files/yr14-15_240116_0.pdf")]
        );
    }

    #[test]
    fn missing_input_dir_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(input_files(&dir.path().join("nope")).is_err());
    }

    #[test]
    fn one_file_job_writes_table() {
        let dir = tempfile::tempdir().unwrap();
        let job = ParseJob {
            parsed_dir: dir.path().to_path_buf(),
            century_pivot: 25,
            cleaner: Cleaner::default(),
        };
        let outcome = job.parse_and_save(Path::new("tests/fixtures/yr96-97_961009_0.doc"));
        assert_eq!(outcome, FileOutcome::Parsed { rows: 3 });
        let rows = corpus::read_table(&dir.path().join("yr96-97_961009_0.csv")).unwrap();
        assert_eq!(rows[0].speaker, "THE PRESIDENT");
        assert!(!dir.path().join("yr96-97_961009_0.csv.part").exists());
    }
}
