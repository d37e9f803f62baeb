mod config;
mod corpus;
mod document;
mod export;
mod fetch;
mod naming;
mod parser;
mod pipeline;

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context;
use clap::{Parser, Subcommand};

use crate::config::Settings;
use crate::corpus::Corpus;
use crate::document::{CorpusRow, Document};
use crate::parser::clean::Cleaner;

#[derive(Parser)]
#[command(name = "legco_hansard", about = "LegCo Hansard transcript scraper and speaker parser")]
struct Cli {
    /// Directory holding downloaded transcripts
    #[arg(long, global = true)]
    input_dir: Option<PathBuf>,
    /// Directory for per-transcript tables
    #[arg(long, global = true)]
    parsed_dir: Option<PathBuf>,
    /// Combined output table
    #[arg(long, global = true)]
    corpus: Option<PathBuf>,
    /// Parse worker count
    #[arg(short = 'j', long, global = true)]
    workers: Option<usize>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Probe the archive for sessions FROM..=TO and download what exists
    Fetch {
        #[arg(long, default_value_t = 2014)]
        from: i32,
        #[arg(long, default_value_t = 2024)]
        to: i32,
    },
    /// List candidate URLs without downloading
    Urls {
        #[arg(long, default_value_t = 2014)]
        from: i32,
        #[arg(long, default_value_t = 2024)]
        to: i32,
        /// One JSON object per line
        #[arg(long)]
        json: bool,
    },
    /// Parse a single transcript into a speaker table
    Parse {
        file: PathBuf,
        #[arg(short, long, default_value = "parsed_speech.csv")]
        output: PathBuf,
    },
    /// Parse all new transcripts and rebuild the combined table
    Run,
    /// Write the filtered text/date table consumed by the topic model
    Export {
        #[arg(long, default_value_t = 100)]
        min_chars: usize,
        #[arg(long, default_value_t = 1995)]
        since_year: i32,
        #[arg(short, long, default_value = "topic_input.csv")]
        output: PathBuf,
    },
    /// Show input, table and corpus counts
    Stats,
}

impl Cli {
    fn settings(&self) -> anyhow::Result<Settings> {
        let mut s = Settings::load()?;
        if let Some(dir) = &self.input_dir {
            s.input_dir = dir.clone();
        }
        if let Some(dir) = &self.parsed_dir {
            s.parsed_dir = dir.clone();
        }
        if let Some(path) = &self.corpus {
            s.corpus_path = path.clone();
        }
        if let Some(n) = self.workers {
            s.workers = n;
        }
        Ok(s)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();
    let settings = cli.settings()?;
    tracing::debug!(?settings, "Settings loaded");

    let result = match cli.command {
        Commands::Fetch { from, to } => {
            let candidates = fetch::generate(from, to);
            println!("Finished URL generation. Total generated: {}", candidates.len());
            let stats = fetch::download_all(candidates, &settings.input_dir, &settings.fetch).await?;
            println!(
                "Done: {} checked ({} saved, {} already present, {} not found, {} errors).",
                stats.total, stats.saved, stats.present, stats.missing, stats.errors
            );
            Ok(())
        }
        Commands::Urls { from, to, json } => {
            for c in fetch::generate(from, to) {
                if json {
                    println!("{}", serde_json::to_string(&c)?);
                } else {
                    println!("{}\t{}\t{}\t{}", c.session, c.yymmdd, c.part, c.url);
                }
            }
            Ok(())
        }
        Commands::Parse { file, output } => {
            let doc = Document::new(&file, settings.century_pivot);
            let cleaner = Cleaner::new(settings.body_name.clone());
            let utterances = parser::parse_document(&doc, &cleaner)
                .with_context(|| format!("Failed to parse {}", file.display()))?;
            let rows: Vec<CorpusRow> = utterances
                .into_iter()
                .map(|u| CorpusRow::from_utterance(u, &doc))
                .collect();
            corpus::write_table(&output, &rows)?;
            println!("Extracted {} speaker turns into {}", rows.len(), output.display());
            Ok(())
        }
        Commands::Run => {
            let summary = pipeline::run(&settings)?;
            summary.print();
            Ok(())
        }
        Commands::Export { min_chars, since_year, output } => {
            let filter = export::ExportFilter { min_chars, since_year };
            let (kept, total) = export::export(&settings.corpus_path, &output, filter)?;
            println!("Filtered corpus contains {} of {} entries -> {}", kept, total, output.display());
            println!("Candidate topics: {}", export::CANDIDATE_TOPICS.join(", "));
            Ok(())
        }
        Commands::Stats => {
            let inputs = pipeline::input_files(&settings.input_dir).unwrap_or_default();
            let pending = pipeline::pending_files(&inputs, &settings.parsed_dir);
            let tables = corpus::table_paths(&settings.parsed_dir)?;
            let corpus = Corpus::from_parsed_dir(&settings.parsed_dir)?;

            println!("Inputs:    {}", inputs.len());
            println!("Pending:   {}", pending.len());
            println!("Tables:    {}", tables.len());
            println!("Rows:      {}", corpus.len());

            let mut by_year: BTreeMap<&str, usize> = BTreeMap::new();
            for row in corpus.rows() {
                let key = if row.legislative_year.is_empty() { "-" } else { row.legislative_year.as_str() };
                *by_year.entry(key).or_default() += 1;
            }
            if !corpus.is_empty() {
                println!("\n--- Rows per legislative year ---");
                for (year, n) in &by_year {
                    println!("  {:<8} {:>8}", year, n);
                }
            }
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
