use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Deserialize;

const CONFIG_FILE: &str = "legco";
const ENV_PREFIX: &str = "LEGCO";

/// Runtime settings. Built-in defaults, then `legco.toml`, then `LEGCO_*` env vars.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub input_dir: PathBuf,
    pub parsed_dir: PathBuf,
    pub corpus_path: PathBuf,
    pub workers: usize,
    /// Two-digit years up to and including this value are read as 20xx.
    pub century_pivot: u32,
    /// Page-header text repeated on every page of a transcript.
    pub body_name: String,
    pub fetch: FetchSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetchSettings {
    pub timeout_secs: u64,
    pub delay_ms: u64,
    pub concurrency: usize,
    pub url_log: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            input_dir: PathBuf::from("files"),
            parsed_dir: PathBuf::from("parsed"),
            corpus_path: PathBuf::from("transcripts.csv"),
            workers: 16,
            century_pivot: 25,
            body_name: "LEGISLATIVE COUNCIL".to_string(),
            fetch: FetchSettings::default(),
        }
    }
}

impl Default for FetchSettings {
    fn default() -> Self {
        FetchSettings {
            timeout_secs: 15,
            delay_ms: 500,
            concurrency: 1,
            url_log: PathBuf::from("legco_urls.txt"),
        }
    }
}

impl Settings {
    pub fn load() -> Result<Self> {
        config::Config::builder()
            .add_source(config::File::with_name(CONFIG_FILE).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()
            .context("Failed to read configuration")?
            .try_deserialize()
            .context("Invalid configuration")
    }
}
