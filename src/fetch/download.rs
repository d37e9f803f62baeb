use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use tokio::io::AsyncWriteExt;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use super::urls::Candidate;
use crate::config::FetchSettings;
use crate::naming;

const MAX_RETRIES: u32 = 2;
const BASE_BACKOFF_MS: u64 = 2000;

/// Fetch stats returned after completion.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FetchStats {
    pub total: usize,
    pub saved: usize,
    pub present: usize,
    pub missing: usize,
    pub errors: usize,
}

#[derive(Debug)]
enum FetchStatus {
    Saved(PathBuf),
    AlreadyPresent,
    NotFound(u16),
    Failed(String),
}

#[derive(Debug)]
struct FetchRow {
    url: String,
    status: FetchStatus,
}

/// Probe every candidate and save the ones the archive serves.
/// Failures are logged per URL and never stop the scan.
pub async fn download_all(
    candidates: Vec<Candidate>,
    input_dir: &Path,
    settings: &FetchSettings,
) -> Result<FetchStats> {
    tokio::fs::create_dir_all(input_dir)
        .await
        .with_context(|| format!("Failed to create {}", input_dir.display()))?;

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(settings.timeout_secs))
        .build()
        .context("Failed to build HTTP client")?;
    let concurrency = settings.concurrency.max(1);
    let semaphore = Arc::new(Semaphore::new(concurrency));
    let delay = Duration::from_millis(settings.delay_ms);
    let total = candidates.len();

    let pb = ProgressBar::new(total as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40} {pos}/{len} ({per_sec}, eta {eta})")?
            .progress_chars("=> "),
    );

    let (tx, mut rx) = tokio::sync::mpsc::channel::<FetchRow>(concurrency * 2);

    for candidate in candidates {
        let client = client.clone();
        let sem = Arc::clone(&semaphore);
        let tx = tx.clone();
        let target = input_dir.join(naming::download_name(
            &candidate.session,
            &candidate.yymmdd,
            candidate.part,
            candidate.extension(),
        ));

        tokio::spawn(async move {
            let Ok(_permit) = sem.acquire().await else {
                return;
            };
            let status = if tokio::fs::try_exists(&target).await.unwrap_or(false) {
                FetchStatus::AlreadyPresent
            } else {
                let status = fetch_with_retry(&client, &candidate.url, &target).await;
                tokio::time::sleep(delay).await;
                status
            };
            let _ = tx
                .send(FetchRow {
                    url: candidate.url,
                    status,
                })
                .await;
        });
    }

    // rx closes once every task has dropped its sender
    drop(tx);

    let mut stats = FetchStats {
        total,
        ..Default::default()
    };
    let mut found = Vec::new();

    while let Some(row) = rx.recv().await {
        match row.status {
            FetchStatus::Saved(path) => {
                info!("Saved {} from {}", path.display(), row.url);
                stats.saved += 1;
                found.push(row.url);
            }
            FetchStatus::AlreadyPresent => {
                debug!("Already downloaded: {}", row.url);
                stats.present += 1;
            }
            FetchStatus::NotFound(code) => {
                debug!("Not found (status {}): {}", code, row.url);
                stats.missing += 1;
            }
            FetchStatus::Failed(e) => {
                warn!("Request failed for {}: {}", row.url, e);
                stats.errors += 1;
            }
        }
        pb.inc(1);
    }

    pb.finish_and_clear();
    append_url_log(&settings.url_log, &found).await?;
    info!(
        "Checked {} URLs ({} saved, {} present, {} missing, {} errors)",
        stats.total, stats.saved, stats.present, stats.missing, stats.errors
    );
    Ok(stats)
}

async fn fetch_with_retry(client: &reqwest::Client, url: &str, target: &Path) -> FetchStatus {
    for attempt in 0..=MAX_RETRIES {
        let status = fetch_one(client, url, target).await;

        let should_retry = matches!(status, FetchStatus::NotFound(code) if code == 429 || code >= 500);
        if !should_retry || attempt == MAX_RETRIES {
            return status;
        }

        let backoff = Duration::from_millis(BASE_BACKOFF_MS * 2u64.pow(attempt));
        warn!(
            "Archive busy on {} (attempt {}/{}), backing off {:.1}s",
            url,
            attempt + 1,
            MAX_RETRIES,
            backoff.as_secs_f64()
        );
        tokio::time::sleep(backoff).await;
    }
    fetch_one(client, url, target).await
}

async fn fetch_one(client: &reqwest::Client, url: &str, target: &Path) -> FetchStatus {
    let response = match client.get(url).send().await {
        Ok(r) => r,
        Err(e) => return FetchStatus::Failed(e.to_string()),
    };
    if response.status() != reqwest::StatusCode::OK {
        return FetchStatus::NotFound(response.status().as_u16());
    }
    let bytes = match response.bytes().await {
        Ok(b) => b,
        Err(e) => return FetchStatus::Failed(e.to_string()),
    };
    match save_atomically(target, &bytes).await {
        Ok(()) => FetchStatus::Saved(target.to_path_buf()),
        Err(e) => FetchStatus::Failed(format!("write {}: {}", target.display(), e)),
    }
}

/// An interrupted write leaves only `<name>.part`, which the skip check ignores.
async fn save_atomically(target: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let partial = part_path(target);
    tokio::fs::write(&partial, bytes).await?;
    tokio::fs::rename(&partial, target).await
}

fn part_path(target: &Path) -> PathBuf {
    let mut name = target.file_name().unwrap_or_default().to_os_string();
    name.push(".part");
    target.with_file_name(name)
}

async fn append_url_log(path: &Path, urls: &[String]) -> Result<()> {
    if urls.is_empty() {
        return Ok(());
    }
    let mut file = tokio::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await
        .with_context(|| format!("Failed to open {}", path.display()))?;
    for url in urls {
        file.write_all(format!("{}\n", url).as_bytes()).await?;
    }
    file.flush().await?;
    Ok(())
}
