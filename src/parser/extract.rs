use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};

use html2text::render::TrivialDecorator;
use thiserror::Error;
use tracing::debug;

use super::rtf::{self, RtfError};
use crate::document::Format;

/// Wide enough that html2text never wraps a speaker line.
const HTML_WIDTH: usize = 1_000;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("pdf extraction failed: {0}")]
    Pdf(String),
    #[error("html rendering failed: {0}")]
    Html(String),
    #[error("document is not UTF-8 text")]
    Encoding,
    #[error("malformed rtf: {0}")]
    Rtf(#[from] RtfError),
    #[error("no text extracted")]
    Empty,
}

/// Turn one transcript file into plain text.
pub fn extract(path: &Path, format: Format) -> Result<String, ExtractError> {
    let text = match format {
        Format::Pdf => extract_pdf(path)?,
        Format::Html => extract_html(&read(path)?)?,
        Format::Legacy => extract_legacy(&read(path)?),
    };
    if text.trim().is_empty() {
        return Err(ExtractError::Empty);
    }
    Ok(text)
}

fn read(path: &Path) -> Result<Vec<u8>, ExtractError> {
    std::fs::read(path).map_err(|source| ExtractError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn extract_pdf(path: &Path) -> Result<String, ExtractError> {
    if let Err(source) = std::fs::metadata(path) {
        return Err(ExtractError::Io {
            path: path.to_path_buf(),
            source,
        });
    }
    // pdf-extract panics on some malformed fonts; keep that inside this file.
    panic::catch_unwind(AssertUnwindSafe(|| pdf_extract::extract_text(path)))
        .map_err(|_| ExtractError::Pdf("extractor panicked".to_string()))?
        .map_err(|e| ExtractError::Pdf(e.to_string()))
}

/// Text only: links, emphasis and footnotes render as their bare text.
pub fn extract_html(bytes: &[u8]) -> Result<String, ExtractError> {
    let html = String::from_utf8_lossy(bytes);
    html2text::config::with_decorator(TrivialDecorator::new())
        .string_from_read(html.as_bytes(), HTML_WIDTH)
        .map_err(|e| ExtractError::Html(e.to_string()))
}

/// Strict decoder first, lenient control-stripping decoder if it fails.
pub fn extract_legacy(bytes: &[u8]) -> String {
    match decode_legacy(bytes) {
        Ok(text) => text,
        Err(e) => {
            debug!("Primary legacy decode failed ({}), using fallback", e);
            rtf::strip_controls(&String::from_utf8_lossy(bytes))
        }
    }
}

fn decode_legacy(bytes: &[u8]) -> Result<String, ExtractError> {
    let text = std::str::from_utf8(bytes).map_err(|_| ExtractError::Encoding)?;
    if rtf::is_rtf(text) {
        Ok(rtf::to_text(text)?)
    } else {
        Ok(text.to_string())
    }
}
