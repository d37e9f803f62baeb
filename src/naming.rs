//! Filename conventions of the archive download directory.
//!
//! Files are saved as `<session>_<yymmdd>_<part>.<ext>`, e.g.
//! `yr14-15_240115_0.pdf`. Older hand-collected files may lack the part index.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tracing::warn;

const DATE_TOKEN_LEN: usize = 6;

/// Infer the sitting date from a `yymmdd` token in the filename.
///
/// The final `_` token is tried first, then the one before it. Two-digit
/// years up to `century_pivot` are 20xx, later ones 19xx. This boundary
/// drifts with the calendar and has to be raised once sittings after the
/// pivot year exist.
pub fn infer_date(file_name: &str, century_pivot: u32) -> Option<NaiveDate> {
    let tokens: Vec<&str> = file_name.split('_').collect();
    let last = tokens.last().map(|t| t.split('.').next().unwrap_or(t))?;

    let token = if last.len() == DATE_TOKEN_LEN {
        last
    } else if tokens.len() >= 2 {
        tokens[tokens.len() - 2]
    } else {
        last
    };

    let date = parse_yymmdd(token, century_pivot);
    if date.is_none() {
        warn!("Could not find a date in filename {}", file_name);
    }
    date
}

fn parse_yymmdd(token: &str, century_pivot: u32) -> Option<NaiveDate> {
    if token.len() != DATE_TOKEN_LEN || !token.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let yy: u32 = token[0..2].parse().ok()?;
    let month: u32 = token[2..4].parse().ok()?;
    let day: u32 = token[4..6].parse().ok()?;
    let year = if yy <= century_pivot { 2000 + yy } else { 1900 + yy };
    NaiveDate::from_ymd_opt(year as i32, month, day)
}

/// The session label after `yr` in the first `_` segment (`yr14-15` → `14-15`).
pub fn infer_legislative_year(file_name: &str) -> Option<String> {
    let first = file_name.split('_').next()?;
    let (_, label) = first.rsplit_once("yr")?;
    let label = label.split('.').next().unwrap_or(label);
    if label.is_empty() {
        None
    } else {
        Some(label.to_string())
    }
}

/// Where the per-document table for `input` is written.
pub fn parsed_path(parsed_dir: &Path, input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    parsed_dir.join(format!("{}.csv", stem))
}

/// Name under which a downloaded session part is stored.
pub fn download_name(session_label: &str, yymmdd: &str, part: usize, extension: &str) -> String {
    format!("{}_{}_{}.{}", session_label, yymmdd, part, extension)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn date_from_part_indexed_name() {
        assert_eq!(
            infer_date("yr14-15_240115_0.pdf", 25),
            NaiveDate::from_ymd_opt(2024, 1, 15)
        );
    }

    #[test]
    fn date_from_trailing_token() {
        assert_eq!(
            infer_date("yr98-99_990310.pdf", 25),
            NaiveDate::from_ymd_opt(1999, 3, 10)
        );
    }

    #[test]
    fn century_pivot_is_inclusive() {
        assert_eq!(infer_date("yr2025_250102_0.pdf", 25).map(|d| d.format("%Y").to_string()), Some("2025".into()));
        assert_eq!(infer_date("yr85-86_260102_0.pdf", 25).map(|d| d.format("%Y").to_string()), Some("1926".into()));
        assert_eq!(infer_date("yr2026_260102_0.pdf", 30).map(|d| d.format("%Y").to_string()), Some("2026".into()));
    }

    #[test]
    fn missing_date_is_none() {
        assert_eq!(infer_date("transcript.pdf", 25), None);
        assert_eq!(infer_date("yr14-15_notadate_0.pdf", 25), None);
        assert_eq!(infer_date("yr14-15_241399_0.pdf", 25), None);
    }

    #[test]
    fn legislative_year_label() {
        assert_eq!(infer_legislative_year("yr14-15_240115_0.pdf").as_deref(), Some("14-15"));
        assert_eq!(infer_legislative_year("yr2022_220112_0.pdf").as_deref(), Some("2022"));
        assert_eq!(infer_legislative_year("hansard_240115.pdf"), None);
    }

    #[test]
    fn parsed_path_swaps_extension() {
        let p = parsed_path(Path::new("parsed"), Path::new("files/yr14-15_240115_0.pdf"));
        assert_eq!(p, PathBuf::from("parsed/yr14-15_240115_0.csv"));
    }

    #[test]
    fn download_name_round_trips_through_inference() {
        let name = download_name("yr99-00", "000627", 1, "pdf");
        assert_eq!(name, "yr99-00_000627_1.pdf");
        assert_eq!(infer_date(&name, 25), NaiveDate::from_ymd_opt(2000, 6, 27));
        assert_eq!(infer_legislative_year(&name).as_deref(), Some("99-00"));
    }
}
