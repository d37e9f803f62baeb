//! Candidate URLs for the archive's Official Record of Proceedings.
//!
//! The archive changed its file naming several times. A sitting date is
//! resolved by looking it up in `EXCEPTIONS` first (multi-part or oddly named
//! sittings), then by the first matching entry of `ERA_RULES`.

use chrono::{Datelike, Days, NaiveDate, Weekday};
use serde::Serialize;

const ARCHIVE_ROOT: &str = "https://www.legco.gov.hk";

/// Session years from 2022 run with the calendar and use a four-digit label.
const CALENDAR_SESSIONS_FROM: i32 = 2022;

type Ymd = (i32, u32, u32);

/// Sittings whose files don't follow their era's pattern.
const EXCEPTIONS: &[(Ymd, &[&str])] = &[
    ((2000, 6, 27), &["counmtg/hansard/000627fa.pdf", "counmtg/hansard/000627fb.pdf"]),
    ((2000, 5, 24), &["counmtg/hansard/000524fe.pdf", "counmtg/hansard/000524t.pdf"]),
    ((1999, 12, 2), &["counmtg/hansard/991202fb.pdf"]),
    ((1999, 7, 16), &["counmtg/hansard/99716fe1.pdf", "counmtg/hansard/99716fe2.pdf"]),
    ((1999, 7, 15), &["counmtg/hansard/99715fe1.pdf", "counmtg/hansard/99715fe2.pdf"]),
    ((1999, 7, 14), &["counmtg/hansard/99714fe1.pdf", "counmtg/hansard/99714fe2.pdf"]),
    (
        (1999, 3, 10),
        &[
            "counmtg/hansard/990310fa.htm",
            "counmtg/hansard/990310fb.htm",
            "counmtg/hansard/990310fc.htm",
            "counmtg/hansard/990310fd.htm",
        ],
    ),
    ((1998, 2, 25), &["counmtg/hansard/980225a.doc", "counmtg/hansard/980225b.doc"]),
    ((1997, 9, 27), &["counmtg/hansard/970927a.htm", "counmtg/hansard/970927b.htm"]),
    // None of the last colonial sittings clash with provisional council dates.
    (
        (1997, 6, 27),
        &["lc_sitg/hansard/970627fa.doc", "lc_sitg/hansard/970627fb.doc", "lc_sitg/hansard/970627fc.doc"],
    ),
    ((1997, 6, 26), &["lc_sitg/hansard/970626fa.doc", "lc_sitg/hansard/970626fb.doc"]),
    ((1997, 6, 25), &["lc_sitg/hansard/970625fa.doc", "lc_sitg/hansard/970625fb.doc"]),
    ((1997, 6, 24), &["lc_sitg/hansard/970624fa.doc", "lc_sitg/hansard/970624fb.doc"]),
    ((1997, 6, 23), &["lc_sitg/hansard/970623fa.doc", "lc_sitg/hansard/970623fb.doc"]),
    ((1997, 6, 17), &["lc_sitg/hansard/970617fa.doc", "lc_sitg/hansard/970617fb.doc"]),
    ((1997, 6, 11), &["lc_sitg/hansard/970611fa.doc", "lc_sitg/hansard/970611fb.doc"]),
    ((1997, 6, 4), &["lc_sitg/hansard/970604fa.doc", "lc_sitg/hansard/970604fb.doc"]),
    (
        (1997, 5, 28),
        &[
            "lc_sitg/hansard/970528fa.doc",
            "lc_sitg/hansard/970528fb.doc",
            "lc_sitg/hansard/970528fc.doc",
            "lc_sitg/hansard/970528fd.doc",
        ],
    ),
    ((1997, 4, 9), &["lc_sitg/hansard/970409fa.doc", "lc_sitg/hansard/970409fb.doc"]),
    ((1996, 7, 28), &["lc_sitg/hansard/h950728.pdf"]),
    ((1996, 5, 29), &["lc_sitg/hansard/han2905.htm"]),
    ((1996, 5, 15), &["lc_sitg/hansard/han1505.htm"]),
    ((1996, 5, 1), &["lc_sitg/hansard/han0105.htm"]),
    ((1996, 2, 7), &["lc_sitg/hansard/960207fe.doc", "lc_sitg/hansard/960207t.doc"]),
];

/// When an era's naming applies. Dates compare as (year, month, day).
#[derive(Debug, Clone, Copy)]
enum Applies {
    SessionBefore(i32),
    SessionIs(i32),
    OnOrBefore(Ymd),
    Before(Ymd),
    SessionIsOnOrBefore(i32, Ymd),
    Always,
}

impl Applies {
    fn matches(self, session: i32, date: NaiveDate) -> bool {
        let ymd = (date.year(), date.month(), date.day());
        match self {
            Applies::SessionBefore(y) => session < y,
            Applies::SessionIs(y) => session == y,
            Applies::OnOrBefore(limit) => ymd <= limit,
            Applies::Before(limit) => ymd < limit,
            Applies::SessionIsOnOrBefore(y, limit) => session == y && ymd <= limit,
            Applies::Always => true,
        }
    }
}

/// Naming eras, most specific first.
const ERA_RULES: &[(Applies, &str)] = &[
    (Applies::SessionBefore(1995), "lc_sitg/hansard/h{yymmdd}.pdf"),
    (Applies::OnOrBefore((1995, 12, 6)), "lc_sitg/hansard/han{ddmm}.htm"),
    (Applies::OnOrBefore((1996, 7, 10)), "lc_sitg/hansard/{yymmdd}fe.doc"),
    (Applies::OnOrBefore((1996, 10, 9)), "lc_sitg/hansard/han{ddmm}.htm"),
    // last colonial council, after 10 Oct 1996
    (Applies::SessionIs(1996), "lc_sitg/hansard/{yymmdd}fe.doc"),
    // provisional council
    (Applies::SessionIsOnOrBefore(1997, (1997, 10, 10)), "counmtg/hansard/{yymmdd}fe.htm"),
    (Applies::SessionIs(1997), "counmtg/hansard/{yymmdd}fe.doc"),
    (Applies::Before((1999, 6, 16)), "counmtg/hansard/{yymmdd}fe.htm"),
    (Applies::Before((2001, 10, 17)), "counmtg/hansard/{yymmdd}fe.pdf"),
    (Applies::SessionBefore(2006), "counmtg/hansard/cm{mmdd}ti-translate-e.pdf"),
    (Applies::SessionBefore(2014), "counmtg/hansard/cm{mmdd}-translate-e.pdf"),
    (Applies::Always, "counmtg/hansard/cm{yyyymmdd}-translate-e.pdf"),
];

/// A legislative session, identified by the calendar year it starts in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionYear(pub i32);

impl SessionYear {
    /// Archive label: `yr14-15` up to 2021, `yr2022` afterwards.
    pub fn label(self) -> String {
        let y = self.0;
        if y < CALENDAR_SESSIONS_FROM {
            format!("yr{:02}-{:02}", y.rem_euclid(100), (y + 1).rem_euclid(100))
        } else {
            format!("yr{}", y)
        }
    }

    /// First and last calendar days on which the session could sit.
    pub fn sitting_window(self) -> (NaiveDate, NaiveDate) {
        let y = self.0;
        let (start, end) = match y {
            1983 => ((y, 9, 27), (y + 1, 9, 26)),
            // covers the late sittings of 1977, 1979, 1982, 1985
            _ if y < 1985 => ((y, 10, 1), (y + 1, 8, 16)),
            _ if y < 1997 => ((y, 10, 1), (y + 1, 7, 31)),
            1997 => ((y, 2, 22), (y + 1, 4, 8)),
            1998 => ((y, 7, 1), (y + 1, 7, 31)),
            _ if y < CALENDAR_SESSIONS_FROM => ((y, 10, 1), (y + 1, 7, 31)),
            _ => ((y, 1, 1), (y, 12, 31)),
        };
        (ymd(start), ymd(end))
    }

    /// The two transition sessions sat on weekends too.
    fn checks_weekends(self) -> bool {
        matches!(self.0, 1996 | 1997)
    }

    fn base_url(self) -> String {
        format!("{}/{}/english/", ARCHIVE_ROOT, self.label())
    }
}

fn ymd((y, m, d): Ymd) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap_or(NaiveDate::MIN)
}

/// One URL to probe, with what is needed to name the download.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Candidate {
    pub session: String,
    pub yymmdd: String,
    pub part: usize,
    pub url: String,
}

impl Candidate {
    pub fn extension(&self) -> &str {
        self.url.rsplit('.').next().unwrap_or("pdf")
    }
}

/// Relative file paths for one sitting date.
pub fn files_for(session: SessionYear, date: NaiveDate) -> Vec<String> {
    let key = (date.year(), date.month(), date.day());
    if let Some((_, files)) = EXCEPTIONS.iter().find(|(d, _)| *d == key) {
        return files.iter().map(|f| f.to_string()).collect();
    }
    ERA_RULES
        .iter()
        .find(|(applies, _)| applies.matches(session.0, date))
        .map(|(_, template)| vec![expand(template, date)])
        .unwrap_or_default()
}

fn expand(template: &str, date: NaiveDate) -> String {
    template
        .replace("{yyyymmdd}", &date.format("%Y%m%d").to_string())
        .replace("{yymmdd}", &date.format("%y%m%d").to_string())
        .replace("{mmdd}", &date.format("%m%d").to_string())
        .replace("{ddmm}", &date.format("%d%m").to_string())
}

/// Every candidate URL for sessions `from..=to`.
pub fn generate(from: i32, to: i32) -> Vec<Candidate> {
    let mut out = Vec::new();
    for year in from..=to {
        let session = SessionYear(year);
        let label = session.label();
        let base = session.base_url();
        let (start, end) = session.sitting_window();

        let mut date = start;
        while date <= end {
            let weekday = !matches!(date.weekday(), Weekday::Sat | Weekday::Sun);
            if weekday || session.checks_weekends() {
                let yymmdd = date.format("%y%m%d").to_string();
                for (part, file) in files_for(session, date).into_iter().enumerate() {
                    out.push(Candidate {
                        session: label.clone(),
                        yymmdd: yymmdd.clone(),
                        part,
                        url: format!("{}{}", base, file),
                    });
                }
            }
            match date.checked_add_days(Days::new(1)) {
                Some(next) => date = next,
                None => break,
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn session_labels() {
        assert_eq!(SessionYear(2014).label(), "yr14-15");
        assert_eq!(SessionYear(1999).label(), "yr99-00");
        assert_eq!(SessionYear(1998).label(), "yr98-99");
        assert_eq!(SessionYear(2021).label(), "yr21-22");
        assert_eq!(SessionYear(2022).label(), "yr2022");
    }

    #[test]
    fn sitting_windows() {
        assert_eq!(SessionYear(1983).sitting_window(), (d(1983, 9, 27), d(1984, 9, 26)));
        assert_eq!(SessionYear(1984).sitting_window(), (d(1984, 10, 1), d(1985, 8, 16)));
        assert_eq!(SessionYear(1990).sitting_window(), (d(1990, 10, 1), d(1991, 7, 31)));
        assert_eq!(SessionYear(1997).sitting_window(), (d(1997, 2, 22), d(1998, 4, 8)));
        assert_eq!(SessionYear(1998).sitting_window(), (d(1998, 7, 1), d(1999, 7, 31)));
        assert_eq!(SessionYear(2014).sitting_window(), (d(2014, 10, 1), d(2015, 7, 31)));
        assert_eq!(SessionYear(2023).sitting_window(), (d(2023, 1, 1), d(2023, 12, 31)));
    }

    #[test]
    fn era_patterns() {
        assert_eq!(files_for(SessionYear(1988), d(1988, 10, 12)), vec!["lc_sitg/hansard/h881012.pdf"]);
        assert_eq!(files_for(SessionYear(1995), d(1995, 11, 8)), vec!["lc_sitg/hansard/han0811.htm"]);
        assert_eq!(files_for(SessionYear(1995), d(1996, 1, 10)), vec!["lc_sitg/hansard/960110fe.doc"]);
        assert_eq!(files_for(SessionYear(1996), d(1996, 10, 16)), vec!["lc_sitg/hansard/961016fe.doc"]);
        assert_eq!(files_for(SessionYear(1997), d(1997, 7, 2)), vec!["counmtg/hansard/970702fe.htm"]);
        assert_eq!(files_for(SessionYear(1997), d(1997, 11, 5)), vec!["counmtg/hansard/971105fe.doc"]);
        assert_eq!(files_for(SessionYear(1998), d(1998, 7, 8)), vec!["counmtg/hansard/980708fe.htm"]);
        assert_eq!(files_for(SessionYear(1999), d(2000, 1, 12)), vec!["counmtg/hansard/000112fe.pdf"]);
        assert_eq!(files_for(SessionYear(2003), d(2003, 11, 5)), vec!["counmtg/hansard/cm1105ti-translate-e.pdf"]);
        assert_eq!(files_for(SessionYear(2010), d(2010, 11, 3)), vec!["counmtg/hansard/cm1103-translate-e.pdf"]);
        assert_eq!(files_for(SessionYear(2023), d(2024, 1, 15)), vec!["counmtg/hansard/cm20240115-translate-e.pdf"]);
    }

    #[test]
    fn exceptions_win_over_eras() {
        let files = files_for(SessionYear(1998), d(1999, 3, 10));
        assert_eq!(files.len(), 4);
        assert_eq!(files[0], "counmtg/hansard/990310fa.htm");
        assert_eq!(files[3], "counmtg/hansard/990310fd.htm");
    }

    #[test]
    fn generation_skips_weekends() {
        let all = generate(2014, 2014);
        assert!(all.iter().all(|c| c.session == "yr14-15"));
        // 2014-10-04 was a Saturday
        assert!(!all.iter().any(|c| c.yymmdd == "141004"));
        assert!(all.iter().any(|c| c.yymmdd == "141008"));
        let first = &all[0];
        assert_eq!(
            first.url,
            "https://www.legco.gov.hk/yr14-15/english/counmtg/hansard/cm20141001-translate-e.pdf"
        );
        assert_eq!(first.extension(), "pdf");
    }

    #[test]
    fn transition_sessions_include_weekends() {
        let all = generate(1997, 1997);
        // 1997-09-27 was a Saturday and has an exception entry
        let parts: Vec<_> = all.iter().filter(|c| c.yymmdd == "970927").collect();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[1].part, 1);
        assert_eq!(parts[1].extension(), "htm");
    }
}
