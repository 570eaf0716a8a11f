// SPDX-License-Identifier: GPL-3.0-or-later

//! Per-run report: one row per processed file, written as CSV at the end of the run.

use std::path::Path;

use chronotag_domain::{ResolutionOutcome, ResolutionStatus};
use thiserror::Error;
use url::Url;

const SEARCH_ENGINE_URL: &str = "https://www.google.com/search";
const CSV_HEADER: [&str; 6] = ["path", "artist", "title", "year", "status", "search_url"];

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Web search link a person can follow to check a file's year by hand.
pub fn search_url(title: &str, artist: &str) -> String {
    let terms = format!("{} {}", title.trim(), artist.trim());
    match Url::parse_with_params(SEARCH_ENGINE_URL, &[("q", terms.trim())]) {
        Ok(url) => url.to_string(),
        Err(_) => SEARCH_ENGINE_URL.to_string(),
    }
}

#[derive(Debug, Default)]
pub struct RunReport {
    outcomes: Vec<ResolutionOutcome>,
}

impl RunReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, outcome: ResolutionOutcome) {
        self.outcomes.push(outcome);
    }

    pub fn outcomes(&self) -> &[ResolutionOutcome] {
        &self.outcomes
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn count(&self, status: ResolutionStatus) -> usize {
        self.outcomes
            .iter()
            .filter(|outcome| outcome.status() == status)
            .count()
    }

    /// Write the report to `path`, replacing any previous report.
    pub fn write_csv(&self, path: &Path) -> Result<(), ReportError> {
        let mut writer = csv::Writer::from_path(path)?;
        writer.write_record(CSV_HEADER)?;

        for outcome in &self.outcomes {
            let year = outcome.year().map(|year| year.to_string()).unwrap_or_default();
            writer.write_record([
                outcome.path().display().to_string().as_str(),
                outcome.artist(),
                outcome.title(),
                year.as_str(),
                outcome.status().to_string().as_str(),
                search_url(outcome.title(), outcome.artist()).as_str(),
            ])?;
        }

        writer.flush()?;
        Ok(())
    }
}

/// Counts printed at the end of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub skipped: usize,
    pub by_status: Vec<(ResolutionStatus, usize)>,
}

impl RunSummary {
    pub fn new(report: &RunReport, skipped: usize) -> Self {
        Self {
            skipped,
            by_status: ResolutionStatus::ALL
                .iter()
                .map(|status| (*status, report.count(*status)))
                .collect(),
        }
    }

    pub fn processed(&self) -> usize {
        self.by_status.iter().map(|(_, count)| count).sum()
    }
}

impl std::fmt::Display for RunSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "processed {}, skipped {}", self.processed(), self.skipped)?;
        for (status, count) in &self.by_status {
            write!(f, ", {} {}", status, count)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chronotag_domain::{CandidateSource, MediaFile};

    fn sample_report() -> RunReport {
        let found = MediaFile::new("/music/a.mp3", "Artist A", "Song B", None);
        let missing = MediaFile::new("/music/b, live.mp3", "", "", None);

        let mut report = RunReport::new();
        report.push(ResolutionOutcome::after_write(
            &found,
            CandidateSource::Fingerprint,
            1999,
            true,
        ));
        report.push(ResolutionOutcome::fpcalc_failed(&missing));
        report
    }

    #[test]
    fn search_url_encodes_title_and_artist() {
        let url = search_url("Song B", "Artist A");
        assert_eq!(url, "https://www.google.com/search?q=Song+B+Artist+A");
    }

    #[test]
    fn search_url_with_empty_fields() {
        assert_eq!(search_url("", ""), "https://www.google.com/search?q=");
    }

    #[test]
    fn writes_header_and_one_row_per_outcome() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.csv");

        sample_report().write_csv(&path).unwrap();

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let headers = reader.headers().unwrap().clone();
        assert_eq!(headers, csv::StringRecord::from(CSV_HEADER.to_vec()));

        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(&rows[0][0], "/music/a.mp3");
        assert_eq!(&rows[0][3], "1999");
        assert_eq!(&rows[0][4], "Updated");
        assert_eq!(&rows[0][5], "https://www.google.com/search?q=Song+B+Artist+A");
        assert_eq!(&rows[1][0], "/music/b, live.mp3");
        assert_eq!(&rows[1][3], "");
        assert_eq!(&rows[1][4], "FpcalcFailed");
    }

    #[test]
    fn summary_counts_each_status() {
        let summary = RunSummary::new(&sample_report(), 3);

        assert_eq!(summary.processed(), 2);
        assert!(summary
            .by_status
            .contains(&(ResolutionStatus::Updated, 1)));
        assert!(summary
            .by_status
            .contains(&(ResolutionStatus::FpcalcFailed, 1)));
        assert!(summary.to_string().starts_with("processed 2, skipped 3"));
    }
}
