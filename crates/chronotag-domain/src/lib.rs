// SPDX-License-Identifier: GPL-3.0-or-later
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// ============================================================================
// Media Files
// ============================================================================

/// An audio file discovered by the scanner, with the tag fields resolution cares about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaFile {
    pub path: PathBuf,
    pub artist: String,
    pub title: String,
    pub existing_year: Option<i32>,
}

impl MediaFile {
    pub fn new(
        path: impl Into<PathBuf>,
        artist: impl Into<String>,
        title: impl Into<String>,
        existing_year: Option<i32>,
    ) -> Self {
        Self {
            path: path.into(),
            artist: artist.into(),
            title: title.into(),
            existing_year,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Files that already carry a year are never looked up.
    pub fn has_year(&self) -> bool {
        self.existing_year.is_some()
    }

    /// Text search needs both artist and title.
    pub fn is_searchable(&self) -> bool {
        !self.artist.trim().is_empty() && !self.title.trim().is_empty()
    }
}

// ============================================================================
// Candidates
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CandidateSource {
    Fingerprint,
    Search,
}

impl std::fmt::Display for CandidateSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Fingerprint => write!(f, "acoustid"),
            Self::Search => write!(f, "musicbrainz"),
        }
    }
}

/// A release year proposed by one lookup layer. Only `year` takes part in aggregation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub year: i32,
    pub source: CandidateSource,
    /// Match score of the result the year was taken from, when the service reports one.
    pub score: Option<f32>,
}

impl Candidate {
    pub fn new(year: i32, source: CandidateSource, score: Option<f32>) -> Self {
        Self {
            year,
            source,
            score,
        }
    }
}

/// Earliest year wins. Later dates are treated as reissues of the original release.
pub fn earliest_year<I>(years: I) -> Option<i32>
where
    I: IntoIterator<Item = i32>,
{
    years.into_iter().filter(|year| *year > 0).min()
}

/// Parse the leading year of a `YYYY`, `YYYY-MM` or `YYYY-MM-DD` date string.
///
/// Anything else yields `None`, including dates with other delimiters.
pub fn leading_year(date: &str) -> Option<i32> {
    let mut parts = date.trim().split('-');
    let year = parts.next()?;
    if year.len() != 4 || !year.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let rest: Vec<&str> = parts.collect();
    if rest.len() > 2
        || rest
            .iter()
            .any(|part| part.len() != 2 || !part.bytes().all(|b| b.is_ascii_digit()))
    {
        return None;
    }

    year.parse::<i32>().ok().filter(|year| *year > 0)
}

// ============================================================================
// Resolution Outcomes
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResolutionStatus {
    Updated,
    UpdatedFallback,
    FallbackFound,
    NoMatch,
    UpdateFailed,
    FpcalcFailed,
}

impl ResolutionStatus {
    pub const ALL: [ResolutionStatus; 6] = [
        Self::Updated,
        Self::UpdatedFallback,
        Self::FallbackFound,
        Self::NoMatch,
        Self::UpdateFailed,
        Self::FpcalcFailed,
    ];

    /// Statuses whose outcome reports a resolved year.
    pub fn carries_year(self) -> bool {
        matches!(
            self,
            Self::Updated | Self::UpdatedFallback | Self::FallbackFound
        )
    }
}

impl std::fmt::Display for ResolutionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Updated => write!(f, "Updated"),
            Self::UpdatedFallback => write!(f, "UpdatedFallback"),
            Self::FallbackFound => write!(f, "FallbackFound"),
            Self::NoMatch => write!(f, "NoMatch"),
            Self::UpdateFailed => write!(f, "UpdateFailed"),
            Self::FpcalcFailed => write!(f, "FpcalcFailed"),
        }
    }
}

/// Final result of resolving one file.
///
/// Constructed only through the associated functions below, which keep the
/// year present exactly when [`ResolutionStatus::carries_year`] holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolutionOutcome {
    path: PathBuf,
    artist: String,
    title: String,
    year: Option<i32>,
    status: ResolutionStatus,
    source: Option<CandidateSource>,
}

impl ResolutionOutcome {
    /// Outcome after a tag write was attempted for a found year.
    pub fn after_write(
        file: &MediaFile,
        source: CandidateSource,
        year: i32,
        written: bool,
    ) -> Self {
        let status = match (source, written) {
            (CandidateSource::Fingerprint, true) => ResolutionStatus::Updated,
            (CandidateSource::Fingerprint, false) => ResolutionStatus::UpdateFailed,
            (CandidateSource::Search, true) => ResolutionStatus::UpdatedFallback,
            (CandidateSource::Search, false) => ResolutionStatus::FallbackFound,
        };

        Self {
            path: file.path.clone(),
            artist: file.artist.clone(),
            title: file.title.clone(),
            year: status.carries_year().then_some(year),
            status,
            source: Some(source),
        }
    }

    pub fn no_match(file: &MediaFile) -> Self {
        Self::unresolved(file, ResolutionStatus::NoMatch)
    }

    pub fn fpcalc_failed(file: &MediaFile) -> Self {
        Self::unresolved(file, ResolutionStatus::FpcalcFailed)
    }

    fn unresolved(file: &MediaFile, status: ResolutionStatus) -> Self {
        Self {
            path: file.path.clone(),
            artist: file.artist.clone(),
            title: file.title.clone(),
            year: None,
            status,
            source: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn artist(&self) -> &str {
        &self.artist
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn year(&self) -> Option<i32> {
        self.year
    }

    pub fn status(&self) -> ResolutionStatus {
        self.status
    }

    pub fn source(&self) -> Option<CandidateSource> {
        self.source
    }
}
