// SPDX-License-Identifier: GPL-3.0-or-later

//! Year resolution engine.
//!
//! Each file moves through an explicit chain of layers:
//! 1. Skip files that already carry a year
//! 2. Fingerprint with fpcalc and look the fingerprint up on AcoustID
//! 3. Fall back to a MusicBrainz artist/title search when both are known
//!
//! Every layer returns a [`LayerOutcome`]; the earliest candidate year wins within a layer.

use std::sync::Arc;

use chronotag_domain::{earliest_year, Candidate, CandidateSource, MediaFile, ResolutionOutcome};
use tracing::{debug, info, warn};

use crate::lookup::{FingerprintMatcher, Fingerprinter, RecordingSearcher};
use crate::tags::TagAccessor;
use crate::trace::DiagnosticTrace;

/// Result of resolving one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The file already has a year; nothing was looked up and nothing is reported.
    Skipped,
    Resolved(ResolutionOutcome),
}

/// What a single lookup layer produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayerOutcome {
    Found(i32),
    NoMatch,
    Failed(String),
}

impl LayerOutcome {
    fn from_candidates(candidates: &[Candidate]) -> Self {
        match earliest_year(candidates.iter().map(|candidate| candidate.year)) {
            Some(year) => Self::Found(year),
            None => Self::NoMatch,
        }
    }
}

pub struct YearResolver {
    fingerprinter: Arc<dyn Fingerprinter>,
    matcher: Arc<dyn FingerprintMatcher>,
    searcher: Arc<dyn RecordingSearcher>,
    tags: Arc<dyn TagAccessor>,
}

impl YearResolver {
    pub fn new(
        fingerprinter: Arc<dyn Fingerprinter>,
        matcher: Arc<dyn FingerprintMatcher>,
        searcher: Arc<dyn RecordingSearcher>,
        tags: Arc<dyn TagAccessor>,
    ) -> Self {
        Self {
            fingerprinter,
            matcher,
            searcher,
            tags,
        }
    }

    /// Resolve the release year of one file, writing it to the file's tag when found.
    ///
    /// Never fails: every tool and service error ends in a status on the outcome.
    pub async fn resolve(&self, file: &MediaFile, trace: &mut DiagnosticTrace) -> Resolution {
        let path = file.path().display().to_string();

        if let Some(year) = file.existing_year {
            debug!(target: "resolution", path = %path, year, "already has a year, skipping");
            trace.decision(format!("{}: existing year {}, skipped", path, year));
            return Resolution::Skipped;
        }

        let outcome = match self.fingerprinter.fingerprint_file(file.path()).await {
            Err(error) => {
                warn!(target: "resolution", path = %path, %error, "fingerprinting failed");
                trace.failure(format!("{}: fpcalc failed: {}", path, error));

                if file.is_searchable() {
                    self.fallback(file, trace).await
                } else {
                    trace.decision(format!("{}: no artist/title for fallback", path));
                    ResolutionOutcome::fpcalc_failed(file)
                }
            }
            Ok(sample) => match self.primary(file, &sample, trace).await {
                LayerOutcome::Found(year) => {
                    self.persist(file, CandidateSource::Fingerprint, year, trace)
                }
                LayerOutcome::NoMatch | LayerOutcome::Failed(_) if file.is_searchable() => {
                    self.fallback(file, trace).await
                }
                LayerOutcome::NoMatch | LayerOutcome::Failed(_) => {
                    trace.decision(format!("{}: no artist/title for fallback", path));
                    ResolutionOutcome::no_match(file)
                }
            },
        };

        info!(
            target: "resolution",
            path = %path,
            status = %outcome.status(),
            year = ?outcome.year(),
            "file resolved"
        );
        trace.decision(format!(
            "{}: status {} year {}",
            path,
            outcome.status(),
            outcome
                .year()
                .map(|year| year.to_string())
                .unwrap_or_else(|| "-".to_string())
        ));

        Resolution::Resolved(outcome)
    }

    async fn primary(
        &self,
        file: &MediaFile,
        sample: &chronotag_fingerprint::FingerprintSample,
        trace: &mut DiagnosticTrace,
    ) -> LayerOutcome {
        let path = file.path().display().to_string();
        let layer = match self.matcher.match_years(sample, trace).await {
            Ok(candidates) => LayerOutcome::from_candidates(&candidates),
            Err(error) => {
                warn!(target: "resolution", path = %path, %error, "AcoustID lookup failed");
                trace.failure(format!("{}: acoustid lookup failed: {}", path, error));
                LayerOutcome::Failed(error.to_string())
            }
        };

        trace.decision(format!("{}: acoustid layer {:?}", path, layer));
        layer
    }

    async fn fallback(&self, file: &MediaFile, trace: &mut DiagnosticTrace) -> ResolutionOutcome {
        let path = file.path().display().to_string();
        let layer = match self.searcher.search_years(&file.artist, &file.title, trace).await {
            Ok(candidates) => LayerOutcome::from_candidates(&candidates),
            Err(error) => {
                warn!(target: "resolution", path = %path, %error, "MusicBrainz search failed");
                trace.failure(format!("{}: musicbrainz search failed: {}", path, error));
                LayerOutcome::Failed(error.to_string())
            }
        };

        trace.decision(format!("{}: musicbrainz layer {:?}", path, layer));
        match layer {
            LayerOutcome::Found(year) => self.persist(file, CandidateSource::Search, year, trace),
            LayerOutcome::NoMatch | LayerOutcome::Failed(_) => ResolutionOutcome::no_match(file),
        }
    }

    fn persist(
        &self,
        file: &MediaFile,
        source: CandidateSource,
        year: i32,
        trace: &mut DiagnosticTrace,
    ) -> ResolutionOutcome {
        let path = file.path().display().to_string();
        let written = match self.tags.write_year(file.path(), year) {
            Ok(()) => {
                trace.decision(format!("{}: wrote year {} ({})", path, year, source));
                true
            }
            Err(error) => {
                warn!(target: "resolution", path = %path, year, %error, "tag write failed");
                trace.failure(format!("{}: writing year {} failed: {}", path, year, error));
                false
            }
        };

        ResolutionOutcome::after_write(file, source, year, written)
    }
}
