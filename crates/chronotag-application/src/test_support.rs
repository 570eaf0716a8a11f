// SPDX-License-Identifier: GPL-3.0-or-later

//! In-memory fakes for the engine's collaborators.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chronotag_domain::{Candidate, CandidateSource};
use chronotag_fingerprint::{FingerprintError, FingerprintSample};
use chronotag_musicbrainz::MusicBrainzError;

use crate::lookup::{FingerprintMatcher, Fingerprinter, RecordingSearcher};
use crate::tags::{TagAccessor, TagError, TagSnapshot};
use crate::trace::DiagnosticTrace;

pub struct FakeFingerprinter {
    duration: Option<f64>,
    calls: AtomicUsize,
}

impl FakeFingerprinter {
    pub fn ok(duration: f64) -> Self {
        Self {
            duration: Some(duration),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            duration: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Fingerprinter for FakeFingerprinter {
    async fn fingerprint_file(&self, _path: &Path) -> Result<FingerprintSample, FingerprintError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.duration {
            Some(duration) => Ok(FingerprintSample::new("AQADtNIyRUkkZUqS", duration)),
            None => Err(FingerprintError::FpcalcFailed("decoder error".to_string())),
        }
    }
}

pub struct FakeMatcher {
    years: Option<Vec<i32>>,
    samples: Mutex<Vec<FingerprintSample>>,
}

impl FakeMatcher {
    pub fn years(years: &[i32]) -> Self {
        Self {
            years: Some(years.to_vec()),
            samples: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            years: None,
            samples: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.samples.lock().unwrap().len()
    }

    pub fn durations(&self) -> Vec<f64> {
        self.samples
            .lock()
            .unwrap()
            .iter()
            .map(|sample| sample.duration)
            .collect()
    }
}

#[async_trait]
impl FingerprintMatcher for FakeMatcher {
    async fn match_years(
        &self,
        sample: &FingerprintSample,
        trace: &mut DiagnosticTrace,
    ) -> Result<Vec<Candidate>, FingerprintError> {
        self.samples.lock().unwrap().push(sample.clone());
        trace.request("fake acoustid lookup");
        match &self.years {
            Some(years) => Ok(years
                .iter()
                .map(|year| Candidate::new(*year, CandidateSource::Fingerprint, Some(0.9)))
                .collect()),
            None => Err(FingerprintError::AcoustidError("HTTP 500".to_string())),
        }
    }
}

pub struct FakeSearcher {
    years: Option<Vec<i32>>,
    calls: Mutex<Vec<(String, String)>>,
}

impl FakeSearcher {
    pub fn years(years: &[i32]) -> Self {
        Self {
            years: Some(years.to_vec()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            years: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// `(artist, title)` of every search, in order.
    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl RecordingSearcher for FakeSearcher {
    async fn search_years(
        &self,
        artist: &str,
        title: &str,
        trace: &mut DiagnosticTrace,
    ) -> Result<Vec<Candidate>, MusicBrainzError> {
        self.calls
            .lock()
            .unwrap()
            .push((artist.to_string(), title.to_string()));
        trace.request("fake musicbrainz search");
        match &self.years {
            Some(years) => Ok(years
                .iter()
                .map(|year| Candidate::new(*year, CandidateSource::Search, None))
                .collect()),
            None => Err(MusicBrainzError::RateLimitExceeded),
        }
    }
}

pub struct FakeTags {
    writable: bool,
    snapshots: HashMap<PathBuf, TagSnapshot>,
    writes: Mutex<Vec<(PathBuf, i32)>>,
}

impl FakeTags {
    pub fn writable() -> Self {
        Self {
            writable: true,
            snapshots: HashMap::new(),
            writes: Mutex::new(Vec::new()),
        }
    }

    pub fn read_only() -> Self {
        Self {
            writable: false,
            ..Self::writable()
        }
    }

    pub fn with_snapshot(mut self, path: impl Into<PathBuf>, snapshot: TagSnapshot) -> Self {
        self.snapshots.insert(path.into(), snapshot);
        self
    }

    pub fn writes(&self) -> Vec<(PathBuf, i32)> {
        self.writes.lock().unwrap().clone()
    }
}

impl TagAccessor for FakeTags {
    fn read(&self, path: &Path) -> Result<TagSnapshot, TagError> {
        self.snapshots
            .get(path)
            .cloned()
            .ok_or_else(|| TagError::NoTag(path.display().to_string()))
    }

    fn write_year(&self, path: &Path, year: i32) -> Result<(), TagError> {
        self.writes.lock().unwrap().push((path.to_path_buf(), year));
        if self.writable {
            Ok(())
        } else {
            Err(TagError::NoTag(path.display().to_string()))
        }
    }
}
