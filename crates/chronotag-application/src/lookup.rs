// SPDX-License-Identifier: GPL-3.0-or-later

//! Seams between the resolution engine and the external services it consults.

use std::path::Path;

use async_trait::async_trait;
use chronotag_domain::Candidate;
use chronotag_fingerprint::{AcoustidClient, FingerprintError, FingerprintSample, Fpcalc};
use chronotag_musicbrainz::{MusicBrainzClient, MusicBrainzError, SearchQuery};
use url::Url;

use crate::trace::DiagnosticTrace;

#[async_trait]
pub trait Fingerprinter: Send + Sync {
    async fn fingerprint_file(&self, path: &Path) -> Result<FingerprintSample, FingerprintError>;
}

/// Primary layer: year candidates for an acoustic fingerprint.
#[async_trait]
pub trait FingerprintMatcher: Send + Sync {
    async fn match_years(
        &self,
        sample: &FingerprintSample,
        trace: &mut DiagnosticTrace,
    ) -> Result<Vec<Candidate>, FingerprintError>;
}

/// Fallback layer: year candidates for an artist and title, both non-empty.
#[async_trait]
pub trait RecordingSearcher: Send + Sync {
    async fn search_years(
        &self,
        artist: &str,
        title: &str,
        trace: &mut DiagnosticTrace,
    ) -> Result<Vec<Candidate>, MusicBrainzError>;
}

#[async_trait]
impl Fingerprinter for Fpcalc {
    async fn fingerprint_file(&self, path: &Path) -> Result<FingerprintSample, FingerprintError> {
        self.fingerprint(path).await
    }
}

#[async_trait]
impl FingerprintMatcher for AcoustidClient {
    async fn match_years(
        &self,
        sample: &FingerprintSample,
        trace: &mut DiagnosticTrace,
    ) -> Result<Vec<Candidate>, FingerprintError> {
        let url = self.lookup_url(sample)?;
        trace.request(format!("acoustid GET {}", redact_client_key(&url)));

        let exchange = self.lookup_at(url).await?;
        trace.response(format!("acoustid {}", exchange.raw_body));

        Ok(exchange.candidates())
    }
}

#[async_trait]
impl RecordingSearcher for MusicBrainzClient {
    async fn search_years(
        &self,
        artist: &str,
        title: &str,
        trace: &mut DiagnosticTrace,
    ) -> Result<Vec<Candidate>, MusicBrainzError> {
        let url = self.recording_search_url(&SearchQuery::recording(title, artist))?;
        trace.request(format!("musicbrainz GET {}", url));

        let exchange = self.search_recordings_at(url).await?;
        trace.response(format!("musicbrainz {}", exchange.raw_body));

        Ok(exchange.candidates())
    }
}

/// The AcoustID key travels in the query string; keep it out of the trace file.
fn redact_client_key(url: &Url) -> String {
    let mut redacted = url.clone();
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(key, value)| {
            let value = if key == "client" {
                "***".to_string()
            } else {
                value.into_owned()
            };
            (key.into_owned(), value)
        })
        .collect();

    redacted.query_pairs_mut().clear().extend_pairs(pairs);
    redacted.to_string()
}
