// SPDX-License-Identifier: GPL-3.0-or-later

use crate::error::{MusicBrainzError, Result};
use crate::models::{years_from_search, RecordingSearchResponse, SearchQuery};
use crate::rate_limiter::RateLimiter;
use chronotag_domain::{Candidate, CandidateSource};
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, trace};
use url::Url;

const MUSICBRAINZ_API_BASE: &str = "https://musicbrainz.org/ws/2";
const USER_AGENT: &str = concat!(
    "Chronotag/",
    env!("CARGO_PKG_VERSION"),
    " ( https://github.com/chronotag/chronotag )"
);

/// Request URL, raw body and parsed form of one recording search.
#[derive(Debug, Clone)]
pub struct MusicBrainzExchange {
    pub request_url: String,
    pub raw_body: String,
    pub response: RecordingSearchResponse,
}

impl MusicBrainzExchange {
    pub fn candidates(&self) -> Vec<Candidate> {
        years_from_search(&self.response)
            .into_iter()
            .map(|year| Candidate::new(year, CandidateSource::Search, None))
            .collect()
    }
}

/// MusicBrainz API client with rate limiting.
#[derive(Debug, Clone)]
pub struct MusicBrainzClient {
    client: Client,
    base_url: String,
    rate_limiter: RateLimiter,
}

impl MusicBrainzClient {
    /// Create a new MusicBrainz client with default settings.
    pub fn new() -> Result<Self> {
        Self::builder().build()
    }

    /// Create a client builder for custom configuration.
    pub fn builder() -> MusicBrainzClientBuilder {
        MusicBrainzClientBuilder::default()
    }

    /// Build the recording search URL for a query.
    pub fn recording_search_url(&self, query: &SearchQuery) -> Result<Url> {
        if query.query.trim().is_empty() {
            return Err(MusicBrainzError::InvalidQuery("empty query".to_string()));
        }

        let mut url = Url::parse(&format!("{}/recording", self.base_url))
            .map_err(|e| MusicBrainzError::InvalidResponse(e.to_string()))?;

        url.query_pairs_mut()
            .append_pair("query", &query.query)
            .append_pair("fmt", "json");

        if let Some(limit) = query.limit {
            url.query_pairs_mut()
                .append_pair("limit", &limit.to_string());
        }

        Ok(url)
    }

    /// Search recordings.
    ///
    /// # Example
    /// ```no_run
    /// # use chronotag_musicbrainz::{MusicBrainzClient, SearchQuery};
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let client = MusicBrainzClient::new()?;
    /// let query = SearchQuery::recording("Paranoid Android", "Radiohead");
    /// let exchange = client.search_recordings(&query).await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn search_recordings(&self, query: &SearchQuery) -> Result<MusicBrainzExchange> {
        let url = self.recording_search_url(query)?;
        self.search_recordings_at(url).await
    }

    /// Run a search against a URL built by [`Self::recording_search_url`].
    ///
    /// Returns only after the rate-limit pause, on success and on failure alike.
    pub async fn search_recordings_at(&self, url: Url) -> Result<MusicBrainzExchange> {
        self.rate_limiter.throttle(self.get(url)).await
    }

    /// Internal method to perform a single GET request.
    async fn get(&self, url: Url) -> Result<MusicBrainzExchange> {
        trace!(target: "musicbrainz", "GET {}", url);

        let response = self.client.get(url.as_str()).send().await?;

        let status = response.status();
        debug!(target: "musicbrainz", "response status: {}", status);

        if status == 503 {
            return Err(MusicBrainzError::RateLimitExceeded);
        }

        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(MusicBrainzError::ApiError {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.text().await?;
        trace!(target: "musicbrainz", "response body: {}", body);

        let parsed: RecordingSearchResponse = serde_json::from_str(&body).map_err(|e| {
            MusicBrainzError::InvalidResponse(format!("Failed to parse response: {}", e))
        })?;

        Ok(MusicBrainzExchange {
            request_url: url.to_string(),
            raw_body: body,
            response: parsed,
        })
    }
}

/// Builder for configuring a MusicBrainz client.
///
/// The request interval is fixed by MusicBrainz and cannot be changed here.
#[derive(Debug)]
pub struct MusicBrainzClientBuilder {
    base_url: String,
    timeout: Duration,
}

impl Default for MusicBrainzClientBuilder {
    fn default() -> Self {
        Self {
            base_url: MUSICBRAINZ_API_BASE.to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

impl MusicBrainzClientBuilder {
    /// Set a custom base URL (useful for testing with mock servers).
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set request timeout duration.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build the MusicBrainz client.
    pub fn build(self) -> Result<MusicBrainzClient> {
        Url::parse(&self.base_url)
            .map_err(|e| MusicBrainzError::InvalidQuery(format!("Invalid base URL: {}", e)))?;

        let client = Client::builder()
            .timeout(self.timeout)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(MusicBrainzClient {
            client,
            base_url: self.base_url.trim_end_matches('/').to_string(),
            rate_limiter: RateLimiter::musicbrainz_default(),
        })
    }
}
