// SPDX-License-Identifier: GPL-3.0-or-later

use crate::error::Result;
use crate::fingerprint::FingerprintSample;
use chronotag_domain::{Candidate, CandidateSource};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};
use tracing::{debug, trace};
use url::Url;
use uuid::Uuid;

const ACOUSTID_API_BASE: &str = "https://api.acoustid.org/v2";
const LOOKUP_META: &str = "releases";
const USER_AGENT: &str = concat!(
    "Chronotag/",
    env!("CARGO_PKG_VERSION"),
    " ( https://github.com/chronotag/chronotag )"
);

/// AcoustID lookup response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LookupResponse {
    /// `"ok"` on success, `"error"` otherwise.
    pub status: String,
    #[serde(default)]
    pub results: Vec<LookupResult>,
    #[serde(default)]
    pub error: Option<ApiErrorBody>,
}

/// Error object returned alongside `"status": "error"`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub code: Option<i64>,
    pub message: String,
}

/// One AcoustID track matched by the fingerprint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LookupResult {
    /// AcoustID track ID.
    pub id: Uuid,
    /// Match score (0-1), higher is more confident.
    pub score: f32,
    #[serde(default)]
    pub releases: Vec<Release>,
    /// Present when recordings metadata was requested; releases then nest here.
    #[serde(default)]
    pub recordings: Vec<Recording>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Recording {
    #[serde(default)]
    pub id: Option<Uuid>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub releases: Vec<Release>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Release {
    #[serde(default)]
    pub id: Option<Uuid>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub date: Option<PartialDate>,
    #[serde(default)]
    pub releaseevents: Vec<ReleaseEvent>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReleaseEvent {
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub date: Option<PartialDate>,
}

/// Date split into parts; any of them may be missing.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PartialDate {
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub month: Option<u32>,
    #[serde(default)]
    pub day: Option<u32>,
}

impl Release {
    /// Years from the release's own date and from each of its release events.
    fn years(&self) -> impl Iterator<Item = i32> + '_ {
        self.date
            .iter()
            .chain(self.releaseevents.iter().filter_map(|event| event.date.as_ref()))
            .filter_map(|date| date.year)
            .filter(|year| *year > 0)
    }
}

impl LookupResult {
    /// Every release year attached to this result, top-level and recording-nested.
    pub fn release_years(&self) -> Vec<i32> {
        self.releases
            .iter()
            .chain(self.recordings.iter().flat_map(|r| r.releases.iter()))
            .flat_map(Release::years)
            .collect()
    }
}

/// Highest-scoring result; on equal scores the earlier result wins.
pub fn best_result(results: &[LookupResult]) -> Option<&LookupResult> {
    results.iter().fold(None, |best: Option<&LookupResult>, candidate| match best {
        Some(current) if candidate.score <= current.score => Some(current),
        Some(current) if candidate.score.is_nan() => Some(current),
        _ => Some(candidate),
    })
}

/// Year candidates from the best result of a lookup.
///
/// Empty when the service did not report `ok`, returned no results, or the best
/// result has no dated releases.
pub fn candidates_from_lookup(response: &LookupResponse) -> Vec<Candidate> {
    if !response.status.eq_ignore_ascii_case("ok") {
        return Vec::new();
    }

    match best_result(&response.results) {
        Some(best) => best
            .release_years()
            .into_iter()
            .map(|year| Candidate::new(year, CandidateSource::Fingerprint, Some(best.score)))
            .collect(),
        None => Vec::new(),
    }
}

/// Request URL, raw body and parsed form of one AcoustID lookup.
#[derive(Debug, Clone)]
pub struct AcoustidExchange {
    pub request_url: String,
    pub raw_body: String,
    pub response: LookupResponse,
}

impl AcoustidExchange {
    pub fn candidates(&self) -> Vec<Candidate> {
        candidates_from_lookup(&self.response)
    }
}

/// AcoustID API client for fingerprint lookup.
#[derive(Debug, Clone)]
pub struct AcoustidClient {
    client: Client,
    base_url: String,
    api_key: String,
    request_interval: Option<Duration>,
    last_request: Arc<Mutex<Option<Instant>>>,
}

impl AcoustidClient {
    /// Create a new AcoustID client.
    ///
    /// # Arguments
    /// * `api_key` - AcoustID application API key for requests.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::builder(api_key).build()
    }

    /// Create a client builder for custom configuration.
    pub fn builder(api_key: impl Into<String>) -> AcoustidClientBuilder {
        AcoustidClientBuilder::new(api_key)
    }

    /// Build the lookup URL for a sample.
    ///
    /// The API key is part of the query string, so callers logging this URL log the key too.
    pub fn lookup_url(&self, sample: &FingerprintSample) -> Result<Url> {
        sample.validate()?;

        let mut url = Url::parse(&format!("{}/lookup", self.base_url))
            .map_err(|e| crate::FingerprintError::InvalidResponse(e.to_string()))?;

        url.query_pairs_mut()
            .append_pair("client", &self.api_key)
            .append_pair("meta", LOOKUP_META)
            .append_pair("duration", &sample.duration_secs().to_string())
            .append_pair("fingerprint", &sample.fingerprint);

        Ok(url)
    }

    /// Look a sample up on AcoustID.
    ///
    /// # Example
    /// ```no_run
    /// # use chronotag_fingerprint::{AcoustidClient, FingerprintSample};
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let client = AcoustidClient::new("your-api-key")?;
    /// let sample = FingerprintSample::new("AQADtNIyRUkkZUqS", 180.0);
    /// let exchange = client.lookup(&sample).await?;
    /// let years: Vec<i32> = exchange.candidates().iter().map(|c| c.year).collect();
    /// # Ok(())
    /// # }
    /// ```
    pub async fn lookup(&self, sample: &FingerprintSample) -> Result<AcoustidExchange> {
        let url = self.lookup_url(sample)?;
        self.lookup_at(url).await
    }

    /// Perform a lookup against a URL previously built by [`Self::lookup_url`].
    ///
    /// # Errors
    /// Network failures, non-2xx statuses and unparseable bodies are errors.
    /// A well-formed `"status": "error"` body is returned as-is; its candidates are empty.
    pub async fn lookup_at(&self, url: Url) -> Result<AcoustidExchange> {
        self.wait_for_interval().await;

        trace!(target: "fingerprint", "AcoustID lookup: {}", url);

        let response = self.client.get(url.as_str()).send().await?;

        let status = response.status();
        debug!(target: "fingerprint", "AcoustID response status: {}", status);

        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(crate::FingerprintError::AcoustidError(format!(
                "HTTP {}: {}",
                status, message
            )));
        }

        let body = response.text().await?;
        trace!(target: "fingerprint", "AcoustID response: {}", body);

        let parsed: LookupResponse = serde_json::from_str(&body)?;

        if let Some(error) = parsed.error.as_ref() {
            debug!(target: "fingerprint", code = ?error.code, message = %error.message, "AcoustID reported an error");
        }

        Ok(AcoustidExchange {
            request_url: url.to_string(),
            raw_body: body,
            response: parsed,
        })
    }

    async fn wait_for_interval(&self) {
        let Some(interval) = self.request_interval else {
            return;
        };

        let mut last = self.last_request.lock().await;
        if let Some(last_instant) = *last {
            let elapsed = last_instant.elapsed();
            if elapsed < interval {
                let wait_time = interval - elapsed;
                trace!(target: "fingerprint", "rate limiting: waiting {:?}", wait_time);
                sleep(wait_time).await;
            }
        }
        *last = Some(Instant::now());
    }
}

/// Builder for AcoustID client.
#[derive(Debug)]
pub struct AcoustidClientBuilder {
    api_key: String,
    base_url: String,
    timeout: Duration,
    request_interval: Option<Duration>,
}

impl AcoustidClientBuilder {
    /// Create a new builder.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: ACOUSTID_API_BASE.to_string(),
            timeout: Duration::from_secs(30),
            request_interval: None,
        }
    }

    /// Set a custom base URL (useful for testing).
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Enforce a minimum interval between lookups. AcoustID itself does not require one.
    pub fn request_interval(mut self, interval: Duration) -> Self {
        self.request_interval = (!interval.is_zero()).then_some(interval);
        self
    }

    /// Build the AcoustID client.
    ///
    /// # Errors
    /// Returns an error if:
    /// - The base URL is not a valid URL format
    /// - The HTTP client cannot be created
    pub fn build(self) -> Result<AcoustidClient> {
        Url::parse(&self.base_url).map_err(|e| {
            crate::FingerprintError::AcoustidError(format!("Invalid base URL: {}", e))
        })?;

        let client = Client::builder()
            .timeout(self.timeout)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(AcoustidClient {
            client,
            base_url: self.base_url.trim_end_matches('/').to_string(),
            api_key: self.api_key,
            request_interval: self.request_interval,
            last_request: Arc::new(Mutex::new(None)),
        })
    }
}
