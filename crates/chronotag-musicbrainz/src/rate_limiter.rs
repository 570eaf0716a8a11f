// SPDX-License-Identifier: GPL-3.0-or-later

use std::future::Future;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::time::{sleep, Duration};

/// Minimum spacing MusicBrainz requires between requests from one client.
pub const MUSICBRAINZ_MIN_INTERVAL: Duration = Duration::from_secs(1);

/// Cool-down rate limiter for MusicBrainz API calls.
///
/// Each throttled call holds a gate for its own duration plus `min_interval`
/// afterwards, whether it succeeded or not. Calls from clones of the same limiter
/// are serialised through that gate.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    gate: Arc<Mutex<()>>,
    min_interval: Duration,
}

impl RateLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            gate: Arc::new(Mutex::new(())),
            min_interval,
        }
    }

    /// Rate limiter with the MusicBrainz interval (1 request per second).
    pub fn musicbrainz_default() -> Self {
        Self::new(MUSICBRAINZ_MIN_INTERVAL)
    }

    /// Run `request`, then pause for the minimum interval before handing back its output.
    pub async fn throttle<F, T>(&self, request: F) -> T
    where
        F: Future<Output = T>,
    {
        let _gate = self.gate.lock().await;
        let output = request.await;

        tracing::trace!(
            target: "musicbrainz",
            "rate limiting: cooling down for {:?}",
            self.min_interval
        );
        sleep(self.min_interval).await;

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Instant;

    #[tokio::test]
    async fn test_throttle_pauses_after_request() {
        let limiter = RateLimiter::new(Duration::from_millis(100));
        let start = Instant::now();

        let value = limiter.throttle(async { 7 }).await;

        assert_eq!(value, 7);
        assert!(
            start.elapsed() >= Duration::from_millis(100),
            "expected >= 100ms, got {:?}",
            start.elapsed()
        );
    }

    #[tokio::test]
    async fn test_throttle_pauses_after_failure_too() {
        let limiter = RateLimiter::new(Duration::from_millis(80));
        let start = Instant::now();

        let result: std::result::Result<(), &str> = limiter.throttle(async { Err("boom") }).await;

        assert!(result.is_err());
        assert!(start.elapsed() >= Duration::from_millis(80));
    }

    #[tokio::test]
    async fn test_consecutive_requests_are_spaced() {
        let limiter = RateLimiter::new(Duration::from_millis(50));
        let mut started = Vec::new();

        for _ in 0..3 {
            limiter
                .throttle(async {
                    started.push(Instant::now());
                })
                .await;
        }

        for pair in started.windows(2) {
            let gap = pair[1] - pair[0];
            assert!(gap >= Duration::from_millis(50), "gap was {:?}", gap);
        }
    }

    #[test]
    fn test_musicbrainz_default_interval() {
        let limiter = RateLimiter::musicbrainz_default();
        assert_eq!(limiter.min_interval, Duration::from_secs(1));
    }
}
