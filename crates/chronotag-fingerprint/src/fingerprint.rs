// SPDX-License-Identifier: GPL-3.0-or-later

use serde::{Deserialize, Serialize};

/// Acoustic fingerprint of one audio file, as produced by `fpcalc`.
///
/// The fingerprint is the compressed Chromaprint string; AcoustID treats it as opaque.
/// Samples are computed per resolution attempt and never stored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FingerprintSample {
    /// Compressed Chromaprint fingerprint (base64, usually URL-safe alphabet).
    pub fingerprint: String,
    /// Duration of the whole track in seconds.
    pub duration: f64,
}

impl FingerprintSample {
    pub fn new(fingerprint: impl Into<String>, duration: f64) -> Self {
        Self {
            fingerprint: fingerprint.into(),
            duration,
        }
    }

    /// Duration rounded to whole seconds, as AcoustID expects it.
    pub fn duration_secs(&self) -> u32 {
        self.duration.round().max(0.0) as u32
    }

    /// Validate the sample before it is sent anywhere.
    ///
    /// The fingerprint must be non-empty base64 (standard or URL-safe alphabet)
    /// and the duration a positive, finite number of seconds.
    pub fn validate(&self) -> crate::Result<()> {
        if self.fingerprint.is_empty() {
            return Err(crate::FingerprintError::InvalidFingerprint(
                "fingerprint is empty".to_string(),
            ));
        }

        if !self.duration.is_finite() || self.duration <= 0.0 {
            return Err(crate::FingerprintError::InvalidFingerprint(format!(
                "duration must be > 0, got {}",
                self.duration
            )));
        }

        let trimmed = self.fingerprint.trim_end_matches('=');

        let padding_len = self.fingerprint.len() - trimmed.len();
        if padding_len > 2 {
            return Err(crate::FingerprintError::InvalidFingerprint(
                "invalid base64 padding: too many '=' characters".to_string(),
            ));
        }

        if trimmed.contains('=') {
            return Err(crate::FingerprintError::InvalidFingerprint(
                "padding character '=' must only appear at the end".to_string(),
            ));
        }

        if !trimmed
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '/' | '-' | '_'))
        {
            return Err(crate::FingerprintError::InvalidFingerprint(
                "fingerprint contains invalid characters".to_string(),
            ));
        }

        Ok(())
    }
}
