// SPDX-License-Identifier: GPL-3.0-or-later

//! Fingerprint generation through the Chromaprint `fpcalc` command-line tool.
//!
//! `fpcalc -json <file>` decodes the audio itself, so no decoder is linked in.
//! Install it with `apt install libchromaprint-tools`, `brew install chromaprint`
//! or from <https://acoustid.org/chromaprint>.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tokio::process::Command;
use tracing::{debug, instrument, trace};

use crate::{FingerprintError, FingerprintSample, Result};

#[cfg(windows)]
const FPCALC_PATHS: &[&str] = &[
    "fpcalc",
    r"C:\Program Files\Chromaprint\fpcalc.exe",
    r"C:\Program Files\MusicBrainz Picard\fpcalc.exe",
    r"C:\Program Files (x86)\Chromaprint\fpcalc.exe",
];

#[cfg(not(windows))]
const FPCALC_PATHS: &[&str] = &[
    "fpcalc",
    "/usr/bin/fpcalc",
    "/usr/local/bin/fpcalc",
    "/opt/homebrew/bin/fpcalc",
];

/// Handle on a working `fpcalc` executable.
#[derive(Debug, Clone)]
pub struct Fpcalc {
    program: PathBuf,
}

impl Fpcalc {
    /// Wrap a program path without probing it.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Find a working `fpcalc`, trying `preferred` first and then the usual install locations.
    ///
    /// # Errors
    /// Returns `FpcalcNotFound` listing every location tried when none of them runs.
    pub async fn locate(preferred: Option<&Path>) -> Result<Self> {
        let mut candidates: Vec<PathBuf> = preferred.map(Path::to_path_buf).into_iter().collect();
        candidates.extend(FPCALC_PATHS.iter().map(PathBuf::from));
        Self::locate_in(&candidates).await
    }

    /// Find the first candidate that answers `-version` successfully.
    pub async fn locate_in(candidates: &[PathBuf]) -> Result<Self> {
        for candidate in candidates {
            let fpcalc = Self::new(candidate);
            match fpcalc.version().await {
                Ok(version) => {
                    debug!(target: "fingerprint", program = %candidate.display(), %version, "found fpcalc");
                    return Ok(fpcalc);
                }
                Err(e) => {
                    trace!(target: "fingerprint", program = %candidate.display(), error = %e, "fpcalc candidate rejected");
                }
            }
        }

        let tried = candidates
            .iter()
            .map(|c| c.display().to_string())
            .collect::<Vec<_>>()
            .join(", ");
        Err(FingerprintError::FpcalcNotFound(tried))
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Version string reported by `fpcalc -version`.
    pub async fn version(&self) -> Result<String> {
        let output = Command::new(&self.program)
            .arg("-version")
            .output()
            .await
            .map_err(|e| FingerprintError::FpcalcFailed(format!("failed to run fpcalc: {}", e)))?;

        if !output.status.success() {
            return Err(FingerprintError::FpcalcFailed(format!(
                "fpcalc -version exited with {}",
                output.status
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    /// Compute the fingerprint and duration of an audio file.
    ///
    /// # Errors
    /// Returns `FpcalcFailed` when the tool cannot be spawned, exits unsuccessfully
    /// or prints output that does not parse into a valid sample.
    #[instrument(skip(self), fields(file = %path.display()))]
    pub async fn fingerprint(&self, path: &Path) -> Result<FingerprintSample> {
        let output = Command::new(&self.program)
            .arg("-json")
            .arg(path)
            .output()
            .await
            .map_err(|e| FingerprintError::FpcalcFailed(format!("failed to run fpcalc: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(FingerprintError::FpcalcFailed(format!(
                "exit status {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let sample = parse_fpcalc_json(&stdout)?;
        debug!(target: "fingerprint", duration = sample.duration, "fingerprint computed");
        Ok(sample)
    }
}

#[derive(Debug, Deserialize)]
struct FpcalcOutput {
    fingerprint: String,
    duration: f64,
}

/// Parse the `-json` output of `fpcalc` into a validated sample.
pub(crate) fn parse_fpcalc_json(json: &str) -> Result<FingerprintSample> {
    let parsed: FpcalcOutput = serde_json::from_str(json.trim()).map_err(|e| {
        FingerprintError::FpcalcFailed(format!("unparseable fpcalc output: {}", e))
    })?;

    let sample = FingerprintSample::new(parsed.fingerprint, parsed.duration);
    sample
        .validate()
        .map_err(|e| FingerprintError::FpcalcFailed(e.to_string()))?;
    Ok(sample)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_fpcalc_json() {
        let json = r#"{"duration": 180.5, "fingerprint": "AQADtNIyRUkkZUqS"}"#;

        let sample = parse_fpcalc_json(json).unwrap();
        assert_eq!(sample.fingerprint, "AQADtNIyRUkkZUqS");
        assert!((sample.duration - 180.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_parse_fpcalc_json_with_trailing_newline() {
        let json = "{\"duration\": 42.0, \"fingerprint\": \"AQAD-_x\"}\n";
        assert!(parse_fpcalc_json(json).is_ok());
    }

    #[test]
    fn test_parse_fpcalc_json_rejects_garbage() {
        let result = parse_fpcalc_json("ERROR: Could not open the input file");
        assert!(matches!(result, Err(FingerprintError::FpcalcFailed(_))));
    }

    #[test]
    fn test_parse_fpcalc_json_rejects_zero_duration() {
        let json = r#"{"duration": 0, "fingerprint": "AQADtNIyRUkkZUqS"}"#;
        assert!(matches!(
            parse_fpcalc_json(json),
            Err(FingerprintError::FpcalcFailed(_))
        ));
    }

    #[tokio::test]
    async fn test_locate_in_reports_every_candidate() {
        let candidates = vec![
            PathBuf::from("/nonexistent/chronotag/fpcalc"),
            PathBuf::from("/nonexistent/other/fpcalc"),
        ];

        match Fpcalc::locate_in(&candidates).await {
            Err(FingerprintError::FpcalcNotFound(tried)) => {
                assert!(tried.contains("/nonexistent/chronotag/fpcalc"));
                assert!(tried.contains("/nonexistent/other/fpcalc"));
            }
            other => panic!("expected FpcalcNotFound, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fingerprint_with_missing_program_fails() {
        let fpcalc = Fpcalc::new("/nonexistent/chronotag/fpcalc");
        let result = fpcalc.fingerprint(Path::new("song.flac")).await;
        assert!(matches!(result, Err(FingerprintError::FpcalcFailed(_))));
    }
}
