// SPDX-License-Identifier: GPL-3.0-or-later
use std::path::{Path, PathBuf};

use anyhow::Result;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AcoustidConfig {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    /// Optional spacing between fingerprint lookups; 0 disables it.
    pub request_interval_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct MusicBrainzConfig {
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FingerprintConfig {
    /// Explicit fpcalc location, tried before the usual install paths.
    pub fpcalc_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    pub root: Option<PathBuf>,
    pub extensions: Vec<String>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            root: None,
            extensions: ["mp3", "flac", "m4a", "ogg", "opus", "wav", "aiff"]
                .iter()
                .map(|ext| ext.to_string())
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    pub csv_path: PathBuf,
    pub trace_path: PathBuf,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            csv_path: PathBuf::from("chronotag-report.csv"),
            trace_path: PathBuf::from("chronotag-trace.log"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    pub inter_file_pause_ms: u64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            inter_file_pause_ms: 500,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    pub log_level: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    pub acoustid: AcoustidConfig,
    pub musicbrainz: MusicBrainzConfig,
    pub fingerprint: FingerprintConfig,
    pub scan: ScanConfig,
    pub report: ReportConfig,
    pub run: RunConfig,
    pub telemetry: TelemetryConfig,
}

/// Load configuration from defaults, optional TOML file, and environment overrides (prefix: CHRONOTAG_).
pub fn load(config_path: Option<&Path>) -> Result<AppConfig> {
    let config: AppConfig = figment(config_path).extract()?;
    info!(target: "config", "configuration loaded");
    Ok(config)
}

fn figment(config_path: Option<&Path>) -> Figment {
    let mut figment = Figment::from(Serialized::defaults(AppConfig::default()));

    if let Some(path) = config_path {
        figment = figment.merge(Toml::file(path));
    }

    figment.merge(Env::prefixed("CHRONOTAG_").split("__"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_documented_values() {
        let config = AppConfig::default();
        assert_eq!(config.run.inter_file_pause_ms, 500);
        assert_eq!(config.acoustid.request_interval_ms, 0);
        assert!(config.acoustid.api_key.is_none());
        assert!(config.scan.extensions.iter().any(|ext| ext == "flac"));
        assert_eq!(config.telemetry.log_level, "info");
    }

    #[test]
    fn toml_file_overrides_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[acoustid]
api_key = "from-file"

[scan]
root = "/srv/music"
extensions = ["mp3"]

[run]
inter_file_pause_ms = 0
"#
        )
        .unwrap();

        let config: AppConfig = figment(Some(file.path())).extract().unwrap();
        assert_eq!(config.acoustid.api_key.as_deref(), Some("from-file"));
        assert_eq!(config.scan.root, Some(PathBuf::from("/srv/music")));
        assert_eq!(config.scan.extensions, vec!["mp3".to_string()]);
        assert_eq!(config.run.inter_file_pause_ms, 0);
        assert_eq!(config.report.csv_path, PathBuf::from("chronotag-report.csv"));
    }
}
