// SPDX-License-Identifier: GPL-3.0-or-later

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, warn};
use walkdir::WalkDir;

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("scan root does not exist: {0}")]
    RootNotFound(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Recursively list audio files under `root` whose extension is in `extensions`.
///
/// Extensions match case-insensitively and without the leading dot. Paths are
/// absolute and sorted; unreadable entries are logged and skipped.
pub fn scan_audio_files(root: &Path, extensions: &[String]) -> Result<Vec<PathBuf>, ScanError> {
    if !root.exists() {
        return Err(ScanError::RootNotFound(root.display().to_string()));
    }
    let root = std::fs::canonicalize(root)?;

    let wanted: Vec<String> = extensions
        .iter()
        .map(|ext| ext.trim_start_matches('.').to_ascii_lowercase())
        .collect();

    let mut files = Vec::new();
    for entry in WalkDir::new(&root).follow_links(true) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(error) => {
                warn!(target: "run", %error, "skipping unreadable entry");
                continue;
            }
        };

        if entry.file_type().is_file() && has_wanted_extension(entry.path(), &wanted) {
            files.push(entry.into_path());
        }
    }

    files.sort();
    debug!(target: "run", root = %root.display(), count = files.len(), "scan complete");
    Ok(files)
}

fn has_wanted_extension(path: &Path, wanted: &[String]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| wanted.iter().any(|w| w.eq_ignore_ascii_case(ext)))
        .unwrap_or(false)
}
