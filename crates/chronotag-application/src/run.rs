// SPDX-License-Identifier: GPL-3.0-or-later

//! Sequential run over a list of audio files.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chronotag_domain::MediaFile;
use tracing::{debug, info, warn};

use crate::report::{RunReport, RunSummary};
use crate::resolution::{Resolution, YearResolver};
use crate::tags::{TagAccessor, TagSnapshot};
use crate::trace::DiagnosticTrace;

/// Default pause between processed files.
pub const DEFAULT_INTER_FILE_PAUSE: Duration = Duration::from_millis(500);

pub struct YearFillRun {
    resolver: YearResolver,
    tags: Arc<dyn TagAccessor>,
    inter_file_pause: Duration,
    trace_file: Option<PathBuf>,
}

impl YearFillRun {
    pub fn new(resolver: YearResolver, tags: Arc<dyn TagAccessor>) -> Self {
        Self {
            resolver,
            tags,
            inter_file_pause: DEFAULT_INTER_FILE_PAUSE,
            trace_file: None,
        }
    }

    /// Append the trace to `path` after every file instead of leaving it all in memory.
    pub fn with_trace_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.trace_file = Some(path.into());
        self
    }

    pub fn with_inter_file_pause(mut self, pause: Duration) -> Self {
        self.inter_file_pause = pause;
        self
    }

    /// Resolve every file in order. Files that already carry a year are counted but not reported.
    pub async fn run(
        &self,
        files: &[PathBuf],
        report: &mut RunReport,
        trace: &mut DiagnosticTrace,
    ) -> RunSummary {
        info!(target: "run", files = files.len(), "starting year fill run");
        let mut skipped = 0;

        for (index, path) in files.iter().enumerate() {
            debug!(target: "run", index, path = %path.display(), "processing file");
            let media = self.media_file(path.clone(), trace);

            let resolution = self.resolver.resolve(&media, trace).await;
            if let Some(trace_file) = &self.trace_file {
                flush_trace(trace, trace_file);
            }

            match resolution {
                Resolution::Skipped => skipped += 1,
                Resolution::Resolved(outcome) => {
                    report.push(outcome);
                    if !self.inter_file_pause.is_zero() {
                        tokio::time::sleep(self.inter_file_pause).await;
                    }
                }
            }
        }

        let summary = RunSummary::new(report, skipped);
        info!(target: "run", %summary, "year fill run finished");
        summary
    }

    fn media_file(&self, path: PathBuf, trace: &mut DiagnosticTrace) -> MediaFile {
        let snapshot = match self.tags.read(&path) {
            Ok(snapshot) => snapshot,
            Err(error) => {
                warn!(target: "run", path = %path.display(), %error, "could not read tags");
                trace.failure(format!("{}: tag read failed: {}", path.display(), error));
                TagSnapshot::default()
            }
        };

        MediaFile::new(path, snapshot.artist, snapshot.title, snapshot.year)
    }
}

/// Entries that cannot be written stay in memory for the next attempt.
fn flush_trace(trace: &mut DiagnosticTrace, path: &Path) {
    if trace.is_empty() {
        return;
    }
    if let Err(error) = trace.flush_to(path) {
        warn!(target: "run", path = %path.display(), %error, "could not append to trace file");
    }
}
