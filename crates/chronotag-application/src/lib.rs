// SPDX-License-Identifier: GPL-3.0-or-later
pub mod lookup;
pub mod report;
pub mod resolution;
pub mod run;
pub mod scanner;
pub mod tags;
pub mod trace;

#[cfg(test)]
mod test_support;

pub use lookup::{FingerprintMatcher, Fingerprinter, RecordingSearcher};
pub use report::{search_url, ReportError, RunReport, RunSummary};
pub use resolution::{LayerOutcome, Resolution, YearResolver};
pub use run::{YearFillRun, DEFAULT_INTER_FILE_PAUSE};
pub use scanner::{scan_audio_files, ScanError};
pub use tags::{LoftyTagAccessor, TagAccessor, TagError, TagSnapshot};
pub use trace::{DiagnosticTrace, TraceEntry, TraceKind};
