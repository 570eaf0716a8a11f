// SPDX-License-Identifier: GPL-3.0-or-later

//! Diagnostic trace of a run: every request URL, raw response and decision.
//!
//! Entries accumulate in memory; the runner appends them to the trace file after every file.

use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceKind {
    Request,
    Response,
    Decision,
    Failure,
}

impl std::fmt::Display for TraceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Request => write!(f, "request"),
            Self::Response => write!(f, "response"),
            Self::Decision => write!(f, "decision"),
            Self::Failure => write!(f, "failure"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceEntry {
    pub at: DateTime<Utc>,
    pub kind: TraceKind,
    pub message: String,
}

impl std::fmt::Display for TraceEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} [{}] {}",
            self.at.to_rfc3339_opts(SecondsFormat::Millis, true),
            self.kind,
            self.message
        )
    }
}

#[derive(Debug, Default)]
pub struct DiagnosticTrace {
    entries: Vec<TraceEntry>,
}

impl DiagnosticTrace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, kind: TraceKind, message: impl Into<String>) {
        self.entries.push(TraceEntry {
            at: Utc::now(),
            kind,
            message: message.into(),
        });
    }

    pub fn request(&mut self, message: impl Into<String>) {
        self.record(TraceKind::Request, message);
    }

    pub fn response(&mut self, message: impl Into<String>) {
        self.record(TraceKind::Response, message);
    }

    pub fn decision(&mut self, message: impl Into<String>) {
        self.record(TraceKind::Decision, message);
    }

    pub fn failure(&mut self, message: impl Into<String>) {
        self.record(TraceKind::Failure, message);
    }

    pub fn entries(&self) -> &[TraceEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Append every entry to `path`, one line each, creating the file if needed.
    pub fn append_to(&self, path: &Path) -> std::io::Result<()> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let mut writer = BufWriter::new(file);
        for entry in &self.entries {
            // Raw responses can span lines; keep one entry per line.
            let line = entry.to_string().replace(['\r', '\n'], " ");
            writeln!(writer, "{}", line)?;
        }
        writer.flush()
    }

    /// Append every entry to `path`, then drop them from memory.
    ///
    /// On error nothing is dropped, so a later append writes the same entries again.
    pub fn flush_to(&mut self, path: &Path) -> std::io::Result<()> {
        self.append_to(path)?;
        self.entries.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_entries_in_order() {
        let mut trace = DiagnosticTrace::new();
        trace.request("GET https://example.org/lookup");
        trace.response("{\"status\":\"ok\"}");
        trace.decision("earliest year 1999");

        let kinds: Vec<TraceKind> = trace.entries().iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![TraceKind::Request, TraceKind::Response, TraceKind::Decision]
        );
    }

    #[test]
    fn append_keeps_existing_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trace.log");
        std::fs::write(&path, "previous run\n").unwrap();

        let mut trace = DiagnosticTrace::new();
        trace.response("{\n  \"status\": \"ok\"\n}");
        trace.failure("fpcalc failed");
        trace.append_to(&path).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "previous run");
        assert!(lines[1].contains("[response]"));
        assert!(lines[1].contains("\"status\": \"ok\""));
        assert!(lines[2].ends_with("[failure] fpcalc failed"));
    }

    #[test]
    fn flush_empties_the_trace_only_on_success() {
        let dir = tempfile::tempdir().unwrap();
        let mut trace = DiagnosticTrace::new();
        trace.decision("a.mp3: status Updated year 1999");

        let unwritable = dir.path().join("missing").join("trace.log");
        assert!(trace.flush_to(&unwritable).is_err());
        assert_eq!(trace.entries().len(), 1);

        let path = dir.path().join("trace.log");
        trace.flush_to(&path).unwrap();
        assert!(trace.is_empty());
        assert_eq!(std::fs::read_to_string(&path).unwrap().lines().count(), 1);
    }
}
