// SPDX-License-Identifier: GPL-3.0-or-later
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use chronotag_application::{
    scan_audio_files, DiagnosticTrace, LoftyTagAccessor, RunReport, YearFillRun, YearResolver,
};
use chronotag_config::{load as load_config, AppConfig};
use chronotag_fingerprint::{AcoustidClient, Fpcalc};
use chronotag_musicbrainz::MusicBrainzClient;
use clap::Parser;
use tracing::info;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::{
    fmt, layer::SubscriberExt, reload, util::SubscriberInitExt, EnvFilter, Registry,
};

type LogFilterHandle = reload::Handle<EnvFilter, Registry>;

/// Fill in missing release years in audio file tags.
#[derive(Parser, Debug)]
#[command(name = "chronotag", version)]
struct Args {
    /// Directory to scan recursively; overrides `scan.root`
    root: Option<PathBuf>,

    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// AcoustID application key; overrides `acoustid.api_key`
    #[arg(long, env = "ACOUSTID_API_KEY")]
    api_key: Option<String>,

    /// CSV report destination
    #[arg(long)]
    report: Option<PathBuf>,

    /// Diagnostic trace file, appended to
    #[arg(long)]
    trace_log: Option<PathBuf>,

    /// Path to the fpcalc binary
    #[arg(long)]
    fpcalc: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let log_filter = init_tracing();

    let mut config = load_config(args.config.as_deref())?;
    apply_overrides(&mut config, &args);
    apply_log_level(&log_filter, &config.telemetry.log_level)?;

    let fpcalc = Fpcalc::locate(config.fingerprint.fpcalc_path.as_deref())
        .await
        .context("fpcalc is required; install Chromaprint or set fingerprint.fpcalc_path")?;
    info!(target: "cli", fpcalc = %fpcalc.program().display(), "fpcalc located");

    let api_key = require_api_key(&config)?;
    let root = require_root(&config)?;

    let acoustid = acoustid_client(&config, api_key)?;
    let musicbrainz = musicbrainz_client(&config)?;
    let tags = Arc::new(LoftyTagAccessor);

    let resolver = YearResolver::new(
        Arc::new(fpcalc),
        Arc::new(acoustid),
        Arc::new(musicbrainz),
        tags.clone(),
    );
    let run = YearFillRun::new(resolver, tags)
        .with_inter_file_pause(Duration::from_millis(config.run.inter_file_pause_ms))
        .with_trace_file(&config.report.trace_path);

    let files = scan_audio_files(&root, &config.scan.extensions)
        .with_context(|| format!("failed to scan {}", root.display()))?;
    info!(target: "cli", root = %root.display(), files = files.len(), "scan complete");

    let mut report = RunReport::new();
    let mut trace = DiagnosticTrace::new();
    let summary = run.run(&files, &mut report, &mut trace).await;

    save_outputs(&report, &mut trace, &config)?;

    info!(
        target: "cli",
        report = %config.report.csv_path.display(),
        trace = %config.report.trace_path.display(),
        "{}",
        summary
    );

    Ok(())
}

fn init_tracing() -> LogFilterHandle {
    let (subscriber, handle) = build_subscriber(std::io::stdout);
    subscriber.init();
    handle
}

/// Subscriber filtered by `RUST_LOG`, or `info` until the configured level is known.
fn build_subscriber<W>(
    make_writer: W,
) -> (impl tracing::Subscriber + Send + Sync + 'static, LogFilterHandle)
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let (filter_layer, handle) = reload::Layer::new(env_filter);
    let fmt_layer = fmt::layer()
        .with_target(true)
        .with_level(true)
        .with_writer(make_writer);

    let subscriber = tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer);
    (subscriber, handle)
}

/// `RUST_LOG` wins over `telemetry.log_level`.
fn apply_log_level(handle: &LogFilterHandle, level: &str) -> Result<()> {
    if std::env::var_os(EnvFilter::DEFAULT_ENV).is_some() {
        return Ok(());
    }
    handle
        .reload(EnvFilter::new(level))
        .context("failed to apply telemetry.log_level")
}

/// Append what is left of the trace and write the report, attempting both even if one fails.
fn save_outputs(report: &RunReport, trace: &mut DiagnosticTrace, config: &AppConfig) -> Result<()> {
    let trace_path = &config.report.trace_path;
    let csv_path = &config.report.csv_path;

    let trace_saved = trace
        .flush_to(trace_path)
        .with_context(|| format!("failed to append trace {}", trace_path.display()));
    let report_saved = report
        .write_csv(csv_path)
        .with_context(|| format!("failed to write report {}", csv_path.display()));

    trace_saved.and(report_saved)
}

fn apply_overrides(config: &mut AppConfig, args: &Args) {
    if let Some(root) = &args.root {
        config.scan.root = Some(root.clone());
    }
    if let Some(api_key) = &args.api_key {
        config.acoustid.api_key = Some(api_key.clone());
    }
    if let Some(report) = &args.report {
        config.report.csv_path = report.clone();
    }
    if let Some(trace_log) = &args.trace_log {
        config.report.trace_path = trace_log.clone();
    }
    if let Some(fpcalc) = &args.fpcalc {
        config.fingerprint.fpcalc_path = Some(fpcalc.clone());
    }
}

fn require_api_key(config: &AppConfig) -> Result<String> {
    match config.acoustid.api_key.as_deref().map(str::trim) {
        Some(key) if !key.is_empty() => Ok(key.to_string()),
        _ => bail!("an AcoustID API key is required (--api-key or acoustid.api_key)"),
    }
}

fn require_root(config: &AppConfig) -> Result<PathBuf> {
    let Some(root) = config.scan.root.as_deref() else {
        bail!("no directory to scan (pass one or set scan.root)");
    };
    if !Path::new(root).is_dir() {
        bail!("scan root {} is not a directory", root.display());
    }
    Ok(root.to_path_buf())
}

fn acoustid_client(config: &AppConfig, api_key: String) -> Result<AcoustidClient> {
    let mut builder = AcoustidClient::builder(api_key);
    if let Some(base_url) = &config.acoustid.base_url {
        builder = builder.base_url(base_url.clone());
    }
    if config.acoustid.request_interval_ms > 0 {
        builder = builder.request_interval(Duration::from_millis(config.acoustid.request_interval_ms));
    }
    builder.build().context("invalid AcoustID client settings")
}

fn musicbrainz_client(config: &AppConfig) -> Result<MusicBrainzClient> {
    let mut builder = MusicBrainzClient::builder();
    if let Some(base_url) = &config.musicbrainz.base_url {
        builder = builder.base_url(base_url.clone());
    }
    builder.build().context("invalid MusicBrainz client settings")
}
