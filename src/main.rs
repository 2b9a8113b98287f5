// NetSleuth - main.rs
//
// Application entry point. Handles:
// 1. CLI argument parsing
// 2. Config loading and logging initialisation (debug mode support)
// 3. Capture source selection (live collector, saved file, stdin)
// 4. One refresh cycle, then filter/page/print/export
// 5. Optional auto-refresh watch loop

use clap::{Parser, ValueEnum};
use netsleuth::app::collector::{CaptureSource, CollectorSettings, CommandSource, FileSource};
use netsleuth::app::refresh::RefreshManager;
use netsleuth::app::scheduler::AutoRefresh;
use netsleuth::app::state::AppState;
use netsleuth::core::classifier;
use netsleuth::core::export::{self, ExportFormat};
use netsleuth::core::filter::{CategoryFilter, FilterState, SourceFilter};
use netsleuth::core::model::{RefreshProgress, RefreshStatus};
use netsleuth::platform::config::{self, AppConfig, PlatformPaths};
use netsleuth::util::constants;
use netsleuth::util::error::{ConfigError, ExportError, Result};
use netsleuth::util::logging;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// NetSleuth - Windows event log anomaly triage.
///
/// Collects recent events with PowerShell (or replays a saved capture),
/// flags security and stability anomalies, and prints one filtered page.
#[derive(Parser, Debug)]
#[command(name = "NetSleuth", version, about)]
struct Cli {
    /// Saved `Format-List` capture to read instead of running the collector ("-" for stdin).
    #[arg(short = 'i', long = "input")]
    input: Option<PathBuf>,

    /// Only show events from this log (e.g. Security). "All Logs" shows every log.
    #[arg(short = 's', long = "source")]
    source: Option<String>,

    /// Category filter: an anomaly label, "all" or "anomalies".
    #[arg(short = 'a', long = "anomaly")]
    anomaly: Option<String>,

    /// Case-insensitive text search over the raw event block.
    #[arg(short = 't', long = "text")]
    text: Option<String>,

    /// Page to show (1-based). Out-of-range pages are clamped.
    #[arg(short = 'p', long = "page", default_value_t = 1)]
    page: usize,

    /// Entries per page (overrides config).
    #[arg(long = "page-size")]
    page_size: Option<usize>,

    /// Keep running and refresh on a timer.
    #[arg(short = 'w', long = "watch")]
    watch: bool,

    /// Auto-refresh interval in seconds (overrides config).
    #[arg(long = "interval")]
    interval: Option<u64>,

    /// Write the current page to this file (or into this directory with a generated name).
    #[arg(short = 'e', long = "export")]
    export: Option<PathBuf>,

    /// Export format.
    #[arg(long = "format", value_enum, default_value_t = FormatArg::Text)]
    format: FormatArg,

    /// Print the classification rules and exit.
    #[arg(long = "rules")]
    rules: bool,

    /// Config file (defaults to the platform config directory).
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,

    /// Enable debug logging (equivalent to RUST_LOG=debug).
    #[arg(short = 'd', long = "debug")]
    debug: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum FormatArg {
    Text,
    Csv,
    Json,
}

impl From<FormatArg> for ExportFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Text => ExportFormat::Text,
            FormatArg::Csv => ExportFormat::Csv,
            FormatArg::Json => ExportFormat::Json,
        }
    }
}

fn main() {
    let cli = Cli::parse();

    // Config first: it carries the log level and log file.
    let platform_paths = PlatformPaths::resolve();
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| platform_paths.config_file());
    let (app_config, config_warnings) = config::load_config(&config_path);

    logging::init(
        cli.debug,
        app_config.log_level.as_deref(),
        app_config.log_file.as_deref(),
    );

    tracing::info!(
        version = constants::APP_VERSION,
        debug = cli.debug,
        config = %config_path.display(),
        "NetSleuth starting"
    );
    for warning in &config_warnings {
        tracing::warn!(warning = %warning, "Config warning");
    }

    if cli.rules {
        print!("{}", classifier::describe_rules());
        return;
    }

    match run(&cli, &app_config) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            tracing::error!(error = %e, "NetSleuth failed");
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}

/// One refresh (or a watch loop). Returns the process exit code.
fn run(cli: &Cli, app_config: &AppConfig) -> Result<i32> {
    // Reject bad flags before any output.
    let page_size = resolve_page_size(cli.page_size, app_config.page_size)?;
    let interval = resolve_interval(cli.interval, app_config.refresh_interval_secs)?;
    let source = build_source(cli, app_config);

    let manager = RefreshManager::new(source);
    let mut state = AppState::new(page_size);
    state.filter_state = build_filter(cli);

    if !manager.request_refresh() {
        eprintln!("Error: could not start a refresh cycle");
        return Ok(1);
    }
    if !wait_for_refresh(&manager, &mut state) {
        eprintln!("Error: refresh worker exited without a result");
        return Ok(1);
    }
    present(cli, &mut state)?;

    if !cli.watch {
        let failed = matches!(
            state.summary.as_ref().map(|s| &s.status),
            Some(RefreshStatus::Failed { .. })
        );
        return Ok(if failed { 1 } else { 0 });
    }

    let _timer = AutoRefresh::start(Duration::from_secs(interval), manager.handle());
    println!("Watching; refreshing every {interval}s. Press Ctrl+C to stop.");

    let poll = Duration::from_millis(constants::PROGRESS_POLL_INTERVAL_MS);
    loop {
        if let Some(msg) = manager.wait_progress(poll) {
            if apply_progress(&mut state, msg) {
                present(cli, &mut state)?;
            }
        }
    }
}

fn build_source(cli: &Cli, app_config: &AppConfig) -> Arc<dyn CaptureSource> {
    match &cli.input {
        Some(path) if path.as_os_str() == "-" => Arc::new(FileSource::stdin()),
        Some(path) => Arc::new(FileSource::path(path.clone())),
        None => {
            let settings = CollectorSettings {
                program: app_config.collector_program.clone(),
                log_names: app_config.log_names.clone(),
                security_event_ids: app_config.security_event_ids.clone(),
                max_events: app_config.max_events,
            };
            Arc::new(CommandSource::powershell(&settings))
        }
    }
}

fn build_filter(cli: &Cli) -> FilterState {
    let category = match cli.anomaly.as_deref() {
        None => CategoryFilter::AllLogs,
        Some(label) if label.eq_ignore_ascii_case("all") => CategoryFilter::AllLogs,
        Some(label) if label.eq_ignore_ascii_case("anomalies") => CategoryFilter::AllAnomalies,
        Some(label) => CategoryFilter::from_label(label),
    };
    if let CategoryFilter::Unrecognised(label) = &category {
        tracing::warn!(label = %label, "Anomaly label matches no category; nothing will be shown");
    }

    FilterState {
        source: SourceFilter::from_label(cli.source.as_deref().unwrap_or_default()),
        category,
        text_search: cli.text.clone().unwrap_or_default(),
    }
}

/// Feed one progress message to the state. Returns `true` on completion.
fn apply_progress(state: &mut AppState, msg: RefreshProgress) -> bool {
    let completed = matches!(msg, RefreshProgress::Completed { .. });
    state.handle_progress(msg);
    if !completed {
        tracing::debug!(status = %state.status_message, "Refresh progress");
    }
    completed
}

/// Block until the in-flight cycle completes. Returns `false` if the worker
/// vanished without sending a result.
fn wait_for_refresh(manager: &RefreshManager, state: &mut AppState) -> bool {
    let poll = Duration::from_millis(constants::PROGRESS_POLL_INTERVAL_MS);
    loop {
        match manager.wait_progress(poll) {
            Some(msg) => {
                if apply_progress(state, msg) {
                    return true;
                }
            }
            None if !manager.is_busy() => {
                // The busy flag drops just before the final send.
                return manager
                    .poll_progress()
                    .into_iter()
                    .chain(manager.wait_progress(poll))
                    .fold(false, |done, msg| apply_progress(state, msg) || done);
            }
            None => {}
        }
    }
}

/// Select the requested page, print it, and export it if asked.
fn present(cli: &Cli, state: &mut AppState) -> Result<()> {
    if let Err(e) = state.go_to_page(cli.page) {
        let shown = state.go_to_nearest_page(cli.page);
        tracing::warn!(error = %e, shown, "Requested page clamped");
        eprintln!("Warning: {e}. Showing page {shown}.");
    }

    println!("{}", state.status_message);
    print!("{}", state.current_page_text());
    println!("{}", state.page_status());

    if let Some(target) = &cli.export {
        let path = export_target(target, state);
        let written = export_current_page(state, &path, cli.format.into())?;
        tracing::info!(path = %path.display(), entries = written, "Page exported");
        println!("Exported {written} entries to {}", path.display());
    }
    Ok(())
}

/// A directory target gets a generated file name.
fn export_target(target: &Path, state: &AppState) -> PathBuf {
    if target.is_dir() {
        target.join(export::default_export_file_name(
            &state.filter_state,
            state.current_page,
            &chrono::Local::now(),
        ))
    } else {
        target.to_path_buf()
    }
}

fn export_current_page(state: &AppState, path: &Path, format: ExportFormat) -> Result<usize> {
    let file = std::fs::File::create(path).map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut writer = BufWriter::new(file);
    let written = export::export_page(&state.current_page_entries(), format, &mut writer, path)?;
    writer.flush().map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(written)
}

fn resolve_page_size(flag: Option<usize>, configured: usize) -> Result<usize> {
    match flag {
        None => Ok(configured),
        Some(size) if (constants::MIN_PAGE_SIZE..=constants::MAX_PAGE_SIZE).contains(&size) => {
            Ok(size)
        }
        Some(size) => Err(ConfigError::ValueOutOfRange {
            field: "--page-size".to_string(),
            value: size.to_string(),
            expected: format!("{}-{}", constants::MIN_PAGE_SIZE, constants::MAX_PAGE_SIZE),
        }
        .into()),
    }
}

fn resolve_interval(flag: Option<u64>, configured: u64) -> Result<u64> {
    let range = constants::MIN_REFRESH_INTERVAL_SECS..=constants::MAX_REFRESH_INTERVAL_SECS;
    match flag {
        None => Ok(configured),
        Some(secs) if range.contains(&secs) => Ok(secs),
        Some(secs) => Err(ConfigError::ValueOutOfRange {
            field: "--interval".to_string(),
            value: secs.to_string(),
            expected: format!(
                "{}-{} seconds (presets: {:?})",
                range.start(),
                range.end(),
                constants::REFRESH_INTERVAL_PRESETS_SECS
            ),
        }
        .into()),
    }
}
