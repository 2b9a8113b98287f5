// NetSleuth - core/pipeline.rs
//
// One refresh cycle's processing: split -> parse -> dedup -> sort -> classify,
// plus the rules that turn collector failures and empty captures into a
// renderable snapshot.
//
// Nothing here returns an error. Whatever happened upstream, the caller gets
// a list of entries and a status summary.

use crate::core::classifier;
use crate::core::dedup;
use crate::core::model::{Entry, RefreshOutcome, RefreshStatus, RefreshSummary};
use crate::core::parser;
use crate::core::sort;
use crate::core::splitter::{split_blocks, SplitStats};
use crate::util::error::CollectorError;
use std::sync::Arc;
use std::time::Instant;

/// Raw output of one collector run.
#[derive(Debug, Clone, Default)]
pub struct Capture {
    /// Name of the collector, used in status messages.
    pub program: String,
    /// Stdout, one element per line.
    pub lines: Vec<String>,
    /// `None` when the process ended without an exit code (killed by a signal).
    pub exit_code: Option<i32>,
}

impl Capture {
    pub fn succeeded(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Result of running the processing stages over a line stream.
#[derive(Debug, Default)]
pub struct Processed {
    /// Unique entries, newest first, classified.
    pub entries: Vec<Entry>,
    pub split: SplitStats,
    /// Entries before deduplication.
    pub parsed: usize,
}

impl Processed {
    pub fn real_count(&self) -> usize {
        self.entries.iter().filter(|e| e.is_real_event()).count()
    }

    /// Real entries with a category other than none.
    pub fn anomaly_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| e.is_real_event() && e.anomaly.is_anomaly())
            .count()
    }
}

/// Run every processing stage over `lines`.
pub fn process_lines<L, S>(lines: L) -> Processed
where
    L: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut splitter = split_blocks(lines);
    let parsed: Vec<Entry> = splitter.by_ref().map(|b| parser::parse_block(&b)).collect();
    let split = splitter.stats();
    let parsed_count = parsed.len();

    let mut entries = dedup::dedupe(parsed);
    sort::sort_newest_first(&mut entries);
    classifier::classify(&mut entries);

    tracing::debug!(
        lines = split.lines_read,
        blocks = split.blocks_emitted,
        discarded = split.blocks_discarded,
        unique = entries.len(),
        "Capture processed"
    );

    Processed {
        entries,
        split,
        parsed: parsed_count,
    }
}

/// Turn a collector result into the snapshot published to the presentation
/// side.
///
/// - Collector could not run: one synthetic error entry, `Failed`.
/// - Non-zero exit and no real events: one synthetic error entry, `Failed`.
/// - Non-zero exit with real events: events kept, warning recorded.
/// - Clean exit and no real events: one synthetic informational entry, `NoEvents`.
pub fn build_outcome(capture: Result<Capture, CollectorError>, started: Instant) -> RefreshOutcome {
    let mut warnings = Vec::new();

    let (entries, status) = match capture {
        Err(e) => {
            let message = format!("Error running collector: {e}");
            tracing::error!(error = %e, "Collector failed");
            (vec![Entry::synthetic(&message)], RefreshStatus::Failed { message })
        }
        Ok(capture) => {
            let processed = process_lines(&capture.lines);
            let total = processed.real_count();
            let anomalies = processed.anomaly_count();
            let mut entries = processed.entries;

            match (capture.succeeded(), total) {
                (false, 0) => {
                    let message = failure_message(&capture);
                    tracing::warn!(exit_code = ?capture.exit_code, "Collector failed with no events");
                    entries.push(Entry::synthetic(&message));
                    (entries, RefreshStatus::Failed { message })
                }
                (true, 0) => {
                    entries.push(Entry::synthetic(NO_EVENTS_MESSAGE));
                    (entries, RefreshStatus::NoEvents)
                }
                (succeeded, _) => {
                    if !succeeded {
                        let warning = format!(
                            "'{}' exited with {}; results may be incomplete.",
                            capture.program,
                            describe_exit(capture.exit_code)
                        );
                        tracing::warn!("{}", warning);
                        warnings.push(warning);
                    }
                    (entries, RefreshStatus::Fetched { total, anomalies })
                }
            }
        }
    };

    let summary = RefreshSummary {
        status,
        warnings,
        elapsed: started.elapsed(),
    };

    tracing::info!(
        entries = entries.len(),
        status = %summary.status_line(),
        elapsed_ms = summary.elapsed.as_millis() as u64,
        "Refresh processed"
    );

    RefreshOutcome {
        entries: Arc::new(entries),
        summary,
    }
}

/// Informational entry text for a clean but empty capture.
pub const NO_EVENTS_MESSAGE: &str = "No relevant events found in the specified logs.";

fn failure_message(capture: &Capture) -> String {
    format!(
        "'{}' failed ({}). Run as Administrator? Check the collector command.",
        capture.program,
        describe_exit(capture.exit_code)
    )
}

fn describe_exit(code: Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {code}"),
        None => "no exit code".to_string(),
    }
}
