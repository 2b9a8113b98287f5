// NetSleuth - core/export.rs
//
// Rendering of entries for display, and text/CSV/JSON export of a page.
// Core layer: writes to any Write trait object.
//
// This is the presentation boundary: absent fields become their sentinel
// strings ("Unknown", "Information", "N/A", "??") here and nowhere earlier.

use crate::core::filter::FilterState;
use crate::core::model::Entry;
use crate::util::constants;
use crate::util::error::ExportError;
use chrono::{DateTime, TimeZone};
use serde::Serialize;
use std::io::Write;
use std::path::Path;

/// Output format for [`export_page`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    #[default]
    Text,
    Csv,
    Json,
}

/// One-line rendering:
/// `[timestamp] source ID:id    Lvl:level      | first message line`.
pub fn render_entry_line(entry: &Entry) -> String {
    format!(
        "[{}] {} ID:{:<5} Lvl:{:<10} | {}",
        entry.timestamp_display(),
        entry.source_display(),
        entry.event_id,
        entry.level_display(),
        entry.first_message_line()
    )
}

/// Rendered text of a page, one line per entry.
pub fn render_page_text(entries: &[&Entry]) -> String {
    let mut text = String::new();
    for entry in entries {
        text.push_str(&render_entry_line(entry));
        text.push('\n');
    }
    text
}

/// Write the page as rendered text. Returns the number of entries written.
pub fn export_text<W: Write>(
    entries: &[&Entry],
    mut writer: W,
    export_path: &Path,
) -> Result<usize, ExportError> {
    let io_err = |e| ExportError::Io {
        path: export_path.to_path_buf(),
        source: e,
    };
    writer
        .write_all(render_page_text(entries).as_bytes())
        .map_err(io_err)?;
    writer.flush().map_err(io_err)?;
    Ok(entries.len())
}

/// Export entries to CSV.
///
/// Writes: timestamp, log_name, event_id, level, anomaly, source_address, account, message
pub fn export_csv<W: Write>(
    entries: &[&Entry],
    writer: W,
    export_path: &Path,
) -> Result<usize, ExportError> {
    let csv_err = |e| ExportError::Csv {
        path: export_path.to_path_buf(),
        source: e,
    };
    let mut csv_writer = csv::Writer::from_writer(writer);

    csv_writer
        .write_record([
            "timestamp",
            "log_name",
            "event_id",
            "level",
            "anomaly",
            "source_address",
            "account",
            "message",
        ])
        .map_err(csv_err)?;

    for entry in entries {
        let event_id = entry.event_id.to_string();
        csv_writer
            .write_record([
                entry.timestamp.as_deref().unwrap_or(""),
                entry.source_display(),
                event_id.as_str(),
                entry.level_display(),
                entry.anomaly.label(),
                entry.address_display(),
                entry.account_display(),
                entry.message.as_str(),
            ])
            .map_err(csv_err)?;
    }

    csv_writer.flush().map_err(|e| ExportError::Io {
        path: export_path.to_path_buf(),
        source: e,
    })?;

    Ok(entries.len())
}

/// Flattened, display-ready view of an entry for JSON export.
#[derive(Debug, Serialize)]
struct ExportRecord<'a> {
    timestamp: Option<&'a str>,
    log_name: &'a str,
    event_id: i64,
    level: &'a str,
    anomaly: &'a str,
    source_address: &'a str,
    account: &'a str,
    message: &'a str,
}

impl<'a> From<&'a Entry> for ExportRecord<'a> {
    fn from(entry: &'a Entry) -> Self {
        Self {
            timestamp: entry.timestamp.as_deref(),
            log_name: entry.source_display(),
            event_id: entry.event_id.code(),
            level: entry.level_display(),
            anomaly: entry.anomaly.label(),
            source_address: entry.address_display(),
            account: entry.account_display(),
            message: &entry.message,
        }
    }
}

/// Export entries to JSON (array of objects).
pub fn export_json<W: Write>(
    entries: &[&Entry],
    writer: W,
    export_path: &Path,
) -> Result<usize, ExportError> {
    let records: Vec<ExportRecord<'_>> = entries.iter().map(|e| ExportRecord::from(*e)).collect();
    serde_json::to_writer_pretty(writer, &records).map_err(|e| ExportError::Json {
        path: export_path.to_path_buf(),
        source: e,
    })?;
    Ok(records.len())
}

/// Dispatch on `format`.
pub fn export_page<W: Write>(
    entries: &[&Entry],
    format: ExportFormat,
    writer: W,
    export_path: &Path,
) -> Result<usize, ExportError> {
    match format {
        ExportFormat::Text => export_text(entries, writer, export_path),
        ExportFormat::Csv => export_csv(entries, writer, export_path),
        ExportFormat::Json => export_json(entries, writer, export_path),
    }
}

/// Suggested file name for exporting `page` under `filter`:
/// `network_logs_<source>_<category>_Page<n>_<YYYYmmdd_HHMMSS>.txt`.
pub fn default_export_file_name<Tz: TimeZone>(
    filter: &FilterState,
    page: usize,
    now: &DateTime<Tz>,
) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!(
        "{}_{}_{}_Page{}_{}.txt",
        constants::EXPORT_FILE_PREFIX,
        file_name_part(filter.source.label()),
        file_name_part(filter.category.label()),
        page,
        now.format(constants::EXPORT_TIMESTAMP_FORMAT)
    )
}

/// Spaces become underscores; anything not safe in a file name is dropped.
fn file_name_part(label: &str) -> String {
    label
        .chars()
        .filter_map(|c| match c {
            ' ' => Some('_'),
            c if c.is_ascii_alphanumeric() || c == '_' || c == '-' => Some(c),
            _ => None,
        })
        .collect()
}
