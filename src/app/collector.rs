// NetSleuth - app/collector.rs
//
// Obtains the raw capture stream for a refresh cycle.
//
// Two sources implement `CaptureSource`:
//   - `CommandSource` runs an external program (by default PowerShell with a
//     pair of Get-WinEvent queries) and reads its stdout as lossy UTF-8 lines.
//     Stderr is drained on a helper thread and logged so a chatty collector
//     cannot block on a full pipe.
//   - `FileSource` replays a saved capture from disk or stdin. Saved captures
//     from Windows PowerShell are often UTF-16LE with a BOM; both encodings
//     are accepted.
//
// Transient read errors on saved captures are retried with a short backoff.

use crate::core::pipeline::Capture;
use crate::util::constants;
use crate::util::error::CollectorError;
use std::io::{self, BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::Duration;

/// Retry limits for transient I/O errors.
const MAX_RETRIES: u32 = 3;
const RETRY_DELAYS_MS: [u64; 3] = [50, 100, 200];

/// Properties requested from every event.
const SELECT_FIELDS: &str =
    "Select-Object TimeCreated, LogName, Id, LevelDisplayName, Message | Format-List";

/// Something that can produce one capture per refresh cycle.
pub trait CaptureSource: Send + Sync {
    /// Short name for logs and status messages.
    fn name(&self) -> &str;

    /// Run once and return the captured lines plus exit status.
    fn capture(&self) -> Result<Capture, CollectorError>;
}

// =============================================================================
// Command-backed source
// =============================================================================

/// What the PowerShell collector queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectorSettings {
    pub program: String,
    pub log_names: Vec<String>,
    pub security_event_ids: Vec<u32>,
    pub max_events: u32,
}

impl Default for CollectorSettings {
    fn default() -> Self {
        Self {
            program: constants::DEFAULT_COLLECTOR_PROGRAM.to_string(),
            log_names: constants::DEFAULT_LOG_NAMES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            security_event_ids: constants::DEFAULT_SECURITY_EVENT_IDS.to_vec(),
            max_events: constants::DEFAULT_MAX_EVENTS,
        }
    }
}

/// PowerShell script for `settings`: every configured log, then the
/// Security log narrowed to the watched ids.
pub fn build_query_script(settings: &CollectorSettings) -> String {
    let logs: Vec<String> = settings
        .log_names
        .iter()
        .map(|name| format!("'{}'", name.replace('\'', "''")))
        .collect();
    let max = settings.max_events;

    let mut script = format!(
        "Get-WinEvent -FilterHashtable @{{LogName=(@({}))}} -MaxEvents {max} | {SELECT_FIELDS}",
        logs.join(",")
    );

    if !settings.security_event_ids.is_empty() {
        let ids: Vec<String> = settings
            .security_event_ids
            .iter()
            .map(u32::to_string)
            .collect();
        script.push_str(&format!(
            " ; Get-WinEvent -FilterHashtable @{{LogName='Security'; ID=@({})}} -MaxEvents {max} | {SELECT_FIELDS}",
            ids.join(", ")
        ));
    }
    script
}

/// Runs an external program and captures its stdout.
#[derive(Debug, Clone)]
pub struct CommandSource {
    program: String,
    args: Vec<String>,
}

impl CommandSource {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// `<program> -NoProfile -Command <Get-WinEvent script>`.
    pub fn powershell(settings: &CollectorSettings) -> Self {
        Self::new(
            settings.program.clone(),
            vec![
                "-NoProfile".to_string(),
                "-Command".to_string(),
                build_query_script(settings),
            ],
        )
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }
}

impl CaptureSource for CommandSource {
    fn name(&self) -> &str {
        &self.program
    }

    fn capture(&self) -> Result<Capture, CollectorError> {
        tracing::debug!(program = %self.program, args = self.args.len(), "Starting collector");

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| CollectorError::Spawn {
                program: self.program.clone(),
                source: e,
            })?;

        let stderr_thread = child
            .stderr
            .take()
            .map(|stderr| std::thread::spawn(move || drain_stderr(stderr)));

        let read_result = match child.stdout.take() {
            Some(stdout) => read_lines_lossy(BufReader::new(stdout)),
            None => Ok(Vec::new()),
        };

        let lines = match read_result {
            Ok(lines) => lines,
            Err(e) => {
                // Do not leave a zombie behind.
                let _ = child.kill();
                let _ = child.wait();
                return Err(CollectorError::Read {
                    program: self.program.clone(),
                    source: e,
                });
            }
        };

        let status = child.wait().map_err(|e| CollectorError::Wait {
            program: self.program.clone(),
            source: e,
        })?;

        if let Some(handle) = stderr_thread {
            let stderr_lines = handle.join().unwrap_or_default();
            for line in &stderr_lines {
                tracing::debug!(program = %self.program, line = %line, "Collector stderr");
            }
            if !stderr_lines.is_empty() {
                tracing::warn!(
                    program = %self.program,
                    lines = stderr_lines.len(),
                    "Collector wrote to stderr"
                );
            }
        }

        tracing::info!(
            program = %self.program,
            lines = lines.len(),
            exit_code = ?status.code(),
            "Collector finished"
        );

        Ok(Capture {
            program: self.program.clone(),
            lines,
            exit_code: status.code(),
        })
    }
}

/// Read all lines, decoding each as lossy UTF-8 and stripping `\r\n`.
fn read_lines_lossy<R: BufRead>(mut reader: R) -> io::Result<Vec<String>> {
    let mut lines = Vec::new();
    let mut buf = Vec::new();
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        while matches!(buf.last(), Some(b'\n' | b'\r')) {
            buf.pop();
        }
        lines.push(String::from_utf8_lossy(&buf).into_owned());
    }
    Ok(lines)
}

/// Collect up to `MAX_STDERR_LINES` stderr lines; the rest are read and dropped.
fn drain_stderr<R: Read>(stderr: R) -> Vec<String> {
    let mut kept = Vec::new();
    match read_lines_lossy(BufReader::new(stderr)) {
        Ok(lines) => {
            kept.extend(
                lines
                    .into_iter()
                    .filter(|l| !l.trim().is_empty())
                    .take(constants::MAX_STDERR_LINES),
            );
        }
        Err(e) => tracing::debug!(error = %e, "Failed reading collector stderr"),
    }
    kept
}

// =============================================================================
// File-backed source
// =============================================================================

/// Replays a saved capture. `None` reads stdin.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: Option<PathBuf>,
    label: String,
}

impl FileSource {
    pub fn path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let label = path.display().to_string();
        Self {
            path: Some(path),
            label,
        }
    }

    pub fn stdin() -> Self {
        Self {
            path: None,
            label: "<stdin>".to_string(),
        }
    }

    /// Decoded capture text and its size on the wire in bytes.
    fn read_text(&self) -> Result<(String, usize), CollectorError> {
        match &self.path {
            Some(path) => read_capture_file(path).map_err(|e| CollectorError::Input {
                path: path.clone(),
                source: e,
            }),
            None => {
                let mut bytes = Vec::new();
                io::stdin()
                    .lock()
                    .read_to_end(&mut bytes)
                    .map_err(|e| CollectorError::Input {
                        path: PathBuf::from("-"),
                        source: e,
                    })?;
                Ok((decode_capture(&bytes), bytes.len()))
            }
        }
    }
}

impl CaptureSource for FileSource {
    fn name(&self) -> &str {
        &self.label
    }

    fn capture(&self) -> Result<Capture, CollectorError> {
        let (text, bytes) = self.read_text()?;
        let lines: Vec<String> = text.lines().map(str::to_string).collect();

        tracing::info!(source = %self.label, bytes, lines = lines.len(), "Capture loaded");

        Ok(Capture {
            program: self.label.clone(),
            lines,
            exit_code: Some(0),
        })
    }
}

/// Decode capture bytes: UTF-16LE/BE with BOM, UTF-8 with or without BOM,
/// anything else as lossy UTF-8.
pub fn decode_capture(bytes: &[u8]) -> String {
    match bytes {
        [0xFF, 0xFE, rest @ ..] => decode_utf16(rest, u16::from_le_bytes),
        [0xFE, 0xFF, rest @ ..] => decode_utf16(rest, u16::from_be_bytes),
        [0xEF, 0xBB, 0xBF, rest @ ..] => String::from_utf8_lossy(rest).into_owned(),
        _ => String::from_utf8_lossy(bytes).into_owned(),
    }
}

fn decode_utf16(bytes: &[u8], to_unit: fn([u8; 2]) -> u16) -> String {
    let units = bytes.chunks_exact(2).map(|pair| to_unit([pair[0], pair[1]]));
    char::decode_utf16(units)
        .map(|r| r.unwrap_or(char::REPLACEMENT_CHARACTER))
        .collect()
}

/// Read and decode a capture file, through a memory map above the
/// large-file threshold. Returns the text and the file size.
fn read_capture_file(path: &Path) -> io::Result<(String, usize)> {
    let len = std::fs::metadata(path)?.len();
    if len > constants::LARGE_CAPTURE_THRESHOLD {
        read_large_file(path)
    } else {
        let bytes = read_small_file_with_retry(path)?;
        Ok((decode_capture(&bytes), bytes.len()))
    }
}

/// Decode straight from a `memmap2` mapping; the raw bytes are never copied
/// into a heap buffer, only the decoded text is.
fn read_large_file(path: &Path) -> io::Result<(String, usize)> {
    let file = std::fs::File::open(path)?;
    // SAFETY: the map is read-only and dropped before returning. A capture
    // being rewritten concurrently could yield torn content, which decoding
    // tolerates.
    let mmap = unsafe { memmap2::Mmap::map(&file)? };
    tracing::debug!(file = %path.display(), bytes = mmap.len(), "Capture memory-mapped");
    Ok((decode_capture(&mmap), mmap.len()))
}

/// Read a small file with transient-error retries.
fn read_small_file_with_retry(path: &Path) -> io::Result<Vec<u8>> {
    let mut last_err: Option<io::Error> = None;

    for attempt in 0..MAX_RETRIES {
        match std::fs::read(path) {
            Ok(content) => return Ok(content),
            Err(e) if is_transient_error(&e) => {
                tracing::debug!(
                    file = %path.display(),
                    attempt = attempt + 1,
                    error = %e,
                    "Transient I/O error, retrying"
                );
                std::thread::sleep(Duration::from_millis(RETRY_DELAYS_MS[attempt as usize]));
                last_err = Some(e);
            }
            Err(e) => return Err(e),
        }
    }

    Err(last_err.unwrap_or_else(|| io::Error::other("Unknown read error")))
}

/// Returns true for transient I/O errors that are worth retrying.
fn is_transient_error(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted | io::ErrorKind::TimedOut
    )
}
