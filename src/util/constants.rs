// NetSleuth - util/constants.rs
//
// Single source of truth for all named constants, limits, and defaults.
// Sentinel display strings live here too so the presentation boundary has
// exactly one place to render absent values from.

// =============================================================================
// Application metadata
// =============================================================================

/// Application display name.
pub const APP_NAME: &str = "NetSleuth";

/// Application identifier used for config/data directories.
pub const APP_ID: &str = "NetSleuth";

/// Current application version (updated by release script).
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

// =============================================================================
// Collection
// =============================================================================

/// Program invoked to produce the capture stream.
pub const DEFAULT_COLLECTOR_PROGRAM: &str = "powershell.exe";

/// Event logs queried by the general collection pass.
pub const DEFAULT_LOG_NAMES: &[&str] = &["Application", "Security", "System", "Setup"];

/// Security event ids fetched by the targeted second collection pass.
pub const DEFAULT_SECURITY_EVENT_IDS: &[u32] =
    &[4625, 4740, 1102, 4720, 4722, 4726, 4673, 4732, 4756, 4728];

/// Per-query event cap passed to `Get-WinEvent -MaxEvents`.
pub const DEFAULT_MAX_EVENTS: u32 = 1_000;

/// Smallest accepted per-query event cap.
pub const MIN_MAX_EVENTS: u32 = 1;

/// Largest accepted per-query event cap. Beyond this a single refresh
/// becomes slow enough that auto-refresh ticks mostly get skipped.
pub const ABSOLUTE_MAX_EVENTS: u32 = 50_000;

/// Maximum number of log names accepted from config.
pub const MAX_LOG_NAMES: usize = 32;

/// Maximum number of stderr lines from the collector kept for diagnostics.
pub const MAX_STDERR_LINES: usize = 200;

/// Saved captures larger than this are read through a memory map.
pub const LARGE_CAPTURE_THRESHOLD: u64 = 16 * 1024 * 1024; // 16 MB

// =============================================================================
// Parsing limits
// =============================================================================

/// Maximum size of a single raw block in bytes. Lines past this bound are
/// dropped so a runaway record cannot grow without limit.
pub const MAX_BLOCK_BYTES: usize = 64 * 1024; // 64 KB

/// Maximum length of a raw line included in debug output.
pub const DEBUG_MAX_LINE_PREVIEW: usize = 200;

// =============================================================================
// Pagination
// =============================================================================

/// Entries shown per page.
pub const DEFAULT_PAGE_SIZE: usize = 100;

/// Smallest accepted page size.
pub const MIN_PAGE_SIZE: usize = 1;

/// Largest accepted page size.
pub const MAX_PAGE_SIZE: usize = 10_000;

// =============================================================================
// Auto-refresh
// =============================================================================

/// Default auto-refresh interval (seconds).
pub const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 60;

/// Minimum auto-refresh interval (seconds).
pub const MIN_REFRESH_INTERVAL_SECS: u64 = 5;

/// Maximum auto-refresh interval (seconds).
pub const MAX_REFRESH_INTERVAL_SECS: u64 = 3_600;

/// Interval presets offered for auto-refresh (seconds).
pub const REFRESH_INTERVAL_PRESETS_SECS: &[u64] = &[30, 60, 120, 300];

/// How often the scheduler checks its stop flag while sleeping (ms).
pub const REFRESH_CANCEL_CHECK_INTERVAL_MS: u64 = 100;

/// How often the watch loop drains refresh progress messages (ms).
pub const PROGRESS_POLL_INTERVAL_MS: u64 = 250;

// =============================================================================
// Sentinel display values
// =============================================================================

/// Rendered for an entry whose log source could not be extracted.
pub const UNKNOWN_SOURCE: &str = "Unknown";

/// Rendered for an entry whose level could not be extracted.
pub const DEFAULT_LEVEL: &str = "Information";

/// Rendered for an absent address or account.
pub const NOT_AVAILABLE: &str = "N/A";

/// Rendered in place of a loopback address.
pub const LOCALHOST: &str = "localhost";

/// Rendered in place of an absent timestamp in page lines.
pub const MISSING_TIMESTAMP: &str = "??";

// =============================================================================
// Filter sentinels
// =============================================================================

/// Source filter value meaning "every source".
pub const ALL_SOURCES_LABEL: &str = "All Logs";

/// Category filter value meaning "every entry".
pub const SHOW_ALL_LOGS_LABEL: &str = "Show All Logs";

/// Category filter value meaning "every entry with a category other than none".
pub const SHOW_ALL_ANOMALIES_LABEL: &str = "Show All Anomalies";

// =============================================================================
// Logging
// =============================================================================

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Level used by the optional file layer.
pub const FILE_LOG_LEVEL: &str = "debug";

// =============================================================================
// Export
// =============================================================================

/// Prefix of suggested export file names.
pub const EXPORT_FILE_PREFIX: &str = "network_logs";

/// Timestamp format used in suggested export file names.
pub const EXPORT_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

// =============================================================================
// Configuration
// =============================================================================

/// Configuration file name.
pub const CONFIG_FILE_NAME: &str = "config.toml";
