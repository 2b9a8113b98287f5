// NetSleuth - util/error.rs
//
// Typed error hierarchy with context-preserving error chains.
// All errors preserve the causal chain for diagnostic logging.
//
// Nothing in the event pipeline itself returns these: malformed blocks and
// collector failures become sentinel values or synthetic entries. These types
// cover the edges around it (spawning, reading input, config, export, paging).

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Top-level error type for all NetSleuth operations.
/// Errors are categorised by the subsystem that produced them.
#[derive(Debug)]
pub enum NetSleuthError {
    /// Capture collection failed.
    Collector(CollectorError),

    /// Export operation failed.
    Export(ExportError),

    /// Configuration loading or validation failed.
    Config(ConfigError),

    /// A page outside the valid range was requested.
    Page(PageError),
}

impl fmt::Display for NetSleuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Collector(e) => write!(f, "Collector error: {e}"),
            Self::Export(e) => write!(f, "Export error: {e}"),
            Self::Config(e) => write!(f, "Configuration error: {e}"),
            Self::Page(e) => write!(f, "Paging error: {e}"),
        }
    }
}

impl std::error::Error for NetSleuthError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Collector(e) => Some(e),
            Self::Export(e) => Some(e),
            Self::Config(e) => Some(e),
            Self::Page(e) => Some(e),
        }
    }
}

// ---------------------------------------------------------------------------
// Collector errors
// ---------------------------------------------------------------------------

/// Errors raised while obtaining the raw capture stream.
#[derive(Debug)]
pub enum CollectorError {
    /// The collector process could not be started.
    Spawn { program: String, source: io::Error },

    /// Reading the collector's output failed part way.
    Read { program: String, source: io::Error },

    /// Waiting for the collector to exit failed.
    Wait { program: String, source: io::Error },

    /// A saved capture file (or stdin) could not be read.
    Input { path: PathBuf, source: io::Error },
}

impl fmt::Display for CollectorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Spawn { program, source } => {
                write!(f, "Could not start '{program}': {source}")
            }
            Self::Read { program, source } => {
                write!(f, "Failed reading output of '{program}': {source}")
            }
            Self::Wait { program, source } => {
                write!(f, "Failed waiting for '{program}' to exit: {source}")
            }
            Self::Input { path, source } => {
                write!(f, "Cannot read capture '{}': {source}", path.display())
            }
        }
    }
}

impl std::error::Error for CollectorError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Spawn { source, .. }
            | Self::Read { source, .. }
            | Self::Wait { source, .. }
            | Self::Input { source, .. } => Some(source),
        }
    }
}

impl From<CollectorError> for NetSleuthError {
    fn from(e: CollectorError) -> Self {
        Self::Collector(e)
    }
}

// ---------------------------------------------------------------------------
// Export errors
// ---------------------------------------------------------------------------

/// Errors related to export operations.
#[derive(Debug)]
pub enum ExportError {
    /// I/O error writing the export file.
    Io { path: PathBuf, source: io::Error },

    /// CSV serialisation error.
    Csv { path: PathBuf, source: csv::Error },

    /// JSON serialisation error.
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
}

impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "Export I/O error '{}': {source}", path.display())
            }
            Self::Csv { path, source } => {
                write!(f, "CSV export error '{}': {source}", path.display())
            }
            Self::Json { path, source } => {
                write!(f, "JSON export error '{}': {source}", path.display())
            }
        }
    }
}

impl std::error::Error for ExportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Csv { source, .. } => Some(source),
            Self::Json { source, .. } => Some(source),
        }
    }
}

impl From<ExportError> for NetSleuthError {
    fn from(e: ExportError) -> Self {
        Self::Export(e)
    }
}

// ---------------------------------------------------------------------------
// Config errors
// ---------------------------------------------------------------------------

/// Errors related to configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    /// TOML parsing failed.
    TomlParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// A config value is out of the allowed range.
    ValueOutOfRange {
        field: String,
        value: String,
        expected: String,
    },

    /// I/O error reading config file.
    Io { path: PathBuf, source: io::Error },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TomlParse { path, source } => {
                write!(f, "Config parse error '{}': {source}", path.display())
            }
            Self::ValueOutOfRange {
                field,
                value,
                expected,
            } => write!(
                f,
                "Config '{field}' = '{value}' is out of range. Expected: {expected}"
            ),
            Self::Io { path, source } => {
                write!(f, "Config I/O error '{}': {source}", path.display())
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::TomlParse { source, .. } => Some(source),
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<ConfigError> for NetSleuthError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

// ---------------------------------------------------------------------------
// Page errors
// ---------------------------------------------------------------------------

/// Errors raised by the paginator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageError {
    /// Requested page is outside `1..=total_pages`.
    OutOfRange { requested: usize, total_pages: usize },
}

impl fmt::Display for PageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfRange {
                requested,
                total_pages,
            } => write!(
                f,
                "Page {requested} does not exist. Valid pages: 1-{total_pages}"
            ),
        }
    }
}

impl std::error::Error for PageError {}

impl From<PageError> for NetSleuthError {
    fn from(e: PageError) -> Self {
        Self::Page(e)
    }
}

/// Convenience type alias for NetSleuth results.
pub type Result<T> = std::result::Result<T, NetSleuthError>;
