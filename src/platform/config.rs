// NetSleuth - platform/config.rs
//
// Platform-specific configuration, data directory resolution, and config.toml
// loading with startup validation.
//
// Uses the `directories` crate for XDG (Linux), AppData (Windows),
// Library (macOS) compliance.

use crate::util::constants;
use crate::util::error::ConfigError;
use directories::ProjectDirs;
use std::path::{Path, PathBuf};

/// Resolved platform paths for NetSleuth data and configuration.
#[derive(Debug, Clone)]
pub struct PlatformPaths {
    /// Configuration directory (e.g. ~/.config/netsleuth/ or %APPDATA%\NetSleuth\config\)
    pub config_dir: PathBuf,

    /// Data directory for logs and saved exports.
    pub data_dir: PathBuf,
}

impl PlatformPaths {
    /// Resolve platform-appropriate paths.
    ///
    /// Falls back to current directory if platform dirs cannot be determined.
    pub fn resolve() -> Self {
        if let Some(proj_dirs) = ProjectDirs::from("", "", constants::APP_ID) {
            let config_dir = proj_dirs.config_dir().to_path_buf();
            let data_dir = proj_dirs.data_dir().to_path_buf();

            tracing::debug!(
                config = %config_dir.display(),
                data = %data_dir.display(),
                "Platform paths resolved"
            );

            Self {
                config_dir,
                data_dir,
            }
        } else {
            tracing::warn!("Could not determine platform directories, using current directory");
            let fallback = PathBuf::from(".");
            Self {
                config_dir: fallback.clone(),
                data_dir: fallback,
            }
        }
    }

    /// Default location of `config.toml`.
    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join(constants::CONFIG_FILE_NAME)
    }
}

// =============================================================================
// config.toml loading and validation
// =============================================================================

/// Raw deserialisable shape of config.toml.
///
/// Unknown keys are silently ignored for forward compatibility -- a newer
/// config file can be used with an older binary without crashing.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct RawConfig {
    /// `[collector]` section.
    pub collector: CollectorSection,
    /// `[display]` section.
    pub display: DisplaySection,
    /// `[refresh]` section.
    pub refresh: RefreshSection,
    /// `[logging]` section.
    pub logging: LoggingSection,
}

/// `[collector]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct CollectorSection {
    /// Program that runs the event queries.
    pub program: Option<String>,
    /// Event logs queried by the general pass.
    pub log_names: Option<Vec<String>>,
    /// Security ids fetched by the targeted pass.
    pub security_event_ids: Option<Vec<u32>>,
    /// Per-query event cap.
    pub max_events: Option<u32>,
}

/// `[display]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct DisplaySection {
    /// Entries per page.
    pub page_size: Option<usize>,
}

/// `[refresh]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct RefreshSection {
    /// Auto-refresh interval in seconds.
    pub interval_secs: Option<u64>,
}

/// `[logging]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Log level: "error", "warn", "info", "debug", "trace".
    pub level: Option<String>,
    /// Log file path (empty = stderr only).
    pub file: Option<String>,
}

/// Validated application configuration derived from `config.toml`.
///
/// Invalid values produce actionable warnings and fall back to defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    // -- Collector --
    pub collector_program: String,
    pub log_names: Vec<String>,
    pub security_event_ids: Vec<u32>,
    pub max_events: u32,

    // -- Display --
    pub page_size: usize,

    // -- Refresh --
    pub refresh_interval_secs: u64,

    // -- Logging --
    /// Logging level string (for init before tracing is available).
    pub log_level: Option<String>,
    /// Log file path.
    pub log_file: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            collector_program: constants::DEFAULT_COLLECTOR_PROGRAM.to_string(),
            log_names: constants::DEFAULT_LOG_NAMES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            security_event_ids: constants::DEFAULT_SECURITY_EVENT_IDS.to_vec(),
            max_events: constants::DEFAULT_MAX_EVENTS,
            page_size: constants::DEFAULT_PAGE_SIZE,
            refresh_interval_secs: constants::DEFAULT_REFRESH_INTERVAL_SECS,
            log_level: None,
            log_file: None,
        }
    }
}

/// Load and validate `config.toml` at `config_path`.
///
/// Returns `AppConfig` with validated values and a list of non-fatal warnings.
/// If the file does not exist, returns defaults with no warnings (first-run).
/// If the file is unparseable, returns defaults with a warning so the
/// application still starts but the user is informed.
///
/// Runs before logging is initialised (the log level comes from here), so
/// warnings are returned for the caller to log rather than logged here.
pub fn load_config(config_path: &Path) -> (AppConfig, Vec<String>) {
    let mut warnings: Vec<String> = Vec::new();

    if !config_path.exists() {
        return (AppConfig::default(), warnings);
    }

    let content = match std::fs::read_to_string(config_path) {
        Ok(c) => c,
        Err(source) => {
            let err = ConfigError::Io {
                path: config_path.to_path_buf(),
                source,
            };
            warnings.push(format!("{err}. Using defaults."));
            return (AppConfig::default(), warnings);
        }
    };

    match toml::from_str::<RawConfig>(&content) {
        Ok(raw) => {
            let config = validate(raw, &mut warnings);
            (config, warnings)
        }
        Err(source) => {
            let err = ConfigError::TomlParse {
                path: config_path.to_path_buf(),
                source,
            };
            warnings.push(format!("{err}. Using defaults."));
            (AppConfig::default(), warnings)
        }
    }
}

/// Validate each field against named constants, accumulating all problems.
pub fn validate(raw: RawConfig, warnings: &mut Vec<String>) -> AppConfig {
    let mut config = AppConfig::default();

    // -- Collector: program --
    if let Some(program) = raw.collector.program {
        if program.trim().is_empty() {
            warnings.push(format!(
                "[collector] program is empty. Using default ({}).",
                constants::DEFAULT_COLLECTOR_PROGRAM
            ));
        } else {
            config.collector_program = program;
        }
    }

    // -- Collector: log_names --
    if let Some(names) = raw.collector.log_names {
        let names: Vec<String> = names
            .into_iter()
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .collect();
        if names.is_empty() || names.len() > constants::MAX_LOG_NAMES {
            warnings.push(format!(
                "[collector] log_names must list 1-{} logs. Using default ({}).",
                constants::MAX_LOG_NAMES,
                constants::DEFAULT_LOG_NAMES.join(", "),
            ));
        } else {
            config.log_names = names;
        }
    }

    // -- Collector: security_event_ids --
    if let Some(ids) = raw.collector.security_event_ids {
        if ids.contains(&0) {
            warnings.push(
                "[collector] security_event_ids must all be positive. Using default.".to_string(),
            );
        } else {
            // An empty list disables the targeted Security pass.
            config.security_event_ids = ids;
        }
    }

    // -- Collector: max_events --
    if let Some(max) = raw.collector.max_events {
        if (constants::MIN_MAX_EVENTS..=constants::ABSOLUTE_MAX_EVENTS).contains(&max) {
            config.max_events = max;
        } else {
            warnings.push(format!(
                "[collector] max_events = {max} is out of range ({}-{}). Using default ({}).",
                constants::MIN_MAX_EVENTS,
                constants::ABSOLUTE_MAX_EVENTS,
                constants::DEFAULT_MAX_EVENTS,
            ));
        }
    }

    // -- Display: page_size --
    if let Some(size) = raw.display.page_size {
        if (constants::MIN_PAGE_SIZE..=constants::MAX_PAGE_SIZE).contains(&size) {
            config.page_size = size;
        } else {
            warnings.push(format!(
                "[display] page_size = {size} is out of range ({}-{}). Using default ({}).",
                constants::MIN_PAGE_SIZE,
                constants::MAX_PAGE_SIZE,
                constants::DEFAULT_PAGE_SIZE,
            ));
        }
    }

    // -- Refresh: interval_secs --
    if let Some(secs) = raw.refresh.interval_secs {
        if (constants::MIN_REFRESH_INTERVAL_SECS..=constants::MAX_REFRESH_INTERVAL_SECS)
            .contains(&secs)
        {
            config.refresh_interval_secs = secs;
        } else {
            warnings.push(format!(
                "[refresh] interval_secs = {secs} is out of range ({}-{}). Using default ({}).",
                constants::MIN_REFRESH_INTERVAL_SECS,
                constants::MAX_REFRESH_INTERVAL_SECS,
                constants::DEFAULT_REFRESH_INTERVAL_SECS,
            ));
        }
    }

    // -- Logging: level --
    if let Some(level) = raw.logging.level {
        let valid = ["error", "warn", "info", "debug", "trace"];
        if valid.contains(&level.to_lowercase().as_str()) {
            config.log_level = Some(level);
        } else {
            warnings.push(format!(
                "[logging] level = \"{level}\" is not recognised. \
                 Valid values: error, warn, info, debug, trace. Using default (info).",
            ));
        }
    }

    // -- Logging: file --
    if let Some(file) = raw.logging.file {
        if !file.is_empty() {
            config.log_file = Some(file);
        }
    }

    config
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load_str(toml_text: &str) -> (AppConfig, Vec<String>) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, toml_text).unwrap();
        load_config(&path)
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let (config, warnings) = load_config(&dir.path().join("config.toml"));
        assert_eq!(config, AppConfig::default());
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_valid_values_are_applied() {
        let (config, warnings) = load_str(
            r#"
[collector]
program = "pwsh"
log_names = ["Security", " System "]
security_event_ids = [4625]
max_events = 250

[display]
page_size = 50

[refresh]
interval_secs = 300

[logging]
level = "debug"
file = "netsleuth.log"
"#,
        );
        assert!(warnings.is_empty(), "{warnings:?}");
        assert_eq!(config.collector_program, "pwsh");
        assert_eq!(config.log_names, vec!["Security", "System"]);
        assert_eq!(config.security_event_ids, vec![4625]);
        assert_eq!(config.max_events, 250);
        assert_eq!(config.page_size, 50);
        assert_eq!(config.refresh_interval_secs, 300);
        assert_eq!(config.log_level.as_deref(), Some("debug"));
        assert_eq!(config.log_file.as_deref(), Some("netsleuth.log"));
    }

    #[test]
    fn test_out_of_range_values_warn_and_default() {
        let (config, warnings) = load_str(
            r#"
[collector]
max_events = 0
log_names = []

[display]
page_size = 0

[refresh]
interval_secs = 1

[logging]
level = "loud"
"#,
        );
        assert_eq!(warnings.len(), 5, "{warnings:?}");
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_unparseable_file_warns() {
        let (config, warnings) = load_str("this is = = not toml");
        assert_eq!(config, AppConfig::default());
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].starts_with("Config parse error"));
    }

    #[test]
    fn test_unknown_keys_ignored() {
        let (config, warnings) = load_str("[future]\nkey = 1\n[display]\npage_size = 20\n");
        assert!(warnings.is_empty());
        assert_eq!(config.page_size, 20);
    }

    #[test]
    fn test_zero_security_id_rejected() {
        let (config, warnings) = load_str("[collector]\nsecurity_event_ids = [4625, 0]\n");
        assert_eq!(warnings.len(), 1);
        assert_eq!(
            config.security_event_ids,
            constants::DEFAULT_SECURITY_EVENT_IDS.to_vec()
        );
    }
}
