// NetSleuth - core/model.rs
//
// Core data model types. Pure data definitions with no I/O and no platform
// dependencies.
//
// Absent fields are `Option`s or enum variants here. Sentinel strings such as
// "Unknown" or "N/A" are only produced by the `*_display` accessors, which
// is what rendering and export call.

use crate::util::constants;
use serde::{Serialize, Serializer};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

// =============================================================================
// Entry (normalised output of parsing)
// =============================================================================

/// A single parsed event block.
///
/// Constructed once by the parser, given its category once by the
/// classifier, and read-only after that. A refresh publishes a whole new
/// `Vec<Entry>` rather than touching a previous one.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    /// The block exactly as split from the stream (trimmed).
    pub raw_text: String,

    /// `TimeCreated` value as written. Compared as text, not parsed.
    pub timestamp: Option<String>,

    /// `LogName` value, e.g. "Security".
    pub log_source: Option<String>,

    /// `Id` value.
    pub event_id: EventId,

    /// `LevelDisplayName` value, e.g. "Error".
    pub level: Option<String>,

    /// `Message` body, or the whole block when no message label exists.
    pub message: String,

    /// Source or client network address (allow-listed Security events only).
    pub source_address: Option<String>,

    /// Account name (allow-listed Security events only).
    pub account: Option<String>,

    /// Assigned by the classifier.
    pub anomaly: AnomalyCategory,
}

impl Entry {
    /// A placeholder entry that carries a status or error message rather
    /// than a real event. Its id is `Missing`, so filters never show it.
    pub fn synthetic(message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            raw_text: message.clone(),
            timestamp: None,
            log_source: None,
            event_id: EventId::Missing,
            level: None,
            message,
            source_address: None,
            account: None,
            anomaly: AnomalyCategory::None,
        }
    }

    /// True for entries parsed from a real event (positive id).
    pub fn is_real_event(&self) -> bool {
        self.event_id.is_real()
    }

    pub fn source_display(&self) -> &str {
        self.log_source.as_deref().unwrap_or(constants::UNKNOWN_SOURCE)
    }

    pub fn level_display(&self) -> &str {
        self.level.as_deref().unwrap_or(constants::DEFAULT_LEVEL)
    }

    pub fn address_display(&self) -> &str {
        self.source_address
            .as_deref()
            .unwrap_or(constants::NOT_AVAILABLE)
    }

    pub fn account_display(&self) -> &str {
        self.account.as_deref().unwrap_or(constants::NOT_AVAILABLE)
    }

    pub fn timestamp_display(&self) -> &str {
        self.timestamp
            .as_deref()
            .unwrap_or(constants::MISSING_TIMESTAMP)
    }

    /// First line of the message, used in one-line renderings.
    pub fn first_message_line(&self) -> &str {
        self.message.lines().next().unwrap_or("").trim_end()
    }
}

// =============================================================================
// EventId
// =============================================================================

/// Parsed `Id` field.
///
/// `Missing` and `Malformed` are distinct so a block with `Id : abc` can be
/// told apart from one without an `Id` line at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EventId {
    /// No `Id` label in the block (also used by synthetic entries).
    #[default]
    Missing,
    /// `Id` label present but the value is not a non-negative integer.
    Malformed,
    /// Numeric id.
    Value(u32),
}

impl EventId {
    /// Legacy numeric code: `-1` missing, `-2` malformed, otherwise the id.
    pub fn code(self) -> i64 {
        match self {
            EventId::Missing => -1,
            EventId::Malformed => -2,
            EventId::Value(n) => i64::from(n),
        }
    }

    /// The numeric id when one was parsed.
    pub fn value(self) -> Option<u32> {
        match self {
            EventId::Value(n) => Some(n),
            _ => None,
        }
    }

    /// Only strictly positive ids denote real events.
    pub fn is_real(self) -> bool {
        matches!(self, EventId::Value(n) if n > 0)
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Padding flags (e.g. `{:<5}`) apply to the rendered code.
        f.pad(&self.code().to_string())
    }
}

impl Serialize for EventId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(self.code())
    }
}

// =============================================================================
// AnomalyCategory
// =============================================================================

/// Closed set of categories an entry can be classified into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AnomalyCategory {
    #[default]
    None,
    FailedLogin,
    AccountLockout,
    AuditLogCleared,
    UserAccountChange,
    PrivilegeAssigned,
    GroupMembershipChange,
    ServiceCrash,
    UnexpectedShutdown,
    CriticalEvent,
    ErrorEvent,
    WarningEvent,
}

/// Which rule tier can produce a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryTier {
    /// The "no anomaly" category.
    Unflagged,
    /// Produced by an exact `(source, id)` rule.
    Identity,
    /// Produced by the severity-level fallback.
    Level,
}

impl AnomalyCategory {
    /// Returns all variants in display order.
    pub fn all() -> &'static [AnomalyCategory] {
        &[
            AnomalyCategory::None,
            AnomalyCategory::FailedLogin,
            AnomalyCategory::AccountLockout,
            AnomalyCategory::AuditLogCleared,
            AnomalyCategory::UserAccountChange,
            AnomalyCategory::PrivilegeAssigned,
            AnomalyCategory::GroupMembershipChange,
            AnomalyCategory::ServiceCrash,
            AnomalyCategory::UnexpectedShutdown,
            AnomalyCategory::CriticalEvent,
            AnomalyCategory::ErrorEvent,
            AnomalyCategory::WarningEvent,
        ]
    }

    /// Human-readable label for display and filtering.
    pub fn label(&self) -> &'static str {
        match self {
            AnomalyCategory::None => "No Anomaly",
            AnomalyCategory::FailedLogin => "Sec: Failed Login",
            AnomalyCategory::AccountLockout => "Sec: Account Lockout",
            AnomalyCategory::AuditLogCleared => "Sec: Audit Log Cleared!",
            AnomalyCategory::UserAccountChange => "Sec: User Account Change",
            AnomalyCategory::PrivilegeAssigned => "Sec: Special Privilege Assigned",
            AnomalyCategory::GroupMembershipChange => "Sec: Privileged Group Changed",
            AnomalyCategory::ServiceCrash => "Sys: Service Unexpected Stop",
            AnomalyCategory::UnexpectedShutdown => "Sys: Unexpected Shutdown",
            AnomalyCategory::CriticalEvent => "General: Critical Event",
            AnomalyCategory::ErrorEvent => "General: Error Event",
            AnomalyCategory::WarningEvent => "General: Warning Event",
        }
    }

    /// Exact (case-sensitive) reverse lookup of [`label`](Self::label).
    pub fn from_label(label: &str) -> Option<AnomalyCategory> {
        Self::all().iter().copied().find(|c| c.label() == label)
    }

    /// True for every category except `None`.
    pub fn is_anomaly(&self) -> bool {
        *self != AnomalyCategory::None
    }

    pub fn tier(&self) -> CategoryTier {
        match self {
            AnomalyCategory::None => CategoryTier::Unflagged,
            AnomalyCategory::CriticalEvent
            | AnomalyCategory::ErrorEvent
            | AnomalyCategory::WarningEvent => CategoryTier::Level,
            _ => CategoryTier::Identity,
        }
    }
}

impl fmt::Display for AnomalyCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for AnomalyCategory {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

// =============================================================================
// Refresh results and progress messages
// =============================================================================

/// Outcome of one refresh cycle, as shown in the status line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshStatus {
    /// Collection failed before any event was produced.
    Failed { message: String },
    /// Events were collected.
    Fetched { total: usize, anomalies: usize },
    /// Collection succeeded but produced no real events.
    NoEvents,
}

/// Summary of a completed refresh cycle.
#[derive(Debug, Clone)]
pub struct RefreshSummary {
    pub status: RefreshStatus,
    /// Non-fatal problems, e.g. a non-zero exit status alongside real output.
    pub warnings: Vec<String>,
    /// Wall-clock time spent collecting and processing.
    pub elapsed: Duration,
}

impl RefreshSummary {
    /// One-line status text for the presentation layer.
    pub fn status_line(&self) -> String {
        match &self.status {
            RefreshStatus::Failed { message } => message.clone(),
            RefreshStatus::NoEvents => "No relevant events found in the specified logs.".to_string(),
            RefreshStatus::Fetched { total, anomalies } if !self.warnings.is_empty() => format!(
                "Fetched {total} events (potential errors). Detected {anomalies} anomalies."
            ),
            RefreshStatus::Fetched { total, anomalies } => {
                format!("Fetched {total} events. Detected {anomalies} anomalies.")
            }
        }
    }
}

/// A finished refresh: the new snapshot plus its summary.
///
/// The snapshot is shared read-only; the presentation side swaps its
/// `Arc` in one assignment.
#[derive(Debug, Clone)]
pub struct RefreshOutcome {
    pub entries: Arc<Vec<Entry>>,
    pub summary: RefreshSummary,
}

/// Messages sent from the background refresh thread to the owner of
/// the application state.
#[derive(Debug)]
pub enum RefreshProgress {
    /// A refresh cycle began.
    Started,
    /// Raw capture finished; processing is about to start.
    Collected { lines: usize, exit_code: Option<i32> },
    /// The cycle finished; always the last message of a cycle.
    Completed { outcome: RefreshOutcome },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_id_codes() {
        assert_eq!(EventId::Missing.code(), -1);
        assert_eq!(EventId::Malformed.code(), -2);
        assert_eq!(EventId::Value(4625).code(), 4625);
        assert!(EventId::Value(1).is_real());
        assert!(!EventId::Value(0).is_real());
        assert!(!EventId::Malformed.is_real());
    }

    #[test]
    fn test_event_id_display_padding() {
        assert_eq!(format!("{:<5}|", EventId::Value(41)), "41   |");
        assert_eq!(format!("{:<5}|", EventId::Malformed), "-2   |");
    }

    #[test]
    fn test_label_round_trip_is_exact() {
        for cat in AnomalyCategory::all() {
            assert_eq!(AnomalyCategory::from_label(cat.label()), Some(*cat));
        }
        assert_eq!(AnomalyCategory::from_label("sec: failed login"), None);
        assert_eq!(AnomalyCategory::from_label("Bogus"), None);
    }

    #[test]
    fn test_tiers() {
        assert_eq!(AnomalyCategory::None.tier(), CategoryTier::Unflagged);
        assert_eq!(AnomalyCategory::FailedLogin.tier(), CategoryTier::Identity);
        assert_eq!(AnomalyCategory::WarningEvent.tier(), CategoryTier::Level);
    }

    #[test]
    fn test_synthetic_entry_renders_sentinels() {
        let e = Entry::synthetic("boom\nsecond line");
        assert!(!e.is_real_event());
        assert_eq!(e.source_display(), "Unknown");
        assert_eq!(e.level_display(), "Information");
        assert_eq!(e.address_display(), "N/A");
        assert_eq!(e.timestamp_display(), "??");
        assert_eq!(e.first_message_line(), "boom");
    }

    #[test]
    fn test_status_line_variants() {
        let mut summary = RefreshSummary {
            status: RefreshStatus::Fetched {
                total: 10,
                anomalies: 3,
            },
            warnings: Vec::new(),
            elapsed: Duration::ZERO,
        };
        assert_eq!(summary.status_line(), "Fetched 10 events. Detected 3 anomalies.");
        summary.warnings.push("exit 1".to_string());
        assert!(summary.status_line().contains("potential errors"));
        summary.status = RefreshStatus::NoEvents;
        assert!(summary.status_line().starts_with("No relevant events"));
    }
}
