// NetSleuth - core/filter.rs
//
// Composable filter engine for classified entries.
// All active filters are AND-combined.
// Core layer: pure logic, no I/O.

use crate::core::model::{AnomalyCategory, Entry};
use crate::util::constants;

/// Which log source to show.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SourceFilter {
    #[default]
    All,
    /// Case-insensitive exact match on the rendered source name.
    Named(String),
}

impl SourceFilter {
    /// Parse a user-facing value. `All Logs` (any case) and empty mean all.
    pub fn from_label(label: &str) -> Self {
        let label = label.trim();
        if label.is_empty() || label.eq_ignore_ascii_case(constants::ALL_SOURCES_LABEL) {
            SourceFilter::All
        } else {
            SourceFilter::Named(label.to_string())
        }
    }

    pub fn label(&self) -> &str {
        match self {
            SourceFilter::All => constants::ALL_SOURCES_LABEL,
            SourceFilter::Named(name) => name,
        }
    }

    fn matches(&self, entry: &Entry) -> bool {
        match self {
            SourceFilter::All => true,
            SourceFilter::Named(name) => entry.source_display().eq_ignore_ascii_case(name),
        }
    }
}

/// Which categories to show.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CategoryFilter {
    #[default]
    AllLogs,
    AllAnomalies,
    Only(AnomalyCategory),
    /// A label that names no category; matches nothing.
    Unrecognised(String),
}

impl CategoryFilter {
    /// Parse a user-facing label: the two sentinels or an exact category label.
    pub fn from_label(label: &str) -> Self {
        match label {
            constants::SHOW_ALL_LOGS_LABEL => CategoryFilter::AllLogs,
            constants::SHOW_ALL_ANOMALIES_LABEL => CategoryFilter::AllAnomalies,
            other => match AnomalyCategory::from_label(other) {
                Some(category) => CategoryFilter::Only(category),
                None => CategoryFilter::Unrecognised(other.to_string()),
            },
        }
    }

    pub fn label(&self) -> &str {
        match self {
            CategoryFilter::AllLogs => constants::SHOW_ALL_LOGS_LABEL,
            CategoryFilter::AllAnomalies => constants::SHOW_ALL_ANOMALIES_LABEL,
            CategoryFilter::Only(category) => category.label(),
            CategoryFilter::Unrecognised(label) => label,
        }
    }

    fn matches(&self, entry: &Entry) -> bool {
        match self {
            CategoryFilter::AllLogs => true,
            CategoryFilter::AllAnomalies => entry.anomaly.is_anomaly(),
            CategoryFilter::Only(category) => entry.anomaly == *category,
            CategoryFilter::Unrecognised(_) => false,
        }
    }
}

/// Complete filter state. All fields are AND-combined when applied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterState {
    pub source: SourceFilter,
    pub category: CategoryFilter,
    /// Substring text search over the raw block (case-insensitive). Empty = no filter.
    pub text_search: String,
}

impl FilterState {
    /// Returns true if no user filter is active.
    pub fn is_empty(&self) -> bool {
        self.source == SourceFilter::All
            && self.category == CategoryFilter::AllLogs
            && self.text_search.trim().is_empty()
    }

    /// Human-readable summary, e.g. `Log: Security | Text: 'bob'`.
    pub fn describe(&self) -> String {
        let mut parts = Vec::new();
        if let SourceFilter::Named(name) = &self.source {
            parts.push(format!("Log: {name}"));
        }
        if self.category != CategoryFilter::AllLogs {
            parts.push(format!("Anomaly: {}", self.category.label()));
        }
        let text = self.text_search.trim();
        if !text.is_empty() {
            parts.push(format!("Text: '{text}'"));
        }
        if parts.is_empty() {
            constants::ALL_SOURCES_LABEL.to_string()
        } else {
            parts.join(" | ")
        }
    }
}

/// Apply filters to a slice of entries, returning indices of matching entries.
///
/// Entries without a real event id (synthetic status entries, malformed ids)
/// are always excluded. The result is an order-preserving subsequence.
pub fn apply_filters(entries: &[Entry], filter: &FilterState) -> Vec<usize> {
    let text_lower = filter.text_search.trim().to_lowercase();

    entries
        .iter()
        .enumerate()
        .filter(|(_, entry)| matches_all(entry, filter, &text_lower))
        .map(|(idx, _)| idx)
        .collect()
}

/// Check if a single entry matches all active filters.
fn matches_all(entry: &Entry, filter: &FilterState, text_lower: &str) -> bool {
    if !entry.is_real_event() {
        return false;
    }

    if !filter.source.matches(entry) {
        return false;
    }

    if !filter.category.matches(entry) {
        return false;
    }

    if !text_lower.is_empty() && !entry.raw_text.to_lowercase().contains(text_lower) {
        return false;
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::classifier::classify;
    use crate::core::parser::parse_block;

    fn sample() -> Vec<Entry> {
        let mut entries = vec![
            parse_block("TimeCreated : 5\nLogName : Security\nId : 4625\nMessage : Failed for BOB"),
            parse_block("TimeCreated : 4\nLogName : System\nId : 41\nMessage : Kernel power"),
            parse_block("TimeCreated : 3\nLogName : Application\nId : 1000\nLevelDisplayName : Error\nMessage : crash"),
            parse_block("TimeCreated : 2\nLogName : Application\nId : 1\nMessage : fine"),
            parse_block("TimeCreated : 1\nLogName : Security\nId : abc\nMessage : bob again"),
            Entry::synthetic("No relevant events found"),
        ];
        classify(&mut entries);
        entries
    }

    #[test]
    fn test_default_filter_excludes_non_real_ids() {
        let result = apply_filters(&sample(), &FilterState::default());
        assert_eq!(result, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_source_filter_case_insensitive() {
        let filter = FilterState {
            source: SourceFilter::from_label("security"),
            ..Default::default()
        };
        assert_eq!(apply_filters(&sample(), &filter), vec![0]);
    }

    #[test]
    fn test_all_anomalies() {
        let filter = FilterState {
            category: CategoryFilter::from_label("Show All Anomalies"),
            ..Default::default()
        };
        assert_eq!(apply_filters(&sample(), &filter), vec![0, 1, 2]);
    }

    #[test]
    fn test_specific_category() {
        let filter = FilterState {
            category: CategoryFilter::from_label("Sys: Unexpected Shutdown"),
            ..Default::default()
        };
        assert_eq!(apply_filters(&sample(), &filter), vec![1]);
    }

    #[test]
    fn test_unrecognised_label_matches_nothing() {
        let category = CategoryFilter::from_label("Sec: Nonsense");
        assert_eq!(category, CategoryFilter::Unrecognised("Sec: Nonsense".into()));
        let filter = FilterState {
            category,
            ..Default::default()
        };
        assert!(apply_filters(&sample(), &filter).is_empty());
    }

    #[test]
    fn test_text_search_on_raw_text() {
        let filter = FilterState {
            text_search: "bob".to_string(),
            ..Default::default()
        };
        // Entry 4 also mentions bob but has a malformed id.
        assert_eq!(apply_filters(&sample(), &filter), vec![0]);

        // Field labels are part of the raw block.
        let filter = FilterState {
            text_search: "LOGNAME : SYSTEM".to_string(),
            ..Default::default()
        };
        assert_eq!(apply_filters(&sample(), &filter), vec![1]);
    }

    #[test]
    fn test_combined_filters() {
        let filter = FilterState {
            source: SourceFilter::Named("Application".into()),
            category: CategoryFilter::AllAnomalies,
            text_search: "CRASH".into(),
        };
        assert_eq!(apply_filters(&sample(), &filter), vec![2]);
    }

    #[test]
    fn test_source_and_anomalies_keep_original_order() {
        let blocks = [
            "TimeCreated : 10\nLogName : Security\nId : 4625\nMessage : a",
            "TimeCreated : 09\nLogName : System\nId : 7034\nMessage : b",
            "TimeCreated : 08\nLogName : Application\nId : 1000\nLevelDisplayName : Error\nMessage : c",
            "TimeCreated : 07\nLogName : System\nId : 7036\nLevelDisplayName : Information\nMessage : d",
            "TimeCreated : 06\nLogName : Setup\nId : 2\nMessage : e",
            "TimeCreated : 05\nLogName : System\nId : 41\nLevelDisplayName : Critical\nMessage : f",
            "TimeCreated : 04\nLogName : Application\nId : 3\nMessage : g",
            "TimeCreated : 03\nLogName : Security\nId : 4740\nMessage : h",
            "TimeCreated : 02\nLogName : System\nId : 10016\nLevelDisplayName : Warning\nMessage : i",
            "TimeCreated : 01\nLogName : Application\nId : 4\nMessage : j",
        ];
        let mut entries: Vec<Entry> = blocks.iter().map(|b| parse_block(b)).collect();
        classify(&mut entries);

        let filter = FilterState {
            source: SourceFilter::Named("System".into()),
            category: CategoryFilter::AllAnomalies,
            text_search: String::new(),
        };
        assert_eq!(apply_filters(&entries, &filter), vec![1, 5, 8]);

        let system_only = FilterState {
            source: SourceFilter::Named("System".into()),
            ..Default::default()
        };
        assert_eq!(apply_filters(&entries, &system_only), vec![1, 3, 5, 8]);
    }

    #[test]
    fn test_unknown_source_is_matchable_by_name() {
        let mut entries = vec![parse_block("TimeCreated : t\nId : 9\nMessage : orphan")];
        classify(&mut entries);
        let filter = FilterState {
            source: SourceFilter::Named("Unknown".into()),
            ..Default::default()
        };
        assert_eq!(apply_filters(&entries, &filter), vec![0]);
    }

    #[test]
    fn test_describe() {
        assert_eq!(FilterState::default().describe(), "All Logs");
        let filter = FilterState {
            source: SourceFilter::Named("Security".into()),
            category: CategoryFilter::AllAnomalies,
            text_search: "bob".into(),
        };
        assert_eq!(
            filter.describe(),
            "Log: Security | Anomaly: Show All Anomalies | Text: 'bob'"
        );
        assert!(!filter.is_empty());
        assert!(FilterState::default().is_empty());
    }

    #[test]
    fn test_source_filter_from_label() {
        assert_eq!(SourceFilter::from_label("All Logs"), SourceFilter::All);
        assert_eq!(SourceFilter::from_label("  "), SourceFilter::All);
        assert_eq!(
            SourceFilter::from_label("Setup"),
            SourceFilter::Named("Setup".into())
        );
    }
}
