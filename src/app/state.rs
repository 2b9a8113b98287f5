// NetSleuth - app/state.rs
//
// Application state management. Holds the current snapshot, filter state,
// pagination position, and status text.
// Owned by the thread that drives the presentation (the CLI main loop).

use crate::core::export;
use crate::core::filter::{self, FilterState};
use crate::core::model::{Entry, RefreshOutcome, RefreshProgress, RefreshSummary};
use crate::core::paginate::Paginator;
use crate::util::error::PageError;
use std::sync::Arc;

/// Shown instead of page text when nothing matches the filters.
pub const NO_MATCHES_MESSAGE: &str = "No logs match the current filter criteria.";

/// Top-level application state.
#[derive(Debug)]
pub struct AppState {
    /// Snapshot published by the most recent refresh. Replaced wholesale.
    pub entries: Arc<Vec<Entry>>,

    /// Indices of entries matching the current filter (into `entries`).
    pub filtered_indices: Vec<usize>,

    /// Current filter configuration.
    pub filter_state: FilterState,

    /// 1-based page currently shown.
    pub current_page: usize,

    /// Page count for the current filtered result.
    pub total_pages: usize,

    /// Entries per page.
    pub page_size: usize,

    /// Summary from the most recent completed refresh.
    pub summary: Option<RefreshSummary>,

    /// Whether a refresh is currently in progress.
    pub refresh_in_progress: bool,

    /// Status message for the status line.
    pub status_message: String,
}

impl AppState {
    pub fn new(page_size: usize) -> Self {
        Self {
            entries: Arc::new(Vec::new()),
            filtered_indices: Vec::new(),
            filter_state: FilterState::default(),
            current_page: 1,
            total_pages: 1,
            page_size: page_size.max(1),
            summary: None,
            refresh_in_progress: false,
            status_message: "Ready. Refresh to fetch events.".to_string(),
        }
    }

    fn paginator(&self) -> Paginator {
        Paginator::new(self.filtered_indices.len(), self.page_size)
    }

    /// Recompute filtered indices and return to page 1.
    pub fn apply_filters(&mut self) {
        self.filtered_indices = filter::apply_filters(&self.entries, &self.filter_state);
        self.total_pages = self.paginator().page_count();
        self.current_page = 1;
        tracing::debug!(
            matching = self.filtered_indices.len(),
            pages = self.total_pages,
            filter = %self.filter_state.describe(),
            "Filters applied"
        );
    }

    /// Replace the filter and re-apply.
    pub fn set_filter(&mut self, filter_state: FilterState) {
        self.filter_state = filter_state;
        self.apply_filters();
    }

    /// Back to "all sources, all logs, no text".
    pub fn reset_filters(&mut self) {
        self.set_filter(FilterState::default());
    }

    /// Jump to `page`. Out-of-range pages leave the position unchanged.
    pub fn go_to_page(&mut self, page: usize) -> Result<(), PageError> {
        self.paginator().page_range(page)?;
        self.current_page = page;
        Ok(())
    }

    /// Jump to the valid page nearest `page`. Returns the page now shown.
    pub fn go_to_nearest_page(&mut self, page: usize) -> usize {
        self.current_page = self.paginator().clamp_page(page);
        self.current_page
    }

    /// Returns `false` when already on the last page.
    pub fn next_page(&mut self) -> bool {
        self.go_to_page(self.current_page + 1).is_ok()
    }

    /// Returns `false` when already on the first page.
    pub fn previous_page(&mut self) -> bool {
        self.current_page > 1 && self.go_to_page(self.current_page - 1).is_ok()
    }

    /// Entries on the current page, in display order.
    pub fn current_page_entries(&self) -> Vec<&Entry> {
        let range = self.paginator().page_range(self.current_page).unwrap_or(0..0);
        self.filtered_indices[range]
            .iter()
            .filter_map(|&idx| self.entries.get(idx))
            .collect()
    }

    /// Rendered text of the current page, or a notice when nothing matches.
    pub fn current_page_text(&self) -> String {
        if self.filtered_indices.is_empty() {
            return format!("{NO_MATCHES_MESSAGE}\n");
        }
        export::render_page_text(&self.current_page_entries())
    }

    /// Status line for the current page:
    /// `Showing 100 logs (4 anomalies) on page 1 of 3. Total matching: 250. Filter: [All Logs]`.
    pub fn page_status(&self) -> String {
        let page = self.current_page_entries();
        let anomalies = page.iter().filter(|e| e.anomaly.is_anomaly()).count();
        format!(
            "Showing {} logs ({} anomalies) on page {} of {}. Total matching: {}. Filter: [{}]",
            page.len(),
            anomalies,
            self.current_page,
            self.total_pages,
            self.filtered_indices.len(),
            self.filter_state.describe()
        )
    }

    /// Distinct log sources present in the snapshot, in first-seen order.
    pub fn source_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for entry in self.entries.iter().filter(|e| e.is_real_event()) {
            let name = entry.source_display();
            if !names.iter().any(|n| n.eq_ignore_ascii_case(name)) {
                names.push(name);
            }
        }
        names
    }

    /// Swap in a finished snapshot and re-apply the current filters.
    pub fn install_outcome(&mut self, outcome: RefreshOutcome) {
        self.entries = outcome.entries;
        self.status_message = outcome.summary.status_line();
        for warning in &outcome.summary.warnings {
            tracing::warn!(warning = %warning, "Refresh warning");
        }
        self.summary = Some(outcome.summary);
        self.refresh_in_progress = false;
        self.apply_filters();
    }

    /// Apply a message from the refresh worker.
    pub fn handle_progress(&mut self, msg: RefreshProgress) {
        match msg {
            RefreshProgress::Started => {
                self.refresh_in_progress = true;
                self.status_message = "Fetching events...".to_string();
            }
            RefreshProgress::Collected { lines, .. } => {
                self.status_message = format!("Analysing {lines} captured lines...");
            }
            RefreshProgress::Completed { outcome } => self.install_outcome(outcome),
        }
    }
}
