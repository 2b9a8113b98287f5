// NetSleuth - core/sort.rs
//
// Newest-first ordering. Timestamps are compared as text, so ordering is only
// chronological when the collector emits a sortable format.

use crate::core::model::Entry;
use std::cmp::Ordering;

/// Descending by timestamp, entries without one last. Stable, so equal
/// timestamps keep their dedup order.
pub fn sort_newest_first(entries: &mut [Entry]) {
    entries.sort_by(|a, b| compare_newest_first(a.timestamp.as_deref(), b.timestamp.as_deref()));
}

fn compare_newest_first(a: Option<&str>, b: Option<&str>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => b.cmp(a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
