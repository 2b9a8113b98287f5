// NetSleuth - core/dedup.rs
//
// Drops repeated events. The collector runs overlapping queries (all logs,
// then Security filtered by id) so the same Security event usually arrives
// twice.

use crate::core::model::{Entry, EventId};
use std::collections::hash_map::DefaultHasher;
use std::collections::HashSet;
use std::hash::{Hash, Hasher};

/// Composite identity of an entry. Message bodies are hashed, not stored.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DedupKey {
    timestamp: Option<String>,
    event_id: EventId,
    log_source: Option<String>,
    message_hash: u64,
}

impl DedupKey {
    pub fn of(entry: &Entry) -> Self {
        let mut hasher = DefaultHasher::new();
        entry.message.hash(&mut hasher);
        Self {
            timestamp: entry.timestamp.clone(),
            event_id: entry.event_id,
            log_source: entry.log_source.clone(),
            message_hash: hasher.finish(),
        }
    }
}

/// Keep the first entry seen for each key, preserving arrival order.
pub fn dedupe(entries: impl IntoIterator<Item = Entry>) -> Vec<Entry> {
    let mut seen: HashSet<DedupKey> = HashSet::new();
    let mut unique = Vec::new();
    let mut dropped = 0usize;

    for entry in entries {
        if seen.insert(DedupKey::of(&entry)) {
            unique.push(entry);
        } else {
            dropped += 1;
        }
    }

    tracing::debug!(kept = unique.len(), dropped, "Deduplication complete");
    unique
}
