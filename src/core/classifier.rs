// NetSleuth - core/classifier.rs
//
// Rule-table classification. Identity rules keyed on (log source, event id)
// are tried in declaration order; if none matches, the severity level
// decides. Each entry is classified on its own, with no cross-entry state.

use crate::core::model::{AnomalyCategory, Entry};

/// Exact `(source, id)` rule. Source comparison is case-insensitive.
#[derive(Debug, Clone, Copy)]
pub struct IdentityRule {
    pub log_source: &'static str,
    pub event_ids: &'static [u32],
    pub category: AnomalyCategory,
}

/// Level fallback rule. Level comparison is case-insensitive and exact.
#[derive(Debug, Clone, Copy)]
pub struct LevelRule {
    pub level: &'static str,
    pub category: AnomalyCategory,
}

/// Identity rules, first match wins.
pub const IDENTITY_RULES: &[IdentityRule] = &[
    IdentityRule {
        log_source: "Security",
        event_ids: &[4625],
        category: AnomalyCategory::FailedLogin,
    },
    IdentityRule {
        log_source: "Security",
        event_ids: &[4740],
        category: AnomalyCategory::AccountLockout,
    },
    IdentityRule {
        log_source: "Security",
        event_ids: &[1102],
        category: AnomalyCategory::AuditLogCleared,
    },
    IdentityRule {
        log_source: "Security",
        event_ids: &[4720, 4722, 4726],
        category: AnomalyCategory::UserAccountChange,
    },
    IdentityRule {
        log_source: "Security",
        event_ids: &[4673],
        category: AnomalyCategory::PrivilegeAssigned,
    },
    IdentityRule {
        log_source: "Security",
        event_ids: &[4732, 4756, 4728],
        category: AnomalyCategory::GroupMembershipChange,
    },
    IdentityRule {
        log_source: "System",
        event_ids: &[7034, 7031],
        category: AnomalyCategory::ServiceCrash,
    },
    IdentityRule {
        log_source: "System",
        event_ids: &[6008, 41],
        category: AnomalyCategory::UnexpectedShutdown,
    },
];

/// Level fallback, checked in order.
pub const LEVEL_RULES: &[LevelRule] = &[
    LevelRule {
        level: "Critical",
        category: AnomalyCategory::CriticalEvent,
    },
    LevelRule {
        level: "Error",
        category: AnomalyCategory::ErrorEvent,
    },
    LevelRule {
        level: "Warning",
        category: AnomalyCategory::WarningEvent,
    },
];

/// Category for a single entry.
pub fn classify_entry(entry: &Entry) -> AnomalyCategory {
    identity_match(entry)
        .or_else(|| level_match(entry))
        .unwrap_or(AnomalyCategory::None)
}

fn identity_match(entry: &Entry) -> Option<AnomalyCategory> {
    if !entry.is_real_event() {
        return None;
    }
    let source = entry.log_source.as_deref()?;
    let id = entry.event_id.value()?;
    IDENTITY_RULES
        .iter()
        .find(|r| r.log_source.eq_ignore_ascii_case(source) && r.event_ids.contains(&id))
        .map(|r| r.category)
}

fn level_match(entry: &Entry) -> Option<AnomalyCategory> {
    let level = entry.level.as_deref()?.trim();
    LEVEL_RULES
        .iter()
        .find(|r| r.level.eq_ignore_ascii_case(level))
        .map(|r| r.category)
}

/// Assign every entry its category. Returns how many were flagged.
pub fn classify(entries: &mut [Entry]) -> usize {
    let mut flagged = 0;
    for entry in entries.iter_mut() {
        entry.anomaly = classify_entry(entry);
        if entry.anomaly.is_anomaly() {
            flagged += 1;
        }
    }
    tracing::debug!(entries = entries.len(), flagged, "Classification complete");
    flagged
}

/// Rule table as text, one rule per line, for `--rules`.
pub fn describe_rules() -> String {
    let mut out = String::new();
    for rule in IDENTITY_RULES {
        let ids: Vec<String> = rule.event_ids.iter().map(u32::to_string).collect();
        out.push_str(&format!(
            "{:<9} {:<18} -> {}\n",
            rule.log_source,
            ids.join(", "),
            rule.category
        ));
    }
    for rule in LEVEL_RULES {
        out.push_str(&format!(
            "{:<9} {:<18} -> {}\n",
            "any",
            format!("level {}", rule.level),
            rule.category
        ));
    }
    out
}
