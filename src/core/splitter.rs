// NetSleuth - core/splitter.rs
//
// Groups a line stream into raw event blocks.
//
// A block starts at a `TimeCreated :` line and runs until a blank line, the
// next `TimeCreated :` line, or end of input. Text that accumulates without
// starting at a record marker (headers, PowerShell banners, the tail end of
// a message that contained a blank line) is discarded.
//
// Lazy: each call to `next` consumes only as many lines as needed.

use crate::util::constants::{DEBUG_MAX_LINE_PREVIEW, MAX_BLOCK_BYTES};
use regex::Regex;
use std::sync::OnceLock;

/// Matches the first line of a record.
fn record_start() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^TimeCreated\s*:").expect("record start regex"))
}

/// Returns true if `line` opens a new record.
pub fn is_record_start(line: &str) -> bool {
    record_start().is_match(line)
}

/// Counters describing one pass of the splitter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SplitStats {
    pub lines_read: usize,
    pub blocks_emitted: usize,
    pub blocks_discarded: usize,
    /// Lines dropped because their block had reached `MAX_BLOCK_BYTES`.
    pub lines_truncated: usize,
}

/// Iterator adapter turning lines into trimmed raw blocks.
pub struct BlockSplitter<I> {
    lines: I,
    current: String,
    current_truncated: bool,
    exhausted: bool,
    stats: SplitStats,
}

impl<I> BlockSplitter<I> {
    pub fn new(lines: I) -> Self {
        Self {
            lines,
            current: String::new(),
            current_truncated: false,
            exhausted: false,
            stats: SplitStats::default(),
        }
    }

    /// Counters so far. Complete once the iterator has returned `None`.
    pub fn stats(&self) -> SplitStats {
        self.stats
    }

    fn append(&mut self, line: &str) {
        if self.current.len() + line.len() + 1 > MAX_BLOCK_BYTES {
            if !self.current_truncated {
                self.current_truncated = true;
                tracing::debug!(
                    limit = MAX_BLOCK_BYTES,
                    "Block exceeds size limit; dropping further lines"
                );
            }
            self.stats.lines_truncated += 1;
            return;
        }
        self.current.push_str(line);
        self.current.push('\n');
    }

    /// Take the accumulated text. Returns it as a block only if it starts
    /// with a record marker.
    fn flush(&mut self) -> Option<String> {
        if self.current.is_empty() {
            return None;
        }
        let text = std::mem::take(&mut self.current);
        self.current_truncated = false;
        if is_record_start(&text) {
            self.stats.blocks_emitted += 1;
            Some(text.trim().to_string())
        } else {
            self.stats.blocks_discarded += 1;
            tracing::trace!(
                preview = %preview(&text),
                "Discarded text outside any record"
            );
            None
        }
    }
}

impl<I, S> Iterator for BlockSplitter<I>
where
    I: Iterator<Item = S>,
    S: AsRef<str>,
{
    type Item = String;

    fn next(&mut self) -> Option<String> {
        while !self.exhausted {
            let Some(line) = self.lines.next() else {
                self.exhausted = true;
                return self.flush();
            };
            let line = line.as_ref();
            self.stats.lines_read += 1;

            if line.trim().is_empty() {
                if let Some(block) = self.flush() {
                    return Some(block);
                }
                continue;
            }

            let ready = if is_record_start(line) {
                self.flush()
            } else {
                None
            };
            self.append(line);
            if ready.is_some() {
                return ready;
            }
        }
        None
    }
}

/// Convenience constructor over anything yielding lines.
pub fn split_blocks<L, S>(lines: L) -> BlockSplitter<L::IntoIter>
where
    L: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    BlockSplitter::new(lines.into_iter())
}

fn preview(text: &str) -> &str {
    match text.char_indices().nth(DEBUG_MAX_LINE_PREVIEW) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
