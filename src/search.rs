//! Bounded recursive regex search over a directory tree.

use std::fmt;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use regex::Regex;
use serde::Serialize;
use walkdir::{DirEntry, WalkDir};

/// Hard upper bound on matches returned by a single search.
pub const MAX_MATCHES: usize = 20;

#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("Invalid regex pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}

/// One matching line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Match {
    /// Path relative to the search root.
    pub path: String,
    /// 1-based line number.
    pub line: usize,
    /// Line text with surrounding whitespace trimmed.
    pub snippet: String,
}

impl fmt::Display for Match {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}: {}", self.path, self.line, self.snippet)
    }
}

/// Search every regular, non-hidden UTF-8 file under `root` for lines matching
/// `pattern`, returning at most [`MAX_MATCHES`] results.
///
/// Entries are visited depth-first in file-name order, so the output is
/// stable for an unchanged tree. Hidden directories are still walked; only
/// entries whose own name starts with `.` are skipped. Symlinks to regular
/// files are read, symlinked directories are not descended. Unreadable or
/// non-UTF-8 files are skipped. An empty pattern short-circuits to an empty
/// result.
pub fn search(pattern: &str, root: &Path) -> Result<Vec<Match>, SearchError> {
    search_until(pattern, root, &AtomicBool::new(false))
}

/// [`search`] that stops early, with the matches found so far, once `cancel`
/// is set.
pub fn search_until(
    pattern: &str,
    root: &Path,
    cancel: &AtomicBool,
) -> Result<Vec<Match>, SearchError> {
    if pattern.is_empty() {
        return Ok(Vec::new());
    }

    let regex = Regex::new(pattern)?;
    let mut matches = Vec::new();

    for entry in WalkDir::new(root).sort_by_file_name() {
        if matches.len() >= MAX_MATCHES || cancel.load(Ordering::Relaxed) {
            break;
        }

        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                tracing::debug!("skipping unreadable entry: {e}");
                continue;
            }
        };

        if entry.depth() > 0 && is_hidden(&entry) {
            continue;
        }

        // Follows symlinks, unlike `entry.file_type()`.
        if !entry.path().is_file() {
            continue;
        }

        let text = match std::fs::read(entry.path()).map(String::from_utf8) {
            Ok(Ok(text)) => text,
            Ok(Err(_)) => continue,
            Err(e) => {
                tracing::debug!("skipping {}: {e}", entry.path().display());
                continue;
            }
        };

        let rel = entry
            .path()
            .strip_prefix(root)
            .unwrap_or(entry.path())
            .to_string_lossy()
            .into_owned();

        scan_lines(&regex, &rel, &text, cancel, &mut matches);
    }

    Ok(matches)
}

fn scan_lines(
    regex: &Regex,
    rel: &str,
    text: &str,
    cancel: &AtomicBool,
    matches: &mut Vec<Match>,
) {
    for (idx, line) in split_lines(text).into_iter().enumerate() {
        if matches.len() >= MAX_MATCHES || cancel.load(Ordering::Relaxed) {
            return;
        }
        if regex.is_match(line) {
            matches.push(Match {
                path: rel.to_string(),
                line: idx + 1,
                snippet: line.trim().to_string(),
            });
        }
    }
}

/// Split on every line boundary `\n`, `\r\n`, `\r`, `\x0b`, `\x0c`,
/// `\x1c`-`\x1e`, `\u{85}`, `\u{2028}` and `\u{2029}`. A trailing boundary does
/// not produce an empty final line.
pub fn split_lines(text: &str) -> Vec<&str> {
    let mut lines = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        if !is_line_break(c) {
            continue;
        }
        lines.push(&text[start..i]);
        start = i + c.len_utf8();
        if c == '\r' {
            if let Some(&(j, '\n')) = chars.peek() {
                chars.next();
                start = j + 1;
            }
        }
    }

    if start < text.len() {
        lines.push(&text[start..]);
    }
    lines
}

fn is_line_break(c: char) -> bool {
    matches!(
        c,
        '\n' | '\r' | '\x0b' | '\x0c' | '\x1c' | '\x1d' | '\x1e' | '\u{85}' | '\u{2028}' | '\u{2029}'
    )
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.file_name().to_string_lossy().starts_with('.')
}
