//! Read-back of the persisted event log for the `monitor` command.
//!
//! Every log line starts with a bracketed timestamp,
//! `[2024-05-01::12:30:00]  [EVENT]  ...`.  Timestamps use a fixed-width,
//! most-significant-first format, so lexicographic comparison orders them
//! chronologically and a period query is a plain string range.

use std::io::{self, BufRead, Write};

/// Which log lines a `monitor` command selects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogQuery {
    /// Every line.
    All,
    /// Lines stamped exactly with this timestamp.
    Single(String),
    /// Lines stamped within `from..=to`.
    Period { from: String, to: String },
}

impl LogQuery {
    pub fn matches(&self, line: &str) -> bool {
        match self {
            LogQuery::All => true,
            LogQuery::Single(at) => timestamp_of(line) == Some(at.as_str()),
            LogQuery::Period { from, to } => match timestamp_of(line) {
                Some(ts) => ts >= from.as_str() && ts <= to.as_str(),
                None => false,
            },
        }
    }
}

/// Extract the leading `[...]` timestamp of a log line.
pub fn timestamp_of(line: &str) -> Option<&str> {
    let rest = line.strip_prefix('[')?;
    let end = rest.find(']')?;
    Some(&rest[..end])
}

/// Copy the lines of `log` selected by `query` into `out`.
///
/// Returns the number of lines written.
pub fn filter_log<R: BufRead, W: Write>(log: R, query: &LogQuery, out: &mut W) -> io::Result<usize> {
    let mut written = 0;
    for line in log.lines() {
        let line = line?;
        if query.matches(&line) {
            writeln!(out, "{}", line)?;
            written += 1;
        }
    }
    Ok(written)
}
