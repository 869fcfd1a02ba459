//! Event-log setup.
//!
//! Everything goes through the `log` facade.  [`init`] installs `env_logger`
//! with its output piped into an append-only file, one record per line:
//!
//! ```text
//! [2024-05-01::12:30:00]  [EVENT]  zwlr_output_head_v1.name head#3 "eDP-1"
//! ```
//!
//! Protocol traffic and command results are tagged with the [`EVENT`],
//! [`REQUEST`] and [`RESULT`] targets and get their own labels; all other
//! records are labelled with their level.

use crate::config::LogConfig;
use chrono::Local;
use log::Level;
use std::fmt;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Target for protocol events received from the compositor.
pub const EVENT: &str = "event";
/// Target for protocol requests sent to the compositor.
pub const REQUEST: &str = "request";
/// Target for command result codes and configuration outcomes.
pub const RESULT: &str = "result";

/// `strftime` format of the leading timestamp.  Fixed width and most
/// significant field first, so timestamps sort as strings.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d::%H:%M:%S";

#[derive(Debug, thiserror::Error)]
pub enum LogSetupError {
    #[error("cannot open log file {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("logger already installed: {0}")]
    Install(#[from] log::SetLoggerError),
}

/// The bracketed label written for a record.
pub fn level_label(target: &str, level: Level) -> &'static str {
    match target {
        EVENT => "EVENT",
        REQUEST => "REQUEST",
        RESULT => "RESULT",
        _ => match level {
            Level::Error => "ERROR",
            Level::Warn => "WARN",
            Level::Info => "INFO",
            Level::Debug => "DEBUG",
            Level::Trace => "TRACE",
        },
    }
}

/// Write one log line.
pub fn write_line<W: Write + ?Sized>(
    out: &mut W,
    timestamp: impl fmt::Display,
    label: &str,
    message: &fmt::Arguments<'_>,
) -> io::Result<()> {
    writeln!(out, "[{}]  [{}]  {}", timestamp, label, message)
}

/// Install the logger, appending to the configured file.
///
/// `RUST_LOG` overrides the configured filter.  Returns the path of the log
/// file so the `monitor` command can read it back.
pub fn init(config: &LogConfig, cwd: &Path) -> Result<PathBuf, LogSetupError> {
    let path = config.resolve_path(cwd);
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .map_err(|source| LogSetupError::Open {
            path: path.clone(),
            source,
        })?;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(config.filter.as_str()))
        .format(|buf, record| {
            write_line(
                buf,
                Local::now().format(TIMESTAMP_FORMAT),
                level_label(record.target(), record.level()),
                record.args(),
            )
        })
        .target(env_logger::Target::Pipe(Box::new(file)))
        .try_init()?;

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitor::timestamp_of;
    use chrono::NaiveDate;

    #[test]
    fn labels() {
        assert_eq!(level_label(EVENT, Level::Info), "EVENT");
        assert_eq!(level_label(REQUEST, Level::Debug), "REQUEST");
        assert_eq!(level_label(RESULT, Level::Warn), "RESULT");
        assert_eq!(level_label("outputctl::registry", Level::Warn), "WARN");
        assert_eq!(level_label("outputctl", Level::Info), "INFO");
    }

    #[test]
    fn line_layout_is_readable_by_monitor() {
        let stamp = NaiveDate::from_ymd_opt(2024, 5, 1)
            .and_then(|d| d.and_hms_opt(12, 30, 0))
            .unwrap()
            .format(TIMESTAMP_FORMAT);

        let mut out = Vec::new();
        write_line(&mut out, stamp, "EVENT", &format_args!("head {}", 3)).unwrap();
        let line = String::from_utf8(out).unwrap();

        assert_eq!(line, "[2024-05-01::12:30:00]  [EVENT]  head 3\n");
        assert_eq!(timestamp_of(&line), Some("2024-05-01::12:30:00"));
    }

    #[test]
    fn init_reports_unopenable_file() {
        let config = LogConfig {
            path: Some("/nonexistent-outputctl-dir/log.txt".into()),
            ..Default::default()
        };
        let err = init(&config, Path::new("/")).unwrap_err();
        assert!(matches!(err, LogSetupError::Open { .. }));
    }
}
