//! Line-oriented [`CommandSource`] over any buffered reader.
//!
//! In production the reader is stdin; every line typed at the prompt is
//! forwarded as one raw command.  Lines are not parsed here because parsing
//! needs the output registry, which lives on the Wayland thread.

use crate::traits::CommandSource;
use log::{debug, info};
use std::io::BufRead;
use std::sync::mpsc;

/// A [`CommandSource`] that forwards each line of a reader.
///
/// The source ends at end of input, or as soon as the receiving side of the
/// channel has gone away.
pub struct LineSource<R> {
    reader: R,
    name: &'static str,
}

/// Errors produced by the line source.
#[derive(Debug, thiserror::Error)]
pub enum LineSourceError {
    #[error("read error on {name}: {source}")]
    Read {
        name: &'static str,
        #[source]
        source: std::io::Error,
    },
}

impl<R: BufRead + Send> LineSource<R> {
    /// `name` only appears in log messages.
    pub fn new(reader: R, name: &'static str) -> Self {
        Self { reader, name }
    }
}

impl LineSource<std::io::BufReader<std::io::Stdin>> {
    pub fn stdin() -> Self {
        Self::new(std::io::BufReader::new(std::io::stdin()), "stdin")
    }
}

impl<R: BufRead + Send> CommandSource for LineSource<R> {
    type Error = LineSourceError;

    /// Forward lines until end of input.
    ///
    /// This method **blocks**.  Run it on a dedicated thread.
    fn run(&mut self, sink: mpsc::Sender<String>) -> Result<(), Self::Error> {
        let mut line = String::new();
        loop {
            line.clear();
            let n = self
                .reader
                .read_line(&mut line)
                .map_err(|source| LineSourceError::Read {
                    name: self.name,
                    source,
                })?;
            if n == 0 {
                info!("end of input on {}", self.name);
                return Ok(());
            }
            let text = line.trim_end_matches(['\n', '\r']).to_string();
            debug!("received {:?}", text);
            if sink.send(text).is_err() {
                info!("sink closed, shutting down {}", self.name);
                return Ok(());
            }
        }
    }
}

//  Tests
