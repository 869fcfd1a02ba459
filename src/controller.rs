//! The orchestrator that ties the registry, the parser and the transaction
//! engine together.
//!
//! [`OutputController`] owns the [`OutputRegistry`] and at most one pending
//! [`Transaction`].  It reacts to parsed [`Command`]s by printing listings,
//! reading the event log, or staging and submitting configurations through
//! the [`OutputConfigurator`] trait.  Outcomes arrive later through
//! [`on_outcome`](OutputController::on_outcome), correlated by
//! configuration id.

use crate::command::{self, Command};
use crate::error::CommandError;
use crate::logging::RESULT;
use crate::monitor::{filter_log, LogQuery};
use crate::output::ConfigurationId;
use crate::registry::OutputRegistry;
use crate::traits::{ObjectRelease, OutputConfigurator};
use crate::transaction::{stage, Outcome, Target, Transaction, TransactionError};
use log::{debug, info, warn};
use std::fs::File;
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};

/// Possible errors from the controller.
#[derive(Debug, thiserror::Error)]
pub enum ControllerError {
    /// A configuration is still waiting for its outcome.
    #[error("a configuration is already pending")]
    TransactionPending,
    /// No snapshot-complete signal has been seen yet.
    #[error("output state not yet known")]
    NoSnapshot,
    /// An outcome arrived for a configuration that is not pending.
    #[error("no pending configuration {0}")]
    UnknownConfiguration(ConfigurationId),
    #[error(transparent)]
    Command(#[from] CommandError),
    #[error("transaction error: {0}")]
    Transaction(#[from] TransactionError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ControllerError {
    /// The stable command error, if this failure has one.
    pub fn command_error(&self) -> Option<CommandError> {
        match self {
            ControllerError::Command(e) => Some(*e),
            _ => None,
        }
    }
}

/// What handling a command produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reply {
    /// The listing of this many heads was written.
    Listed(usize),
    /// A configuration was submitted; its outcome is still to come.
    Submitted(ConfigurationId),
    /// This many log lines were written.
    Monitored(usize),
    /// The read loop should stop.
    Exit,
}

/// Owns the output state and the single in-flight configuration.
#[derive(Debug)]
pub struct OutputController {
    registry: OutputRegistry,
    pending: Option<Transaction>,
    last_outcome: Option<(ConfigurationId, Outcome)>,
    log_path: PathBuf,
}

impl OutputController {
    /// `log_path` is the event log read by the `monitor` command.
    pub fn new(log_path: impl Into<PathBuf>) -> Self {
        Self {
            registry: OutputRegistry::new(),
            pending: None,
            last_outcome: None,
            log_path: log_path.into(),
        }
    }

    pub fn registry(&self) -> &OutputRegistry {
        &self.registry
    }

    /// Mutable access for the transport's event handlers.
    pub fn registry_mut(&mut self) -> &mut OutputRegistry {
        &mut self.registry
    }

    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    /// Parse a raw command line against the current snapshot.
    pub fn parse(&self, line: &str) -> Result<Command, CommandError> {
        command::parse(line, &self.registry)
    }

    pub fn pending(&self) -> Option<&Transaction> {
        self.pending.as_ref()
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Process a single [`Command`].
    ///
    /// Listings and log read-back are written to `out`.  Configuration
    /// commands return [`Reply::Submitted`]; the caller then drives the
    /// transport until [`on_outcome`](Self::on_outcome) has been called.
    pub fn handle<C: OutputConfigurator, W: Write>(
        &mut self,
        cmd: Command,
        c: &mut C,
        out: &mut W,
    ) -> Result<Reply, ControllerError> {
        match cmd {
            Command::ListOutputs => {
                info!("list outputs");
                let mut n = 0;
                for head in self.registry.heads() {
                    write!(out, "{}", head)?;
                    n += 1;
                }
                out.flush()?;
                Ok(Reply::Listed(n))
            }

            Command::SetOutput(request) => {
                info!("set output {}", request.head);
                self.begin(c, Target::Change(&request))
            }

            Command::EnableOutput(head) => {
                info!("enable output {}", head);
                self.begin(c, Target::Enable(head))
            }

            Command::DisableOutput(head) => {
                info!("disable output {}", head);
                self.begin(c, Target::Disable(head))
            }

            Command::Monitor(query) => {
                info!("monitor {:?}", query);
                let n = self.read_log(&query, out)?;
                Ok(Reply::Monitored(n))
            }

            Command::Exit => {
                info!("exit");
                Ok(Reply::Exit)
            }
        }
    }

    fn read_log<W: Write>(&self, query: &LogQuery, out: &mut W) -> Result<usize, ControllerError> {
        let file = File::open(&self.log_path).map_err(|e| {
            warn!("cannot open {}: {}", self.log_path.display(), e);
            CommandError::LogFileError
        })?;
        let n = filter_log(BufReader::new(file), query, out)?;
        out.flush()?;
        Ok(n)
    }

    /// Open, stage and submit one configuration.
    fn begin<C: OutputConfigurator>(
        &mut self,
        c: &mut C,
        target: Target<'_>,
    ) -> Result<Reply, ControllerError> {
        if self.pending.is_some() {
            return Err(ControllerError::TransactionPending);
        }
        let serial = self.registry.serial().ok_or(ControllerError::NoSnapshot)?;

        let mut txn = Transaction::open(c, serial)?;
        let staged = stage(&mut txn, c, &self.registry, target).and_then(|()| txn.submit(c));
        if let Err(e) = staged {
            txn.abandon(c);
            return Err(e.into());
        }

        let id = txn.id();
        self.pending = Some(txn);
        Ok(Reply::Submitted(id))
    }

    /// Deliver the compositor's answer for configuration `id`.
    pub fn on_outcome<C: OutputConfigurator>(
        &mut self,
        id: ConfigurationId,
        outcome: Outcome,
        c: &mut C,
    ) -> Result<Outcome, ControllerError> {
        let mut txn = match self.pending.take() {
            Some(txn) if txn.id() == id => txn,
            other => {
                self.pending = other;
                warn!("outcome {} for unknown {}", outcome, id);
                return Err(ControllerError::UnknownConfiguration(id));
            }
        };
        txn.resolve(outcome, c)?;
        info!(target: RESULT, "{} {}", id, outcome);
        self.last_outcome = Some((id, outcome));
        Ok(outcome)
    }

    /// Take the most recent outcome, if one arrived since the last call.
    pub fn take_outcome(&mut self) -> Option<(ConfigurationId, Outcome)> {
        self.last_outcome.take()
    }

    /// Destroy any pending configuration and release every handle.
    pub fn shutdown<C: OutputConfigurator + ObjectRelease>(&mut self, c: &mut C) {
        if let Some(txn) = self.pending.take() {
            txn.abandon(c);
        }
        debug!("releasing {} head(s)", self.registry.len());
        self.registry.clear(c);
    }
}

//  Tests
