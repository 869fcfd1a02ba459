//! Atomic output configuration transactions.
//!
//! A [`Transaction`] walks the state machine
//!
//! ```text
//! Open ──submit──▶ Submitted ──outcome──▶ Succeeded | Failed | Cancelled
//! ```
//!
//! While `Open`, heads are enabled (opening a per-head [`HeadConfig`] scope)
//! or disabled, each at most once.  Inside a scope every property slot can
//! be written at most once, and a named mode and a custom mode share one
//! slot.  After `submit` nothing more may be issued; the compositor answers
//! with exactly one [`Outcome`] and the configuration object is destroyed.
//! There is no retry in place: a retry is a new transaction opened against
//! a fresh snapshot.

use crate::command::{ChangeRequest, ModeChange};
use crate::output::{ConfigurationId, CustomMode, Fixed, Head, HeadId, ModeId, Position, Transform};
use crate::registry::OutputRegistry;
use crate::traits::{HeadChange, OutputConfigurator};
use log::{debug, info};
use std::fmt;

/// Lifecycle position of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionState {
    Open,
    Submitted,
    Succeeded,
    Failed,
    Cancelled,
}

impl TransactionState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            TransactionState::Succeeded | TransactionState::Failed | TransactionState::Cancelled
        )
    }
}

/// The compositor's answer to a submitted configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The change was applied.
    Succeeded,
    /// The compositor rejected the change; nothing was applied.
    Failed,
    /// The configuration went stale before it could be applied.  Re-read
    /// the outputs and try again.
    Cancelled,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Outcome::Succeeded => "succeeded",
            Outcome::Failed => "failed",
            Outcome::Cancelled => "cancelled",
        })
    }
}

impl From<Outcome> for TransactionState {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Succeeded => TransactionState::Succeeded,
            Outcome::Failed => TransactionState::Failed,
            Outcome::Cancelled => TransactionState::Cancelled,
        }
    }
}

/// Possible errors while building or resolving a transaction.
#[derive(Debug, thiserror::Error)]
pub enum TransactionError {
    #[error("{id} is {state:?}, no further requests may be issued")]
    NotOpen {
        id: ConfigurationId,
        state: TransactionState,
    },
    #[error("{0} has not been submitted")]
    NotSubmitted(ConfigurationId),
    #[error("{0} is already configured in this transaction")]
    HeadAlreadyConfigured(HeadId),
    #[error("{field} already set for {head}")]
    AlreadySet { head: HeadId, field: &'static str },
    #[error("{0} is not in the current snapshot")]
    UnknownHead(HeadId),
    #[error("{mode} is no longer advertised by {head}")]
    UnknownMode { head: HeadId, mode: ModeId },
    #[error("{0} is not enabled")]
    HeadDisabled(HeadId),
    #[error("transport error: {0}")]
    Transport(String),
}

fn transport<E: std::error::Error>(e: E) -> TransactionError {
    TransactionError::Transport(e.to_string())
}

/// One atomic configuration request against a snapshot serial.
#[derive(Debug)]
pub struct Transaction {
    id: ConfigurationId,
    serial: u32,
    state: TransactionState,
    configured: Vec<HeadId>,
}

impl Transaction {
    /// Create the configuration object for snapshot `serial`.
    pub fn open<C: OutputConfigurator>(c: &mut C, serial: u32) -> Result<Self, TransactionError> {
        let id = c.create_configuration(serial).map_err(transport)?;
        debug!("{} opened against serial {}", id, serial);
        Ok(Self {
            id,
            serial,
            state: TransactionState::Open,
            configured: Vec::new(),
        })
    }

    pub fn id(&self) -> ConfigurationId {
        self.id
    }

    pub fn serial(&self) -> u32 {
        self.serial
    }

    pub fn state(&self) -> TransactionState {
        self.state
    }

    /// Heads enabled or disabled so far, in request order.
    pub fn configured_heads(&self) -> &[HeadId] {
        &self.configured
    }

    fn ensure_open(&self) -> Result<(), TransactionError> {
        if self.state == TransactionState::Open {
            Ok(())
        } else {
            Err(TransactionError::NotOpen {
                id: self.id,
                state: self.state,
            })
        }
    }

    fn claim(&mut self, head: HeadId) -> Result<(), TransactionError> {
        self.ensure_open()?;
        if self.configured.contains(&head) {
            return Err(TransactionError::HeadAlreadyConfigured(head));
        }
        self.configured.push(head);
        Ok(())
    }

    /// Enable `head` and open its change scope.
    pub fn enable_head<'c, C: OutputConfigurator>(
        &mut self,
        c: &'c mut C,
        head: HeadId,
    ) -> Result<HeadConfig<'c, C>, TransactionError> {
        self.claim(head)?;
        c.enable_head(self.id, head).map_err(transport)?;
        Ok(HeadConfig {
            config: self.id,
            head,
            configurator: c,
            written: Vec::new(),
        })
    }

    pub fn disable_head<C: OutputConfigurator>(
        &mut self,
        c: &mut C,
        head: HeadId,
    ) -> Result<(), TransactionError> {
        self.claim(head)?;
        c.disable_head(self.id, head).map_err(transport)
    }

    /// Send the whole configuration to the compositor.
    pub fn submit<C: OutputConfigurator>(&mut self, c: &mut C) -> Result<(), TransactionError> {
        self.ensure_open()?;
        c.apply(self.id).map_err(transport)?;
        self.state = TransactionState::Submitted;
        info!("{} submitted ({} head(s))", self.id, self.configured.len());
        Ok(())
    }

    /// Record the compositor's answer and destroy the configuration object.
    pub fn resolve<C: OutputConfigurator>(
        &mut self,
        outcome: Outcome,
        c: &mut C,
    ) -> Result<Outcome, TransactionError> {
        if self.state != TransactionState::Submitted {
            return Err(TransactionError::NotSubmitted(self.id));
        }
        self.state = outcome.into();
        c.destroy_configuration(self.id);
        Ok(outcome)
    }

    /// Throw away a transaction that was never submitted.
    pub fn abandon<C: OutputConfigurator>(self, c: &mut C) {
        debug!("{} abandoned in state {:?}", self.id, self.state);
        c.destroy_configuration(self.id);
    }
}

/// The per-head change scope opened by [`Transaction::enable_head`].
#[derive(Debug)]
pub struct HeadConfig<'c, C: OutputConfigurator> {
    config: ConfigurationId,
    head: HeadId,
    configurator: &'c mut C,
    written: Vec<&'static str>,
}

impl<C: OutputConfigurator> HeadConfig<'_, C> {
    fn issue(&mut self, change: HeadChange) -> Result<(), TransactionError> {
        let slot = change.slot();
        if self.written.contains(&slot) {
            return Err(TransactionError::AlreadySet {
                head: self.head,
                field: slot,
            });
        }
        self.configurator
            .configure_head(self.config, self.head, change)
            .map_err(transport)?;
        self.written.push(slot);
        Ok(())
    }

    pub fn set_mode(&mut self, mode: ModeId) -> Result<(), TransactionError> {
        self.issue(HeadChange::Mode(mode))
    }

    pub fn set_custom_mode(&mut self, mode: CustomMode) -> Result<(), TransactionError> {
        self.issue(HeadChange::CustomMode(mode))
    }

    pub fn set_position(&mut self, position: Position) -> Result<(), TransactionError> {
        self.issue(HeadChange::Position(position))
    }

    pub fn set_transform(&mut self, transform: Transform) -> Result<(), TransactionError> {
        self.issue(HeadChange::Transform(transform))
    }

    pub fn set_scale(&mut self, scale: Fixed) -> Result<(), TransactionError> {
        self.issue(HeadChange::Scale(scale))
    }

    pub fn set_adaptive_sync(&mut self, enabled: bool) -> Result<(), TransactionError> {
        self.issue(HeadChange::AdaptiveSync(enabled))
    }
}

//  Staging

/// What a transaction is meant to change.
#[derive(Debug, Clone, Copy)]
pub enum Target<'a> {
    /// Apply a change request to an enabled head.
    Change(&'a ChangeRequest),
    /// Turn a head on.
    Enable(HeadId),
    /// Turn a head off.
    Disable(HeadId),
}

impl Target<'_> {
    pub fn head(&self) -> HeadId {
        match self {
            Target::Change(req) => req.head,
            Target::Enable(id) | Target::Disable(id) => *id,
        }
    }
}

/// Fill an open transaction with a configuration for every head in the
/// snapshot.
///
/// The protocol requires every head to be either enabled or disabled in a
/// configuration.  Heads other than the target keep their current enabled
/// state and receive no property changes.
pub fn stage<C: OutputConfigurator>(
    txn: &mut Transaction,
    c: &mut C,
    registry: &OutputRegistry,
    target: Target<'_>,
) -> Result<(), TransactionError> {
    let target_id = target.head();
    if registry.head(target_id).is_none() {
        return Err(TransactionError::UnknownHead(target_id));
    }

    for head in registry.heads() {
        if head.id != target_id {
            if head.enabled {
                txn.enable_head(c, head.id)?;
            } else {
                txn.disable_head(c, head.id)?;
            }
            continue;
        }
        match target {
            Target::Change(request) => {
                if !head.enabled {
                    return Err(TransactionError::HeadDisabled(head.id));
                }
                let mut scope = txn.enable_head(c, head.id)?;
                apply_request(&mut scope, head, request)?;
            }
            Target::Enable(_) => {
                let mut scope = txn.enable_head(c, head.id)?;
                if head.current_mode.is_none() {
                    let fallback = head
                        .modes
                        .iter()
                        .find(|m| m.preferred)
                        .or_else(|| head.modes.first());
                    if let Some(mode) = fallback {
                        scope.set_mode(mode.id)?;
                    }
                }
            }
            Target::Disable(_) => txn.disable_head(c, head.id)?,
        }
    }
    Ok(())
}

fn apply_request<C: OutputConfigurator>(
    scope: &mut HeadConfig<'_, C>,
    head: &Head,
    request: &ChangeRequest,
) -> Result<(), TransactionError> {
    match request.mode {
        Some(ModeChange::Advertised(mode)) => {
            if head.mode(mode).is_none() {
                return Err(TransactionError::UnknownMode {
                    head: head.id,
                    mode,
                });
            }
            scope.set_mode(mode)?;
        }
        Some(ModeChange::Custom(custom)) => scope.set_custom_mode(custom)?,
        None => {}
    }
    if let Some(position) = request.position {
        scope.set_position(position)?;
    }
    if let Some(transform) = request.transform {
        scope.set_transform(transform)?;
    }
    if let Some(scale) = request.scale {
        scope.set_scale(scale)?;
    }
    if let Some(enabled) = request.adaptive_sync {
        scope.set_adaptive_sync(enabled)?;
    }
    Ok(())
}
