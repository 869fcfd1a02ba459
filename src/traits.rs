//! Capability traits that decouple outputctl from the Wayland transport.
//!
//! The registry, the transaction engine and the controller only talk to the
//! compositor through these seams.  The production implementation lives in
//! [`wayland`](crate::wayland); the tests use recording doubles.

use crate::output::{ConfigurationId, CustomMode, Fixed, HeadId, ModeId, Position, Transform};
use std::sync::mpsc;

/// Releases the protocol handles of destroyed heads and modes.
///
/// The registry calls this exactly once per entity it destroys, always
/// releasing a head's modes before the head itself.
pub trait ObjectRelease {
    fn release_mode(&mut self, mode: ModeId);
    fn release_head(&mut self, head: HeadId);
}

/// One property change issued into a per-head configuration scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeadChange {
    Mode(ModeId),
    CustomMode(CustomMode),
    Position(Position),
    Transform(Transform),
    Scale(Fixed),
    AdaptiveSync(bool),
}

impl HeadChange {
    /// The property slot this change occupies.  `Mode` and `CustomMode`
    /// share a slot because a head can only be given one of them.
    pub fn slot(&self) -> &'static str {
        match self {
            HeadChange::Mode(_) | HeadChange::CustomMode(_) => "mode",
            HeadChange::Position(_) => "position",
            HeadChange::Transform(_) => "transform",
            HeadChange::Scale(_) => "scale",
            HeadChange::AdaptiveSync(_) => "adaptive_sync",
        }
    }
}

/// Outbound requests of a configuration transaction.
///
/// An implementation forwards each call to the compositor.  It does not
/// enforce sequencing; [`Transaction`](crate::transaction::Transaction)
/// does.
pub trait OutputConfigurator {
    /// The error type produced by this configurator.
    type Error: std::error::Error + Send + 'static;

    /// Create a configuration object against snapshot `serial`.
    fn create_configuration(&mut self, serial: u32) -> Result<ConfigurationId, Self::Error>;

    /// Enable `head` in `config`, opening its per-head change scope.
    fn enable_head(&mut self, config: ConfigurationId, head: HeadId) -> Result<(), Self::Error>;

    fn disable_head(&mut self, config: ConfigurationId, head: HeadId) -> Result<(), Self::Error>;

    /// Issue one property change into the scope opened by
    /// [`enable_head`](OutputConfigurator::enable_head).
    fn configure_head(
        &mut self,
        config: ConfigurationId,
        head: HeadId,
        change: HeadChange,
    ) -> Result<(), Self::Error>;

    /// Submit the configuration as a single message.
    fn apply(&mut self, config: ConfigurationId) -> Result<(), Self::Error>;

    /// Destroy the configuration object and every per-head scope in it.
    fn destroy_configuration(&mut self, config: ConfigurationId);
}

//  Command Source

/// A source of raw command lines.
///
/// Lines are forwarded unparsed: parsing needs the live output registry,
/// which only the thread owning the Wayland connection may read.
///
/// # Contract
///
/// * [`run`](CommandSource::run) **blocks** until the source is exhausted or
///   an unrecoverable error occurs.
/// * Each received line is sent through `sink` exactly once, without its
///   line terminator.
/// * Implementations must be [`Send`] so they can run on a dedicated thread.
pub trait CommandSource: Send {
    /// The error type produced by this source.
    type Error: std::error::Error + Send + 'static;

    fn run(&mut self, sink: mpsc::Sender<String>) -> Result<(), Self::Error>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_and_custom_mode_share_a_slot() {
        let named = HeadChange::Mode(ModeId(3));
        let custom = HeadChange::CustomMode(CustomMode {
            width: 800,
            height: 600,
            refresh: 60000,
        });
        assert_eq!(named.slot(), custom.slot());
        assert_ne!(named.slot(), HeadChange::Scale(Fixed::ONE).slot());
    }
}
