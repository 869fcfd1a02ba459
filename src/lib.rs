//! **outputctl**: an interactive client for wlroots output management.
//!
//! The client mirrors every output (a *head*) and its supported modes as
//! announced by the compositor over `zwlr_output_manager_v1`, prints them,
//! and changes them through atomic configuration transactions.
//!
//! # Architecture
//!
//! The crate is organised around three capability traits:
//!
//! * [`traits::ObjectRelease`] releases the protocol handles of heads and
//!   modes the registry destroys.
//! * [`traits::OutputConfigurator`] carries the outbound requests of a
//!   configuration transaction, so the transaction logic is not coupled to
//!   a live connection.
//! * [`traits::CommandSource`] abstracts where command lines come from
//!   (stdin, a pipe, a test cursor).
//!
//! The core ([`registry`], [`command`], [`transaction`], [`controller`]) is
//! pure and fully testable without a compositor.  The concrete transport
//! lives in [`wayland`] behind the `wayland` feature.

pub mod command;
pub mod config;
pub mod controller;
pub mod error;
pub mod input;
pub mod logging;
pub mod monitor;
pub mod output;
pub mod registry;
pub mod traits;
pub mod transaction;

#[cfg(feature = "wayland")]
pub mod wayland;

#[cfg(test)]
mod testing;
