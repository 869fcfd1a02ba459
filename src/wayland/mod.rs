//! Wayland transport for the `wlr-output-management` protocol.
//!
//! This module is the only place that touches protocol objects.  It feeds
//! discovery events into the [`OutputRegistry`](crate::registry::OutputRegistry),
//! implements [`OutputConfigurator`](crate::traits::OutputConfigurator) and
//! [`ObjectRelease`](crate::traits::ObjectRelease) on top of the live
//! proxies, and drives the event queue for the read loop.
//!
//! Every event received is logged with the [`EVENT`](crate::logging::EVENT)
//! target and every request sent with [`REQUEST`](crate::logging::REQUEST).

pub mod client;
pub mod dispatch;
pub mod proxies;
pub mod transport;

pub use client::WaylandClient;

/// Errors from the Wayland transport.
#[derive(Debug, thiserror::Error)]
pub enum WaylandError {
    #[error("cannot connect to the Wayland display: {0}")]
    Connect(#[from] wayland_client::ConnectError),
    #[error("event dispatch failed: {0}")]
    Dispatch(#[from] wayland_client::DispatchError),
    #[error("connection error: {0}")]
    Backend(#[from] wayland_client::backend::WaylandError),
    #[error("compositor does not support zwlr_output_manager_v1")]
    NoOutputManager,
    #[error("output manager is gone")]
    ManagerGone,
    #[error("no live proxy for {0}")]
    UnknownObject(String),
    #[error("{request} needs protocol version {since}, object has {version}")]
    Unsupported {
        request: &'static str,
        version: u32,
        since: u32,
    },
}
