//! Command sources that feed raw command lines to the read loop.
//!
//! The interactive shell reads stdin through [`lines::LineSource`]; scripts
//! can pipe commands the same way.

pub mod lines;
