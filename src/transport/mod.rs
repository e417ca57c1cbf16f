//! Command/response exchange with the projector.
//!
//! The [`Transport`] trait is the only thing the controller needs from the
//! link: write one command, hand back whatever the projector answered.
//! [`SerialTransport`] is the real RS-232 implementation; tests drive the
//! controller through a scripted one instead.

use std::future::Future;

use crate::errors::Error;
use crate::types::Command;

mod serial;

pub use serial::SerialTransport;

/// Sends commands to the projector and collects its replies.
///
/// A transport is owned by exactly one controller. Nothing here is locked,
/// so interleaving calls from several tasks would interleave commands on
/// the wire.
pub trait Transport: Send {
    /// Send `command` and return the raw reply, terminators included.
    ///
    /// The reply may be empty or partial when the projector is slow. Failures
    /// to reach the device are returned as [`Error::Transport`] and are not
    /// retried.
    fn send(&mut self, command: Command) -> impl Future<Output = Result<String, Error>> + Send;

    /// A human-readable name for the link, used in log messages.
    fn name(&self) -> &str;
}
