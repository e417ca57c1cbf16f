//! Value types for the projector protocol.

mod command;
mod power;

pub use command::Command;
pub use power::{PowerReading, PowerState};
