//! Commands understood by the projector.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A command sent to the projector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Command {
    /// Query the power state.
    GetPower,
    /// Power on. Only accepted from [`PowerState::Off`](crate::PowerState::Off).
    PowerOn,
    /// Power off, as if the remote's power-off button was pressed.
    PowerOff,
}

impl Command {
    /// Line terminator appended to every command.
    pub const TERMINATOR: &'static str = "\r\n";

    /// The exact protocol string, without terminator.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::GetPower => "GET POWER",
            Self::PowerOn => "POWER ON",
            Self::PowerOff => "RC POWER_OFF",
        }
    }

    /// The bytes written to the wire.
    pub fn frame(&self) -> Vec<u8> {
        format!("{}{}", self.as_str(), Self::TERMINATOR).into_bytes()
    }

    /// Whether sending this command changes the projector's state.
    pub const fn is_query(&self) -> bool {
        matches!(self, Self::GetPower)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
