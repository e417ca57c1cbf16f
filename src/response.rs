//! Power command outcomes.

use std::fmt;

use serde::Serialize;

use crate::types::{Command, PowerState};

/// What a power request did.
///
/// Requests that find the projector already where it should be, or in a
/// state the command cannot apply to, are not errors. They come back as
/// [`PowerResponse::Unchanged`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PowerResponse {
    /// `command` was sent after `polls` extra state queries.
    Sent { command: Command, polls: u32 },
    /// Nothing was sent; the projector was observed in `state`.
    Unchanged { state: PowerState },
}

impl PowerResponse {
    pub fn sent(command: Command, polls: u32) -> Self {
        PowerResponse::Sent { command, polls }
    }

    pub fn unchanged(state: PowerState) -> Self {
        PowerResponse::Unchanged { state }
    }

    pub fn is_sent(&self) -> bool {
        matches!(self, PowerResponse::Sent { .. })
    }
}

impl fmt::Display for PowerResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PowerResponse::Sent { command, polls: 0 } => write!(f, "sent {command}"),
            PowerResponse::Sent { command, polls } => {
                write!(f, "sent {command} after waiting {polls} polls")
            }
            PowerResponse::Unchanged {
                state: PowerState::On,
            } => f.write_str("projector is already on"),
            PowerResponse::Unchanged { state } => {
                write!(f, "nothing to do; projector is {state}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(
            PowerResponse::sent(Command::PowerOn, 0).to_string(),
            "sent POWER ON"
        );
        assert_eq!(
            PowerResponse::sent(Command::PowerOn, 3).to_string(),
            "sent POWER ON after waiting 3 polls"
        );
        assert_eq!(
            PowerResponse::unchanged(PowerState::On).to_string(),
            "projector is already on"
        );
        assert_eq!(
            PowerResponse::unchanged(PowerState::Standby).to_string(),
            "nothing to do; projector is standby"
        );
    }
}
