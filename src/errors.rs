use crate::types::{Command, PowerReading};

/// All error types that can occur when talking to the projector.
///
/// An unrecognized reply is not an error: it parses to
/// [`PowerState::Unknown`](crate::PowerState::Unknown) and the controller
/// treats it like any other state it has to wait out.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The serial port could not be opened, written or read.
    ///
    /// `last` is the state observed just before `command` was attempted, when
    /// the failure came after a query.
    #[error(
        "serial {action} error on {port} sending {command}{}: {source}",
        observed(.last)
    )]
    Transport {
        action: String,
        port: String,
        command: Command,
        last: Option<PowerReading>,
        #[source]
        source: std::io::Error,
    },

    /// The projector never reached a state that allows the command.
    #[error("gave up on {command} after {attempts} polls; last state {last}")]
    Timeout {
        command: Command,
        attempts: u32,
        last: PowerReading,
    },
}

impl Error {
    /// Create a new transport error
    pub fn transport(
        action: &str,
        port: &str,
        command: Command,
        source: impl Into<std::io::Error>,
    ) -> Self {
        Error::Transport {
            action: action.to_string(),
            port: port.to_string(),
            command,
            last: None,
            source: source.into(),
        }
    }

    /// Attaches the state observed before the failed command.
    pub fn with_last(mut self, reading: PowerReading) -> Self {
        if let Error::Transport { last, .. } = &mut self {
            *last = Some(reading);
        }
        self
    }

    /// Whether the error came from the serial link rather than the projector.
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Transport { .. })
    }
}

fn observed(last: &Option<PowerReading>) -> String {
    match last {
        Some(reading) => format!(" (projector was {reading})"),
        None => String::new(),
    }
}
