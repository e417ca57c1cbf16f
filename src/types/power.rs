//! Projector power states as reported by `GET POWER`.

use std::fmt;

use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use strum_macros::EnumIter;

/// Power state of the projector.
///
/// Parsed from the device's reply to `GET POWER` with [`PowerState::parse`].
/// The value is only ever observed, never cached: each query produces a
/// fresh one.
///
/// # Example
///
/// ```
/// use sx6000_power::PowerState;
///
/// assert_eq!(PowerState::parse("g:POWER=ON\r\n"), PowerState::On);
/// assert_eq!(PowerState::parse("g:POWER=PMM"), PowerState::Standby);
/// assert_eq!(PowerState::parse("e:0001"), PowerState::Unknown);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter)]
pub enum PowerState {
    /// Fully powered off.
    Off,
    /// Powering up from off.
    OffToOn,
    /// Running.
    On,
    /// Dropping from on into power management (standby) mode.
    OnToStandby,
    /// Power management mode.
    Standby,
    /// Waking from standby.
    StandbyToOn,
    /// Shutting down. The projector rejects `POWER ON` until this completes.
    OnToOff,
    /// The reply did not match any known state.
    Unknown,
}

impl PowerState {
    /// Prefix of every `GET POWER` reply.
    pub const REPLY_PREFIX: &'static str = "g:POWER=";

    /// Parses a raw `GET POWER` reply.
    ///
    /// Line terminators are stripped first. Any text that is not exactly
    /// [`Self::REPLY_PREFIX`] followed by a known token is [`PowerState::Unknown`].
    pub fn parse(reply: &str) -> Self {
        let text = reply.trim_matches(|c: char| c == '\r' || c == '\n');
        text.strip_prefix(Self::REPLY_PREFIX)
            .and_then(Self::from_token)
            .unwrap_or(PowerState::Unknown)
    }

    /// Looks up the state whose protocol token is exactly `token`.
    pub fn from_token(token: &str) -> Option<Self> {
        PowerState::iter().find(|state| state.token() == Some(token))
    }

    /// The token the projector uses for this state, `None` for [`PowerState::Unknown`].
    pub const fn token(&self) -> Option<&'static str> {
        match self {
            Self::Off => Some("OFF"),
            Self::OffToOn => Some("OFF2ON"),
            Self::On => Some("ON"),
            Self::OnToStandby => Some("ON2PMM"),
            Self::Standby => Some("PMM"),
            Self::StandbyToOn => Some("PMM2ON"),
            Self::OnToOff => Some("ON2OFF"),
            Self::Unknown => None,
        }
    }

    /// Whether the projector is moving between on, off and standby.
    pub const fn is_transitional(&self) -> bool {
        matches!(
            self,
            Self::OffToOn | Self::OnToStandby | Self::StandbyToOn | Self::OnToOff
        )
    }
}

impl fmt::Display for PowerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Off => "off",
            Self::OffToOn => "powering on",
            Self::On => "on",
            Self::OnToStandby => "entering standby",
            Self::Standby => "standby",
            Self::StandbyToOn => "leaving standby",
            Self::OnToOff => "powering off",
            Self::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// A parsed power state together with the reply it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PowerReading {
    pub state: PowerState,
    /// Reply text exactly as received, terminators included.
    pub raw: String,
}

impl PowerReading {
    pub fn from_reply(raw: String) -> Self {
        PowerReading {
            state: PowerState::parse(&raw),
            raw,
        }
    }
}

impl fmt::Display for PowerReading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (reply {:?})", self.state, self.raw)
    }
}
