//! Serial link and timing configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Serial port settings.
///
/// Only the port and baud rate vary. The projector always talks
/// 8 data bits, no parity, 2 stop bits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerialConfig {
    pub port: String,
    pub baud_rate: u32,
}

impl SerialConfig {
    pub const DEFAULT_BAUD_RATE: u32 = 19200;

    pub fn new(port: &str) -> Self {
        SerialConfig {
            port: port.to_string(),
            baud_rate: Self::DEFAULT_BAUD_RATE,
        }
    }

    pub fn with_baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = baud_rate;
        self
    }
}

/// Delays used when talking to the projector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timing {
    /// How long to wait after writing a command before draining the reply.
    pub response_wait: Duration,
    /// Pause before a power command so the projector's control logic settles.
    pub settle_delay: Duration,
    /// Interval between state queries while waiting for the projector to turn off.
    pub poll_interval: Duration,
    /// Maximum number of state queries before giving up.
    pub max_poll_attempts: u32,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            response_wait: Duration::from_secs(1),
            settle_delay: Duration::from_secs(1),
            poll_interval: Duration::from_secs(5),
            max_poll_attempts: 60,
        }
    }
}

impl Timing {
    pub fn with_response_wait(mut self, wait: Duration) -> Self {
        self.response_wait = wait;
        self
    }

    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_max_poll_attempts(mut self, attempts: u32) -> Self {
        self.max_poll_attempts = attempts;
        self
    }

    /// Longest time the poll loop can run before giving up.
    pub fn poll_budget(&self) -> Duration {
        self.poll_interval * self.max_poll_attempts
    }
}
