//! # sx6000_power
//!
//! Power control for the Canon SX6000 projector over its RS-232 port.
//!
//! The projector speaks a small line protocol at 19200 baud, 8 data bits,
//! no parity and 2 stop bits. This crate queries its power state and issues
//! power on/off commands, waiting out shutdown transitions the projector
//! would otherwise reject `POWER ON` during.
//!
//! ## Quick Start
//!
//! ```ignore
//! use sx6000_power::{PowerController, SerialConfig, Timing};
//!
//! async fn start_projector() -> Result<(), sx6000_power::Error> {
//!     let mut projector =
//!         PowerController::serial(SerialConfig::new("/dev/ttyUSB0"), Timing::default());
//!
//!     println!("projector is {}", projector.get_power_state().await?);
//!     println!("{}", projector.power_on().await?);
//!     Ok(())
//! }
//! ```
//!
//! ## Protocol
//!
//! | Command        | Wire string    |
//! |----------------|----------------|
//! | query state    | `GET POWER`    |
//! | power on       | `POWER ON`     |
//! | power off      | `RC POWER_OFF` |
//!
//! Every command is terminated with `\r\n`. State replies look like
//! `g:POWER=ON2OFF` and parse into [`PowerState`].
//!
//! ## Timing
//!
//! All delays live in [`Timing`]: the wait before reading a reply, the settle
//! delay before a power command, and the interval and maximum number of
//! polls while waiting for the projector to reach off.
//!
//! ## Feature Flags
//!
//! - `cli` (default): build the `sx6000-power` command-line binary

mod config;
mod controller;
mod errors;
mod history;
mod response;
pub mod transport;
mod types;

// Re-export public API
pub use config::{SerialConfig, Timing};
pub use controller::PowerController;
pub use errors::Error;
pub use history::{Event, History, HistoryEntry, HistorySummary};
pub use response::PowerResponse;
pub use transport::{SerialTransport, Transport};
pub use types::{Command, PowerReading, PowerState};
