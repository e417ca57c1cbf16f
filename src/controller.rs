//! Projector power control.

use log::{debug, info, warn};

use crate::config::{SerialConfig, Timing};
use crate::errors::Error;
use crate::history::History;
use crate::response::PowerResponse;
use crate::transport::{SerialTransport, Transport};
use crate::types::{Command, PowerReading, PowerState};

type Result<T> = std::result::Result<T, Error>;

/// How a wait for the projector to finish a transition ended.
enum Settled {
    /// Reached `Off` after this many polls.
    Off(u32, PowerReading),
    /// Came up `On` by itself.
    On,
}

/// Drives power requests against a single projector.
///
/// The controller owns its transport exclusively and runs every exchange
/// to completion before starting the next, so requests never interleave on
/// the wire.
///
/// # Example
///
/// ```no_run
/// use sx6000_power::{PowerController, SerialConfig, Timing};
///
/// # async fn run() -> Result<(), sx6000_power::Error> {
/// let mut projector = PowerController::serial(SerialConfig::new("/dev/ttyUSB0"), Timing::default());
/// let outcome = projector.power_on().await?;
/// println!("{outcome}");
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct PowerController<T> {
    transport: T,
    timing: Timing,
    history: History,
}

impl PowerController<SerialTransport> {
    /// Creates a controller talking over the serial port in `config`.
    pub fn serial(config: SerialConfig, timing: Timing) -> Self {
        let transport = SerialTransport::new(config).with_response_wait(timing.response_wait);
        Self::new(transport, timing)
    }
}

impl<T: Transport> PowerController<T> {
    pub fn new(transport: T, timing: Timing) -> Self {
        PowerController {
            transport,
            timing,
            history: History::new(),
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn timing(&self) -> &Timing {
        &self.timing
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    /// Queries the projector's current power state.
    pub async fn get_power_state(&mut self) -> Result<PowerState> {
        Ok(self.read_power().await?.state)
    }

    /// Queries the power state and keeps the raw reply alongside it.
    pub async fn read_power(&mut self) -> Result<PowerReading> {
        let reading = PowerReading::from_reply(self.exchange(Command::GetPower).await?);
        if reading.state == PowerState::Unknown {
            warn!(
                "[{}] unrecognized power reply {:?}",
                self.transport.name(),
                reading.raw
            );
        }
        Ok(reading)
    }

    /// Turns the projector on.
    ///
    /// From `Off` this settles and sends `POWER ON`. From any other state
    /// except `On` the projector would reject the command, so the state is
    /// re-queried every [`Timing::poll_interval`] until it reads `Off`, for at
    /// most [`Timing::max_poll_attempts`] queries.
    pub async fn power_on(&mut self) -> Result<PowerResponse> {
        let reading = self.read_power().await?;
        let (polls, off) = match reading.state {
            PowerState::On => {
                info!("[{}] already on", self.transport.name());
                return Ok(PowerResponse::unchanged(PowerState::On));
            }
            PowerState::Off => (0, reading),
            _ => match self.wait_for_off(reading).await? {
                Settled::Off(polls, off) => (polls, off),
                Settled::On => {
                    info!("[{}] came up on while waiting", self.transport.name());
                    return Ok(PowerResponse::unchanged(PowerState::On));
                }
            },
        };
        self.settle_and_send(Command::PowerOn, polls, off).await
    }

    /// Turns the projector off. Does nothing unless it is currently `On`.
    pub async fn power_off(&mut self) -> Result<PowerResponse> {
        let reading = self.read_power().await?;
        if reading.state != PowerState::On {
            info!(
                "[{}] not powering off; projector is {}",
                self.transport.name(),
                reading.state
            );
            return Ok(PowerResponse::unchanged(reading.state));
        }
        self.settle_and_send(Command::PowerOff, 0, reading).await
    }

    async fn wait_for_off(&mut self, mut last: PowerReading) -> Result<Settled> {
        if last.state.is_transitional() {
            info!(
                "[{}] projector is {}; waiting for it to reach off",
                self.transport.name(),
                last.state
            );
        } else {
            info!(
                "[{}] projector is {} ({:?}); polling until it reads off",
                self.transport.name(),
                last.state,
                last.raw
            );
        }

        for attempt in 1..=self.timing.max_poll_attempts {
            tokio::time::sleep(self.timing.poll_interval).await;
            let reading = self.read_power().await?;
            match reading.state {
                PowerState::Off => return Ok(Settled::Off(attempt, reading)),
                PowerState::On => return Ok(Settled::On),
                state => debug!(
                    "[{}] poll {}/{}: still {}",
                    self.transport.name(),
                    attempt,
                    self.timing.max_poll_attempts,
                    state
                ),
            }
            last = reading;
        }

        let err = Error::Timeout {
            command: Command::PowerOn,
            attempts: self.timing.max_poll_attempts,
            last,
        };
        self.history.record_error(&err.to_string());
        Err(err)
    }

    async fn settle_and_send(
        &mut self,
        command: Command,
        polls: u32,
        observed: PowerReading,
    ) -> Result<PowerResponse> {
        tokio::time::sleep(self.timing.settle_delay).await;
        info!("[{}] sending {}", self.transport.name(), command);
        self.exchange(command)
            .await
            .map_err(|e| e.with_last(observed))?;
        Ok(PowerResponse::sent(command, polls))
    }

    async fn exchange(&mut self, command: Command) -> Result<String> {
        self.history.record_sent(command);
        match self.transport.send(command).await {
            Ok(raw) => {
                let state = command.is_query().then(|| PowerState::parse(&raw));
                self.history.record_received(&raw, state);
                Ok(raw)
            }
            Err(e) => {
                self.history.record_error(&e.to_string());
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::time::Duration;

    use tokio::time::Instant;

    use super::*;

    /// Replays canned `GET POWER` replies and records what was sent, and when.
    struct ScriptedTransport {
        replies: VecDeque<&'static str>,
        last_reply: &'static str,
        fail_on: Option<Command>,
        sent: Vec<(Command, Instant)>,
        start: Instant,
    }

    impl ScriptedTransport {
        fn new(replies: &[&'static str]) -> Self {
            ScriptedTransport {
                replies: replies.iter().copied().collect(),
                last_reply: "",
                fail_on: None,
                sent: Vec::new(),
                start: Instant::now(),
            }
        }

        fn failing_on(mut self, command: Command) -> Self {
            self.fail_on = Some(command);
            self
        }

        fn commands(&self) -> Vec<Command> {
            self.sent.iter().map(|(command, _)| *command).collect()
        }

        fn offsets(&self) -> Vec<Duration> {
            self.sent.iter().map(|(_, at)| *at - self.start).collect()
        }
    }

    impl Transport for ScriptedTransport {
        async fn send(&mut self, command: Command) -> std::result::Result<String, Error> {
            self.sent.push((command, Instant::now()));
            if self.fail_on == Some(command) {
                return Err(Error::transport(
                    "write",
                    "scripted",
                    command,
                    std::io::Error::new(std::io::ErrorKind::BrokenPipe, "cable pulled"),
                ));
            }
            if !command.is_query() {
                return Ok(String::new());
            }
            // The last reply repeats once the script runs out.
            if let Some(reply) = self.replies.pop_front() {
                self.last_reply = reply;
            }
            Ok(self.last_reply.to_string())
        }

        fn name(&self) -> &str {
            "scripted"
        }
    }

    fn controller(replies: &[&'static str]) -> PowerController<ScriptedTransport> {
        PowerController::new(ScriptedTransport::new(replies), Timing::default())
    }

    fn secs(values: &[u64]) -> Vec<Duration> {
        values.iter().map(|s| Duration::from_secs(*s)).collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_get_power_state_maps_replies() {
        let cases = [
            ("g:POWER=OFF\r\n", PowerState::Off),
            ("g:POWER=OFF2ON\r\n", PowerState::OffToOn),
            ("g:POWER=ON\r\n", PowerState::On),
            ("g:POWER=ON2PMM\r\n", PowerState::OnToStandby),
            ("g:POWER=PMM\r\n", PowerState::Standby),
            ("g:POWER=PMM2ON\r\n", PowerState::StandbyToOn),
            ("g:POWER=ON2OFF\r\n", PowerState::OnToOff),
            ("i:BUSY\r\n", PowerState::Unknown),
            ("", PowerState::Unknown),
        ];
        for (reply, expected) in cases {
            let mut projector = controller(&[reply]);
            assert_eq!(projector.get_power_state().await.unwrap(), expected);
            assert_eq!(projector.transport().commands(), vec![Command::GetPower]);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_read_power_keeps_raw_reply() {
        let mut projector = controller(&["g:POWER=PMM\r\n"]);
        let reading = projector.read_power().await.unwrap();
        assert_eq!(reading.state, PowerState::Standby);
        assert_eq!(reading.raw, "g:POWER=PMM\r\n");
        assert_eq!(projector.history().last_state(), Some(PowerState::Standby));
    }

    #[tokio::test(start_paused = true)]
    async fn test_power_on_when_on_sends_nothing() {
        let mut projector = controller(&["g:POWER=ON\r\n"]);
        let response = projector.power_on().await.unwrap();
        assert_eq!(response, PowerResponse::unchanged(PowerState::On));
        assert_eq!(projector.transport().commands(), vec![Command::GetPower]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_power_on_from_off_settles_then_sends_once() {
        let mut projector = controller(&["g:POWER=OFF\r\n"]);
        let response = projector.power_on().await.unwrap();

        assert_eq!(response, PowerResponse::sent(Command::PowerOn, 0));
        let transport = projector.transport();
        assert_eq!(
            transport.commands(),
            vec![Command::GetPower, Command::PowerOn]
        );
        assert_eq!(transport.offsets(), secs(&[0, 1]));
    }

    #[tokio::test(start_paused = true)]
    async fn test_power_on_waits_out_shutdown() {
        let mut projector = controller(&[
            "g:POWER=ON2OFF\r\n",
            "g:POWER=ON2OFF\r\n",
            "g:POWER=ON2OFF\r\n",
            "g:POWER=OFF\r\n",
        ]);
        let response = projector.power_on().await.unwrap();

        assert_eq!(response, PowerResponse::sent(Command::PowerOn, 3));
        let transport = projector.transport();
        assert_eq!(
            transport.commands(),
            vec![
                Command::GetPower,
                Command::GetPower,
                Command::GetPower,
                Command::GetPower,
                Command::PowerOn,
            ]
        );
        // Polls every 5s, then one settle delay after the first OFF.
        assert_eq!(transport.offsets(), secs(&[0, 5, 10, 15, 16]));
    }

    #[tokio::test(start_paused = true)]
    async fn test_power_on_from_standby_polls_first() {
        let mut projector = controller(&["g:POWER=PMM", "g:POWER=PMM", "g:POWER=OFF"]);
        let response = projector.power_on().await.unwrap();

        assert_eq!(response, PowerResponse::sent(Command::PowerOn, 2));
        let transport = projector.transport();
        assert_eq!(transport.commands()[1], Command::GetPower);
        assert_eq!(transport.offsets(), secs(&[0, 5, 10, 11]));
    }

    #[tokio::test(start_paused = true)]
    async fn test_power_on_polls_through_unknown_replies() {
        let mut projector = controller(&["garbage", "", "g:POWER=OFF\r\n"]);
        let response = projector.power_on().await.unwrap();
        assert_eq!(response, PowerResponse::sent(Command::PowerOn, 2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_power_on_stops_if_projector_comes_up() {
        let mut projector = controller(&["g:POWER=OFF2ON", "g:POWER=ON"]);
        let response = projector.power_on().await.unwrap();

        assert_eq!(response, PowerResponse::unchanged(PowerState::On));
        assert_eq!(
            projector.transport().commands(),
            vec![Command::GetPower, Command::GetPower]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_power_on_gives_up_after_max_polls() {
        let timing = Timing::default().with_max_poll_attempts(3);
        let mut projector =
            PowerController::new(ScriptedTransport::new(&["g:POWER=ON2OFF\r\n"]), timing);

        let err = projector.power_on().await.unwrap_err();
        match &err {
            Error::Timeout {
                command,
                attempts,
                last,
            } => {
                assert_eq!(*command, Command::PowerOn);
                assert_eq!(*attempts, 3);
                assert_eq!(last.state, PowerState::OnToOff);
                assert_eq!(last.raw, "g:POWER=ON2OFF\r\n");
            }
            other => panic!("expected timeout, got {other:?}"),
        }
        let transport = projector.transport();
        assert!(!transport.commands().contains(&Command::PowerOn));
        assert_eq!(transport.offsets(), secs(&[0, 5, 10, 15]));
        assert_eq!(projector.history().last_error(), Some(err.to_string().as_str()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_power_off_when_on_settles_then_sends_once() {
        let mut projector = controller(&["g:POWER=ON\r\n"]);
        let response = projector.power_off().await.unwrap();

        assert_eq!(response, PowerResponse::sent(Command::PowerOff, 0));
        let transport = projector.transport();
        assert_eq!(
            transport.commands(),
            vec![Command::GetPower, Command::PowerOff]
        );
        assert_eq!(transport.offsets(), secs(&[0, 1]));
    }

    #[tokio::test(start_paused = true)]
    async fn test_power_off_when_not_on_sends_nothing() {
        for reply in [
            "g:POWER=OFF",
            "g:POWER=OFF2ON",
            "g:POWER=ON2PMM",
            "g:POWER=PMM",
            "g:POWER=PMM2ON",
            "g:POWER=ON2OFF",
            "???",
        ] {
            let mut projector = controller(&[reply]);
            let response = projector.power_off().await.unwrap();
            assert!(!response.is_sent(), "{reply}");
            assert_eq!(projector.transport().commands(), vec![Command::GetPower]);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_query_failure_is_fatal() {
        let transport = ScriptedTransport::new(&["g:POWER=OFF"]).failing_on(Command::GetPower);
        let mut projector = PowerController::new(transport, Timing::default());

        let err = projector.power_on().await.unwrap_err();
        assert!(err.is_transport());
        assert_eq!(projector.transport().commands(), vec![Command::GetPower]);
        assert!(projector.history().last_error().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_command_failure_is_not_retried() {
        let transport = ScriptedTransport::new(&["g:POWER=ON"]).failing_on(Command::PowerOff);
        let mut projector = PowerController::new(transport, Timing::default());

        let err = projector.power_off().await.unwrap_err();
        assert!(err.is_transport());
        assert!(err.to_string().contains("sending RC POWER_OFF"));
        assert_eq!(
            projector.transport().commands(),
            vec![Command::GetPower, Command::PowerOff]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_power_on_failure_names_command_and_observed_state() {
        let transport = ScriptedTransport::new(&["g:POWER=ON2OFF\r\n", "g:POWER=OFF\r\n"])
            .failing_on(Command::PowerOn);
        let mut projector = PowerController::new(transport, Timing::default());

        let err = projector.power_on().await.unwrap_err();
        let message = err.to_string();
        assert!(message.contains("POWER ON"), "{message}");
        assert!(message.contains("projector was off"), "{message}");
        match err {
            Error::Transport { command, last, .. } => {
                assert_eq!(command, Command::PowerOn);
                assert_eq!(last.map(|r| r.raw), Some("g:POWER=OFF\r\n".to_string()));
            }
            other => panic!("expected transport error, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_query_failure_names_get_power() {
        let transport = ScriptedTransport::new(&[]).failing_on(Command::GetPower);
        let mut projector = PowerController::new(transport, Timing::default());

        let err = projector.get_power_state().await.unwrap_err();
        assert!(err.to_string().contains("sending GET POWER"));
        assert!(matches!(err, Error::Transport { last: None, .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_history_records_exchanges() {
        let mut projector = controller(&["g:POWER=OFF"]);
        projector.power_on().await.unwrap();

        let summary = projector.history().summary();
        assert_eq!(summary.send_count, 2);
        assert_eq!(summary.receive_count, 2);
        assert_eq!(summary.last_state, Some(PowerState::Off));

        projector.clear_history();
        assert!(projector.history().is_empty());
    }
}
