//! RS-232 transport on top of tokio-serial.

use std::io;
use std::time::Duration;

use log::debug;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio_serial::{
    DataBits, FlowControl, Parity, SerialPort, SerialPortBuilderExt, SerialStream, StopBits,
};

use super::Transport;
use crate::config::SerialConfig;
use crate::errors::Error;
use crate::types::Command;

type Result<T> = std::result::Result<T, Error>;

/// Serial link to the projector.
///
/// The port is opened for each exchange and closed again once the reply has
/// been drained, so nothing holds the device between commands.
///
/// # Example
///
/// ```no_run
/// use sx6000_power::{Command, SerialConfig, SerialTransport, Transport};
///
/// # async fn run() -> Result<(), sx6000_power::Error> {
/// let mut link = SerialTransport::new(SerialConfig::new("/dev/ttyUSB0"));
/// let reply = link.send(Command::GetPower).await?;
/// println!("{reply:?}");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct SerialTransport {
    config: SerialConfig,
    response_wait: Duration,
}

impl SerialTransport {
    const DEFAULT_RESPONSE_WAIT: Duration = Duration::from_secs(1);

    pub fn new(config: SerialConfig) -> Self {
        SerialTransport {
            config,
            response_wait: Self::DEFAULT_RESPONSE_WAIT,
        }
    }

    pub fn with_response_wait(mut self, wait: Duration) -> Self {
        self.response_wait = wait;
        self
    }

    pub fn config(&self) -> &SerialConfig {
        &self.config
    }

    fn open(&self, command: Command) -> Result<SerialStream> {
        tokio_serial::new(&self.config.port, self.config.baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::Two)
            .flow_control(FlowControl::None)
            .open_native_async()
            .map_err(|e| Error::transport("open", &self.config.port, command, e))
    }
}

impl Transport for SerialTransport {
    async fn send(&mut self, command: Command) -> Result<String> {
        let mut port = self.open(command)?;

        port.write_all(&command.frame())
            .await
            .map_err(|e| Error::transport("write", &self.config.port, command, e))?;
        port.flush()
            .await
            .map_err(|e| Error::transport("flush", &self.config.port, command, e))?;
        debug!("[{}] sent {:?}", self.config.port, command.as_str());

        tokio::time::sleep(self.response_wait).await;

        let bytes = drain(&mut port, |port: &SerialStream| {
            port.bytes_to_read()
                .map(|count| count as usize)
                .map_err(io::Error::from)
        })
        .await
        .map_err(|e| Error::transport("read", &self.config.port, command, e))?;
        let reply = decode(&bytes);
        debug!("[{}] received {:?}", self.config.port, reply);
        Ok(reply)
    }

    fn name(&self) -> &str {
        &self.config.port
    }
}

/// Reads every byte `available` reports as pending, without waiting for more.
async fn drain<P, F>(port: &mut P, mut available: F) -> io::Result<Vec<u8>>
where
    P: AsyncRead + Unpin,
    F: FnMut(&P) -> io::Result<usize>,
{
    let mut reply = Vec::new();
    loop {
        let pending = available(&*port)?;
        if pending == 0 {
            break;
        }

        let mut buffer = vec![0u8; pending];
        let read = port.read(&mut buffer).await?;
        if read == 0 {
            break;
        }
        reply.extend_from_slice(&buffer[..read]);
    }
    Ok(reply)
}

/// Bytes that are not UTF-8 become U+FFFD, so garbage parses as an unknown state.
fn decode(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}
