//! Modem driver: command execution with retry and reset escalation.
//!
//! [`ModemDriver`] owns the transport, the receive buffer, and the delay
//! source, and is in turn owned by the one task that talks to the modem.
//! It sends one command at a time and reads response lines until one
//! classifies as decisive.
//!
//! # Retry policy
//!
//! A retryable line is logged and followed by a fixed delay (2 s by
//! default), then the driver reads the next line. There is no retry count:
//! joining a network or opening a TCP connection has unbounded real-world
//! latency, so the loop blocks until a decisive outcome. Callers that need
//! a bound opt into [`ReadTimeout::Millis`] through
//! [`TimingConfig`](crate::config::TimingConfig).
//!
//! # Fatal escalation
//!
//! A busy-class line during TCP connect means the module needs power-level
//! recovery. The driver requests a full device reboot through
//! [`SystemControl`] and reports [`DriverError::FatalFault`]; on hardware
//! the reboot does not return, so no caller ever observes a classification
//! for that command.

use crate::commands::{AtCommand, Classification, ReplyPattern, MAX_LINE};
use crate::config::TimingConfig;
use crate::traits::{Delay, ReadTimeout, SystemControl, Transport, TransportError};
use log::{debug, error, info};

/// Errors surfaced by driver operations.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DriverError {
    /// The transport failed or a bounded read elapsed.
    Transport(TransportError),
    /// Busy-class response during TCP connect; a device reboot was
    /// requested. Only observable in test doubles whose `reboot` returns.
    FatalFault,
}

impl From<TransportError> for DriverError {
    fn from(e: TransportError) -> Self {
        DriverError::Transport(e)
    }
}

impl core::fmt::Display for DriverError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            DriverError::Transport(e) => write!(f, "transport: {}", e),
            DriverError::FatalFault => write!(f, "fatal modem fault, reboot requested"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for DriverError {}

/// AT command driver for an ESP8266-class WiFi module.
///
/// # Example
///
/// ```rust
/// use rs_dispenser::{
///     commands::AtCommand,
///     config::TimingConfig,
///     hal::{MockDelay, MockSystem, MockTransport},
///     ModemDriver,
/// };
///
/// let mut transport = MockTransport::new();
/// transport.push_reply("no change"); // noise, retried
/// transport.push_reply("ready");
///
/// let timing = TimingConfig::default().with_retry_delay_ms(0);
/// let mut driver = ModemDriver::new(transport, MockDelay::new(), MockSystem::new(), &timing);
/// driver.execute(&AtCommand::Reset).unwrap();
///
/// // The command line went out exactly once.
/// assert_eq!(driver.transport().sent_lines(), ["AT+RST"]);
/// ```
pub struct ModemDriver<T, D, S> {
    transport: T,
    delay: D,
    system: S,
    retry_delay_ms: u32,
    read_timeout: ReadTimeout,
    line: [u8; MAX_LINE],
}

impl<T: Transport, D: Delay, S: SystemControl> ModemDriver<T, D, S> {
    /// Create a driver over the given transport.
    pub fn new(transport: T, delay: D, system: S, timing: &TimingConfig) -> Self {
        Self {
            transport,
            delay,
            system,
            retry_delay_ms: timing.retry_delay_ms,
            read_timeout: timing.read_timeout,
            line: [0; MAX_LINE],
        }
    }

    /// Execute one command: send its line once, then read response lines
    /// until one classifies as decisive.
    ///
    /// `Ok(())` on the command's success token. Retryable lines are logged
    /// and followed by the retry delay; the command is never re-sent. On a
    /// fatal line the driver requests a device reboot and reports
    /// [`DriverError::FatalFault`].
    pub fn execute(&mut self, cmd: &AtCommand<'_>) -> Result<(), DriverError> {
        let out = cmd
            .render()
            .map_err(|_| DriverError::Transport(TransportError::BufferOverflow))?;
        self.transport.send_line(&out)?;

        loop {
            let n = self.transport.read_line(&mut self.line, self.read_timeout)?;
            // Non-UTF-8 garbage is protocol noise like any other.
            let text = core::str::from_utf8(&self.line[..n]).unwrap_or("");
            match cmd.classify(text) {
                Classification::Success => {
                    info!("STATUS: {}", text);
                    return Ok(());
                }
                Classification::Retryable => {
                    debug!("--- {}", text);
                }
                Classification::Fatal => {
                    error!("modem busy during TCP connect ({}), rebooting", text);
                    self.system.reboot();
                    // Unreachable on hardware; reported for test doubles.
                    return Err(DriverError::FatalFault);
                }
            }
            self.delay.delay_ms(self.retry_delay_ms);
        }
    }

    /// Send a payload: announce its byte length (`AT+CIPSEND=<len>`), then
    /// send the raw body.
    ///
    /// A fixed delay follows the announcement and the body; the modem needs
    /// both before it starts relaying. The verdict is read separately with
    /// [`await_verdict`](Self::await_verdict).
    pub fn send_payload(&mut self, body: &[u8]) -> Result<(), DriverError> {
        let announce = AtCommand::AnnouncePayload { len: body.len() };
        let out = announce
            .render()
            .map_err(|_| DriverError::Transport(TransportError::BufferOverflow))?;
        self.transport.send_line(&out)?;
        self.delay.delay_ms(self.retry_delay_ms);
        self.transport.send_raw(body)?;
        self.delay.delay_ms(self.retry_delay_ms);
        Ok(())
    }

    /// Read lines until one carries the pattern's marker followed by a
    /// recognized terminal code.
    ///
    /// Returns `true` for the actuate code, `false` for the no-actuate
    /// code. Unlike [`execute`](Self::execute), this loop has no fatal
    /// outcome: every unrecognized line is logged, delayed, and retried.
    pub fn await_verdict(&mut self, pattern: &ReplyPattern) -> Result<bool, DriverError> {
        loop {
            let n = self.transport.read_line(&mut self.line, self.read_timeout)?;
            let text = core::str::from_utf8(&self.line[..n]).unwrap_or("");
            debug!("--- {}", text);
            if let Some(actuate) = pattern.scan(text) {
                info!(
                    "cloud verdict: {}",
                    if actuate { "actuate" } else { "no actuate" }
                );
                return Ok(actuate);
            }
            self.delay.delay_ms(self.retry_delay_ms);
        }
    }

    /// Block for `ms` milliseconds on the driver's delay source.
    ///
    /// Used by the connection manager for inter-step settle delays.
    pub fn pause(&mut self, ms: u32) {
        self.delay.delay_ms(ms);
    }

    /// Access the underlying transport (mock inspection in tests).
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Mutable access to the transport (mock scripting in tests).
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Access the system control handle (mock inspection in tests).
    pub fn system(&self) -> &S {
        &self.system
    }

    /// Access the delay source (mock inspection in tests).
    pub fn delay(&self) -> &D {
        &self.delay
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::{MockDelay, MockSystem, MockTransport};

    fn driver(transport: MockTransport) -> ModemDriver<MockTransport, MockDelay, MockSystem> {
        let timing = TimingConfig::default();
        ModemDriver::new(transport, MockDelay::new(), MockSystem::new(), &timing)
    }

    #[test]
    fn execute_retries_noise_then_succeeds() {
        let mut transport = MockTransport::new();
        transport.push_reply("AT+RST"); // echo still on
        transport.push_reply("");
        transport.push_reply("ready");

        let mut d = driver(transport);
        d.execute(&AtCommand::Reset).unwrap();

        // One send, three reads, two retry delays.
        assert_eq!(d.transport().sent_lines(), ["AT+RST"]);
        assert_eq!(d.delay.total_ms(), 2 * 2_000);
    }

    #[test]
    fn execute_surfaces_transport_errors() {
        // No scripted replies: the mock reports a closed channel.
        let mut d = driver(MockTransport::new());
        let err = d.execute(&AtCommand::DisableEcho).unwrap_err();
        assert_eq!(
            err,
            DriverError::Transport(TransportError::ChannelClosed)
        );
    }

    #[test]
    fn fatal_line_requests_reboot_exactly_once() {
        let mut transport = MockTransport::new();
        transport.push_reply("busy p...");

        let mut d = driver(transport);
        let err = d
            .execute(&AtCommand::TcpOpen {
                host: "h",
                port: 80,
            })
            .unwrap_err();

        assert_eq!(err, DriverError::FatalFault);
        assert_eq!(d.system().reboot_count(), 1);
    }

    #[test]
    fn send_payload_announces_then_sends_raw() {
        let mut d = driver(MockTransport::new());
        d.send_payload(b"hello,server").unwrap();

        // Length announcement went out as a line, the body as raw bytes.
        assert_eq!(d.transport().sent_lines(), ["AT+CIPSEND=12"]);
        assert_eq!(d.transport().sent_raw(), vec![b"hello,server".to_vec()]);
    }

    #[test]
    fn await_verdict_scans_for_actuate_code() {
        let mut transport = MockTransport::new();
        transport.push_reply("SEND OK");
        transport.push_reply("+IPD,12:xxHANUIDISPRETCODE1CLOSED");

        let mut d = driver(transport);
        assert!(d.await_verdict(&ReplyPattern::default()).unwrap());
    }

    #[test]
    fn await_verdict_no_actuate() {
        let mut transport = MockTransport::new();
        transport.push_reply("+IPD,12:xxHANUIDISPRETCODE0CLOSED");

        let mut d = driver(transport);
        assert!(!d.await_verdict(&ReplyPattern::default()).unwrap());
    }

    #[test]
    fn await_verdict_never_goes_fatal() {
        // A busy line mid-reply is noise here, not a reboot trigger.
        let mut transport = MockTransport::new();
        transport.push_reply("busy p...");
        transport.push_reply("+IPD,12:xxHANUIDISPRETCODE0CLOSED");

        let mut d = driver(transport);
        assert!(!d.await_verdict(&ReplyPattern::default()).unwrap());
        assert_eq!(d.system().reboot_count(), 0);
    }
}
