//! Mock implementations for testing without hardware.
//!
//! This module provides test doubles for the transport and hardware traits,
//! enabling development and testing on desktop without a modem attached.
//!
//! # Available Mocks
//!
//! | Mock | Trait | Purpose |
//! |------|-------|---------|
//! | [`MockTransport`] | [`Transport`] | Scripted reply lines, records sends |
//! | [`MockDelay`] | [`Delay`] | Records requested delays, never sleeps |
//! | [`MockSystem`] | [`SystemControl`] | Counts reboot requests |
//! | [`MockDispenser`] | [`Dispenser`] | Counts dispense sequences |
//! | [`MockSensor`] | [`TemperatureSensor`] | Fixed temperature reading |
//!
//! # Example
//!
//! ```rust
//! use rs_dispenser::commands::AtCommand;
//! use rs_dispenser::config::TimingConfig;
//! use rs_dispenser::hal::{MockDelay, MockSystem, MockTransport};
//! use rs_dispenser::ModemDriver;
//!
//! let mut transport = MockTransport::new();
//! transport.push_reply("ready");
//!
//! let mut driver = ModemDriver::new(
//!     transport,
//!     MockDelay::new(),
//!     MockSystem::new(),
//!     &TimingConfig::default(),
//! );
//! driver.execute(&AtCommand::Reset).unwrap();
//! assert_eq!(driver.transport().sent_lines(), ["AT+RST"]);
//! ```
//!
//! [`Transport`]: crate::traits::Transport
//! [`Delay`]: crate::traits::Delay
//! [`SystemControl`]: crate::traits::SystemControl
//! [`Dispenser`]: crate::traits::Dispenser
//! [`TemperatureSensor`]: crate::traits::TemperatureSensor

use crate::traits::{
    Delay, Dispenser, ReadTimeout, SystemControl, TemperatureSensor, Transport, TransportError,
};
use std::collections::VecDeque;

// ============================================================================
// Transport Mock
// ============================================================================

/// Mock transport with a scripted reply queue.
///
/// Outbound lines and raw payloads are recorded for inspection. Inbound
/// lines come from a FIFO script; when the script runs dry, `read_line`
/// reports [`TransportError::ChannelClosed`] so tests never block in the
/// driver's indefinite retry loop.
#[derive(Debug, Default)]
pub struct MockTransport {
    sent_lines: Vec<String>,
    sent_raw: Vec<Vec<u8>>,
    replies: VecDeque<String>,
}

impl MockTransport {
    /// Creates a transport with an empty script.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one reply line to the script.
    pub fn push_reply(&mut self, line: &str) {
        self.replies.push_back(line.to_string());
    }

    /// Lines sent with `send_line`, in order, without terminators.
    pub fn sent_lines(&self) -> Vec<String> {
        self.sent_lines.clone()
    }

    /// Payloads sent with `send_raw`, in order.
    pub fn sent_raw(&self) -> Vec<Vec<u8>> {
        self.sent_raw.clone()
    }

    /// Reply lines not yet consumed.
    pub fn remaining_replies(&self) -> usize {
        self.replies.len()
    }
}

impl Transport for MockTransport {
    fn send_line(&mut self, line: &str) -> Result<(), TransportError> {
        self.sent_lines.push(line.to_string());
        Ok(())
    }

    fn send_raw(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        self.sent_raw.push(bytes.to_vec());
        Ok(())
    }

    fn read_line(&mut self, buf: &mut [u8], _timeout: ReadTimeout) -> Result<usize, TransportError> {
        let line = self.replies.pop_front().ok_or(TransportError::ChannelClosed)?;
        let bytes = line.as_bytes();
        if bytes.len() > buf.len() {
            return Err(TransportError::BufferOverflow);
        }
        buf[..bytes.len()].copy_from_slice(bytes);
        Ok(bytes.len())
    }
}

// ============================================================================
// Hardware Mocks
// ============================================================================

/// Mock delay that records instead of sleeping.
#[derive(Debug, Default)]
pub struct MockDelay {
    calls: Vec<u32>,
}

impl MockDelay {
    /// Creates a delay recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Total milliseconds requested so far.
    pub fn total_ms(&self) -> u64 {
        self.calls.iter().map(|&ms| u64::from(ms)).sum()
    }

    /// Individual delay requests, in order.
    pub fn calls(&self) -> &[u32] {
        &self.calls
    }
}

impl Delay for MockDelay {
    fn delay_ms(&mut self, ms: u32) {
        self.calls.push(ms);
    }
}

/// Mock system control that counts reboot requests.
///
/// Unlike hardware, `reboot` returns, so the escalation path can be
/// asserted in tests.
#[derive(Debug, Default)]
pub struct MockSystem {
    reboots: usize,
}

impl MockSystem {
    /// Creates a system control recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of reboot requests seen.
    pub fn reboot_count(&self) -> usize {
        self.reboots
    }
}

impl SystemControl for MockSystem {
    fn reboot(&mut self) {
        self.reboots += 1;
    }
}

/// Mock dispenser that counts actuation sequences.
#[derive(Debug, Default)]
pub struct MockDispenser {
    dispenses: usize,
}

impl MockDispenser {
    /// Creates a dispenser recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of completed dispense sequences.
    pub fn dispense_count(&self) -> usize {
        self.dispenses
    }
}

impl Dispenser for MockDispenser {
    type Error = ();

    fn dispense(&mut self) -> Result<(), ()> {
        self.dispenses += 1;
        Ok(())
    }
}

/// Mock temperature sensor with a settable reading.
#[derive(Debug)]
pub struct MockSensor {
    celsius: f32,
}

impl MockSensor {
    /// Creates a sensor that reports `celsius`.
    pub fn new(celsius: f32) -> Self {
        Self { celsius }
    }

    /// Change the reported reading.
    pub fn set(&mut self, celsius: f32) {
        self.celsius = celsius;
    }
}

impl TemperatureSensor for MockSensor {
    fn read_celsius(&mut self) -> f32 {
        self.celsius
    }
}
