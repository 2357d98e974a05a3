//! Connection state machine: bring-up lifecycle and per-cycle send.
//!
//! [`ConnectionManager`] sequences the modem driver through a fixed
//! lifecycle and exposes the two operations the rest of the system needs:
//! [`bring_up`](ConnectionManager::bring_up) and
//! [`send_and_classify`](ConnectionManager::send_and_classify).
//!
//! ```text
//! Uninitialized -> Resetting -> EchoDisabling -> ModeSetting -> Joining -> Idle
//!                                      (one-time bring-up)
//!
//! Idle -> TcpConnecting -> Sending -> AwaitingReply -> Idle
//!                  (per-cycle, caller-scheduled)
//! ```
//!
//! Transitions are strictly sequential and single-threaded: the state is
//! owned and mutated only by the cloud task, never shared. A step's failure
//! aborts the operation immediately; there is no inline retry across
//! cycles, the caller simply tries again on its own schedule.
//!
//! The one escape from the normal error channel: a busy-class response
//! during TCP connect makes the driver request a device reboot before the
//! error ever reaches this layer (see [`crate::driver`]).

use crate::commands::AtCommand;
use crate::config::Config;
use crate::driver::{DriverError, ModemDriver};
use crate::traits::{Delay, SystemControl, Transport};
use log::info;

/// Lifecycle position of the modem session.
///
/// Exactly one instance exists per session, owned by [`ConnectionManager`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ConnectionState {
    /// Powered up, nothing sent yet.
    #[default]
    Uninitialized,
    /// `AT+RST` in flight.
    Resetting,
    /// `ATE0` in flight.
    EchoDisabling,
    /// `AT+CWMODE` in flight.
    ModeSetting,
    /// `AT+CWJAP` in flight.
    Joining,
    /// Network joined; ready for a cycle.
    Idle,
    /// `AT+CIPSTART` in flight.
    TcpConnecting,
    /// Payload announcement and body going out.
    Sending,
    /// Scanning for the cloud verdict.
    AwaitingReply,
}

/// A bring-up step, named for error reporting.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SetupStep {
    /// Module reset (`AT+RST`).
    Reset,
    /// Echo disable (`ATE0`).
    DisableEcho,
    /// Client mode selection (`AT+CWMODE`).
    SetMode,
    /// WiFi network join (`AT+CWJAP`).
    JoinNetwork,
}

impl SetupStep {
    /// The state entered while this step's command is in flight.
    fn state(self) -> ConnectionState {
        match self {
            SetupStep::Reset => ConnectionState::Resetting,
            SetupStep::DisableEcho => ConnectionState::EchoDisabling,
            SetupStep::SetMode => ConnectionState::ModeSetting,
            SetupStep::JoinNetwork => ConnectionState::Joining,
        }
    }

    /// Step name for diagnostics.
    pub const fn as_str(self) -> &'static str {
        match self {
            SetupStep::Reset => "reset",
            SetupStep::DisableEcho => "disable echo",
            SetupStep::SetMode => "set mode",
            SetupStep::JoinNetwork => "join network",
        }
    }
}

/// Bring-up failure, naming the step that failed.
///
/// The caller decides whether to retry the whole sequence or abort.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SetupError {
    /// The step that failed.
    pub step: SetupStep,
    /// The driver-level cause.
    pub cause: DriverError,
}

impl core::fmt::Display for SetupError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "bring-up failed at {}: {}", self.step.as_str(), self.cause)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for SetupError {}

/// Per-cycle failure. The orchestrator waits for its next scheduled cycle;
/// nothing is retried inline.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CycleError {
    /// `send_and_classify` called before bring-up completed.
    NotJoined,
    /// TCP connect failed. A [`DriverError::FatalFault`] here means a
    /// device reboot was already requested.
    TcpConnect(DriverError),
    /// Payload send or verdict read failed.
    Send(DriverError),
}

impl core::fmt::Display for CycleError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            CycleError::NotJoined => write!(f, "not joined to a network"),
            CycleError::TcpConnect(e) => write!(f, "tcp connect: {}", e),
            CycleError::Send(e) => write!(f, "payload send: {}", e),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for CycleError {}

/// The cloud server's verdict for one upload cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActuateDecision {
    /// Start dispensing.
    Actuate,
    /// Keep sending data.
    NoActuate,
}

/// Drives the modem through its lifecycle.
///
/// Owns the [`ModemDriver`] and the session's [`ConnectionState`]. Must be
/// owned by a single task; no other task may query or mutate the state.
///
/// # Example
///
/// ```rust
/// use rs_dispenser::{
///     ActuateDecision, Config, ConnectionManager, ModemDriver,
///     hal::{MockDelay, MockSystem, MockTransport},
/// };
///
/// let mut transport = MockTransport::new();
/// transport.push_reply("ready");
/// transport.push_reply("OK");
/// transport.push_reply("OK");
/// transport.push_reply("OK");
/// transport.push_reply("CONNECT");
/// transport.push_reply("+IPD,12:xxHANUIDISPRETCODE1CLOSED");
///
/// let config = Config::default();
/// let driver = ModemDriver::new(transport, MockDelay::new(), MockSystem::new(), &config.timing);
/// let mut conn = ConnectionManager::new(driver, config);
///
/// conn.bring_up().unwrap();
/// let decision = conn.send_and_classify(b"{\"id\":\"1\"}").unwrap();
/// assert_eq!(decision, ActuateDecision::Actuate);
/// ```
pub struct ConnectionManager<T, D, S> {
    driver: ModemDriver<T, D, S>,
    config: Config,
    state: ConnectionState,
}

impl<T: Transport, D: Delay, S: SystemControl> ConnectionManager<T, D, S> {
    /// Create a manager in the `Uninitialized` state.
    pub fn new(driver: ModemDriver<T, D, S>, config: Config) -> Self {
        Self {
            driver,
            config,
            state: ConnectionState::Uninitialized,
        }
    }

    /// Current lifecycle position.
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Whether bring-up completed and the session is usable.
    pub fn is_connected(&self) -> bool {
        !matches!(
            self.state,
            ConnectionState::Uninitialized
                | ConnectionState::Resetting
                | ConnectionState::EchoDisabling
                | ConnectionState::ModeSetting
                | ConnectionState::Joining
        )
    }

    /// One-time bring-up: reset, disable echo, set client mode, join the
    /// network. A fixed settle delay follows every step.
    ///
    /// Aborts at the first step whose outcome is not success; later steps
    /// are never attempted and the state returns to `Uninitialized` so the
    /// caller may retry the whole sequence.
    pub fn bring_up(&mut self) -> Result<(), SetupError> {
        let ssid = self.config.wifi.ssid.clone();
        let password = self.config.wifi.password.clone();
        let mode = self.config.wifi.mode;

        self.step(SetupStep::Reset, &AtCommand::Reset)?;
        self.step(SetupStep::DisableEcho, &AtCommand::DisableEcho)?;
        self.step(SetupStep::SetMode, &AtCommand::SetMode(mode))?;
        self.step(
            SetupStep::JoinNetwork,
            &AtCommand::JoinNetwork {
                ssid: ssid.as_str(),
                password: password.as_str(),
            },
        )?;

        self.state = ConnectionState::Idle;
        info!("modem bring-up complete, joined '{}'", ssid);
        Ok(())
    }

    fn step(&mut self, step: SetupStep, cmd: &AtCommand<'_>) -> Result<(), SetupError> {
        self.state = step.state();
        if let Err(cause) = self.driver.execute(cmd) {
            self.state = ConnectionState::Uninitialized;
            return Err(SetupError { step, cause });
        }
        self.driver.pause(self.config.timing.settle_delay_ms);
        Ok(())
    }

    /// One upload cycle: TCP connect, send the payload, classify the reply.
    ///
    /// On success the state returns to `Idle` and the cloud verdict is
    /// returned. On failure the cycle ends immediately; the caller invokes
    /// this again on its own schedule. A fatal fault during connect has
    /// already requested a device reboot by the time the error surfaces
    /// here.
    pub fn send_and_classify(&mut self, payload: &[u8]) -> Result<ActuateDecision, CycleError> {
        if self.state != ConnectionState::Idle {
            return Err(CycleError::NotJoined);
        }

        self.state = ConnectionState::TcpConnecting;
        let open = AtCommand::TcpOpen {
            host: self.config.server.host.as_str(),
            port: self.config.server.port,
        };
        if let Err(cause) = self.driver.execute(&open) {
            self.state = match cause {
                // Unreachable on hardware; kept coherent for test doubles.
                DriverError::FatalFault => ConnectionState::Uninitialized,
                _ => ConnectionState::Idle,
            };
            return Err(CycleError::TcpConnect(cause));
        }
        self.driver.pause(self.config.timing.settle_delay_ms);

        self.state = ConnectionState::Sending;
        if let Err(cause) = self.driver.send_payload(payload) {
            self.state = ConnectionState::Idle;
            return Err(CycleError::Send(cause));
        }

        self.state = ConnectionState::AwaitingReply;
        let actuate = match self.driver.await_verdict(&self.config.reply) {
            Ok(actuate) => actuate,
            Err(cause) => {
                self.state = ConnectionState::Idle;
                return Err(CycleError::Send(cause));
            }
        };

        self.state = ConnectionState::Idle;
        Ok(if actuate {
            ActuateDecision::Actuate
        } else {
            ActuateDecision::NoActuate
        })
    }

    /// Close the TCP connection (`AT+CIPCLOSE`).
    pub fn close(&mut self) -> Result<(), CycleError> {
        self.driver
            .execute(&AtCommand::TcpClose)
            .map_err(CycleError::Send)
    }

    /// Query the link status (`AT+CIPSTATUS`); the `+` status line is
    /// logged by the driver.
    pub fn query_status(&mut self) -> Result<(), CycleError> {
        self.driver
            .execute(&AtCommand::QueryStatus)
            .map_err(CycleError::Send)
    }

    /// The active configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Access the driver (mock inspection in tests).
    pub fn driver(&self) -> &ModemDriver<T, D, S> {
        &self.driver
    }

    /// Mutable access to the driver (mock scripting in tests).
    pub fn driver_mut(&mut self) -> &mut ModemDriver<T, D, S> {
        &mut self.driver
    }
}
