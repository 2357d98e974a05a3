//! # rs-dispenser
//!
//! A cloud-connected dispenser controller built around an ESP8266-class WiFi
//! modem driven over AT commands.
//!
//! ## Features
//!
//! - **Modem protocol driver**: AT command sequencing with per-command
//!   response classification and unbounded retry on protocol noise
//! - **Connection lifecycle**: fixed bring-up sequence (reset, echo off,
//!   client mode, network join) plus a per-cycle TCP connect/send/classify
//!   operation
//! - **Trigger hand-off**: single-slot coalescing signal shared by the
//!   Bluetooth handler and the cloud cycle, drained by the dispenser task
//! - **Hardware abstraction**: traits for the serial transport, delays,
//!   device reboot, the actuator, and the temperature sensor
//!
//! ## Architecture
//!
//! The crate is structured to allow testing on desktop without hardware:
//!
//! - `traits` - Transport and hardware abstractions
//! - `commands` - AT command vocabulary and response classification
//! - `driver` - Modem driver with retry/reset policy
//! - `connection` - Connection state machine (bring-up and per-cycle send)
//! - `trigger` - Cross-task single-slot trigger signal
//! - `orchestrator` - Glue between sensor, cloud cycle, BLE, and actuator
//! - `hal` - Concrete implementations (mock for testing, esp32 for hardware)
//!
//! ## Example
//!
//! ```rust
//! use rs_dispenser::{
//!     Config, ConnectionManager, ModemDriver,
//!     hal::{MockDelay, MockSystem, MockTransport},
//! };
//!
//! // Script the modem's side of the bring-up conversation.
//! let mut transport = MockTransport::new();
//! transport.push_reply("ready"); // AT+RST
//! transport.push_reply("OK");    // ATE0
//! transport.push_reply("OK");    // AT+CWMODE=1
//! transport.push_reply("OK");    // AT+CWJAP
//!
//! let config = Config::default();
//! let driver = ModemDriver::new(transport, MockDelay::new(), MockSystem::new(), &config.timing);
//! let mut conn = ConnectionManager::new(driver, config);
//!
//! conn.bring_up().unwrap();
//! assert!(conn.is_connected());
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]

/// AT command vocabulary and response classification rules.
pub mod commands;
/// Connection state machine: bring-up lifecycle and per-cycle send.
pub mod connection;
/// Modem driver: command execution with retry and reset escalation.
pub mod driver;
/// Core traits for the serial transport and board-level hardware.
pub mod traits;

/// Shared configuration for desktop and ESP32.
pub mod config;

/// Wire formats: sensor report body and raw HTTP/1.1 request assembly.
pub mod messages;

/// Hardware abstraction layer with mock implementations for testing.
#[cfg(feature = "std")]
pub mod hal;

/// Task glue: cloud cycle, Bluetooth handler, and dispenser consumer.
#[cfg(feature = "std")]
pub mod orchestrator;

/// Single-slot trigger signal shared across tasks.
#[cfg(feature = "std")]
pub mod trigger;

// Re-exports for convenience
pub use commands::{AtCommand, Classification, CommandLine, ReplyPattern, MAX_LINE};
pub use connection::{
    ActuateDecision, ConnectionManager, ConnectionState, CycleError, SetupError, SetupStep,
};
pub use driver::{DriverError, ModemDriver};
pub use messages::{build_post_request, format_body, PayloadBuffer, ReportBody};
pub use traits::{
    Delay, Dispenser, ReadTimeout, SystemControl, TemperatureSensor, Transport, TransportError,
};

// Config re-exports
pub use config::{Config, DeviceConfig, ServerConfig, TimingConfig, WifiConfig};

#[cfg(feature = "std")]
pub use orchestrator::{handle_ble_line, service_one_trigger, BleOutcome, CloudCycle};
#[cfg(feature = "std")]
pub use trigger::TriggerSignal;
