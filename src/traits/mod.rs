//! Core traits for the serial transport and board-level hardware.
//!
//! These abstractions are the seams that let the protocol core run against
//! mock implementations on desktop (see [`crate::hal::mock`]) and against
//! real peripherals on hardware (see `hal::esp32`, requires the `esp32`
//! feature).

mod hardware;
mod transport;

pub use hardware::{Delay, Dispenser, SystemControl, TemperatureSensor};
pub use transport::{ReadTimeout, Transport, TransportError};
