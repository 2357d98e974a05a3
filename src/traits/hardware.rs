//! Board-level hardware traits: delays, reboot, actuator, sensor.
//!
//! | Trait | Purpose |
//! |-------|---------|
//! | [`Delay`] | Blocking millisecond delay between response reads |
//! | [`SystemControl`] | Full device reboot for unrecoverable modem faults |
//! | [`Dispenser`] | One-shot mechanical dispense sequence |
//! | [`TemperatureSensor`] | Current temperature reading for cloud uploads |
//!
//! The protocol core only ever calls these through generic parameters, so
//! tests substitute the mocks from [`crate::hal::mock`].

/// Blocking delay source.
///
/// The modem driver inserts fixed delays between response reads and the
/// connection manager inserts settle delays between bring-up steps. On
/// hardware this maps to the RTOS tick delay; in tests it is a recorder.
pub trait Delay {
    /// Block the calling task for `ms` milliseconds.
    fn delay_ms(&mut self, ms: u32);
}

/// Device-level reset control.
///
/// A busy-class response during TCP connect leaves the modem in a state
/// that software-level `AT+RST` does not recover; the driver escalates to a
/// full device reboot through this trait.
pub trait SystemControl {
    /// Reboot the device.
    ///
    /// On real hardware this does not return. Test doubles return so that
    /// the escalation path can be asserted; callers must treat everything
    /// after a `reboot()` call as unreachable on hardware.
    fn reboot(&mut self);
}

/// Mechanical dispenser actuator.
///
/// One call runs the full spray sequence (servo sweep out and back). The
/// trigger coordinator guarantees at most one pending request, so an
/// implementation never needs to handle overlapping calls.
pub trait Dispenser {
    /// Error type for actuation failures.
    type Error;

    /// Run one dispense sequence to completion.
    fn dispense(&mut self) -> Result<(), Self::Error>;
}

/// Temperature sensor read by the cloud cycle.
pub trait TemperatureSensor {
    /// Current temperature in degrees Celsius.
    fn read_celsius(&mut self) -> f32;
}
