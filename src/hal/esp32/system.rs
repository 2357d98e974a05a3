//! FreeRTOS-backed delay and reset control.

use crate::traits::{Delay, SystemControl};
use esp_idf_hal::delay::FreeRtos;

/// Blocking delay through the FreeRTOS tick.
#[derive(Debug, Default)]
pub struct FreeRtosDelay;

impl FreeRtosDelay {
    /// Creates a FreeRTOS delay source.
    pub fn new() -> Self {
        Self
    }
}

impl Delay for FreeRtosDelay {
    fn delay_ms(&mut self, ms: u32) {
        FreeRtos::delay_ms(ms);
    }
}

/// Device reset through esp-idf.
#[derive(Debug, Default)]
pub struct Esp32System;

impl Esp32System {
    /// Creates a reset handle.
    pub fn new() -> Self {
        Self
    }
}

impl SystemControl for Esp32System {
    fn reboot(&mut self) {
        esp_idf_hal::reset::restart();
    }
}
