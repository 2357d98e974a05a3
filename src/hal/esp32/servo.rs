//! Servo dispenser using ESP32 LEDC PWM.
//!
//! One dispense sequence sweeps the spray arm out, holds, and returns to
//! neutral. Standard hobby-servo control: 50 Hz PWM with the position
//! encoded in the pulse duty.

use crate::traits::Dispenser;
use esp_idf_hal::delay::FreeRtos;
use esp_idf_hal::gpio::OutputPin;
use esp_idf_hal::ledc::{config::TimerConfig, LedcChannel, LedcDriver, LedcTimer, LedcTimerDriver};
use esp_idf_hal::peripheral::Peripheral;
use esp_idf_hal::prelude::*;

/// Servo-driven dispenser arm.
///
/// # Example
///
/// ```ignore
/// use esp_idf_hal::prelude::Peripherals;
/// use rs_dispenser::hal::esp32::Esp32Servo;
/// use rs_dispenser::traits::Dispenser;
///
/// let peripherals = Peripherals::take()?;
/// let mut servo = Esp32Servo::new(
///     peripherals.ledc.timer0,
///     peripherals.ledc.channel0,
///     peripherals.pins.gpio2,
/// )?;
/// servo.dispense()?;
/// ```
pub struct Esp32Servo<'d> {
    pwm: LedcDriver<'d>,
}

impl<'d> Esp32Servo<'d> {
    /// Servo PWM frequency.
    const PWM_FREQ_HZ: u32 = 50;

    /// Spray position duty, percent of the PWM period.
    const SPRAY_DUTY_PCT: u32 = 3;

    /// Neutral position duty, percent of the PWM period.
    const NEUTRAL_DUTY_PCT: u32 = 7;

    /// How long the arm holds each position (ms).
    const HOLD_MS: u32 = 2_000;

    /// Creates a servo dispenser on the given LEDC timer/channel/pin.
    pub fn new<T, C>(
        timer: impl Peripheral<P = T> + 'd,
        channel: impl Peripheral<P = C> + 'd,
        pin: impl Peripheral<P = impl OutputPin> + 'd,
    ) -> anyhow::Result<Self>
    where
        T: LedcTimer + 'd,
        C: LedcChannel<SpeedMode = T::SpeedMode>,
    {
        let timer_driver = LedcTimerDriver::new(
            timer,
            &TimerConfig::default().frequency(Self::PWM_FREQ_HZ.Hz()),
        )?;
        let mut pwm = LedcDriver::new(channel, timer_driver, pin)?;
        let duty = pwm.get_max_duty() * Self::NEUTRAL_DUTY_PCT / 100;
        pwm.set_duty(duty)?;
        Ok(Self { pwm })
    }

    fn set_position_pct(&mut self, pct: u32) -> anyhow::Result<()> {
        let duty = self.pwm.get_max_duty() * pct / 100;
        self.pwm.set_duty(duty)?;
        Ok(())
    }
}

impl<'d> Dispenser for Esp32Servo<'d> {
    type Error = anyhow::Error;

    fn dispense(&mut self) -> anyhow::Result<()> {
        self.set_position_pct(Self::SPRAY_DUTY_PCT)?;
        FreeRtos::delay_ms(Self::HOLD_MS);
        self.set_position_pct(Self::NEUTRAL_DUTY_PCT)?;
        FreeRtos::delay_ms(Self::HOLD_MS);
        Ok(())
    }
}
