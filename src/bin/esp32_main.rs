//! ESP32 dispenser controller entry point.
//!
//! Spawns the controller's three tasks:
//! - **cloud task**: brings up the ESP8266 module on UART1, then uploads a
//!   temperature report every cycle and raises the dispense trigger when
//!   the server says so
//! - **BLE task**: reads command lines from the Bluetooth module on UART2
//!   and raises the trigger on the manual-test command
//! - **dispenser task**: drains the trigger and runs the servo sequence
//!
//! # Build
//!
//! ```bash
//! cargo build --features esp32 --bin esp32_main
//! ```

use esp_idf_hal::delay::FreeRtos;
use esp_idf_hal::gpio::AnyIOPin;
use esp_idf_hal::peripherals::Peripherals;
use esp_idf_hal::prelude::*;
use esp_idf_hal::uart::{config::Config as UartConfig, UartDriver};
use rs_dispenser::hal::esp32::{Esp32Servo, Esp32System, Esp32Uart, FreeRtosDelay};
use rs_dispenser::{
    handle_ble_line, service_one_trigger, CloudCycle, Config, ConnectionManager, ModemDriver,
    TemperatureSensor, TriggerSignal, WifiConfig,
};
use std::sync::Arc;
use std::thread;

/// Stack size for the cloud task; AT response buffering needs headroom.
const CLOUD_TASK_STACK: usize = 20 * 1024;

/// Stack size for the BLE and dispenser tasks.
const SMALL_TASK_STACK: usize = 8 * 1024;

/// Placeholder sensor until the real probe is wired in.
struct FixedSensor(f32);

impl TemperatureSensor for FixedSensor {
    fn read_celsius(&mut self) -> f32 {
        self.0
    }
}

fn main() -> anyhow::Result<()> {
    // Initialize ESP-IDF
    esp_idf_hal::sys::link_patches();
    esp_idf_svc::log::EspLogger::initialize_default();

    log::info!("********* Intelligent Dispenser *********");

    let config = Config::default().with_wifi(
        WifiConfig::default()
            .with_ssid(option_env!("WIFI_SSID").unwrap_or(""))
            .with_password(option_env!("WIFI_PASSWORD").unwrap_or("")),
    );

    let peripherals = Peripherals::take()?;
    let trigger = Arc::new(TriggerSignal::new());

    // ESP8266 WiFi module on UART1
    let modem_uart = UartDriver::new(
        peripherals.uart1,
        peripherals.pins.gpio4,
        peripherals.pins.gpio5,
        Option::<AnyIOPin>::None,
        Option::<AnyIOPin>::None,
        &UartConfig::new().baudrate(Hertz(115_200)),
    )?;

    // Bluetooth module on UART2
    let ble_uart = UartDriver::new(
        peripherals.uart2,
        peripherals.pins.gpio17,
        peripherals.pins.gpio16,
        Option::<AnyIOPin>::None,
        Option::<AnyIOPin>::None,
        &UartConfig::new().baudrate(Hertz(9_600)),
    )?;

    let mut servo = Esp32Servo::new(
        peripherals.ledc.timer0,
        peripherals.ledc.channel0,
        peripherals.pins.gpio2,
    )?;

    // Dispenser task: drain triggers, one servo sequence each.
    let dispenser_trigger = Arc::clone(&trigger);
    thread::Builder::new()
        .name("dispenser".into())
        .stack_size(SMALL_TASK_STACK)
        .spawn(move || loop {
            if let Err(e) = service_one_trigger(&dispenser_trigger, &mut servo) {
                log::error!("dispense failed: {:?}", e);
            }
        })?;

    // BLE task: line-at-a-time command handling.
    let ble_trigger = Arc::clone(&trigger);
    thread::Builder::new()
        .name("ble".into())
        .stack_size(SMALL_TASK_STACK)
        .spawn(move || {
            let mut transport = Esp32Uart::new(ble_uart);
            let mut buf = [0u8; 256];
            loop {
                use rs_dispenser::traits::{ReadTimeout, Transport};
                match transport.read_line(&mut buf, ReadTimeout::Forever) {
                    Ok(n) => {
                        let line = core::str::from_utf8(&buf[..n]).unwrap_or("");
                        handle_ble_line(line, &ble_trigger);
                    }
                    Err(e) => log::warn!("ble read failed: {}", e),
                }
            }
        })?;

    // Cloud task: bring-up, then one upload per cycle period.
    let cloud_trigger = Arc::clone(&trigger);
    let cycle_period_ms = config.timing.cycle_period_ms;
    thread::Builder::new()
        .name("cloud".into())
        .stack_size(CLOUD_TASK_STACK)
        .spawn(move || {
            let driver = ModemDriver::new(
                Esp32Uart::new(modem_uart),
                FreeRtosDelay::new(),
                Esp32System::new(),
                &config.timing,
            );
            let mut conn = ConnectionManager::new(driver, config);

            while let Err(e) = conn.bring_up() {
                log::error!("bring-up failed: {}", e);
            }

            let mut sensor = FixedSensor(23.5);
            loop {
                let _ = CloudCycle::new(&mut conn, &mut sensor, &cloud_trigger).run_once();
                FreeRtos::delay_ms(cycle_period_ms);
            }
        })?;

    // Tasks own the device from here on.
    loop {
        FreeRtos::delay_ms(10_000);
    }
}
