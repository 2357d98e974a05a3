//! Line-oriented transport over an ESP32 UART.
//!
//! Wraps `UartDriver` with byte-at-a-time line assembly: the modem
//! terminates every response with CRLF, so we accumulate until `\n` and
//! drop the `\r`.

use crate::commands::MAX_LINE;
use crate::traits::{ReadTimeout, Transport, TransportError};
use esp_idf_hal::delay::{TickType, BLOCK};
use esp_idf_hal::uart::UartDriver;

/// UART transport to the ESP8266 module.
///
/// # Example
///
/// ```ignore
/// use esp_idf_hal::uart::{config::Config as UartConfig, UartDriver};
/// use esp_idf_hal::units::Hertz;
/// use rs_dispenser::hal::esp32::Esp32Uart;
///
/// let uart = UartDriver::new(
///     peripherals.uart1,
///     peripherals.pins.gpio4,
///     peripherals.pins.gpio5,
///     Option::<esp_idf_hal::gpio::AnyIOPin>::None,
///     Option::<esp_idf_hal::gpio::AnyIOPin>::None,
///     &UartConfig::new().baudrate(Hertz(115_200)),
/// )?;
/// let transport = Esp32Uart::new(uart);
/// ```
pub struct Esp32Uart<'d> {
    uart: UartDriver<'d>,
}

impl<'d> Esp32Uart<'d> {
    /// Wrap a configured UART driver.
    pub fn new(uart: UartDriver<'d>) -> Self {
        Self { uart }
    }

    fn ticks(timeout: ReadTimeout) -> u32 {
        match timeout {
            ReadTimeout::Forever => BLOCK,
            ReadTimeout::Millis(ms) => TickType::new_millis(u64::from(ms)).ticks(),
        }
    }
}

impl<'d> Transport for Esp32Uart<'d> {
    fn send_line(&mut self, line: &str) -> Result<(), TransportError> {
        self.uart
            .write(line.as_bytes())
            .and_then(|_| self.uart.write(b"\r\n"))
            .map(|_| ())
            .map_err(|_| TransportError::ChannelClosed)
    }

    fn send_raw(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        self.uart
            .write(bytes)
            .map(|_| ())
            .map_err(|_| TransportError::ChannelClosed)
    }

    fn read_line(&mut self, buf: &mut [u8], timeout: ReadTimeout) -> Result<usize, TransportError> {
        let ticks = Self::ticks(timeout);
        let mut len = 0usize;
        loop {
            let mut byte = [0u8; 1];
            let n = self
                .uart
                .read(&mut byte, ticks)
                .map_err(|_| TransportError::ChannelClosed)?;
            if n == 0 {
                return Err(TransportError::TimedOut);
            }
            match byte[0] {
                b'\n' => return Ok(len),
                b'\r' => {}
                b => {
                    if len >= buf.len().min(MAX_LINE) {
                        return Err(TransportError::BufferOverflow);
                    }
                    buf[len] = b;
                    len += 1;
                }
            }
        }
    }
}
