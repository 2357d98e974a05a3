//! ESP32 implementations over esp-idf.
//!
//! The ESP8266 WiFi module hangs off a UART ([`Esp32Uart`]), the dispenser
//! is a servo on an LEDC PWM channel ([`Esp32Servo`]), and reboot/delay go
//! through FreeRTOS ([`Esp32System`], [`FreeRtosDelay`]).

mod servo;
mod system;
mod uart;

pub use servo::Esp32Servo;
pub use system::{Esp32System, FreeRtosDelay};
pub use uart::Esp32Uart;
