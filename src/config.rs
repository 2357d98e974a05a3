//! Shared configuration for desktop and ESP32.
//!
//! Uses `heapless::String` for `no_std` compatibility while remaining
//! ergonomic to use on desktop with `std`.
//!
//! # Example
//!
//! ```rust
//! use rs_dispenser::config::{Config, ServerConfig, WifiConfig};
//!
//! // Use defaults
//! let config = Config::default();
//!
//! // Or customize
//! let config = Config::default()
//!     .with_wifi(WifiConfig::default().with_ssid("EvenPrime2").with_password("secret"))
//!     .with_server(ServerConfig::default().with_host("52.22.106.58").with_port(8090));
//! ```

use crate::commands::ReplyPattern;
use crate::traits::ReadTimeout;
use heapless::String as HString;

/// Maximum length for short config strings (SSIDs, hosts, device IDs)
pub const MAX_SHORT_STRING: usize = 64;

/// Maximum length for longer config strings (endpoint paths)
pub const MAX_LONG_STRING: usize = 128;

/// Type alias for short config strings
pub type ShortString = HString<MAX_SHORT_STRING>;

/// Type alias for longer config strings
pub type LongString = HString<MAX_LONG_STRING>;

/// Create a ShortString from a &str, truncating if too long
pub fn short_string(s: &str) -> ShortString {
    let mut hs = ShortString::new();
    // Last char boundary that still fits the capacity
    let valid_end = s
        .char_indices()
        .take_while(|(i, c)| i + c.len_utf8() <= MAX_SHORT_STRING)
        .last()
        .map(|(i, c)| i + c.len_utf8())
        .unwrap_or(0);
    let _ = hs.push_str(&s[..valid_end]);
    hs
}

/// Create a LongString from a &str, truncating if too long
pub fn long_string(s: &str) -> LongString {
    let mut hs = LongString::new();
    let valid_end = s
        .char_indices()
        .take_while(|(i, c)| i + c.len_utf8() <= MAX_LONG_STRING)
        .last()
        .map(|(i, c)| i + c.len_utf8())
        .unwrap_or(0);
    let _ = hs.push_str(&s[..valid_end]);
    hs
}

// ============================================================================
// Main Config
// ============================================================================

/// Complete application configuration
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Config {
    /// WiFi network configuration
    pub wifi: WifiConfig,
    /// Cloud server endpoint configuration
    pub server: ServerConfig,
    /// Device identification
    pub device: DeviceConfig,
    /// Protocol timing knobs
    pub timing: TimingConfig,
    /// Cloud reply marker and terminal codes
    pub reply: ReplyPattern,
}

impl Config {
    /// Set WiFi configuration
    pub fn with_wifi(mut self, wifi: WifiConfig) -> Self {
        self.wifi = wifi;
        self
    }

    /// Set server configuration
    pub fn with_server(mut self, server: ServerConfig) -> Self {
        self.server = server;
        self
    }

    /// Set device configuration
    pub fn with_device(mut self, device: DeviceConfig) -> Self {
        self.device = device;
        self
    }

    /// Set timing configuration
    pub fn with_timing(mut self, timing: TimingConfig) -> Self {
        self.timing = timing;
        self
    }

    /// Set the cloud reply pattern
    pub fn with_reply(mut self, reply: ReplyPattern) -> Self {
        self.reply = reply;
        self
    }
}

// ============================================================================
// WiFi Config
// ============================================================================

/// WiFi network configuration
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WifiConfig {
    /// Network SSID
    pub ssid: ShortString,
    /// Network password
    pub password: ShortString,
    /// Module mode: 1 = client, 2 = access point, 3 = both
    pub mode: u8,
}

impl Default for WifiConfig {
    fn default() -> Self {
        Self {
            ssid: ShortString::new(),
            password: ShortString::new(),
            mode: 1,
        }
    }
}

impl WifiConfig {
    /// Set the network SSID
    pub fn with_ssid(mut self, ssid: &str) -> Self {
        self.ssid = short_string(ssid);
        self
    }

    /// Set the network password
    pub fn with_password(mut self, password: &str) -> Self {
        self.password = short_string(password);
        self
    }

    /// Set the module mode
    pub fn with_mode(mut self, mode: u8) -> Self {
        self.mode = mode;
        self
    }
}

// ============================================================================
// Server Config
// ============================================================================

/// Cloud server endpoint configuration
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ServerConfig {
    /// Server hostname or dotted IP
    pub host: ShortString,
    /// Server TCP port
    pub port: u16,
    /// POST endpoint path
    pub path: LongString,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: short_string("52.22.106.58"),
            port: 8090,
            path: long_string("/inteliidispenserSvc/api/sensor/"),
        }
    }
}

impl ServerConfig {
    /// Set the server host
    pub fn with_host(mut self, host: &str) -> Self {
        self.host = short_string(host);
        self
    }

    /// Set the server port
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the endpoint path
    pub fn with_path(mut self, path: &str) -> Self {
        self.path = long_string(path);
        self
    }
}

// ============================================================================
// Device Config
// ============================================================================

/// Device identification
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DeviceConfig {
    /// Device ID reported in the sensor body
    pub id: ShortString,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            id: short_string("1"),
        }
    }
}

impl DeviceConfig {
    /// Set the device ID
    pub fn with_id(mut self, id: &str) -> Self {
        self.id = short_string(id);
        self
    }
}

// ============================================================================
// Timing Config
// ============================================================================

/// Protocol timing knobs.
///
/// Defaults match the deployed controller: 2 s between response reads,
/// 5 s settle after each bring-up step, a 60 s cloud cycle, and reads that
/// block until the modem answers.
#[derive(Clone, Copy, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TimingConfig {
    /// Delay after a retryable response line before the next read (ms)
    pub retry_delay_ms: u32,
    /// Settle delay after every bring-up step (ms)
    pub settle_delay_ms: u32,
    /// Period of the cloud upload cycle (ms)
    pub cycle_period_ms: u32,
    /// How long one response read may block
    pub read_timeout: ReadTimeout,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            retry_delay_ms: 2_000,
            settle_delay_ms: 5_000,
            cycle_period_ms: 60_000,
            read_timeout: ReadTimeout::Forever,
        }
    }
}

impl TimingConfig {
    /// Set the inter-read retry delay
    pub fn with_retry_delay_ms(mut self, ms: u32) -> Self {
        self.retry_delay_ms = ms;
        self
    }

    /// Set the bring-up settle delay
    pub fn with_settle_delay_ms(mut self, ms: u32) -> Self {
        self.settle_delay_ms = ms;
        self
    }

    /// Set the cloud cycle period
    pub fn with_cycle_period_ms(mut self, ms: u32) -> Self {
        self.cycle_period_ms = ms;
        self
    }

    /// Bound response reads instead of blocking forever
    pub fn with_read_timeout(mut self, timeout: ReadTimeout) -> Self {
        self.read_timeout = timeout;
        self
    }
}
