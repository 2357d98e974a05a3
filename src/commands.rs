//! AT command vocabulary and response classification.
//!
//! This module fixes the small AT dialect the dispenser needs from an
//! ESP8266-class module, and the rules for mapping each raw response line
//! to a [`Classification`].
//!
//! # Classification rules
//!
//! | Command | Success | Fatal |
//! |---------|---------|-------|
//! | `AT+RST` | exact `ready` | - |
//! | `ATE0` | exact `OK` | - |
//! | `AT+CWMODE=<n>` | exact `OK` | - |
//! | `AT+CWJAP="ssid","pwd"` | exact `OK` | - |
//! | `AT+CIPSTART="TCP","host",port` | exact `CONNECT` | `b`-prefix (busy) |
//! | `AT+CIPCLOSE` | exact `CLOSED` | - |
//! | `AT+CIPSTATUS` | `+` prefix | - |
//!
//! Anything else is [`Classification::Retryable`]: the modem emits echo
//! fragments, blank lines, and link status notifications that simply mean
//! "not yet".
//!
//! The payload reply (after `AT+CIPSEND`) is not classified per-line by
//! command; it is scanned with a [`ReplyPattern`].

use core::fmt::Write;

/// Maximum accepted response line length in bytes.
pub const MAX_LINE: usize = 512;

/// Rendered outbound command line (terminator added by the transport).
pub type CommandLine = heapless::String<256>;

/// Outcome of matching one response line against the command in flight.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Classification {
    /// The line is the expected terminal response.
    Success,
    /// Noise or a "not yet" line; log it, delay, read the next line.
    Retryable,
    /// A busy-class condition the modem cannot recover from in software.
    Fatal,
}

/// One outbound AT instruction.
///
/// Immutable once constructed; parameters borrow from the caller for the
/// duration of the call that issues the command.
///
/// # Example
///
/// ```rust
/// use rs_dispenser::commands::{AtCommand, Classification};
///
/// let cmd = AtCommand::TcpOpen { host: "52.22.106.58", port: 8090 };
/// assert_eq!(
///     cmd.render().unwrap().as_str(),
///     "AT+CIPSTART=\"TCP\",\"52.22.106.58\",8090",
/// );
/// assert_eq!(cmd.classify("CONNECT"), Classification::Success);
/// assert_eq!(cmd.classify("busy p..."), Classification::Fatal);
/// assert_eq!(cmd.classify("ATE0"), Classification::Retryable);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AtCommand<'a> {
    /// `AT+RST` - software reset of the module.
    Reset,
    /// `ATE0` - disable command echo.
    DisableEcho,
    /// `AT+CWMODE=<mode>` - 1 = client, 2 = access point, 3 = both.
    SetMode(u8),
    /// `AT+CWJAP` - join the configured WiFi network.
    JoinNetwork {
        /// Network SSID.
        ssid: &'a str,
        /// Network password.
        password: &'a str,
    },
    /// `AT+CIPSTART` - open a TCP connection to the cloud endpoint.
    TcpOpen {
        /// Server hostname or dotted IP.
        host: &'a str,
        /// Server TCP port.
        port: u16,
    },
    /// `AT+CIPCLOSE` - close the TCP connection.
    TcpClose,
    /// `AT+CIPSTATUS` - query the link status.
    QueryStatus,
    /// `AT+CIPSEND=<len>` - announce a payload of `len` bytes.
    AnnouncePayload {
        /// Payload byte length.
        len: usize,
    },
    /// `AT+GMR` - query firmware version (diagnostics only).
    QueryVersion,
}

impl<'a> AtCommand<'a> {
    /// Render the command into an outbound line.
    ///
    /// Fails only if the parameters overflow the line buffer, which bounded
    /// config strings cannot do.
    pub fn render(&self) -> Result<CommandLine, core::fmt::Error> {
        let mut line = CommandLine::new();
        match self {
            AtCommand::Reset => line.push_str("AT+RST").map_err(|_| core::fmt::Error)?,
            AtCommand::DisableEcho => line.push_str("ATE0").map_err(|_| core::fmt::Error)?,
            AtCommand::SetMode(mode) => write!(line, "AT+CWMODE={}", mode)?,
            AtCommand::JoinNetwork { ssid, password } => {
                write!(line, "AT+CWJAP=\"{}\",\"{}\"", ssid, password)?
            }
            AtCommand::TcpOpen { host, port } => {
                write!(line, "AT+CIPSTART=\"TCP\",\"{}\",{}", host, port)?
            }
            AtCommand::TcpClose => line.push_str("AT+CIPCLOSE").map_err(|_| core::fmt::Error)?,
            AtCommand::QueryStatus => {
                line.push_str("AT+CIPSTATUS").map_err(|_| core::fmt::Error)?
            }
            AtCommand::AnnouncePayload { len } => write!(line, "AT+CIPSEND={}", len)?,
            AtCommand::QueryVersion => line.push_str("AT+GMR").map_err(|_| core::fmt::Error)?,
        }
        Ok(line)
    }

    /// Classify one response line for this command.
    ///
    /// [`AnnouncePayload`](Self::AnnouncePayload) and
    /// [`QueryVersion`](Self::QueryVersion) have no terminal line of their
    /// own (the payload reply is scanned with a [`ReplyPattern`], version
    /// output is informational), so every line is `Retryable` for them.
    pub fn classify(&self, line: &str) -> Classification {
        match self {
            AtCommand::Reset if line == "ready" => Classification::Success,
            AtCommand::DisableEcho | AtCommand::SetMode(_) | AtCommand::JoinNetwork { .. }
                if line == "OK" =>
            {
                Classification::Success
            }
            AtCommand::TcpOpen { .. } => match line {
                "CONNECT" => Classification::Success,
                // "busy p..." / "busy s...": the module needs a power-level
                // reset, not another attempt.
                _ if line.starts_with('b') => Classification::Fatal,
                _ => Classification::Retryable,
            },
            AtCommand::TcpClose if line == "CLOSED" => Classification::Success,
            AtCommand::QueryStatus if line.starts_with('+') => Classification::Success,
            _ => Classification::Retryable,
        }
    }
}

// ============================================================================
// Payload reply scanning
// ============================================================================

/// Maximum length of the marker and terminal code patterns.
pub const MAX_PATTERN: usize = 32;

/// Pattern string used by [`ReplyPattern`].
pub type PatternString = heapless::String<MAX_PATTERN>;

fn pattern_string(s: &str) -> PatternString {
    let mut p = PatternString::new();
    let valid_end = s
        .char_indices()
        .take_while(|(i, c)| i + c.len_utf8() <= MAX_PATTERN)
        .last()
        .map(|(i, c)| i + c.len_utf8())
        .unwrap_or(0);
    let _ = p.push_str(&s[..valid_end]);
    p
}

/// Application-level pattern located inside the modem's `+IPD` notification.
///
/// The cloud server embeds its verdict in the HTTP response body; the modem
/// hands the body back inside an asynchronous `+IPD,<n>:<data>` line. The
/// scanner locates `marker` in that line and prefix-matches the remainder
/// against the two terminal codes. Trailing protocol noise after the code
/// (typically `CLOSED`) is tolerated.
///
/// The exact marker and codes are server-defined, so they are configuration
/// rather than constants. Defaults match the production cloud service.
///
/// # Example
///
/// ```rust
/// use rs_dispenser::ReplyPattern;
///
/// let pattern = ReplyPattern::default();
/// assert_eq!(pattern.scan("+IPD,12:xxHANUIDISPRETCODE1CLOSED"), Some(true));
/// assert_eq!(pattern.scan("+IPD,12:xxHANUIDISPRETCODE0CLOSED"), Some(false));
/// assert_eq!(pattern.scan("SEND OK"), None);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ReplyPattern {
    /// Marker substring that anchors the verdict inside the `+` line.
    pub marker: PatternString,
    /// Terminal code meaning "start dispensing".
    pub actuate: PatternString,
    /// Terminal code meaning "do not dispense".
    pub no_actuate: PatternString,
}

impl Default for ReplyPattern {
    fn default() -> Self {
        Self {
            marker: pattern_string("HAN"),
            actuate: pattern_string("UIDISPRETCODE1"),
            no_actuate: pattern_string("UIDISPRETCODE0"),
        }
    }
}

impl ReplyPattern {
    /// Set the marker substring.
    pub fn with_marker(mut self, marker: &str) -> Self {
        self.marker = pattern_string(marker);
        self
    }

    /// Set the "actuate" terminal code.
    pub fn with_actuate(mut self, code: &str) -> Self {
        self.actuate = pattern_string(code);
        self
    }

    /// Set the "do not actuate" terminal code.
    pub fn with_no_actuate(mut self, code: &str) -> Self {
        self.no_actuate = pattern_string(code);
        self
    }

    /// Scan one response line for a verdict.
    ///
    /// Returns `Some(true)` for actuate, `Some(false)` for no-actuate, and
    /// `None` for anything else (the caller keeps reading).
    pub fn scan(&self, line: &str) -> Option<bool> {
        if !line.starts_with('+') {
            return None;
        }
        let at = line.find(self.marker.as_str())?;
        let rest = &line[at + self.marker.len()..];
        if rest.starts_with(self.actuate.as_str()) {
            Some(true)
        } else if rest.starts_with(self.no_actuate.as_str()) {
            Some(false)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // Render tests
    // =========================================================================

    #[test]
    fn render_reset() {
        assert_eq!(AtCommand::Reset.render().unwrap().as_str(), "AT+RST");
    }

    #[test]
    fn render_disable_echo() {
        assert_eq!(AtCommand::DisableEcho.render().unwrap().as_str(), "ATE0");
    }

    #[test]
    fn render_set_mode() {
        assert_eq!(
            AtCommand::SetMode(1).render().unwrap().as_str(),
            "AT+CWMODE=1"
        );
    }

    #[test]
    fn render_join_network() {
        let cmd = AtCommand::JoinNetwork {
            ssid: "EvenPrime2",
            password: "secret",
        };
        assert_eq!(
            cmd.render().unwrap().as_str(),
            "AT+CWJAP=\"EvenPrime2\",\"secret\""
        );
    }

    #[test]
    fn render_tcp_open() {
        let cmd = AtCommand::TcpOpen {
            host: "52.22.106.58",
            port: 8090,
        };
        assert_eq!(
            cmd.render().unwrap().as_str(),
            "AT+CIPSTART=\"TCP\",\"52.22.106.58\",8090"
        );
    }

    #[test]
    fn render_announce_payload() {
        let cmd = AtCommand::AnnouncePayload { len: 142 };
        assert_eq!(cmd.render().unwrap().as_str(), "AT+CIPSEND=142");
    }

    // =========================================================================
    // Classification tests
    // =========================================================================

    #[test]
    fn reset_requires_exact_ready() {
        assert_eq!(AtCommand::Reset.classify("ready"), Classification::Success);
        assert_eq!(AtCommand::Reset.classify("OK"), Classification::Retryable);
        assert_eq!(
            AtCommand::Reset.classify("ready!"),
            Classification::Retryable
        );
        assert_eq!(AtCommand::Reset.classify(""), Classification::Retryable);
    }

    #[test]
    fn ok_commands_require_exact_ok() {
        let join = AtCommand::JoinNetwork {
            ssid: "a",
            password: "b",
        };
        for cmd in [AtCommand::DisableEcho, AtCommand::SetMode(1), join] {
            assert_eq!(cmd.classify("OK"), Classification::Success);
            assert_eq!(cmd.classify("WIFI CONNECTED"), Classification::Retryable);
            assert_eq!(cmd.classify("ERROR"), Classification::Retryable);
        }
    }

    #[test]
    fn tcp_open_connect_succeeds() {
        let cmd = AtCommand::TcpOpen {
            host: "h",
            port: 80,
        };
        assert_eq!(cmd.classify("CONNECT"), Classification::Success);
    }

    #[test]
    fn tcp_open_busy_is_fatal() {
        let cmd = AtCommand::TcpOpen {
            host: "h",
            port: 80,
        };
        assert_eq!(cmd.classify("busy p..."), Classification::Fatal);
        assert_eq!(cmd.classify("busy s..."), Classification::Fatal);
        // Only the TCP open path treats busy as fatal.
        assert_eq!(
            AtCommand::TcpClose.classify("busy p..."),
            Classification::Retryable
        );
    }

    #[test]
    fn tcp_open_noise_is_retryable() {
        let cmd = AtCommand::TcpOpen {
            host: "h",
            port: 80,
        };
        assert_eq!(cmd.classify(""), Classification::Retryable);
        assert_eq!(cmd.classify("ERROR"), Classification::Retryable);
    }

    #[test]
    fn tcp_close_requires_closed() {
        assert_eq!(
            AtCommand::TcpClose.classify("CLOSED"),
            Classification::Success
        );
        assert_eq!(
            AtCommand::TcpClose.classify("OK"),
            Classification::Retryable
        );
    }

    #[test]
    fn query_status_matches_plus_prefix() {
        assert_eq!(
            AtCommand::QueryStatus.classify("+CIPSTATUS:3"),
            Classification::Success
        );
        assert_eq!(
            AtCommand::QueryStatus.classify("STATUS:3"),
            Classification::Retryable
        );
    }

    #[test]
    fn announce_and_version_never_terminate() {
        let cmd = AtCommand::AnnouncePayload { len: 10 };
        assert_eq!(cmd.classify("OK"), Classification::Retryable);
        assert_eq!(cmd.classify(">"), Classification::Retryable);
        assert_eq!(
            AtCommand::QueryVersion.classify("OK"),
            Classification::Retryable
        );
    }

    // =========================================================================
    // ReplyPattern tests
    // =========================================================================

    #[test]
    fn scan_actuate_with_trailing_noise() {
        let pattern = ReplyPattern::default();
        assert_eq!(pattern.scan("+IPD,12:xxHANUIDISPRETCODE1CLOSED"), Some(true));
    }

    #[test]
    fn scan_no_actuate() {
        let pattern = ReplyPattern::default();
        assert_eq!(
            pattern.scan("+IPD,12:xxHANUIDISPRETCODE0CLOSED"),
            Some(false)
        );
    }

    #[test]
    fn scan_ignores_lines_without_plus_prefix() {
        let pattern = ReplyPattern::default();
        assert_eq!(pattern.scan("HANUIDISPRETCODE1"), None);
        assert_eq!(pattern.scan("SEND OK"), None);
        assert_eq!(pattern.scan(""), None);
    }

    #[test]
    fn scan_ignores_plus_lines_without_marker() {
        let pattern = ReplyPattern::default();
        assert_eq!(pattern.scan("+IPD,4:pong"), None);
    }

    #[test]
    fn scan_ignores_unknown_code_after_marker() {
        let pattern = ReplyPattern::default();
        assert_eq!(pattern.scan("+IPD,12:xxHANUIDISPRETCODE9CLOSED"), None);
    }

    #[test]
    fn scan_with_custom_pattern() {
        let pattern = ReplyPattern::default()
            .with_marker("ACME")
            .with_actuate("GO")
            .with_no_actuate("NO");
        assert_eq!(pattern.scan("+IPD,6:zzACMEGO"), Some(true));
        assert_eq!(pattern.scan("+IPD,6:zzACMENOx"), Some(false));
        assert_eq!(pattern.scan("+IPD,6:zzHANGO"), None);
    }
}
