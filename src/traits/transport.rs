//! Line-oriented serial transport abstraction.
//!
//! The modem driver talks to the WiFi module through this trait. It is a
//! blocking, line-oriented byte channel: outbound AT commands go out as
//! CRLF-terminated lines, responses come back one complete line at a time.
//!
//! # Implementation Notes
//!
//! - `read_line` strips the line terminator before returning
//! - [`ReadTimeout::Forever`] must block until a line arrives; this is the
//!   default the protocol core relies on
//! - The transport owns its own RX/TX buffering; the driver never sees
//!   partial lines

/// How long a [`Transport::read_line`] call may block.
///
/// The protocol core waits forever for the next response line by default;
/// a bounded timeout is available as an opt-in extension.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ReadTimeout {
    /// Block until a complete line arrives.
    #[default]
    Forever,
    /// Give up after the given number of milliseconds.
    Millis(u32),
}

/// Errors surfaced by a transport implementation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransportError {
    /// A bounded read elapsed without a complete line arriving.
    TimedOut,
    /// The underlying channel is gone (peripheral torn down, mock script
    /// exhausted).
    ChannelClosed,
    /// A line longer than the caller's buffer arrived.
    BufferOverflow,
}

impl core::fmt::Display for TransportError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            TransportError::TimedOut => write!(f, "read timed out"),
            TransportError::ChannelClosed => write!(f, "transport channel closed"),
            TransportError::BufferOverflow => write!(f, "response line exceeds buffer"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for TransportError {}

/// Blocking, line-oriented byte channel to the modem.
///
/// # Example Implementation
///
/// ```rust,ignore
/// use rs_dispenser::traits::{ReadTimeout, Transport, TransportError};
///
/// struct MyUart { /* peripheral handles */ }
///
/// impl Transport for MyUart {
///     fn send_line(&mut self, line: &str) -> Result<(), TransportError> {
///         // write line bytes, then b"\r\n"
///         Ok(())
///     }
///
///     fn send_raw(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
///         // write bytes as-is
///         Ok(())
///     }
///
///     fn read_line(
///         &mut self,
///         buf: &mut [u8],
///         timeout: ReadTimeout,
///     ) -> Result<usize, TransportError> {
///         // block for the next complete line, copy it without the
///         // terminator, return its length
///         Ok(0)
///     }
/// }
/// ```
pub trait Transport {
    /// Send one line, appending the CRLF terminator.
    fn send_line(&mut self, line: &str) -> Result<(), TransportError>;

    /// Send raw bytes with no terminator (payload body after `AT+CIPSEND`).
    fn send_raw(&mut self, bytes: &[u8]) -> Result<(), TransportError>;

    /// Read the next complete line into `buf`, returning its length.
    ///
    /// The terminator is not included. Empty lines are valid and return 0.
    fn read_line(&mut self, buf: &mut [u8], timeout: ReadTimeout) -> Result<usize, TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_timeout_default_is_forever() {
        assert_eq!(ReadTimeout::default(), ReadTimeout::Forever);
    }

    #[test]
    fn transport_error_display() {
        assert_eq!(TransportError::TimedOut.to_string(), "read timed out");
        assert_eq!(
            TransportError::ChannelClosed.to_string(),
            "transport channel closed"
        );
        assert_eq!(
            TransportError::BufferOverflow.to_string(),
            "response line exceeds buffer"
        );
    }
}
