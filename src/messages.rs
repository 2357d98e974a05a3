//! Wire formats: sensor report body and raw HTTP/1.1 request assembly.
//!
//! The cloud channel is not full HTTP. Requests are assembled manually as
//! plain text (method line, `Host` header, `Content-Length` header, blank
//! line, body) and shipped as the AT payload; the response is never parsed
//! as HTTP, only scanned for the reply pattern (see
//! [`ReplyPattern`](crate::commands::ReplyPattern)).

use crate::config::ServerConfig;
use core::fmt::Write;

/// Buffer holding one formatted sensor report body.
pub type ReportBody = heapless::String<128>;

/// Buffer holding one assembled HTTP request.
pub type PayloadBuffer = heapless::String<512>;

/// Format the sensor report body.
///
/// The cloud service expects the temperature as a string with exactly two
/// decimals.
///
/// # Example
///
/// ```rust
/// use rs_dispenser::format_body;
///
/// let body = format_body("1", 23.5);
/// assert_eq!(body.as_str(), "{\"id\":\"1\",\"temperature\":\"23.50\"}");
/// ```
pub fn format_body(device_id: &str, celsius: f32) -> ReportBody {
    let mut body = ReportBody::new();
    let _ = write!(
        body,
        "{{\"id\":\"{}\",\"temperature\":\"{:.2}\"}}",
        device_id, celsius
    );
    body
}

/// Assemble the raw HTTP/1.1 POST request for one report body.
///
/// `Content-Length` is the exact byte length of `body`; the trailing blank
/// line after the body is protocol padding the server expects and is not
/// counted.
pub fn build_post_request(server: &ServerConfig, body: &str) -> PayloadBuffer {
    let mut request = PayloadBuffer::new();
    let _ = write!(
        request,
        "POST {} HTTP/1.1\r\nHost: {}:{}\r\nContent-Length:{}\r\n\r\n{}\r\n\r\n",
        server.path, server.host, server.port, body.len(), body
    );
    request
}
