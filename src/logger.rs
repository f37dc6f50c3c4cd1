//! Request and response dumps for an optional [`Logger`].

use bytes::Bytes;
use http::{HeaderMap, Request, Version};
use std::borrow::Cow;
use std::fmt::Write;
use std::str::Utf8Error;

use crate::RawResponse;

/// A sink for textual request and response dumps.
///
/// Logging is best-effort: nothing a logger does affects the request.
///
/// # Examples
///
/// ```
/// use restree::Logger;
/// use std::sync::Mutex;
///
/// #[derive(Default)]
/// struct Collect(Mutex<Vec<String>>);
///
/// impl Logger for Collect {
///     fn log(&self, message: &str) {
///         self.0.lock().unwrap().push(message.to_string());
///     }
/// }
/// ```
pub trait Logger: Send + Sync {
    /// Records one message.
    fn log(&self, message: &str);
}

/// Forwards dumps to `tracing` at debug level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn log(&self, message: &str) {
        tracing::debug!(target: "restree::dump", "{}", message);
    }
}

/// Renders a request the way it goes on the wire.
///
/// Fails if the body is not valid UTF-8.
pub fn dump_request(request: &Request<Bytes>) -> Result<String, Utf8Error> {
    let body = std::str::from_utf8(request.body())?;
    let target = request
        .uri()
        .path_and_query()
        .map_or("/", |pq| pq.as_str());

    let mut out = format!(
        "{} {} {}\r\n",
        request.method(),
        target,
        version_str(request.version())
    );
    if let Some(host) = request.uri().authority() {
        let _ = write!(out, "Host: {}\r\n", host);
    }
    write_headers(&mut out, request.headers());
    out.push_str("\r\n");
    out.push_str(body);
    Ok(out)
}

/// Renders a response the way it came off the wire.
///
/// Fails if the body is not valid UTF-8.
pub fn dump_response(response: &RawResponse) -> Result<String, Utf8Error> {
    let body = std::str::from_utf8(response.body())?;
    let status = response.status();

    let mut out = format!(
        "{} {} {}\r\n",
        version_str(response.version()),
        status.as_u16(),
        status.canonical_reason().unwrap_or_default()
    );
    write_headers(&mut out, response.headers());
    out.push_str("\r\n");
    out.push_str(body);
    Ok(out)
}

fn write_headers(out: &mut String, headers: &HeaderMap) {
    for (name, value) in headers {
        let value = if value.is_sensitive() {
            Cow::Borrowed("<redacted>")
        } else {
            String::from_utf8_lossy(value.as_bytes())
        };
        let _ = write!(out, "{}: {}\r\n", name, value);
    }
}

fn version_str(version: Version) -> &'static str {
    match version {
        Version::HTTP_09 => "HTTP/0.9",
        Version::HTTP_10 => "HTTP/1.0",
        Version::HTTP_2 => "HTTP/2.0",
        Version::HTTP_3 => "HTTP/3.0",
        _ => "HTTP/1.1",
    }
}
