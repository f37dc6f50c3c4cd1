//! Raw responses and their classification.
//!
//! Every response body is buffered in full before it reaches a resource, so
//! the caller can read it again after the library has inspected it, no
//! matter which branch of the classification it took.

use crate::{Error, Result};
use bytes::{Buf, Bytes};
use http::{HeaderMap, StatusCode, Version};
use serde::de::DeserializeOwned;

/// How a completed exchange is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseClass {
    /// Status 400 or above. Not decoded and not reported as an error.
    ErrorStatus,
    /// Status 204. Headers are propagated, the body is ignored.
    NoContent,
    /// Anything else. Headers are propagated and the body is decoded.
    Content,
}

/// The last HTTP response received by a resource.
///
/// # Examples
///
/// ```no_run
/// use restree::Api;
///
/// # async fn example() -> Result<(), restree::Error> {
/// let api = Api::builder().base_url("https://api.example.com")?.build()?;
/// let mut user = api.root().res("users").id(404);
/// user.get().await?;
///
/// if let Some(raw) = user.raw() {
///     if raw.status().is_client_error() {
///         eprintln!("{}: {}", raw.status(), raw.text());
///     }
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct RawResponse {
    status: StatusCode,
    version: Version,
    headers: HeaderMap,
    body: Bytes,
}

impl RawResponse {
    /// Creates a `RawResponse` from its parts.
    pub fn new(status: StatusCode, version: Version, headers: HeaderMap, body: Bytes) -> Self {
        Self {
            status,
            version,
            headers,
            body,
        }
    }

    /// Returns the HTTP status code.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Returns the HTTP version.
    pub fn version(&self) -> Version {
        self.version
    }

    /// Returns the response headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns the first value of a header, if it is valid UTF-8.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)?.to_str().ok()
    }

    /// Returns the buffered body.
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Returns the body as text, replacing invalid UTF-8.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Returns a fresh reader over the body.
    ///
    /// Each call starts from the beginning of the body.
    pub fn reader(&self) -> impl std::io::Read {
        self.body.clone().reader()
    }

    /// Decodes the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        self.decode()
    }

    /// Classifies the response.
    pub fn classify(&self) -> ResponseClass {
        if self.status.as_u16() >= 400 {
            ResponseClass::ErrorStatus
        } else if self.status == StatusCode::NO_CONTENT {
            ResponseClass::NoContent
        } else {
            ResponseClass::Content
        }
    }

    pub(crate) fn decode<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_slice(&self.body).map_err(|e| {
            let raw_response = self.text();
            tracing::error!(
                error = %e,
                raw_response = %raw_response,
                "Failed to decode response"
            );
            Error::Decode {
                raw_response,
                serde_error: e.to_string(),
                status: self.status,
            }
        })
    }
}

impl From<http::Response<Bytes>> for RawResponse {
    fn from(response: http::Response<Bytes>) -> Self {
        let (parts, body) = response.into_parts();
        Self::new(parts.status, parts.version, parts.headers, body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::io::Read;

    fn response(status: u16, body: &'static str) -> RawResponse {
        RawResponse::new(
            StatusCode::from_u16(status).unwrap(),
            Version::HTTP_11,
            HeaderMap::new(),
            Bytes::from_static(body.as_bytes()),
        )
    }

    #[test]
    fn test_classification() {
        assert_eq!(response(200, "{}").classify(), ResponseClass::Content);
        assert_eq!(response(201, "{}").classify(), ResponseClass::Content);
        assert_eq!(response(204, "").classify(), ResponseClass::NoContent);
        assert_eq!(response(304, "").classify(), ResponseClass::Content);
        assert_eq!(response(404, "").classify(), ResponseClass::ErrorStatus);
        assert_eq!(response(503, "").classify(), ResponseClass::ErrorStatus);
    }

    #[test]
    fn test_body_is_rereadable() {
        let raw = response(404, "Not found");

        let mut first = String::new();
        raw.reader().read_to_string(&mut first).unwrap();
        let mut second = String::new();
        raw.reader().read_to_string(&mut second).unwrap();

        assert_eq!(first, "Not found");
        assert_eq!(second, "Not found");
        assert_eq!(raw.text(), "Not found");
    }

    #[test]
    fn test_decode_failure_keeps_body() {
        #[derive(Debug, Deserialize)]
        struct Target {
            #[allow(dead_code)]
            x: i32,
        }

        let err = response(200, r#"{"x":"one"}"#).json::<Target>().unwrap_err();
        match err {
            Error::Decode {
                raw_response,
                status,
                ..
            } => {
                assert_eq!(raw_response, r#"{"x":"one"}"#);
                assert_eq!(status, StatusCode::OK);
            }
            other => panic!("Expected Decode, got {:?}", other),
        }
    }
}
