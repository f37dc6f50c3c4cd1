//! The pluggable HTTP transport.
//!
//! A [`Transport`] sends one fully-buffered request and returns one
//! fully-buffered response. Connection pooling, TLS and timeouts are the
//! transport's business.

use crate::error::BoxError;
use async_trait::async_trait;
use bytes::Bytes;
use http::{Request, Response};

/// Sends a request and returns its response, or fails at the transport level.
///
/// A response with an error status is still `Ok`; only failures to complete
/// the exchange (DNS, refused connections, timeouts) are errors.
///
/// # Examples
///
/// ```
/// use async_trait::async_trait;
/// use bytes::Bytes;
/// use restree::{BoxError, Transport};
///
/// struct AlwaysTeapot;
///
/// #[async_trait]
/// impl Transport for AlwaysTeapot {
///     async fn send(&self, _request: http::Request<Bytes>) -> Result<http::Response<Bytes>, BoxError> {
///         Ok(http::Response::builder().status(418).body(Bytes::new())?)
///     }
/// }
/// ```
#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends one request.
    async fn send(&self, request: Request<Bytes>) -> Result<Response<Bytes>, BoxError>;
}

/// A [`Transport`] backed by a `reqwest::Client`.
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Wraps an existing client, for instance one configured with custom TLS
    /// or proxy settings.
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Returns the wrapped client.
    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }
}

impl From<reqwest::Client> for ReqwestTransport {
    fn from(client: reqwest::Client) -> Self {
        Self::new(client)
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: Request<Bytes>) -> Result<Response<Bytes>, BoxError> {
        let request = reqwest::Request::try_from(request)?;
        let response = self.client.execute(request).await?;

        let mut builder = Response::builder()
            .status(response.status())
            .version(response.version());
        if let Some(headers) = builder.headers_mut() {
            headers.extend(response.headers().clone());
        }
        let body = response.bytes().await?;

        Ok(builder.body(body)?)
    }
}
