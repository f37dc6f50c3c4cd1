//! Error types for resource requests.
//!
//! Only failures that prevent a request from completing, or prevent its body
//! from being decoded, are errors. A response with a 4xx or 5xx status is a
//! completed exchange: it is stored on the resource and the caller inspects it
//! through [`Resource::raw`](crate::Resource::raw).

use http::StatusCode;

/// Boxed error produced by a [`Transport`](crate::Transport).
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// The main error type for resource requests.
///
/// # Examples
///
/// ```no_run
/// use restree::{Api, Error};
///
/// # async fn example() -> Result<(), Error> {
/// let api = Api::builder().base_url("https://api.example.com")?.build()?;
/// let mut users = api.root().res("users");
///
/// match users.get().await {
///     Ok(node) => match node.raw() {
///         Some(raw) if raw.status().is_client_error() => {
///             eprintln!("API error {}: {}", raw.status(), raw.text());
///         }
///         _ => println!("Users: {:?}", node.response().get()),
///     },
///     Err(Error::Decode { raw_response, serde_error, .. }) => {
///         eprintln!("Failed to decode {}: {}", raw_response, serde_error);
///     }
///     Err(e) => eprintln!("Request failed: {}", e),
/// }
/// # Ok(())
/// # }
/// ```
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// A query argument did not serialize to a flat map of scalar values.
    #[error("can't use value as query: expected a flat map of scalar values")]
    CantUseAsQuery,

    /// A header name or value was rejected.
    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    /// The base URL, or a URL composed from it, could not be parsed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Invalid configuration was provided to the [`ApiBuilder`](crate::ApiBuilder).
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// The request payload could not be encoded as JSON.
    #[error("Failed to serialize request: {0}")]
    SerializationFailed(String),

    /// The HTTP request could not be assembled.
    #[error("Failed to build request: {0}")]
    Request(#[from] http::Error),

    /// The transport failed on every attempt.
    ///
    /// This is the error of the last attempt, unchanged.
    #[error("Transport error: {0}")]
    Transport(#[source] BoxError),

    /// The response body could not be decoded into the response target.
    ///
    /// # Fields
    ///
    /// * `raw_response` - The raw response body as a string
    /// * `serde_error` - The error message from serde
    /// * `status` - The HTTP status code
    #[error("Failed to decode response (status {status}): {serde_error}")]
    Decode {
        /// The raw response body that failed to decode
        raw_response: String,
        /// The serde error message
        serde_error: String,
        /// The HTTP status code
        status: StatusCode,
    },
}

impl Error {
    /// Returns `true` if sending the same request again could succeed.
    ///
    /// Only transport failures qualify. Contract violations and decode
    /// failures repeat identically.
    ///
    /// # Examples
    ///
    /// ```
    /// use restree::Error;
    ///
    /// let err = Error::Transport("connection refused".into());
    /// assert!(err.is_retryable());
    ///
    /// assert!(!Error::CantUseAsQuery.is_retryable());
    /// ```
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Transport(_) => true,
            Error::CantUseAsQuery => false,
            Error::InvalidHeader(_) => false,
            Error::InvalidUrl(_) => false,
            Error::ConfigurationError(_) => false,
            Error::SerializationFailed(_) => false,
            Error::Request(_) => false,
            Error::Decode { .. } => false,
        }
    }

    /// Returns the HTTP status code if this error has one.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Error::Decode { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns the raw response body if this error has one.
    pub fn raw_response(&self) -> Option<&str> {
        match self {
            Error::Decode { raw_response, .. } => Some(raw_response),
            _ => None,
        }
    }
}

/// A specialized `Result` type for resource requests.
pub type Result<T> = std::result::Result<T, Error>;
