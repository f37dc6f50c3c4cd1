//! Per-API configuration shared by every resource rooted in it.
//!
//! The [`Api`] type holds the base URL, the transport, credentials and the
//! retry policy. Use [`ApiBuilder`] to configure and create one, then call
//! [`Api::root`] to start addressing resources.

use crate::{
    logger::Logger,
    retry::RetryPolicy,
    transport::{ReqwestTransport, Transport},
    Error, Resource, Result,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use http::{HeaderMap, HeaderName, HeaderValue};
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;
use url::Url;

/// Username and password sent with every request.
#[derive(Clone, PartialEq, Eq)]
pub struct BasicAuth {
    /// The username.
    pub username: String,
    /// The password.
    pub password: String,
}

impl BasicAuth {
    /// Creates a credential pair.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Renders the `Authorization` header value.
    pub fn header_value(&self) -> Result<HeaderValue> {
        let token = STANDARD.encode(format!("{}:{}", self.username, self.password));
        let mut value = HeaderValue::try_from(format!("Basic {}", token))
            .map_err(|e| Error::InvalidHeader(format!("Invalid basic auth credentials: {}", e)))?;
        value.set_sensitive(true);
        Ok(value)
    }
}

impl fmt::Debug for BasicAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicAuth")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Configuration for one REST API.
///
/// An `Api` is always handled through an `Arc`: every [`Resource`] derived
/// from it keeps a reference.
///
/// # Examples
///
/// ```no_run
/// use restree::Api;
/// use serde::Deserialize;
///
/// #[derive(Deserialize)]
/// struct User {
///     id: u64,
///     name: String,
/// }
///
/// # async fn example() -> Result<(), restree::Error> {
/// let api = Api::builder()
///     .base_url("https://api.example.com/v1")?
///     .basic_auth("alice", "s3cret")
///     .retry_count(3)
///     .build()?;
///
/// let mut user = api.root().res("users").id_into(42, Default::default());
/// user.get().await?;
///
/// let user: Option<User> = user.response().take();
/// # Ok(())
/// # }
/// ```
pub struct Api {
    base_url: Url,
    transport: RwLock<Arc<dyn Transport>>,
    basic_auth: Option<BasicAuth>,
    retry: RetryPolicy,
    path_suffix: Option<String>,
    logger: Option<Arc<dyn Logger>>,
    default_headers: HeaderMap,
}

impl Api {
    /// Creates a new `ApiBuilder`.
    pub fn builder() -> ApiBuilder {
        ApiBuilder::new()
    }

    /// Returns the root resource, addressing the base URL itself.
    pub fn root(self: &Arc<Self>) -> Resource {
        Resource::root(Arc::clone(self))
    }

    /// Returns the base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Returns the credentials sent with every request, if any.
    pub fn basic_auth(&self) -> Option<&BasicAuth> {
        self.basic_auth.as_ref()
    }

    /// Returns the retry policy.
    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    /// Returns the suffix appended to every path, if any.
    pub fn path_suffix(&self) -> Option<&str> {
        self.path_suffix.as_deref()
    }

    /// Returns the dump logger, if any.
    pub fn logger(&self) -> Option<&Arc<dyn Logger>> {
        self.logger.as_ref()
    }

    /// Returns the headers every root resource starts with.
    pub fn default_headers(&self) -> &HeaderMap {
        &self.default_headers
    }

    /// Returns the current transport.
    pub fn transport(&self) -> Arc<dyn Transport> {
        let guard = self
            .transport
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&*guard)
    }

    /// Replaces the transport for every resource sharing this `Api`.
    ///
    /// Requests already in flight finish on the transport they started with.
    pub fn set_transport(&self, transport: Arc<dyn Transport>) {
        let mut guard = self
            .transport
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        *guard = transport;
    }
}

impl fmt::Debug for Api {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Api")
            .field("base_url", &self.base_url.as_str())
            .field("basic_auth", &self.basic_auth)
            .field("retry", &self.retry)
            .field("path_suffix", &self.path_suffix)
            .field("logger", &self.logger.is_some())
            .finish_non_exhaustive()
    }
}

/// Builder for configuring and creating an [`Api`].
///
/// # Examples
///
/// ```no_run
/// use restree::ApiBuilder;
/// use std::time::Duration;
///
/// # fn example() -> Result<(), restree::Error> {
/// let api = ApiBuilder::new()
///     .base_url("https://api.example.com")?
///     .path_suffix(".json")
///     .timeout(Duration::from_secs(30))
///     .default_header("User-Agent", "my-app/1.0")?
///     .build()?;
/// # Ok(())
/// # }
/// ```
pub struct ApiBuilder {
    base_url: Option<Url>,
    transport: Option<Arc<dyn Transport>>,
    basic_auth: Option<BasicAuth>,
    retry: RetryPolicy,
    path_suffix: Option<String>,
    logger: Option<Arc<dyn Logger>>,
    default_headers: HeaderMap,
    timeout: Option<Duration>,
}

impl ApiBuilder {
    /// Creates a new `ApiBuilder` with default settings.
    pub fn new() -> Self {
        Self {
            base_url: None,
            transport: None,
            basic_auth: None,
            retry: RetryPolicy::default(),
            path_suffix: None,
            logger: None,
            default_headers: HeaderMap::new(),
            timeout: None,
        }
    }

    /// Sets the base URL for all resources.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid or cannot carry a path.
    pub fn base_url(mut self, url: impl AsRef<str>) -> Result<Self> {
        let url = Url::parse(url.as_ref())?;
        if url.cannot_be_a_base() {
            return Err(Error::ConfigurationError(format!(
                "Base URL cannot carry a path: {}",
                url
            )));
        }
        self.base_url = Some(url);
        Ok(self)
    }

    /// Sets the transport used for every request.
    ///
    /// Defaults to a [`ReqwestTransport`].
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Sends Basic-Auth credentials with every request.
    pub fn basic_auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.basic_auth = Some(BasicAuth::new(username, password));
        self
    }

    /// Sets how many times a failed request is re-sent.
    pub fn retry_count(mut self, retry_count: usize) -> Self {
        self.retry = RetryPolicy::new(retry_count).with_backoff_unit(self.retry.backoff_unit());
        self
    }

    /// Sets the unit multiplied by `2^attempt` between retries.
    pub fn backoff_unit(mut self, unit: Duration) -> Self {
        self.retry = self.retry.with_backoff_unit(unit);
        self
    }

    /// Appends a suffix, such as `.json`, to every composed path.
    pub fn path_suffix(mut self, suffix: impl Into<String>) -> Self {
        let suffix = suffix.into();
        self.path_suffix = (!suffix.is_empty()).then_some(suffix);
        self
    }

    /// Dumps every request and response to `logger`.
    pub fn logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Adds a header inherited by every resource.
    ///
    /// # Errors
    ///
    /// Returns an error if the header name or value is invalid.
    pub fn default_header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Result<Self> {
        let name = HeaderName::try_from(name.as_ref())
            .map_err(|e| Error::InvalidHeader(format!("Invalid header name: {}", e)))?;
        let value = HeaderValue::try_from(value.as_ref())
            .map_err(|e| Error::InvalidHeader(format!("Invalid header value: {}", e)))?;
        self.default_headers.append(name, value);
        Ok(self)
    }

    /// Sets the request timeout of the default transport.
    ///
    /// Ignored when a custom transport is supplied.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Builds the configured `Api`.
    ///
    /// # Errors
    ///
    /// Returns an error if no base URL was provided or if the default
    /// transport cannot be created.
    pub fn build(self) -> Result<Arc<Api>> {
        let base_url = self
            .base_url
            .ok_or_else(|| Error::ConfigurationError("Base URL is required".to_string()))?;

        let transport = match self.transport {
            Some(transport) => transport,
            None => {
                let mut builder = reqwest::Client::builder();
                if let Some(timeout) = self.timeout {
                    builder = builder.timeout(timeout);
                }
                let client = builder.build().map_err(|e| {
                    Error::ConfigurationError(format!("Failed to build HTTP client: {}", e))
                })?;
                Arc::new(ReqwestTransport::new(client))
            }
        };

        Ok(Arc::new(Api {
            base_url,
            transport: RwLock::new(transport),
            basic_auth: self.basic_auth,
            retry: self.retry,
            path_suffix: self.path_suffix,
            logger: self.logger,
            default_headers: self.default_headers,
        }))
    }
}

impl Default for ApiBuilder {
    fn default() -> Self {
        Self::new()
    }
}
