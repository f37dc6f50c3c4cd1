//! Resource nodes: addressing, request building and execution.
//!
//! A [`Resource`] is one point in the path hierarchy under an [`Api`]'s base
//! URL. Deriving a child with [`Resource::res`] or [`Resource::id`] is pure
//! tree construction; only the verb methods perform I/O.
//!
//! # Execution
//!
//! Every verb runs the same routine:
//!
//! 1. Compose the URL from the base URL, the node path, the path suffix and
//!    the query.
//! 2. Build the request with Basic-Auth and every node header.
//! 3. Send it, re-sending the same buffered body on transport failures and
//!    5xx statuses as the [`RetryPolicy`](crate::RetryPolicy) allows.
//! 4. Store the raw response and classify it: error statuses are left for
//!    the caller to inspect, `204 No Content` skips decoding, anything else
//!    is decoded into the node's [`ResponseTarget`].

use crate::{
    config::Api,
    error::BoxError,
    logger::{dump_request, dump_response},
    payload::{encode_json, encode_query, JSON_CONTENT_TYPE},
    response::{RawResponse, ResponseClass},
    retry::RetryPolicy,
    transport::Transport,
    Error, Result,
};
use bytes::Bytes;
use http::header::{AUTHORIZATION, CONNECTION, CONTENT_LENGTH, CONTENT_TYPE, HOST, TRANSFER_ENCODING};
use http::{HeaderMap, HeaderName, HeaderValue, Method, Request};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use url::Url;

/// Header set on a resource after every execution, holding the number of
/// retries the execution needed.
pub const X_TOTAL_RETRIES: HeaderName = HeaderName::from_static("x-total-retries");

/// An entity identifier, normalized to its string form.
///
/// Only strings and 32- or 64-bit signed integers convert into an
/// `Identifier`.
///
/// ```
/// use restree::Identifier;
///
/// assert_eq!(Identifier::from(42), Identifier::from("42"));
/// assert_eq!(Identifier::from(7_i64).as_str(), "7");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identifier(String);

impl Identifier {
    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Identifier {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for Identifier {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&String> for Identifier {
    fn from(id: &String) -> Self {
        Self(id.clone())
    }
}

impl From<i32> for Identifier {
    fn from(id: i32) -> Self {
        Self(id.to_string())
    }
}

impl From<i64> for Identifier {
    fn from(id: i64) -> Self {
        Self(id.to_string())
    }
}

impl AsRef<str> for Identifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A shared slot receiving the decoded body of a response.
///
/// Cloning a `ResponseTarget` yields another handle to the same slot. A
/// child derived with [`Resource::id`] holds a handle to its parent's slot,
/// so both observe whatever either one decodes.
///
/// ```
/// use restree::ResponseTarget;
///
/// let target = ResponseTarget::new();
/// let alias = target.clone();
///
/// target.set(7);
/// assert_eq!(alias.get(), Some(7));
/// assert!(alias.ptr_eq(&target));
/// ```
pub struct ResponseTarget<T>(Arc<Mutex<Option<T>>>);

impl<T> ResponseTarget<T> {
    /// Creates an empty slot.
    pub fn new() -> Self {
        Self(Arc::new(Mutex::new(None)))
    }

    /// Stores a value, replacing any previous one.
    pub fn set(&self, value: T) {
        *self.lock() = Some(value);
    }

    /// Removes and returns the value.
    pub fn take(&self) -> Option<T> {
        self.lock().take()
    }

    /// Returns a copy of the value.
    pub fn get(&self) -> Option<T>
    where
        T: Clone,
    {
        self.lock().clone()
    }

    /// Returns `true` if a value is stored.
    pub fn is_set(&self) -> bool {
        self.lock().is_some()
    }

    /// Returns `true` if both handles point to the same slot.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<T>> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T> Clone for ResponseTarget<T> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<T> Default for ResponseTarget<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: fmt::Debug> fmt::Debug for ResponseTarget<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ResponseTarget").field(&*self.lock()).finish()
    }
}

/// An addressable resource under an [`Api`], and the request builder for it.
///
/// `T` is the type the response body decodes into; untargeted nodes decode
/// into a [`serde_json::Value`].
///
/// # Examples
///
/// ```no_run
/// use restree::{Api, ResponseTarget};
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Serialize)]
/// struct NewPost<'a> {
///     title: &'a str,
/// }
///
/// #[derive(Debug, Clone, Deserialize)]
/// struct Post {
///     id: u64,
///     title: String,
/// }
///
/// # async fn example() -> Result<(), restree::Error> {
/// let api = Api::builder().base_url("https://api.example.com")?.build()?;
///
/// let posts = ResponseTarget::<Vec<Post>>::new();
/// let mut listing = api.root().res("users").id(42).res_into("posts", posts.clone());
/// listing.get_with(&[("page", "2")].into_iter().collect::<std::collections::HashMap<_, _>>()).await?;
/// println!("{:?}", posts.get());
///
/// let mut created = api.root().res("users").id(42).res_into("posts", ResponseTarget::<Post>::new());
/// created.post_with(&NewPost { title: "Hello" }).await?;
/// # Ok(())
/// # }
/// ```
pub struct Resource<T = Value> {
    api: Arc<Api>,
    path: String,
    id: Option<String>,
    query: BTreeMap<String, String>,
    payload: Option<Bytes>,
    headers: HeaderMap,
    response: ResponseTarget<T>,
    raw: Option<RawResponse>,
}

impl Resource<Value> {
    pub(crate) fn root(api: Arc<Api>) -> Self {
        let headers = api.default_headers().clone();
        Self {
            api,
            path: String::new(),
            id: None,
            query: BTreeMap::new(),
            payload: None,
            headers,
            response: ResponseTarget::new(),
            raw: None,
        }
    }
}

impl<T> Resource<T> {
    /// Returns a child resource at `segment`, decoding into a
    /// [`serde_json::Value`].
    ///
    /// Slashes around `segment` are ignored, and a segment may contain
    /// several path components: `res("a").res("b")` and `res("a/b")` address
    /// the same path. An empty segment addresses this node's path.
    pub fn res(&self, segment: impl AsRef<str>) -> Resource<Value> {
        self.res_into(segment, ResponseTarget::new())
    }

    /// Returns a child resource at `segment`, decoding into `target`.
    pub fn res_into<U>(&self, segment: impl AsRef<str>, target: ResponseTarget<U>) -> Resource<U> {
        self.child(compose_path(&self.path, segment.as_ref()), None, target)
    }

    /// Returns the child resource addressing entity `id`.
    ///
    /// The child decodes into this node's own response target.
    pub fn id(&self, id: impl Into<Identifier>) -> Resource<T> {
        self.id_into(id, self.response.clone())
    }

    /// Returns the child resource addressing entity `id`, decoding into
    /// `target`.
    ///
    /// Slashes around `id` are ignored. An empty identifier addresses this
    /// node's path and leaves the child without an id.
    pub fn id_into<U>(&self, id: impl Into<Identifier>, target: ResponseTarget<U>) -> Resource<U> {
        let identifier = id.into();
        let id = identifier.as_str().trim_matches('/');
        if id.is_empty() {
            return self.child(self.path.clone(), None, target);
        }
        self.child(compose_path(&self.path, id), Some(id.to_string()), target)
    }

    fn child<U>(&self, path: String, id: Option<String>, response: ResponseTarget<U>) -> Resource<U> {
        Resource {
            api: Arc::clone(&self.api),
            path,
            id,
            query: BTreeMap::new(),
            payload: None,
            headers: self.headers.clone(),
            response,
            raw: None,
        }
    }

    /// Replaces the query parameters.
    pub fn set_query<I, K, V>(&mut self, query: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.query = query
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self
    }

    /// Appends a header value. Existing values for `key` are kept.
    ///
    /// # Errors
    ///
    /// Returns an error if the header name or value is invalid.
    pub fn set_header(&mut self, key: impl AsRef<str>, value: impl AsRef<str>) -> Result<&mut Self> {
        let name = HeaderName::try_from(key.as_ref())
            .map_err(|e| Error::InvalidHeader(format!("Invalid header name: {}", e)))?;
        let value = HeaderValue::try_from(value.as_ref())
            .map_err(|e| Error::InvalidHeader(format!("Invalid header value: {}", e)))?;
        self.headers.append(name, value);
        Ok(self)
    }

    /// Encodes `payload` as the JSON body of the next request and marks it
    /// as `application/json`.
    ///
    /// # Errors
    ///
    /// Returns an error if `payload` cannot be serialized.
    pub fn set_payload<P>(&mut self, payload: &P) -> Result<&mut Self>
    where
        P: Serialize + ?Sized,
    {
        self.payload = Some(encode_json(payload)?);
        self.headers
            .insert(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));
        Ok(self)
    }

    /// Replaces the transport of the owning [`Api`].
    ///
    /// This affects every resource sharing the `Api`, not only this one.
    pub fn set_client(&self, transport: Arc<dyn Transport>) {
        self.api.set_transport(transport);
    }

    /// Returns the owning [`Api`].
    pub fn api(&self) -> &Arc<Api> {
        &self.api
    }

    /// Returns the path relative to the base URL.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the entity identifier, if this node addresses one.
    pub fn id_str(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Returns the query parameters.
    pub fn query(&self) -> &BTreeMap<String, String> {
        &self.query
    }

    /// Returns the headers sent with every request from this node.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns the response target.
    pub fn response(&self) -> &ResponseTarget<T> {
        &self.response
    }

    /// Returns the last raw response, if a request has completed.
    pub fn raw(&self) -> Option<&RawResponse> {
        self.raw.as_ref()
    }

    /// Returns the full URL a request from this node is sent to.
    ///
    /// # Errors
    ///
    /// Returns an error if the composed path does not form a valid URL.
    pub fn url(&self) -> Result<Url> {
        let mut url = self.api.base_url().clone();

        let base = url.path().trim_end_matches('/');
        let mut path = match (base.is_empty(), self.path.is_empty()) {
            (true, _) => self.path.clone(),
            (false, true) => base.to_string(),
            (false, false) => format!("{}/{}", base, self.path),
        };
        if let Some(suffix) = self.api.path_suffix() {
            path.push_str(suffix);
        }
        url.set_path(&path);

        url.set_query(None);
        if !self.query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in &self.query {
                pairs.append_pair(key, value);
            }
        }

        Ok(url)
    }

    fn build_request(&self, method: Method, url: &Url, body: Bytes) -> Result<Request<Bytes>> {
        let mut request = Request::builder().method(method).uri(url.as_str());

        if let Some(headers) = request.headers_mut() {
            if let Some(auth) = self.api.basic_auth() {
                headers.insert(AUTHORIZATION, auth.header_value()?);
            }
            for (name, value) in &self.headers {
                if !is_framing_header(name) && *name != CONTENT_TYPE {
                    headers.append(name.clone(), value.clone());
                }
            }
            // A node may hold several content types picked up from responses;
            // only the first describes the body.
            if let Some(content_type) = self.headers.get(CONTENT_TYPE) {
                headers.insert(CONTENT_TYPE, content_type.clone());
            }
            if !body.is_empty() {
                headers.insert(CONTENT_LENGTH, HeaderValue::from(body.len()));
            }
        }

        Ok(request.body(body)?)
    }

    /// Sends `request` once, then again while it fails and the policy allows.
    ///
    /// Returns the final outcome and the number of retries performed.
    async fn send_with_retries(
        &self,
        request: &Request<Bytes>,
    ) -> (std::result::Result<http::Response<Bytes>, BoxError>, usize) {
        let transport = self.api.transport();
        let policy = self.api.retry_policy();

        let mut outcome = transport.send(replay(request)).await;
        let mut retries = 0;

        while !RetryPolicy::is_settled(status_of(&outcome)) && retries < policy.retry_count() {
            match &outcome {
                Err(e) => tracing::warn!(
                    error = %e,
                    attempt = retries + 1,
                    method = %request.method(),
                    url = %request.uri(),
                    "Request failed"
                ),
                Ok(response) => tracing::warn!(
                    status = response.status().as_u16(),
                    attempt = retries + 1,
                    method = %request.method(),
                    url = %request.uri(),
                    "Server error (5xx)"
                ),
            }

            if let Some(delay) = policy.delay_for_retry(retries) {
                tracing::info!(
                    delay_ms = delay.as_millis(),
                    retry = retries,
                    "Retrying request after delay"
                );
                tokio::time::sleep(delay).await;
            }

            outcome = transport.send(replay(request)).await;
            retries += 1;
        }

        (outcome, retries)
    }

    fn log_dump(&self, dump: std::result::Result<String, std::str::Utf8Error>, what: &str) {
        let Some(logger) = self.api.logger() else {
            return;
        };
        match dump {
            Ok(dump) => logger.log(&dump),
            Err(e) => logger.log(&format!("dump {} failed: {}", what, e)),
        }
    }
}

impl<T: DeserializeOwned> Resource<T> {
    /// Performs a GET request.
    pub async fn get(&mut self) -> Result<&mut Self> {
        self.execute(Method::GET).await
    }

    /// Performs a GET request with `query` as the query string.
    ///
    /// `query` replaces any query set earlier.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CantUseAsQuery`] without sending anything if `query`
    /// is not a flat map of scalar values.
    pub async fn get_with<Q>(&mut self, query: &Q) -> Result<&mut Self>
    where
        Q: Serialize + ?Sized,
    {
        self.query = encode_query(query)?;
        self.execute(Method::GET).await
    }

    /// Performs a HEAD request.
    pub async fn head(&mut self) -> Result<&mut Self> {
        self.execute(Method::HEAD).await
    }

    /// Performs a HEAD request with `query` as the query string.
    pub async fn head_with<Q>(&mut self, query: &Q) -> Result<&mut Self>
    where
        Q: Serialize + ?Sized,
    {
        self.query = encode_query(query)?;
        self.execute(Method::HEAD).await
    }

    /// Performs a DELETE request.
    pub async fn delete(&mut self) -> Result<&mut Self> {
        self.execute(Method::DELETE).await
    }

    /// Performs a DELETE request with `query` as the query string.
    pub async fn delete_with<Q>(&mut self, query: &Q) -> Result<&mut Self>
    where
        Q: Serialize + ?Sized,
    {
        self.query = encode_query(query)?;
        self.execute(Method::DELETE).await
    }

    /// Performs an OPTIONS request.
    pub async fn options(&mut self) -> Result<&mut Self> {
        self.execute(Method::OPTIONS).await
    }

    /// Performs an OPTIONS request with `query` as the query string.
    pub async fn options_with<Q>(&mut self, query: &Q) -> Result<&mut Self>
    where
        Q: Serialize + ?Sized,
    {
        self.query = encode_query(query)?;
        self.execute(Method::OPTIONS).await
    }

    /// Performs a PUT request with the payload set earlier, if any.
    pub async fn put(&mut self) -> Result<&mut Self> {
        self.execute(Method::PUT).await
    }

    /// Performs a PUT request with `payload` as the JSON body.
    pub async fn put_with<P>(&mut self, payload: &P) -> Result<&mut Self>
    where
        P: Serialize + ?Sized,
    {
        self.set_payload(payload)?;
        self.execute(Method::PUT).await
    }

    /// Performs a POST request with the payload set earlier, if any.
    pub async fn post(&mut self) -> Result<&mut Self> {
        self.execute(Method::POST).await
    }

    /// Performs a POST request with `payload` as the JSON body.
    pub async fn post_with<P>(&mut self, payload: &P) -> Result<&mut Self>
    where
        P: Serialize + ?Sized,
    {
        self.set_payload(payload)?;
        self.execute(Method::POST).await
    }

    /// Performs a PATCH request with the payload set earlier, if any.
    pub async fn patch(&mut self) -> Result<&mut Self> {
        self.execute(Method::PATCH).await
    }

    /// Performs a PATCH request with `payload` as the JSON body.
    pub async fn patch_with<P>(&mut self, payload: &P) -> Result<&mut Self>
    where
        P: Serialize + ?Sized,
    {
        self.set_payload(payload)?;
        self.execute(Method::PATCH).await
    }

    async fn execute(&mut self, method: Method) -> Result<&mut Self> {
        let url = self.url()?;
        let body = self.payload.take().unwrap_or_default();
        let request = self.build_request(method.clone(), &url, body)?;

        tracing::debug!(method = %method, url = %url, "Executing HTTP request");
        self.log_dump(dump_request(&request), "request");

        let (outcome, retries) = self.send_with_retries(&request).await;
        self.headers.insert(X_TOTAL_RETRIES, HeaderValue::from(retries));

        let response = match outcome {
            Ok(response) => RawResponse::from(response),
            Err(e) => {
                tracing::error!(
                    error = %e,
                    attempts = retries + 1,
                    method = %method,
                    url = %url,
                    "Request failed after retries"
                );
                return Err(Error::Transport(e));
            }
        };

        tracing::info!(
            status = response.status().as_u16(),
            attempts = retries + 1,
            "Received HTTP response"
        );
        self.log_dump(dump_response(&response), "response");

        let class = response.classify();
        let decoded = match class {
            ResponseClass::ErrorStatus => {
                if response.status().is_server_error() {
                    tracing::warn!(status = response.status().as_u16(), "Server error (5xx)");
                } else {
                    tracing::error!(status = response.status().as_u16(), "Client error (4xx)");
                }
                None
            }
            ResponseClass::NoContent => None,
            ResponseClass::Content if method == Method::HEAD => None,
            ResponseClass::Content => Some(response.decode::<T>()),
        };

        if class != ResponseClass::ErrorStatus {
            for (name, value) in response.headers() {
                self.headers.append(name.clone(), value.clone());
            }
        }
        self.raw = Some(response);

        if let Some(decoded) = decoded {
            self.response.set(decoded?);
        }
        Ok(self)
    }
}

impl<T> Clone for Resource<T> {
    fn clone(&self) -> Self {
        Self {
            api: Arc::clone(&self.api),
            path: self.path.clone(),
            id: self.id.clone(),
            query: self.query.clone(),
            payload: self.payload.clone(),
            headers: self.headers.clone(),
            response: self.response.clone(),
            raw: self.raw.clone(),
        }
    }
}

impl<T> fmt::Debug for Resource<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resource")
            .field("path", &self.path)
            .field("id", &self.id)
            .field("query", &self.query)
            .field("headers", &self.headers)
            .field("raw_status", &self.raw.as_ref().map(RawResponse::status))
            .finish_non_exhaustive()
    }
}

/// Joins `segment` onto `base` with exactly one separator.
fn compose_path(base: &str, segment: &str) -> String {
    let segment = segment.trim_matches('/');
    match (base.is_empty(), segment.is_empty()) {
        (_, true) => base.to_string(),
        (true, false) => segment.to_string(),
        (false, false) => format!("{}/{}", base, segment),
    }
}

/// Headers describing one message's framing. Resources pick them up from
/// responses; they are recomputed for every request instead of being copied.
fn is_framing_header(name: &HeaderName) -> bool {
    *name == CONTENT_LENGTH || *name == TRANSFER_ENCODING || *name == CONNECTION || *name == HOST
}

/// Rebuilds a request around the same buffered body.
fn replay(request: &Request<Bytes>) -> Request<Bytes> {
    let mut replay = Request::new(request.body().clone());
    *replay.method_mut() = request.method().clone();
    *replay.uri_mut() = request.uri().clone();
    *replay.version_mut() = request.version();
    *replay.headers_mut() = request.headers().clone();
    replay
}

fn status_of(
    outcome: &std::result::Result<http::Response<Bytes>, BoxError>,
) -> Option<http::StatusCode> {
    outcome.as_ref().ok().map(http::Response::status)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api(base_url: &str) -> Arc<Api> {
        Api::builder().base_url(base_url).unwrap().build().unwrap()
    }

    #[test]
    fn test_compose_path() {
        assert_eq!(compose_path("", "users"), "users");
        assert_eq!(compose_path("users", "42"), "users/42");
        assert_eq!(compose_path("users", "/42/"), "users/42");
        assert_eq!(compose_path("users", ""), "users");
        assert_eq!(compose_path("", ""), "");
    }

    #[test]
    fn test_res_chain_matches_joined_segment() {
        let root = api("https://api.example.com").root();

        let chained = root.res("a").res("b").res("c");
        let joined = root.res("a/b/c");

        assert_eq!(chained.path(), "a/b/c");
        assert_eq!(chained.path(), joined.path());
        assert_eq!(chained.url().unwrap(), joined.url().unwrap());
    }

    #[test]
    fn test_integer_and_string_ids_are_equivalent() {
        let users = api("https://api.example.com").root().res("users");

        let by_int = users.id(42);
        let by_long = users.id(42_i64);
        let by_str = users.id("42");

        assert_eq!(by_int.path(), "users/42");
        assert_eq!(by_int.path(), by_str.path());
        assert_eq!(by_long.path(), by_str.path());
        assert_eq!(by_int.id_str(), Some("42"));
        assert_eq!(by_int.id_str(), by_str.id_str());
    }

    #[test]
    fn test_id_is_last_path_segment() {
        let users = api("https://api.example.com").root().res("users");

        for raw in ["5", "5/", "/5", "/5/"] {
            let user = users.id(raw);
            assert_eq!(user.path(), "users/5");
            assert_eq!(user.id_str(), Some("5"));
            assert_eq!(user.path().rsplit('/').next(), user.id_str());
        }

        let same = users.id("");
        assert_eq!(same.path(), "users");
        assert_eq!(same.id_str(), None);
        assert_eq!(users.id("/").id_str(), None);
    }

    #[test]
    fn test_id_on_root_has_no_leading_slash() {
        let node = api("https://api.example.com").root().id(7);
        assert_eq!(node.path(), "7");
    }

    #[test]
    fn test_res_has_no_id() {
        let node = api("https://api.example.com").root().res("users").id(1).res("posts");
        assert_eq!(node.id_str(), None);
    }

    #[test]
    fn test_id_shares_parent_target() {
        let users = api("https://api.example.com").root().res("users");
        let user = users.id(1);
        let other = users.res("other");

        assert!(user.response().ptr_eq(users.response()));
        assert!(!other.response().ptr_eq(users.response()));

        let explicit = users.id_into(1, ResponseTarget::<u32>::new());
        explicit.response().set(5);
        assert!(!users.response().is_set());
    }

    #[test]
    fn test_children_copy_headers_at_creation() {
        let mut parent = api("https://api.example.com").root().res("users");
        parent.set_header("X-Trace", "one").unwrap();

        let child = parent.id(1);
        parent.set_header("X-Trace", "two").unwrap();

        let child_values: Vec<_> = child.headers().get_all("x-trace").iter().collect();
        let parent_values: Vec<_> = parent.headers().get_all("x-trace").iter().collect();
        assert_eq!(child_values, vec!["one"]);
        assert_eq!(parent_values, vec!["one", "two"]);
    }

    #[test]
    fn test_root_inherits_default_headers() {
        let api = Api::builder()
            .base_url("https://api.example.com")
            .unwrap()
            .default_header("User-Agent", "restree-test")
            .unwrap()
            .build()
            .unwrap();

        let node = api.root().res("users").id(3);
        assert_eq!(node.headers()["user-agent"], "restree-test");
    }

    #[test]
    fn test_set_header_rejects_invalid_name() {
        let mut node = api("https://api.example.com").root();
        assert!(matches!(
            node.set_header("bad header", "x"),
            Err(Error::InvalidHeader(_))
        ));
    }

    #[test]
    fn test_set_query_replaces_wholesale() {
        let mut node = api("https://api.example.com").root().res("users");
        node.set_query([("page", "1"), ("limit", "10")]);
        node.set_query([("sort", "name")]);

        assert_eq!(node.query().len(), 1);
        assert_eq!(node.query()["sort"], "name");
    }

    #[test]
    fn test_url_composition() {
        let node = api("https://api.example.com/v1/").root().res("users").id(42);
        assert_eq!(node.url().unwrap().as_str(), "https://api.example.com/v1/users/42");

        let node = api("https://api.example.com").root().res("users");
        assert_eq!(node.url().unwrap().as_str(), "https://api.example.com/users");

        let root = api("https://api.example.com/v1").root();
        assert_eq!(root.url().unwrap().as_str(), "https://api.example.com/v1");
    }

    #[test]
    fn test_url_with_suffix_and_sorted_query() {
        let api = Api::builder()
            .base_url("https://api.example.com/v1?ignored=1")
            .unwrap()
            .path_suffix(".json")
            .build()
            .unwrap();

        let mut node = api.root().res("users");
        node.set_query([("q", "a b"), ("limit", "10")]);

        assert_eq!(
            node.url().unwrap().as_str(),
            "https://api.example.com/v1/users.json?limit=10&q=a+b"
        );
    }

    #[test]
    fn test_set_payload_tags_content_type() {
        let mut node = api("https://api.example.com").root().res("users");
        node.set_payload(&serde_json::json!({"name": "Alice"})).unwrap();
        node.set_payload(&serde_json::json!({"name": "Bob"})).unwrap();

        assert_eq!(node.headers().get_all(CONTENT_TYPE).iter().count(), 1);
        assert_eq!(node.headers()[CONTENT_TYPE], JSON_CONTENT_TYPE);
    }

    #[test]
    fn test_build_request_with_basic_auth_and_multi_headers() {
        let api = Api::builder()
            .base_url("https://api.example.com")
            .unwrap()
            .basic_auth("user", "pass")
            .build()
            .unwrap();
        let mut node = api.root().res("users");
        node.set_header("Accept", "application/json").unwrap();
        node.set_header("Accept", "text/plain").unwrap();

        let url = node.url().unwrap();
        let request = node
            .build_request(Method::POST, &url, Bytes::from_static(b"{}"))
            .unwrap();

        assert_eq!(request.headers()[AUTHORIZATION], "Basic dXNlcjpwYXNz");
        assert_eq!(request.headers().get_all("accept").iter().count(), 2);
        assert_eq!(request.headers()[CONTENT_LENGTH], "2");
        assert_eq!(request.uri(), "https://api.example.com/users");
    }

    #[test]
    fn test_replay_keeps_body_and_headers() {
        let request = Request::builder()
            .method(Method::PUT)
            .uri("https://api.example.com/users/1")
            .header("x-a", "1")
            .body(Bytes::from_static(b"payload"))
            .unwrap();

        let first = replay(&request);
        let second = replay(&request);

        assert_eq!(first.body(), second.body());
        assert_eq!(*second.method(), Method::PUT);
        assert_eq!(second.headers()["x-a"], "1");
        assert_eq!(second.uri(), request.uri());
    }

    #[test]
    fn test_framing_headers_are_not_copied() {
        let mut node = api("https://api.example.com").root().res("users");
        node.set_header("Content-Length", "99").unwrap();
        node.set_header("Transfer-Encoding", "chunked").unwrap();
        node.set_header("X-Kept", "yes").unwrap();

        let url = node.url().unwrap();
        let request = node.build_request(Method::GET, &url, Bytes::new()).unwrap();

        assert!(request.headers().get(CONTENT_LENGTH).is_none());
        assert!(request.headers().get(TRANSFER_ENCODING).is_none());
        assert_eq!(request.headers()["x-kept"], "yes");
    }

    #[test]
    fn test_content_type_sent_once() {
        let mut node = api("https://api.example.com").root().res("users");
        node.set_header("Content-Type", "application/json").unwrap();
        node.set_header("Content-Type", "text/plain").unwrap();

        let url = node.url().unwrap();
        let request = node.build_request(Method::GET, &url, Bytes::new()).unwrap();

        let values: Vec<_> = request.headers().get_all(CONTENT_TYPE).iter().collect();
        assert_eq!(values, vec!["application/json"]);
    }

    #[test]
    fn test_failed_request_dump_is_logged() {
        #[derive(Default)]
        struct Collect(Mutex<Vec<String>>);

        impl crate::Logger for Collect {
            fn log(&self, message: &str) {
                self.0.lock().unwrap().push(message.to_string());
            }
        }

        let logger = Arc::new(Collect::default());
        let api = Api::builder()
            .base_url("https://api.example.com")
            .unwrap()
            .logger(logger.clone())
            .build()
            .unwrap();
        let node = api.root().res("blob");

        let url = node.url().unwrap();
        let request = node
            .build_request(Method::PUT, &url, Bytes::from_static(&[0xff, 0xfe]))
            .unwrap();
        node.log_dump(dump_request(&request), "request");

        let messages = logger.0.lock().unwrap();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].starts_with("dump request failed:"));
    }
}
