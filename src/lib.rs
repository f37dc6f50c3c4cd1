//! # restree - A resource-tree REST client
//!
//! restree addresses a JSON API as a tree of resources under one base URL.
//! Deriving a child resource is pure path composition; the verb methods send
//! the request, retry transient failures with exponential backoff and decode
//! the JSON response into a typed target.
//!
//! ## Quick Start
//!
//! ```no_run
//! use restree::{Api, ResponseTarget};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Serialize)]
//! struct CreateUser {
//!     name: String,
//! }
//!
//! #[derive(Debug, Clone, Deserialize)]
//! struct User {
//!     id: u64,
//!     name: String,
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), restree::Error> {
//!     let api = Api::builder()
//!         .base_url("https://api.example.com/v1")?
//!         .basic_auth("alice", "s3cret")
//!         .retry_count(3)
//!         .build()?;
//!
//!     // GET /v1/users/123
//!     let user = ResponseTarget::<User>::new();
//!     let mut node = api.root().res_into("users", user.clone()).id(123);
//!     node.get().await?;
//!     println!("User: {:?}", user.get());
//!
//!     // POST /v1/users
//!     let mut users = api.root().res_into("users", ResponseTarget::<User>::new());
//!     users
//!         .post_with(&CreateUser { name: "Bob".to_string() })
//!         .await?;
//!
//!     // Error statuses are not errors: inspect the raw response.
//!     if let Some(raw) = users.raw() {
//!         if !raw.status().is_success() {
//!             eprintln!("{}: {}", raw.status(), raw.text());
//!         }
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Fluent addressing** - `res` and `id` compose paths without duplicated separators
//! - **Typed responses** - Decode into any `Deserialize` type through a shared [`ResponseTarget`]
//! - **Retries** - Transport failures and 5xx statuses are re-sent with the same body
//! - **Re-readable responses** - The raw response body stays available after classification
//! - **Pluggable transport** - Any [`Transport`] implementation; `reqwest` by default
//! - **Request dumps** - An optional [`Logger`] receives every request and response
//! - **Structured logging** - Execution is traced with `tracing`
//!
//! ## Retries
//!
//! A request that fails at the transport level, or receives a 5xx status, is
//! re-sent up to `retry_count` times. The first retry is immediate; retry `i`
//! after that waits `2^i` backoff units (one second by default). The number of
//! retries performed is written to the resource's `X-Total-Retries` header.
//!
//! ```no_run
//! use restree::{Api, X_TOTAL_RETRIES};
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), restree::Error> {
//! let api = Api::builder()
//!     .base_url("https://api.example.com")?
//!     .retry_count(5)
//!     .backoff_unit(Duration::from_millis(250))
//!     .build()?;
//!
//! let mut health = api.root().res("health");
//! health.get().await?;
//! println!("retries: {:?}", health.headers().get(X_TOTAL_RETRIES));
//! # Ok(())
//! # }
//! ```

mod config;
mod error;
pub mod logger;
pub mod payload;
mod resource;
mod response;
mod retry;
mod transport;

pub use config::{Api, ApiBuilder, BasicAuth};
pub use error::{BoxError, Error, Result};
pub use logger::{Logger, TracingLogger};
pub use resource::{Identifier, Resource, ResponseTarget, X_TOTAL_RETRIES};
pub use response::{RawResponse, ResponseClass};
pub use retry::{RetryPolicy, DEFAULT_BACKOFF_UNIT};
pub use transport::{ReqwestTransport, Transport};
