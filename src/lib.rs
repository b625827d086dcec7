//! # apiwire - a typed HTTP client runtime for one service
//!
//! apiwire turns a set of endpoint descriptors into a typed client built on
//! top of `reqwest`. Every call binds its path template, encodes a JSON or
//! multipart body, runs under a per-attempt timeout and an optional caller
//! cancellation token, retries failed exchanges, and validates the response
//! against a closed rule before handing back a domain-shaped value.
//!
//! ## Quick Start
//!
//! ```no_run
//! use apiwire::api::{ApiClient, ListEntriesQuery, LoginRequest};
//! use apiwire::ClientConfig;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), apiwire::Error> {
//!     let api = ApiClient::new(ClientConfig::new("https://api.example.com"))?;
//!
//!     let login = api
//!         .login(&LoginRequest::new("ada", "secret"), Default::default())
//!         .await?;
//!     if let Some(session) = login.into_data() {
//!         api.set_token(&session.access_token)?;
//!     }
//!
//!     let query = ListEntriesQuery {
//!         limit: Some(20),
//!         ..Default::default()
//!     };
//!     let page = api.list_entries(query, Default::default()).await?;
//!     println!("Took {:?} over {} attempt(s)", page.latency, page.attempts);
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Path and query binding** - `{name}` placeholders are percent-encoded; a missing one fails before any traffic
//! - **JSON and multipart bodies** - multipart fields are flattened by kind and rebuilt for every attempt
//! - **Attempt-scoped cancellation** - a timeout and a caller token race each attempt
//! - **Fixed-delay retries** - configurable count, delay and predicate
//! - **Closed response validation** - every violation is reported with its path, and wire names are mapped to domain names
//! - **Automatic logging** - structured logging with `tracing`
//! - **Response metadata** - latency, status, headers, attempts and the raw body
//!
//! ## Error Handling
//!
//! ```no_run
//! use apiwire::api::ApiClient;
//! use apiwire::{ClientConfig, Error};
//!
//! # async fn example() -> Result<(), Error> {
//! let api = ApiClient::new(ClientConfig::new("https://api.example.com"))?;
//! match api.current_user(Default::default()).await {
//!     Ok(response) => println!("Signed in as {:?}", response.data),
//!     Err(Error::Validation(error)) => {
//!         for field in error.errors() {
//!             eprintln!("{}: {}", field.path, field.message);
//!         }
//!     }
//!     Err(Error::HttpError { status, raw_response, .. }) => {
//!         eprintln!("HTTP error {}: {}", status, raw_response);
//!     }
//!     Err(e) => eprintln!("Other error: {}", e),
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Retries
//!
//! By default a call is attempted up to four times, one second apart, and
//! every network error, timeout and non-2xx status is retried. Use
//! [`RetryOnTransient`] to stop retrying 4xx responses:
//!
//! ```no_run
//! use apiwire::{Client, RetryOnTransient};
//! use std::time::Duration;
//!
//! # fn example() -> Result<(), apiwire::Error> {
//! let client = Client::builder()
//!     .base_url("https://api.example.com")?
//!     .retries(5)
//!     .retry_delay(Duration::from_millis(250))
//!     .retry_predicate(Box::new(RetryOnTransient))
//!     .build()?;
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod body;
pub mod brand;
pub mod cancel;
mod client;
mod error;
pub mod metadata;
pub mod path;
mod response;
pub mod retry;
pub mod transport;
pub mod validate;

pub use client::{Client, ClientBuilder, ClientConfig, DEFAULT_TIMEOUT};
pub use error::{Error, Result};
pub use metadata::{Call, Endpoint, RequestOptions};
pub use response::Response;
pub use retry::{RetryOnFailure, RetryOnTransient, RetryPolicy, RetryPredicate};
pub use transport::Transport;
pub use validate::{Schema, ValidationError, ValidationOutcome};
