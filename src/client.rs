//! The per-service HTTP client.
//!
//! [`Client`] runs calls described by a [`Call`]: it binds the path, encodes
//! the body, runs attempts under the retry policy and turns the final
//! response into a [`Response`]. Use [`ClientBuilder`] or
//! [`Client::new`] with a [`ClientConfig`] to create one.

use crate::body::encode;
use crate::cancel::AttemptSignal;
use crate::metadata::{header_pair, merge_headers, Call};
use crate::path::{bind_path, join_url};
use crate::retry::{self, RetryOnFailure, RetryPolicy, RetryPredicate};
use crate::transport::{self, ReqwestTransport, RequestAttempt, Transport};
use crate::validate::{self, Schema};
use crate::{Error, Response, Result};
use arc_swap::ArcSwap;
use http::header::AUTHORIZATION;
use http::HeaderMap;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use url::Url;

/// Default per-attempt timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(30_000);

/// Client settings.
///
/// Deserializes from the host application's configuration with durations
/// in milliseconds; every field except `base_url` has a default.
///
/// # Examples
///
/// ```
/// use apiwire::ClientConfig;
/// use std::time::Duration;
///
/// let config: ClientConfig = serde_json::from_str(
///     r#"{ "base_url": "https://api.example.com/", "retries": 1, "timeout_ms": 5000 }"#,
/// ).unwrap();
///
/// assert_eq!(config.retries, 1);
/// assert_eq!(config.timeout, Duration::from_secs(5));
/// assert_eq!(config.retry_delay, Duration::from_millis(1000));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL every path is appended to.
    pub base_url: String,
    /// Headers sent with every request.
    pub default_headers: BTreeMap<String, String>,
    /// Per-attempt timeout. Zero disables it.
    #[serde(rename = "timeout_ms", with = "duration_ms")]
    pub timeout: Duration,
    /// Retries after the first attempt.
    pub retries: usize,
    /// Delay between attempts.
    #[serde(rename = "retry_delay_ms", with = "duration_ms")]
    pub retry_delay: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            default_headers: BTreeMap::new(),
            timeout: DEFAULT_TIMEOUT,
            retries: retry::DEFAULT_RETRIES,
            retry_delay: retry::DEFAULT_RETRY_DELAY,
        }
    }
}

impl ClientConfig {
    /// Default settings for `base_url`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }
}

mod duration_ms {
    use serde::{Deserialize, Deserializer};
    use std::time::Duration;

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

/// An HTTP client bound to one service.
///
/// Cloning is cheap and clones share configuration, including default
/// headers: a bearer token set through one clone is sent by all of them.
///
/// # Examples
///
/// ```no_run
/// use apiwire::api::endpoints;
/// use apiwire::{Call, Client};
/// use std::time::Duration;
///
/// # async fn example() -> Result<(), apiwire::Error> {
/// let client = Client::builder()
///     .base_url("https://api.example.com")?
///     .timeout(Duration::from_secs(10))
///     .retries(2)
///     .build()?;
///
/// client.set_bearer_token("secret")?;
///
/// let call = Call::new(&endpoints::GET_ENTRY).path_param("entry_id", "e-1");
/// let response = client.execute(call).await?;
/// println!("{:?} after {} attempt(s)", response.data, response.attempts);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    transport: Arc<dyn Transport>,
    base_url: String,
    default_headers: ArcSwap<HeaderMap>,
    retry_policy: RetryPolicy,
    retry_predicate: Box<dyn RetryPredicate>,
    timeout: Duration,
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("base_url", &self.inner.base_url)
            .field("retry_policy", &self.inner.retry_policy)
            .field("timeout", &self.inner.timeout)
            .finish_non_exhaustive()
    }
}

impl Client {
    /// Creates a new `ClientBuilder` for configuring a client.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Creates a client from `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL or a default header is invalid.
    pub fn new(config: ClientConfig) -> Result<Self> {
        ClientBuilder::from_config(config)?.build()
    }

    /// The base URL, without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    /// A snapshot of the current default headers.
    pub fn default_headers(&self) -> HeaderMap {
        HeaderMap::clone(&self.inner.default_headers.load())
    }

    /// The settings this client runs with, including current default headers.
    ///
    /// Header values that are not valid UTF-8 are left out.
    pub fn config(&self) -> ClientConfig {
        let headers = self.inner.default_headers.load();
        let default_headers = headers
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.as_str().to_string(), value.to_string()))
            })
            .collect();

        ClientConfig {
            base_url: self.inner.base_url.clone(),
            default_headers,
            timeout: self.inner.timeout,
            retries: self.inner.retry_policy.retries,
            retry_delay: self.inner.retry_policy.retry_delay,
        }
    }

    /// Sets a default header on this client and every clone of it.
    ///
    /// The change is seen by every later attempt, including retries of calls
    /// already in flight.
    ///
    /// # Errors
    ///
    /// Returns an error if the header name or value is invalid.
    pub fn set_default_header(&self, name: impl AsRef<str>, value: impl AsRef<str>) -> Result<()> {
        let (name, value) = header_pair(name.as_ref(), value.as_ref())?;
        self.inner.default_headers.rcu(|current| {
            let mut next = HeaderMap::clone(current);
            next.insert(name.clone(), value.clone());
            next
        });
        Ok(())
    }

    /// Removes a default header. Unknown or invalid names are ignored.
    pub fn remove_default_header(&self, name: impl AsRef<str>) {
        let name = name.as_ref();
        self.inner.default_headers.rcu(|current| {
            let mut next = HeaderMap::clone(current);
            next.remove(name);
            next
        });
    }

    /// Sends `Authorization: Bearer <token>` with every later request.
    ///
    /// # Errors
    ///
    /// Returns an error if `token` is not a valid header value.
    pub fn set_bearer_token(&self, token: impl AsRef<str>) -> Result<()> {
        self.set_default_header(AUTHORIZATION, format!("Bearer {}", token.as_ref()))
    }

    /// Stops sending the `Authorization` header.
    pub fn clear_bearer_token(&self) {
        self.remove_default_header(AUTHORIZATION);
    }

    /// Runs `call` and returns the response body as raw JSON.
    ///
    /// The data is `None` for 204 responses and `HEAD` requests.
    ///
    /// # Errors
    ///
    /// Fails before any network traffic on a missing path parameter, a body
    /// the endpoint does not take, or a body that cannot be encoded. Failed
    /// attempts are retried per the client's policy; the last failure is
    /// returned as is. A body that is not JSON yields
    /// [`Error::DeserializationFailed`].
    pub async fn execute(&self, call: Call) -> Result<Response<Option<Value>>> {
        let method = call.method();
        let Call {
            endpoint,
            path_params,
            query,
            body,
            options,
        } = call;

        endpoint.check_body(&body)?;

        let undeclared = endpoint.undeclared_query(&query);
        if !undeclared.is_empty() {
            tracing::warn!(
                endpoint = endpoint.name,
                params = ?undeclared,
                "Sending query parameters the endpoint does not declare"
            );
        }

        let path = bind_path(endpoint.path, &path_params)?;
        let url = join_url(&self.inner.base_url, &path, &query)?;
        let body = encode(body)?;

        let inner = &self.inner;
        let transport = inner.transport.as_ref();
        let start_time = Instant::now();

        let (outcome, attempts) = retry::execute(
            &inner.retry_policy,
            inner.retry_predicate.as_ref(),
            options.signal.as_ref(),
            |attempt| {
                let request = RequestAttempt {
                    method: method.clone(),
                    url: url.clone(),
                    headers: merge_headers(&inner.default_headers.load(), &options.headers),
                    body: body.clone(),
                    attempt,
                };
                let signal = AttemptSignal::new(inner.timeout, options.signal.clone());
                async move { transport::invoke(transport, request, &signal).await }
            },
        )
        .await?;

        let latency = start_time.elapsed();
        tracing::info!(
            endpoint = endpoint.name,
            status = outcome.status.as_u16(),
            latency_ms = latency.as_millis() as u64,
            attempts = attempts,
            "Received HTTP response"
        );

        let status = outcome.status;
        let Some(raw_body) = outcome.body else {
            return Ok(Response::new(
                None,
                String::new(),
                status,
                outcome.headers,
                latency,
                attempts,
            ));
        };

        match serde_json::from_str::<Value>(&raw_body) {
            Ok(data) => Ok(Response::new(
                Some(data),
                raw_body,
                status,
                outcome.headers,
                latency,
                attempts,
            )),
            Err(e) => {
                tracing::error!(
                    endpoint = endpoint.name,
                    error = %e,
                    raw_response = %raw_body,
                    "Failed to deserialize response"
                );

                Err(Error::DeserializationFailed {
                    raw_response: raw_body,
                    serde_error: e.to_string(),
                    status,
                })
            }
        }
    }

    /// Runs `call` and validates the body against `S`.
    ///
    /// # Errors
    ///
    /// Everything [`execute`](Self::execute) returns, plus
    /// [`Error::Validation`] listing every violation in the body.
    pub async fn send<S: Schema>(&self, call: Call) -> Result<Response<Option<S::Output>>> {
        let endpoint = call.endpoint().name;
        let response = self.execute(call).await?;

        response
            .try_map(|data| data.map(|value| validate::parse::<S>(&value)).transpose())
            .map_err(|e| {
                if let Some(errors) = e.field_errors() {
                    tracing::error!(
                        endpoint = endpoint,
                        schema = S::rule().name(),
                        error_count = errors.len(),
                        error = %e,
                        "Response failed validation"
                    );
                }
                e
            })
    }

    /// Runs `call` and discards the body.
    ///
    /// # Errors
    ///
    /// Same as [`execute`](Self::execute).
    pub async fn send_empty(&self, call: Call) -> Result<Response<()>> {
        Ok(self.execute(call).await?.map(|_| ()))
    }
}

/// Builder for configuring and creating a [`Client`].
///
/// # Examples
///
/// ```no_run
/// use apiwire::{ClientBuilder, RetryOnTransient};
/// use std::time::Duration;
///
/// # fn example() -> Result<(), apiwire::Error> {
/// let client = ClientBuilder::new()
///     .base_url("https://api.example.com")?
///     .timeout(Duration::from_secs(10))
///     .retries(5)
///     .retry_delay(Duration::from_millis(200))
///     .retry_predicate(Box::new(RetryOnTransient))
///     .default_header("User-Agent", "my-app/1.0")?
///     .build()?;
/// # Ok(())
/// # }
/// ```
pub struct ClientBuilder {
    base_url: Option<String>,
    default_headers: HeaderMap,
    retry_policy: RetryPolicy,
    retry_predicate: Option<Box<dyn RetryPredicate>>,
    timeout: Duration,
    transport: Option<Arc<dyn Transport>>,
}

impl ClientBuilder {
    /// Creates a new `ClientBuilder` with default settings.
    pub fn new() -> Self {
        Self {
            base_url: None,
            default_headers: HeaderMap::new(),
            retry_policy: RetryPolicy::default(),
            retry_predicate: None,
            timeout: DEFAULT_TIMEOUT,
            transport: None,
        }
    }

    /// Starts from the settings in `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL or a default header is invalid.
    pub fn from_config(config: ClientConfig) -> Result<Self> {
        let mut builder = Self::new()
            .base_url(&config.base_url)?
            .timeout(config.timeout)
            .retry_policy(RetryPolicy::new(config.retries, config.retry_delay));
        for (name, value) in &config.default_headers {
            builder = builder.default_header(name, value)?;
        }
        Ok(builder)
    }

    /// Sets the base URL for all requests. A trailing slash is dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid.
    pub fn base_url(mut self, url: impl AsRef<str>) -> Result<Self> {
        let url = url.as_ref().trim_end_matches('/');
        Url::parse(url)?;
        self.base_url = Some(url.to_string());
        Ok(self)
    }

    /// Adds a default header that will be included in all requests.
    ///
    /// # Errors
    ///
    /// Returns an error if the header name or value is invalid.
    pub fn default_header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Result<Self> {
        let (name, value) = header_pair(name.as_ref(), value.as_ref())?;
        self.default_headers.insert(name, value);
        Ok(self)
    }

    /// Sets the per-attempt timeout. Zero disables it.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the number of retries after the first attempt.
    pub fn retries(mut self, retries: usize) -> Self {
        self.retry_policy.retries = retries;
        self
    }

    /// Sets the delay between attempts.
    pub fn retry_delay(mut self, delay: Duration) -> Self {
        self.retry_policy.retry_delay = delay;
        self
    }

    /// Replaces the whole retry policy.
    pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    /// Sets a custom retry predicate.
    ///
    /// By default every exchange failure is retried ([`RetryOnFailure`]).
    pub fn retry_predicate(mut self, predicate: Box<dyn RetryPredicate>) -> Self {
        self.retry_predicate = Some(predicate);
        self
    }

    /// Sends requests through `transport` instead of `reqwest`.
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Builds the configured `Client`.
    ///
    /// # Errors
    ///
    /// Returns an error if no base URL was provided or if the HTTP client
    /// cannot be created.
    pub fn build(self) -> Result<Client> {
        let base_url = self
            .base_url
            .ok_or_else(|| Error::ConfigurationError("Base URL is required".to_string()))?;

        let transport: Arc<dyn Transport> = match self.transport {
            Some(transport) => transport,
            None => Arc::new(ReqwestTransport::new()?),
        };

        let retry_predicate = self
            .retry_predicate
            .unwrap_or_else(|| Box::new(RetryOnFailure));

        Ok(Client {
            inner: Arc::new(ClientInner {
                transport,
                base_url,
                default_headers: ArcSwap::from_pointee(self.default_headers),
                retry_policy: self.retry_policy,
                retry_predicate,
                timeout: self.timeout,
            }),
        })
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
