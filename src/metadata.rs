//! Endpoint descriptors and per-call metadata.
//!
//! An [`Endpoint`] is the static description of one API operation: method,
//! path template, parameter names and body encoding. A [`Call`] binds an
//! endpoint to concrete arguments for one invocation, and [`RequestOptions`]
//! carries the caller's overrides (extra headers, a cancellation token, a
//! method override).

use crate::body::RequestBody;
use crate::path::{PathParams, Query};
use crate::{Error, Result};
use http::{HeaderMap, HeaderName, HeaderValue, Method};
use std::fmt::Display;
use tokio_util::sync::CancellationToken;

/// How an endpoint expects its request body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    /// The endpoint takes no body.
    None,
    /// A JSON document.
    Json,
    /// A multipart form.
    Multipart,
}

/// The static description of one API operation.
///
/// # Examples
///
/// ```
/// use apiwire::metadata::{BodyKind, Endpoint};
/// use http::Method;
///
/// static GET_ENTRY: Endpoint = Endpoint {
///     name: "get_entry",
///     method: Method::GET,
///     path: "/entries/{entry_id}",
///     path_params: &["entry_id"],
///     query_params: &[],
///     body: BodyKind::None,
/// };
/// assert_eq!(GET_ENTRY.path_params, &["entry_id"]);
/// ```
#[derive(Debug)]
pub struct Endpoint {
    /// Operation name, used in logs.
    pub name: &'static str,
    /// The HTTP method.
    pub method: Method,
    /// Path template with `{name}` placeholders.
    pub path: &'static str,
    /// Names of the required path parameters.
    pub path_params: &'static [&'static str],
    /// Names of the accepted query parameters.
    pub query_params: &'static [&'static str],
    /// Expected body encoding.
    pub body: BodyKind,
}

impl Endpoint {
    /// Checks that `body` matches the declared encoding.
    ///
    /// An empty body is always accepted, since request bodies may be optional.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigurationError`] on a mismatch.
    pub fn check_body(&self, body: &RequestBody) -> Result<()> {
        let ok = match (self.body, body) {
            (_, RequestBody::Empty) => true,
            (BodyKind::Json, RequestBody::Json(_)) => true,
            (BodyKind::Multipart, RequestBody::Form(_) | RequestBody::Multipart(_)) => true,
            _ => false,
        };
        if ok {
            Ok(())
        } else {
            Err(Error::ConfigurationError(format!(
                "Endpoint {} expects a {:?} body",
                self.name, self.body
            )))
        }
    }

    /// Names in `query` that the endpoint does not declare.
    pub fn undeclared_query<'q>(&self, query: &'q Query) -> Vec<&'q str> {
        query
            .iter()
            .map(|(name, _)| name)
            .filter(|name| !self.query_params.iter().any(|declared| declared == name))
            .collect()
    }
}

/// Parses a header pair, mapping failures to [`Error::ConfigurationError`].
pub(crate) fn header_pair(name: &str, value: &str) -> Result<(HeaderName, HeaderValue)> {
    let name = HeaderName::try_from(name)
        .map_err(|e| Error::ConfigurationError(format!("Invalid header name: {}", e)))?;
    let value = HeaderValue::try_from(value)
        .map_err(|e| Error::ConfigurationError(format!("Invalid header value: {}", e)))?;
    Ok((name, value))
}

/// Shallow-merges `overrides` over `defaults`.
///
/// A header named in `overrides` replaces every default value of that name.
pub fn merge_headers(defaults: &HeaderMap, overrides: &HeaderMap) -> HeaderMap {
    let mut merged = defaults.clone();
    for name in overrides.keys() {
        merged.remove(name);
        for value in overrides.get_all(name) {
            merged.append(name.clone(), value.clone());
        }
    }
    merged
}

/// Per-call overrides.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// Headers that win over the client's defaults.
    pub headers: HeaderMap,
    /// Aborts the in-flight attempt when cancelled.
    pub signal: Option<CancellationToken>,
    /// Replaces the endpoint's method.
    pub method: Option<Method>,
}

impl RequestOptions {
    /// Creates empty options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a header to the request.
    ///
    /// # Errors
    ///
    /// Returns an error if the header name or value is invalid.
    pub fn with_header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Result<Self> {
        let (name, value) = header_pair(name.as_ref(), value.as_ref())?;
        self.headers.insert(name, value);
        Ok(self)
    }

    /// Attaches a cancellation token.
    pub fn with_signal(mut self, signal: CancellationToken) -> Self {
        self.signal = Some(signal);
        self
    }

    /// Overrides the HTTP method.
    pub fn with_method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }
}

/// One invocation of an endpoint.
#[derive(Debug, Clone)]
pub struct Call {
    pub(crate) endpoint: &'static Endpoint,
    pub(crate) path_params: PathParams,
    pub(crate) query: Query,
    pub(crate) body: RequestBody,
    pub(crate) options: RequestOptions,
}

impl Call {
    /// Starts a call to `endpoint` with no arguments.
    pub fn new(endpoint: &'static Endpoint) -> Self {
        Self {
            endpoint,
            path_params: PathParams::new(),
            query: Query::new(),
            body: RequestBody::Empty,
            options: RequestOptions::default(),
        }
    }

    /// Binds a path parameter.
    pub fn path_param(mut self, name: &str, value: impl Display) -> Self {
        self.path_params.insert(name, value);
        self
    }

    /// Sets the query parameters.
    pub fn query(mut self, query: Query) -> Self {
        self.query = query;
        self
    }

    /// Sets the request body.
    pub fn body(mut self, body: RequestBody) -> Self {
        self.body = body;
        self
    }

    /// Sets the per-call overrides.
    pub fn options(mut self, options: RequestOptions) -> Self {
        self.options = options;
        self
    }

    /// The endpoint being called.
    pub fn endpoint(&self) -> &'static Endpoint {
        self.endpoint
    }

    /// The effective method: the override if any, else the endpoint's.
    pub fn method(&self) -> Method {
        self.options
            .method
            .clone()
            .unwrap_or_else(|| self.endpoint.method.clone())
    }
}
