//! Error types for API calls.
//!
//! Every failure a call can surface lives in [`Error`]. Errors that happen
//! before the first attempt (path binding, serialization, configuration) and
//! errors that happen after a successful exchange (validation, malformed JSON)
//! are never retried. Transport and HTTP-status failures are handed to the
//! retry loop, which decides whether to try again or surface them unmodified.

use crate::validate::{FieldError, ValidationError};
use http::{HeaderMap, StatusCode};

/// The main error type for API calls.
///
/// # Examples
///
/// ```no_run
/// use apiwire::api::ApiClient;
/// use apiwire::{ClientConfig, Error};
///
/// # async fn example() -> Result<(), Error> {
/// let api = ApiClient::new(ClientConfig::new("https://api.example.com"))?;
///
/// match api.current_user(Default::default()).await {
///     Ok(response) => println!("Signed in as {:?}", response.data),
///     Err(Error::Validation(err)) => {
///         for field in err.errors() {
///             eprintln!("{}: {}", field.path, field.message);
///         }
///     }
///     Err(Error::HttpError { status, raw_response, .. }) => {
///         eprintln!("HTTP error {}: {}", status, raw_response);
///     }
///     Err(e) => eprintln!("Other error: {}", e),
/// }
/// # Ok(())
/// # }
/// ```
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// A network-level error occurred (connection refused, DNS failure, reset, etc.).
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The attempt exceeded the configured timeout.
    #[error("Request timed out")]
    Timeout,

    /// The caller's cancellation token fired while the attempt was in flight
    /// (or had already fired when the attempt started).
    #[error("Request cancelled")]
    Cancelled,

    /// The server returned a non-2xx HTTP status code.
    #[error("HTTP error {status}: {raw_response}")]
    HttpError {
        /// The HTTP status code
        status: StatusCode,
        /// The raw response body
        raw_response: String,
        /// The response headers
        headers: HeaderMap,
    },

    /// The response body did not match the endpoint's declared shape.
    ///
    /// Carries every violated rule in order, plus the offending payload.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The response body was not valid JSON, or a validated value could not be
    /// converted into its domain type.
    #[error("Failed to deserialize response (status {status}): {serde_error}")]
    DeserializationFailed {
        /// The raw response body that failed to deserialize
        raw_response: String,
        /// The serde error message
        serde_error: String,
        /// The HTTP status code
        status: StatusCode,
    },

    /// A placeholder in the endpoint's path template had no value.
    #[error("Missing path parameter: {name}")]
    MissingPathParameter {
        /// The placeholder name, without braces
        name: String,
    },

    /// Invalid configuration was provided, such as an invalid header value.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// Failed to serialize the request body.
    #[error("Failed to serialize request: {0}")]
    SerializationFailed(String),

    /// The resolved URL could not be parsed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl Error {
    /// Returns `true` if this error came from the exchange itself and may be
    /// handed to the retry loop.
    ///
    /// Network errors, timeouts, cancellations and every non-2xx status qualify.
    /// Which of these actually get retried is up to the configured
    /// [`RetryPredicate`](crate::RetryPredicate).
    ///
    /// # Examples
    ///
    /// ```
    /// use apiwire::Error;
    /// use http::{HeaderMap, StatusCode};
    ///
    /// let err = Error::HttpError {
    ///     status: StatusCode::BAD_REQUEST,
    ///     raw_response: "Bad request".to_string(),
    ///     headers: HeaderMap::new(),
    /// };
    /// assert!(err.is_retryable());
    ///
    /// let err = Error::MissingPathParameter { name: "entry_id".to_string() };
    /// assert!(!err.is_retryable());
    /// ```
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Network(_) => true,
            Error::Timeout => true,
            Error::Cancelled => true,
            Error::HttpError { .. } => true,
            Error::Validation(_) => false,
            Error::DeserializationFailed { .. } => false,
            Error::MissingPathParameter { .. } => false,
            Error::ConfigurationError(_) => false,
            Error::SerializationFailed(_) => false,
            Error::InvalidUrl(_) => false,
        }
    }

    /// Returns `true` for failures that are usually transient: network errors,
    /// timeouts, 429 and 5xx responses.
    pub fn is_transient(&self) -> bool {
        match self {
            Error::Network(_) | Error::Timeout => true,
            Error::HttpError { status, .. } => {
                status.is_server_error() || *status == StatusCode::TOO_MANY_REQUESTS
            }
            _ => false,
        }
    }

    /// Returns the HTTP status code if this error has one.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Error::HttpError { status, .. } => Some(*status),
            Error::DeserializationFailed { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns the raw response body if this error has one.
    pub fn raw_response(&self) -> Option<&str> {
        match self {
            Error::HttpError { raw_response, .. } => Some(raw_response),
            Error::DeserializationFailed { raw_response, .. } => Some(raw_response),
            _ => None,
        }
    }

    /// Returns the ordered field errors of a validation failure.
    pub fn field_errors(&self) -> Option<&[FieldError]> {
        match self {
            Error::Validation(err) => Some(err.errors()),
            _ => None,
        }
    }
}

/// A specialized `Result` type for API calls.
pub type Result<T> = std::result::Result<T, Error>;
