//! The network seam and outcome classification.
//!
//! [`Transport`] performs one physical send. [`invoke`] runs it under the
//! attempt's cancellation signal and sorts the result into success, empty
//! success (204 or `HEAD`) and [`Error::HttpError`].

use crate::body::EncodedBody;
use crate::cancel::AttemptSignal;
use crate::{Error, Result};
use async_trait::async_trait;
use http::header::CONTENT_TYPE;
use http::{HeaderMap, HeaderValue, Method, StatusCode};
use url::Url;

/// Everything needed to send one attempt.
#[derive(Debug, Clone)]
pub struct RequestAttempt {
    /// The HTTP method.
    pub method: Method,
    /// The fully resolved URL.
    pub url: Url,
    /// Default headers merged with per-call overrides.
    pub headers: HeaderMap,
    /// The encoded body.
    pub body: EncodedBody,
    /// The 1-indexed attempt number.
    pub attempt: usize,
}

/// An unclassified response.
#[derive(Debug, Clone)]
pub struct RawResponse {
    /// The HTTP status code.
    pub status: StatusCode,
    /// The response headers.
    pub headers: HeaderMap,
    /// The response body as text.
    pub body: String,
}

/// A successful exchange.
#[derive(Debug, Clone)]
pub struct Outcome {
    /// The HTTP status code.
    pub status: StatusCode,
    /// The response headers.
    pub headers: HeaderMap,
    /// The body, or `None` for 204 responses and `HEAD` requests.
    pub body: Option<String>,
}

/// Sends a single attempt over the network.
///
/// Implementations must not retry on their own and must not apply a timeout;
/// both are handled by the caller.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends the attempt and returns the raw response, whatever its status.
    async fn send(&self, request: RequestAttempt) -> Result<RawResponse>;
}

/// [`Transport`] backed by a `reqwest` client.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    http_client: reqwest::Client,
}

impl ReqwestTransport {
    /// Creates a transport with a default `reqwest` client.
    ///
    /// # Errors
    ///
    /// Returns an error if the TLS backend cannot be initialized.
    pub fn new() -> Result<Self> {
        let http_client = reqwest::Client::builder().build().map_err(|e| {
            Error::ConfigurationError(format!("Failed to build HTTP client: {}", e))
        })?;
        Ok(Self { http_client })
    }

    /// Wraps an existing `reqwest` client.
    pub fn with_client(http_client: reqwest::Client) -> Self {
        Self { http_client }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: RequestAttempt) -> Result<RawResponse> {
        let RequestAttempt {
            method,
            url,
            mut headers,
            body,
            ..
        } = request;

        let builder = match body {
            EncodedBody::Empty => self.http_client.request(method, url).headers(headers),
            EncodedBody::Json(bytes) => {
                if !headers.contains_key(CONTENT_TYPE) {
                    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
                }
                self.http_client
                    .request(method, url)
                    .headers(headers)
                    .body(bytes)
            }
            EncodedBody::Multipart(payload) => {
                // The form sets its own content type with the boundary.
                headers.remove(CONTENT_TYPE);
                self.http_client
                    .request(method, url)
                    .headers(headers)
                    .multipart(payload.to_form()?)
            }
        };

        let response = builder.send().await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.text().await?;

        Ok(RawResponse {
            status,
            headers,
            body,
        })
    }
}

/// Sends one attempt under its cancellation signal and classifies the result.
///
/// # Errors
///
/// Returns [`Error::Cancelled`] or [`Error::Timeout`] if the signal fires,
/// the transport's own error if the send fails, and [`Error::HttpError`] for
/// any non-2xx status.
pub async fn invoke(
    transport: &dyn Transport,
    request: RequestAttempt,
    signal: &AttemptSignal,
) -> Result<Outcome> {
    tracing::debug!(
        method = %request.method,
        url = %request.url,
        attempt = request.attempt,
        "Executing HTTP request"
    );

    let method = request.method.clone();
    let raw = signal.guard(transport.send(request)).await?;
    classify(&method, raw)
}

/// Sorts a raw response into an [`Outcome`] or an [`Error::HttpError`].
pub fn classify(method: &Method, raw: RawResponse) -> Result<Outcome> {
    let RawResponse {
        status,
        headers,
        body,
    } = raw;

    if !status.is_success() {
        if status.is_client_error() {
            tracing::error!(
                status = status.as_u16(),
                response = %body,
                "Client error (4xx)"
            );
        } else {
            tracing::warn!(
                status = status.as_u16(),
                response = %body,
                "Server error (5xx)"
            );
        }

        return Err(Error::HttpError {
            status,
            raw_response: body,
            headers,
        });
    }

    let body = if status == StatusCode::NO_CONTENT || *method == Method::HEAD {
        None
    } else {
        Some(body)
    };

    Ok(Outcome {
        status,
        headers,
        body,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio_util::sync::CancellationToken;

    fn raw(status: u16, body: &str) -> RawResponse {
        RawResponse {
            status: StatusCode::from_u16(status).unwrap(),
            headers: HeaderMap::new(),
            body: body.to_string(),
        }
    }

    #[test]
    fn test_success_keeps_body() {
        let outcome = classify(&Method::GET, raw(200, "{}")).unwrap();
        assert_eq!(outcome.body.as_deref(), Some("{}"));
    }

    #[test]
    fn test_no_content_is_empty() {
        let outcome = classify(&Method::DELETE, raw(204, "")).unwrap();
        assert_eq!(outcome.status, StatusCode::NO_CONTENT);
        assert!(outcome.body.is_none());
    }

    #[test]
    fn test_head_is_empty() {
        let outcome = classify(&Method::HEAD, raw(200, "ignored")).unwrap();
        assert!(outcome.body.is_none());
    }

    #[test]
    fn test_error_status_carries_raw_response() {
        match classify(&Method::GET, raw(404, "Not found")) {
            Err(Error::HttpError {
                status,
                raw_response,
                ..
            }) => {
                assert_eq!(status.as_u16(), 404);
                assert_eq!(raw_response, "Not found");
            }
            other => panic!("Expected HttpError, got {:?}", other),
        }
    }

    struct FlagTransport {
        sent: Arc<AtomicBool>,
    }

    #[async_trait]
    impl Transport for FlagTransport {
        async fn send(&self, _request: RequestAttempt) -> Result<RawResponse> {
            self.sent.store(true, Ordering::SeqCst);
            Ok(raw(200, "{}"))
        }
    }

    #[tokio::test]
    async fn test_cancelled_signal_never_sends() {
        let sent = Arc::new(AtomicBool::new(false));
        let transport = FlagTransport { sent: sent.clone() };
        let token = CancellationToken::new();
        token.cancel();

        let request = RequestAttempt {
            method: Method::GET,
            url: Url::parse("http://localhost/x").unwrap(),
            headers: HeaderMap::new(),
            body: EncodedBody::Empty,
            attempt: 1,
        };
        let signal = AttemptSignal::new(Duration::from_secs(1), Some(token));
        let result = invoke(&transport, request, &signal).await;

        assert!(matches!(result, Err(Error::Cancelled)));
        assert!(!sent.load(Ordering::SeqCst));
    }
}
