//! Per-attempt cancellation.
//!
//! Each attempt runs under an [`AttemptSignal`] that fires when either the
//! configured timeout elapses or the caller's [`CancellationToken`] is
//! cancelled. The signal only ever aborts the attempt it guards. The retry
//! loop creates a new signal for the next attempt, which restarts the timer.

use crate::{Error, Result};
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// The effective cancellation source of one attempt.
///
/// # Examples
///
/// ```
/// use apiwire::cancel::AttemptSignal;
/// use apiwire::Error;
/// use std::time::Duration;
/// use tokio_util::sync::CancellationToken;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let token = CancellationToken::new();
/// token.cancel();
///
/// let signal = AttemptSignal::new(Duration::from_secs(30), Some(token));
/// let result = signal.guard(async { Ok::<_, Error>(1) }).await;
/// assert!(matches!(result, Err(Error::Cancelled)));
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct AttemptSignal {
    timeout: Option<Duration>,
    external: Option<CancellationToken>,
}

impl AttemptSignal {
    /// Combines a timeout with an optional external token.
    ///
    /// A zero timeout disables the timer.
    pub fn new(timeout: Duration, external: Option<CancellationToken>) -> Self {
        Self {
            timeout: (!timeout.is_zero()).then_some(timeout),
            external,
        }
    }

    /// Returns `true` if the external token has already fired.
    pub fn is_cancelled(&self) -> bool {
        self.external
            .as_ref()
            .is_some_and(CancellationToken::is_cancelled)
    }

    /// The timeout this signal enforces, if any.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Resolves once either source fires, with the matching error.
    ///
    /// The external token is checked first, so a token that was cancelled
    /// before the attempt started wins without waiting for the timer.
    pub async fn fired(&self) -> Error {
        let external = async {
            match &self.external {
                Some(token) => token.cancelled().await,
                None => std::future::pending().await,
            }
        };
        let timer = async {
            match self.timeout {
                Some(timeout) => tokio::time::sleep(timeout).await,
                None => std::future::pending().await,
            }
        };

        tokio::select! {
            biased;
            _ = external => Error::Cancelled,
            _ = timer => Error::Timeout,
        }
    }

    /// Runs `fut` until it completes or the signal fires, whichever is first.
    ///
    /// When the signal wins, `fut` is dropped, which aborts the in-flight call.
    pub async fn guard<F, T>(&self, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        tokio::select! {
            biased;
            reason = self.fired() => Err(reason),
            result = fut => result,
        }
    }
}
