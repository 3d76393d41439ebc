use std::future::Future;

use reqwest::{header::HeaderMap, StatusCode};
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

use crate::{Backoff, ClientOptions, Result, SkyvernError};

/// How a response status should be handled by the retry loop.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ResponseClassification {
    Success,
    RetryableFailure,
    TerminalFailure,
}

impl ResponseClassification {
    /// 408, 429 and 5xx are retryable; every other 4xx is terminal.
    pub fn from_status(status: StatusCode) -> Self {
        match status.as_u16() {
            408 | 429 => Self::RetryableFailure,
            code if code >= 500 => Self::RetryableFailure,
            code if code >= 400 => Self::TerminalFailure,
            _ => Self::Success,
        }
    }
}

/// The parts of a response the retry loop inspects.
pub trait HttpResponse {
    fn status(&self) -> StatusCode;
    fn headers(&self) -> &HeaderMap;
}

impl HttpResponse for reqwest::Response {
    fn status(&self) -> StatusCode {
        reqwest::Response::status(self)
    }

    fn headers(&self) -> &HeaderMap {
        reqwest::Response::headers(self)
    }
}

/// Retry budget plus the delay calculation between attempts.
#[derive(Clone, Debug, Default)]
pub struct RetryPolicy {
    /// Maximum number of retries after the initial attempt.
    pub max_retries: usize,
    pub backoff: Backoff,
}

impl RetryPolicy {
    pub fn new(max_retries: usize, backoff: Backoff) -> Self {
        Self {
            max_retries,
            backoff,
        }
    }

    pub fn from_options(options: &ClientOptions) -> Self {
        Self::new(options.max_retries, Backoff::new(options.backoff.clone()))
    }
}

/// Sends a request built by `request_fn`, retrying retryable statuses.
///
/// `request_fn` receives the zero-based attempt index and must rebuild the whole
/// request, body included. Attempts are strictly sequential. Once the budget is
/// spent the last response is returned as-is, so callers must check its status.
/// Errors from `request_fn` are never retried. Cancelling `cancel` stops both
/// an in-flight attempt and a pending backoff sleep with [`SkyvernError::Aborted`].
pub async fn request_with_retries<R, F, Fut>(
    policy: &RetryPolicy,
    cancel: &CancellationToken,
    mut request_fn: F,
) -> Result<R>
where
    R: HttpResponse,
    F: FnMut(usize) -> Fut,
    Fut: Future<Output = Result<R>>,
{
    let mut attempt = 0usize;
    loop {
        if cancel.is_cancelled() {
            return Err(SkyvernError::Aborted);
        }

        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(SkyvernError::Aborted),
            response = request_fn(attempt) => response?,
        };

        let status = response.status();
        if ResponseClassification::from_status(status) != ResponseClassification::RetryableFailure
        {
            return Ok(response);
        }

        if attempt >= policy.max_retries {
            #[cfg(feature = "tracing")]
            tracing::warn!(
                status = status.as_u16(),
                attempts = attempt + 1,
                "retry budget exhausted"
            );
            return Ok(response);
        }

        let delay = policy.backoff.compute_delay(response.headers(), attempt);

        #[cfg(feature = "tracing")]
        tracing::debug!(
            status = status.as_u16(),
            attempt,
            delay_ms = delay.as_millis() as u64,
            "retrying request"
        );

        drop(response);
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(SkyvernError::Aborted),
            _ = sleep(delay) => {}
        }
        attempt += 1;
    }
}
