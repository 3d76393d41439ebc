use std::future::Future;
use std::time::Duration;

use tokio::time::{sleep, Instant};
use tokio_util::sync::CancellationToken;

use crate::{PollOptions, Result, RunStatus, SkyvernError};

/// One wait on a single run: its id, when waiting began, and its budget.
#[derive(Clone, Debug)]
pub struct PollSession {
    run_id: String,
    started: Instant,
    timeout: Duration,
    poll_interval: Duration,
}

impl PollSession {
    pub fn start(run_id: impl Into<String>, options: &PollOptions) -> Self {
        Self {
            run_id: run_id.into(),
            started: Instant::now(),
            timeout: options.timeout,
            poll_interval: options.poll_interval,
        }
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn is_expired(&self) -> bool {
        self.elapsed() >= self.timeout
    }

    fn timed_out(&self) -> SkyvernError {
        SkyvernError::PollTimeout {
            run_id: self.run_id.clone(),
            elapsed_secs: self.elapsed().as_secs(),
        }
    }

    fn cancelled(&self) -> SkyvernError {
        SkyvernError::PollCancelled {
            run_id: self.run_id.clone(),
        }
    }
}

/// Polls `fetch` until the run reports a terminal state.
///
/// Server-reported `failed`, `timed_out`, `terminated` and `canceled` are
/// returned as normal results. Only the client-side budget running out yields
/// [`SkyvernError::PollTimeout`]. Fetch errors propagate on the first failure.
pub async fn wait_for_run_completion<F, Fut>(
    run_id: &str,
    options: &PollOptions,
    cancel: &CancellationToken,
    mut fetch: F,
) -> Result<RunStatus>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<RunStatus>>,
{
    let session = PollSession::start(run_id, options);
    let mut polls = 0u32;

    loop {
        let status = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(session.cancelled()),
            status = fetch() => status?,
        };
        polls += 1;

        if status.is_terminal() {
            #[cfg(feature = "tracing")]
            tracing::debug!(
                run_id = session.run_id(),
                status = %status.status,
                polls,
                "run reached terminal state"
            );
            return Ok(status);
        }

        if session.is_expired() {
            #[cfg(feature = "tracing")]
            tracing::warn!(
                run_id = session.run_id(),
                status = %status.status,
                polls,
                "gave up waiting for run"
            );
            return Err(session.timed_out());
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(
            run_id = session.run_id(),
            status = %status.status,
            polls,
            "run still in progress"
        );

        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(session.cancelled()),
            _ = sleep(session.poll_interval) => {}
        }
    }
}
