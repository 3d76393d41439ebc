//! `skyvern-http` is an async HTTP client for the Skyvern run API.
//!
//! Every call goes through a retry loop that honors `Retry-After` and
//! `X-RateLimit-Reset` before falling back to jittered exponential backoff.
//! Long-running runs can be awaited with a cancellable poller:
//! - [`SkyvernClient::run_task_and_wait`]
//! - [`SkyvernClient::run_workflow_and_wait`]
//! - [`SkyvernClient::wait_for_run_completion`]
//!
//! The building blocks are public for use with other transports:
//! [`Backoff`], [`request_with_retries`] and [`wait_for_run_completion`].

mod backoff;
mod client;
mod error;
mod options;
mod poll;
mod retry;
mod types;

pub use backoff::{Backoff, Clock, RandomSource, RATE_LIMIT_RESET};
pub use client::{SkyvernClient, DEFAULT_BASE_URL};
pub use error::SkyvernError;
pub use options::{BackoffConfig, ClientOptions, PollOptions};
pub use poll::{wait_for_run_completion, PollSession};
pub use retry::{request_with_retries, HttpResponse, ResponseClassification, RetryPolicy};
pub use types::{RunState, RunStatus, RunTaskRequest, RunWorkflowRequest};

pub use tokio_util::sync::CancellationToken;

pub type Result<T> = std::result::Result<T, SkyvernError>;
