use std::fmt;
use std::time::Duration;

use reqwest::{header, Method, Url};
use serde::{de::DeserializeOwned, Serialize};
use tokio_util::sync::CancellationToken;

use crate::{
    poll, request_with_retries, Backoff, ClientOptions, PollOptions, Result, RetryPolicy,
    RunStatus, RunTaskRequest, RunWorkflowRequest, SkyvernError,
};

/// Base URL of the hosted Skyvern API.
pub const DEFAULT_BASE_URL: &str = "https://api.skyvern.com";

const API_KEY_HEADER: &str = "x-api-key";

#[derive(Clone)]
/// HTTP client for the Skyvern run API.
pub struct SkyvernClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    options: ClientOptions,
    retry: RetryPolicy,
    cancel: CancellationToken,
}

impl fmt::Debug for SkyvernClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SkyvernClient")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .field("options", &self.options)
            .finish()
    }
}

impl SkyvernClient {
    /// Creates a client for a self-hosted or custom deployment.
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        let options = ClientOptions::default();
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim().trim_end_matches('/').to_owned(),
            api_key: api_key.into(),
            retry: RetryPolicy::from_options(&options),
            options,
            cancel: CancellationToken::new(),
        }
    }

    /// Creates a client for the hosted API at [`DEFAULT_BASE_URL`].
    pub fn cloud(api_key: impl Into<String>) -> Self {
        Self::new(DEFAULT_BASE_URL, api_key)
    }

    /// Creates a client from environment variables.
    ///
    /// Reads:
    /// - `SKYVERN_API_KEY` — API key sent as `x-api-key`
    /// - `SKYVERN_BASE_URL` — optional, defaults to [`DEFAULT_BASE_URL`]
    ///
    /// # Example
    ///
    /// ```no_run
    /// use skyvern_http::SkyvernClient;
    ///
    /// let client = SkyvernClient::from_env().expect("missing SKYVERN_API_KEY");
    /// ```
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("SKYVERN_API_KEY").map_err(|_| {
            SkyvernError::Config("missing SKYVERN_API_KEY environment variable".to_owned())
        })?;
        if api_key.trim().is_empty() {
            return Err(SkyvernError::Config(
                "SKYVERN_API_KEY is set but empty".to_owned(),
            ));
        }
        let base_url = std::env::var("SKYVERN_BASE_URL")
            .ok()
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_owned());
        Ok(Self::new(base_url, api_key.trim()))
    }

    /// Applies client options such as timeout and retry behavior.
    pub fn with_options(mut self, opts: ClientOptions) -> Self {
        self.retry = RetryPolicy::from_options(&opts);
        self.options = opts;
        self
    }

    /// Overrides the delay calculation, e.g. to inject a deterministic jitter source.
    pub fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.retry.backoff = backoff;
        self
    }

    /// Ties every request and wait issued by this client to `token`.
    ///
    /// Cancelling it aborts in-flight requests, pending retries and run polling.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Starts a task run.
    pub async fn run_task(&self, request: &RunTaskRequest) -> Result<RunStatus> {
        self.post_json(&["v1", "run", "tasks"], request).await
    }

    /// Starts a workflow run.
    pub async fn run_workflow(&self, request: &RunWorkflowRequest) -> Result<RunStatus> {
        self.post_json(&["v1", "run", "workflows"], request).await
    }

    /// Fetches the current state of a run.
    pub async fn get_run(&self, run_id: &str) -> Result<RunStatus> {
        let url = self.endpoint(&["v1", "runs", run_id.trim()])?;
        let body = self.send(Method::GET, url, None).await?;
        decode_json(&body)
    }

    /// Asks the server to cancel a run. Does not wait for it to stop.
    pub async fn cancel_run(&self, run_id: &str) -> Result<()> {
        let url = self.endpoint(&["v1", "runs", run_id.trim(), "cancel"])?;
        self.send(Method::POST, url, None).await?;
        Ok(())
    }

    /// Polls [`Self::get_run`] until the run is terminal or `options.timeout` elapses.
    pub async fn wait_for_run_completion(
        &self,
        run_id: &str,
        options: &PollOptions,
    ) -> Result<RunStatus> {
        poll::wait_for_run_completion(run_id, options, &self.cancel, || self.get_run(run_id)).await
    }

    /// Starts a task run and waits for it to finish.
    pub async fn run_task_and_wait(
        &self,
        request: &RunTaskRequest,
        options: &PollOptions,
    ) -> Result<RunStatus> {
        let run = self.run_task(request).await?;
        self.wait_unless_terminal(run, options).await
    }

    /// Starts a workflow run and waits for it to finish.
    pub async fn run_workflow_and_wait(
        &self,
        request: &RunWorkflowRequest,
        options: &PollOptions,
    ) -> Result<RunStatus> {
        let run = self.run_workflow(request).await?;
        self.wait_unless_terminal(run, options).await
    }

    async fn wait_unless_terminal(&self, run: RunStatus, options: &PollOptions) -> Result<RunStatus> {
        if run.is_terminal() {
            return Ok(run);
        }
        self.wait_for_run_completion(&run.run_id, options).await
    }

    async fn post_json<B, T>(&self, path: &[&str], payload: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let bytes = serde_json::to_vec(payload)
            .map_err(|err| SkyvernError::Encode(format!("invalid request body: {err}")))?;
        let url = self.endpoint(path)?;
        let body = self.send(Method::POST, url, Some(bytes)).await?;
        decode_json(&body)
    }

    /// Sends one API call through the retry loop and returns the success body.
    async fn send(&self, method: Method, url: Url, body: Option<Vec<u8>>) -> Result<String> {
        let timeout = Duration::from_millis(self.options.timeout_ms);

        let response = request_with_retries(&self.retry, &self.cancel, |_attempt| {
            let mut request = self
                .http
                .request(method.clone(), url.clone())
                .header(API_KEY_HEADER, &self.api_key)
                .header(header::ACCEPT, "application/json")
                .timeout(timeout);
            if let Some(bytes) = &body {
                request = request
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(bytes.clone());
            }
            async move { request.send().await.map_err(SkyvernError::from_transport) }
        })
        .await?;

        let status = response.status();
        let text = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return Err(SkyvernError::Aborted),
            text = response.text() => text.map_err(SkyvernError::from_transport)?,
        };

        if !status.is_success() {
            return Err(SkyvernError::Http {
                status: status.as_u16(),
                body: text,
            });
        }
        Ok(text)
    }

    /// Joins `segments` onto the base URL, percent-encoding each one.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = Url::parse(&self.base_url).map_err(|err| {
            SkyvernError::Config(format!("invalid base URL '{}': {err}", self.base_url))
        })?;
        url.path_segments_mut()
            .map_err(|_| {
                SkyvernError::Config(format!("base URL '{}' cannot carry a path", self.base_url))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

fn decode_json<T: DeserializeOwned>(body: &str) -> Result<T> {
    serde_json::from_str(body).map_err(|err| {
        SkyvernError::Decode(format!("invalid response JSON: {err}; body: {body}"))
    })
}
