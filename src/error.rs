/// Error type returned by this crate.
#[derive(Debug, thiserror::Error)]
pub enum SkyvernError {
    /// Network or request execution error from `reqwest`.
    #[error("transport error: {0}")]
    Transport(reqwest::Error),
    /// The request exceeded its per-request deadline.
    #[error("request timed out")]
    Timeout,
    /// The caller cancelled the request; no further attempts were made.
    #[error("request aborted")]
    Aborted,
    /// Non-success HTTP status code with raw response body.
    #[error("http error {status}: {body}")]
    Http { status: u16, body: String },
    /// Request body could not be serialized.
    #[error("encode error: {0}")]
    Encode(String),
    /// Response decoding or protocol-shape validation error.
    #[error("decode error: {0}")]
    Decode(String),
    /// The client-side wait budget ran out before the run reached a terminal state.
    #[error("timed out waiting for run {run_id} to finish after {elapsed_secs} seconds")]
    PollTimeout { run_id: String, elapsed_secs: u64 },
    /// Polling was cancelled before the run reached a terminal state.
    #[error("stopped waiting for run {run_id}: cancelled")]
    PollCancelled { run_id: String },
    /// Missing or invalid client configuration.
    #[error("config error: {0}")]
    Config(String),
}

impl SkyvernError {
    /// Classifies a `reqwest` failure, splitting deadline expiry from other transport errors.
    pub fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Transport(err)
        }
    }
}
