use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Lifecycle state of a task or workflow run as reported by the server.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Created,
    Queued,
    Running,
    Paused,
    Completed,
    Failed,
    Terminated,
    TimedOut,
    Canceled,
}

impl RunState {
    /// Terminal states never transition again.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Completed | Self::Failed | Self::Terminated | Self::TimedOut | Self::Canceled
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Queued => "queued",
            Self::Running => "running",
            Self::Paused => "paused",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Terminated => "terminated",
            Self::TimedOut => "timed_out",
            Self::Canceled => "canceled",
        }
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of a run returned by `GET /v1/runs/{run_id}` and the run endpoints.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RunStatus {
    pub run_id: String,
    pub status: RunState,
    #[serde(default)]
    pub run_type: Option<String>,
    #[serde(default)]
    pub output: Option<JsonValue>,
    #[serde(default)]
    pub failure_reason: Option<String>,
    #[serde(default)]
    pub app_url: Option<String>,
    #[serde(default)]
    pub recording_url: Option<String>,
    #[serde(default)]
    pub screenshot_urls: Option<Vec<String>>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub modified_at: Option<String>,
    #[serde(default)]
    pub queued_at: Option<String>,
    #[serde(default)]
    pub started_at: Option<String>,
    #[serde(default)]
    pub finished_at: Option<String>,
}

impl RunStatus {
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

/// Body of `POST /v1/run/tasks`.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct RunTaskRequest {
    pub prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub engine: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proxy_location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_extraction_schema: Option<JsonValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code_mapping: Option<JsonValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_steps: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub webhook_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub totp_identifier: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub browser_session_id: Option<String>,
}

impl RunTaskRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Self::default()
        }
    }

    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn max_steps(mut self, max_steps: u32) -> Self {
        self.max_steps = Some(max_steps);
        self
    }

    pub fn data_extraction_schema(mut self, schema: JsonValue) -> Self {
        self.data_extraction_schema = Some(schema);
        self
    }
}

/// Body of `POST /v1/run/workflows`.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct RunWorkflowRequest {
    pub workflow_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<JsonValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proxy_location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub webhook_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub totp_identifier: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub browser_session_id: Option<String>,
}

impl RunWorkflowRequest {
    pub fn new(workflow_id: impl Into<String>) -> Self {
        Self {
            workflow_id: workflow_id.into(),
            ..Self::default()
        }
    }

    pub fn parameters(mut self, parameters: JsonValue) -> Self {
        self.parameters = Some(parameters);
        self
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{RunState, RunStatus, RunTaskRequest};

    #[test]
    fn terminal_states() {
        use RunState::*;
        for state in [Created, Queued, Running, Paused] {
            assert!(!state.is_terminal(), "{state}");
        }
        for state in [Completed, Failed, Terminated, TimedOut, Canceled] {
            assert!(state.is_terminal(), "{state}");
        }
    }

    #[test]
    fn decodes_minimal_run_status() {
        let status: RunStatus =
            serde_json::from_value(json!({"run_id": "tsk_1", "status": "timed_out"})).unwrap();
        assert_eq!(status.status, RunState::TimedOut);
        assert!(status.is_terminal());
        assert_eq!(status.output, None);
    }

    #[test]
    fn rejects_unknown_state() {
        let result =
            serde_json::from_value::<RunStatus>(json!({"run_id": "tsk_1", "status": "exploded"}));
        assert!(result.is_err());
    }

    #[test]
    fn task_request_skips_unset_fields() {
        let body = serde_json::to_value(RunTaskRequest::new("find the price").max_steps(5)).unwrap();
        assert_eq!(body, json!({"prompt": "find the price", "max_steps": 5}));
    }
}
