use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::workflow::node::WorkflowRunningStatus;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowStartedEvent {
    /// run id
    pub id: String,
    pub workflow_id: String,
    pub started_at: DateTime<Utc>,
}

/// Provisional output while an upstream task streams into a `content` End.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowUpdateEvent {
    pub id: String,
    /// cumulative text so far
    pub output: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowFinishedEvent {
    pub id: String,
    pub finished_at: DateTime<Utc>,
    pub status: WorkflowRunningStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ErrorEvent {
    pub error: String,
}
