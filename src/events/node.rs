use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::workflow::node::{NodeExecutionStatus, NodeId};

/// A node is about to run. `inputs` is the whole pool at that moment.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NodeStartedEvent {
    pub id: NodeId,
    pub started_at: DateTime<Utc>,
    pub inputs: Value,
}

/// A node finished, successfully or not.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NodeFinishedEvent {
    pub id: NodeId,
    pub finished_at: DateTime<Utc>,
    pub status: NodeExecutionStatus,
    /// whole pool after the node's outputs were merged
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outputs: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
