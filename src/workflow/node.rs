use serde::{Deserialize, Serialize};

pub use crate::model::NodeModel as Node;

/// node id
pub type NodeId = String;

/// Outcome of a single node execution.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq, strum::AsRefStr, strum::EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum NodeExecutionStatus {
    #[default]
    Pending,
    Running,
    Succeeded,
    Failed,
}

/// Status of a whole run.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq, strum::AsRefStr, strum::EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum WorkflowRunningStatus {
    #[default]
    Waiting,
    Running,
    Succeeded,
    Failed,
    Stopped,
}
