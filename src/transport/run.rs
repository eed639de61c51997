//! Observer-side view of a run, rebuilt from its event stream.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    events::WorkflowEvent,
    workflow::node::{NodeExecutionStatus, NodeId, WorkflowRunningStatus},
};

/// One node dispatch as seen by the observer.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NodeRun {
    pub id: NodeId,
    pub status: NodeExecutionStatus,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub inputs: Option<Value>,
    pub outputs: Option<Value>,
    pub error: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowRun {
    /// run id, empty until `workflowStarted` arrives
    pub id: String,
    pub workflow_id: String,
    pub status: WorkflowRunningStatus,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    /// provisional while streaming, final once finished
    pub output: Option<Value>,
    pub error: Option<String>,
    /// dispatches in order; a node visited twice appears twice
    pub nodes: Vec<NodeRun>,
}

impl WorkflowRun {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_events<'a>(events: impl IntoIterator<Item = &'a WorkflowEvent>) -> Self {
        let mut run = Self::new();
        events.into_iter().for_each(|event| run.apply(event));
        run
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.status, WorkflowRunningStatus::Succeeded | WorkflowRunningStatus::Failed | WorkflowRunningStatus::Stopped)
    }

    /// Fold one event into the record.
    pub fn apply(
        &mut self,
        event: &WorkflowEvent,
    ) {
        match event {
            WorkflowEvent::WorkflowStarted(e) => {
                *self = Self {
                    id: e.id.clone(),
                    workflow_id: e.workflow_id.clone(),
                    status: WorkflowRunningStatus::Running,
                    started_at: Some(e.started_at),
                    ..Default::default()
                };
            }
            WorkflowEvent::WorkflowUpdate(e) => {
                self.output = Some(Value::String(e.output.clone()));
            }
            WorkflowEvent::WorkflowFinished(e) => {
                self.status = e.status;
                self.finished_at = Some(e.finished_at);
                if e.output.is_some() {
                    self.output = e.output.clone();
                }
                self.error = e.error.clone();
            }
            WorkflowEvent::NodeStarted(e) => {
                self.nodes.push(NodeRun {
                    id: e.id.clone(),
                    status: NodeExecutionStatus::Running,
                    started_at: Some(e.started_at),
                    inputs: Some(e.inputs.clone()),
                    ..Default::default()
                });
            }
            WorkflowEvent::NodeFinished(e) => {
                // the latest dispatch of that node is the one finishing
                if let Some(node) = self.nodes.iter_mut().rev().find(|n| n.id == e.id) {
                    node.status = e.status;
                    node.finished_at = Some(e.finished_at);
                    node.outputs = e.outputs.clone();
                    node.error = e.error.clone();
                }
            }
            WorkflowEvent::Error(e) => {
                self.status = WorkflowRunningStatus::Failed;
                self.error = Some(e.error.clone());
            }
        }
    }
}
