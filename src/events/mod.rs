//! Event types for workflow execution.
//!
//! Events are published by the engine in a strict order and serialised
//! as `{type, data}` records for the transport.

mod node;
mod workflow;

pub use node::*;
pub use workflow::*;

use serde::{Deserialize, Serialize};

/// Lifecycle event of a single run.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum WorkflowEvent {
    WorkflowStarted(WorkflowStartedEvent),
    NodeStarted(NodeStartedEvent),
    NodeFinished(NodeFinishedEvent),
    WorkflowUpdate(WorkflowUpdateEvent),
    WorkflowFinished(WorkflowFinishedEvent),
    /// Terminal record used in place of `workflowFinished` when a run dies
    /// outside the normal failure path.
    Error(ErrorEvent),
}

/// Discriminant of [`WorkflowEvent`], used to subscribe to one kind.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, strum::AsRefStr, strum::EnumString)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum EventKind {
    WorkflowStarted,
    NodeStarted,
    NodeFinished,
    WorkflowUpdate,
    WorkflowFinished,
    Error,
}

impl WorkflowEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            WorkflowEvent::WorkflowStarted(_) => EventKind::WorkflowStarted,
            WorkflowEvent::NodeStarted(_) => EventKind::NodeStarted,
            WorkflowEvent::NodeFinished(_) => EventKind::NodeFinished,
            WorkflowEvent::WorkflowUpdate(_) => EventKind::WorkflowUpdate,
            WorkflowEvent::WorkflowFinished(_) => EventKind::WorkflowFinished,
            WorkflowEvent::Error(_) => EventKind::Error,
        }
    }

    /// Whether this event closes the stream.
    pub fn is_terminal(&self) -> bool {
        matches!(self, WorkflowEvent::WorkflowFinished(_) | WorkflowEvent::Error(_))
    }
}
