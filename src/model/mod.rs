mod edge;
mod node;
mod workflow;

pub use edge::EdgeModel;
pub use node::{DEFAULT_END_OUTPUT, EndParams, HttpParams, LlmParams, NodeData, NodeKind, NodeModel, NodeType, StartParams};
pub use workflow::{Viewport, WorkflowModel};
