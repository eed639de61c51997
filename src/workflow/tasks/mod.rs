//! Executable behaviour behind each node type.

pub mod end;
pub mod http;
pub mod llm;
mod registry;
pub mod start;

use async_trait::async_trait;

use crate::{Result, common::Vars, model::NodeType, runtime::Context, workflow::node::Node};

pub use end::EndTask;
pub use http::HttpTask;
pub use llm::LlmTask;
pub use registry::{TaskRegistry, TaskRegistryBuilder};
pub use start::StartTask;

#[async_trait]
pub trait Task: Send + Sync {
    /// Returns the node type this task executes.
    fn task_type(&self) -> NodeType;

    /// Executes one node.
    ///
    /// # Arguments
    ///
    /// * `node` - The node being executed, payload included.
    /// * `ctx` - The [`Context`] of the run: pool view, partial-output sink and cancellation.
    ///
    /// # Returns
    ///
    /// Returns the node outputs. The engine merges them into the pool under
    /// both `nodeId.key` and `key`.
    async fn run(
        &self,
        node: &Node,
        ctx: &Context<'_>,
    ) -> Result<Vars>;
}
