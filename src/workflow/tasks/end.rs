use async_trait::async_trait;

use crate::{
    Result,
    common::Vars,
    model::NodeType,
    runtime::Context,
    workflow::{node::Node, tasks::Task},
};

/// Terminal node. The engine reads the result key itself once this task
/// has resolved.
#[derive(Debug, Clone, Copy, Default)]
pub struct EndTask;

#[async_trait]
impl Task for EndTask {
    fn task_type(&self) -> NodeType {
        NodeType::End
    }

    async fn run(
        &self,
        _: &Node,
        _: &Context<'_>,
    ) -> Result<Vars> {
        Ok(Vars::new())
    }
}
