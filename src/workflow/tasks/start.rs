use async_trait::async_trait;

use crate::{
    Result,
    common::Vars,
    model::NodeType,
    runtime::Context,
    workflow::{node::Node, tasks::Task},
};

/// Entry point of every run. Produces nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct StartTask;

#[async_trait]
impl Task for StartTask {
    fn task_type(&self) -> NodeType {
        NodeType::Start
    }

    async fn run(
        &self,
        _: &Node,
        _: &Context<'_>,
    ) -> Result<Vars> {
        Ok(Vars::new())
    }
}
