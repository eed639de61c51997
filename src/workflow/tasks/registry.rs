use std::{collections::HashMap, fmt, sync::Arc};

use crate::{
    config::Config,
    model::NodeType,
    workflow::tasks::{EndTask, HttpTask, LlmTask, StartTask, Task},
};

/// Node type -> task lookup.
///
/// Built once, then shared read-only between engines through an `Arc`.
#[derive(Clone, Default)]
pub struct TaskRegistry {
    tasks: HashMap<NodeType, Arc<dyn Task>>,
}

impl fmt::Debug for TaskRegistry {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("TaskRegistry").field("tasks", &self.tasks.keys().collect::<Vec<_>>()).finish()
    }
}

impl TaskRegistry {
    pub fn builder() -> TaskRegistryBuilder {
        TaskRegistryBuilder::default()
    }

    /// The four built-in tasks, with the LLM adapter chosen by `config`.
    pub fn builtin(config: &Config) -> Self {
        Self::builder()
            .register(StartTask)
            .register(EndTask)
            .register(HttpTask::new(&config.http))
            .register(LlmTask::from_config(&config.llm))
            .build()
    }

    pub fn get(
        &self,
        node_type: NodeType,
    ) -> Option<Arc<dyn Task>> {
        self.tasks.get(&node_type).cloned()
    }

    pub fn contains(
        &self,
        node_type: NodeType,
    ) -> bool {
        self.tasks.contains_key(&node_type)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

#[derive(Default)]
pub struct TaskRegistryBuilder {
    tasks: HashMap<NodeType, Arc<dyn Task>>,
}

impl TaskRegistryBuilder {
    /// Register a task under its own [`Task::task_type`]. A later
    /// registration for the same type replaces the earlier one.
    pub fn register<T: Task + 'static>(
        self,
        task: T,
    ) -> Self {
        self.register_arc(Arc::new(task))
    }

    pub fn register_arc(
        mut self,
        task: Arc<dyn Task>,
    ) -> Self {
        self.tasks.insert(task.task_type(), task);
        self
    }

    pub fn build(self) -> TaskRegistry {
        TaskRegistry {
            tasks: self.tasks,
        }
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::{
        Result,
        common::{Shutdown, VariablePool, Vars},
        model::{NodeKind, NodeModel},
        runtime::Context,
        workflow::node::Node,
    };

    struct Tagged(&'static str);

    #[async_trait]
    impl Task for Tagged {
        fn task_type(&self) -> NodeType {
            NodeType::Http
        }

        async fn run(
            &self,
            _: &Node,
            _: &Context<'_>,
        ) -> Result<Vars> {
            let mut vars = Vars::new();
            vars.set("tag", self.0);
            Ok(vars)
        }
    }

    #[test]
    fn test_builtin_covers_every_node_type() {
        let registry = TaskRegistry::builtin(&Config::default());
        assert_eq!(registry.len(), 4);
        for node_type in [NodeType::Start, NodeType::End, NodeType::Llm, NodeType::Http] {
            assert!(registry.contains(node_type), "{} missing", node_type);
        }
    }

    #[test]
    fn test_empty_registry() {
        let registry = TaskRegistry::builder().build();
        assert!(registry.is_empty());
        assert!(registry.get(NodeType::Start).is_none());
    }

    #[tokio::test]
    async fn test_later_registration_wins() {
        let registry = TaskRegistry::builder().register(Tagged("first")).register(Tagged("second")).build();
        assert_eq!(registry.len(), 1);

        let pool = VariablePool::new();
        let (tx, _rx) = flume::unbounded();
        let ctx = Context::new("run", "h", &pool, tx, Shutdown::new());
        let node = NodeModel::new("h", NodeKind::http("http://x"));
        let task = registry.get(NodeType::Http).unwrap();
        let out = task.run(&node, &ctx).await.unwrap();
        assert_eq!(out.get::<String>("tag").as_deref(), Some("second"));
    }
}
