//! Workflow engine - the main entry point for Nodeflow.
//!
//! One engine walks one graph at a time, strictly node by node:
//! - Locating the Start node and following first outgoing edges
//! - Dispatching each node to the task registered for its type
//! - Enforcing the step and wall-clock ceilings
//! - Merging streamed partial output into a provisional result
//! - Publishing the lifecycle events of the run

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::{
    NodeflowError, Result,
    common::{Queue, Shutdown},
    config::LimitsConfig,
    events::{EventKind, NodeFinishedEvent, NodeStartedEvent, WorkflowEvent, WorkflowFinishedEvent, WorkflowStartedEvent, WorkflowUpdateEvent},
    runtime::{Channel, Context, HandlerId, PartialOutput, RunState},
    utils,
    workflow::{
        Workflow, merge,
        node::{Node, NodeExecutionStatus, WorkflowRunningStatus},
        tasks::TaskRegistry,
    },
};

/// The workflow engine.
///
/// The registry is shared read-only, everything else belongs to this engine.
/// Subscribe with [`Engine::on`] before calling [`Engine::run_workflow`];
/// the event stream is the only way a run reports its result.
///
/// # Example
///
/// ```rust,ignore
/// let engine = EngineBuilder::new().config(config).build()?;
/// engine.on(EventKind::WorkflowFinished, |event| println!("{:?}", event));
///
/// let workflow = Workflow::from_json(json_str)?;
/// engine.run_workflow(&workflow).await;
/// ```
pub struct Engine {
    /// Node type -> task lookup, shared between engines.
    registry: Arc<TaskRegistry>,
    /// Step and time ceilings applied to every run.
    limits: LimitsConfig,
    /// Event channel for broadcasting run events.
    channel: Arc<Channel>,
    /// Cancellation signal, checked before each node and raced against tasks.
    shutdown: Shutdown,
}

impl Engine {
    pub fn new(
        registry: Arc<TaskRegistry>,
        limits: LimitsConfig,
    ) -> Self {
        Self {
            registry,
            limits,
            channel: Arc::new(Channel::new()),
            shutdown: Shutdown::new(),
        }
    }

    pub fn limits(&self) -> &LimitsConfig {
        &self.limits
    }

    pub fn registry(&self) -> &Arc<TaskRegistry> {
        &self.registry
    }

    pub fn channel(&self) -> &Arc<Channel> {
        &self.channel
    }

    /// Subscribe to one kind of event.
    pub fn on(
        &self,
        kind: EventKind,
        f: impl Fn(&WorkflowEvent) + Send + Sync + 'static,
    ) -> HandlerId {
        self.channel.on(kind, f)
    }

    /// Subscribe to every event.
    pub fn on_any(
        &self,
        f: impl Fn(&WorkflowEvent) + Send + Sync + 'static,
    ) -> HandlerId {
        self.channel.on_any(f)
    }

    pub fn off(
        &self,
        id: HandlerId,
    ) -> bool {
        self.channel.off(id)
    }

    /// Cancel the current run, and every later one. The in-flight task is
    /// dropped and the run finishes `failed` with "run cancelled".
    pub fn cancel(&self) {
        self.shutdown.shutdown();
    }

    pub fn is_cancelled(&self) -> bool {
        self.shutdown.is_terminated()
    }

    /// A handle that cancels this engine from elsewhere, e.g. an event handler.
    pub fn shutdown_signal(&self) -> Shutdown {
        self.shutdown.clone()
    }

    /// Run `workflow` to completion.
    ///
    /// `workflowStarted` is always published first and `workflowFinished`
    /// always last, exactly once, whatever ended the run.
    pub async fn run_workflow(
        &self,
        workflow: &Workflow,
    ) {
        let mut state = RunState::new(utils::longid());
        info!(run = %state.run_id, workflow = %workflow.id(), "workflow run started");

        self.publish(WorkflowEvent::WorkflowStarted(WorkflowStartedEvent {
            id: state.run_id.clone(),
            workflow_id: workflow.id().to_string(),
            started_at: state.started_at,
        }));

        let result = self.run_internal(workflow, &mut state).await;

        let event = match result {
            Ok(()) => {
                info!(run = %state.run_id, steps = state.steps, "workflow run succeeded");
                WorkflowFinishedEvent {
                    id: state.run_id.clone(),
                    finished_at: utils::time::now(),
                    status: WorkflowRunningStatus::Succeeded,
                    output: state.output.take(),
                    error: None,
                }
            }
            Err(err) => {
                warn!(run = %state.run_id, steps = state.steps, error = %err, "workflow run failed");
                WorkflowFinishedEvent {
                    id: state.run_id.clone(),
                    finished_at: utils::time::now(),
                    status: WorkflowRunningStatus::Failed,
                    output: None,
                    error: Some(err.to_string()),
                }
            }
        };
        self.publish(WorkflowEvent::WorkflowFinished(event));
    }

    async fn run_internal(
        &self,
        workflow: &Workflow,
        state: &mut RunState,
    ) -> Result<()> {
        let mut current = workflow.start_node().ok_or(NodeflowError::Structural("Start Node not found".to_string()))?;
        let partials = Queue::<PartialOutput>::unbounded();

        loop {
            if self.shutdown.is_terminated() {
                return Err(NodeflowError::Cancelled);
            }
            state.check_limits(&self.limits)?;

            self.run_node(workflow, current, state, &partials).await?;

            if let Some(key) = current.end_output() {
                state.output = state.pool.get(&[key]).cloned();
                return Ok(());
            }

            match workflow.next_node(&current.id) {
                Some(next) => current = next,
                None => return finish_at_dead_end(current, state),
            }
        }
    }

    /// Run one node and fold its outputs into the pool. Any failure is
    /// reported on the node and then ends the run.
    async fn run_node(
        &self,
        workflow: &Workflow,
        node: &Node,
        state: &mut RunState,
        partials: &Queue<PartialOutput>,
    ) -> Result<()> {
        debug!(run = %state.run_id, node = %node.id, node_type = %node.node_type(), "node started");
        self.publish(WorkflowEvent::NodeStarted(NodeStartedEvent {
            id: node.id.clone(),
            started_at: utils::time::now(),
            inputs: state.pool.get_all(),
        }));

        let result = match self.registry.get(node.node_type()) {
            Some(task) => {
                let ctx = Context::new(&state.run_id, &node.id, &state.pool, partials.sender(), self.shutdown.clone());
                let mut run = task.run(node, &ctx);
                loop {
                    tokio::select! {
                        biased;
                        _ = self.shutdown.wait() => break Err(NodeflowError::Cancelled),
                        Some(partial) = partials.next_async() => self.merge_partial(workflow, &state.run_id, &mut state.output, partial),
                        res = &mut run => break res,
                    }
                }
            }
            None => Err(NodeflowError::task(format!("No task found for node type: {}", node.node_type()))),
        };

        // partials still queued when the task resolved come before nodeFinished;
        // a cancelled run publishes no further progress
        let cancelled = matches!(result, Err(NodeflowError::Cancelled));
        while let Some(partial) = partials.try_next() {
            if !cancelled {
                self.merge_partial(workflow, &state.run_id, &mut state.output, partial);
            }
        }

        match result.and_then(|outputs| state.record(&node.id, outputs)) {
            Ok(()) => {
                debug!(run = %state.run_id, node = %node.id, "node succeeded");
                self.publish(WorkflowEvent::NodeFinished(NodeFinishedEvent {
                    id: node.id.clone(),
                    finished_at: utils::time::now(),
                    status: NodeExecutionStatus::Succeeded,
                    outputs: Some(state.pool.get_all()),
                    error: None,
                }));
                Ok(())
            }
            Err(err) => {
                warn!(run = %state.run_id, node = %node.id, error = %err, "node failed");
                self.publish(WorkflowEvent::NodeFinished(NodeFinishedEvent {
                    id: node.id.clone(),
                    finished_at: utils::time::now(),
                    status: NodeExecutionStatus::Failed,
                    outputs: None,
                    error: Some(err.to_string()),
                }));
                Err(err)
            }
        }
    }

    fn merge_partial(
        &self,
        workflow: &Workflow,
        run_id: &str,
        output: &mut Option<Value>,
        partial: PartialOutput,
    ) {
        if let Some(text) = merge::provisional_output(workflow, &partial.node_id, &partial.output) {
            *output = Some(Value::String(text.clone()));
            self.publish(WorkflowEvent::WorkflowUpdate(WorkflowUpdateEvent {
                id: run_id.to_string(),
                output: text,
            }));
        }
    }

    fn publish(
        &self,
        event: WorkflowEvent,
    ) {
        self.channel.publish(&event);
    }
}

/// A non-End node without an outgoing edge ends the run successfully. The
/// output is whatever the streaming merge left behind, usually nothing.
fn finish_at_dead_end(
    node: &Node,
    state: &RunState,
) -> Result<()> {
    warn!(run = %state.run_id, node = %node.id, "run ended on a node with no outgoing edge before reaching an end node");
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::{Mutex, OnceLock};

    use async_trait::async_trait;
    use serde_json::json;

    use super::*;
    use crate::{
        WorkflowModel,
        common::Vars,
        model::{EdgeModel, NodeKind, NodeModel, NodeType},
        workflow::tasks::{EndTask, StartTask, Task},
    };

    /// Stands in for the http task: returns a fixed body and streams it first.
    struct Echo(&'static str);

    #[async_trait]
    impl Task for Echo {
        fn task_type(&self) -> NodeType {
            NodeType::Http
        }

        async fn run(
            &self,
            _: &Node,
            ctx: &Context<'_>,
        ) -> Result<Vars> {
            ctx.emit_partial(self.0);
            let mut vars = Vars::new();
            vars.set("content", self.0);
            Ok(vars)
        }
    }

    /// Streams once, then cancels the run and never resolves.
    struct EmitThenCancel(Arc<OnceLock<Shutdown>>);

    #[async_trait]
    impl Task for EmitThenCancel {
        fn task_type(&self) -> NodeType {
            NodeType::Http
        }

        async fn run(
            &self,
            _: &Node,
            ctx: &Context<'_>,
        ) -> Result<Vars> {
            ctx.emit_partial("late");
            if let Some(shutdown) = self.0.get() {
                shutdown.shutdown();
            }
            std::future::pending::<Result<Vars>>().await
        }
    }

    fn engine(limits: LimitsConfig) -> Engine {
        let registry = TaskRegistry::builder().register(StartTask).register(EndTask).register(Echo("hi")).build();
        Engine::new(Arc::new(registry), limits)
    }

    fn workflow(
        nodes: Vec<NodeModel>,
        edges: Vec<EdgeModel>,
    ) -> Workflow {
        Workflow::try_from(WorkflowModel {
            id: "wf".to_string(),
            nodes,
            edges,
            ..Default::default()
        })
        .unwrap()
    }

    fn record(engine: &Engine) -> Arc<Mutex<Vec<WorkflowEvent>>> {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        engine.on_any(move |e| sink.lock().unwrap().push(e.clone()));
        events
    }

    fn finished(events: &[WorkflowEvent]) -> &WorkflowFinishedEvent {
        match events.last() {
            Some(WorkflowEvent::WorkflowFinished(e)) => e,
            other => panic!("last event is not workflowFinished: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_linear_run() {
        let engine = engine(LimitsConfig::default());
        let events = record(&engine);
        let wf = workflow(
            vec![NodeModel::new("s", NodeKind::start()), NodeModel::new("h", NodeKind::http("http://x")), NodeModel::new("e", NodeKind::end("content"))],
            vec![EdgeModel::new("s", "h"), EdgeModel::new("h", "e")],
        );

        engine.run_workflow(&wf).await;

        let events = events.lock().unwrap();
        let kinds: Vec<EventKind> = events.iter().map(|e| e.kind()).collect();
        assert_eq!(
            kinds,
            vec![
                EventKind::WorkflowStarted,
                EventKind::NodeStarted,
                EventKind::NodeFinished,
                EventKind::NodeStarted,
                EventKind::WorkflowUpdate,
                EventKind::NodeFinished,
                EventKind::NodeStarted,
                EventKind::NodeFinished,
                EventKind::WorkflowFinished,
            ]
        );
        let done = finished(&events);
        assert_eq!(done.status, WorkflowRunningStatus::Succeeded);
        assert_eq!(done.output, Some(json!("hi")));
    }

    #[tokio::test]
    async fn test_node_started_carries_pool_snapshot() {
        let engine = engine(LimitsConfig::default());
        let events = record(&engine);
        let wf = workflow(
            vec![NodeModel::new("s", NodeKind::start()), NodeModel::new("h", NodeKind::http("http://x")), NodeModel::new("e", NodeKind::end("content"))],
            vec![EdgeModel::new("s", "h"), EdgeModel::new("h", "e")],
        );

        engine.run_workflow(&wf).await;

        let events = events.lock().unwrap();
        let inputs: Vec<&Value> = events
            .iter()
            .filter_map(|e| match e {
                WorkflowEvent::NodeStarted(n) => Some(&n.inputs),
                _ => None,
            })
            .collect();
        assert_eq!(inputs[0], &json!({}));
        assert_eq!(inputs[2], &json!({"h": {"content": "hi"}, "content": "hi"}));
    }

    #[tokio::test]
    async fn test_dead_end_succeeds_with_provisional_output() {
        let engine = engine(LimitsConfig::default());
        let events = record(&engine);
        let wf = workflow(vec![NodeModel::new("s", NodeKind::start()), NodeModel::new("h", NodeKind::http("http://x"))], vec![EdgeModel::new("s", "h")]);

        engine.run_workflow(&wf).await;

        let events = events.lock().unwrap();
        let done = finished(&events);
        assert_eq!(done.status, WorkflowRunningStatus::Succeeded);
        assert_eq!(done.output, None);
    }

    #[tokio::test]
    async fn test_step_ceiling() {
        let engine = engine(LimitsConfig {
            max_steps: 5,
            ..Default::default()
        });
        let events = record(&engine);
        let wf = workflow(
            vec![NodeModel::new("s", NodeKind::start()), NodeModel::new("a", NodeKind::http("http://a")), NodeModel::new("b", NodeKind::http("http://b"))],
            vec![EdgeModel::new("s", "a"), EdgeModel::new("a", "b"), EdgeModel::new("b", "a")],
        );

        engine.run_workflow(&wf).await;

        let events = events.lock().unwrap();
        let dispatched = events.iter().filter(|e| e.kind() == EventKind::NodeStarted).count();
        assert_eq!(dispatched, 5);
        let done = finished(&events);
        assert_eq!(done.status, WorkflowRunningStatus::Failed);
        assert_eq!(done.error.as_deref(), Some("Execution limit reached: 5 steps"));
    }

    #[tokio::test]
    async fn test_missing_task_fails_node() {
        let registry = TaskRegistry::builder().register(StartTask).build();
        let engine = Engine::new(Arc::new(registry), LimitsConfig::default());
        let events = record(&engine);
        let wf = workflow(vec![NodeModel::new("s", NodeKind::start()), NodeModel::new("e", NodeKind::end("content"))], vec![EdgeModel::new("s", "e")]);

        engine.run_workflow(&wf).await;

        let events = events.lock().unwrap();
        let failed = events.iter().find_map(|e| match e {
            WorkflowEvent::NodeFinished(n) if n.status == NodeExecutionStatus::Failed => Some(n),
            _ => None,
        });
        assert_eq!(failed.unwrap().error.as_deref(), Some("No task found for node type: end"));
        assert_eq!(finished(&events).status, WorkflowRunningStatus::Failed);
    }

    #[tokio::test]
    async fn test_cancelled_engine_dispatches_nothing() {
        let engine = engine(LimitsConfig::default());
        let events = record(&engine);
        engine.cancel();
        let wf = workflow(vec![NodeModel::new("s", NodeKind::start()), NodeModel::new("e", NodeKind::end("content"))], vec![EdgeModel::new("s", "e")]);

        engine.run_workflow(&wf).await;

        let events = events.lock().unwrap();
        assert_eq!(events.len(), 2);
        let done = finished(&events);
        assert_eq!(done.status, WorkflowRunningStatus::Failed);
        assert_eq!(done.error.as_deref(), Some("run cancelled"));
    }

    #[tokio::test]
    async fn test_node_id_shadowed_by_flat_output_fails_node() {
        let engine = engine(LimitsConfig::default());
        let events = record(&engine);
        let wf = workflow(
            vec![NodeModel::new("s", NodeKind::start()), NodeModel::new("h", NodeKind::http("http://x")), NodeModel::new("content", NodeKind::http("http://y"))],
            vec![EdgeModel::new("s", "h"), EdgeModel::new("h", "content")],
        );

        engine.run_workflow(&wf).await;

        let events = events.lock().unwrap();
        let failed = events
            .iter()
            .find_map(|e| match e {
                WorkflowEvent::NodeFinished(n) if n.status == NodeExecutionStatus::Failed => Some(n),
                _ => None,
            })
            .unwrap();
        assert_eq!(failed.id, "content");
        assert!(failed.outputs.is_none());
        assert!(failed.error.as_deref().unwrap().contains("content"));

        let done = finished(&events);
        assert_eq!(done.status, WorkflowRunningStatus::Failed);
        assert_eq!(done.error, failed.error);
    }

    #[tokio::test]
    async fn test_partials_queued_at_cancel_are_dropped() {
        let signal = Arc::new(OnceLock::new());
        let registry = TaskRegistry::builder().register(StartTask).register(EndTask).register(EmitThenCancel(signal.clone())).build();
        let engine = Engine::new(Arc::new(registry), LimitsConfig::default());
        signal.set(engine.shutdown_signal()).unwrap();
        let events = record(&engine);
        let wf = workflow(
            vec![NodeModel::new("s", NodeKind::start()), NodeModel::new("h", NodeKind::http("http://x")), NodeModel::new("e", NodeKind::end("content"))],
            vec![EdgeModel::new("s", "h"), EdgeModel::new("h", "e")],
        );

        engine.run_workflow(&wf).await;

        let events = events.lock().unwrap();
        assert!(events.iter().all(|e| e.kind() != EventKind::WorkflowUpdate));
        let done = finished(&events);
        assert_eq!(done.status, WorkflowRunningStatus::Failed);
        assert_eq!(done.error.as_deref(), Some("run cancelled"));
        assert_eq!(done.output, None);
    }
}
