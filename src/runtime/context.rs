use crate::{
    common::{Shutdown, VariablePool},
    workflow::node::NodeId,
};

/// Incremental output of a streaming task: the cumulative text so far.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartialOutput {
    pub node_id: NodeId,
    pub output: String,
}

/// Everything a task may touch while it runs.
///
/// The pool is read-only here; the engine merges task outputs after the
/// task resolves.
pub struct Context<'a> {
    run_id: &'a str,
    node_id: &'a str,
    pool: &'a VariablePool,
    partial: flume::Sender<PartialOutput>,
    shutdown: Shutdown,
}

impl<'a> Context<'a> {
    pub fn new(
        run_id: &'a str,
        node_id: &'a str,
        pool: &'a VariablePool,
        partial: flume::Sender<PartialOutput>,
        shutdown: Shutdown,
    ) -> Self {
        Self {
            run_id,
            node_id,
            pool,
            partial,
            shutdown,
        }
    }

    pub fn run_id(&self) -> &str {
        self.run_id
    }

    pub fn node_id(&self) -> &str {
        self.node_id
    }

    pub fn pool(&self) -> &VariablePool {
        self.pool
    }

    /// Report the cumulative output produced so far.
    pub fn emit_partial(
        &self,
        cumulative: &str,
    ) {
        // the engine only drops the receiver once the task has resolved
        let _ = self.partial.send(PartialOutput {
            node_id: self.node_id.to_string(),
            output: cumulative.to_string(),
        });
    }

    pub fn is_cancelled(&self) -> bool {
        self.shutdown.is_terminated()
    }

    /// Resolves when the run is cancelled.
    pub fn cancelled(&self) -> impl Future<Output = ()> + Send + 'static {
        self.shutdown.wait()
    }
}
