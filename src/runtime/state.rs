//! Transient per-run bookkeeping.

use std::time::Instant;

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::{
    NodeflowError,
    common::{VariablePool, Vars},
    config::LimitsConfig,
    utils,
    workflow::node::NodeId,
};

/// State of one run. Lives exactly as long as one `run_workflow` call.
#[derive(Debug)]
pub struct RunState {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    started: Instant,
    /// node dispatches that completed successfully
    pub steps: u64,
    /// executed node ids, in order
    pub history: Vec<NodeId>,
    /// provisional, then final, workflow output
    pub output: Option<Value>,
    pub pool: VariablePool,
}

impl RunState {
    pub fn new(run_id: String) -> Self {
        Self {
            run_id,
            started_at: utils::time::now(),
            started: Instant::now(),
            steps: 0,
            history: Vec::new(),
            output: None,
            pool: VariablePool::new(),
        }
    }

    /// Fails once either ceiling has been reached.
    pub fn check_limits(
        &self,
        limits: &LimitsConfig,
    ) -> Result<(), NodeflowError> {
        if self.steps >= limits.max_steps {
            return Err(NodeflowError::LimitExceeded(format!("Execution limit reached: {} steps", limits.max_steps)));
        }
        let elapsed = self.started.elapsed();
        if elapsed >= limits.max_duration() {
            return Err(NodeflowError::LimitExceeded(format!("Execution limit reached: {} ms elapsed", elapsed.as_millis())));
        }
        Ok(())
    }

    /// Merge a node's outputs into the pool under `nodeId.key` and `key`,
    /// then count the step.
    ///
    /// A node id that names a flat non-map value cannot hold per-node keys;
    /// the outputs are then rejected as a whole and the pool is left as is.
    pub fn record(
        &mut self,
        node_id: &str,
        outputs: Vars,
    ) -> Result<(), NodeflowError> {
        if !outputs.is_empty() && self.pool.get(&[node_id]).is_some_and(|v| !v.is_object()) {
            return Err(NodeflowError::task(format!("cannot store outputs of node {}: '{}' already holds a value", node_id, node_id)));
        }
        for (key, value) in outputs {
            self.pool.set(&[node_id, key.as_str()], value.clone())?;
            self.pool.set(&[key.as_str()], value)?;
        }
        self.steps += 1;
        self.history.push(node_id.to_string());
        Ok(())
    }
}
