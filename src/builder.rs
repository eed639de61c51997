use std::sync::{Arc, OnceLock};

use crate::{Config, Engine, NodeflowError, Result, workflow::tasks::TaskRegistry};

/// Assembles engines that share one task registry.
///
/// Keep a single builder (or a single registry) for the whole process and
/// call [`EngineBuilder::build`] once per run: the registry, with its HTTP
/// clients, is created on the first build and reused by every later one.
#[derive(Default)]
pub struct EngineBuilder {
    config: Config,
    registry: OnceLock<Arc<TaskRegistry>>,
}

impl EngineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(
        mut self,
        config: Config,
    ) -> Self {
        self.config = config;
        self
    }

    /// Share an already built registry instead of building the built-in one
    /// from the config. Build it once at startup and hand the same `Arc` to
    /// every builder.
    pub fn registry(
        mut self,
        registry: Arc<TaskRegistry>,
    ) -> Self {
        self.registry = OnceLock::from(registry);
        self
    }

    pub fn build(&self) -> Result<Engine> {
        if self.config.limits.max_steps == 0 {
            return Err(NodeflowError::Config("limits.max_steps must be greater than 0".to_string()));
        }
        if self.config.limits.max_duration_ms == 0 {
            return Err(NodeflowError::Config("limits.max_duration_ms must be greater than 0".to_string()));
        }

        let registry = self.registry.get_or_init(|| Arc::new(TaskRegistry::builtin(&self.config))).clone();
        let engine = Engine::new(registry, self.config.limits);

        Ok(engine)
    }
}
