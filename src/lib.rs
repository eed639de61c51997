//! # Nodeflow
//!
//! Nodeflow runs small automation pipelines: a directed graph of typed
//! steps (start, HTTP GET, streaming LLM call, end) executed node by node
//! over a shared variable pool, reporting progress as a stream of
//! lifecycle events.
//!
//! ## Core Features
//!
//! - **Sequential Execution**: exactly one node in flight, first outgoing edge followed
//! - **Streaming Merge**: LLM deltas surface as provisional `workflowUpdate` output
//! - **Execution Limits**: step and wall-clock ceilings bound every run, cycles included
//! - **Cancellation**: a dropped consumer or [`Engine::cancel`] stops in-flight network calls
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use nodeflow::{EngineBuilder, EventKind, Workflow};
//!
//! let engine = EngineBuilder::new().build()?;
//! engine.on(EventKind::WorkflowFinished, |event| println!("{:?}", event));
//!
//! let workflow = Workflow::from_json(json_str)?;
//! engine.run_workflow(&workflow).await;
//! ```

mod builder;
mod common;
mod config;
mod engine;
mod error;
mod events;
mod model;
mod runtime;
pub mod transport;
mod utils;
mod workflow;

pub use builder::EngineBuilder;
pub use common::{Shutdown, VariablePool, Vars};
pub use config::{Config, HttpConfig, LimitsConfig, LlmAdapter, LlmConfig};
pub use engine::Engine;
pub use error::NodeflowError;
pub use events::*;
pub use model::*;
pub use runtime::{Channel, Context, HandlerId, PartialOutput};
pub use workflow::{
    NodeIssue, Workflow,
    node::{NodeExecutionStatus, NodeId, WorkflowRunningStatus},
    tasks::{
        EndTask, HttpTask, StartTask, Task, TaskRegistry, TaskRegistryBuilder,
        llm::{DeltaStream, GeminiClient, LlmClient, LlmTask, OpenAiClient, ProxyClient},
    },
};

/// Result type alias for Nodeflow operations.
pub type Result<T> = std::result::Result<T, NodeflowError>;
