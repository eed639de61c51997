//! LLM node: stream a completion and report the cumulative text as it grows.
//!
//! The provider side is hidden behind [`LlmClient`]. Two adapters exist and
//! exactly one is picked per process from [`LlmConfig::adapter`]:
//!
//! * direct: each model id talks to its provider's streaming API
//! * proxy: every model id is forwarded to a local relay at `{proxy_url}/proxy/{model}`

pub mod gemini;
pub mod openai;
pub mod proxy;
pub mod sse;

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use futures::stream::{BoxStream, StreamExt};
use tracing::debug;

use crate::{
    NodeflowError, Result,
    common::Vars,
    config::{LlmAdapter, LlmConfig},
    model::{NodeKind, NodeType},
    runtime::Context,
    workflow::{node::Node, tasks::Task, template},
};

pub use gemini::GeminiClient;
pub use openai::OpenAiClient;
pub use proxy::ProxyClient;

pub const MODEL_GROQ: &str = "groq";
pub const MODEL_OPENAI: &str = "openai";
pub const MODEL_GEMINI: &str = "gemini";

const CONTENT_KEY: &str = "content";

/// Text deltas of one completion, in arrival order.
pub type DeltaStream = BoxStream<'static, Result<String>>;

#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Start a completion for `prompt` and return its deltas.
    async fn stream(
        &self,
        api_key: &str,
        prompt: &str,
    ) -> Result<DeltaStream>;
}

pub struct LlmTask {
    /// model id -> client
    clients: HashMap<String, Arc<dyn LlmClient>>,
}

impl LlmTask {
    /// A task with no models at all. Add some with [`LlmTask::with_client`].
    pub fn new() -> Self {
        Self {
            clients: HashMap::new(),
        }
    }

    pub fn with_client(
        mut self,
        model: impl Into<String>,
        client: Arc<dyn LlmClient>,
    ) -> Self {
        self.clients.insert(model.into(), client);
        self
    }

    pub fn from_config(config: &LlmConfig) -> Self {
        match config.adapter {
            LlmAdapter::Direct => Self::direct(config),
            LlmAdapter::Proxy => Self::proxy(config),
        }
    }

    /// Talk to the providers directly.
    pub fn direct(config: &LlmConfig) -> Self {
        let http = reqwest::Client::new();
        Self::new()
            .with_client(MODEL_GROQ, Arc::new(OpenAiClient::groq(http.clone(), config.groq_url.as_deref())))
            .with_client(MODEL_OPENAI, Arc::new(OpenAiClient::openai(http.clone(), config.openai_url.as_deref())))
            .with_client(MODEL_GEMINI, Arc::new(GeminiClient::new(http, config.gemini_url.as_deref())))
    }

    /// Relay every model through the local proxy.
    pub fn proxy(config: &LlmConfig) -> Self {
        let http = reqwest::Client::new();
        [MODEL_GROQ, MODEL_OPENAI, MODEL_GEMINI].into_iter().fold(Self::new(), |task, model| {
            let client = ProxyClient::new(http.clone(), &config.proxy_url, model);
            task.with_client(model, Arc::new(client))
        })
    }

    pub fn models(&self) -> impl Iterator<Item = &str> {
        self.clients.keys().map(String::as_str)
    }

    /// Interpolated `(model, api_key, prompt)`, all non-empty.
    fn params(
        node: &Node,
        ctx: &Context<'_>,
    ) -> Result<(String, String, String)> {
        let params = match &node.data.kind {
            NodeKind::Llm(params) => params,
            _ => return Err(NodeflowError::task(format!("node {} is not an llm node", node.id))),
        };
        let resolve = |field: &Option<String>| template::resolve_template(ctx.pool(), field.as_deref().unwrap_or_default());

        let model = resolve(&params.model);
        let api_key = resolve(&params.api_key);
        let prompt = resolve(&params.prompt);
        if model.is_empty() || api_key.is_empty() || prompt.is_empty() {
            return Err(NodeflowError::task("parameters missing"));
        }
        Ok((model, api_key, prompt))
    }
}

impl Default for LlmTask {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Task for LlmTask {
    fn task_type(&self) -> NodeType {
        NodeType::Llm
    }

    async fn run(
        &self,
        node: &Node,
        ctx: &Context<'_>,
    ) -> Result<Vars> {
        let (model, api_key, prompt) = Self::params(node, ctx)?;
        let client = self.clients.get(&model).ok_or(NodeflowError::task("Unsupported LLM Model"))?;

        debug!(node = ctx.node_id(), model, "llm completion started");
        let mut deltas = tokio::select! {
            _ = ctx.cancelled() => return Err(NodeflowError::Cancelled),
            res = client.stream(&api_key, &prompt) => res?,
        };

        let mut content = String::new();
        loop {
            tokio::select! {
                _ = ctx.cancelled() => return Err(NodeflowError::Cancelled),
                item = deltas.next() => match item {
                    Some(delta) => {
                        let delta = delta?;
                        if delta.is_empty() {
                            continue;
                        }
                        content.push_str(&delta);
                        ctx.emit_partial(&content);
                    }
                    None => break,
                },
            }
        }
        debug!(node = ctx.node_id(), model, len = content.len(), "llm completion finished");

        let mut outputs = Vars::new();
        outputs.set(CONTENT_KEY, content);
        Ok(outputs)
    }
}

/// Fail on any non-success status, keeping the response text for context.
pub(crate) async fn ensure_success(res: reqwest::Response) -> Result<reqwest::Response> {
    let status = res.status();
    if status.is_success() {
        return Ok(res);
    }
    let text = res.text().await.unwrap_or_default();
    Err(NodeflowError::task(format!("HTTP error! status: {}, {}", status.as_u16(), text.trim())))
}


#[cfg(test)]
mod tests {
    use std::time::Duration;

    use futures::stream;
    use serde_json::json;

    use super::*;
    use crate::{
        common::{Shutdown, VariablePool},
        model::NodeModel,
        runtime::PartialOutput,
    };

    struct Scripted(Vec<&'static str>);

    #[async_trait]
    impl LlmClient for Scripted {
        async fn stream(
            &self,
            _: &str,
            _: &str,
        ) -> Result<DeltaStream> {
            Ok(stream::iter(self.0.clone().into_iter().map(|d| Ok(d.to_string()))).boxed())
        }
    }

    /// Never yields anything.
    struct Stalled;

    #[async_trait]
    impl LlmClient for Stalled {
        async fn stream(
            &self,
            _: &str,
            _: &str,
        ) -> Result<DeltaStream> {
            Ok(stream::pending::<Result<String>>().boxed())
        }
    }

    fn task() -> LlmTask {
        LlmTask::new().with_client(MODEL_GROQ, Arc::new(Scripted(vec!["Hel", "lo"])))
    }

    #[tokio::test]
    async fn test_streams_cumulative_partials() {
        let pool = VariablePool::new();
        let node = NodeModel::new("llm", NodeKind::llm("groq", "key", "say hello"));
        let (tx, rx) = flume::unbounded();
        let ctx = Context::new("run", "llm", &pool, tx, Shutdown::new());

        let outputs = task().run(&node, &ctx).await.unwrap();
        assert_eq!(outputs.get::<String>("content").as_deref(), Some("Hello"));

        let partials: Vec<PartialOutput> = rx.drain().collect();
        let texts: Vec<&str> = partials.iter().map(|p| p.output.as_str()).collect();
        assert_eq!(texts, vec!["Hel", "Hello"]);
        assert!(partials.iter().all(|p| p.node_id == "llm"));
    }

    #[tokio::test]
    async fn test_empty_deltas_emit_nothing() {
        let pool = VariablePool::new();
        let node = NodeModel::new("llm", NodeKind::llm("groq", "key", "say hello"));
        let (tx, rx) = flume::unbounded();
        let ctx = Context::new("run", "llm", &pool, tx, Shutdown::new());
        let task = LlmTask::new().with_client(MODEL_GROQ, Arc::new(Scripted(vec!["", "Hel", "", "lo"])));

        let outputs = task.run(&node, &ctx).await.unwrap();
        assert_eq!(outputs.get::<String>("content").as_deref(), Some("Hello"));

        let texts: Vec<String> = rx.drain().map(|p| p.output).collect();
        assert_eq!(texts, vec!["Hel", "Hello"]);
    }

    #[tokio::test]
    async fn test_parameters_are_checked_after_interpolation() {
        let mut pool = VariablePool::new();
        pool.set(&["key"], json!("")).unwrap();
        pool.set(&["question"], json!("why?")).unwrap();
        let (tx, _rx) = flume::unbounded();
        let ctx = Context::new("run", "llm", &pool, tx, Shutdown::new());

        let node = NodeModel::new("llm", NodeKind::llm("groq", "{{key}}", "{{question}}"));
        let err = task().run(&node, &ctx).await.unwrap_err();
        assert_eq!(err, NodeflowError::Task("parameters missing".to_string()));

        let node = NodeModel::new("llm", NodeKind::llm("groq", "k", ""));
        let err = task().run(&node, &ctx).await.unwrap_err();
        assert_eq!(err, NodeflowError::Task("parameters missing".to_string()));
    }

    #[tokio::test]
    async fn test_unknown_model_is_rejected() {
        let pool = VariablePool::new();
        let (tx, _rx) = flume::unbounded();
        let ctx = Context::new("run", "llm", &pool, tx, Shutdown::new());
        let node = NodeModel::new("llm", NodeKind::llm("claude", "k", "p"));

        let err = task().run(&node, &ctx).await.unwrap_err();
        assert_eq!(err, NodeflowError::Task("Unsupported LLM Model".to_string()));
    }

    #[tokio::test]
    async fn test_cancel_interrupts_stream() {
        let pool = VariablePool::new();
        let (tx, _rx) = flume::unbounded();
        let shutdown = Shutdown::new();
        let ctx = Context::new("run", "llm", &pool, tx, shutdown.clone());
        let node = NodeModel::new("llm", NodeKind::llm("groq", "k", "p"));
        let task = LlmTask::new().with_client(MODEL_GROQ, Arc::new(Stalled));

        let canceller = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            shutdown.shutdown();
        });
        let err = tokio::time::timeout(Duration::from_secs(5), task.run(&node, &ctx)).await.unwrap().unwrap_err();
        assert_eq!(err, NodeflowError::Cancelled);
        canceller.await.unwrap();
    }

    #[test]
    fn test_adapters_cover_all_models() {
        let task = LlmTask::direct(&LlmConfig::default());
        let mut direct: Vec<&str> = task.models().collect();
        direct.sort();
        assert_eq!(direct, vec!["gemini", "groq", "openai"]);

        let proxy = LlmTask::proxy(&LlmConfig::default());
        assert_eq!(proxy.models().count(), 3);
    }
}
