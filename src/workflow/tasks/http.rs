use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::{
    NodeflowError, Result,
    common::Vars,
    config::HttpConfig,
    model::{NodeKind, NodeType},
    runtime::Context,
    workflow::{node::Node, tasks::Task, template},
};

const BODY_KEY: &str = "body";

/// Plain GET against the node's interpolated `url`. Outputs `{body}`.
#[derive(Debug, Clone)]
pub struct HttpTask {
    client: reqwest::Client,
    // http request timeout
    timeout: Duration,
}

impl Default for HttpTask {
    fn default() -> Self {
        Self::new(&HttpConfig::default())
    }
}

impl HttpTask {
    pub fn new(config: &HttpConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            timeout: Duration::from_millis(config.timeout_ms),
        }
    }

    /// Interpolate the url and make sure it is usable.
    fn resolve_url(
        node: &Node,
        ctx: &Context<'_>,
    ) -> Result<String> {
        let raw = match &node.data.kind {
            NodeKind::Http(params) => params.url.as_deref(),
            _ => return Err(NodeflowError::task(format!("node {} is not an http node", node.id))),
        };
        let url = template::resolve_template(ctx.pool(), raw.unwrap_or_default());
        if !url.starts_with("http") {
            return Err(NodeflowError::task("invalid HTTP URL"));
        }
        Ok(url)
    }

    async fn fetch(
        &self,
        url: &str,
    ) -> Result<String> {
        let res = self.client.get(url).timeout(self.timeout).send().await?;
        debug!(url, status = res.status().as_u16(), "http response");
        let body = res.text().await?;
        Ok(body)
    }
}

#[async_trait]
impl Task for HttpTask {
    fn task_type(&self) -> NodeType {
        NodeType::Http
    }

    async fn run(
        &self,
        node: &Node,
        ctx: &Context<'_>,
    ) -> Result<Vars> {
        let url = Self::resolve_url(node, ctx)?;

        let body = tokio::select! {
            _ = ctx.cancelled() => return Err(NodeflowError::Cancelled),
            res = self.fetch(&url) => res?,
        };

        let mut outputs = Vars::new();
        outputs.set(BODY_KEY, body);
        Ok(outputs)
    }
}
