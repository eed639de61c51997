//! Client for the local relay. The relay holds the provider integrations
//! and streams plain-text deltas back as SSE `data:` lines.

use async_trait::async_trait;
use futures::stream::StreamExt;
use reqwest::Client;
use serde::Serialize;

use crate::Result;

use super::{DeltaStream, LlmClient, ensure_success, sse};

pub struct ProxyClient {
    http: Client,
    url: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ProxyRequest<'a> {
    api_key: &'a str,
    prompt: &'a str,
}

impl ProxyClient {
    pub fn new(
        http: Client,
        proxy_url: &str,
        model: &str,
    ) -> Self {
        Self {
            http,
            url: format!("{}/proxy/{}", proxy_url.trim_end_matches('/'), model),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl LlmClient for ProxyClient {
    async fn stream(
        &self,
        api_key: &str,
        prompt: &str,
    ) -> Result<DeltaStream> {
        let res = self
            .http
            .post(&self.url)
            .json(&ProxyRequest {
                api_key,
                prompt,
            })
            .send()
            .await?;
        let res = ensure_success(res).await?;

        Ok(sse::data_stream(res.bytes_stream()).boxed())
    }
}
