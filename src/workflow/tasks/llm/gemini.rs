//! Google Gemini `streamGenerateContent` API, read as SSE.

use async_trait::async_trait;
use futures::{future, stream::StreamExt};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::Result;

use super::{DeltaStream, LlmClient, ensure_success, sse};

pub const GEMINI_URL: &str = "https://generativelanguage.googleapis.com";
pub const GEMINI_MODEL: &str = "gemini-1.5-flash";

pub struct GeminiClient {
    http: Client,
    base_url: String,
    model: String,
}

impl GeminiClient {
    pub fn new(
        http: Client,
        base_url: Option<&str>,
    ) -> Self {
        Self {
            http,
            base_url: base_url.unwrap_or(GEMINI_URL).trim_end_matches('/').to_string(),
            model: GEMINI_MODEL.to_string(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/v1beta/models/{}:streamGenerateContent?alt=sse", self.base_url, self.model)
    }
}

#[derive(Serialize, Deserialize, Debug)]
struct GeminiContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Serialize, Deserialize, Debug)]
struct GeminiPart {
    #[serde(default)]
    text: String,
}

#[derive(Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
}

#[derive(Deserialize, Debug)]
struct GeminiStreamChunk {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Deserialize, Debug)]
struct GeminiCandidate {
    content: Option<GeminiContent>,
}

/// Concatenated text parts of the first candidate.
fn chunk_text(data: &str) -> Option<String> {
    let chunk = match serde_json::from_str::<GeminiStreamChunk>(data) {
        Ok(chunk) => chunk,
        Err(err) => {
            warn!(error = %err, "skipping malformed gemini chunk");
            return None;
        }
    };
    let content = chunk.candidates.into_iter().next()?.content?;
    let text: String = content.parts.into_iter().map(|p| p.text).collect();
    if text.is_empty() { None } else { Some(text) }
}

#[async_trait]
impl LlmClient for GeminiClient {
    async fn stream(
        &self,
        api_key: &str,
        prompt: &str,
    ) -> Result<DeltaStream> {
        let body = GeminiRequest {
            contents: vec![GeminiContent {
                role: Some("user".to_string()),
                parts: vec![GeminiPart {
                    text: prompt.to_string(),
                }],
            }],
        };

        let res = self.http.post(self.endpoint()).header("x-goog-api-key", api_key).json(&body).send().await?;
        let res = ensure_success(res).await?;

        let deltas = sse::data_stream(res.bytes_stream()).filter_map(|item| {
            future::ready(match item {
                Ok(data) => chunk_text(&data).map(Ok),
                Err(err) => Some(Err(err)),
            })
        });
        Ok(deltas.boxed())
    }
}
