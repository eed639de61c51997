//! OpenAI chat completions API. Groq serves the same protocol.

use async_trait::async_trait;
use futures::{future, stream::StreamExt};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::Result;

use super::{DeltaStream, LlmClient, ensure_success, sse};

pub const OPENAI_URL: &str = "https://api.openai.com/v1/chat/completions";
pub const OPENAI_MODEL: &str = "gpt-4o";
pub const GROQ_URL: &str = "https://api.groq.com/openai/v1/chat/completions";
pub const GROQ_MODEL: &str = "llama3-8b-8192";

pub struct OpenAiClient {
    http: Client,
    url: String,
    model: String,
}

impl OpenAiClient {
    pub fn new(
        http: Client,
        url: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            http,
            url: url.into(),
            model: model.into(),
        }
    }

    pub fn openai(
        http: Client,
        url: Option<&str>,
    ) -> Self {
        Self::new(http, url.unwrap_or(OPENAI_URL), OPENAI_MODEL)
    }

    pub fn groq(
        http: Client,
        url: Option<&str>,
    ) -> Self {
        Self::new(http, url.unwrap_or(GROQ_URL), GROQ_MODEL)
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    stream: bool,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize, Debug)]
struct ChatChunk {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
}

#[derive(Deserialize, Debug)]
struct ChunkChoice {
    #[serde(default)]
    delta: Option<ChunkDelta>,
}

#[derive(Deserialize, Debug)]
struct ChunkDelta {
    #[serde(default)]
    content: Option<String>,
}

/// Text carried by one stream chunk. Role-only and finish chunks carry none.
fn chunk_text(data: &str) -> Option<String> {
    match serde_json::from_str::<ChatChunk>(data) {
        Ok(chunk) => chunk
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.delta)
            .and_then(|delta| delta.content)
            .filter(|text| !text.is_empty()),
        Err(err) => {
            warn!(error = %err, "skipping malformed completion chunk");
            None
        }
    }
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn stream(
        &self,
        api_key: &str,
        prompt: &str,
    ) -> Result<DeltaStream> {
        let body = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            stream: true,
        };

        let res = self.http.post(&self.url).bearer_auth(api_key).json(&body).send().await?;
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{NodeflowError, workflow::tasks::llm::testing::serve_once};

    #[test]
    fn test_chunk_text() {
        assert_eq!(chunk_text(r#"{"choices":[{"delta":{"content":"Hi"}}]}"#).as_deref(), Some("Hi"));
        assert_eq!(chunk_text(r#"{"choices":[{"delta":{"role":"assistant"}}]}"#), None);
        assert_eq!(chunk_text(r#"{"choices":[]}"#), None);
        assert_eq!(chunk_text("not json"), None);
    }

    #[tokio::test]
    async fn test_stream_deltas() {
        let body = [
            r#"data: {"choices":[{"delta":{"role":"assistant"}}]}"#,
            "",
            r#"data: {"choices":[{"delta":{"content":"Hel"}}]}"#,
            "",
            r#"data: {"choices":[{"delta":{"content":"lo"}}]}"#,
            "",
            "data: [DONE]",
            "",
        ]
        .join("\n");
        let (base, request) = serve_once("200 OK", body).await;

        let client = OpenAiClient::new(Client::new(), format!("{}/v1/chat/completions", base), "gpt-4o");
        let deltas: Vec<String> = client.stream("sk-test", "hi").await.unwrap().map(|d| d.unwrap()).collect().await;
        assert_eq!(deltas, vec!["Hel", "lo"]);

        let request = request.await.unwrap().to_ascii_lowercase();
        assert!(request.starts_with("post /v1/chat/completions"));
        assert!(request.contains("authorization: bearer sk-test"));
        assert!(request.contains(r#""stream":true"#));
        assert!(request.contains(r#""model":"gpt-4o""#));
    }

    #[tokio::test]
    async fn test_error_status_is_task_error() {
        let (base, _request) = serve_once("401 Unauthorized", r#"{"error":"bad key"}"#.to_string()).await;

        let client = OpenAiClient::groq(Client::new(), Some(&base));
        let err = match client.stream("sk", "hi").await {
            Ok(_) => panic!("expected an error"),
            Err(err) => err,
        };
        assert_eq!(err, NodeflowError::Task(r#"HTTP error! status: 401, {"error":"bad key"}"#.to_string()));
    }
}
