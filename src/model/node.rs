use serde::{Deserialize, Serialize};

/// Default pool key an End node reads its result from.
pub const DEFAULT_END_OUTPUT: &str = "content";

/// Node type tag. Used as the task registry key.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, strum::AsRefStr, strum::EnumString, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum NodeType {
    Start,
    End,
    Llm,
    Http,
}

/// One node of the input document: `{id, data: {type, title, ...}}`.
///
/// Fields the editor keeps for itself (position, selection state, ...)
/// are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeModel {
    pub id: String,
    pub data: NodeData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeData {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub desc: String,
    #[serde(flatten)]
    pub kind: NodeKind,
}

/// Type-specific payload, discriminated by `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum NodeKind {
    Start(StartParams),
    End(EndParams),
    Llm(LlmParams),
    Http(HttpParams),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StartParams {}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndParams {
    /// pool key selected as the workflow result
    #[serde(default = "default_end_output")]
    pub output: String,
}

impl Default for EndParams {
    fn default() -> Self {
        Self {
            output: default_end_output(),
        }
    }
}

fn default_end_output() -> String {
    DEFAULT_END_OUTPUT.to_string()
}

/// LLM payload. Fields may contain `{{name}}` tokens and are checked
/// for emptiness only after interpolation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LlmParams {
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub prompt: Option<String>,
}

/// HTTP payload. Only GET is performed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HttpParams {
    #[serde(default)]
    pub url: Option<String>,
}

impl NodeModel {
    pub fn new(
        id: impl Into<String>,
        kind: NodeKind,
    ) -> Self {
        let title = kind.node_type().to_string();
        Self {
            id: id.into(),
            data: NodeData {
                title,
                desc: String::new(),
                kind,
            },
        }
    }

    pub fn node_type(&self) -> NodeType {
        self.data.kind.node_type()
    }

    /// The result key of an End node, `None` for every other type.
    pub fn end_output(&self) -> Option<&str> {
        match &self.data.kind {
            NodeKind::End(end) => Some(end.output.as_str()),
            _ => None,
        }
    }
}

impl NodeKind {
    pub fn node_type(&self) -> NodeType {
        match self {
            NodeKind::Start(_) => NodeType::Start,
            NodeKind::End(_) => NodeType::End,
            NodeKind::Llm(_) => NodeType::Llm,
            NodeKind::Http(_) => NodeType::Http,
        }
    }

    pub fn start() -> Self {
        NodeKind::Start(StartParams {})
    }

    pub fn end(output: impl Into<String>) -> Self {
        NodeKind::End(EndParams {
            output: output.into(),
        })
    }

    pub fn http(url: impl Into<String>) -> Self {
        NodeKind::Http(HttpParams {
            url: Some(url.into()),
        })
    }

    pub fn llm(
        model: impl Into<String>,
        api_key: impl Into<String>,
        prompt: impl Into<String>,
    ) -> Self {
        NodeKind::Llm(LlmParams {
            model: Some(model.into()),
            api_key: Some(api_key.into()),
            prompt: Some(prompt.into()),
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_deserialize_ignores_editor_fields() {
        let node: NodeModel = serde_json::from_value(json!({
            "id": "n1",
            "type": "custom",
            "position": {"x": 10, "y": 20},
            "data": {
                "type": "llm",
                "title": "LLM",
                "model": "groq",
                "apiKey": "sk",
                "prompt": "hi",
                "_runningStatus": "running",
                "selected": true
            }
        }))
        .unwrap();

        assert_eq!(node.node_type(), NodeType::Llm);
        assert_eq!(node.data.title, "LLM");
        assert_eq!(node.data.kind, NodeKind::llm("groq", "sk", "hi"));
    }

    #[test]
    fn test_end_output_defaults_to_content() {
        let node: NodeModel = serde_json::from_value(json!({
            "id": "end",
            "data": {"type": "end", "title": "End"}
        }))
        .unwrap();
        assert_eq!(node.end_output(), Some("content"));
    }

    #[test]
    fn test_unknown_type_is_rejected() {
        let res = serde_json::from_value::<NodeModel>(json!({
            "id": "x",
            "data": {"type": "router", "title": "Router"}
        }));
        assert!(res.is_err());
    }

    #[test]
    fn test_node_type_tags() {
        assert_eq!(NodeType::Llm.as_ref(), "llm");
        assert_eq!("http".parse::<NodeType>().unwrap(), NodeType::Http);
    }
}
