use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    NodeflowError, Result,
    model::{EdgeModel, NodeKind, NodeModel},
    utils,
};

/// Canvas position of the editor. Carried through, never read by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub x: f64,
    pub y: f64,
    pub zoom: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            zoom: 1.0,
        }
    }
}

/// Workflow document as produced by the authoring UI.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkflowModel {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub nodes: Vec<NodeModel>,
    pub edges: Vec<EdgeModel>,
    #[serde(default)]
    pub viewport: Viewport,
}

impl WorkflowModel {
    /// Shape every incoming document has to satisfy before it is decoded.
    fn schema() -> Value {
        serde_json::json!({
            "type": "object",
            "required": ["nodes", "edges"],
            "properties": {
                "id": { "type": "string" },
                "name": { "type": "string" },
                "nodes": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "required": ["id", "data"],
                        "properties": {
                            "id": { "type": "string" },
                            "data": {
                                "type": "object",
                                "required": ["type"],
                                "properties": {
                                    "type": { "enum": ["start", "end", "llm", "http"] },
                                    "title": { "type": "string" },
                                    "output": { "type": "string" },
                                    "url": { "type": ["string", "null"] },
                                    "model": { "type": ["string", "null"] },
                                    "apiKey": { "type": ["string", "null"] },
                                    "prompt": { "type": ["string", "null"] }
                                }
                            }
                        }
                    }
                },
                "edges": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "required": ["source", "target"],
                        "properties": {
                            "id": { "type": "string" },
                            "source": { "type": "string" },
                            "target": { "type": "string" }
                        }
                    }
                }
            }
        })
    }

    pub fn from_json(s: &str) -> Result<Self> {
        let value = serde_json::from_str::<Value>(s).map_err(|e| NodeflowError::Validation(e.to_string()))?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> Result<Self> {
        jsonschema::validate(&Self::schema(), &value)?;
        serde_json::from_value::<WorkflowModel>(value).map_err(|e| NodeflowError::Validation(e.to_string()))
    }

    /// Starter document: Start -> LLM -> End, returning the streamed `content`.
    pub fn default_workflow() -> Self {
        let start = NodeModel::new(utils::shortid(), NodeKind::start());
        let llm = NodeModel::new(utils::shortid(), NodeKind::llm("groq", "", ""));
        let end = NodeModel::new(utils::shortid(), NodeKind::end("content"));

        let edges = vec![EdgeModel::new(&start.id, &llm.id), EdgeModel::new(&llm.id, &end.id)];

        Self {
            id: utils::longid(),
            name: "New Workflow".to_string(),
            nodes: vec![start, llm, end],
            edges,
            viewport: Viewport::default(),
        }
    }
}
