use serde::{Deserialize, Serialize};

/// Directed link from one node to another.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EdgeModel {
    #[serde(default)]
    pub id: String,
    pub source: String,
    pub target: String,
}

impl EdgeModel {
    pub fn new(
        source: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        let source = source.into();
        let target = target.into();
        Self {
            id: format!("{}-{}", source, target),
            source,
            target,
        }
    }
}
