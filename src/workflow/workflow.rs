//! Validated, immutable runtime graph.
//!
//! The engine walks edges in document order and only ever follows the first
//! outgoing edge of a node. A petgraph view of the same graph is kept for
//! structural diagnostics.

use std::collections::{HashMap, HashSet};

use petgraph::{
    algo::is_cyclic_directed,
    graph::{DiGraph, NodeIndex},
};
use tracing::warn;

use crate::{
    NodeflowError, Result, WorkflowModel,
    model::{EdgeModel, NodeKind, NodeType},
    workflow::node::{Node, NodeId},
};

/// Problem found by [`Workflow::check_nodes`] on a single node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeIssue {
    pub node_id: NodeId,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct Workflow {
    id: String,
    name: String,
    nodes: Vec<Node>,
    edges: Vec<EdgeModel>,
    /// node id -> position in `nodes`
    index: HashMap<NodeId, usize>,
    graph: DiGraph<NodeId, ()>,
}

impl Workflow {
    /// Decode and validate a document in one step.
    pub fn from_json(s: &str) -> Result<Self> {
        let model = WorkflowModel::from_json(s)?;
        Self::try_from(model)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn edges(&self) -> &[EdgeModel] {
        &self.edges
    }

    /// get node by id
    pub fn node(
        &self,
        id: &str,
    ) -> Option<&Node> {
        self.index.get(id).map(|idx| &self.nodes[*idx])
    }

    /// The first node typed Start, if any.
    pub fn start_node(&self) -> Option<&Node> {
        self.nodes.iter().find(|n| n.node_type() == NodeType::Start)
    }

    /// Outgoing edges of a node, in document order.
    pub fn outgoing_edges<'a>(
        &'a self,
        id: &'a str,
    ) -> impl Iterator<Item = &'a EdgeModel> + 'a {
        self.edges.iter().filter(move |e| e.source == id)
    }

    /// Target of the first outgoing edge in document order.
    pub fn next_node(
        &self,
        id: &str,
    ) -> Option<&Node> {
        self.outgoing_edges(id).next().and_then(|edge| self.node(&edge.target))
    }

    pub fn has_cycle(&self) -> bool {
        is_cyclic_directed(&self.graph)
    }

    /// Per-node sanity checks on the literal payloads, without running
    /// anything. Tokens are not interpolated here, so a URL made entirely of
    /// `{{...}}` is reported.
    pub fn check_nodes(&self) -> Vec<NodeIssue> {
        let mut issues = Vec::new();
        for node in &self.nodes {
            let message = match &node.data.kind {
                NodeKind::Llm(llm) => {
                    if is_blank(&llm.model) {
                        Some("model provider missing")
                    } else if is_blank(&llm.api_key) {
                        Some("API Key missing")
                    } else if is_blank(&llm.prompt) {
                        Some("prompt missing")
                    } else {
                        None
                    }
                }
                NodeKind::Http(http) => match http.url.as_deref() {
                    Some(url) if url.starts_with("http") => None,
                    _ => Some("invalid URL"),
                },
                NodeKind::Start(_) | NodeKind::End(_) => None,
            };
            if let Some(message) = message {
                issues.push(NodeIssue {
                    node_id: node.id.clone(),
                    message: message.to_string(),
                });
            }
        }
        issues
    }

    fn warn_structure(&self) {
        let mut seen = HashSet::new();
        for edge in &self.edges {
            if !seen.insert(edge.source.as_str()) {
                warn!(workflow = %self.id, node = %edge.source, "node has several outgoing edges, only the first one is followed");
            }
        }
        if self.has_cycle() {
            warn!(workflow = %self.id, "workflow graph contains a cycle, runs are bounded only by the execution limits");
        }
    }
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().is_none_or(str::is_empty)
}

impl TryFrom<WorkflowModel> for Workflow {
    type Error = NodeflowError;

    fn try_from(model: WorkflowModel) -> Result<Self> {
        let mut graph: DiGraph<NodeId, ()> = DiGraph::new();
        let mut index = HashMap::new();
        let mut graph_index: HashMap<NodeId, NodeIndex> = HashMap::new();

        let mut starts = 0;
        for (pos, node) in model.nodes.iter().enumerate() {
            if index.insert(node.id.clone(), pos).is_some() {
                return Err(NodeflowError::Validation(format!("duplicate node id {}", node.id)));
            }
            if node.node_type() == NodeType::Start {
                starts += 1;
            }
            graph_index.insert(node.id.clone(), graph.add_node(node.id.clone()));
        }
        if starts > 1 {
            return Err(NodeflowError::Validation(format!("expected at most one start node, found {}", starts)));
        }

        for edge in model.edges.iter() {
            let source = graph_index.get(&edge.source).ok_or(NodeflowError::Validation(format!("source node {} not found", edge.source)))?;
            let target = graph_index.get(&edge.target).ok_or(NodeflowError::Validation(format!("target node {} not found", edge.target)))?;
            graph.add_edge(*source, *target, ());
        }

        let workflow = Self {
            id: model.id,
            name: model.name,
            nodes: model.nodes,
            edges: model.edges,
            index,
            graph,
        };
        workflow.warn_structure();
        Ok(workflow)
    }
}
