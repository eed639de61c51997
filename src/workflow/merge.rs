//! Streaming-output merge.
//!
//! While an upstream task streams text, the run can already show a
//! provisional result if that task feeds straight into an End node whose
//! result key is `content`.

use crate::{
    model::{DEFAULT_END_OUTPUT, NodeType},
    workflow::Workflow,
};

/// Decide whether a partial output from `node_id` becomes the provisional
/// workflow output.
///
/// Only the first outgoing edge of `node_id` is consulted, matching the
/// traversal rule of the engine.
pub fn provisional_output(
    workflow: &Workflow,
    node_id: &str,
    cumulative: &str,
) -> Option<String> {
    let next = workflow.next_node(node_id)?;
    if next.node_type() != NodeType::End {
        return None;
    }
    match next.end_output() {
        Some(DEFAULT_END_OUTPUT) => Some(cumulative.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        WorkflowModel,
        model::{EdgeModel, NodeKind, NodeModel},
    };

    fn workflow(end_output: &str) -> Workflow {
        Workflow::try_from(WorkflowModel {
            nodes: vec![
                NodeModel::new("s", NodeKind::start()),
                NodeModel::new("llm", NodeKind::llm("groq", "k", "p")),
                NodeModel::new("mid", NodeKind::llm("groq", "k", "p")),
                NodeModel::new("e", NodeKind::end(end_output)),
            ],
            edges: vec![EdgeModel::new("s", "llm"), EdgeModel::new("llm", "e"), EdgeModel::new("mid", "llm")],
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_merges_into_content_end() {
        let wf = workflow("content");
        assert_eq!(provisional_output(&wf, "llm", "Hel").as_deref(), Some("Hel"));
    }

    #[test]
    fn test_ignores_other_output_keys() {
        let wf = workflow("body");
        assert_eq!(provisional_output(&wf, "llm", "Hel"), None);
    }

    #[test]
    fn test_ignores_non_end_targets_and_dead_ends() {
        let wf = workflow("content");
        assert_eq!(provisional_output(&wf, "mid", "x"), None);
        assert_eq!(provisional_output(&wf, "e", "x"), None);
        assert_eq!(provisional_output(&wf, "ghost", "x"), None);
    }
}
