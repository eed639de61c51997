pub mod merge;
pub mod node;
pub mod tasks;
pub mod template;
mod workflow;

pub use workflow::{NodeIssue, Workflow};
