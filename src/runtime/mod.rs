mod channel;
mod context;
mod state;

pub use channel::{Channel, HandlerId, WorkflowEventHandle};
pub use context::{Context, PartialOutput};
pub use state::RunState;
