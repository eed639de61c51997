mod lines;
mod pool;
mod queue;
mod shutdown;
mod vars;

pub use lines::LineBuffer;
pub use pool::VariablePool;
pub use queue::Queue;
pub use shutdown::Shutdown;
pub use vars::Vars;
