//! Relaying a run to a remote observer as newline-delimited JSON.
//!
//! The engine never touches this module; it only sees its own channel.

mod ndjson;
mod run;
mod stream;

pub use ndjson::{NdjsonDecoder, to_line};
pub use run::{NodeRun, WorkflowRun};
pub use stream::{RunStream, stream_document, stream_run};
