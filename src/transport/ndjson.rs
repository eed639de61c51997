use tracing::warn;

use crate::{Result, common::LineBuffer, events::WorkflowEvent};

/// Encode one event as a `{type, data}` record terminated by `\n`.
pub fn to_line(event: &WorkflowEvent) -> Result<String> {
    let mut line = serde_json::to_string(event)?;
    line.push('\n');
    Ok(line)
}

/// Incremental decoder for a chunked NDJSON event stream.
///
/// Lines that are not a valid event record are logged and dropped, they
/// never stop the decoder.
#[derive(Debug, Default)]
pub struct NdjsonDecoder {
    lines: LineBuffer,
}

impl NdjsonDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk, returning every event it completed.
    pub fn feed(
        &mut self,
        chunk: &[u8],
    ) -> Vec<WorkflowEvent> {
        self.lines.feed(chunk).iter().filter_map(|line| decode(line)).collect()
    }

    /// Decode whatever is left once the stream has ended.
    pub fn finish(&mut self) -> Vec<WorkflowEvent> {
        self.lines.finish().iter().filter_map(|line| decode(line)).collect()
    }
}

fn decode(line: &str) -> Option<WorkflowEvent> {
    if line.trim().is_empty() {
        return None;
    }
    match serde_json::from_str::<WorkflowEvent>(line) {
        Ok(event) => Some(event),
        Err(err) => {
            warn!(error = %err, line, "dropping malformed event line");
            None
        }
    }
}
