//! Line-oriented reader for `text/event-stream` bodies.

use std::{collections::VecDeque, fmt::Display, pin::Pin};

use futures::stream::{self, BoxStream, Stream, StreamExt};

use crate::{NodeflowError, Result, common::LineBuffer};

/// Payload that ends an OpenAI-style stream.
pub const DONE: &str = "[DONE]";

/// Strip the `data:` field name (and one optional space) from an SSE line.
/// Every other field (`event:`, `id:`, comments) yields `None`.
pub fn data_payload(line: &str) -> Option<&str> {
    let rest = line.strip_prefix("data:")?;
    Some(rest.strip_prefix(' ').unwrap_or(rest))
}

struct State<S> {
    body: Pin<Box<S>>,
    lines: LineBuffer,
    pending: VecDeque<String>,
    done: bool,
}

/// Turn a raw response body into the stream of its `data:` payloads.
///
/// Each `data:` line is one item; the stream ends at [`DONE`] or when the
/// body ends. A transport error is yielded once, then the stream ends.
pub fn data_stream<S, B, E>(body: S) -> BoxStream<'static, Result<String>>
where
    S: Stream<Item = std::result::Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send,
    E: Display + Send,
{
    let state = State {
        body: Box::pin(body),
        lines: LineBuffer::new(),
        pending: VecDeque::new(),
        done: false,
    };

    stream::unfold(state, |mut state| async move {
        loop {
            if let Some(line) = state.pending.pop_front() {
                match data_payload(&line) {
                    Some(DONE) => {
                        state.pending.clear();
                        state.done = true;
                        return None;
                    }
                    Some(data) => {
                        let data = data.to_string();
                        return Some((Ok(data), state));
                    }
                    None => continue,
                }
            }
            if state.done {
                return None;
            }
            match state.body.next().await {
                Some(Ok(chunk)) => state.pending.extend(state.lines.feed(chunk.as_ref())),
                Some(Err(err)) => {
                    state.done = true;
                    return Some((Err(NodeflowError::task(format!("stream error: {}", err))), state));
                }
                None => {
                    state.done = true;
                    state.pending.extend(state.lines.finish());
                }
            }
        }
    })
    .boxed()
}
