use std::{
    pin::Pin,
    task::{Context, Poll},
};

use futures::stream::{BoxStream, Stream, StreamExt};
use tracing::{debug, error, warn};

use crate::{
    Engine, Result,
    common::Shutdown,
    events::{ErrorEvent, WorkflowEvent},
    transport::ndjson::to_line,
    workflow::Workflow,
};

/// NDJSON lines of one background run.
///
/// Dropping it cancels the run, so in-flight network calls are abandoned as
/// soon as nobody is listening.
pub struct RunStream {
    lines: BoxStream<'static, String>,
    shutdown: Shutdown,
}

impl Stream for RunStream {
    type Item = String;

    fn poll_next(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Self::Item>> {
        self.get_mut().lines.poll_next_unpin(cx)
    }
}

impl Drop for RunStream {
    fn drop(&mut self) {
        if !self.shutdown.is_terminated() {
            debug!("run stream dropped, cancelling run");
            self.shutdown.shutdown();
        }
    }
}

/// Run `workflow` on `engine` in the background and stream its events as
/// NDJSON lines.
///
/// If the run task panics an `error` record is sent in place of
/// `workflowFinished`. Must be called from within a tokio runtime.
pub fn stream_run(
    engine: Engine,
    workflow: Workflow,
) -> RunStream {
    let (tx, rx) = flume::unbounded::<String>();

    let lines = tx.clone();
    engine.on_any(move |event| match to_line(event) {
        Ok(line) => {
            // the receiver is gone only after the stream was dropped, which cancels the run
            let _ = lines.send(line);
        }
        Err(err) => warn!(error = %err, "failed to encode event"),
    });

    let shutdown = engine.shutdown_signal();
    tokio::spawn(async move {
        let run = tokio::spawn(async move { engine.run_workflow(&workflow).await });
        if let Err(err) = run.await {
            error!(error = %err, "workflow run aborted");
            let record = WorkflowEvent::Error(ErrorEvent {
                error: err.to_string(),
            });
            if let Ok(line) = to_line(&record) {
                let _ = tx.send(line);
            }
        }
    });

    RunStream {
        lines: rx.into_stream().boxed(),
        shutdown,
    }
}

/// Boundary entry point: validate a raw document, then stream its run.
///
/// A malformed document is rejected with `Validation` before any event is
/// produced.
pub fn stream_document(
    engine: Engine,
    document: &str,
) -> Result<RunStream> {
    let workflow = Workflow::from_json(document)?;
    Ok(stream_run(engine, workflow))
}
